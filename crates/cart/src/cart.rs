//! The cart state machine.
//!
//! Per product the only transitions are:
//!
//! ```text
//! absent        --add-->        present(1)
//! present(n)    --add/inc-->    present(n + 1)
//! present(n)    --dec-->        present(n - 1)   when n > 1
//! present(1)    --dec-->        absent
//! ```
//!
//! [`Cart`] is plain data with no I/O; [`CartStore`](crate::CartStore) wraps
//! it with persistence and notification.

use marketplace_core::{LineItem, NewLineItem, ProductId, Quantity};

use crate::error::CartError;

/// Ordered collection of line items, at most one per product.
///
/// Items stay in the order they were first added.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cart {
    items: Vec<LineItem>,
}

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Build a cart from items already known to have unique IDs.
    pub(crate) fn from_items(items: Vec<LineItem>) -> Self {
        Self { items }
    }

    /// The line items in cart order.
    #[must_use]
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    /// Whether the cart holds no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Find the line item for a product.
    #[must_use]
    pub fn get(&self, id: &ProductId) -> Option<&LineItem> {
        self.items.iter().find(|item| &item.id == id)
    }

    fn get_mut(&mut self, id: &ProductId) -> Option<&mut LineItem> {
        self.items.iter_mut().find(|item| &item.id == id)
    }

    /// Add one unit of a product.
    ///
    /// A product not yet in the cart is appended with quantity 1. A product
    /// already present has its quantity bumped and keeps its position and
    /// stored details.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::QuantityOverflow`] if the quantity is already at
    /// its maximum.
    pub fn add(&mut self, product: NewLineItem) -> Result<Quantity, CartError> {
        if self.get(&product.id).is_some() {
            return self.increment(&product.id);
        }

        self.items.push(product.with_quantity(Quantity::ONE));
        Ok(Quantity::ONE)
    }

    /// Add one unit of a product already in the cart.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::NotFound`] if the product is not in the cart and
    /// [`CartError::QuantityOverflow`] if its quantity cannot grow.
    pub fn increment(&mut self, id: &ProductId) -> Result<Quantity, CartError> {
        let item = self
            .get_mut(id)
            .ok_or_else(|| CartError::NotFound(id.clone()))?;
        let quantity = item
            .quantity
            .increment()
            .ok_or_else(|| CartError::QuantityOverflow(id.clone()))?;
        item.quantity = quantity;
        Ok(quantity)
    }

    /// Take one unit of a product out of the cart.
    ///
    /// Returns the remaining quantity, or `None` once the last unit is gone
    /// and the item has been removed.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::NotFound`] if the product is not in the cart.
    pub fn decrement(&mut self, id: &ProductId) -> Result<Option<Quantity>, CartError> {
        let index = self
            .items
            .iter()
            .position(|item| &item.id == id)
            .ok_or_else(|| CartError::NotFound(id.clone()))?;

        let Some(item) = self.items.get_mut(index) else {
            return Err(CartError::NotFound(id.clone()));
        };
        match item.quantity.decrement() {
            Some(quantity) => {
                item.quantity = quantity;
                Ok(Some(quantity))
            }
            None => {
                self.items.remove(index);
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    fn product(id: &str) -> NewLineItem {
        NewLineItem::new(
            ProductId::parse(id).unwrap(),
            format!("Product {id}"),
            format!("https://cdn.example.com/{id}.png"),
            Decimal::new(1000, 2),
        )
    }

    fn id(s: &str) -> ProductId {
        ProductId::parse(s).unwrap()
    }

    fn quantities(cart: &Cart) -> Vec<(&str, u32)> {
        cart.items()
            .iter()
            .map(|item| (item.id.as_str(), item.quantity.get()))
            .collect()
    }

    #[test]
    fn test_add_new_product() {
        let mut cart = Cart::new();
        assert_eq!(cart.add(product("p1")).unwrap(), Quantity::ONE);
        assert_eq!(quantities(&cart), [("p1", 1)]);
    }

    #[test]
    fn test_repeated_add_folds_into_quantity() {
        let mut cart = Cart::new();
        for _ in 0..5 {
            cart.add(product("p1")).unwrap();
        }
        assert_eq!(quantities(&cart), [("p1", 5)]);
    }

    #[test]
    fn test_add_appends_without_reordering() {
        let mut cart = Cart::new();
        cart.add(product("p1")).unwrap();
        cart.add(product("p2")).unwrap();
        cart.add(product("p1")).unwrap();
        cart.add(product("p3")).unwrap();
        assert_eq!(quantities(&cart), [("p1", 2), ("p2", 1), ("p3", 1)]);
    }

    #[test]
    fn test_add_existing_keeps_original_details() {
        let mut cart = Cart::new();
        cart.add(product("p1")).unwrap();

        let mut renamed = product("p1");
        renamed.title = "Renamed".to_string();
        cart.add(renamed).unwrap();

        assert_eq!(cart.items()[0].title, "Product p1");
    }

    #[test]
    fn test_increment_preserves_position() {
        let mut cart = Cart::new();
        cart.add(product("p1")).unwrap();
        cart.add(product("p2")).unwrap();
        cart.increment(&id("p1")).unwrap();
        assert_eq!(quantities(&cart), [("p1", 2), ("p2", 1)]);
    }

    #[test]
    fn test_increment_missing_is_not_found() {
        let mut cart = Cart::new();
        cart.add(product("p1")).unwrap();
        let before = cart.clone();

        let err = cart.increment(&id("nope")).unwrap_err();
        assert!(matches!(err, CartError::NotFound(missing) if missing.as_str() == "nope"));
        assert_eq!(cart, before);
    }

    #[test]
    fn test_decrement_reduces_quantity() {
        let mut cart = Cart::new();
        for _ in 0..3 {
            cart.add(product("p1")).unwrap();
        }
        assert_eq!(
            cart.decrement(&id("p1")).unwrap(),
            Some(Quantity::new(2).unwrap())
        );
        assert_eq!(quantities(&cart), [("p1", 2)]);
    }

    #[test]
    fn test_decrement_last_unit_removes_item() {
        let mut cart = Cart::new();
        cart.add(product("p1")).unwrap();
        cart.add(product("p2")).unwrap();
        cart.add(product("p3")).unwrap();

        assert_eq!(cart.decrement(&id("p2")).unwrap(), None);
        assert_eq!(quantities(&cart), [("p1", 1), ("p3", 1)]);
        assert!(cart.get(&id("p2")).is_none());
    }

    #[test]
    fn test_decrement_missing_is_not_found() {
        let mut cart = Cart::new();
        assert!(matches!(
            cart.decrement(&id("p1")),
            Err(CartError::NotFound(_))
        ));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_increment_overflow() {
        let mut cart = Cart::from_items(vec![
            product("p1").with_quantity(Quantity::new(u32::MAX).unwrap()),
        ]);
        assert!(matches!(
            cart.add(product("p1")),
            Err(CartError::QuantityOverflow(_))
        ));
        assert_eq!(cart.items()[0].quantity.get(), u32::MAX);
    }

    #[test]
    fn test_mixed_sequence_never_keeps_empty_lines() {
        let mut cart = Cart::new();
        let ops: [(&str, i8); 10] = [
            ("p1", 1),
            ("p2", 1),
            ("p1", 1),
            ("p2", -1),
            ("p1", -1),
            ("p3", 1),
            ("p1", -1),
            ("p3", 1),
            ("p3", -1),
            ("p2", 1),
        ];
        for (pid, delta) in ops {
            if delta > 0 {
                cart.add(product(pid)).unwrap();
            } else {
                cart.decrement(&id(pid)).unwrap();
            }
            assert!(cart.items().iter().all(|item| item.quantity.get() >= 1));
        }
        assert_eq!(quantities(&cart), [("p3", 1), ("p2", 1)]);
    }
}
