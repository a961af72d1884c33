//! Cart line items.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::ProductId;
use super::quantity::Quantity;

/// A product as offered to the cart, before it has a quantity.
///
/// This is what the catalog hands over when a shopper taps "add to cart".
/// The cart assigns the quantity itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLineItem {
    /// Catalog product ID, used to fold repeated adds into one line.
    pub id: ProductId,
    /// Display name.
    pub title: String,
    /// Product image URL.
    pub image_url: String,
    /// Unit price. Carried through untouched; the cart never computes with it.
    pub price: Decimal,
}

impl NewLineItem {
    /// Create a new line item candidate.
    #[must_use]
    pub fn new(
        id: ProductId,
        title: impl Into<String>,
        image_url: impl Into<String>,
        price: Decimal,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            image_url: image_url.into(),
            price,
        }
    }

    /// Turn the candidate into a line item holding `quantity` units.
    #[must_use]
    pub fn with_quantity(self, quantity: Quantity) -> LineItem {
        LineItem {
            id: self.id,
            title: self.title,
            image_url: self.image_url,
            price: self.price,
            quantity,
        }
    }
}

/// One distinct product in the cart.
///
/// This is also the stored representation: a persisted cart is a JSON array
/// of these, in cart order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// Catalog product ID.
    pub id: ProductId,
    /// Display name.
    pub title: String,
    /// Product image URL.
    pub image_url: String,
    /// Unit price.
    pub price: Decimal,
    /// Units in the cart, always at least one.
    pub quantity: Quantity,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn shirt() -> NewLineItem {
        NewLineItem::new(
            ProductId::parse("p1").unwrap(),
            "Shirt",
            "https://cdn.example.com/shirt.png",
            Decimal::new(10, 0),
        )
    }

    #[test]
    fn test_with_quantity_keeps_fields() {
        let item = shirt().with_quantity(Quantity::ONE);
        assert_eq!(item.id.as_str(), "p1");
        assert_eq!(item.title, "Shirt");
        assert_eq!(item.price, Decimal::new(10, 0));
        assert_eq!(item.quantity.get(), 1);
    }

    #[test]
    fn test_stored_field_names() {
        let item = shirt().with_quantity(Quantity::new(2).unwrap());
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["id"], "p1");
        assert_eq!(json["image_url"], "https://cdn.example.com/shirt.png");
        assert_eq!(json["quantity"], 2);
    }

    #[test]
    fn test_deserialize_numeric_price() {
        let json = r#"{"id":"p1","title":"Shirt","image_url":"x","price":10,"quantity":2}"#;
        let item: LineItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.price, Decimal::new(10, 0));
        assert_eq!(item.quantity.get(), 2);
    }

    #[test]
    fn test_deserialize_rejects_zero_quantity() {
        let json = r#"{"id":"p1","title":"Shirt","image_url":"x","price":"10","quantity":0}"#;
        assert!(serde_json::from_str::<LineItem>(json).is_err());
    }
}
