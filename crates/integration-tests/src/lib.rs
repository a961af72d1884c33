//! Integration tests for the Marketplace cart.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p marketplace-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `cart_scenarios` - Add/increment/decrement behaviour through `CartStore`
//! - `cart_persistence` - Restart round-trips through `FileStore`
//! - `cart_scope` - Task-scoped cart access
//!
//! This module holds the fixtures shared by those test files.

#![cfg_attr(not(test), forbid(unsafe_code))]

use marketplace_cart::{CartConfig, CartStore, KeyValueStore, Snapshot};
use marketplace_core::{NewLineItem, ProductId};
use rust_decimal::Decimal;

/// Parse a product ID, panicking on blank input.
///
/// # Panics
///
/// Panics if `id` is blank.
#[must_use]
pub fn product_id(id: &str) -> ProductId {
    ProductId::parse(id).expect("fixture product id must not be blank")
}

/// A catalog product with a deterministic title, image, and price.
#[must_use]
pub fn product(id: &str, title: &str, price: i64) -> NewLineItem {
    NewLineItem::new(
        product_id(id),
        title,
        format!("https://cdn.example.com/{id}.png"),
        Decimal::new(price, 0),
    )
}

/// `(id, quantity)` pairs in cart order.
#[must_use]
pub fn quantities(snapshot: &Snapshot) -> Vec<(String, u32)> {
    snapshot
        .iter()
        .map(|item| (item.id.to_string(), item.quantity.get()))
        .collect()
}

/// Open a store on `backend` with default configuration and wait for hydration.
pub async fn open_ready<B>(backend: B) -> CartStore
where
    B: KeyValueStore + 'static,
{
    let store = CartStore::open(backend, &CartConfig::default());
    store.ready().await;
    store
}
