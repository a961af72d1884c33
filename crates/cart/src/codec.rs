//! Stored cart format.
//!
//! A persisted cart is a JSON array of [`LineItem`]s in cart order:
//!
//! ```json
//! [{"id":"p1","title":"Shirt","image_url":"https://...","price":"10","quantity":2}]
//! ```
//!
//! The same pair of functions is used for writing and for hydration, so a
//! value written by [`encode`] always decodes back to the same cart.

use std::collections::HashSet;

use marketplace_core::{LineItem, ProductId};
use thiserror::Error;

use crate::cart::Cart;

/// Errors converting between a cart and its stored form.
#[derive(Debug, Error)]
pub enum CodecError {
    /// Malformed JSON, or an item that breaks a field constraint
    /// (blank ID, zero quantity, unparseable price).
    #[error("invalid cart json: {0}")]
    Json(#[from] serde_json::Error),

    /// The stored array lists the same product twice.
    #[error("duplicate product {0} in stored cart")]
    DuplicateId(ProductId),
}

/// Serialize the line items of a cart.
///
/// # Errors
///
/// Returns [`CodecError::Json`] if serialization fails.
pub fn encode(items: &[LineItem]) -> Result<String, CodecError> {
    Ok(serde_json::to_string(items)?)
}

/// Parse a stored value into a cart.
///
/// # Errors
///
/// Returns [`CodecError::Json`] for malformed input and
/// [`CodecError::DuplicateId`] if a product appears more than once.
pub fn decode(value: &str) -> Result<Cart, CodecError> {
    let items: Vec<LineItem> = serde_json::from_str(value)?;

    let mut seen = HashSet::with_capacity(items.len());
    for item in &items {
        if !seen.insert(&item.id) {
            return Err(CodecError::DuplicateId(item.id.clone()));
        }
    }

    Ok(Cart::from_items(items))
}
