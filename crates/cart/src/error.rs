//! Error types for the cart store.
//!
//! Decode failures during hydration are recovered inside the store (the cart
//! starts empty). Everything else reaches the caller, either as a returned
//! [`CartError`] or as a [`CartEvent::PersistFailed`](crate::CartEvent) event.

use std::sync::Arc;

use marketplace_core::ProductId;
use thiserror::Error;

use crate::codec::CodecError;
use crate::storage::StorageError;

/// Cart-level error type.
#[derive(Debug, Clone, Error)]
pub enum CartError {
    /// Increment or decrement targeted a product that is not in the cart.
    ///
    /// The cart is left untouched and nothing is persisted.
    #[error("product {0} is not in the cart")]
    NotFound(ProductId),

    /// The product's quantity is already at its maximum.
    #[error("quantity for product {0} cannot grow any further")]
    QuantityOverflow(ProductId),

    /// The cart accessor was used outside of a [`CartStore::scope`](crate::CartStore::scope).
    #[error("cart accessed outside of an active cart scope")]
    OutsideScope,

    /// The store has been shut down.
    #[error("cart store has been shut down")]
    Closed,

    /// Writing the cart to the backend failed.
    #[error("failed to persist cart: {0}")]
    Persist(#[from] Arc<PersistError>),
}

/// Failure writing a snapshot to the persistence backend.
#[derive(Debug, Error)]
pub enum PersistError {
    /// The snapshot could not be serialized.
    #[error("encode error: {0}")]
    Encode(#[from] CodecError),

    /// The backend rejected the write.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Result type alias for `CartError`.
pub type Result<T> = std::result::Result<T, CartError>;
