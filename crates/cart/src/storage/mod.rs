//! Persistence backends for the cart.
//!
//! The cart treats its backend as an opaque async key-value store holding
//! one string per key. Two implementations ship with the crate:
//!
//! - [`MemoryStore`] - in-process map, for tests and embedding
//! - [`FileStore`] - one file per key under a directory, survives restarts

mod file;
mod memory;

use async_trait::async_trait;
use thiserror::Error;

pub use file::FileStore;
pub use memory::MemoryStore;

/// Errors returned by a [`KeyValueStore`].
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem operation failed.
    #[error("io error on key {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    /// Backend-specific failure.
    #[error("backend error: {0}")]
    Backend(String),
}

/// Async key-value persistence backend.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}
