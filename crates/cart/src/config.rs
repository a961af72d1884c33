//! Cart configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `CART_STORAGE_DIR` - Directory for the file-backed store (default: `.cart`)
//! - `CART_STORAGE_KEY` - Key the cart snapshot is stored under
//!   (default: `@Marketplace:products`)
//! - `CART_EVENT_CAPACITY` - Events buffered per subscriber before it lags (default: 64)

use std::path::PathBuf;

use thiserror::Error;

use crate::storage::FileStore;

/// Default persistence key for the cart snapshot.
pub const DEFAULT_STORAGE_KEY: &str = "@Marketplace:products";

const DEFAULT_STORAGE_DIR: &str = ".cart";
const DEFAULT_EVENT_CAPACITY: usize = 64;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Cart store configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartConfig {
    /// Directory used by [`FileStore`]
    pub storage_dir: PathBuf,
    /// Fixed key the cart snapshot is persisted under
    pub storage_key: String,
    /// Broadcast buffer size per subscriber
    pub event_capacity: usize,
}

impl Default for CartConfig {
    fn default() -> Self {
        Self {
            storage_dir: PathBuf::from(DEFAULT_STORAGE_DIR),
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl CartConfig {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let storage_dir = lookup("CART_STORAGE_DIR")
            .map_or_else(|| PathBuf::from(DEFAULT_STORAGE_DIR), PathBuf::from);

        let storage_key =
            lookup("CART_STORAGE_KEY").unwrap_or_else(|| DEFAULT_STORAGE_KEY.to_string());
        if storage_key.trim().is_empty() {
            return Err(ConfigError::InvalidEnvVar(
                "CART_STORAGE_KEY".to_string(),
                "must not be empty".to_string(),
            ));
        }

        let event_capacity = match lookup("CART_EVENT_CAPACITY") {
            Some(raw) => parse_capacity(&raw)?,
            None => DEFAULT_EVENT_CAPACITY,
        };

        Ok(Self {
            storage_dir,
            storage_key,
            event_capacity,
        })
    }

    /// A file-backed store rooted at the configured directory.
    #[must_use]
    pub fn file_store(&self) -> FileStore {
        FileStore::new(&self.storage_dir)
    }
}

fn parse_capacity(raw: &str) -> Result<usize, ConfigError> {
    let capacity = raw.parse::<usize>().map_err(|e| {
        ConfigError::InvalidEnvVar("CART_EVENT_CAPACITY".to_string(), e.to_string())
    })?;
    if capacity == 0 {
        return Err(ConfigError::InvalidEnvVar(
            "CART_EVENT_CAPACITY".to_string(),
            "must be greater than 0".to_string(),
        ));
    }
    Ok(capacity)
}
