//! Marketplace Cart - Persistent shopping cart state store.
//!
//! Tracks which products a shopper has added and how many of each, keeps a
//! durable copy in a key-value backend so the cart survives restarts, and
//! notifies the UI layer whenever the cart changes.
//!
//! # Architecture
//!
//! - [`Cart`] - pure state machine over ordered line items
//! - [`CartStore`] - owns a cart, serializes mutations, persists every
//!   snapshot through a single writer task, publishes events
//! - [`storage`] - the [`KeyValueStore`] backend trait with in-memory and
//!   file-backed implementations
//! - [`scope`] - task-local access to the session's store
//!
//! # Example
//!
//! ```rust,no_run
//! use marketplace_cart::{CartConfig, CartStore, MemoryStore};
//! use marketplace_core::{NewLineItem, ProductId};
//! use rust_decimal::Decimal;
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let store = CartStore::open(MemoryStore::new(), &CartConfig::default());
//! store.ready().await;
//!
//! let id = ProductId::parse("p1")?;
//! store.add_to_cart(NewLineItem::new(id.clone(), "Shirt", "shirt.png", Decimal::new(10, 0)))?;
//! store.increment(&id)?;
//! assert_eq!(store.products().total_quantity(), 2);
//!
//! store.shutdown().await?;
//! # Ok(())
//! # }
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod codec;
pub mod config;
pub mod error;
pub mod event;
pub mod scope;
pub mod storage;
pub mod store;

pub use cart::Cart;
pub use config::{CartConfig, ConfigError};
pub use error::{CartError, PersistError};
pub use event::{CartEvent, Snapshot};
pub use storage::{FileStore, KeyValueStore, MemoryStore, StorageError};
pub use store::CartStore;
