//! Marketplace Core - Shared cart domain types.
//!
//! This crate provides the types shared by every Marketplace cart component:
//! - `cart` - The cart state store and its persistence backends
//! - `cli` - Command-line tool for inspecting and editing a local cart
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no storage access, no async
//! runtime. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Product IDs, quantities, and cart line items

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
