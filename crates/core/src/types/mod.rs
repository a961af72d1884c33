//! Core types for the Marketplace cart.
//!
//! This module provides type-safe wrappers for cart domain concepts.

pub mod id;
pub mod line_item;
pub mod quantity;

pub use id::*;
pub use line_item::{LineItem, NewLineItem};
pub use quantity::{Quantity, QuantityError};
