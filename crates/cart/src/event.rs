//! Snapshots and change notifications published by the store.

use std::ops::Deref;
use std::sync::Arc;

use marketplace_core::{LineItem, ProductId};

use crate::cart::Cart;
use crate::error::PersistError;

/// Immutable view of the cart at one revision.
///
/// Cloning is cheap; every subscriber shares the same item slice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    revision: u64,
    items: Arc<[LineItem]>,
}

impl Snapshot {
    pub(crate) fn capture(revision: u64, cart: &Cart) -> Self {
        Self {
            revision,
            items: cart.items().into(),
        }
    }

    /// Monotonic revision. Starts at 0 for the empty pre-hydration cart and
    /// grows by one for each hydration or mutation that changes the cart.
    #[must_use]
    pub const fn revision(&self) -> u64 {
        self.revision
    }

    /// The line items in cart order.
    #[must_use]
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    /// Find the line item for a product.
    #[must_use]
    pub fn get(&self, id: &ProductId) -> Option<&LineItem> {
        self.items.iter().find(|item| &item.id == id)
    }

    /// Total units across all line items, for the cart badge.
    #[must_use]
    pub fn total_quantity(&self) -> u64 {
        self.items
            .iter()
            .map(|item| u64::from(item.quantity.get()))
            .sum()
    }
}

impl Deref for Snapshot {
    type Target = [LineItem];

    fn deref(&self) -> &Self::Target {
        &self.items
    }
}

/// Event delivered to [`CartStore::subscribe`](crate::CartStore::subscribe) receivers.
#[derive(Debug, Clone)]
pub enum CartEvent {
    /// Startup hydration finished. Carries the cart as it stands afterwards,
    /// which is empty if nothing was stored or the stored value was unreadable.
    Hydrated(Snapshot),

    /// A mutation was applied.
    Changed(Snapshot),

    /// Writing a snapshot to the backend failed. The in-memory cart is ahead
    /// of the stored one until a later write succeeds.
    PersistFailed {
        /// Revision of the snapshot that failed to persist.
        revision: u64,
        error: Arc<PersistError>,
    },
}

impl CartEvent {
    /// The snapshot carried by this event, if any.
    #[must_use]
    pub const fn snapshot(&self) -> Option<&Snapshot> {
        match self {
            Self::Hydrated(snapshot) | Self::Changed(snapshot) => Some(snapshot),
            Self::PersistFailed { .. } => None,
        }
    }
}
