//! Cart commands.
//!
//! Every command opens the file-backed cart, waits for it to load, applies
//! at most one change, prints the result, and shuts the store down so the
//! change is on disk before the process exits.

use std::fmt::Write as _;

use marketplace_cart::{CartConfig, CartError, CartStore, ConfigError, Snapshot};
use marketplace_core::{NewLineItem, ProductId};
use thiserror::Error;

/// Errors that can occur while running a cart command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The cart rejected the operation or failed to persist it.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),
}

/// A single cart command.
#[derive(Debug)]
pub enum Action {
    List,
    Add(NewLineItem),
    Increment(ProductId),
    Decrement(ProductId),
}

/// Run `action` against the cart configured in the environment.
///
/// # Errors
///
/// Returns an error if configuration is invalid, the product is not in the
/// cart, or the updated cart cannot be written.
pub async fn execute(action: Action) -> Result<(), CommandError> {
    let config = CartConfig::from_env()?;
    tracing::debug!(dir = %config.storage_dir.display(), "Opening cart");

    let store = CartStore::open(config.file_store(), &config);
    store.ready().await;

    let result = apply(&store, action);
    // Shut down even when the change was rejected so the writer drains.
    let closed = store.shutdown().await;

    let snapshot = result?;
    closed?;
    render(&snapshot);
    Ok(())
}

fn apply(store: &CartStore, action: Action) -> Result<Snapshot, CartError> {
    match action {
        Action::List => Ok(store.products()),
        Action::Add(item) => {
            tracing::info!(product = %item.id, "Adding to cart");
            store.add_to_cart(item)
        }
        Action::Increment(id) => store.increment(&id),
        Action::Decrement(id) => store.decrement(&id),
    }
}

/// Format the cart as a plain-text table.
fn format_cart(snapshot: &Snapshot) -> String {
    if snapshot.is_empty() {
        return "Cart is empty\n".to_string();
    }

    let mut out = String::new();
    for item in snapshot.iter() {
        let _ = writeln!(
            out,
            "{:>4} x {}  {} @ {}",
            item.quantity, item.id, item.title, item.price
        );
    }
    let _ = writeln!(out, "{} item(s)", snapshot.total_quantity());
    out
}

#[allow(clippy::print_stdout)]
fn render(snapshot: &Snapshot) {
    print!("{}", format_cart(snapshot));
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use marketplace_cart::MemoryStore;
    use rust_decimal::Decimal;

    use super::*;

    fn shirt() -> NewLineItem {
        NewLineItem::new(
            ProductId::parse("p1").unwrap(),
            "Shirt",
            "shirt.png",
            Decimal::new(1000, 2),
        )
    }

    #[tokio::test]
    async fn test_format_empty_cart() {
        let store = CartStore::open(MemoryStore::new(), &CartConfig::default());
        store.ready().await;
        assert_eq!(format_cart(&store.products()), "Cart is empty\n");
    }

    #[tokio::test]
    async fn test_apply_and_format() {
        let store = CartStore::open(MemoryStore::new(), &CartConfig::default());
        store.ready().await;

        apply(&store, Action::Add(shirt())).unwrap();
        let snapshot = apply(&store, Action::Increment(ProductId::parse("p1").unwrap())).unwrap();

        assert_eq!(
            format_cart(&snapshot),
            "   2 x p1  Shirt @ 10.00\n2 item(s)\n"
        );
    }

    #[tokio::test]
    async fn test_apply_missing_product() {
        let store = CartStore::open(MemoryStore::new(), &CartConfig::default());
        store.ready().await;

        let err = apply(&store, Action::Decrement(ProductId::parse("p1").unwrap())).unwrap_err();
        assert!(matches!(err, CartError::NotFound(_)));
    }
}
