//! Task-scoped access to the active cart.
//!
//! UI code deep in a call tree can reach the session's cart without having it
//! threaded through every signature:
//!
//! ```rust,ignore
//! store.scope(async {
//!     let cart = marketplace_cart::scope::current()?;
//!     cart.add_to_cart(item)?;
//!     Ok::<_, CartError>(())
//! }).await?;
//! ```
//!
//! Outside of a scope [`current`] fails with [`CartError::OutsideScope`]
//! instead of handing back an empty stand-in cart.

use std::future::Future;

use crate::error::{CartError, Result};
use crate::store::CartStore;

tokio::task_local! {
    static ACTIVE_CART: CartStore;
}

impl CartStore {
    /// Run `fut` with this store installed as the task's active cart.
    pub async fn scope<F>(&self, fut: F) -> F::Output
    where
        F: Future,
    {
        ACTIVE_CART.scope(self.clone(), fut).await
    }
}

/// The cart installed by the enclosing [`CartStore::scope`].
///
/// # Errors
///
/// Returns [`CartError::OutsideScope`] when called outside of a scope and
/// [`CartError::Closed`] if the scoped store has been shut down.
pub fn current() -> Result<CartStore> {
    let store = ACTIVE_CART
        .try_with(CartStore::clone)
        .map_err(|_| CartError::OutsideScope)?;
    if store.is_closed() {
        return Err(CartError::Closed);
    }
    Ok(store)
}
