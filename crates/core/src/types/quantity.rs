//! Line item quantity.

use core::fmt;
use core::num::NonZeroU32;

use serde::{Deserialize, Serialize};

/// Errors that can occur when constructing a [`Quantity`].
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityError {
    /// Zero is not a valid quantity for an item in the cart.
    #[error("quantity must be at least 1")]
    Zero,
}

/// Number of units of a product held in the cart.
///
/// A quantity is always at least 1. An item whose quantity would drop to
/// zero leaves the cart instead, so there is no representation for it here.
///
/// ## Examples
///
/// ```
/// use marketplace_core::Quantity;
///
/// let one = Quantity::ONE;
/// let two = one.increment().unwrap();
/// assert_eq!(two.get(), 2);
/// assert_eq!(two.decrement(), Some(one));
/// assert_eq!(one.decrement(), None);
/// assert!(Quantity::new(0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Quantity(NonZeroU32);

impl Quantity {
    /// A single unit.
    pub const ONE: Self = Self(NonZeroU32::MIN);

    /// Create a quantity from a raw count.
    ///
    /// # Errors
    ///
    /// Returns [`QuantityError::Zero`] if `n` is zero.
    pub const fn new(n: u32) -> Result<Self, QuantityError> {
        match NonZeroU32::new(n) {
            Some(n) => Ok(Self(n)),
            None => Err(QuantityError::Zero),
        }
    }

    /// Get the underlying count.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0.get()
    }

    /// One more unit, or `None` on overflow.
    #[must_use]
    pub const fn increment(self) -> Option<Self> {
        match self.0.checked_add(1) {
            Some(n) => Some(Self(n)),
            None => None,
        }
    }

    /// One fewer unit, or `None` when the last unit is taken away.
    #[must_use]
    pub const fn decrement(self) -> Option<Self> {
        match NonZeroU32::new(self.0.get() - 1) {
            Some(n) => Some(Self(n)),
            None => None,
        }
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_zero() {
        assert_eq!(Quantity::new(0), Err(QuantityError::Zero));
        assert_eq!(Quantity::new(3).unwrap().get(), 3);
    }

    #[test]
    fn test_increment_overflow() {
        let max = Quantity::new(u32::MAX).unwrap();
        assert_eq!(max.increment(), None);
    }

    #[test]
    fn test_decrement_to_zero_is_none() {
        assert_eq!(Quantity::ONE.decrement(), None);
        assert_eq!(
            Quantity::new(3).unwrap().decrement(),
            Some(Quantity::new(2).unwrap())
        );
    }

    #[test]
    fn test_deserialize_rejects_zero() {
        assert!(serde_json::from_str::<Quantity>("0").is_err());
        assert_eq!(serde_json::from_str::<Quantity>("4").unwrap().get(), 4);
    }
}
