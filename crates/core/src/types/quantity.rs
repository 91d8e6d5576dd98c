//! Cart line quantity.

use core::fmt;
use core::num::NonZeroU32;

use serde::{Deserialize, Serialize};

/// Rejected quantity.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityError {
    /// Quantities start at one; removing a line is a separate action.
    #[error("quantity must be at least 1 (got {0})")]
    BelowOne(i64),
}

/// A line quantity, always at least one.
///
/// Deserialization rejects zero, so a cart line read from the server can never
/// carry an empty quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Quantity(NonZeroU32);

impl Quantity {
    /// A single unit.
    pub const ONE: Self = Self(NonZeroU32::MIN);

    /// Validate a requested quantity.
    ///
    /// # Errors
    ///
    /// Returns [`QuantityError::BelowOne`] for zero.
    pub fn new(value: u32) -> Result<Self, QuantityError> {
        NonZeroU32::new(value)
            .map(Self)
            .ok_or(QuantityError::BelowOne(0))
    }

    /// Validate a signed target, as produced by a "-" button on a line at 1.
    ///
    /// # Errors
    ///
    /// Returns [`QuantityError::BelowOne`] for anything below one.
    pub fn from_target(target: i64) -> Result<Self, QuantityError> {
        u32::try_from(target)
            .ok()
            .and_then(NonZeroU32::new)
            .map(Self)
            .ok_or(QuantityError::BelowOne(target))
    }

    /// The quantity as a plain integer.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0.get()
    }
}

impl Default for Quantity {
    fn default() -> Self {
        Self::ONE
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
    fn test_rejects_zero_and_negative() {
        assert_eq!(Quantity::new(0), Err(QuantityError::BelowOne(0)));
        assert_eq!(Quantity::from_target(-1), Err(QuantityError::BelowOne(-1)));
        assert_eq!(Quantity::from_target(3).unwrap().get(), 3);
    }

    #[test]
    fn test_zero_is_not_deserializable() {
        assert!(serde_json::from_str::<Quantity>("0").is_err());
        assert_eq!(serde_json::from_str::<Quantity>("2").unwrap().get(), 2);
    }
}
