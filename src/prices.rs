//! Prices

use std::fmt;
use std::ops::Deref;

use serde::{Deserialize, Serialize};

/// Represents a price in minor currency units (paise/cents).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Price {
    value: u64,
}

impl Price {
    /// Creates a new Price
    #[must_use]
    pub fn new(value: u64) -> Self {
        Price { value }
    }

    /// A zero price.
    #[must_use]
    pub fn zero() -> Self {
        Price { value: 0 }
    }

    /// The price in minor units.
    #[must_use]
    pub fn minor_units(self) -> u64 {
        self.value
    }

    /// Line total: this unit price multiplied by a quantity, saturating at
    /// `u64::MAX`.
    #[must_use]
    pub fn times(self, quantity: u32) -> Self {
        Price {
            value: self.value.saturating_mul(u64::from(quantity)),
        }
    }

    /// Adds another price, saturating at `u64::MAX`.
    #[must_use]
    pub fn saturating_add(self, other: Self) -> Self {
        Price {
            value: self.value.saturating_add(other.value),
        }
    }
}

impl Deref for Price {
    type Target = u64;

    fn deref(&self) -> &Self::Target {
        &self.value
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}
