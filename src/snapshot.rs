//! Cart snapshots

use serde::{Deserialize, Serialize};

use crate::{
    items::{LineItem, ProductRef, VariantKey},
    lock::PriceLock,
    prices::Price,
};

/// Server-computed monetary aggregates for a cart.
///
/// Always accepted as given; the client never recomputes these from line
/// items, so client and server rounding/tax rules cannot drift apart.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartSummary {
    /// Sum of line totals before tax and shipping.
    pub subtotal: Price,

    /// Tax on the subtotal.
    pub tax: Price,

    /// Shipping charge.
    pub shipping: Price,

    /// Amount payable.
    pub total: Price,
}

impl CartSummary {
    /// An all-zero summary, the state of an empty cart.
    #[must_use]
    pub fn zero() -> Self {
        Self::default()
    }
}

/// The full authoritative view of one cart: items, aggregates and the price
/// lock issued alongside them.
///
/// This is the wholesale-replace unit. Every successful cart operation
/// substitutes the local snapshot with the server's response in its entirety;
/// nothing is ever merged field by field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartSnapshot {
    /// Line items currently in the cart.
    #[serde(default)]
    pub items: Vec<LineItem>,

    /// Server-computed aggregates.
    #[serde(default)]
    pub summary: CartSummary,

    /// Lock descriptor issued with this snapshot.
    #[serde(default)]
    pub price_lock: PriceLock,
}

impl CartSnapshot {
    /// An empty cart with a zero summary and no lock.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether the cart holds no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Looks up a line item by its identity.
    #[must_use]
    pub fn find_item(&self, product_ref: &ProductRef, variant_key: &VariantKey) -> Option<&LineItem> {
        self.items
            .iter()
            .find(|item| item.matches(product_ref, variant_key))
    }
}
