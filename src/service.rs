//! External service contracts
//!
//! The engine consumes two collaborators it does not implement: the cart
//! persistence service, which owns the authoritative cart and recomputes
//! warnings and summaries on every mutation, and the pricing service, which
//! issues price locks and quotes current commodity-backed unit prices.

pub mod http;

use async_trait::async_trait;
use mockall::automock;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    items::{ProductRef, VariantKey},
    lock::PriceLock,
    prices::Price,
    snapshot::CartSnapshot,
};

/// Errors reported by the external cart and pricing services, plus local
/// validation failures caught before any network call.
#[derive(Debug, Error)]
pub enum CartServiceError {
    /// The request was malformed: bad quantity, unknown variant, and so on.
    #[error("{0}")]
    Validation(String),

    /// The item or product no longer exists.
    #[error("item or product not found")]
    NotFound,

    /// Price or stock changed concurrently. The cart service folds this into
    /// a warning-flagged snapshot instead; a hard conflict is rare.
    #[error("{0}")]
    Conflict(String),

    /// Transport failure.
    #[error("transport error")]
    Network(#[source] reqwest::Error),

    /// The service answered with something this client cannot interpret.
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),
}

impl From<reqwest::Error> for CartServiceError {
    fn from(error: reqwest::Error) -> Self {
        Self::Network(error)
    }
}

/// Payload for adding an item to the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewItem {
    /// Product to add.
    #[serde(rename = "productId")]
    pub product_ref: ProductRef,

    /// Selected purity/grade.
    #[serde(rename = "purity")]
    pub variant_key: VariantKey,

    /// Units to add, at least 1.
    pub quantity: u32,
}

/// A current authoritative unit price for one product/variant pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitQuote {
    /// Product the quote is for.
    #[serde(rename = "productId")]
    pub product_ref: ProductRef,

    /// Purity/grade the quote is for.
    #[serde(rename = "purity")]
    pub variant_key: VariantKey,

    /// Current unit price.
    #[serde(rename = "unitPrice")]
    pub unit_price: Price,
}

/// The external cart persistence service.
///
/// Every mutation returns the full recomputed snapshot: items with
/// server-evaluated price warnings, aggregates, and the lock descriptor
/// issued alongside them. [`clear_cart`](CartService::clear_cart) is the one
/// exception: it acknowledges only, and the client resets to an empty
/// snapshot itself.
#[automock]
#[async_trait]
pub trait CartService: Send + Sync {
    /// Retrieve the authoritative cart snapshot.
    async fn fetch_cart(&self) -> Result<CartSnapshot, CartServiceError>;

    /// Add an item, returning the recomputed snapshot.
    async fn add_item(&self, item: NewItem) -> Result<CartSnapshot, CartServiceError>;

    /// Change an item's quantity, returning the recomputed snapshot.
    async fn update_item(
        &self,
        product_ref: ProductRef,
        variant_key: VariantKey,
        quantity: u32,
    ) -> Result<CartSnapshot, CartServiceError>;

    /// Remove an item, returning the recomputed snapshot.
    async fn remove_item(
        &self,
        product_ref: ProductRef,
        variant_key: VariantKey,
    ) -> Result<CartSnapshot, CartServiceError>;

    /// Delete the whole cart. Acknowledgment only.
    async fn clear_cart(&self) -> Result<(), CartServiceError>;
}

/// The external pricing service.
#[automock]
#[async_trait]
pub trait PricingService: Send + Sync {
    /// Request a fresh price lock.
    ///
    /// The service re-prices the cart at the newly locked rates as a side
    /// effect; callers must re-fetch the cart to observe that.
    async fn lock_prices(&self) -> Result<PriceLock, CartServiceError>;

    /// Current authoritative unit prices for the given product/variant pairs.
    async fn unit_prices(
        &self,
        pairs: Vec<(ProductRef, VariantKey)>,
    ) -> Result<Vec<UnitQuote>, CartServiceError>;
}
