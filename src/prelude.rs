//! Carat prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    items::{LineItem, ProductRef, VariantKey},
    lock::{LockState, LockStatus, PriceLock},
    prices::Price,
    reconcile::{ReconciliationView, evaluate},
    service::{
        CartService, CartServiceError, NewItem, PricingService, UnitQuote,
        http::{StorefrontClient, StorefrontConfig},
    },
    snapshot::{CartSnapshot, CartSummary},
    store::{CartStore, CheckoutError},
};
