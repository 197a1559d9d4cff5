//! Carat
//!
//! Carat is a cart price-lock and staleness-reconciliation engine for
//! storefronts whose prices track a fluctuating commodity rate.
//!
//! The engine keeps a shopper's displayed prices consistent with live
//! gold/metal pricing for a bounded, server-issued lock window, detects when
//! server-side prices have silently diverged from what the shopper last
//! confirmed, and forces an explicit re-acceptance step before checkout can
//! proceed. The authoritative cart and the commodity rate itself belong to
//! external services; this crate owns only the reconciliation logic and the
//! lock state machine built on top of their contracts.

pub mod items;
pub mod lock;
pub mod prelude;
pub mod prices;
pub mod reconcile;
pub mod service;
pub mod snapshot;
pub mod store;
