//! Cart store
//!
//! The single mutable "current snapshot" and the orchestration around it.
//! All pricing logic lives in the pure [`lock`](crate::lock) and
//! [`reconcile`](crate::reconcile) modules; this layer performs the network
//! calls, serializes mutations per cart, and applies each successful
//! response as a wholesale replacement of local state.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use jiff::Timestamp;
use thiserror::Error;
use tracing::{info, warn};

use crate::{
    items::{LineItem, ProductRef, VariantKey},
    lock::{LockStatus, PriceLock},
    prices::Price,
    reconcile::{self, ReconciliationView},
    service::{CartService, CartServiceError, NewItem, PricingService, UnitQuote},
    snapshot::{CartSnapshot, CartSummary},
};

/// Why checkout is currently blocked.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CheckoutError {
    /// There is nothing to check out.
    #[error("cart is empty")]
    EmptyCart,

    /// Prices changed since the shopper last confirmed them; the
    /// reconciliation view must be accepted first.
    #[error("price changes must be acknowledged: old total {old_total}, new total {new_total}")]
    ReconciliationRequired {
        /// Whole-cart total at the last confirmed prices.
        old_total: Price,
        /// Server subtotal at current prices.
        new_total: Price,
    },

    /// No valid price lock covers this instant.
    #[error("price lock expired or absent")]
    LockExpired,
}

struct StoreState {
    snapshot: CartSnapshot,
    applied_seq: u64,
}

/// Orchestrates one shopper's cart against the external cart and pricing
/// services.
///
/// Mutations are serialized per cart by an async mutex, so two in-flight
/// wholesale replacements can never interleave. Reads (views, the checkout
/// gate, countdown ticks) go through a plain mutex over the current snapshot
/// and never wait on an in-flight network call.
pub struct CartStore {
    cart: Arc<dyn CartService>,
    pricing: Arc<dyn PricingService>,
    state: Mutex<StoreState>,
    op: tokio::sync::Mutex<()>,
    next_seq: AtomicU64,
}

impl fmt::Debug for CartStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CartStore")
            .field("snapshot", &self.snapshot())
            .finish_non_exhaustive()
    }
}

impl CartStore {
    /// Creates a store over the given external services, starting from an
    /// empty, unlocked cart.
    #[must_use]
    pub fn new(cart: Arc<dyn CartService>, pricing: Arc<dyn PricingService>) -> Self {
        Self {
            cart,
            pricing,
            state: Mutex::new(StoreState {
                snapshot: CartSnapshot::empty(),
                applied_seq: 0,
            }),
            op: tokio::sync::Mutex::new(()),
            next_seq: AtomicU64::new(0),
        }
    }

    fn state(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn take_seq(&self) -> u64 {
        self.next_seq.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Applies a response iff it is newer than the last applied one. Late
    /// responses from superseded requests are discarded rather than allowed
    /// to resurrect stale state.
    fn apply(&self, seq: u64, snapshot: CartSnapshot) {
        let mut state = self.state();

        if seq <= state.applied_seq {
            warn!(seq, applied_seq = state.applied_seq, "discarding stale response");
            return;
        }

        state.applied_seq = seq;
        state.snapshot = snapshot;
    }

    /// The current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> CartSnapshot {
        self.state().snapshot.clone()
    }

    /// The current line items.
    #[must_use]
    pub fn items(&self) -> Vec<LineItem> {
        self.state().snapshot.items.clone()
    }

    /// The current server-computed summary.
    #[must_use]
    pub fn summary(&self) -> CartSummary {
        self.state().snapshot.summary
    }

    /// The current price-lock descriptor.
    #[must_use]
    pub fn price_lock(&self) -> PriceLock {
        self.state().snapshot.price_lock.clone()
    }

    /// The reconciliation view derived from the current snapshot.
    #[must_use]
    pub fn reconciliation(&self) -> ReconciliationView {
        let state = self.state();

        reconcile::evaluate(&state.snapshot.items, &state.snapshot.summary)
    }

    /// Countdown status of the current lock at `now`.
    #[must_use]
    pub fn lock_status(&self, now: Timestamp) -> LockStatus {
        self.state().snapshot.price_lock.tick(now)
    }

    /// Evaluates the checkout gate at `now`.
    ///
    /// All conditions are checked at call time, never cached: the cart must
    /// be non-empty, no price-change warnings may be pending, and a lock must
    /// be valid strictly before its expiry.
    ///
    /// # Errors
    ///
    /// Returns the specific [`CheckoutError`] describing why checkout is
    /// blocked.
    pub fn checkout_gate(&self, now: Timestamp) -> Result<(), CheckoutError> {
        let state = self.state();

        if state.snapshot.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let view = reconcile::evaluate(&state.snapshot.items, &state.snapshot.summary);

        if view.requires_acknowledgment {
            return Err(CheckoutError::ReconciliationRequired {
                old_total: view.old_total,
                new_total: view.new_total,
            });
        }

        if !state.snapshot.price_lock.is_valid(now) {
            return Err(CheckoutError::LockExpired);
        }

        Ok(())
    }

    /// Replaces the local cart with the server's current view.
    ///
    /// # Errors
    ///
    /// Surfaces the service error unmodified; local state is untouched on
    /// failure.
    #[tracing::instrument(skip(self))]
    pub async fn fetch(&self) -> Result<(), CartServiceError> {
        let _guard = self.op.lock().await;
        let seq = self.take_seq();

        let snapshot = self.cart.fetch_cart().await?;

        self.apply(seq, snapshot);

        Ok(())
    }

    /// Adds an item to the cart and replaces local state with the server's
    /// recomputed snapshot.
    ///
    /// No optimistic update is applied: optimistic pricing could hide a real
    /// price change.
    ///
    /// # Errors
    ///
    /// Rejects `quantity < 1` locally without a network call; otherwise
    /// surfaces the service error unmodified and leaves local state
    /// untouched.
    #[tracing::instrument(
        skip(self),
        fields(product = product_ref.as_str(), variant = variant_key.as_str())
    )]
    pub async fn add_item(
        &self,
        product_ref: &ProductRef,
        variant_key: &VariantKey,
        quantity: u32,
    ) -> Result<(), CartServiceError> {
        if quantity < 1 {
            return Err(CartServiceError::Validation(
                "quantity must be at least 1".to_owned(),
            ));
        }

        let _guard = self.op.lock().await;
        let seq = self.take_seq();

        let snapshot = self
            .cart
            .add_item(NewItem {
                product_ref: product_ref.clone(),
                variant_key: variant_key.clone(),
                quantity,
            })
            .await?;

        self.apply(seq, snapshot);

        Ok(())
    }

    /// Sets an item's quantity and replaces local state with the server's
    /// recomputed snapshot.
    ///
    /// # Errors
    ///
    /// Rejects `quantity < 1` locally without a network call (removal is a
    /// distinct operation); otherwise surfaces the service error unmodified
    /// and leaves local state untouched.
    #[tracing::instrument(
        skip(self),
        fields(product = product_ref.as_str(), variant = variant_key.as_str())
    )]
    pub async fn update_item(
        &self,
        product_ref: &ProductRef,
        variant_key: &VariantKey,
        quantity: u32,
    ) -> Result<(), CartServiceError> {
        if quantity < 1 {
            return Err(CartServiceError::Validation(
                "quantity must be at least 1".to_owned(),
            ));
        }

        let _guard = self.op.lock().await;
        let seq = self.take_seq();

        let snapshot = self
            .cart
            .update_item(product_ref.clone(), variant_key.clone(), quantity)
            .await?;

        self.apply(seq, snapshot);

        Ok(())
    }

    /// Removes an item and replaces local state with the server's recomputed
    /// snapshot.
    ///
    /// # Errors
    ///
    /// Surfaces the service error unmodified; local state is untouched on
    /// failure.
    #[tracing::instrument(
        skip(self),
        fields(product = product_ref.as_str(), variant = variant_key.as_str())
    )]
    pub async fn remove_item(
        &self,
        product_ref: &ProductRef,
        variant_key: &VariantKey,
    ) -> Result<(), CartServiceError> {
        let _guard = self.op.lock().await;
        let seq = self.take_seq();

        let snapshot = self
            .cart
            .remove_item(product_ref.clone(), variant_key.clone())
            .await?;

        self.apply(seq, snapshot);

        Ok(())
    }

    /// Empties the cart.
    ///
    /// The service acknowledges only; on success local state is reset to an
    /// empty snapshot immediately: zero summary, no lock, nothing left to be
    /// stale about.
    ///
    /// # Errors
    ///
    /// Surfaces the service error unmodified; local state is untouched on
    /// failure.
    #[tracing::instrument(skip(self))]
    pub async fn clear(&self) -> Result<(), CartServiceError> {
        let _guard = self.op.lock().await;
        let seq = self.take_seq();

        self.cart.clear_cart().await?;

        self.apply(seq, CartSnapshot::empty());

        Ok(())
    }

    /// Accepts all pending price-change warnings.
    ///
    /// This is the only path that resets `last_known_unit_price` to the
    /// current server price. It clears the warning display; it does not
    /// establish a new lock, so callers must re-fetch the cart afterwards to
    /// obtain one.
    pub fn acknowledge(&self) {
        let mut state = self.state();

        let mut accepted = 0_u32;

        for item in &mut state.snapshot.items {
            if item.price_change_warning() {
                item.last_known_unit_price = item.current_unit_price;
                accepted += 1;
            }
        }

        info!(accepted, "price changes acknowledged");
    }

    /// Requests a fresh price lock, then re-fetches the cart so items reflect
    /// the newly locked rates.
    ///
    /// # Errors
    ///
    /// On failure the lock state stays expired/unlocked and checkout remains
    /// blocked; retry is explicit and caller-initiated.
    #[tracing::instrument(skip(self))]
    pub async fn refresh_lock(&self) -> Result<(), CartServiceError> {
        let _guard = self.op.lock().await;
        let seq = self.take_seq();

        let lock = self.pricing.lock_prices().await?;

        info!(expires_at = ?lock.expires_at, "price lock refreshed");

        let mut snapshot = self.cart.fetch_cart().await?;

        // The fetched snapshot normally carries the new lock already; fall
        // back to the lock response if the cart service lagged behind.
        if !snapshot.price_lock.locked {
            snapshot.price_lock = lock;
        }

        self.apply(seq, snapshot);

        Ok(())
    }

    /// Current authoritative unit prices for everything in the cart.
    ///
    /// Read-only preview against the pricing service; never mutates the cart.
    ///
    /// # Errors
    ///
    /// Surfaces the pricing service error unmodified.
    pub async fn live_quotes(&self) -> Result<Vec<UnitQuote>, CartServiceError> {
        let pairs: Vec<(ProductRef, VariantKey)> = self
            .state()
            .snapshot
            .items
            .iter()
            .map(|item| (item.product_ref.clone(), item.variant_key.clone()))
            .collect();

        if pairs.is_empty() {
            return Ok(Vec::new());
        }

        self.pricing.unit_prices(pairs).await
    }

    /// Drives the lock countdown, invoking `on_tick` roughly once per second
    /// with the remaining time.
    ///
    /// Ticks are computed purely from local timestamps, so they are never
    /// blocked by an in-flight mutation. The loop stops as soon as the lock
    /// is inactive, and invokes `on_tick` one final time with
    /// [`LockStatus::Expired`] when the window closes; the embedding
    /// application decides whether to prompt for a refresh.
    pub async fn watch_lock<F>(&self, mut on_tick: F)
    where
        F: FnMut(LockStatus),
    {
        let mut interval = tokio::time::interval(Duration::from_secs(1));

        loop {
            interval.tick().await;

            match self.lock_status(Timestamp::now()) {
                LockStatus::Inactive => break,
                status @ LockStatus::Remaining(_) => on_tick(status),
                LockStatus::Expired => {
                    on_tick(LockStatus::Expired);
                    break;
                }
            }
        }
    }
}
