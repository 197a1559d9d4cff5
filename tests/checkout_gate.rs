//! Properties of the checkout gate and the wholesale-replace contract.

use std::sync::Arc;

use jiff::{SignedDuration, Timestamp};
use mockall::predicate::eq;
use testresult::TestResult;

use carat::{
    prelude::*,
    service::{MockCartService, MockPricingService},
};

fn item(product: &str, quantity: u32, last_known: u64, current: u64) -> LineItem {
    LineItem {
        product_ref: ProductRef::from(product),
        variant_key: VariantKey::from("22K"),
        quantity,
        last_known_unit_price: Price::new(last_known),
        current_unit_price: Price::new(current),
    }
}

fn snapshot(items: Vec<LineItem>, subtotal: u64, lock: PriceLock) -> CartSnapshot {
    CartSnapshot {
        items,
        summary: CartSummary {
            subtotal: Price::new(subtotal),
            tax: Price::zero(),
            shipping: Price::zero(),
            total: Price::new(subtotal),
        },
        price_lock: lock,
    }
}

fn lock_until(now: Timestamp, duration: SignedDuration) -> PriceLock {
    PriceLock {
        locked: true,
        locked_at: Some(now),
        expires_at: Some(now + duration),
    }
}

async fn store_with(response: CartSnapshot) -> TestResult<CartStore> {
    let mut cart = MockCartService::new();
    cart.expect_fetch_cart()
        .times(1)
        .returning(move || Ok(response.clone()));

    let store = CartStore::new(Arc::new(cart), Arc::new(MockPricingService::new()));

    store.fetch().await?;

    Ok(store)
}

/// Checkout is permitted iff the lock is valid, no acknowledgment is pending
/// and the cart is non-empty. Evaluated per state, nothing cached.
#[tokio::test]
async fn gate_requires_all_three_conditions() -> TestResult {
    let now = Timestamp::now();
    let window = SignedDuration::from_mins(15);

    let clean = snapshot(vec![item("a", 2, 100, 100)], 200, lock_until(now, window));
    let stale = snapshot(vec![item("a", 2, 100, 150)], 300, lock_until(now, window));
    let unlocked = snapshot(vec![item("a", 2, 100, 100)], 200, PriceLock::unlocked());
    let empty = snapshot(vec![], 0, lock_until(now, window));

    assert_eq!(store_with(clean).await?.checkout_gate(now), Ok(()));
    assert!(matches!(
        store_with(stale).await?.checkout_gate(now),
        Err(CheckoutError::ReconciliationRequired { .. })
    ));
    assert_eq!(
        store_with(unlocked).await?.checkout_gate(now),
        Err(CheckoutError::LockExpired)
    );
    assert_eq!(
        store_with(empty).await?.checkout_gate(now),
        Err(CheckoutError::EmptyCart)
    );

    Ok(())
}

/// The instant `now == expires_at` counts as expired; checkout is blocked on
/// the boundary tick.
#[tokio::test]
async fn gate_blocks_on_the_exact_expiry_instant() -> TestResult {
    let now = Timestamp::now();
    let on_boundary = snapshot(
        vec![item("a", 1, 100, 100)],
        100,
        lock_until(now, SignedDuration::ZERO),
    );

    let store = store_with(on_boundary).await?;

    assert_eq!(store.checkout_gate(now), Err(CheckoutError::LockExpired));
    assert_eq!(store.lock_status(now), LockStatus::Expired);

    Ok(())
}

/// `requires_acknowledgment` holds iff at least one item's current price
/// diverged from its last confirmed price.
#[tokio::test]
async fn acknowledgment_required_iff_some_price_diverged() -> TestResult {
    let now = Timestamp::now();
    let window = SignedDuration::from_mins(15);

    let clean = snapshot(
        vec![item("a", 1, 100, 100), item("b", 2, 200, 200)],
        500,
        lock_until(now, window),
    );
    let one_stale = snapshot(
        vec![item("a", 1, 100, 100), item("b", 2, 200, 260)],
        620,
        lock_until(now, window),
    );

    assert!(!store_with(clean).await?.reconciliation().requires_acknowledgment);
    assert!(store_with(one_stale).await?.reconciliation().requires_acknowledgment);

    Ok(())
}

/// Acknowledging and then re-fetching clears the warnings when the server's
/// prices have not moved again in the meantime.
#[tokio::test]
async fn acknowledge_then_fetch_clears_warnings() -> TestResult {
    let now = Timestamp::now();
    let window = SignedDuration::from_mins(15);

    let stale = snapshot(vec![item("a", 2, 100, 150)], 300, lock_until(now, window));
    // After acknowledgment the server echoes the accepted price back as the
    // last confirmed one.
    let settled = snapshot(vec![item("a", 2, 150, 150)], 300, lock_until(now, window));

    let mut cart = MockCartService::new();
    let mut responses = vec![settled, stale];
    cart.expect_fetch_cart().times(2).returning(move || {
        responses
            .pop()
            .ok_or_else(|| CartServiceError::UnexpectedResponse("exhausted".to_owned()))
    });

    let store = CartStore::new(Arc::new(cart), Arc::new(MockPricingService::new()));

    store.fetch().await?;
    assert!(store.reconciliation().requires_acknowledgment);

    store.acknowledge();
    store.fetch().await?;

    assert!(!store.reconciliation().requires_acknowledgment);
    assert_eq!(store.checkout_gate(now), Ok(()));

    Ok(())
}

/// Updating to the same quantity twice lands in the same final state as doing
/// it once, given no intervening price change.
#[tokio::test]
async fn update_to_same_quantity_is_idempotent() -> TestResult {
    let now = Timestamp::now();
    let settled = snapshot(
        vec![item("a", 3, 100, 100)],
        300,
        lock_until(now, SignedDuration::from_mins(15)),
    );

    let mut cart = MockCartService::new();
    let returned = settled.clone();
    cart.expect_update_item()
        .with(eq(ProductRef::from("a")), eq(VariantKey::from("22K")), eq(3))
        .times(2)
        .returning(move |_, _, _| Ok(returned.clone()));

    let store = CartStore::new(Arc::new(cart), Arc::new(MockPricingService::new()));

    store
        .update_item(&ProductRef::from("a"), &VariantKey::from("22K"), 3)
        .await?;
    let after_first = store.snapshot();

    store
        .update_item(&ProductRef::from("a"), &VariantKey::from("22K"), 3)
        .await?;

    assert_eq!(store.snapshot(), after_first);
    assert_eq!(store.snapshot(), settled);

    Ok(())
}

/// After every successful operation the local state is exactly the server's
/// most recent snapshot; nothing local drifts from it.
#[tokio::test]
async fn local_state_tracks_the_latest_server_snapshot() -> TestResult {
    let now = Timestamp::now();
    let window = SignedDuration::from_mins(15);

    let after_add = snapshot(vec![item("a", 1, 100, 100)], 100, lock_until(now, window));
    let after_update = snapshot(vec![item("a", 4, 100, 100)], 400, lock_until(now, window));
    let after_remove = snapshot(vec![], 0, lock_until(now, window));

    let mut cart = MockCartService::new();
    let returned = after_add.clone();
    cart.expect_add_item()
        .times(1)
        .returning(move |_| Ok(returned.clone()));
    let returned = after_update.clone();
    cart.expect_update_item()
        .times(1)
        .returning(move |_, _, _| Ok(returned.clone()));
    let returned = after_remove.clone();
    cart.expect_remove_item()
        .times(1)
        .returning(move |_, _| Ok(returned.clone()));

    let store = CartStore::new(Arc::new(cart), Arc::new(MockPricingService::new()));

    store
        .add_item(&ProductRef::from("a"), &VariantKey::from("22K"), 1)
        .await?;
    assert_eq!(store.snapshot(), after_add);

    store
        .update_item(&ProductRef::from("a"), &VariantKey::from("22K"), 4)
        .await?;
    assert_eq!(store.snapshot(), after_update);

    store
        .remove_item(&ProductRef::from("a"), &VariantKey::from("22K"))
        .await?;
    assert_eq!(store.snapshot(), after_remove);

    Ok(())
}
