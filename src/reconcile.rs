//! Staleness reconciliation
//!
//! Pure derivation layer over the current snapshot. Nothing here performs a
//! network call or mutates cart state; the store decides what to do with the
//! resulting view.

use crate::{items::LineItem, prices::Price, snapshot::CartSummary};

/// Derived comparison between the prices the shopper last confirmed and the
/// server's latest prices.
///
/// Computed on demand, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconciliationView {
    /// Line items whose price silently changed since last confirmation.
    pub affected_items: Vec<LineItem>,

    /// Total over all items at their last confirmed unit prices.
    pub old_total: Price,

    /// The server-computed subtotal at current prices.
    pub new_total: Price,

    /// Whether checkout must be blocked until the shopper accepts the new
    /// prices.
    pub requires_acknowledgment: bool,
}

/// Evaluates the reconciliation view for the given items and summary.
///
/// `old_total` sums every item at its last confirmed price, not just the
/// flagged ones, so the shopper sees the whole-cart delta they are accepting.
#[must_use]
pub fn evaluate(items: &[LineItem], summary: &CartSummary) -> ReconciliationView {
    let affected_items: Vec<LineItem> = items
        .iter()
        .filter(|item| item.price_change_warning())
        .cloned()
        .collect();

    let old_total = items
        .iter()
        .fold(Price::zero(), |acc, item| {
            acc.saturating_add(item.last_known_line_total())
        });

    ReconciliationView {
        requires_acknowledgment: !affected_items.is_empty(),
        affected_items,
        old_total,
        new_total: summary.subtotal,
    }
}

#[cfg(test)]
mod tests {
    use crate::items::{ProductRef, VariantKey};

    use super::*;

    fn item(product: &str, quantity: u32, last_known: u64, current: u64) -> LineItem {
        LineItem {
            product_ref: ProductRef::from(product),
            variant_key: VariantKey::from("22K"),
            quantity,
            last_known_unit_price: Price::new(last_known),
            current_unit_price: Price::new(current),
        }
    }

    fn summary(subtotal: u64) -> CartSummary {
        CartSummary {
            subtotal: Price::new(subtotal),
            ..CartSummary::zero()
        }
    }

    #[test]
    fn no_warnings_means_no_acknowledgment() {
        let items = [item("ring-001", 2, 10_000, 10_000)];

        let view = evaluate(&items, &summary(20_000));

        assert!(!view.requires_acknowledgment);
        assert!(view.affected_items.is_empty());
        assert_eq!(view.old_total, Price::new(20_000));
        assert_eq!(view.new_total, Price::new(20_000));
    }

    #[test]
    fn flagged_item_requires_acknowledgment() {
        let items = [item("ring-001", 2, 10_000, 10_500)];

        let view = evaluate(&items, &summary(21_000));

        assert!(view.requires_acknowledgment);
        assert_eq!(view.affected_items.len(), 1);
        assert_eq!(view.old_total, Price::new(20_000));
        assert_eq!(view.new_total, Price::new(21_000));
    }

    #[test]
    fn old_total_sums_all_items_not_just_affected() {
        let items = [
            item("ring-001", 2, 10_000, 10_500),
            item("chain-002", 1, 5_000, 5_000),
        ];

        let view = evaluate(&items, &summary(26_000));

        assert_eq!(view.affected_items.len(), 1);
        assert_eq!(view.old_total, Price::new(25_000));
    }

    #[test]
    fn empty_cart_needs_nothing() {
        let view = evaluate(&[], &CartSummary::zero());

        assert!(!view.requires_acknowledgment);
        assert_eq!(view.old_total, Price::zero());
        assert_eq!(view.new_total, Price::zero());
    }

    #[test]
    fn acknowledgment_required_iff_any_price_diverged() {
        let all_matching = [
            item("a", 1, 100, 100),
            item("b", 2, 200, 200),
            item("c", 3, 300, 300),
        ];
        let one_diverged = [
            item("a", 1, 100, 100),
            item("b", 2, 200, 250),
            item("c", 3, 300, 300),
        ];

        assert!(!evaluate(&all_matching, &summary(1_400)).requires_acknowledgment);
        assert!(evaluate(&one_diverged, &summary(1_500)).requires_acknowledgment);
    }
}
