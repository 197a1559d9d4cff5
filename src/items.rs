//! Line items

use serde::{Deserialize, Serialize};

use crate::prices::Price;

/// Opaque identifier of a priced good, issued by the catalog service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductRef(String);

impl ProductRef {
    /// Creates a new product reference.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The reference as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ProductRef {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

/// Selected purity/grade of a good.
///
/// Part of line-item identity: two items with the same product but different
/// variants are distinct.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VariantKey(String);

impl VariantKey {
    /// Creates a new variant key.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for VariantKey {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

/// A single cart line item as returned by the cart service.
///
/// `current_unit_price` is authoritative for the most recent server response;
/// `last_known_unit_price` is the price the shopper last confirmed. The two
/// only converge again through the explicit acknowledge flow, never silently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// Product this line refers to.
    #[serde(rename = "productId")]
    pub product_ref: ProductRef,

    /// Selected purity/grade.
    #[serde(rename = "purity")]
    pub variant_key: VariantKey,

    /// Units of the product in the cart, always at least 1.
    pub quantity: u32,

    /// Unit price recorded when this item was last confirmed by the shopper.
    #[serde(rename = "lastKnownPrice")]
    pub last_known_unit_price: Price,

    /// Unit price from the most recent server response.
    #[serde(rename = "unitPrice")]
    pub current_unit_price: Price,
}

impl LineItem {
    /// Whether the server price has silently diverged from the price the
    /// shopper last confirmed.
    #[must_use]
    pub fn price_change_warning(&self) -> bool {
        self.current_unit_price != self.last_known_unit_price
    }

    /// Line total at the last confirmed unit price.
    #[must_use]
    pub fn last_known_line_total(&self) -> Price {
        self.last_known_unit_price.times(self.quantity)
    }

    /// Line total at the current server unit price.
    #[must_use]
    pub fn current_line_total(&self) -> Price {
        self.current_unit_price.times(self.quantity)
    }

    /// Whether this line matches the given identity.
    #[must_use]
    pub fn matches(&self, product_ref: &ProductRef, variant_key: &VariantKey) -> bool {
        self.product_ref == *product_ref && self.variant_key == *variant_key
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(last_known: u64, current: u64) -> LineItem {
        LineItem {
            product_ref: ProductRef::from("ring-001"),
            variant_key: VariantKey::from("22K"),
            quantity: 2,
            last_known_unit_price: Price::new(last_known),
            current_unit_price: Price::new(current),
        }
    }

    #[test]
    fn no_warning_when_prices_match() {
        assert!(!item(10_000, 10_000).price_change_warning());
    }

    #[test]
    fn warning_when_price_diverged() {
        assert!(item(10_000, 10_500).price_change_warning());
    }

    #[test]
    fn line_totals_multiply_by_quantity() {
        let item = item(10_000, 10_500);

        assert_eq!(item.last_known_line_total(), Price::new(20_000));
        assert_eq!(item.current_line_total(), Price::new(21_000));
    }

    #[test]
    fn identity_includes_variant() {
        let item = item(10_000, 10_000);

        assert!(item.matches(&ProductRef::from("ring-001"), &VariantKey::from("22K")));
        assert!(!item.matches(&ProductRef::from("ring-001"), &VariantKey::from("18K")));
    }

    #[test]
    fn deserializes_from_wire_shape() {
        let json = r#"{
            "productId": "ring-001",
            "purity": "22K",
            "quantity": 2,
            "lastKnownPrice": 10000,
            "unitPrice": 10500,
            "priceChangeWarning": true
        }"#;

        let item: LineItem = serde_json::from_str(json).expect("line item should deserialize");

        assert_eq!(item.product_ref, ProductRef::from("ring-001"));
        assert_eq!(item.quantity, 2);
        assert!(item.price_change_warning());
    }
}
