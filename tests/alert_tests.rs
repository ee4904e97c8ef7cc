//! Alert engine tests
//!
//! Tests for low-stock alert derivation:
//! - The alert predicate over quantity, threshold and active flag
//! - A threshold of 0 disables alerting
//! - Evaluation decisions are idempotent

use proptest::prelude::*;

use stocktrack_backend::services::alerts::{alert_message, should_alert};

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// An alert is due when quantity is at or below the threshold
    #[test]
    fn test_alert_at_or_below_threshold() {
        assert!(should_alert(5, 10, true));
        assert!(should_alert(10, 10, true)); // boundary: equal counts as low
        assert!(!should_alert(11, 10, true));
    }

    /// A threshold of 0 disables alerting entirely, even at zero stock
    #[test]
    fn test_zero_threshold_disables_alerting() {
        assert!(!should_alert(0, 0, true));
        assert!(!should_alert(5, 0, true));
    }

    /// Inactive products never alert
    #[test]
    fn test_inactive_product_never_alerts() {
        assert!(!should_alert(0, 10, false));
        assert!(!should_alert(5, 10, false));
    }

    /// A restock above the threshold clears the alert condition
    #[test]
    fn test_restock_clears_alert_condition() {
        // quantity 5, threshold 10: alerting
        assert!(should_alert(5, 10, true));
        // after +20 restock: recovered
        assert!(!should_alert(25, 10, true));
    }

    /// An adjustment down to the threshold creates the alert condition
    #[test]
    fn test_adjustment_to_threshold_alerts() {
        // quantity 10, threshold 10, adjustment of -3
        assert!(should_alert(7, 10, true));
    }

    /// The stored message names the product, SKU, quantity and threshold
    #[test]
    fn test_alert_message_contents() {
        let message = alert_message("Widget", "W-100", 3, 10);
        assert_eq!(
            message,
            "Low stock alert: Widget (SKU: W-100) has 3 units remaining (threshold: 10)"
        );
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// The predicate is a pure function of its inputs: re-evaluating the
        /// same state always yields the same decision, which is what makes
        /// redundant evaluation safe
        #[test]
        fn prop_evaluation_is_idempotent(
            quantity in 0i32..=10_000,
            threshold in 0i32..=10_000,
            is_active in any::<bool>()
        ) {
            let first = should_alert(quantity, threshold, is_active);
            let second = should_alert(quantity, threshold, is_active);
            prop_assert_eq!(first, second);
        }

        /// An open alert is due exactly when the product is active, the
        /// threshold is enabled and quantity is at or below it
        #[test]
        fn prop_alert_iff_low(
            quantity in 0i32..=10_000,
            threshold in 0i32..=10_000,
            is_active in any::<bool>()
        ) {
            let expected = is_active && threshold > 0 && quantity <= threshold;
            prop_assert_eq!(should_alert(quantity, threshold, is_active), expected);
        }

        /// Disabled thresholds never alert regardless of quantity
        #[test]
        fn prop_zero_threshold_never_alerts(quantity in 0i32..=10_000) {
            prop_assert!(!should_alert(quantity, 0, true));
        }
    }
}
