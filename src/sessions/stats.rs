use rust_decimal::{Decimal, RoundingStrategy};

use crate::sessions::models::{ItemQuantity, SessionStats, SessionTotals};

/// Computes the closing statistics of a service session
pub struct SessionStatsCalculator;

impl SessionStatsCalculator {
    /// Average ticket rounded to cents; 0 when there are no orders
    ///
    /// # Arguments
    /// * `revenue` - Sum of the session's order totals
    /// * `order_count` - Number of orders tagged to the session
    ///
    /// # Example
    /// ```
    /// use pizzeria_api::sessions::SessionStatsCalculator;
    /// use rust_decimal::Decimal;
    ///
    /// let average = SessionStatsCalculator::average_ticket(Decimal::new(1000, 2), 3);
    /// assert_eq!(average, Decimal::new(333, 2));
    /// ```
    pub fn average_ticket(revenue: Decimal, order_count: i64) -> Decimal {
        if order_count <= 0 {
            return Decimal::ZERO;
        }
        (revenue / Decimal::from(order_count))
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    }

    /// Name of the product with the highest summed quantity; ties go to the
    /// lowest product id
    pub fn top_item(items: &[ItemQuantity]) -> Option<String> {
        items
            .iter()
            .filter(|item| item.quantity > 0)
            .max_by(|a, b| {
                a.quantity
                    .cmp(&b.quantity)
                    .then_with(|| b.product_id.cmp(&a.product_id))
            })
            .map(|item| item.name.clone())
    }

    pub fn compute(totals: SessionTotals, items: &[ItemQuantity]) -> SessionStats {
        SessionStats {
            total_revenue: totals.revenue,
            order_count: totals.order_count,
            average_ticket: Self::average_ticket(totals.revenue, totals.order_count),
            top_item: Self::top_item(items),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn item(product_id: i32, name: &str, quantity: i64) -> ItemQuantity {
        ItemQuantity {
            product_id,
            name: name.to_string(),
            quantity,
        }
    }

    #[test]
    fn test_empty_session_yields_zeros() {
        let stats = SessionStatsCalculator::compute(SessionTotals::default(), &[]);
        assert_eq!(stats, SessionStats::default());
        assert_eq!(stats.average_ticket, Decimal::ZERO);
        assert!(stats.top_item.is_none());
    }

    #[test]
    fn test_average_ticket_rounds_half_away_from_zero() {
        // 10 / 3 = 3.333...
        assert_eq!(SessionStatsCalculator::average_ticket(dec!(10), 3), dec!(3.33));
        // 0.125 -> 0.13
        assert_eq!(SessionStatsCalculator::average_ticket(dec!(0.25), 2), dec!(0.13));
        assert_eq!(SessionStatsCalculator::average_ticket(dec!(45.60), 2), dec!(22.80));
    }

    #[test]
    fn test_top_item_highest_quantity() {
        let items = vec![item(1, "Margherita", 4), item(2, "Regina", 7), item(3, "Tiramisu", 2)];
        assert_eq!(SessionStatsCalculator::top_item(&items).as_deref(), Some("Regina"));
    }

    #[test]
    fn test_top_item_tie_goes_to_lowest_product_id() {
        let items = vec![item(9, "Calzone", 5), item(2, "Regina", 5), item(5, "Diavola", 5)];
        assert_eq!(SessionStatsCalculator::top_item(&items).as_deref(), Some("Regina"));
    }

    proptest! {
        /// Average ticket times count stays within half a cent per order of revenue
        #[test]
        fn prop_average_ticket_close_to_exact(revenue_cents in 0i64..10_000_000, count in 1i64..500) {
            let revenue = Decimal::new(revenue_cents, 2);
            let average = SessionStatsCalculator::average_ticket(revenue, count);
            let diff = (average * Decimal::from(count) - revenue).abs();
            prop_assert!(diff <= dec!(0.005) * Decimal::from(count));
        }
    }
}
