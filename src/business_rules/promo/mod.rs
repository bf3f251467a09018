// Promo Engine
//
// "Buy N get M" pizza offer: every complete set of `buy_quantity` paid items in
// the promo category unlocks `get_quantity` free items.

use crate::business_rules::{
    error::{RulesError, RulesResult},
    settings::PromoOffer,
    types::Cart,
};

pub struct PromoEngine;

impl PromoEngine {
    /// Number of free items permitted for `paid_pizza_count` paid items
    ///
    /// # Arguments
    /// * `paid_pizza_count` - Paid units in the promo category
    /// * `promo` - Current offer
    ///
    /// # Returns
    /// `floor(paid / buy_quantity) * get_quantity`, or 0 when the offer is disabled
    ///
    /// # Example
    /// ```
    /// use pizzeria_api::business_rules::{PromoEngine, PromoOffer};
    ///
    /// let promo = PromoOffer { enabled: true, ..PromoOffer::default() };
    /// assert_eq!(PromoEngine::allowance(7, &promo), 2);
    /// assert_eq!(PromoEngine::allowance(2, &promo), 0);
    /// ```
    pub fn allowance(paid_pizza_count: u32, promo: &PromoOffer) -> u32 {
        if !promo.enabled || promo.buy_quantity == 0 {
            return 0;
        }
        let sets = paid_pizza_count / promo.buy_quantity;
        sets.saturating_mul(promo.get_quantity)
    }

    /// Paid units in the promo category; free and reward lines are not paid
    pub fn paid_pizza_count(cart: &Cart, promo: &PromoOffer) -> u32 {
        cart.lines
            .iter()
            .filter(|line| line.is_paid() && promo.matches_category(&line.category))
            .map(|line| line.quantity)
            .sum()
    }

    /// Verify the cart's free units fit within the allowance; returns the allowance
    pub fn check(cart: &Cart, promo: &PromoOffer) -> RulesResult<u32> {
        let allowed = Self::allowance(Self::paid_pizza_count(cart, promo), promo);
        let requested = cart.free_units();

        if requested > allowed {
            return Err(RulesError::PromoAllowanceExceeded { allowed, requested });
        }
        Ok(allowed)
    }
}
