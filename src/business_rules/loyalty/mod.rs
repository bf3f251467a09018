// Loyalty Ledger
//
// One point per paid qualifying item, credited when an order completes. A
// reward consumes `target_pizzas` points at submission. The ledger itself is
// pure; balances are mutated atomically by the persistence adapter.

use crate::business_rules::{
    error::{RulesError, RulesResult},
    settings::LoyaltyProgram,
    types::{Cart, CartLine},
};
use rust_decimal::Decimal;

pub struct LoyaltyLedger;

impl LoyaltyLedger {
    /// Whether a customer holding `points` may redeem a reward
    pub fn is_eligible(points: i32, program: &LoyaltyProgram) -> bool {
        program.enabled && points >= program.target_pizzas
    }

    /// Cart-composition rules for a reward line
    pub fn check_redemption(cart: &Cart, points: i32, program: &LoyaltyProgram) -> RulesResult<()> {
        if !Self::is_eligible(points, program) {
            return Err(RulesError::LoyaltyNotEligible {
                points,
                required: program.target_pizzas,
            });
        }

        if program.require_purchase_for_reward {
            let has_purchase = cart
                .lines
                .iter()
                .any(|line| line.is_paid() && line.unit_price > Decimal::ZERO);
            if !has_purchase {
                return Err(RulesError::RewardRequiresPurchase);
            }
        }

        Ok(())
    }

    /// Points credited when an order with these lines completes
    pub fn points_earned(lines: &[CartLine], program: &LoyaltyProgram) -> i32 {
        if !program.enabled {
            return 0;
        }
        let units: u32 = lines
            .iter()
            .filter(|line| {
                line.is_paid()
                    && line
                        .category
                        .trim()
                        .eq_ignore_ascii_case(program.qualifying_category.trim())
            })
            .map(|line| line.quantity)
            .sum();
        i32::try_from(units).unwrap_or(i32::MAX)
    }

    pub fn apply_earn(points: i32, earned: i32) -> i32 {
        points.saturating_add(earned.max(0))
    }

    /// Balance after one redemption
    pub fn apply_redeem(customer_id: i32, points: i32, program: &LoyaltyProgram) -> RulesResult<i32> {
        if points < program.target_pizzas {
            return Err(RulesError::InsufficientLoyaltyBalance {
                customer_id,
                required: program.target_pizzas,
            });
        }
        Ok(points - program.target_pizzas)
    }
}
