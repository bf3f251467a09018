// Business Rules Module
//
// Settings-driven rules applied to an order before it is persisted:
// - Delivery pricing: zone tiers, minimum order, flat fee
// - Promotions: "buy N get M" free pizzas
// - Loyalty: reward eligibility, redemption, points earned on completion
//
// The engines are pure functions over a `SettingsSnapshot`; persistence goes
// through the `store` adapter.

pub mod config_store;
pub mod delivery;
pub mod error;
pub mod handlers;
pub mod loyalty;
pub mod promo;
pub mod settings;
pub mod types;

pub use config_store::SettingsStore;
pub use delivery::{DeliveryPricer, DeliveryQuote};
pub use error::{RulesError, RulesResult};
pub use loyalty::LoyaltyLedger;
pub use promo::PromoEngine;
pub use settings::{
    Announcement, DeliveryTier, LoyaltyProgram, PromoOffer, ScheduleDay, SettingEntry, SettingKey,
    SettingsSnapshot, Zone,
};
pub use types::{Address, Cart, CartLine, OrderMode, PricedOrder};

use rust_decimal::Decimal;

/// Order Rules Engine
///
/// Validates and prices a cart. Steps run in a fixed order and the first
/// failure short-circuits.
pub struct OrderRulesEngine;

impl OrderRulesEngine {
    /// Validate a cart and price it
    ///
    /// # Arguments
    /// * `cart` - Lines priced from the catalog
    /// * `customer_points` - Loyalty balance, read before any redemption
    /// * `address` - Required in delivery mode
    /// * `mode` - Delivery or pickup
    /// * `settings` - The snapshot every rule is evaluated against
    ///
    /// # Returns
    /// * `Ok(PricedOrder)` - Totals, delivery fee and the points a reward consumes
    /// * `Err(RulesError)` - The first rule the cart breaks
    pub fn validate_and_price(
        cart: &Cart,
        customer_points: i32,
        address: Option<&Address>,
        mode: OrderMode,
        settings: &SettingsSnapshot,
    ) -> RulesResult<PricedOrder> {
        // 1. Empty cart
        if cart.is_empty() {
            return Err(RulesError::EmptyCart);
        }

        // 2. One reward unit at most
        let reward_units = cart.reward_units();
        if reward_units > 1 {
            return Err(RulesError::MultipleRewardsNotAllowed);
        }

        // 3. Loyalty eligibility and purchase gating
        let program = &settings.loyalty_program;
        let redeemed_points = if reward_units == 1 {
            LoyaltyLedger::check_redemption(cart, customer_points, program)?;
            program.target_pizzas
        } else {
            0
        };

        // 4. Promo allowance
        let free_allowance = PromoEngine::check(cart, &settings.promo_offer)?;

        // 5. Billed subtotal: free and reward lines count 0
        let subtotal = cart.billed_subtotal();

        // 6. Delivery zone and minimum order
        let (delivery_fee, delivery_tier_id) = match mode {
            OrderMode::Pickup => (Decimal::ZERO, None),
            OrderMode::Delivery => {
                let address = address.ok_or_else(|| {
                    RulesError::ValidationError("Delivery orders require an address".to_string())
                })?;
                let quote = DeliveryPricer::resolve(
                    address,
                    subtotal,
                    &settings.delivery_tiers,
                    settings.delivery_fee,
                )?;
                (quote.fee, Some(quote.tier_id))
            }
        };

        // 7. Total
        let total_amount = subtotal + delivery_fee;

        tracing::debug!(
            "Priced {} cart: subtotal={}, fee={}, total={}, redeemed_points={}",
            mode,
            subtotal,
            delivery_fee,
            total_amount,
            redeemed_points
        );

        Ok(PricedOrder {
            mode,
            lines: cart.lines.clone(),
            subtotal,
            delivery_fee,
            total_amount,
            redeemed_points,
            free_allowance,
            delivery_tier_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn settings() -> SettingsSnapshot {
        SettingsSnapshot {
            delivery_tiers: vec![DeliveryTier {
                id: "centre".to_string(),
                min_order: dec!(15),
                zones: vec![Zone {
                    postal_code: "13008".to_string(),
                    city: "Marseille".to_string(),
                }],
            }],
            delivery_fee: dec!(2.50),
            loyalty_program: LoyaltyProgram {
                enabled: true,
                target_pizzas: 10,
                require_purchase_for_reward: true,
                qualifying_category: "pizza".to_string(),
            },
            promo_offer: PromoOffer {
                enabled: true,
                buy_quantity: 3,
                get_quantity: 1,
                item_category_filter: "pizza".to_string(),
            },
            ..SettingsSnapshot::default()
        }
    }

    fn pizza(price: Decimal, quantity: u32) -> CartLine {
        CartLine {
            product_id: 1,
            name: "Margherita".to_string(),
            category: "pizza".to_string(),
            unit_price: price,
            quantity,
            is_free: false,
            is_reward: false,
        }
    }

    fn free(line: CartLine) -> CartLine {
        CartLine { is_free: true, ..line }
    }

    fn reward(line: CartLine) -> CartLine {
        CartLine { is_reward: true, ..line }
    }

    fn marseille() -> Address {
        Address {
            street: "1 quai du Port".to_string(),
            postal_code: "13008".to_string(),
            city: "Marseille".to_string(),
        }
    }

    #[test]
    fn test_empty_cart_rejected() {
        let err = OrderRulesEngine::validate_and_price(
            &Cart::default(),
            0,
            None,
            OrderMode::Pickup,
            &settings(),
        )
        .unwrap_err();
        assert!(matches!(err, RulesError::EmptyCart));
    }

    #[test]
    fn test_two_rewards_rejected_before_loyalty_check() {
        let cart = Cart::new(vec![pizza(dec!(10), 1), reward(pizza(dec!(10), 2))]);
        let err = OrderRulesEngine::validate_and_price(&cart, 0, None, OrderMode::Pickup, &settings())
            .unwrap_err();
        assert!(matches!(err, RulesError::MultipleRewardsNotAllowed));
    }

    #[test]
    fn test_reward_only_cart_requires_purchase() {
        let cart = Cart::new(vec![reward(pizza(dec!(10), 1))]);
        let err = OrderRulesEngine::validate_and_price(&cart, 10, None, OrderMode::Pickup, &settings())
            .unwrap_err();
        assert!(matches!(err, RulesError::RewardRequiresPurchase));
    }

    #[test]
    fn test_reward_with_purchase_consumes_target_points() {
        let cart = Cart::new(vec![pizza(dec!(10), 1), reward(pizza(dec!(10), 1))]);
        let priced =
            OrderRulesEngine::validate_and_price(&cart, 12, None, OrderMode::Pickup, &settings()).unwrap();
        assert_eq!(priced.redeemed_points, 10);
        assert_eq!(priced.total_amount, dec!(10));
    }

    #[test]
    fn test_promo_checked_before_delivery() {
        // Address is unserved, but the promo violation comes first
        let cart = Cart::new(vec![pizza(dec!(10), 2), free(pizza(dec!(10), 1))]);
        let mut address = marseille();
        address.postal_code = "75001".to_string();
        let err = OrderRulesEngine::validate_and_price(
            &cart,
            0,
            Some(&address),
            OrderMode::Delivery,
            &settings(),
        )
        .unwrap_err();
        assert!(matches!(err, RulesError::PromoAllowanceExceeded { .. }));
    }

    #[test]
    fn test_minimum_checked_against_billed_total() {
        // 1 paid pizza at 12 plus a reward pizza: billed 12, under the 15 minimum
        let cart = Cart::new(vec![pizza(dec!(12), 1), reward(pizza(dec!(12), 1))]);
        let err = OrderRulesEngine::validate_and_price(
            &cart,
            10,
            Some(&marseille()),
            OrderMode::Delivery,
            &settings(),
        )
        .unwrap_err();
        match err {
            RulesError::BelowMinimumOrder { shortfall, .. } => assert_eq!(shortfall, dec!(3)),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_delivery_total_includes_fee() {
        let cart = Cart::new(vec![pizza(dec!(9.50), 3), free(pizza(dec!(9.50), 1))]);
        let priced = OrderRulesEngine::validate_and_price(
            &cart,
            0,
            Some(&marseille()),
            OrderMode::Delivery,
            &settings(),
        )
        .unwrap();
        assert_eq!(priced.subtotal, dec!(28.50));
        assert_eq!(priced.delivery_fee, dec!(2.50));
        assert_eq!(priced.total_amount, dec!(31.00));
        assert_eq!(priced.free_allowance, 1);
        assert_eq!(priced.delivery_tier_id.as_deref(), Some("centre"));
    }

    #[test]
    fn test_pickup_skips_delivery_rules() {
        let cart = Cart::new(vec![pizza(dec!(5), 1)]);
        let priced =
            OrderRulesEngine::validate_and_price(&cart, 0, None, OrderMode::Pickup, &settings()).unwrap();
        assert_eq!(priced.delivery_fee, Decimal::ZERO);
        assert_eq!(priced.total_amount, dec!(5));
    }

    #[test]
    fn test_delivery_without_address_rejected() {
        let cart = Cart::new(vec![pizza(dec!(20), 1)]);
        let err = OrderRulesEngine::validate_and_price(&cart, 0, None, OrderMode::Delivery, &settings())
            .unwrap_err();
        assert!(matches!(err, RulesError::ValidationError(_)));
    }
}
