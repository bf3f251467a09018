// Delivery Pricer
//
// Resolves the delivery fee for an address from the zone tiers and checks the
// tier's minimum order. Pickup orders never reach this component.

use crate::business_rules::{
    error::{RulesError, RulesResult},
    settings::DeliveryTier,
    types::Address,
};
use rust_decimal::Decimal;

/// Outcome of a successful delivery resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryQuote {
    pub fee: Decimal,
    pub tier_id: String,
}

pub struct DeliveryPricer;

impl DeliveryPricer {
    /// Find the tier serving a postal code
    pub fn find_tier<'a>(postal_code: &str, tiers: &'a [DeliveryTier]) -> Option<&'a DeliveryTier> {
        tiers.iter().find(|tier| tier.serves(postal_code))
    }

    /// Resolve the fee for `address`, rejecting unserved zones and carts under
    /// the tier minimum
    ///
    /// # Arguments
    /// * `address` - Delivery address; only the postal code is used
    /// * `cart_subtotal` - Billed subtotal, free and reward lines excluded
    /// * `tiers` - Configured delivery tiers
    /// * `flat_fee` - Fee charged for any served zone
    ///
    /// # Returns
    /// * `Ok(DeliveryQuote)` - Fee and the id of the matching tier
    /// * `Err(ZoneNotServed)` - No tier lists the postal code
    /// * `Err(BelowMinimumOrder)` - Subtotal under the tier minimum, with the shortfall
    pub fn resolve(
        address: &Address,
        cart_subtotal: Decimal,
        tiers: &[DeliveryTier],
        flat_fee: Decimal,
    ) -> RulesResult<DeliveryQuote> {
        let tier = Self::find_tier(&address.postal_code, tiers).ok_or_else(|| {
            RulesError::ZoneNotServed {
                postal_code: address.postal_code.trim().to_string(),
            }
        })?;

        if cart_subtotal < tier.min_order {
            return Err(RulesError::BelowMinimumOrder {
                minimum: tier.min_order,
                subtotal: cart_subtotal,
                shortfall: tier.min_order - cart_subtotal,
            });
        }

        Ok(DeliveryQuote {
            fee: flat_fee,
            tier_id: tier.id.clone(),
        })
    }
}
