// Domain type definitions for the rules engine
// Cart and pricing types shared by the engines and the order service

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

use crate::validation::validate_postal_code;

/// How the customer receives the order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OrderMode {
    Delivery,
    Pickup,
}

impl fmt::Display for OrderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderMode::Delivery => write!(f, "delivery"),
            OrderMode::Pickup => write!(f, "pickup"),
        }
    }
}

/// Delivery address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct Address {
    #[validate(length(min = 1, max = 200, message = "Street is required"))]
    pub street: String,
    #[validate(custom = "validate_postal_code")]
    pub postal_code: String,
    #[validate(length(min = 1, max = 100, message = "City is required"))]
    pub city: String,
}

/// One line of a cart, priced from the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: i32,
    pub name: String,
    pub category: String,
    pub unit_price: Decimal,
    pub quantity: u32,
    /// Free under the "buy N get M" promotion
    #[serde(default)]
    pub is_free: bool,
    /// Redeemed with loyalty points
    #[serde(default)]
    pub is_reward: bool,
}

impl CartLine {
    /// Neither promo-free nor a reward
    pub fn is_paid(&self) -> bool {
        !self.is_free && !self.is_reward
    }

    /// Amount billed for this line; free and reward lines bill 0
    pub fn line_total(&self) -> Decimal {
        if self.is_paid() {
            self.unit_price * Decimal::from(self.quantity)
        } else {
            Decimal::ZERO
        }
    }
}

/// Ephemeral cart, exists only during submission
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    pub lines: Vec<CartLine>,
}

impl Cart {
    pub fn new(lines: Vec<CartLine>) -> Self {
        Self { lines }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Total reward units (a reward line with quantity 2 counts twice)
    pub fn reward_units(&self) -> u32 {
        self.lines
            .iter()
            .filter(|line| line.is_reward)
            .map(|line| line.quantity)
            .sum()
    }

    pub fn free_units(&self) -> u32 {
        self.lines
            .iter()
            .filter(|line| line.is_free)
            .map(|line| line.quantity)
            .sum()
    }

    /// Billed subtotal: free and reward lines contribute 0
    pub fn billed_subtotal(&self) -> Decimal {
        self.lines.iter().map(CartLine::line_total).sum()
    }
}

/// A validated, priced order that has not been persisted yet
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PricedOrder {
    pub mode: OrderMode,
    pub lines: Vec<CartLine>,
    pub subtotal: Decimal,
    pub delivery_fee: Decimal,
    pub total_amount: Decimal,
    /// Points consumed by the reward line, 0 if none
    pub redeemed_points: i32,
    pub free_allowance: u32,
    pub delivery_tier_id: Option<String>,
}
