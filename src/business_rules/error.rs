// Error types for the order rules engine
// Every rejection the engine can produce is a typed variant carrying enough
// context to render a user-facing message.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use rust_decimal::Decimal;
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

/// Main error type for the rules engine and the services built on it
#[derive(Debug, Error)]
pub enum RulesError {
    /// The submitted cart has no lines
    #[error("Cart is empty")]
    EmptyCart,

    /// More than one loyalty reward unit in a single order
    #[error("Only one loyalty reward can be redeemed per order")]
    MultipleRewardsNotAllowed,

    /// Customer does not hold enough points (or the program is disabled)
    #[error("Customer has {points} loyalty points, {required} are required for a reward")]
    LoyaltyNotEligible { points: i32, required: i32 },

    /// Reward lines need at least one paid item in the cart
    #[error("A paid item is required before a loyalty reward can be added")]
    RewardRequiresPurchase,

    /// More promo-free units than the offer allows
    #[error("Promotion allows {allowed} free item(s), cart requests {requested}")]
    PromoAllowanceExceeded { allowed: u32, requested: u32 },

    /// Postal code is not part of any delivery tier
    #[error("Delivery is not available for postal code {postal_code}")]
    ZoneNotServed { postal_code: String },

    /// Cart subtotal is under the tier minimum
    #[error("Minimum order for this zone is {minimum}, cart is {subtotal} ({shortfall} short)")]
    BelowMinimumOrder {
        minimum: Decimal,
        subtotal: Decimal,
        shortfall: Decimal,
    },

    #[error("A service session is already open")]
    SessionAlreadyOpen,

    #[error("No service session is open")]
    NoSessionOpen,

    /// Points balance changed between validation and commit
    #[error("Customer {customer_id} no longer has {required} loyalty points to redeem")]
    InsufficientLoyaltyBalance { customer_id: i32, required: i32 },

    /// Infrastructure failure (persistence unavailable); callers may retry
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    /// Settings value rejected at configuration time
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Validation failed: {0}")]
    ValidationError(String),

    #[error("Product not found: {0}")]
    ProductNotFound(i32),

    #[error("Product {0} is not available")]
    ProductUnavailable(i32),

    #[error("Customer not found: {0}")]
    CustomerNotFound(i32),

    #[error("Order not found: {0}")]
    OrderNotFound(Uuid),

    #[error("Invalid status transition: {0}")]
    InvalidTransition(String),

    /// Scheduled time falls on a closed day or outside opening hours
    #[error("The pizzeria is closed at {0}")]
    OutsideOpeningHours(String),

    #[error("Customer already exists: {0}")]
    DuplicateCustomer(String),

    #[error("Invalid or expired verification code")]
    InvalidVerificationCode,
}

/// Result type alias for rules operations
pub type RulesResult<T> = Result<T, RulesError>;

impl From<sqlx::Error> for RulesError {
    fn from(err: sqlx::Error) -> Self {
        RulesError::Unavailable(err.to_string())
    }
}

impl From<serde_json::Error> for RulesError {
    fn from(err: serde_json::Error) -> Self {
        RulesError::InvalidConfiguration(err.to_string())
    }
}

impl From<validator::ValidationErrors> for RulesError {
    fn from(err: validator::ValidationErrors) -> Self {
        RulesError::ValidationError(err.to_string())
    }
}

impl RulesError {
    /// Machine-readable code used in JSON error bodies
    pub fn error_code(&self) -> &'static str {
        match self {
            RulesError::EmptyCart => "EMPTY_CART",
            RulesError::MultipleRewardsNotAllowed => "MULTIPLE_REWARDS_NOT_ALLOWED",
            RulesError::LoyaltyNotEligible { .. } => "LOYALTY_NOT_ELIGIBLE",
            RulesError::RewardRequiresPurchase => "REWARD_REQUIRES_PURCHASE",
            RulesError::PromoAllowanceExceeded { .. } => "PROMO_ALLOWANCE_EXCEEDED",
            RulesError::ZoneNotServed { .. } => "ZONE_NOT_SERVED",
            RulesError::BelowMinimumOrder { .. } => "BELOW_MINIMUM_ORDER",
            RulesError::SessionAlreadyOpen => "SESSION_ALREADY_OPEN",
            RulesError::NoSessionOpen => "NO_SESSION_OPEN",
            RulesError::InsufficientLoyaltyBalance { .. } => "INSUFFICIENT_LOYALTY_BALANCE",
            RulesError::Unavailable(_) => "UNAVAILABLE",
            RulesError::InvalidConfiguration(_) => "INVALID_CONFIGURATION",
            RulesError::ValidationError(_) => "VALIDATION_ERROR",
            RulesError::ProductNotFound(_) => "PRODUCT_NOT_FOUND",
            RulesError::ProductUnavailable(_) => "PRODUCT_UNAVAILABLE",
            RulesError::CustomerNotFound(_) => "CUSTOMER_NOT_FOUND",
            RulesError::OrderNotFound(_) => "ORDER_NOT_FOUND",
            RulesError::InvalidTransition(_) => "INVALID_TRANSITION",
            RulesError::OutsideOpeningHours(_) => "OUTSIDE_OPENING_HOURS",
            RulesError::DuplicateCustomer(_) => "DUPLICATE_CUSTOMER",
            RulesError::InvalidVerificationCode => "INVALID_VERIFICATION_CODE",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            RulesError::SessionAlreadyOpen
            | RulesError::NoSessionOpen
            | RulesError::InsufficientLoyaltyBalance { .. }
            | RulesError::DuplicateCustomer(_) => StatusCode::CONFLICT,
            RulesError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            RulesError::ProductNotFound(_)
            | RulesError::CustomerNotFound(_)
            | RulesError::OrderNotFound(_) => StatusCode::NOT_FOUND,
            RulesError::InvalidVerificationCode => StatusCode::UNAUTHORIZED,
            _ => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }

    /// Structured context for the client, when the variant carries any
    fn details(&self) -> Option<serde_json::Value> {
        match self {
            RulesError::LoyaltyNotEligible { points, required } => {
                Some(json!({ "points": points, "required": required }))
            }
            RulesError::PromoAllowanceExceeded { allowed, requested } => {
                Some(json!({ "allowed": allowed, "requested": requested }))
            }
            RulesError::ZoneNotServed { postal_code } => Some(json!({ "postal_code": postal_code })),
            RulesError::BelowMinimumOrder {
                minimum,
                subtotal,
                shortfall,
            } => Some(json!({
                "minimum": minimum,
                "subtotal": subtotal,
                "shortfall": shortfall,
            })),
            RulesError::InsufficientLoyaltyBalance {
                customer_id,
                required,
            } => Some(json!({ "customer_id": customer_id, "required": required })),
            _ => None,
        }
    }
}

impl IntoResponse for RulesError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match &self {
            RulesError::Unavailable(msg) => tracing::error!("Persistence unavailable: {}", msg),
            RulesError::InsufficientLoyaltyBalance { .. } | RulesError::SessionAlreadyOpen => {
                tracing::warn!("{}", self)
            }
            _ => tracing::debug!("Request rejected: {}", self),
        }

        // Infrastructure details stay in the logs
        let message = match &self {
            RulesError::Unavailable(_) => "Service temporarily unavailable".to_string(),
            other => other.to_string(),
        };

        let mut body = json!({
            "error_code": self.error_code(),
            "message": message,
            "timestamp": Utc::now().to_rfc3339(),
        });
        if let Some(details) = self.details() {
            body["details"] = details;
        }

        (status, Json(body)).into_response()
    }
}
