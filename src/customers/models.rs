use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use validator::Validate;

use crate::business_rules::Address;
use crate::validation::validate_phone;

/// Domain model representing a customer in the database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Customer {
    pub id: i32,
    pub phone: String,
    pub email: Option<String>,
    pub loyalty_points: i32,
    pub addresses: Json<Vec<Address>>,
    pub created_at: DateTime<Utc>,
}

/// Request DTO for guest checkout creation
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateCustomerRequest {
    #[validate(custom = "validate_phone")]
    pub phone: String,
    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,
}

/// Request DTO for an admin points adjustment
#[derive(Debug, Deserialize, Validate)]
pub struct AdjustPointsRequest {
    #[validate(range(min = -10000, max = 10000, message = "Delta must be between -10000 and 10000"))]
    pub delta: i32,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SendCodeRequest {
    #[validate(custom = "validate_phone")]
    pub phone: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct VerifyCodeRequest {
    #[validate(custom = "validate_phone")]
    pub phone: String,
    #[validate(length(equal = 6, message = "Code must have 6 digits"))]
    pub code: String,
}

/// Response DTO for a points balance
#[derive(Debug, Serialize)]
pub struct PointsResponse {
    pub customer_id: i32,
    pub loyalty_points: i32,
}
