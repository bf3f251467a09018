// Catalog models
// Products are the only source of prices; carts are priced from these rows.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::validation::validate_non_negative_price;

/// Domain model representing a catalog product in the database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Product {
    pub id: i32,
    pub name: String,
    /// Free-form category ("pizza", "drink", "dessert"...); promo and loyalty
    /// rules match on it
    pub category: String,
    pub price: Decimal,
    pub available: bool,
}

fn default_available() -> bool {
    true
}

/// Request DTO for creating a product
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateProductRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be between 1 and 100 characters"))]
    pub name: String,

    #[validate(length(min = 1, max = 50, message = "Category must be between 1 and 50 characters"))]
    pub category: String,

    #[validate(custom = "validate_non_negative_price")]
    pub price: Decimal,

    #[serde(default = "default_available")]
    pub available: bool,
}
