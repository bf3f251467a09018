// Validation utilities module
// Provides custom validation functions for domain-specific rules

use regex::Regex;
use rust_decimal::Decimal;
use std::sync::OnceLock;
use validator::ValidationError;

fn phone_regex() -> &'static Regex {
    static PHONE: OnceLock<Regex> = OnceLock::new();
    // E.164 style: optional leading +, 8 to 15 digits
    PHONE.get_or_init(|| Regex::new(r"^\+?[0-9]{8,15}$").expect("phone pattern is valid"))
}

fn postal_code_regex() -> &'static Regex {
    static POSTAL_CODE: OnceLock<Regex> = OnceLock::new();
    POSTAL_CODE.get_or_init(|| Regex::new(r"^[0-9A-Za-z][0-9A-Za-z -]{1,9}$").expect("postal code pattern is valid"))
}

/// Validates a phone number (digits with an optional leading '+')
pub fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    if phone_regex().is_match(phone.trim()) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_phone"))
    }
}

/// Validates a postal code (2 to 10 alphanumeric characters)
pub fn validate_postal_code(postal_code: &str) -> Result<(), ValidationError> {
    if postal_code_regex().is_match(postal_code.trim()) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_postal_code"))
    }
}

/// Validates that a price is zero or positive
pub fn validate_non_negative_price(price: &Decimal) -> Result<(), ValidationError> {
    if price.is_sign_negative() && !price.is_zero() {
        Err(ValidationError::new("price_must_not_be_negative"))
    } else {
        Ok(())
    }
}
