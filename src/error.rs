// Error handling module for the HTTP layer
// Wraps request-shape validation failures and rules errors behind one
// handler return type

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use chrono::Utc;
use serde::Serialize;
use tracing::debug;

use crate::business_rules::RulesError;

/// Main error type for the API
/// All handlers return Result<T, ApiError>
#[derive(Debug)]
pub enum ApiError {
    /// Validation errors from request validation
    /// Maps to HTTP 400 Bad Request with field-level details
    ValidationError(validator::ValidationErrors),

    /// Everything the services can reject; status and code come from the rules error
    Rules(RulesError),
}

/// Consistent error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    /// Machine-readable error code (e.g., "VALIDATION_ERROR", "ZONE_NOT_SERVED")
    pub error_code: String,

    /// Human-readable error message
    pub message: String,

    /// Optional additional details (e.g., field-level validation errors)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,

    /// ISO 8601 timestamp of when the error occurred
    pub timestamp: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::ValidationError(errors) => {
                debug!("Validation error: {:?}", errors);

                let body = ErrorResponse {
                    error_code: "VALIDATION_ERROR".to_string(),
                    message: "Request validation failed".to_string(),
                    details: serde_json::to_value(&errors).ok(),
                    timestamp: Utc::now().to_rfc3339(),
                };
                (StatusCode::BAD_REQUEST, Json(body)).into_response()
            }
            ApiError::Rules(err) => err.into_response(),
        }
    }
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::ValidationError(_) => StatusCode::BAD_REQUEST,
            ApiError::Rules(err) => err.status_code(),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ApiError::ValidationError(errors)
    }
}

impl From<RulesError> for ApiError {
    fn from(err: RulesError) -> Self {
        ApiError::Rules(err)
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        ApiError::Rules(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Probe {
        #[validate(length(min = 1))]
        name: String,
    }

    #[test]
    fn test_validation_errors_map_to_bad_request() {
        let errors = Probe { name: String::new() }.validate().unwrap_err();
        let err = ApiError::from(errors);
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_rules_errors_keep_their_status() {
        let err = ApiError::from(RulesError::SessionAlreadyOpen);
        assert_eq!(err.status_code(), StatusCode::CONFLICT);

        let err = ApiError::from(RulesError::Unavailable("pool timed out".to_string()));
        assert_eq!(err.into_response().status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
