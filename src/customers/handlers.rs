// HTTP handlers for customer and phone verification endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::business_rules::Address;
use crate::customers::models::{
    AdjustPointsRequest, CreateCustomerRequest, Customer, PointsResponse, SendCodeRequest,
    VerifyCodeRequest,
};
use crate::error::ApiError;

/// Handler for POST /api/customers
/// Guest checkout creation
pub async fn create_customer_handler(
    State(state): State<crate::AppState>,
    Json(request): Json<CreateCustomerRequest>,
) -> Result<(StatusCode, Json<Customer>), ApiError> {
    request.validate()?;

    let customer = state
        .customer_service
        .create_guest(&request.phone, request.email.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(customer)))
}

/// Handler for GET /api/customers/:id
pub async fn get_customer_handler(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Customer>, ApiError> {
    let customer = state.customer_service.get(id).await?;
    Ok(Json(customer))
}

/// Handler for POST /api/customers/:id/addresses
pub async fn add_address_handler(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
    Json(address): Json<Address>,
) -> Result<Json<Customer>, ApiError> {
    address.validate()?;

    let customer = state.customer_service.add_address(id, address).await?;
    Ok(Json(customer))
}

/// Handler for PATCH /api/customers/:id/points
/// Admin adjustment of the loyalty balance
pub async fn adjust_points_handler(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
    Json(request): Json<AdjustPointsRequest>,
) -> Result<Json<PointsResponse>, ApiError> {
    request.validate()?;

    let balance = state
        .customer_service
        .adjust_points(id, request.delta)
        .await?;
    Ok(Json(balance))
}

/// Handler for POST /api/auth/send-code
pub async fn send_code_handler(
    State(state): State<crate::AppState>,
    Json(request): Json<SendCodeRequest>,
) -> Result<StatusCode, ApiError> {
    request.validate()?;

    state.customer_service.send_code(&request.phone).await?;
    Ok(StatusCode::ACCEPTED)
}

/// Handler for POST /api/auth/verify
/// Returns the customer; issuing a session token is the gateway's job
pub async fn verify_code_handler(
    State(state): State<crate::AppState>,
    Json(request): Json<VerifyCodeRequest>,
) -> Result<Json<Customer>, ApiError> {
    request.validate()?;

    let customer = state
        .customer_service
        .verify_login(&request.phone, &request.code)
        .await?;
    Ok(Json(customer))
}
