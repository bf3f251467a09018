// HTTP handlers for order endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::business_rules::PricedOrder;
use crate::error::ApiError;
use crate::orders::{OrderDetails, SubmitOrderRequest, UpdateStatusRequest};

/// Handler for POST /api/orders/quote
/// Prices a cart without placing the order
pub async fn quote_order_handler(
    State(state): State<crate::AppState>,
    Json(request): Json<SubmitOrderRequest>,
) -> Result<Json<PricedOrder>, ApiError> {
    request.validate()?;

    let priced = state.order_service.quote(&request).await?;
    Ok(Json(priced))
}

/// Handler for POST /api/orders
/// Validates, prices and places an order
pub async fn submit_order_handler(
    State(state): State<crate::AppState>,
    Json(request): Json<SubmitOrderRequest>,
) -> Result<(StatusCode, Json<OrderDetails>), ApiError> {
    request.validate()?;

    let order = state.order_service.submit(request).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// Handler for GET /api/orders/:order_id
pub async fn get_order_handler(
    State(state): State<crate::AppState>,
    Path(order_id): Path<Uuid>,
) -> Result<Json<OrderDetails>, ApiError> {
    let order = state.order_service.get_order(order_id).await?;
    Ok(Json(order))
}

/// Handler for PATCH /api/orders/:order_id/status
/// Staff-facing; role checks are left to the upstream gateway
pub async fn update_order_status_handler(
    State(state): State<crate::AppState>,
    Path(order_id): Path<Uuid>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<OrderDetails>, ApiError> {
    request.validate()?;

    let order = state
        .order_service
        .update_status(order_id, request.status)
        .await?;
    Ok(Json(order))
}
