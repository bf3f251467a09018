// HTTP handlers for the product catalog

use axum::{extract::State, http::StatusCode, Json};
use validator::Validate;

use crate::error::ApiError;
use crate::models::{CreateProductRequest, Product};
use crate::store::PizzeriaStore;

/// Handler for GET /api/products
pub async fn list_products_handler(
    State(state): State<crate::AppState>,
) -> Result<Json<Vec<Product>>, ApiError> {
    let products = state.store.list_products().await?;
    Ok(Json(products))
}

/// Handler for POST /api/products
pub async fn create_product_handler(
    State(state): State<crate::AppState>,
    Json(request): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    request.validate()?;

    let product = state.store.create_product(request).await?;
    tracing::info!("Product {} '{}' created", product.id, product.name);
    Ok((StatusCode::CREATED, Json(product)))
}
