// HTTP handlers for service session endpoints

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};

use crate::error::ApiError;
use crate::sessions::models::{ClosedSession, OpenedSession, ServiceSession, SessionHistoryQuery};

/// Handler for POST /api/sessions/open
pub async fn open_session_handler(
    State(state): State<crate::AppState>,
) -> Result<(StatusCode, Json<OpenedSession>), ApiError> {
    let opened = state.session_service.open().await?;
    Ok((StatusCode::CREATED, Json(opened)))
}

/// Handler for POST /api/sessions/close
pub async fn close_session_handler(
    State(state): State<crate::AppState>,
) -> Result<Json<ClosedSession>, ApiError> {
    let closed = state.session_service.close().await?;
    Ok(Json(closed))
}

/// Handler for GET /api/sessions/current
pub async fn current_session_handler(
    State(state): State<crate::AppState>,
) -> Result<Json<ServiceSession>, ApiError> {
    let session = state.session_service.current().await?;
    Ok(Json(session))
}

/// Handler for GET /api/sessions
pub async fn session_history_handler(
    State(state): State<crate::AppState>,
    Query(query): Query<SessionHistoryQuery>,
) -> Result<Json<Vec<ServiceSession>>, ApiError> {
    let sessions = state.session_service.history(query.limit).await?;
    Ok(Json(sessions))
}
