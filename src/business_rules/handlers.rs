// HTTP handlers for settings endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;

use crate::business_rules::{Announcement, SettingsSnapshot};
use crate::error::ApiError;

/// Public view of the business configuration
#[derive(Debug, Serialize)]
pub struct PublicSettingsResponse {
    pub announcement: Option<Announcement>,
    pub delivery_fee: rust_decimal::Decimal,
    pub schedule: Vec<crate::business_rules::ScheduleDay>,
    pub loyalty_enabled: bool,
    pub loyalty_target: i32,
    pub promo_enabled: bool,
}

impl From<&SettingsSnapshot> for PublicSettingsResponse {
    fn from(settings: &SettingsSnapshot) -> Self {
        Self {
            announcement: settings
                .announcement
                .enabled
                .then(|| settings.announcement.clone()),
            delivery_fee: settings.delivery_fee,
            schedule: settings.schedule.clone(),
            loyalty_enabled: settings.loyalty_program.enabled,
            loyalty_target: settings.loyalty_program.target_pizzas,
            promo_enabled: settings.promo_offer.enabled,
        }
    }
}

/// Handler for GET /api/settings
/// Full snapshot, for the back office
pub async fn get_settings_handler(
    State(state): State<crate::AppState>,
) -> Result<Json<SettingsSnapshot>, ApiError> {
    let settings = state.settings.snapshot().await?;
    Ok(Json(settings.as_ref().clone()))
}

/// Handler for GET /api/settings/public
pub async fn get_public_settings_handler(
    State(state): State<crate::AppState>,
) -> Result<Json<PublicSettingsResponse>, ApiError> {
    let settings = state.settings.snapshot().await?;
    Ok(Json(PublicSettingsResponse::from(settings.as_ref())))
}

/// Handler for PUT /api/settings/:key
/// The body is the new JSON value for the key
pub async fn update_setting_handler(
    State(state): State<crate::AppState>,
    Path(key): Path<String>,
    Json(value): Json<serde_json::Value>,
) -> Result<Json<SettingsSnapshot>, ApiError> {
    let settings = state.settings.update(&key, value).await?;
    Ok(Json(settings.as_ref().clone()))
}
