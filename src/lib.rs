pub mod business_rules;
pub mod catalog;
pub mod config;
pub mod customers;
pub mod db;
pub mod error;
pub mod models;
pub mod orders;
pub mod sessions;
pub mod store;
pub mod validation;

use axum::{
    routing::{get, patch, post, put},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use business_rules::SettingsStore;
use customers::{CustomerService, PhoneVerifier};
use orders::OrderService;
use sessions::SessionService;
use store::PizzeriaStore;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn PizzeriaStore>,
    pub settings: Arc<SettingsStore>,
    pub order_service: OrderService,
    pub session_service: SessionService,
    pub customer_service: CustomerService,
}

impl AppState {
    pub fn new(
        store: Arc<dyn PizzeriaStore>,
        verifier: Arc<dyn PhoneVerifier>,
        settings_cache_ttl: Duration,
    ) -> Self {
        let settings = Arc::new(SettingsStore::with_ttl(store.clone(), settings_cache_ttl));

        Self {
            order_service: OrderService::new(store.clone(), settings.clone()),
            session_service: SessionService::new(store.clone()),
            customer_service: CustomerService::new(store.clone(), verifier),
            settings,
            store,
        }
    }
}

/// Handler for GET /api/health
async fn health_handler() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Create the application router with all routes
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(health_handler))
        // Settings
        .route("/api/settings", get(business_rules::handlers::get_settings_handler))
        .route(
            "/api/settings/public",
            get(business_rules::handlers::get_public_settings_handler),
        )
        .route(
            "/api/settings/:key",
            put(business_rules::handlers::update_setting_handler),
        )
        // Catalog
        .route(
            "/api/products",
            get(catalog::list_products_handler).post(catalog::create_product_handler),
        )
        // Customers and phone login
        .route("/api/customers", post(customers::create_customer_handler))
        .route("/api/customers/:id", get(customers::get_customer_handler))
        .route(
            "/api/customers/:id/addresses",
            post(customers::add_address_handler),
        )
        .route(
            "/api/customers/:id/points",
            patch(customers::adjust_points_handler),
        )
        .route("/api/auth/send-code", post(customers::send_code_handler))
        .route("/api/auth/verify", post(customers::verify_code_handler))
        // Orders
        .route("/api/orders", post(orders::submit_order_handler))
        .route("/api/orders/quote", post(orders::quote_order_handler))
        .route("/api/orders/:order_id", get(orders::get_order_handler))
        .route(
            "/api/orders/:order_id/status",
            patch(orders::update_order_status_handler),
        )
        // Service sessions
        .route("/api/sessions", get(sessions::session_history_handler))
        .route("/api/sessions/open", post(sessions::open_session_handler))
        .route("/api/sessions/close", post(sessions::close_session_handler))
        .route("/api/sessions/current", get(sessions::current_session_handler))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
