use std::error::Error;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use pizzeria_api::config::AppConfig;
use pizzeria_api::customers::InMemoryPhoneVerifier;
use pizzeria_api::store::{InMemoryStore, PgStore, PizzeriaStore};
use pizzeria_api::{create_router, db, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = AppConfig::from_env()?;

    // RUST_LOG wins over LOG_LEVEL
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    tracing::info!("Starting pizzeria API...");

    let store: Arc<dyn PizzeriaStore> = match &config.database_url {
        Some(database_url) => {
            let pool = db::create_pool(database_url, config.db_max_connections).await?;
            db::run_migrations(&pool).await?;
            Arc::new(PgStore::new(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, state is kept in memory and lost on restart");
            Arc::new(InMemoryStore::new())
        }
    };

    let verifier = Arc::new(InMemoryPhoneVerifier::new());
    let state = AppState::new(store, verifier, config.settings_cache_ttl);

    // Refuse to start on a corrupt configuration row
    let settings = state.settings.snapshot().await?;
    tracing::info!("Business settings loaded (version {})", settings.version);

    let app = create_router(state);

    let bind_address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("Server listening on {}", bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}
