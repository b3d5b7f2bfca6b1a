use std::sync::Arc;

use agenda_api::{ApiState, config::ApiConfig, middleware::rate_limit::FixedWindowRateLimiter};
use agenda_core::clock::SystemClock;
use agenda_db::{PgStore, create_pool, schema::initialize_database};
use agenda_engine::{BookingService, EventBus, LoggingHandler};
use color_eyre::eyre::Result;
use dotenv::dotenv;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    // Load environment variables
    dotenv().ok();

    // Load configuration
    let config = ApiConfig::from_env()?;
    agenda_api::init_tracing(config.log_level)?;

    // Create database connection pool
    let db_pool = create_pool(&config.database_url, config.database_max_connections).await?;

    // Initialize database schema
    initialize_database(&db_pool).await?;
    info!("Database schema ready");

    // Wire the booking engine
    let events = EventBus::new().with_handler(Arc::new(LoggingHandler));
    let state = ApiState {
        booking: BookingService::new(PgStore::new(db_pool), Arc::new(SystemClock), events),
        rate_limiter: Arc::new(FixedWindowRateLimiter::new(
            config.rate_limit_max,
            config.rate_limit_window,
        )),
    };

    // Start API server
    agenda_api::start_server(config, state).await?;

    Ok(())
}
