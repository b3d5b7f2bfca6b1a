//! # Agenda API
//!
//! The HTTP surface of the Agenda booking service. Providers publish
//! calendars of bookable slots; patients reserve, cancel and move their
//! appointments.
//!
//! ## Architecture
//!
//! - **Routes**: Define API endpoints and URL structure
//! - **Handlers**: Translate requests into [`BookingService`] calls
//! - **Middleware**: Caller identity, booking throttling and error mapping
//! - **Config**: Environment configuration
//!
//! All concurrency control lives in the engine; handlers never touch storage
//! directly.

/// Configuration module for API settings
pub mod config;
/// Request handlers delegating to the booking engine
pub mod handlers;
/// Identity extraction, rate limiting and error mapping
pub mod middleware;
/// Route definitions and API endpoint structure
pub mod routes;

use std::sync::Arc;

use agenda_db::BookingStore;
use agenda_engine::BookingService;
use axum::{
    Router,
    http::{HeaderName, HeaderValue, Method, header},
};
use eyre::Result;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};
use tracing::{Level, info, warn};
use tracing_subscriber::{EnvFilter, filter::LevelFilter};

use middleware::{identity::PERSON_HEADER, rate_limit::RateLimiter};

/// Shared application state that is accessible to all request handlers
///
/// # Example
///
/// ```
/// use std::{sync::Arc, time::Duration};
/// use agenda_api::{ApiState, app, middleware::rate_limit::FixedWindowRateLimiter};
/// use agenda_core::clock::SystemClock;
/// use agenda_db::MemoryStore;
/// use agenda_engine::{BookingService, EventBus};
///
/// let state = ApiState {
///     booking: BookingService::new(MemoryStore::new(), Arc::new(SystemClock), EventBus::new()),
///     rate_limiter: Arc::new(FixedWindowRateLimiter::new(5, Duration::from_secs(300))),
/// };
/// let router = app(Arc::new(state));
/// # let _ = router;
/// ```
pub struct ApiState<S: BookingStore> {
    /// The booking engine over the configured store
    pub booking: BookingService<S>,
    /// Throttle applied to booking writes per caller
    pub rate_limiter: Arc<dyn RateLimiter>,
}

/// Builds the application router with every endpoint attached to `state`
pub fn app<S: BookingStore>(state: Arc<ApiState<S>>) -> Router {
    Router::new()
        // Health check endpoints
        .merge(routes::health::routes())
        // Slot label catalog
        .merge(routes::slot_template::routes())
        // Calendar publication and browsing
        .merge(routes::calendar::routes())
        // Reservations on behalf of the caller
        .merge(routes::booking::routes())
        .with_state(state)
}

/// Installs the global tracing subscriber
///
/// `RUST_LOG` takes precedence; otherwise everything at `level` and above is
/// logged.
pub fn init_tracing(level: Level) -> Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(level).into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|e| eyre::eyre!("Failed to install tracing subscriber: {}", e))
}

/// Starts the API server with the provided configuration and state
///
/// Applies CORS when origins are configured, a per-request timeout, and
/// request tracing, then serves until the process is stopped.
///
/// # Example
///
/// ```no_run
/// # async fn run(state: agenda_api::ApiState<agenda_db::PgStore>) -> eyre::Result<()> {
/// let config = agenda_api::config::ApiConfig::from_env()?;
/// agenda_api::start_server(config, state).await?;
/// # Ok(())
/// # }
/// ```
pub async fn start_server<S: BookingStore>(
    config: config::ApiConfig,
    state: ApiState<S>,
) -> Result<()> {
    let state = Arc::new(state);
    spawn_rate_limit_purge(state.rate_limiter.clone(), config.rate_limit_window);

    let app = app(state);

    // Apply CORS configuration if origins are specified
    let app = match &config.cors_origins {
        Some(origins) => app.layer(cors_layer(origins)),
        None => app,
    };

    let app = app.layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(TimeoutLayer::new(std::time::Duration::from_secs(
                config.request_timeout,
            ))),
    );

    // Start the HTTP server
    let addr = config.server_addr();
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(%origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::ACCEPT,
            HeaderName::from_static(PERSON_HEADER),
        ])
        .allow_origin(allowed)
        .allow_credentials(true)
}

fn spawn_rate_limit_purge(limiter: Arc<dyn RateLimiter>, every: std::time::Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every.max(std::time::Duration::from_secs(1)));
        loop {
            ticker.tick().await;
            limiter.purge_expired();
        }
    });
}
