//! # Posture HTTP API Module
//!
//! HTTP REST API server using axum.
//!
//! ## Endpoints
//!
//! - `GET /health` - Health check
//! - `GET /weights` - Effective risk-weight table
//! - `POST /assess` - Annotate a table
//! - `POST /insights` - Aggregate insights over a table
//! - `POST /classify` - Annotate a single row
//!
//! ## Security Configuration (Environment Variables)
//!
//! - `POSTURE_CORS_ORIGINS`: Comma-separated list of allowed origins, or "*" for all (default: localhost only)
//! - `POSTURE_RATE_LIMIT`: Requests per second (default: 100, 0 to disable)
//! - `POSTURE_API_KEY`: If set, requires Bearer token authentication

mod auth;
mod handlers;
mod middleware;
mod types;

pub use auth::{API_KEY_ENV, get_api_key_from_env};
pub use handlers::{
    assess_handler, classify_handler, health_handler, insights_handler, weights_handler,
};
pub use middleware::{
    DEFAULT_RATE_LIMIT, RATE_LIMIT_ENV, create_rate_limiter, get_rate_limit_from_env,
    parse_rate_limit,
};
pub use types::{
    AssessRequest, AssessResponse, ClassifyRequest, ClassifyResponse, HealthResponse,
    InsightsRequest, InsightsResponse, WeightEntry, WeightsResponse,
};

use crate::assessor::Assessor;
use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware as axum_middleware,
    routing::{get, post},
};
use posture_core::PostureError;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Environment variable holding allowed CORS origins.
pub const CORS_ORIGINS_ENV: &str = "POSTURE_CORS_ORIGINS";

/// Maximum request body size (2 MB).
pub const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

// =============================================================================
// SERVER STATE
// =============================================================================

/// Shared server state.
#[derive(Clone)]
pub struct AppState {
    pub assessor: Arc<Assessor>,
}

impl AppState {
    #[must_use]
    pub fn new(assessor: Assessor) -> Self {
        Self {
            assessor: Arc::new(assessor),
        }
    }
}

// =============================================================================
// CORS CONFIGURATION
// =============================================================================

/// CORS layer from `POSTURE_CORS_ORIGINS`.
///
/// - `*`: any origin (logged as a warning)
/// - unset, or no valid entries: localhost only
/// - otherwise: the listed origins
fn build_cors_layer() -> CorsLayer {
    let origins_env = std::env::var(CORS_ORIGINS_ENV).ok();

    match origins_env.as_deref().map(str::trim) {
        Some("*") => {
            tracing::warn!("CORS: Allowing ALL origins ({}=*)", CORS_ORIGINS_ENV);
            CorsLayer::permissive()
        }
        Some(origins) => {
            let allowed: Vec<HeaderValue> = origins
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .filter_map(|origin| match origin.parse::<HeaderValue>() {
                    Ok(hv) => {
                        tracing::info!("CORS: Allowing origin: {}", origin);
                        Some(hv)
                    }
                    Err(e) => {
                        tracing::warn!("CORS: Invalid origin '{}': {}", origin, e);
                        None
                    }
                })
                .collect();

            if allowed.is_empty() {
                tracing::warn!(
                    "CORS: No valid origins in {}, defaulting to localhost only",
                    CORS_ORIGINS_ENV
                );
                restricted_cors(localhost_origins())
            } else {
                restricted_cors(allowed)
            }
        }
        None => {
            tracing::info!("CORS: {} not set, defaulting to localhost only", CORS_ORIGINS_ENV);
            restricted_cors(localhost_origins())
        }
    }
}

fn localhost_origins() -> Vec<HeaderValue> {
    [
        "http://localhost:3000",
        "http://localhost:8080",
        "http://127.0.0.1:3000",
        "http://127.0.0.1:8080",
    ]
    .into_iter()
    .filter_map(|o| o.parse::<HeaderValue>().ok())
    .collect()
}

fn restricted_cors(origins: Vec<HeaderValue>) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

// =============================================================================
// ROUTER CREATION
// =============================================================================

/// Create the router with all endpoints and middleware.
///
/// Middleware stack (outer to inner):
/// 1. Tracing
/// 2. CORS
/// 3. Body limit
/// 4. Rate limiting (if enabled)
/// 5. Authentication (if configured)
pub fn create_router(state: AppState) -> Router {
    let cors = build_cors_layer();

    let rate_limit = get_rate_limit_from_env();
    let rate_limiter = if rate_limit > 0 {
        tracing::info!("Rate limiting enabled: {} requests/second", rate_limit);
        Some(create_rate_limiter(rate_limit))
    } else {
        tracing::info!("Rate limiting disabled");
        None
    };

    let has_auth = get_api_key_from_env().is_some();
    if has_auth {
        tracing::info!("API key authentication enabled");
    } else {
        tracing::warn!(
            "API key authentication DISABLED; set {} to require a bearer token",
            API_KEY_ENV
        );
    }

    let mut router = Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/weights", get(handlers::weights_handler))
        .route("/assess", post(handlers::assess_handler))
        .route("/insights", post(handlers::insights_handler))
        .route("/classify", post(handlers::classify_handler));

    if has_auth {
        router = router.layer(axum_middleware::from_fn(auth::api_key_auth_middleware));
    }

    if let Some(limiter) = rate_limiter {
        router = router.layer(axum_middleware::from_fn_with_state(
            limiter,
            middleware::rate_limit_middleware,
        ));
    }

    router
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(axum::extract::DefaultBodyLimit::max(MAX_BODY_BYTES)),
        )
        .with_state(state)
}

// =============================================================================
// SERVER STARTUP
// =============================================================================

/// Bind and serve until the process is stopped.
pub async fn run_server(addr: &str, state: AppState) -> Result<(), PostureError> {
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| PostureError::IoError(format!("Bind failed: {}", e)))?;

    tracing::info!("Posture HTTP server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| PostureError::IoError(format!("Server error: {}", e)))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Cannot listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
