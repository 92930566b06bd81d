//! API Router and Application State
//!
//! Central routing configuration and shared state.

mod error;
pub mod ingest;

pub use error::{ApiError, ApiResult, ErrorResponse};

use std::any::Any;
use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    extract::State,
    middleware::from_fn_with_state,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{Any as AnyOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    auth,
    buffer::{Aggregator, DeliveryError},
    config::Config,
    webhooks::WebhookClient,
};

/// Maximum accepted request body (2MB).
pub const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Per-sender debounce engine
    pub engine: Aggregator<WebhookClient>,
    /// Server configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Create new application state.
    #[must_use]
    pub fn new(config: Config, engine: Aggregator<WebhookClient>) -> Self {
        Self {
            engine,
            config: Arc::new(config),
        }
    }

    /// Build the webhook client and engine described by `config`.
    pub fn from_config(config: Config) -> Result<Self, DeliveryError> {
        let client = WebhookClient::from_config(&config)?;
        let engine = Aggregator::with_options(config.window_ms, config.annotate_flush, client);
        Ok(Self::new(config, engine))
    }
}

/// Create the main application router.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AnyOrigin)
        .allow_methods(AnyOrigin)
        .allow_headers(AnyOrigin);

    // Ingest requires the shared secret when one is configured
    let ingest_routes = Router::new()
        .route("/ingest", post(ingest::ingest))
        .layer(from_fn_with_state(state.clone(), auth::require_shared_secret));

    Router::new()
        // Health check
        .route("/health", get(health_check))
        .merge(ingest_routes)
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(cors)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        // State
        .with_state(state)
}

/// Map a handler panic to the generic 500 body.
fn handle_panic(_err: Box<dyn Any + Send + 'static>) -> Response {
    tracing::error!("Request handler panicked");
    ApiError::Internal.into_response()
}

/// Health check response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    /// Always `true` while the server is up
    ok: bool,
    /// Configured debounce window
    window_ms: u64,
    /// Whether a downstream callback is configured
    has_callback: bool,
    /// Senders with an open burst
    pending: usize,
}

/// Health check endpoint.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        ok: true,
        window_ms: state.engine.window_ms(),
        has_callback: state.config.has_callback(),
        pending: state.engine.pending_keys(),
    })
}
