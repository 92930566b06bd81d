//! Authentication Middleware

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tracing::warn;

use crate::api::{ApiError, AppState};
use crate::webhooks::delivery::SHARED_SECRET_HEADER;
use crate::webhooks::signing::secrets_match;

/// Middleware rejecting requests whose `x-shared-secret` header does not
/// match the configured secret. Passes everything through when no secret
/// is configured.
///
/// # Usage
///
/// ```ignore
/// Router::new()
///     .route("/ingest", post(handler))
///     .layer(axum::middleware::from_fn_with_state(state, require_shared_secret))
/// ```
pub async fn require_shared_secret(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if state.config.requires_secret() {
        let provided = request
            .headers()
            .get(SHARED_SECRET_HEADER)
            .and_then(|h| h.to_str().ok())
            .unwrap_or_default();

        if !secrets_match(&state.config.shared_secret, provided) {
            warn!(uri = %request.uri(), "Rejected request with invalid shared secret");
            return Err(ApiError::Unauthorized);
        }
    }

    Ok(next.run(request).await)
}
