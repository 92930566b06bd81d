//! Ingest Handler
//!
//! Accepts one inbound event and folds it into its sender's buffer.

use axum::{body::Bytes, extract::State, Json};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use super::error::{ApiError, ApiResult};
use super::AppState;

/// Response for an accepted event.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestResponse {
    pub ok: bool,
    pub buffered: bool,
    pub window_ms: u64,
}

/// `POST /ingest`
///
/// The body may be a wrapped array or a flat object; anything without a
/// `waId` is rejected with 400.
#[tracing::instrument(skip(state, body), fields(bytes = body.len()))]
pub async fn ingest(State(state): State<AppState>, body: Bytes) -> ApiResult<Json<IngestResponse>> {
    let payload: Value = serde_json::from_slice(&body).map_err(|e| {
        debug!(error = %e, "Rejecting unparsable ingest body");
        ApiError::InvalidJson
    })?;

    let accepted = state.engine.submit(payload)?;

    Ok(Json(IngestResponse {
        ok: true,
        buffered: true,
        window_ms: accepted.window_ms,
    }))
}
