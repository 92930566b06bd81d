//! Callback Delivery
//!
//! Posts each merged payload once to `CALLBACK_URL`. Responses are only
//! logged; there is no retry and no dead-letter handling.

use std::time::{Duration, Instant};

use serde_json::Value;
use tracing::{debug, info, warn};

use super::signing;
use crate::buffer::{Deliver, DeliveryError};
use crate::config::Config;

/// Header carrying the shared secret on outbound callbacks.
pub const SHARED_SECRET_HEADER: &str = "x-shared-secret";

/// Header carrying the HMAC-SHA256 body signature when a secret is configured.
pub const SIGNATURE_HEADER: &str = "x-signature";

/// Per-request timeout for callback POSTs.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP client for the downstream callback.
#[derive(Debug, Clone)]
pub struct WebhookClient {
    http: reqwest::Client,
    url: Option<String>,
    shared_secret: String,
}

impl WebhookClient {
    /// Build a client posting to `url`; `None` turns delivery into a no-op.
    pub fn new(url: Option<String>, shared_secret: String) -> Result<Self, DeliveryError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            url,
            shared_secret,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, DeliveryError> {
        Self::new(config.callback_url.clone(), config.shared_secret.clone())
    }
}

impl Deliver for WebhookClient {
    async fn deliver(&self, payload: Value) -> Result<(), DeliveryError> {
        let Some(url) = self.url.as_deref() else {
            debug!("CALLBACK_URL not configured, dropping merged payload");
            return Ok(());
        };

        let body = serde_json::to_vec(&payload)?;

        let mut request = self
            .http
            .post(url)
            .header("Content-Type", "application/json")
            .header(SHARED_SECRET_HEADER, self.shared_secret.as_str());
        if !self.shared_secret.is_empty() {
            let signature = signing::sign_payload(&self.shared_secret, &body);
            request = request.header(SIGNATURE_HEADER, format!("sha256={signature}"));
        }

        let start = Instant::now();
        let resp = request.body(body).send().await?;
        let latency_ms = start.elapsed().as_millis() as u64;
        let status = resp.status();

        if status.is_success() {
            info!(status = status.as_u16(), latency_ms, "Callback sent");
        } else {
            warn!(status = status.as_u16(), latency_ms, "Callback rejected by downstream");
        }

        Ok(())
    }
}
