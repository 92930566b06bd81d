//! Server Configuration
//!
//! Loads configuration from environment variables.

use anyhow::Result;
use std::env;

/// Default debounce window in milliseconds.
pub const DEFAULT_WINDOW_MS: u64 = 6000;

/// Default listen port when neither `BIND_ADDRESS` nor `PORT` is set.
pub const DEFAULT_PORT: u16 = 3000;

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address (e.g., "0.0.0.0:3000")
    pub bind_address: String,

    /// Debounce window in milliseconds (default: 6000)
    pub window_ms: u64,

    /// Downstream webhook receiving merged payloads (optional)
    pub callback_url: Option<String>,

    /// Shared secret gating `/ingest` and sent with every callback (empty = disabled)
    pub shared_secret: String,

    /// Stamp `source`, `firstTimestamp` and `lastTimestamp` onto flushed payloads
    pub annotate_flush: bool,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let port = env::var("PORT")
            .ok()
            .and_then(|v| v.parse::<u16>().ok())
            .unwrap_or(DEFAULT_PORT);

        Ok(Self {
            bind_address: env::var("BIND_ADDRESS").unwrap_or_else(|_| format!("0.0.0.0:{port}")),
            window_ms: env::var("WINDOW_MS")
                .ok()
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(DEFAULT_WINDOW_MS),
            callback_url: env::var("CALLBACK_URL")
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),
            shared_secret: env::var("SHARED_SECRET").unwrap_or_default(),
            annotate_flush: env::var("ANNOTATE_FLUSH")
                .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
        })
    }

    /// Check if a downstream callback is configured.
    #[must_use]
    pub const fn has_callback(&self) -> bool {
        self.callback_url.is_some()
    }

    /// Check if inbound requests must present the shared secret.
    #[must_use]
    pub fn requires_secret(&self) -> bool {
        !self.shared_secret.is_empty()
    }

    /// Create a default configuration for testing.
    #[must_use]
    pub fn default_for_test() -> Self {
        Self {
            bind_address: "127.0.0.1:3000".into(),
            window_ms: DEFAULT_WINDOW_MS,
            callback_url: None,
            shared_secret: String::new(),
            annotate_flush: false,
        }
    }
}
