//! Buffer Types
//!
//! Shapes, engine results and error types shared by the aggregation engine.

use std::fmt;

use thiserror::Error;

/// Structural format an inbound (and outbound) payload is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// Array whose first element carries the event under `body`.
    Wrapped,
    /// Single object carrying the event at the top level.
    Flat,
}

impl Shape {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Wrapped => "wrapped",
            Self::Flat => "flat",
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Successful submission: the event is buffered and its flush is armed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Accepted {
    pub window_ms: u64,
}

/// Errors reported to the caller of `submit`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmitError {
    #[error("Missing waId")]
    MissingKey,
}

/// Failure while rebuilding the outbound payload during a flush.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MergeError {
    #[error("payload does not match {expected} shape: {reason}")]
    ShapeMismatch { expected: Shape, reason: &'static str },
}

/// Failure while handing a merged payload to the downstream webhook.
#[derive(Error, Debug)]
pub enum DeliveryError {
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("JSON serialize error: {0}")]
    Serialize(#[from] serde_json::Error),
}
