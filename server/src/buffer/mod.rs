//! Message Buffering
//!
//! Per-sender debounce engine: coalesces bursts of inbound messages and
//! emits one merged payload once the sender goes quiet.

pub mod engine;
pub mod merge;
pub mod normalize;
pub mod types;

pub use engine::{Aggregator, Deliver};
pub use normalize::{normalize, Normalized};
pub use types::{Accepted, DeliveryError, MergeError, Shape, SubmitError};
