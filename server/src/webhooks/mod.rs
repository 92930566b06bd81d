//! Callback Webhook
//!
//! Best-effort HTTP POST of merged payloads to the downstream consumer.

pub mod delivery;
pub mod signing;

pub use delivery::WebhookClient;
