//! Message Buffer Server
//!
//! Receives inbound chat events, merges bursts of consecutive messages from
//! the same sender, and forwards one combined payload once the sender goes
//! quiet.

pub mod api;
pub mod auth;
pub mod buffer;
pub mod config;
pub mod webhooks;
