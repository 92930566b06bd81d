//! Shared-Secret Authentication
//!
//! Gates inbound routes behind the `x-shared-secret` header when
//! `SHARED_SECRET` is configured.

mod middleware;

pub use middleware::require_shared_secret;
