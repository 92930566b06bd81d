//! Reusable test helpers for HTTP integration tests.
//!
//! Provides `TestApp` for building and sending requests through the full axum
//! router, plus a throwaway callback receiver for end-to-end relay tests.
#![allow(dead_code)]

use axum::body::{Body, Bytes};
use axum::http::{self, HeaderMap, Method, Request, Response, StatusCode};
use axum::routing::post;
use axum::Router;
use http_body_util::BodyExt;
use mb_server::api::{create_router, AppState};
use mb_server::config::Config;
use tokio::sync::mpsc;
use tower::ServiceExt;

/// Test application wrapping the full router.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
}

impl TestApp {
    /// Build a test app with the default test config (no callback, no secret).
    pub fn new() -> Self {
        Self::with_config(Config::default_for_test())
    }

    /// Build a test app with a custom config.
    pub fn with_config(config: Config) -> Self {
        let state = AppState::from_config(config).expect("Failed to build app state");
        let router = create_router(state.clone());
        Self { router, state }
    }

    /// Create a request builder for the given method and URI.
    pub fn request(method: Method, uri: &str) -> http::request::Builder {
        Request::builder().method(method).uri(uri)
    }

    /// Send a request through the router via `tower::ServiceExt::oneshot`.
    pub async fn oneshot(&self, request: Request<Body>) -> Response<Body> {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("oneshot request failed")
    }

    /// `POST /ingest` with a JSON body and optional shared secret.
    pub async fn post_ingest(
        &self,
        body: &serde_json::Value,
        secret: Option<&str>,
    ) -> Response<Body> {
        let mut builder =
            Self::request(Method::POST, "/ingest").header("Content-Type", "application/json");
        if let Some(secret) = secret {
            builder = builder.header("x-shared-secret", secret);
        }
        let req = builder
            .body(Body::from(serde_json::to_vec(body).unwrap()))
            .unwrap();
        self.oneshot(req).await
    }
}

/// Parse a response body as JSON.
pub async fn body_to_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("Failed to collect response body")
        .to_bytes();
    serde_json::from_slice(&bytes).unwrap_or_else(|e| {
        let preview = String::from_utf8_lossy(&bytes);
        panic!("Failed to parse response as JSON: {e}\nBody: {preview}")
    })
}

/// A delivered callback as seen by the receiver.
pub struct Callback {
    pub headers: HeaderMap,
    pub body: serde_json::Value,
}

/// Spawn a local server that records every callback POSTed to `/hook`.
///
/// Returns the callback URL and a channel yielding received callbacks.
pub async fn spawn_callback_receiver() -> (String, mpsc::UnboundedReceiver<Callback>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let app = Router::new().route(
        "/hook",
        post(move |headers: HeaderMap, body: Bytes| {
            let tx = tx.clone();
            async move {
                let body = serde_json::from_slice(&body).expect("callback body is not JSON");
                let _ = tx.send(Callback { headers, body });
                StatusCode::OK
            }
        }),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind callback receiver");
    let addr = listener.local_addr().expect("Failed to get local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });

    (format!("http://{addr}/hook"), rx)
}
