//! Reusable test helpers for HTTP integration tests.
//!
//! Provides `TestApp` for building and sending requests through the full axum
//! router, plus a `CountingChannel` stand-in for the notification channels.
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{self, Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use lead_relay::api::{create_router, AppState};
use lead_relay::channels::{Channel, DeliveryOutcome};
use lead_relay::config::Config;
use tower::ServiceExt;

// ============================================================================
// Fake channels
// ============================================================================

/// Channel that records every delivery and returns a fixed outcome.
pub struct CountingChannel {
    name: &'static str,
    outcome: DeliveryOutcome,
    delay: Duration,
    calls: AtomicUsize,
    texts: Mutex<Vec<String>>,
}

impl CountingChannel {
    pub fn new(name: &'static str, outcome: DeliveryOutcome) -> Arc<Self> {
        Self::delayed(name, outcome, Duration::ZERO)
    }

    pub fn delayed(name: &'static str, outcome: DeliveryOutcome, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            name,
            outcome,
            delay,
            calls: AtomicUsize::new(0),
            texts: Mutex::new(Vec::new()),
        })
    }

    /// Number of delivery attempts made through this channel.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Texts received so far.
    pub fn texts(&self) -> Vec<String> {
        self.texts.lock().expect("texts lock poisoned").clone()
    }
}

#[async_trait]
impl Channel for CountingChannel {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn deliver(&self, text: &str) -> DeliveryOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.texts
            .lock()
            .expect("texts lock poisoned")
            .push(text.to_string());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.outcome.clone()
    }
}

// ============================================================================
// Test App
// ============================================================================

/// A test application wrapping the full axum router.
pub struct TestApp {
    pub router: Router,
}

impl TestApp {
    /// Create a test app with the real Telegram and email channels.
    pub fn new(config: Config) -> Self {
        let state = AppState::new(config, reqwest::Client::new());
        Self {
            router: create_router(state),
        }
    }

    /// Create a test app with caller-supplied channels.
    pub fn with_channels(
        config: Config,
        telegram: Arc<dyn Channel>,
        email: Arc<dyn Channel>,
    ) -> Self {
        let state = AppState::with_channels(config, telegram, email);
        Self {
            router: create_router(state),
        }
    }

    /// Build an HTTP request with the given method and URI.
    pub fn request(method: Method, uri: &str) -> http::request::Builder {
        Request::builder().method(method).uri(uri)
    }

    /// Build a JSON POST to the lead endpoint.
    pub fn post_json(body: &serde_json::Value) -> Request<Body> {
        Self::request(Method::POST, "/lead")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("Failed to build request")
    }

    /// Send a request through the router via `tower::ServiceExt::oneshot`.
    pub async fn oneshot(&self, request: Request<Body>) -> Response<Body> {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("oneshot request failed")
    }
}

/// Config with the Telegram channel pointed at a mock bot API.
pub fn telegram_config(api_base: &str) -> Config {
    let mut config = Config::default_for_test();
    config.telegram_bot_token = Some("123:test-token".into());
    config.telegram_chat_id = Some("42".into());
    config.telegram_api_base = api_base.into();
    config
}

/// Read a response body and parse it as JSON.
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
