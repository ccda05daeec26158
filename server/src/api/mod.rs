//! API Router and Application State
//!
//! Central routing configuration and shared state.

pub mod error;
pub mod lead;

use std::any::Any;
use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    extract::State,
    http::{
        header::{
            ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
            ACCESS_CONTROL_ALLOW_ORIGIN,
        },
        HeaderValue,
    },
    response::{IntoResponse, Response},
    routing::{any, get},
    Json, Router,
};
use serde::Serialize;
use tower_http::{
    catch_panic::CatchPanicLayer,
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};
use tracing::error;

pub use error::LeadError;

use crate::{
    channels::{Channel, EmailChannel, TelegramChannel},
    config::Config,
    delivery::Dispatcher,
};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Relay configuration
    pub config: Arc<Config>,
    /// Fan-out to the notification channels
    pub dispatcher: Dispatcher,
}

impl AppState {
    /// Create application state with the real Telegram and email channels.
    #[must_use]
    pub fn new(config: Config, http_client: reqwest::Client) -> Self {
        let telegram = Arc::new(TelegramChannel::new(&config, http_client));
        let email = Arc::new(EmailChannel::new(&config));
        Self::with_channels(config, telegram, email)
    }

    /// Create application state with caller-supplied channels.
    #[must_use]
    pub fn with_channels(
        config: Config,
        telegram: Arc<dyn Channel>,
        email: Arc<dyn Channel>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            dispatcher: Dispatcher::new(telegram, email),
        }
    }
}

/// Methods advertised to cross-origin callers.
pub const ALLOWED_METHODS: &str = "GET, POST, OPTIONS";

/// Request headers advertised to cross-origin callers.
pub const ALLOWED_HEADERS: &str = "Content-Type, Content-Transfer-Encoding, X-Body-Encoding";

/// Create the main application router.
///
/// CORS headers are set on every response, errors and preflights included.
/// Preflights are not intercepted: OPTIONS reaches the lead handler.
pub fn create_router(state: AppState) -> Router {
    let max_body_size = state.config.max_body_size;

    Router::new()
        // Health check
        .route("/health", get(health_check))
        // Lead intake (method dispatch happens in the handler)
        .route("/lead", any(lead::submit))
        // Middleware
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http())
        .layer(SetResponseHeaderLayer::overriding(
            ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(ALLOWED_METHODS),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(ALLOWED_HEADERS),
        ))
        .layer(DefaultBodyLimit::max(max_body_size))
        // State
        .with_state(state)
}

/// Render a handler panic as a generic server error.
fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let details = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        (*s).to_string()
    } else {
        "unknown panic".to_string()
    };
    error!(details = %details, "Request handler panicked");
    LeadError::Internal(details).into_response()
}

/// Health check response.
#[derive(Serialize)]
struct HealthResponse {
    /// Service status
    status: &'static str,
    /// Whether the Telegram channel has credentials
    telegram: bool,
    /// Whether the email channel has credentials
    email: bool,
}

/// Health check endpoint.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        telegram: state.config.has_telegram(),
        email: state.config.has_smtp(),
    })
}
