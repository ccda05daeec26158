//! Notification Channels
//!
//! Each channel takes the formatted lead text and reports a structured
//! [`DeliveryOutcome`]. Channels never return errors: transport and upstream
//! failures are captured in the outcome so the other channel's result is
//! always reported alongside.

pub mod email;
pub mod telegram;

use async_trait::async_trait;
use serde::{Serialize, Serializer};

pub use email::EmailChannel;
pub use telegram::TelegramChannel;

/// An outbound notification mechanism.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Short name used in logs and error summaries.
    fn name(&self) -> &'static str;

    /// Attempt delivery of `text`.
    async fn deliver(&self, text: &str) -> DeliveryOutcome;
}

/// Result of one channel's delivery attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum DeliveryOutcome {
    /// Upstream accepted the message.
    Delivered { message_id: Option<String> },
    /// Channel is not configured; nothing was sent.
    Skipped { reason: String },
    /// Delivery was attempted and failed.
    Failed {
        reason: String,
        /// Upstream HTTP status, when one was received.
        status: Option<u16>,
        /// Upstream response body, when one was received.
        response: Option<serde_json::Value>,
    },
}

impl DeliveryOutcome {
    pub const fn delivered(message_id: Option<String>) -> Self {
        Self::Delivered { message_id }
    }

    pub fn skipped(reason: impl Into<String>) -> Self {
        Self::Skipped {
            reason: reason.into(),
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Failed {
            reason: reason.into(),
            status: None,
            response: None,
        }
    }

    pub const fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered { .. })
    }

    pub const fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped { .. })
    }

    /// Human-readable reason for a non-delivery, `None` when delivered.
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Delivered { .. } => None,
            Self::Skipped { reason } | Self::Failed { reason, .. } => Some(reason.as_str()),
        }
    }

    /// Stable label for structured logs.
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Delivered { .. } => "delivered",
            Self::Skipped { .. } => "skipped",
            Self::Failed { .. } => "failed",
        }
    }
}

/// JSON shape of an outcome in API responses.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct OutcomeBody<'a> {
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    message_id: Option<&'a str>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    skipped: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response: Option<&'a serde_json::Value>,
}

impl Serialize for DeliveryOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let body = match self {
            Self::Delivered { message_id } => OutcomeBody {
                ok: true,
                message_id: message_id.as_deref(),
                skipped: false,
                reason: None,
                error: None,
                status: None,
                response: None,
            },
            Self::Skipped { reason } => OutcomeBody {
                ok: false,
                message_id: None,
                skipped: true,
                reason: Some(reason.as_str()),
                error: None,
                status: None,
                response: None,
            },
            Self::Failed {
                reason,
                status,
                response,
            } => OutcomeBody {
                ok: false,
                message_id: None,
                skipped: false,
                reason: None,
                error: Some(reason.as_str()),
                status: *status,
                response: response.as_ref(),
            },
        };
        body.serialize(serializer)
    }
}
