//! Relay Configuration
//!
//! Loads configuration from environment variables. Channel credentials are all
//! optional: a channel without its full credential set is skipped at delivery
//! time instead of failing start-up.

use std::env;
use std::time::Duration;

use chrono_tz::Tz;
use thiserror::Error;

use crate::delivery::SuccessPolicy;

/// Default Telegram bot API base URL.
pub const DEFAULT_TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Standard implicit-TLS SMTP port.
pub const SMTPS_PORT: u16 = 465;

/// Errors raised while loading configuration.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("LEAD_TIMEZONE is not a valid IANA time zone: {0}")]
    InvalidTimezone(String),
    #[error("LEAD_SUCCESS_POLICY must be \"all\" or \"any\", got {0:?}")]
    InvalidPolicy(String),
}

/// Relay configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address (e.g., "0.0.0.0:8080")
    pub bind_address: String,

    /// Telegram bot token (optional)
    pub telegram_bot_token: Option<String>,

    /// Telegram destination chat ID (optional)
    pub telegram_chat_id: Option<String>,

    /// Telegram bot API base URL
    pub telegram_api_base: String,

    /// Per-attempt timeout for the bot API call
    pub telegram_timeout: Duration,

    /// Pause before the single retry
    pub telegram_retry_delay: Duration,

    /// SMTP relay host (optional)
    pub smtp_host: Option<String>,

    /// SMTP relay port (default: 465, implicit TLS)
    pub smtp_port: u16,

    /// SMTP username (optional)
    pub smtp_username: Option<String>,

    /// SMTP password (optional)
    pub smtp_password: Option<String>,

    /// Sender address; falls back to the SMTP username
    pub smtp_from: Option<String>,

    /// Destination address for lead emails (optional)
    pub lead_to_email: Option<String>,

    /// SMTP connection/socket timeout
    pub smtp_timeout: Duration,

    /// Time zone used for the local timestamp in lead messages
    pub timezone: Tz,

    /// Rule that turns per-channel outcomes into one success flag
    pub success_policy: SuccessPolicy,

    /// Maximum accepted request body in bytes (default: 64KB)
    pub max_body_size: usize,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    ///
    /// Blank values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let millis = |key: &str, default: u64| {
            Duration::from_millis(get(key).and_then(|v| v.parse().ok()).unwrap_or(default))
        };

        let timezone = match get("LEAD_TIMEZONE") {
            Some(name) => name
                .parse::<Tz>()
                .map_err(|_| ConfigError::InvalidTimezone(name))?,
            None => chrono_tz::America::New_York,
        };

        let success_policy = match get("LEAD_SUCCESS_POLICY") {
            Some(name) => name
                .parse::<SuccessPolicy>()
                .map_err(|()| ConfigError::InvalidPolicy(name))?,
            None => SuccessPolicy::default(),
        };

        Ok(Self {
            bind_address: get("BIND_ADDRESS").unwrap_or_else(|| "0.0.0.0:8080".into()),
            telegram_bot_token: get("TELEGRAM_BOT_TOKEN"),
            telegram_chat_id: get("TELEGRAM_CHAT_ID"),
            telegram_api_base: get("TELEGRAM_API_BASE")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_TELEGRAM_API_BASE.into()),
            telegram_timeout: millis("TELEGRAM_TIMEOUT_MS", 8000),
            telegram_retry_delay: millis("TELEGRAM_RETRY_DELAY_MS", 700),
            smtp_host: get("SMTP_HOST"),
            smtp_port: get("SMTP_PORT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(SMTPS_PORT),
            smtp_username: get("SMTP_USER"),
            smtp_password: get("SMTP_PASS"),
            smtp_from: get("SMTP_FROM"),
            lead_to_email: get("LEAD_TO_EMAIL"),
            smtp_timeout: millis("SMTP_TIMEOUT_MS", 15_000),
            timezone,
            success_policy,
            max_body_size: get("MAX_BODY_SIZE")
                .and_then(|v| v.parse().ok())
                .unwrap_or(64 * 1024), // 64KB
        })
    }

    /// Check if the Telegram channel has both token and chat ID.
    #[must_use]
    pub const fn has_telegram(&self) -> bool {
        self.telegram_bot_token.is_some() && self.telegram_chat_id.is_some()
    }

    /// Check if the email channel has host, credentials and a recipient.
    #[must_use]
    pub const fn has_smtp(&self) -> bool {
        self.smtp_host.is_some()
            && self.smtp_username.is_some()
            && self.smtp_password.is_some()
            && self.lead_to_email.is_some()
    }

    /// Create a default configuration for testing.
    ///
    /// No channel is configured; tests fill in what they need.
    #[must_use]
    pub fn default_for_test() -> Self {
        Self {
            bind_address: "127.0.0.1:8080".into(),
            telegram_bot_token: None,
            telegram_chat_id: None,
            telegram_api_base: DEFAULT_TELEGRAM_API_BASE.into(),
            telegram_timeout: Duration::from_millis(500),
            telegram_retry_delay: Duration::from_millis(10),
            smtp_host: None,
            smtp_port: SMTPS_PORT,
            smtp_username: None,
            smtp_password: None,
            smtp_from: None,
            lead_to_email: None,
            smtp_timeout: Duration::from_secs(2),
            timezone: chrono_tz::America::New_York,
            success_policy: SuccessPolicy::All,
            max_body_size: 64 * 1024,
        }
    }
}
