//! Telegram Bot Channel
//!
//! Posts the lead text to `sendMessage` on the bot API. One retry after a
//! short fixed delay; each attempt is bounded by the request timeout.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tracing::{info, instrument, warn};

use super::{Channel, DeliveryOutcome};
use crate::config::Config;

/// Total attempts, including the first one.
pub const MAX_ATTEMPTS: u32 = 2;

/// Bot credentials; both are required to send.
#[derive(Clone)]
struct Credentials {
    token: String,
    chat_id: String,
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    disable_web_page_preview: bool,
}

/// Delivers lead messages through a Telegram bot.
#[derive(Clone)]
pub struct TelegramChannel {
    client: reqwest::Client,
    api_base: String,
    credentials: Option<Credentials>,
    timeout: Duration,
    retry_delay: Duration,
}

impl TelegramChannel {
    /// Create the channel from configuration.
    ///
    /// Missing credentials are not an error here; [`Channel::deliver`] reports
    /// them as a skipped delivery.
    pub fn new(config: &Config, client: reqwest::Client) -> Self {
        let credentials = match (&config.telegram_bot_token, &config.telegram_chat_id) {
            (Some(token), Some(chat_id)) => Some(Credentials {
                token: token.clone(),
                chat_id: chat_id.clone(),
            }),
            _ => None,
        };

        Self {
            client,
            api_base: config.telegram_api_base.clone(),
            credentials,
            timeout: config.telegram_timeout,
            retry_delay: config.telegram_retry_delay,
        }
    }

    /// Make one `sendMessage` call.
    async fn attempt(&self, creds: &Credentials, text: &str) -> DeliveryOutcome {
        let url = format!("{}/bot{}/sendMessage", self.api_base, creds.token);
        let body = SendMessage {
            chat_id: &creds.chat_id,
            text,
            disable_web_page_preview: true,
        };

        // The URL carries the bot token, so it is stripped from every error.
        let resp = match self
            .client
            .post(&url)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(e) => return transport_failure(e.without_url(), self.timeout),
        };

        let status = resp.status();
        let raw = match resp.text().await {
            Ok(raw) => raw,
            Err(e) => return transport_failure(e.without_url(), self.timeout),
        };
        let payload = serde_json::from_str::<Value>(&raw).ok().or_else(|| {
            let trimmed = raw.trim();
            (!trimmed.is_empty()).then(|| Value::String(trimmed.to_string()))
        });

        let api_ok = payload
            .as_ref()
            .and_then(|p| p.get("ok"))
            .and_then(Value::as_bool)
            .unwrap_or(false);

        if status.is_success() && api_ok {
            let message_id = payload
                .as_ref()
                .and_then(|p| p.pointer("/result/message_id"))
                .map(|id| match id {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                });
            return DeliveryOutcome::delivered(message_id);
        }

        let description = payload
            .as_ref()
            .and_then(|p| p.get("description"))
            .and_then(Value::as_str);
        let reason = match description {
            Some(desc) => format!("Telegram API error (HTTP {}): {desc}", status.as_u16()),
            None => format!("Telegram API error (HTTP {})", status.as_u16()),
        };

        DeliveryOutcome::Failed {
            reason,
            status: Some(status.as_u16()),
            response: payload,
        }
    }
}

fn transport_failure(err: reqwest::Error, timeout: Duration) -> DeliveryOutcome {
    if err.is_timeout() {
        DeliveryOutcome::failed(format!(
            "Telegram request timed out after {}ms",
            timeout.as_millis()
        ))
    } else {
        DeliveryOutcome::failed(format!("Telegram request failed: {err}"))
    }
}

#[async_trait]
impl Channel for TelegramChannel {
    fn name(&self) -> &'static str {
        "telegram"
    }

    #[instrument(name = "telegram_deliver", skip_all)]
    async fn deliver(&self, text: &str) -> DeliveryOutcome {
        let Some(creds) = &self.credentials else {
            return DeliveryOutcome::skipped("TELEGRAM_BOT_TOKEN or TELEGRAM_CHAT_ID is not set");
        };

        let mut outcome = DeliveryOutcome::failed("Telegram delivery was not attempted");
        for attempt in 1..=MAX_ATTEMPTS {
            outcome = self.attempt(creds, text).await;
            if outcome.is_delivered() {
                info!(attempt, "Telegram message delivered");
                return outcome;
            }

            warn!(
                attempt,
                max_attempts = MAX_ATTEMPTS,
                error = outcome.reason().unwrap_or_default(),
                "Telegram delivery attempt failed"
            );
            if attempt < MAX_ATTEMPTS {
                tokio::time::sleep(self.retry_delay).await;
            }
        }

        outcome
    }
}
