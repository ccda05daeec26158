//! Email Channel
//!
//! SMTP delivery of lead messages as plain-text email. Implicit TLS is used
//! on port 465, STARTTLS on any other port.

use std::fmt::Display;
use std::time::Duration;

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{Channel, DeliveryOutcome};
use crate::config::{Config, SMTPS_PORT};

/// Display name on the sender mailbox.
pub const SENDER_NAME: &str = "Website Leads";

/// Subject line of every lead email.
pub const SUBJECT: &str = "New website lead";

/// Complete SMTP settings; only built when every required value is present.
#[derive(Clone)]
struct SmtpSettings {
    host: String,
    port: u16,
    username: String,
    password: String,
    from: String,
    to: String,
}

impl SmtpSettings {
    fn from_config(config: &Config) -> Option<Self> {
        match (
            &config.smtp_host,
            &config.smtp_username,
            &config.smtp_password,
            &config.lead_to_email,
        ) {
            (Some(host), Some(username), Some(password), Some(to)) => Some(Self {
                host: host.clone(),
                port: config.smtp_port,
                username: username.clone(),
                password: password.clone(),
                from: config.smtp_from.clone().unwrap_or_else(|| username.clone()),
                to: to.clone(),
            }),
            _ => None,
        }
    }
}

/// Configured route: settings plus the transport built for them.
struct Route<T> {
    settings: SmtpSettings,
    /// Transport, or the reason it could not be created.
    mailer: Result<T, String>,
}

/// Delivers lead messages through an SMTP relay.
pub struct EmailChannel<T = AsyncSmtpTransport<Tokio1Executor>> {
    route: Option<Route<T>>,
}

const fn uses_implicit_tls(port: u16) -> bool {
    port == SMTPS_PORT
}

fn smtp_transport(
    settings: &SmtpSettings,
    timeout: Duration,
) -> Result<AsyncSmtpTransport<Tokio1Executor>, lettre::transport::smtp::Error> {
    let creds = Credentials::new(settings.username.clone(), settings.password.clone());
    let builder = if uses_implicit_tls(settings.port) {
        AsyncSmtpTransport::<Tokio1Executor>::relay(&settings.host)?
    } else {
        AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.host)?
    };

    Ok(builder
        .port(settings.port)
        .credentials(creds)
        .timeout(Some(timeout))
        .build())
}

impl EmailChannel {
    /// Create the channel from configuration.
    ///
    /// Incomplete SMTP settings leave the channel unconfigured; delivery then
    /// reports a skip.
    pub fn new(config: &Config) -> Self {
        let route = SmtpSettings::from_config(config).map(|settings| {
            let mailer = smtp_transport(&settings, config.smtp_timeout).map_err(|e| {
                warn!(error = %e, "Failed to create SMTP transport");
                format!("Failed to create SMTP transport: {e}")
            });
            Route { settings, mailer }
        });
        Self { route }
    }
}

impl<T> EmailChannel<T> {
    /// Create the channel with a caller-supplied transport.
    ///
    /// The SMTP settings still decide whether the channel is configured and
    /// supply the addresses; host, port and credentials are not used.
    pub fn with_transport(config: &Config, transport: T) -> Self {
        let route = SmtpSettings::from_config(config).map(|settings| Route {
            settings,
            mailer: Ok(transport),
        });
        Self { route }
    }

    /// Build the email, returning it with its generated `Message-ID`.
    fn build_message(settings: &SmtpSettings, text: &str) -> Result<(Message, String), String> {
        let from_address: Address = settings
            .from
            .parse()
            .map_err(|_| "SMTP_FROM is not a valid email address".to_string())?;
        let to_mailbox: Mailbox = settings
            .to
            .parse()
            .map_err(|_| "LEAD_TO_EMAIL is not a valid email address".to_string())?;

        let message_id = format!("<{}@{}>", Uuid::new_v4(), from_address.domain());
        let from_mailbox = Mailbox::new(Some(SENDER_NAME.to_string()), from_address);

        let email = Message::builder()
            .from(from_mailbox)
            .to(to_mailbox)
            .subject(SUBJECT)
            .message_id(Some(message_id.clone()))
            .header(ContentType::TEXT_PLAIN)
            .body(text.to_string())
            .map_err(|e| format!("Failed to build email message: {e}"))?;

        Ok((email, message_id))
    }
}

#[async_trait]
impl<T> Channel for EmailChannel<T>
where
    T: AsyncTransport + Send + Sync,
    T::Error: Display,
{
    fn name(&self) -> &'static str {
        "email"
    }

    #[instrument(name = "email_deliver", skip_all)]
    async fn deliver(&self, text: &str) -> DeliveryOutcome {
        let Some(Route { settings, mailer }) = &self.route else {
            return DeliveryOutcome::skipped(
                "SMTP_HOST, SMTP_USER, SMTP_PASS or LEAD_TO_EMAIL is not set",
            );
        };

        let (email, message_id) = match Self::build_message(settings, text) {
            Ok(built) => built,
            Err(reason) => {
                warn!(error = %reason, "Lead email could not be built");
                return DeliveryOutcome::failed(reason);
            }
        };

        let mailer = match mailer {
            Ok(mailer) => mailer,
            Err(reason) => return DeliveryOutcome::failed(reason.clone()),
        };

        match mailer.send(email).await {
            Ok(_) => {
                info!(port = settings.port, "Lead email delivered");
                DeliveryOutcome::delivered(Some(message_id))
            }
            Err(e) => {
                warn!(port = settings.port, error = %e, "Failed to send lead email via SMTP");
                DeliveryOutcome::failed(format!("Failed to send email via SMTP: {e}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use lettre::transport::stub::AsyncStubTransport;

    use super::*;

    /// Helper: create a Config with all SMTP fields populated, pointing at a
    /// local port where nothing listens.
    fn smtp_test_config() -> Config {
        let mut config = Config::default_for_test();
        config.smtp_host = Some("127.0.0.1".into());
        config.smtp_port = 1;
        config.smtp_username = Some("leads@example.com".into());
        config.smtp_password = Some("testpass".into());
        config.lead_to_email = Some("owner@example.com".into());
        config
    }

    fn settings_of<T>(channel: &EmailChannel<T>) -> &SmtpSettings {
        &channel.route.as_ref().expect("settings should be present").settings
    }

    #[test]
    fn test_new_complete_settings() {
        let channel = EmailChannel::new(&smtp_test_config());
        let settings = settings_of(&channel);
        assert_eq!(settings.from, "leads@example.com");
        assert_eq!(settings.to, "owner@example.com");
    }

    #[test]
    fn test_explicit_from_overrides_username() {
        let mut config = smtp_test_config();
        config.smtp_from = Some("noreply@example.com".into());
        let channel = EmailChannel::new(&config);
        assert_eq!(settings_of(&channel).from, "noreply@example.com");
    }

    #[tokio::test]
    async fn test_skipped_when_any_setting_missing() {
        for strip in 0..4 {
            let mut config = smtp_test_config();
            match strip {
                0 => config.smtp_host = None,
                1 => config.smtp_username = None,
                2 => config.smtp_password = None,
                _ => config.lead_to_email = None,
            }
            let outcome = EmailChannel::new(&config).deliver("hello").await;
            assert!(outcome.is_skipped(), "case {strip}: {outcome:?}");
        }
    }

    #[test]
    fn test_implicit_tls_only_on_465() {
        assert!(uses_implicit_tls(465));
        assert!(!uses_implicit_tls(587));
        assert!(!uses_implicit_tls(25));
    }

    #[test]
    fn test_message_headers() {
        let channel = EmailChannel::new(&smtp_test_config());
        let (email, message_id) =
            EmailChannel::<AsyncStubTransport>::build_message(settings_of(&channel), "Phone: 555-1212").unwrap();
        let raw = String::from_utf8(email.formatted()).unwrap();

        assert!(message_id.starts_with('<') && message_id.ends_with("@example.com>"));
        assert!(raw.contains("Subject: New website lead"));
        assert!(raw.contains("Website Leads"));
        assert!(raw.contains("<leads@example.com>"));
        assert!(raw.contains("To: owner@example.com"));
        assert!(raw.contains(&format!("Message-ID: {message_id}")));
        assert!(raw.contains("Phone: 555-1212"));
    }

    #[tokio::test]
    async fn test_invalid_recipient_fails_without_sending() {
        let mut config = smtp_test_config();
        config.lead_to_email = Some("not-an-email".into());
        let outcome = EmailChannel::new(&config).deliver("hello").await;
        assert_eq!(
            outcome.reason(),
            Some("LEAD_TO_EMAIL is not a valid email address")
        );
    }

    #[tokio::test]
    async fn test_unreachable_relay_is_a_failure() {
        let outcome = EmailChannel::new(&smtp_test_config()).deliver("hello").await;
        assert!(!outcome.is_delivered());
        assert!(!outcome.is_skipped());
        let reason = outcome.reason().unwrap_or_default();
        assert!(reason.starts_with("Failed to send email via SMTP"), "{reason}");
    }

    #[tokio::test]
    async fn test_accepted_message_reports_message_id() {
        let transport = AsyncStubTransport::new_ok();
        let channel = EmailChannel::with_transport(&smtp_test_config(), transport.clone());

        let outcome = channel.deliver("Phone: 555-1212").await;

        let DeliveryOutcome::Delivered {
            message_id: Some(message_id),
        } = &outcome
        else {
            panic!("expected delivery with a message id, got {outcome:?}");
        };
        let sent = transport.messages().await;
        assert_eq!(sent.len(), 1);
        let (envelope, raw) = &sent[0];
        assert_eq!(envelope.to()[0].to_string(), "owner@example.com");
        assert!(raw.contains(&format!("Message-ID: {message_id}")));
        assert!(raw.contains("Phone: 555-1212"));
    }

    #[tokio::test]
    async fn test_rejected_message_is_a_failure() {
        let channel =
            EmailChannel::with_transport(&smtp_test_config(), AsyncStubTransport::new_error());

        let outcome = channel.deliver("hello").await;

        assert_eq!(
            outcome.reason(),
            Some("Failed to send email via SMTP: stub error")
        );
    }

    #[tokio::test]
    async fn test_injected_transport_still_skips_when_unconfigured() {
        let transport = AsyncStubTransport::new_ok();
        let channel = EmailChannel::with_transport(&Config::default_for_test(), transport.clone());

        assert!(channel.deliver("hello").await.is_skipped());
        assert!(transport.messages().await.is_empty());
    }
}
