//! Lead Delivery
//!
//! Fans the formatted lead out to the Telegram and email channels at the same
//! time and waits for both to settle. A slow, failing or panicking channel
//! never prevents the other channel's outcome from being reported.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::channels::{Channel, DeliveryOutcome};

/// Rule that turns per-channel outcomes into one success flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SuccessPolicy {
    /// Every channel must deliver. A skipped channel counts as not delivered.
    #[default]
    All,
    /// At least one channel must deliver.
    Any,
}

impl FromStr for SuccessPolicy {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "any" => Ok(Self::Any),
            _ => Err(()),
        }
    }
}

impl fmt::Display for SuccessPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Any => f.write_str("any"),
        }
    }
}

/// Aggregated verdict over both channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// The success policy is satisfied.
    Success,
    /// Neither channel is configured.
    Unconfigured,
    /// At least one attempted delivery failed the policy.
    Failure,
}

/// Outcomes of one fan-out.
#[derive(Debug, Clone, PartialEq)]
pub struct DeliveryReport {
    pub telegram: DeliveryOutcome,
    pub email: DeliveryOutcome,
}

impl DeliveryReport {
    pub fn verdict(&self, policy: SuccessPolicy) -> Verdict {
        let outcomes = [&self.telegram, &self.email];
        if outcomes.iter().all(|o| o.is_skipped()) {
            return Verdict::Unconfigured;
        }
        let satisfied = match policy {
            SuccessPolicy::All => outcomes.iter().all(|o| o.is_delivered()),
            SuccessPolicy::Any => outcomes.iter().any(|o| o.is_delivered()),
        };
        if satisfied {
            Verdict::Success
        } else {
            Verdict::Failure
        }
    }

    /// Joined reasons of every channel that did not deliver.
    pub fn error_summary(&self) -> Option<String> {
        let parts: Vec<String> = [("Telegram", &self.telegram), ("Email", &self.email)]
            .into_iter()
            .filter_map(|(label, outcome)| outcome.reason().map(|r| format!("{label}: {r}")))
            .collect();
        (!parts.is_empty()).then(|| parts.join("; "))
    }
}

/// Delivers lead text to both channels.
#[derive(Clone)]
pub struct Dispatcher {
    telegram: Arc<dyn Channel>,
    email: Arc<dyn Channel>,
}

impl Dispatcher {
    pub fn new(telegram: Arc<dyn Channel>, email: Arc<dyn Channel>) -> Self {
        Self { telegram, email }
    }

    /// Run both channels concurrently and wait for both results.
    pub async fn dispatch(&self, text: &str) -> DeliveryReport {
        let text: Arc<str> = Arc::from(text);

        let telegram = spawn_delivery(self.telegram.clone(), text.clone());
        let email = spawn_delivery(self.email.clone(), text);

        let (telegram, email) = tokio::join!(
            settle(self.telegram.name(), telegram),
            settle(self.email.name(), email)
        );

        info!(
            telegram = telegram.label(),
            email = email.label(),
            "Lead delivery settled"
        );

        DeliveryReport { telegram, email }
    }
}

fn spawn_delivery(channel: Arc<dyn Channel>, text: Arc<str>) -> JoinHandle<DeliveryOutcome> {
    tokio::spawn(async move { channel.deliver(&text).await })
}

/// Await a delivery task, turning a panic into a failed outcome.
async fn settle(name: &'static str, handle: JoinHandle<DeliveryOutcome>) -> DeliveryOutcome {
    match handle.await {
        Ok(outcome) => outcome,
        Err(e) => {
            error!(channel = name, "Delivery task panicked: {}", e);
            DeliveryOutcome::failed(format!("{name} delivery task aborted unexpectedly"))
        }
    }
}
