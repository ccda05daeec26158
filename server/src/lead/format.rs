//! Lead message formatting.
//!
//! [`format_message`] is a pure function of the lead, the clock reading and
//! the reporting time zone, so identical inputs always produce identical text.

use std::fmt;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use url::Url;

use super::submission::Lead;

/// Shown in place of any absent value.
pub const PLACEHOLDER: &str = "-";

/// Preferred-time markers that flag a lead as urgent.
const URGENT_MARKERS: [&str; 6] = [
    "asap",
    "as soon as possible",
    "now",
    "immediately",
    "urgent",
    "emergency",
];

/// Lead urgency derived from the preferred time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    High,
    Normal,
}

impl Priority {
    pub fn from_preferred_time(preferred: Option<&str>) -> Self {
        let Some(value) = preferred else {
            return Self::Normal;
        };
        let value = value.trim().to_lowercase();
        if value.starts_with("asap") || URGENT_MARKERS.contains(&value.as_str()) {
            Self::High
        } else {
            Self::Normal
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::High => f.write_str("High"),
            Self::Normal => f.write_str("Normal"),
        }
    }
}

fn or_placeholder(value: Option<&String>) -> &str {
    value.map_or(PLACEHOLDER, String::as_str)
}

/// Render a checkbox-style flag as Yes/No, passing unknown text through.
fn flag(value: Option<&String>) -> &str {
    let Some(raw) = value else {
        return PLACEHOLDER;
    };
    match raw.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" | "checked" => "Yes",
        "false" | "0" | "no" | "off" => "No",
        _ => raw,
    }
}

/// Host of the page URL without a leading `www.`, if the URL parses.
pub fn page_domain(page_url: Option<&str>) -> Option<String> {
    let url = Url::parse(page_url?).ok()?;
    let host = url.host_str()?;
    Some(host.strip_prefix("www.").unwrap_or(host).to_string())
}

/// Build the human-readable lead report.
pub fn format_message(lead: &Lead, now: DateTime<Utc>, tz: Tz) -> String {
    let priority = Priority::from_preferred_time(lead.preferred_time.as_deref());
    let domain = page_domain(lead.page_url.as_deref());
    let utm = &lead.attribution;
    let local = now.with_timezone(&tz);

    let lines = [
        "🔥 NEW LEAD".to_string(),
        format!("Priority: {priority}"),
        String::new(),
        format!("Name: {}", or_placeholder(lead.name.as_ref())),
        format!("Phone: {}", or_placeholder(lead.phone.as_ref())),
        format!("Email: {}", or_placeholder(lead.email.as_ref())),
        format!("Address: {}", or_placeholder(lead.address.as_ref())),
        format!("ZIP: {}", or_placeholder(lead.zip.as_ref())),
        String::new(),
        format!("Appliance: {}", or_placeholder(lead.appliance.as_ref())),
        "Issue:".to_string(),
        or_placeholder(lead.issue.as_ref()).to_string(),
        format!(
            "Preferred time: {}",
            or_placeholder(lead.preferred_time.as_ref())
        ),
        String::new(),
        format!("SMS consent: {}", flag(lead.consent.as_ref())),
        format!("Fee acknowledged: {}", flag(lead.fee_ack.as_ref())),
        String::new(),
        format!("Page: {}", or_placeholder(lead.page_url.as_ref())),
        format!("Domain: {}", or_placeholder(domain.as_ref())),
        String::new(),
        "UTM:".to_string(),
        format!(
            "{} / {} / {}",
            or_placeholder(utm.source.as_ref()),
            or_placeholder(utm.medium.as_ref()),
            or_placeholder(utm.campaign.as_ref())
        ),
        format!("content: {}", or_placeholder(utm.content.as_ref())),
        format!("term: {}", or_placeholder(utm.term.as_ref())),
        format!("gclid: {}", or_placeholder(utm.gclid.as_ref())),
        String::new(),
        format!("Local: {}", local.format("%Y-%m-%d %H:%M %Z")),
        format!("UTC: {}", now.format("%Y-%m-%d %H:%M")),
    ];

    lines.join("\n")
}
