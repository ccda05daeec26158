//! Lead submission data.
//!
//! A [`Submission`] is the untyped key/value mapping posted by the form.
//! A [`Lead`] is the same data resolved against the accepted aliases of every
//! logical field.

use std::collections::BTreeMap;

use serde_json::Value;

/// Raw form submission: string keys to string values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Submission(BTreeMap<String, String>);

impl Submission {
    /// Build a submission from a JSON document.
    ///
    /// Only objects carry fields; any other document yields an empty submission.
    /// Values are coerced to text and `null` entries are dropped.
    pub fn from_json(value: &Value) -> Self {
        let Value::Object(map) = value else {
            return Self::default();
        };
        map.iter()
            .filter_map(|(key, value)| coerce(value).map(|v| (key.clone(), v)))
            .collect()
    }

    /// Raw value for a key, if present.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// First non-blank value among `aliases`, trimmed.
    pub fn first_of(&self, aliases: &[&str]) -> Option<String> {
        aliases
            .iter()
            .filter_map(|key| self.get(key))
            .map(str::trim)
            .find(|v| !v.is_empty())
            .map(str::to_string)
    }
}

impl FromIterator<(String, String)> for Submission {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

fn coerce(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(_) | Value::Object(_) => Some(value.to_string()),
    }
}

/// Logical lead fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Name,
    Phone,
    Email,
    Address,
    Zip,
    Appliance,
    Issue,
    PreferredTime,
    Consent,
    FeeAck,
    PageUrl,
    UtmSource,
    UtmMedium,
    UtmCampaign,
    UtmContent,
    UtmTerm,
    Gclid,
}

impl Field {
    /// Accepted input keys, highest priority first.
    pub const fn aliases(self) -> &'static [&'static str] {
        match self {
            Self::Name => &["name", "full_name", "customer_name"],
            Self::Phone => &["phone", "phone_number", "tel"],
            Self::Email => &["email", "email_address"],
            Self::Address => &["address", "street_address", "street"],
            Self::Zip => &["zip", "zip_code", "zipcode", "postal_code"],
            Self::Appliance => &["appliance", "appliance_type", "device"],
            Self::Issue => &["issue", "problem", "message", "description"],
            Self::PreferredTime => &["preferred_time", "preferredTime", "time"],
            Self::Consent => &["consent", "sms_consent", "agree"],
            Self::FeeAck => &["fee_ack", "fee_acknowledged", "service_fee_ack"],
            Self::PageUrl => &["page_url", "pageUrl", "url"],
            Self::UtmSource => &["utm_source"],
            Self::UtmMedium => &["utm_medium"],
            Self::UtmCampaign => &["utm_campaign"],
            Self::UtmContent => &["utm_content"],
            Self::UtmTerm => &["utm_term"],
            Self::Gclid => &["gclid"],
        }
    }
}

/// Marketing attribution carried over from the landing page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attribution {
    pub source: Option<String>,
    pub medium: Option<String>,
    pub campaign: Option<String>,
    pub content: Option<String>,
    pub term: Option<String>,
    pub gclid: Option<String>,
}

/// A lead with every field resolved. Absent or blank fields are `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Lead {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub zip: Option<String>,
    pub appliance: Option<String>,
    pub issue: Option<String>,
    pub preferred_time: Option<String>,
    pub consent: Option<String>,
    pub fee_ack: Option<String>,
    pub page_url: Option<String>,
    pub attribution: Attribution,
}

impl Lead {
    pub fn from_submission(sub: &Submission) -> Self {
        let field = |f: Field| sub.first_of(f.aliases());
        Self {
            name: field(Field::Name),
            phone: field(Field::Phone),
            email: field(Field::Email),
            address: field(Field::Address),
            zip: field(Field::Zip),
            appliance: field(Field::Appliance),
            issue: field(Field::Issue),
            preferred_time: field(Field::PreferredTime),
            consent: field(Field::Consent),
            fee_ack: field(Field::FeeAck),
            page_url: field(Field::PageUrl),
            attribution: Attribution {
                source: field(Field::UtmSource),
                medium: field(Field::UtmMedium),
                campaign: field(Field::UtmCampaign),
                content: field(Field::UtmContent),
                term: field(Field::UtmTerm),
                gclid: field(Field::Gclid),
            },
        }
    }
}
