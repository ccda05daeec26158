//! Request body normalisation.
//!
//! Malformed input never fails the request: any decode or parse error yields
//! an empty [`Submission`], which later surfaces as missing fields.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use tracing::debug;

use super::submission::Submission;

/// Transport encoding applied to the raw body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BodyEncoding {
    #[default]
    Identity,
    Base64,
}

impl BodyEncoding {
    /// Derive the encoding from a header value such as `base64`.
    pub fn from_header(value: Option<&str>) -> Self {
        match value {
            Some(v) if v.trim().eq_ignore_ascii_case("base64") => Self::Base64,
            _ => Self::Identity,
        }
    }
}

/// Decode the transport encoding. Invalid base64 or non-UTF-8 data becomes "".
fn decode(raw: &[u8], encoding: BodyEncoding) -> String {
    let bytes = match encoding {
        BodyEncoding::Identity => raw.to_vec(),
        BodyEncoding::Base64 => {
            let trimmed: Vec<u8> = raw
                .iter()
                .copied()
                .filter(|b| !b.is_ascii_whitespace())
                .collect();
            match STANDARD.decode(trimmed) {
                Ok(bytes) => bytes,
                Err(e) => {
                    debug!(error = %e, "Discarding body with invalid base64");
                    return String::new();
                }
            }
        }
    };
    String::from_utf8(bytes).unwrap_or_default()
}

fn parse_json(text: &str) -> Submission {
    if text.trim().is_empty() {
        return Submission::default();
    }
    match serde_json::from_str::<serde_json::Value>(text) {
        Ok(value) => Submission::from_json(&value),
        Err(e) => {
            debug!(error = %e, "Discarding body that is not valid JSON");
            Submission::default()
        }
    }
}

fn parse_form(text: &str) -> Submission {
    url::form_urlencoded::parse(text.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

/// Parse a raw request body into a submission.
///
/// The content type selects the parser: JSON, URL-encoded form, or a
/// best-effort JSON attempt for anything else.
pub fn parse_body(raw: &[u8], content_type: Option<&str>, encoding: BodyEncoding) -> Submission {
    let text = decode(raw, encoding);
    let content_type = content_type.unwrap_or_default().to_ascii_lowercase();

    if content_type.contains("application/json") {
        parse_json(&text)
    } else if content_type.contains("application/x-www-form-urlencoded") {
        parse_form(&text)
    } else {
        parse_json(&text)
    }
}
