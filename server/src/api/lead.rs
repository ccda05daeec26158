//! Lead submission endpoint.
//!
//! One handler serves every method on the lead route: OPTIONS acknowledges,
//! GET answers a health probe, POST runs the intake and delivery flow.

use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde::Serialize;
use tracing::{info, instrument, warn};

use super::error::LeadError;
use super::AppState;
use crate::channels::DeliveryOutcome;
use crate::delivery::Verdict;
use crate::lead::{format_message, parse_body, BodyEncoding, Lead};

/// Headers that may declare a base64 transport encoding.
const ENCODING_HEADERS: [&str; 2] = ["content-transfer-encoding", "x-body-encoding"];

/// Response to a processed lead.
#[derive(Debug, Serialize)]
pub struct LeadResponse {
    pub ok: bool,
    pub telegram: DeliveryOutcome,
    pub email: DeliveryOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Base64 if any encoding header says so, whatever the others declare.
fn body_encoding(headers: &HeaderMap) -> BodyEncoding {
    let base64 = ENCODING_HEADERS.iter().any(|name| {
        headers
            .get_all(*name)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .any(|v| BodyEncoding::from_header(Some(v)) == BodyEncoding::Base64)
    });
    if base64 {
        BodyEncoding::Base64
    } else {
        BodyEncoding::Identity
    }
}

fn body_error(rejection: BytesRejection) -> LeadError {
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        LeadError::PayloadTooLarge
    } else {
        LeadError::UnreadableBody(rejection.body_text())
    }
}

/// ANY /lead
#[instrument(skip_all, fields(method = %method))]
pub async fn submit(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<Response, LeadError> {
    if method == Method::OPTIONS {
        return Ok(Json(serde_json::json!({ "ok": true })).into_response());
    }
    if method == Method::GET {
        return Ok(Json(serde_json::json!({
            "ok": true,
            "time": Utc::now().to_rfc3339(),
        }))
        .into_response());
    }
    if method != Method::POST {
        return Err(LeadError::MethodNotAllowed);
    }

    let body = body.map_err(|rejection| {
        warn!(error = %rejection, "Could not read lead request body");
        body_error(rejection)
    })?;
    let submission = parse_body(
        &body,
        header_str(&headers, CONTENT_TYPE.as_str()),
        body_encoding(&headers),
    );
    let lead = Lead::from_submission(&submission);

    if lead.phone.is_none() {
        info!("Rejected lead without phone number");
        return Err(LeadError::MissingField("phone"));
    }

    let text = format_message(&lead, Utc::now(), state.config.timezone);
    let report = state.dispatcher.dispatch(&text).await;
    let verdict = report.verdict(state.config.success_policy);

    let (status, error) = match verdict {
        Verdict::Success => (StatusCode::OK, None),
        Verdict::Unconfigured => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Some("No delivery channel is configured".to_string()),
        ),
        Verdict::Failure => (StatusCode::BAD_GATEWAY, report.error_summary()),
    };

    if verdict == Verdict::Success {
        info!(policy = %state.config.success_policy, "Lead delivered");
    } else {
        warn!(
            policy = %state.config.success_policy,
            status = status.as_u16(),
            error = error.as_deref().unwrap_or_default(),
            "Lead delivery did not satisfy policy"
        );
    }

    let body = LeadResponse {
        ok: verdict == Verdict::Success,
        telegram: report.telegram,
        email: report.email,
        error,
    };
    Ok((status, Json(body)).into_response())
}
