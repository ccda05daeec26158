//! Request-level error responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

/// Errors that end a lead request before delivery.
#[derive(Error, Debug)]
pub enum LeadError {
    #[error("Required field: {0}")]
    MissingField(&'static str),
    #[error("Method not allowed. Use POST.")]
    MethodNotAllowed,
    #[error("Request body too large")]
    PayloadTooLarge,
    #[error("Failed to read request body")]
    UnreadableBody(String),
    #[error("Server error")]
    Internal(String),
}

/// JSON body for error responses.
#[derive(Serialize)]
struct ErrorBody {
    ok: bool,
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl LeadError {
    const fn status(&self) -> StatusCode {
        match self {
            Self::MissingField(_) => StatusCode::BAD_REQUEST,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::UnreadableBody(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for LeadError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error = self.to_string();
        let details = match self {
            Self::Internal(details) | Self::UnreadableBody(details) => Some(details),
            _ => None,
        };
        (
            status,
            Json(ErrorBody {
                ok: false,
                error,
                details,
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            LeadError::MissingField("phone").into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            LeadError::MethodNotAllowed.into_response().status(),
            StatusCode::METHOD_NOT_ALLOWED
        );
        assert_eq!(
            LeadError::PayloadTooLarge.into_response().status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            LeadError::UnreadableBody("eof".into()).into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            LeadError::Internal("boom".into()).into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            LeadError::MissingField("phone").to_string(),
            "Required field: phone"
        );
        assert_eq!(
            LeadError::MethodNotAllowed.to_string(),
            "Method not allowed. Use POST."
        );
    }
}
