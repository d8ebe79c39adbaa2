//! HTTP error mapping.
//!
//! Every caller-facing failure gets a distinct, non-overlapping status
//! code: validation 400, missing session 422, peer unreachable 502,
//! deadline expiry 504, refused ambiguous delivery 409, everything else
//! 500.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use picrelay_core::error::{BridgeError, RelayError};
use serde::Serialize;
use thiserror::Error;

/// Axum-facing error type.
#[derive(Debug, Error)]
pub enum HttpError {
    /// Invalid prompt text.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// No session identifier accompanied the request.
    #[error("Missing session identifier")]
    MissingSession,

    /// The relay peer was unreachable.
    #[error("Relay failed: {0}")]
    BadGateway(String),

    /// Relay or correlation deadline expired.
    #[error("Timed out: {0}")]
    GatewayTimeout(String),

    /// Untagged artifact refused while multiple requests were pending.
    #[error("Ambiguous delivery: {0}")]
    Conflict(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
    status: u16,
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::MissingSession => StatusCode::UNPROCESSABLE_ENTITY,
            Self::BadGateway(_) => StatusCode::BAD_GATEWAY,
            Self::GatewayTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = ErrorBody {
            error: self.to_string(),
            status: status.as_u16(),
        };
        (status, axum::Json(body)).into_response()
    }
}

impl From<BridgeError> for HttpError {
    fn from(err: BridgeError) -> Self {
        match err {
            BridgeError::MissingSession => Self::MissingSession,
            BridgeError::Relay(relay) => relay.into(),
            BridgeError::IngestFailed(msg) => Self::Internal(format!("ingest failed: {msg}")),
            BridgeError::Timeout { seconds } => {
                Self::GatewayTimeout(format!("no artifact within {seconds}s"))
            }
            BridgeError::AmbiguousDelivery => {
                Self::Conflict("ambiguous artifact delivery refused".to_string())
            }
        }
    }
}

impl From<RelayError> for HttpError {
    fn from(err: RelayError) -> Self {
        match err {
            RelayError::InvalidPrompt(msg) => Self::BadRequest(msg),
            RelayError::Connection(msg) => Self::BadGateway(msg),
            RelayError::Timeout { seconds } => {
                Self::GatewayTimeout(format!("relay timed out after {seconds}s"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_are_distinct_per_failure_class() {
        let cases: Vec<(HttpError, StatusCode)> = vec![
            (
                HttpError::from(BridgeError::Relay(RelayError::InvalidPrompt("x".into()))),
                StatusCode::BAD_REQUEST,
            ),
            (
                HttpError::from(BridgeError::MissingSession),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                HttpError::from(BridgeError::Relay(RelayError::Connection("x".into()))),
                StatusCode::BAD_GATEWAY,
            ),
            (
                HttpError::from(BridgeError::Timeout { seconds: 1 }),
                StatusCode::GATEWAY_TIMEOUT,
            ),
            (
                HttpError::from(BridgeError::AmbiguousDelivery),
                StatusCode::CONFLICT,
            ),
            (
                HttpError::from(BridgeError::IngestFailed("x".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (error, expected) in cases {
            assert_eq!(error.into_response().status(), expected);
        }
    }
}
