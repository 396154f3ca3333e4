//! Failures reported by the ticket API.
//!
//! Every repository call fails with an [`ApiError`] carrying the HTTP status
//! (when there was a response) and the server's message. The board only
//! cares about one distinction: 401/403 means the role was insufficient,
//! everything else is a fetch failure.

use std::fmt;

use reqwest::StatusCode;
use serde::Deserialize;

use crate::error::BoardError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    /// HTTP status code, if a response was received
    pub status: Option<StatusCode>,
    /// Human-readable error message
    pub message: String,
}

impl ApiError {
    /// Failure without an HTTP response (transport, decoding)
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
        }
    }

    pub fn with_status(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            message: message.into(),
        }
    }

    /// Build from a non-success response body, preferring the server's own
    /// `error` or `message` field over the raw text.
    pub fn from_response_body(status: StatusCode, body: &str) -> Self {
        #[derive(Deserialize)]
        struct ErrorBody {
            error: Option<String>,
            message: Option<String>,
            msg: Option<String>,
        }

        let message = serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|b| b.error.or(b.message).or(b.msg))
            .unwrap_or_else(|| {
                let trimmed = body.trim();
                if trimmed.is_empty() {
                    status.canonical_reason().unwrap_or("unknown error").to_string()
                } else {
                    trimmed.to_string()
                }
            });

        Self::with_status(status, message)
    }

    pub fn is_authorization(&self) -> bool {
        matches!(
            self.status,
            Some(StatusCode::UNAUTHORIZED) | Some(StatusCode::FORBIDDEN)
        )
    }

    /// Server errors and transport failures may succeed on retry
    pub fn is_transient(&self) -> bool {
        match self.status {
            Some(status) => status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS,
            None => true,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "HTTP {}: {}", status.as_u16(), self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        Self {
            status: err.status(),
            message: err.to_string(),
        }
    }
}

impl From<ApiError> for BoardError {
    fn from(err: ApiError) -> Self {
        if err.is_authorization() {
            BoardError::Authorization(err.to_string())
        } else {
            BoardError::Fetch(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_401_and_403_classify_as_authorization() {
        for status in [StatusCode::UNAUTHORIZED, StatusCode::FORBIDDEN] {
            let err: BoardError = ApiError::with_status(status, "nope").into();
            assert_eq!(err.kind(), ErrorKind::Authorization);
        }
    }

    #[test]
    fn test_other_statuses_classify_as_fetch() {
        for status in [
            StatusCode::NOT_FOUND,
            StatusCode::BAD_REQUEST,
            StatusCode::INTERNAL_SERVER_ERROR,
        ] {
            let err: BoardError = ApiError::with_status(status, "x").into();
            assert_eq!(err.kind(), ErrorKind::Fetch);
        }
        let err: BoardError = ApiError::new("connection refused").into();
        assert_eq!(err.kind(), ErrorKind::Fetch);
    }

    #[test]
    fn test_body_message_extraction() {
        let err = ApiError::from_response_body(
            StatusCode::NOT_FOUND,
            r#"{"error": "Ticket not found"}"#,
        );
        assert_eq!(err.message, "Ticket not found");
        assert_eq!(err.to_string(), "HTTP 404: Ticket not found");

        let err = ApiError::from_response_body(StatusCode::UNAUTHORIZED, r#"{"msg": "Token has expired"}"#);
        assert_eq!(err.message, "Token has expired");

        let err = ApiError::from_response_body(StatusCode::BAD_GATEWAY, "");
        assert_eq!(err.message, "Bad Gateway");
    }

    #[test]
    fn test_rejected_credentials_are_authorization_errors() {
        let err: BoardError = ApiError::from_response_body(
            StatusCode::UNAUTHORIZED,
            r#"{"error": "Invalid credentials"}"#,
        )
        .into();
        assert_eq!(err.kind(), ErrorKind::Authorization);
        assert_eq!(err.to_string(), "not authorized: HTTP 401: Invalid credentials");
    }

    #[test]
    fn test_transient_detection() {
        assert!(ApiError::with_status(StatusCode::SERVICE_UNAVAILABLE, "").is_transient());
        assert!(ApiError::new("timed out").is_transient());
        assert!(!ApiError::with_status(StatusCode::FORBIDDEN, "").is_transient());
    }
}
