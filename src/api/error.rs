//! Error taxonomy for provider API calls
//!
//! Every failure a [`crate::api::ProviderClient`] call can produce maps onto
//! one of three kinds: a rejected credential, a transport failure, or any
//! other non-2xx response carrying the provider's own message when one is
//! present.

use std::error::Error;
use std::fmt;

use reqwest::StatusCode;

#[derive(Debug)]
pub enum ApiError {
    /// The provider rejected the credential (HTTP 401/403). User-correctable.
    Auth { status: StatusCode },

    /// The request never completed at the transport level. Transient.
    Network(reqwest::Error),

    /// Any other non-2xx response, with the provider's message when the body
    /// carried one, else a status-derived message.
    Provider { status: StatusCode, message: String },
}

impl ApiError {
    /// Classify a non-2xx response from its status and body.
    pub(crate) fn from_failure(status: StatusCode, body: &str) -> Self {
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return ApiError::Auth { status };
        }
        let message = extract_error_summary(body)
            .unwrap_or_else(|| format!("API request failed with status {status}"));
        ApiError::Provider { status, message }
    }

    pub fn is_auth(&self) -> bool {
        matches!(self, ApiError::Auth { .. })
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Auth { status } => {
                write!(f, "invalid API key (provider returned {status})")
            }
            ApiError::Network(source) => {
                write!(f, "network error: {source} (check your connection and retry)")
            }
            ApiError::Provider { message, .. } => write!(f, "{message}"),
        }
    }
}

impl Error for ApiError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ApiError::Network(source) => Some(source),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Network(err)
    }
}

/// Pull a human-readable summary out of a provider error body.
///
/// Providers wrap failures in a few envelope shapes: `{"error": {"message":
/// ...}}`, `{"error": "..."}`, or a bare `{"message": ...}`. Whitespace is
/// collapsed so multi-line messages fit a single status line.
pub(crate) fn extract_error_summary(body: &str) -> Option<String> {
    let value = serde_json::from_str::<serde_json::Value>(body.trim()).ok()?;

    let summary = value
        .pointer("/error/message")
        .and_then(|v| v.as_str())
        .map(str::to_owned)
        .or_else(|| {
            value.get("error").and_then(|v| match v {
                serde_json::Value::String(s) => Some(s.to_string()),
                _ => None,
            })
        })
        .or_else(|| {
            value
                .get("message")
                .and_then(|v| v.as_str().map(str::to_owned))
        })?;

    let collapsed = summary.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        None
    } else {
        Some(collapsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthorized_and_forbidden_classify_as_auth() {
        assert!(ApiError::from_failure(StatusCode::UNAUTHORIZED, "").is_auth());
        assert!(ApiError::from_failure(StatusCode::FORBIDDEN, "{}").is_auth());
    }

    #[test]
    fn provider_message_is_surfaced_verbatim() {
        let err = ApiError::from_failure(
            StatusCode::TOO_MANY_REQUESTS,
            r#"{"error":{"message":"model overloaded","type":"rate_limit"}}"#,
        );
        match err {
            ApiError::Provider { status, message } => {
                assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
                assert_eq!(message, "model overloaded");
            }
            other => panic!("expected provider error, got {other:?}"),
        }
    }

    #[test]
    fn missing_message_falls_back_to_status() {
        let err = ApiError::from_failure(StatusCode::NOT_FOUND, "<html>gone</html>");
        match err {
            ApiError::Provider { message, .. } => {
                assert_eq!(message, "API request failed with status 404 Not Found");
            }
            other => panic!("expected provider error, got {other:?}"),
        }
    }

    #[test]
    fn extract_error_summary_handles_envelope_shapes() {
        assert_eq!(
            extract_error_summary(r#"{"error":{"message":"bad request"}}"#),
            Some("bad request".to_string())
        );
        assert_eq!(
            extract_error_summary(r#"{"error":"quota exceeded"}"#),
            Some("quota exceeded".to_string())
        );
        assert_eq!(
            extract_error_summary(r#"{"message":"try later"}"#),
            Some("try later".to_string())
        );
        assert_eq!(extract_error_summary(r#"{"status":"failed"}"#), None);
        assert_eq!(extract_error_summary("not json"), None);
    }

    #[test]
    fn extract_error_summary_collapses_whitespace() {
        assert_eq!(
            extract_error_summary("{\"message\":\"line one\\n   line two\"}"),
            Some("line one line two".to_string())
        );
    }
}
