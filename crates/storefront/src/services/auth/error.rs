//! Authentication error types.

use serde_json::Value;
use thiserror::Error;

use crate::api::ApiError;
use crate::session::StoreError;

/// Shown when nothing more specific can be extracted from a failure.
pub const FALLBACK_MESSAGE: &str = "Something went wrong. Please try again.";

/// Errors that can occur during authentication operations.
///
/// Every variant except `Storage` carries one user-facing message, decided
/// once where the failure is first seen.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The backend could not be reached or answered with an error status.
    #[error("{message}")]
    Network { message: String },

    /// Input was rejected before anything was sent.
    #[error("{message}")]
    Validation { message: String },

    /// The backend answered but refused, or the caller is not logged in.
    #[error("{message}")]
    Auth { message: String },

    /// The browser session store failed.
    #[error("session store error: {0}")]
    Storage(#[from] StoreError),
}

impl AuthError {
    pub(crate) fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub(crate) fn auth(message: impl Into<String>) -> Self {
        Self::Auth {
            message: message.into(),
        }
    }

    /// The message to show the user. Storage failures are not described.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Network { message } | Self::Validation { message } | Self::Auth { message } => {
                message
            }
            Self::Storage(_) => FALLBACK_MESSAGE,
        }
    }
}

impl From<ApiError> for AuthError {
    fn from(err: ApiError) -> Self {
        normalize_error(err)
    }
}

/// Turn a backend client failure into a tagged, user-facing error.
///
/// The message is taken from the response body's `error.message` or
/// `message`, then `error.errorDetails` or `errorDetails`, then the
/// transport error itself, then [`FALLBACK_MESSAGE`]. Refusals (401/403)
/// become `Auth`; everything else the backend or transport does wrong is
/// `Network`.
#[must_use]
pub fn normalize_error(err: ApiError) -> AuthError {
    let from_body = err.body().and_then(extract_message);

    match err {
        ApiError::Store(e) => AuthError::Storage(e),
        ApiError::Unauthorized { .. } => AuthError::auth(
            from_body.unwrap_or_else(|| "Invalid credentials. Please try again.".to_string()),
        ),
        ApiError::Status { status, .. } if status == reqwest::StatusCode::FORBIDDEN => {
            AuthError::auth(from_body.unwrap_or_else(|| {
                "You do not have permission to do that.".to_string()
            }))
        }
        ApiError::Status { .. } | ApiError::Http(_) => {
            let message = from_body.unwrap_or_else(|| err.to_string());
            AuthError::network(if message.trim().is_empty() {
                FALLBACK_MESSAGE.to_string()
            } else {
                message
            })
        }
        ApiError::Parse(_) | ApiError::Url(_) => {
            tracing::error!(error = %err, "Unexpected backend client failure");
            AuthError::network(FALLBACK_MESSAGE)
        }
    }
}

/// Pull the most specific message out of a backend error body.
#[must_use]
pub fn extract_message(body: &Value) -> Option<String> {
    let error = body.get("error");

    error
        .and_then(|e| e.get("message"))
        .and_then(text)
        .or_else(|| body.get("message").and_then(text))
        .or_else(|| error.and_then(|e| e.get("errorDetails")).and_then(text))
        .or_else(|| body.get("errorDetails").and_then(text))
}

/// A non-blank string, or a list of them joined with `; `.
fn text(value: &Value) -> Option<String> {
    let joined = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("; "),
        _ => return None,
    };
    (!joined.is_empty()).then_some(joined)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use reqwest::StatusCode;
    use serde_json::json;

    use super::*;

    fn status(code: StatusCode, body: Value) -> ApiError {
        ApiError::Status {
            status: code,
            body: Some(body),
        }
    }

    #[test]
    fn test_nested_error_message_wins() {
        let body = json!({
            "message": "outer",
            "error": { "message": "inner", "errorDetails": "details" }
        });
        assert_eq!(extract_message(&body).as_deref(), Some("inner"));
    }

    #[test]
    fn test_message_before_error_details() {
        let body = json!({ "message": "outer", "errorDetails": "details" });
        assert_eq!(extract_message(&body).as_deref(), Some("outer"));
    }

    #[test]
    fn test_error_details_list_is_joined() {
        let body = json!({ "error": { "errorDetails": ["Email taken", " ", "Username taken"] } });
        assert_eq!(
            extract_message(&body).as_deref(),
            Some("Email taken; Username taken")
        );
    }

    #[test]
    fn test_blank_messages_are_skipped() {
        let body = json!({ "message": "  ", "errorDetails": "Use a longer password" });
        assert_eq!(
            extract_message(&body).as_deref(),
            Some("Use a longer password")
        );
        assert_eq!(extract_message(&json!({ "status": 500 })), None);
    }

    #[test]
    fn test_unauthorized_is_auth_error() {
        let err = normalize_error(ApiError::Unauthorized {
            body: Some(json!({ "message": "Bad credentials" })),
        });
        assert!(matches!(err, AuthError::Auth { .. }));
        assert_eq!(err.message(), "Bad credentials");
    }

    #[test]
    fn test_forbidden_is_auth_error() {
        let err = normalize_error(status(StatusCode::FORBIDDEN, json!({})));
        assert!(matches!(err, AuthError::Auth { .. }));
    }

    #[test]
    fn test_server_error_uses_body_then_status() {
        let err = normalize_error(status(
            StatusCode::CONFLICT,
            json!({ "message": "Username already exists" }),
        ));
        assert!(matches!(err, AuthError::Network { .. }));
        assert_eq!(err.message(), "Username already exists");

        let err = normalize_error(ApiError::Status {
            status: StatusCode::BAD_GATEWAY,
            body: None,
        });
        assert_eq!(err.message(), "HTTP 502 Bad Gateway");
    }

    #[test]
    fn test_parse_failure_uses_fallback() {
        let parse = serde_json::from_str::<Value>("{").unwrap_err();
        let err = normalize_error(ApiError::Parse(parse));
        assert_eq!(err.message(), FALLBACK_MESSAGE);
    }
}
