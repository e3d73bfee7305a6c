use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Unauthorized. Please log in.")]
    Unauthenticated,

    #[error("Session expired. Please log in again.")]
    SessionExpired,

    #[error("Stored token cannot be sent in a request header")]
    InvalidToken,

    #[error("{0}")]
    Unauthorized(String),

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Rate limited - please wait before retrying")]
    RateLimited,

    #[error("{0}")]
    Rejected(String),

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

/// FastAPI-style error body: `{"detail": "..."}` or a list of validation errors
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: serde_json::Value,
}

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    /// Pull the human-readable message out of an error body.
    /// Falls back to the raw (truncated) body when there is no `detail`.
    fn detail_message(body: &str) -> String {
        let detail = match serde_json::from_str::<ErrorBody>(body) {
            Ok(parsed) => parsed.detail,
            Err(_) => return Self::truncate_body(body.trim()),
        };
        let message = match detail {
            serde_json::Value::String(s) => s,
            // Validation errors: [{"loc": [...], "msg": "...", ...}, ...]
            serde_json::Value::Array(items) => items
                .iter()
                .filter_map(|item| item.get("msg").and_then(|m| m.as_str()))
                .collect::<Vec<_>>()
                .join("; "),
            other => other.to_string(),
        };
        Self::truncate_body(&message)
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let message = Self::detail_message(body);
        match status.as_u16() {
            401 => ApiError::Unauthorized(message),
            403 => ApiError::AccessDenied(message),
            404 => ApiError::NotFound(message),
            429 => ApiError::RateLimited,
            500..=599 => ApiError::ServerError(message),
            400..=499 if message.is_empty() => ApiError::Rejected(
                status
                    .canonical_reason()
                    .unwrap_or("Request rejected")
                    .to_string(),
            ),
            400..=499 => ApiError::Rejected(message),
            _ => ApiError::InvalidResponse(format!("Status {}: {}", status, message)),
        }
    }

    /// True for errors that mean the user must (re)authenticate
    pub fn requires_login(&self) -> bool {
        matches!(self, ApiError::Unauthenticated | ApiError::SessionExpired)
    }

    /// True when the server refused the presented credentials
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, ApiError::Unauthorized(_))
    }

    /// True when the request timed out before a response arrived
    pub fn is_timeout(&self) -> bool {
        matches!(self, ApiError::Network(e) if e.is_timeout())
    }
}
