//! Client error taxonomy.
//!
//! Every fallible client operation returns [`ApiError`]. The variants follow the
//! categories the UI cares about:
//!
//! - **Validation**: malformed input caught before a request is made
//! - **Status**: the backend answered with a non-success status (4xx / 5xx)
//! - **Network / Timeout**: the request never got an answer
//! - **Decode**: the backend answered with something we could not parse
//!
//! [`ApiError::user_message`] converts any error into the human-readable text
//! that view state stores and displays. The mapping is a presentation concern;
//! callers that need to branch should use [`ApiError::kind`] instead.

use serde_json::Value;
use validator::ValidationErrors;

/// Maximum number of characters of a raw (non-JSON) error body kept as detail.
const MAX_RAW_DETAIL_LEN: usize = 200;

/// Coarse classification of an [`ApiError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Input rejected locally before any request was sent.
    Validation,
    /// 400 Bad Request.
    BadRequest,
    /// 401 Unauthorized: the session token is missing, invalid or expired.
    Unauthorized,
    /// 403 Forbidden.
    Forbidden,
    /// 404 Not Found.
    NotFound,
    /// 409 Conflict.
    Conflict,
    /// Any other 4xx status.
    Request,
    /// 5xx statuses.
    Server,
    /// Network failure or timeout.
    Connectivity,
    /// The response body could not be decoded.
    Decode,
    /// The client refused to proceed (e.g. an expired invitation).
    InvalidState,
}

/// Error type for every client operation.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("Request failed with status {status}: {detail}")]
    Status { status: u16, detail: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("{0}")]
    InvalidState(String),
}

impl ApiError {
    /// Builds a status error from a response status code and its raw body.
    ///
    /// Django REST framework bodies are understood: `{"detail": "..."}`,
    /// `{"error": "..."}`, `{"message": "..."}` and field error maps such as
    /// `{"email": ["Enter a valid email address."]}`.
    pub fn from_response(status: u16, body: &str) -> Self {
        Self::Status {
            status,
            detail: extract_detail(body),
        }
    }

    pub fn network<E: std::fmt::Display>(err: E) -> Self {
        Self::Network(err.to_string())
    }

    pub fn decode<E: std::fmt::Display>(err: E) -> Self {
        Self::Decode(err.to_string())
    }

    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }

    /// Returns the HTTP status code, if the backend answered.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::Status { status, .. } => match status {
                400 => ErrorKind::BadRequest,
                401 => ErrorKind::Unauthorized,
                403 => ErrorKind::Forbidden,
                404 => ErrorKind::NotFound,
                409 => ErrorKind::Conflict,
                500..=599 => ErrorKind::Server,
                _ => ErrorKind::Request,
            },
            Self::Network(_) | Self::Timeout => ErrorKind::Connectivity,
            Self::Decode(_) => ErrorKind::Decode,
            Self::InvalidState(_) => ErrorKind::InvalidState,
        }
    }

    /// Whether retrying the same request later could plausibly succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self.kind(), ErrorKind::Server | ErrorKind::Connectivity)
    }

    /// Human-readable message suitable for a toast or inline banner.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(errors) => {
                let mut fields: Vec<String> = errors
                    .field_errors()
                    .keys()
                    .map(|field| field.to_string())
                    .collect();
                fields.sort();
                format!("Please check the following fields: {}", fields.join(", "))
            }
            Self::Status { status, detail } => match status {
                400 if !detail.is_empty() => format!("Invalid request: {detail}"),
                400 => "The request was invalid. Please check your input.".to_string(),
                401 => "Your session has expired. Please sign in again.".to_string(),
                403 => "You do not have permission to perform this action.".to_string(),
                404 => "The requested item could not be found.".to_string(),
                409 if !detail.is_empty() => format!("Conflict: {detail}"),
                409 => "This change conflicts with the current state. Please refresh and try again."
                    .to_string(),
                500..=599 => "The server encountered an error. Please try again later.".to_string(),
                _ if !detail.is_empty() => detail.clone(),
                other => format!("Request failed with status {other}."),
            },
            Self::Network(_) | Self::Timeout => {
                "Unable to reach the server. Check your connection and try again.".to_string()
            }
            Self::Decode(_) => "Received an unexpected response from the server.".to_string(),
            Self::InvalidState(msg) => msg.clone(),
        }
    }
}

fn extract_detail(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::Object(map)) => {
            for key in ["detail", "error", "message"] {
                if let Some(Value::String(s)) = map.get(key) {
                    return s.clone();
                }
            }

            let mut parts: Vec<String> = map
                .iter()
                .filter_map(|(field, value)| {
                    let messages = flatten_messages(value);
                    if messages.is_empty() {
                        None
                    } else if field == "non_field_errors" {
                        Some(messages.join(" "))
                    } else {
                        Some(format!("{field}: {}", messages.join(" ")))
                    }
                })
                .collect();
            parts.sort();
            parts.join("; ")
        }
        Ok(Value::Array(items)) => flatten_messages(&Value::Array(items)).join(" "),
        Ok(Value::String(s)) => s,
        _ => trimmed.chars().take(MAX_RAW_DETAIL_LEN).collect(),
    }
}

fn flatten_messages(value: &Value) -> Vec<String> {
    match value {
        Value::String(s) => vec![s.clone()],
        Value::Array(items) => items.iter().flat_map(flatten_messages).collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::ValidationError;

    #[test]
    fn test_status_kind_mapping() {
        let cases = vec![
            (400, ErrorKind::BadRequest),
            (401, ErrorKind::Unauthorized),
            (403, ErrorKind::Forbidden),
            (404, ErrorKind::NotFound),
            (409, ErrorKind::Conflict),
            (422, ErrorKind::Request),
            (500, ErrorKind::Server),
            (503, ErrorKind::Server),
        ];

        for (status, expected) in cases {
            assert_eq!(ApiError::from_response(status, "").kind(), expected);
        }
    }

    #[test]
    fn test_user_message_for_session_expiry() {
        let error = ApiError::from_response(401, r#"{"detail":"Invalid token."}"#);
        assert_eq!(
            error.user_message(),
            "Your session has expired. Please sign in again."
        );
    }

    #[test]
    fn test_user_message_for_server_error_hides_detail() {
        let error = ApiError::from_response(502, "<html>Bad gateway</html>");
        assert_eq!(
            error.user_message(),
            "The server encountered an error. Please try again later."
        );
        assert!(error.is_retryable());
    }

    #[test]
    fn test_user_message_for_network_error() {
        let error = ApiError::network("connection refused");
        assert_eq!(error.kind(), ErrorKind::Connectivity);
        assert!(error.user_message().contains("Unable to reach the server"));
        assert!(error.is_retryable());
    }

    #[test]
    fn test_detail_from_drf_detail_field() {
        let error = ApiError::from_response(404, r#"{"detail":"Not found."}"#);
        match error {
            ApiError::Status { detail, .. } => assert_eq!(detail, "Not found."),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_detail_from_field_errors() {
        let body = r#"{"email":["Enter a valid email address."],"non_field_errors":["Invitation expired."]}"#;
        let error = ApiError::from_response(400, body);
        assert_eq!(
            error.user_message(),
            "Invalid request: Invitation expired.; email: Enter a valid email address."
        );
    }

    #[test]
    fn test_detail_from_plain_text_is_truncated() {
        let body = "x".repeat(500);
        match ApiError::from_response(418, &body) {
            ApiError::Status { detail, .. } => assert_eq!(detail.len(), MAX_RAW_DETAIL_LEN),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_conflict_without_detail() {
        let error = ApiError::from_response(409, "");
        assert!(error.user_message().contains("conflicts"));
        assert!(!error.is_retryable());
    }

    #[test]
    fn test_validation_message_lists_fields() {
        let mut errors = ValidationErrors::new();
        errors.add("password", ValidationError::new("length"));
        errors.add("email", ValidationError::new("email"));
        let error = ApiError::from(errors);

        assert_eq!(error.kind(), ErrorKind::Validation);
        assert_eq!(
            error.user_message(),
            "Please check the following fields: email, password"
        );
    }

    #[test]
    fn test_invalid_state_message_passthrough() {
        let error = ApiError::invalid_state("This invitation has expired.");
        assert_eq!(error.kind(), ErrorKind::InvalidState);
        assert_eq!(error.user_message(), "This invitation has expired.");
        assert_eq!(error.status(), None);
    }
}
