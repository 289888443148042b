//! Tracing utilities and helper macros for observability
//!
//! Spans and events emitted by the SDK follow a small set of conventions so
//! that console output and the JSON log file stay greppable: HTTP calls are
//! logged under `http.client`, user-visible mutations as audit events.

use tracing::Span;

/// Create a span for an outgoing REST call.
///
/// The path should already be templated with [`path_template`]; raw paths
/// can carry invitation tokens.
///
/// # Example
/// ```ignore
/// let span = http_request_span!("GET", "/students/{id}/");
/// ```
#[macro_export]
macro_rules! http_request_span {
    ($method:expr, $path:expr) => {
        tracing::info_span!(
            "http.client",
            http.method = $method,
            http.route = $path,
            http.status_code = tracing::field::Empty,
            otel.status_code = tracing::field::Empty,
            error.message = tracing::field::Empty
        )
    };
}

/// Log an audit event at INFO level
///
/// Use this for operations that change something on the backend on the
/// user's behalf: sign-in, refunds, approvals, profile updates.
#[macro_export]
macro_rules! audit_event {
    ($action:expr, $resource:expr) => {
        tracing::info!(audit.action = $action, audit.resource = $resource)
    };
    ($action:expr, $resource:expr, $($field:tt)*) => {
        tracing::info!(
            audit.action = $action,
            audit.resource = $resource,
            $($field)*
        )
    };
}

/// Record a failed operation on the current span with an error message
pub fn record_error(message: &str) {
    let span = Span::current();
    span.record("otel.status_code", "ERROR");
    span.record("error.message", message);
}

/// Record HTTP status code on the current span
pub fn record_http_status(status: u16) {
    let span = Span::current();
    span.record("http.status_code", status);
    if status >= 400 {
        span.record("otel.status_code", "ERROR");
    } else {
        span.record("otel.status_code", "OK");
    }
}

/// Replaces identifiers in a request path so it can be used as a log field
/// or metric label.
///
/// Numeric segments become `{id}`. Long segments mixing letters and digits
/// (invitation tokens) become `{token}`.
pub fn path_template(path: &str) -> String {
    let path = path.split('?').next().unwrap_or_default();
    path.split('/')
        .map(|segment| {
            if !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit()) {
                "{id}"
            } else if segment.len() >= 16 && segment.bytes().any(|b| b.is_ascii_digit()) {
                "{token}"
            } else {
                segment
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Trait extension for adding context to errors before logging
pub trait ErrorExt {
    /// Log the error and return it unchanged
    fn log_error(self, context: &str) -> Self;
}

impl<T, E: std::fmt::Display> ErrorExt for Result<T, E> {
    fn log_error(self, context: &str) -> Self {
        if let Err(ref e) = self {
            tracing::warn!(error = %e, context = context, "Operation failed");
        }
        self
    }
}
