//! Metric counters.
//!
//! Recorded through the `metrics` facade. Without an installed recorder every
//! call is a no-op, so library code records unconditionally.

use metrics::{counter, histogram};
use std::time::Duration;

use crate::logging::is_observability_enabled;

/// Count a completed REST request and record its latency.
pub fn track_api_request(method: &str, path: &str, status: u16, latency: Duration) {
    if !is_observability_enabled() {
        return;
    }
    let status_category = match status {
        200..=299 => "2xx",
        400..=499 => "4xx",
        500..=599 => "5xx",
        _ => "other",
    };
    counter!(
        "api_requests_total",
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status_category" => status_category
    )
    .increment(1);
    histogram!("api_request_duration_seconds", "method" => method.to_string())
        .record(latency.as_secs_f64());
}

/// Count a request that failed before or after reaching the server.
pub fn track_api_error(kind: &str) {
    if !is_observability_enabled() {
        return;
    }
    counter!("api_errors_total", "kind" => kind.to_string()).increment(1);
}

pub fn track_stream_connected(endpoint: &str) {
    if !is_observability_enabled() {
        return;
    }
    counter!("stream_connections_total", "endpoint" => endpoint.to_string()).increment(1);
}

pub fn track_reconnect_scheduled(endpoint: &str, attempt: u32) {
    if !is_observability_enabled() {
        return;
    }
    counter!("stream_reconnects_total", "endpoint" => endpoint.to_string()).increment(1);
    histogram!("stream_reconnect_attempt", "endpoint" => endpoint.to_string())
        .record(f64::from(attempt));
}

pub fn track_stream_message(kind: &str) {
    if !is_observability_enabled() {
        return;
    }
    counter!("stream_messages_total", "type" => kind.to_string()).increment(1);
}

pub fn track_poll_failure(name: &str) {
    if !is_observability_enabled() {
        return;
    }
    counter!("poll_failures_total", "poller" => name.to_string()).increment(1);
}
