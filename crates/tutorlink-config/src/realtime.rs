//! Realtime (WebSocket) configuration.
//!
//! # Environment Variables
//!
//! - `WS_BASE_URL`: Base URL for event streams (default: `ws://localhost:8000`)
//! - `DEBUG`: Enables verbose stream logging (default: `false`)
//! - `WS_PING_INTERVAL_SECS`: Keep-alive ping period while open (default: `30`)
//! - `WS_RECONNECT_BASE_MS`: First reconnect delay (default: `1000`)
//! - `WS_RECONNECT_MULTIPLIER`: Backoff multiplier (default: `2.0`)
//! - `WS_RECONNECT_MAX_MS`: Ceiling for a single reconnect delay (default: `30000`)
//! - `WS_RECONNECT_MAX_ATTEMPTS`: Reconnects before giving up (default: `5`)

use std::env;
use std::time::Duration;

use url::Url;

use crate::{parse_flag, parse_var};

const DEFAULT_WS_BASE_URL: &str = "ws://localhost:8000";

/// Exponential backoff settings for stream reconnection.
#[derive(Clone, Debug, PartialEq)]
pub struct ReconnectConfig {
    /// Delay before the first reconnect attempt, in milliseconds.
    pub base_interval_ms: u64,
    /// Factor applied to the delay after each consecutive failure.
    pub multiplier: f64,
    /// Upper bound for any single delay, in milliseconds.
    pub max_interval_ms: u64,
    /// Number of reconnects scheduled before the stream is abandoned.
    pub max_attempts: u32,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            base_interval_ms: 1000,
            multiplier: 2.0,
            max_interval_ms: 30_000,
            max_attempts: 5,
        }
    }
}

impl ReconnectConfig {
    pub fn from_lookup<F>(lookup: &F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            base_interval_ms: parse_var(lookup, "WS_RECONNECT_BASE_MS")
                .filter(|ms: &u64| *ms > 0)
                .unwrap_or(defaults.base_interval_ms),
            multiplier: parse_var(lookup, "WS_RECONNECT_MULTIPLIER")
                .filter(|m: &f64| m.is_finite() && *m >= 1.0)
                .unwrap_or(defaults.multiplier),
            max_interval_ms: parse_var(lookup, "WS_RECONNECT_MAX_MS")
                .filter(|ms: &u64| *ms > 0)
                .unwrap_or(defaults.max_interval_ms),
            max_attempts: parse_var(lookup, "WS_RECONNECT_MAX_ATTEMPTS")
                .unwrap_or(defaults.max_attempts),
        }
    }

    pub fn base_interval(&self) -> Duration {
        Duration::from_millis(self.base_interval_ms)
    }

    pub fn max_interval(&self) -> Duration {
        Duration::from_millis(self.max_interval_ms)
    }
}

/// Event-stream configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct RealtimeConfig {
    pub ws_base_url: Url,
    pub debug: bool,
    pub ping_interval_secs: u64,
    pub reconnect: ReconnectConfig,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            ws_base_url: default_ws_base_url(),
            debug: false,
            ping_interval_secs: 30,
            reconnect: ReconnectConfig::default(),
        }
    }
}

impl RealtimeConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            ws_base_url: lookup("WS_BASE_URL")
                .and_then(|v| Url::parse(v.trim()).ok())
                .filter(|url| matches!(url.scheme(), "ws" | "wss"))
                .unwrap_or_else(default_ws_base_url),
            debug: parse_flag(&lookup, "DEBUG").unwrap_or(false),
            ping_interval_secs: parse_var(&lookup, "WS_PING_INTERVAL_SECS")
                .filter(|secs: &u64| *secs > 0)
                .unwrap_or(30),
            reconnect: ReconnectConfig::from_lookup(&lookup),
        }
    }

    pub fn ping_interval(&self) -> Duration {
        Duration::from_secs(self.ping_interval_secs)
    }

    /// Builds the URL of a feature stream, authenticated with `token` as a
    /// query parameter.
    ///
    /// `path` is appended to the base URL verbatim, so a base of
    /// `wss://host/backend` and a path of `/ws/admin/payments/` yields
    /// `wss://host/backend/ws/admin/payments/?token=...`.
    pub fn endpoint(&self, path: &str, token: Option<&str>) -> Result<Url, url::ParseError> {
        let joined = format!(
            "{}/{}",
            self.ws_base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        let mut url = Url::parse(&joined)?;
        if let Some(token) = token {
            url.query_pairs_mut().append_pair("token", token);
        }
        Ok(url)
    }
}

fn default_ws_base_url() -> Url {
    Url::parse(DEFAULT_WS_BASE_URL).expect("default WebSocket URL is valid")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::vars;

    #[test]
    fn test_default_reconnect_config() {
        let config = ReconnectConfig::default();
        assert_eq!(config.base_interval(), Duration::from_millis(1000));
        assert_eq!(config.max_interval(), Duration::from_secs(30));
        assert_eq!(config.multiplier, 2.0);
        assert_eq!(config.max_attempts, 5);
    }

    #[test]
    fn test_from_lookup_reads_all_values() {
        let config = RealtimeConfig::from_lookup(vars(&[
            ("WS_BASE_URL", "wss://rt.tutorlink.app"),
            ("DEBUG", "true"),
            ("WS_PING_INTERVAL_SECS", "10"),
            ("WS_RECONNECT_BASE_MS", "500"),
            ("WS_RECONNECT_MULTIPLIER", "1.5"),
            ("WS_RECONNECT_MAX_MS", "8000"),
            ("WS_RECONNECT_MAX_ATTEMPTS", "3"),
        ]));

        assert_eq!(config.ws_base_url.as_str(), "wss://rt.tutorlink.app/");
        assert!(config.debug);
        assert_eq!(config.ping_interval(), Duration::from_secs(10));
        assert_eq!(config.reconnect.base_interval_ms, 500);
        assert_eq!(config.reconnect.multiplier, 1.5);
        assert_eq!(config.reconnect.max_interval_ms, 8000);
        assert_eq!(config.reconnect.max_attempts, 3);
    }

    #[test]
    fn test_rejects_non_websocket_scheme_and_bad_multiplier() {
        let config = RealtimeConfig::from_lookup(vars(&[
            ("WS_BASE_URL", "http://localhost:8000"),
            ("WS_RECONNECT_MULTIPLIER", "0.5"),
            ("DEBUG", "nope"),
        ]));
        assert_eq!(config.ws_base_url.as_str(), "ws://localhost:8000/");
        assert_eq!(config.reconnect.multiplier, 2.0);
        assert!(!config.debug);
    }

    #[test]
    fn test_endpoint_appends_path_and_token() {
        let config = RealtimeConfig::default();
        let url = config.endpoint("/ws/admin/payments/", Some("abc123")).unwrap();
        assert_eq!(url.as_str(), "ws://localhost:8000/ws/admin/payments/?token=abc123");
    }

    #[test]
    fn test_endpoint_keeps_base_path_prefix() {
        let config = RealtimeConfig::from_lookup(vars(&[("WS_BASE_URL", "wss://host/backend/")]));
        let url = config.endpoint("ws/parent/7/approvals/", None).unwrap();
        assert_eq!(url.as_str(), "wss://host/backend/ws/parent/7/approvals/");
    }
}
