//! # TutorLink Config
//!
//! Configuration types for the TutorLink client.
//!
//! This crate provides configuration structures loaded from environment variables:
//!
//! - [`api`]: REST API base URL and request timeout
//! - [`realtime`]: WebSocket base URL, debug flag, keep-alive and reconnect policy
//! - [`poll`]: Polling interval and failure backoff
//! - [`storage`]: Where the auth token is persisted
//!
//! Every struct exposes `from_env()` plus a `from_lookup()` variant that takes
//! the variable source as a closure, which keeps tests free of process-global
//! environment mutation.
//!
//! # Example
//!
//! ```ignore
//! use tutorlink_config::{ApiConfig, PollConfig, RealtimeConfig, StorageConfig};
//!
//! // Load all configs from environment
//! let api_config = ApiConfig::from_env();
//! let realtime_config = RealtimeConfig::from_env();
//! let poll_config = PollConfig::from_env();
//! let storage_config = StorageConfig::from_env();
//! ```

pub mod api;
pub mod poll;
pub mod realtime;
pub mod storage;

// Re-export commonly used types at crate root
pub use api::ApiConfig;
pub use poll::PollConfig;
pub use realtime::{RealtimeConfig, ReconnectConfig};
pub use storage::StorageConfig;

/// Parses `key` from `lookup`, returning `None` when unset or unparseable.
pub(crate) fn parse_var<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    lookup(key).and_then(|v| v.trim().parse().ok())
}

/// Interprets common truthy spellings (`1`, `true`, `yes`, `on`).
pub(crate) fn parse_flag<F>(lookup: &F, key: &str) -> Option<bool>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
}
