//! TutorLink Observability Module
//!
//! Provides configurable observability features including:
//! - Console and rolling JSON-file logging via `tracing`
//! - Metric counters via the `metrics` facade
//!
//! This module can be enabled or disabled at compile time via the `observability` feature flag.
//! At runtime, observability can be further controlled via the `OBSERVABILITY_ENABLED` environment variable.
//!
//! # Features
//!
//! - `observability` (default): Enables file logging and metrics. Without it,
//!   logging is console-only and the tracking functions are no-ops.
//!
//! # Examples
//!
//! ```no_run
//! use tutorlink_observability::init_tracing;
//!
//! fn main() -> anyhow::Result<()> {
//!     init_tracing(false)?;
//!     // ... application code ...
//!     Ok(())
//! }
//! ```

pub mod basic_logging;
#[cfg(feature = "observability")]
pub mod logging;
#[cfg(feature = "observability")]
pub mod metrics;

pub use basic_logging::init_basic_console_logging;

#[cfg(feature = "observability")]
pub use crate::logging::{init_tracing, is_observability_enabled};
#[cfg(feature = "observability")]
pub use crate::metrics::{
    track_api_error, track_api_request, track_poll_failure, track_reconnect_scheduled,
    track_stream_connected, track_stream_message,
};

// No-op stubs when observability is disabled
#[cfg(not(feature = "observability"))]
pub mod stubs {
    use std::time::Duration;

    /// No-op observability check when feature disabled
    pub fn is_observability_enabled() -> bool {
        false
    }

    /// Console-only logging when feature disabled
    pub fn init_tracing(debug: bool) -> anyhow::Result<()> {
        super::init_basic_console_logging(debug);
        Ok(())
    }

    // No-op tracking functions
    pub fn track_api_request(_method: &str, _path: &str, _status: u16, _latency: Duration) {}
    pub fn track_api_error(_kind: &str) {}
    pub fn track_stream_connected(_endpoint: &str) {}
    pub fn track_reconnect_scheduled(_endpoint: &str, _attempt: u32) {}
    pub fn track_stream_message(_kind: &str) {}
    pub fn track_poll_failure(_name: &str) {}
}

#[cfg(not(feature = "observability"))]
pub use stubs::*;
