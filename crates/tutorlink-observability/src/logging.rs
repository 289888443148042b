use anyhow::Context;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::info;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::basic_logging::{env_filter, init_basic_console_logging};

static OBSERVABILITY_ENABLED: OnceLock<bool> = OnceLock::new();

const DEFAULT_LOG_DIR: &str = ".tutorlink/logs";

/// Check if observability is enabled via OBSERVABILITY_ENABLED env var
pub fn is_observability_enabled() -> bool {
    *OBSERVABILITY_ENABLED.get_or_init(|| {
        std::env::var("OBSERVABILITY_ENABLED")
            .map(|v| v.to_lowercase() != "false" && v != "0")
            .unwrap_or(true)
    })
}

/// Directory for the rolling JSON log, from `LOG_DIR`.
pub fn log_dir() -> PathBuf {
    std::env::var("LOG_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_LOG_DIR))
}

/// Initialize tracing: compact console output plus a daily-rolling JSON file.
///
/// Falls back to console-only logging when observability is disabled at
/// runtime. Returns an error if the log directory cannot be created.
pub fn init_tracing(debug: bool) -> anyhow::Result<()> {
    if !is_observability_enabled() {
        init_basic_console_logging(debug);
        return Ok(());
    }
    init_tracing_in(&log_dir(), debug)
}

pub(crate) fn init_tracing_in(dir: &Path, debug: bool) -> anyhow::Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create log directory {}", dir.display()))?;

    let console_layer = fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_file(debug)
        .with_line_number(debug)
        .with_writer(std::io::stderr)
        .compact()
        .with_filter(env_filter(debug));

    // JSON file layer for structured logs
    let json_appender = RollingFileAppender::new(Rotation::DAILY, dir, "tutorlink.json");

    let json_layer = fmt::layer()
        .json()
        .with_writer(json_appender)
        .with_current_span(true)
        .with_span_list(true)
        .with_filter(EnvFilter::new(if debug { "debug" } else { "info" }));

    if tracing_subscriber::registry()
        .with(console_layer)
        .with(json_layer)
        .try_init()
        .is_ok()
    {
        info!(log_dir = %dir.display(), "Tracing initialized with file logging");
    }
    Ok(())
}
