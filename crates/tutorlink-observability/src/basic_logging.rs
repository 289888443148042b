use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Default log level: `debug` when `debug` is set, else `LOG_LEVEL` or `info`.
pub(crate) fn default_level(debug: bool) -> String {
    if debug {
        return "debug".to_string();
    }
    std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string())
}

/// Filter directives with noisy dependencies held at warn.
pub(crate) fn filter_directives(level: &str) -> String {
    format!(
        "tutorlink={level},tutorlink_realtime={level},tutorlink_auth={level},\
         reqwest=warn,hyper=warn,hyper_util=warn,tungstenite=warn,tokio_tungstenite=warn"
    )
}

/// `RUST_LOG` wins when set; otherwise the computed directives.
pub(crate) fn env_filter(debug: bool) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directives(&default_level(debug))))
}

/// Initialize console-only logging.
///
/// Used when the `observability` feature is compiled out or disabled at
/// runtime with `OBSERVABILITY_ENABLED=false`.
///
/// # Configuration
///
/// - **Log Level**: `RUST_LOG`, else `LOG_LEVEL` (default: "info"), forced to
///   "debug" when `debug` is true
/// - **Format**: Compact with module targets and ANSI colors
pub fn init_basic_console_logging(debug: bool) {
    let console_layer = fmt::layer()
        .compact()
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_file(debug)
        .with_line_number(debug)
        .with_writer(std::io::stderr)
        .with_filter(env_filter(debug));

    // A second init (tests, embedding apps) keeps the existing subscriber.
    let _ = tracing_subscriber::registry().with(console_layer).try_init();
}
