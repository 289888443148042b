use std::env;
use std::time::Duration;

use url::Url;

use crate::parse_var;

const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api";
const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// REST API configuration.
///
/// # Environment Variables
///
/// - `API_BASE_URL`: Base URL all REST paths are appended to (default: `http://localhost:8000/api`)
/// - `API_TIMEOUT_SECS`: Per-request timeout in seconds (default: `15`)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiConfig {
    pub base_url: Url,
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl ApiConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Loads configuration from an arbitrary variable source.
    ///
    /// An unparseable `API_BASE_URL` falls back to the default.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            base_url: lookup("API_BASE_URL")
                .and_then(|v| Url::parse(v.trim()).ok())
                .unwrap_or_else(default_base_url),
            timeout_secs: parse_var(&lookup, "API_TIMEOUT_SECS")
                .filter(|secs: &u64| *secs > 0)
                .unwrap_or(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Builds a config pointing at `base_url` with default settings.
    pub fn with_base_url(base_url: Url) -> Self {
        Self {
            base_url,
            ..Self::default()
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_base_url() -> Url {
    Url::parse(DEFAULT_API_BASE_URL).expect("default API URL is valid")
}
