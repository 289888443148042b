use std::env;
use std::path::PathBuf;

const DEFAULT_TOKEN_STORE_PATH: &str = ".tutorlink/session.json";

/// Where the auth token is persisted between runs.
///
/// # Environment Variables
///
/// - `TOKEN_STORE_PATH`: JSON file holding the session (default: `.tutorlink/session.json`)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StorageConfig {
    pub token_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            token_path: PathBuf::from(DEFAULT_TOKEN_STORE_PATH),
        }
    }
}

impl StorageConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            token_path: lookup("TOKEN_STORE_PATH")
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_TOKEN_STORE_PATH)),
        }
    }
}
