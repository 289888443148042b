use std::sync::{Arc, RwLock};

use tracing::{debug, info};
use tutorlink_config::StorageConfig;

use crate::store::{FileStore, KeyValueStore, MemoryStore, TokenStoreError};

/// Key under which the auth token is persisted.
pub const AUTH_TOKEN_KEY: &str = "auth_token";

/// Owner of the persisted auth token.
///
/// Cloning is cheap and every clone shares the same cached token, so the API
/// client and the realtime streams always agree on the current session.
#[derive(Clone)]
pub struct TokenStore {
    backend: Arc<dyn KeyValueStore>,
    cached: Arc<RwLock<Option<String>>>,
}

impl std::fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenStore")
            .field("has_token", &self.token().is_some())
            .finish_non_exhaustive()
    }
}

impl TokenStore {
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self {
            backend,
            cached: Arc::new(RwLock::new(None)),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    pub fn from_config(config: &StorageConfig) -> Self {
        Self::new(Arc::new(FileStore::new(config.token_path.clone())))
    }

    /// Loads the persisted token into memory. Call once at startup.
    pub async fn restore(&self) -> Result<Option<String>, TokenStoreError> {
        let token = self
            .backend
            .get(AUTH_TOKEN_KEY)
            .await?
            .filter(|t| !t.is_empty());
        debug!(restored = token.is_some(), "Auth token restored");
        *self.write_cache() = token.clone();
        Ok(token)
    }

    /// The current token, if signed in.
    pub fn token(&self) -> Option<String> {
        self.cached
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }

    /// Value for the `Authorization` header (`Token <key>`).
    pub fn authorization_header(&self) -> Option<String> {
        self.token().map(|t| format!("Token {t}"))
    }

    pub async fn set_token(&self, token: &str) -> Result<(), TokenStoreError> {
        self.backend.set(AUTH_TOKEN_KEY, token).await?;
        *self.write_cache() = Some(token.to_string());
        info!("Auth token stored");
        Ok(())
    }

    /// Forgets the token in memory and in storage.
    ///
    /// The in-memory copy is dropped first so that a storage failure still
    /// signs the user out of this process.
    pub async fn clear(&self) -> Result<(), TokenStoreError> {
        *self.write_cache() = None;
        self.backend.remove(AUTH_TOKEN_KEY).await?;
        info!("Auth token cleared");
        Ok(())
    }

    fn write_cache(&self) -> std::sync::RwLockWriteGuard<'_, Option<String>> {
        self.cached.write().unwrap_or_else(|e| e.into_inner())
    }
}
