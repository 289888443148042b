//! # TutorLink Auth
//!
//! Auth token persistence for the TutorLink client.
//!
//! This crate provides:
//!
//! - [`store`]: An async key-value store abstraction with in-memory and
//!   JSON-file backends
//! - [`session`]: [`TokenStore`], the single owner of the persisted auth token
//!
//! Feature code only ever reads the token (to build `Authorization` headers or
//! WebSocket query strings). Writing happens in exactly two places: after a
//! successful login and on logout.
//!
//! # Example
//!
//! ```ignore
//! use tutorlink_auth::TokenStore;
//! use tutorlink_config::StorageConfig;
//!
//! let tokens = TokenStore::from_config(&StorageConfig::from_env());
//! tokens.restore().await?;
//!
//! if let Some(header) = tokens.authorization_header() {
//!     println!("Authorization: {header}");
//! }
//! ```

pub mod session;
pub mod store;

// Re-export commonly used types at crate root
pub use session::{AUTH_TOKEN_KEY, TokenStore};
pub use store::{FileStore, KeyValueStore, MemoryStore, TokenStoreError};
