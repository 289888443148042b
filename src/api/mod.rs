//! REST access.
//!
//! [`ApiClient`] is the only type in the SDK that talks HTTP. Feature
//! services in [`crate::modules`] are thin typed wrappers around it.

pub mod client;

pub use client::ApiClient;
