//! # TutorLink Core
//!
//! Core types, errors, and utilities for the TutorLink client.
//!
//! This crate provides foundational types used throughout the client:
//!
//! - [`errors`]: Client error taxonomy and status-to-message mapping
//! - [`pagination`]: The backend's `{count, next, previous, results}` envelope
//! - [`serde`]: Custom serde deserialization helpers for backend quirks
//! - [`settle`]: All-settled aggregation for batch operations
//!
//! # Example
//!
//! ```ignore
//! use tutorlink_core::errors::ApiError;
//! use tutorlink_core::pagination::{Paginated, PageQuery};
//!
//! // Map a failed response into a user-facing message
//! let error = ApiError::from_response(401, r#"{"detail":"Invalid token."}"#);
//! assert_eq!(error.user_message(), "Your session has expired. Please sign in again.");
//!
//! // Page-based query parameters
//! let query = PageQuery::default();
//! let page_size = query.page_size();
//! ```

pub mod errors;
pub mod pagination;
pub mod serde;
pub mod settle;

// Re-export commonly used types at crate root
pub use errors::{ApiError, ErrorKind};
pub use pagination::{PageQuery, Paginated};
pub use settle::{BatchSummary, settle_all};
