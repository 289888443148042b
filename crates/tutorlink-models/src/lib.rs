//! # TutorLink Models
//!
//! Domain models and DTOs mirrored from the backend's JSON.
//!
//! This crate contains all the data structures exchanged with the backend:
//!
//! - [`ids`]: Strongly-typed integer ID newtypes
//! - [`auth`]: Sign-in request/response and the current user
//! - [`invitations`]: Teacher invitations and the accept DTO
//! - [`tasks`]: Teacher/admin task items
//! - [`payments`]: Metrics, transactions, refunds, purchase approvals
//! - [`scheduler`]: Class sessions and availability slots
//! - [`notifications`]: In-app notifications and unread counts
//! - [`receipts`]: Payment receipts
//! - [`analytics`]: Dashboard summaries and student progress
//! - [`students`]: Student records
//! - [`teachers`]: Teacher profiles
//! - [`realtime`]: Event-stream payloads
//!
//! # Example
//!
//! ```ignore
//! use tutorlink_models::invitations::CreateInvitationDto;
//! use validator::Validate;
//!
//! let dto = CreateInvitationDto {
//!     email: "teacher@example.com".to_string(),
//!     first_name: "Ada".to_string(),
//!     last_name: "Lovelace".to_string(),
//!     message: None,
//! };
//! dto.validate()?;
//! ```

pub mod analytics;
pub mod auth;
pub mod ids;
pub mod invitations;
pub mod notifications;
pub mod payments;
pub mod realtime;
pub mod receipts;
pub mod scheduler;
pub mod students;
pub mod tasks;
pub mod teachers;

pub use ids::*;
pub use realtime::RealtimeEvent;
