//! # TutorLink
//!
//! Client SDK for the TutorLink tutoring marketplace backend.
//!
//! ## Overview
//!
//! - **REST services**: typed, stateless services for auth, invitations,
//!   tasks, payments, scheduling, notifications, receipts, analytics,
//!   students and teachers, all sharing one [`ApiClient`]
//! - **Realtime**: reconnecting WebSocket streams feeding the admin payment
//!   dashboard and a parent's purchase-approval inbox
//! - **View state**: list, wizard and dashboard state that turns failures
//!   into messages instead of propagating them
//!
//! ## Architecture
//!
//! ```text
//! src/
//! ├── api/            # ApiClient: auth header, JSON, error mapping, metrics
//! ├── modules/        # Feature modules
//! │   ├── auth/           # Sign-in, sign-out, current user
//! │   ├── invitations/    # Teacher invitations + acceptance wizard
//! │   ├── tasks/
//! │   ├── payments/       # Service, live monitor, approval inbox
//! │   ├── scheduler/
//! │   ├── notifications/  # Service, list state, unread poller
//! │   ├── receipts/
//! │   ├── analytics/
//! │   ├── students/
//! │   ├── teachers/       # Service, directory, profile wizard
//! │   └── dashboard/
//! └── utils/          # List state, wizard plumbing, tracing helpers
//! ```
//!
//! Each feature module follows the same layout:
//!
//! - `mod.rs`: Module exports
//! - `service.rs`: Stateless REST calls taking `&ApiClient`
//! - `state.rs` / `wizard.rs`: View state built on the service
//!
//! ## Quick Start
//!
//! ```ignore
//! use tutorlink::{ApiClient, TokenStore};
//! use tutorlink::modules::auth::AuthService;
//! use tutorlink_config::{ApiConfig, StorageConfig};
//! use tutorlink_models::auth::LoginRequest;
//!
//! let tokens = TokenStore::from_config(&StorageConfig::from_env());
//! tokens.restore().await?;
//! let api = ApiClient::new(&ApiConfig::from_env(), tokens)?;
//!
//! let session = AuthService::login(&api, LoginRequest {
//!     email: "admin@example.com".into(),
//!     password: "secret".into(),
//! }).await?;
//! ```
//!
//! ## Modules
//!
//! - [`api`]: The shared HTTP client
//! - [`modules`]: Feature modules (services, state, wizards)
//! - [`utils`]: Shared utilities
//! - [`validator`]: Validation helpers

pub mod api;
pub mod modules;
pub mod utils;
pub mod validator;

pub use api::ApiClient;
pub use tutorlink_auth::TokenStore;
pub use tutorlink_core::{ApiError, BatchSummary, PageQuery, Paginated};

// Re-export workspace crates for convenience
pub use tutorlink_auth;
pub use tutorlink_config;
pub use tutorlink_core;
pub use tutorlink_models;
pub use tutorlink_observability;
pub use tutorlink_realtime;
