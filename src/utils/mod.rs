//! Shared utilities used by the feature modules:
//!
//! - [`list_state`]: Paginated list state with stored, user-facing errors
//! - [`tracing`]: HTTP client spans, audit events and route templating
//! - [`wizard`]: Step ordering and errors for multi-step forms

pub mod list_state;
pub mod tracing;
pub mod wizard;
