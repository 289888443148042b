//! Payments: REST access plus the two live views built on event streams.
//!
//! - [`PaymentService`]: metrics, transactions, refunds, purchase approvals
//! - [`PaymentMonitor`]: admin dashboard fed by `/ws/admin/payments/`
//! - [`ApprovalInbox`]: a parent's pending purchase approvals, fed by
//!   `/ws/parent/{id}/approvals/`

pub mod approvals;
pub mod monitor;
pub mod service;

pub use approvals::ApprovalInbox;
pub use monitor::{PaymentMonitor, PaymentSnapshot};
pub use service::PaymentService;
