pub mod analytics;
pub mod auth;
pub mod dashboard;
pub mod invitations;
pub mod notifications;
pub mod payments;
pub mod receipts;
pub mod scheduler;
pub mod students;
pub mod tasks;
pub mod teachers;

pub use self::auth::AuthService;
pub use self::dashboard::DashboardState;
pub use self::notifications::{NotificationService, UnreadCounter};
pub use self::payments::{ApprovalInbox, PaymentMonitor, PaymentService};
