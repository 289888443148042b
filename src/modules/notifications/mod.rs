//! In-app notifications.

pub mod service;
pub mod state;
pub mod unread;

pub use service::NotificationService;
pub use state::NotificationsState;
pub use unread::UnreadCounter;
