pub mod service;
pub mod state;

pub use service::AnalyticsService;
pub use state::AnalyticsState;
