pub mod state;

pub use state::{DashboardState, Section};
