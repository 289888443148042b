//! Teacher directory and profile editing.

pub mod service;
pub mod state;
pub mod wizard;

pub use service::TeacherService;
pub use state::TeachersState;
pub use wizard::{ProfileStep, TeacherProfileWizard};
