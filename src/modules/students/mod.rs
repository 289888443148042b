pub mod service;
pub mod state;

pub use service::StudentService;
pub use state::StudentsState;
