pub mod service;
pub mod state;

pub use service::ReceiptService;
pub use state::ReceiptsState;
