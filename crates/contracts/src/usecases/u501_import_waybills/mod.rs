pub mod events;
pub mod response;

pub use events::WaybillsImportedEvent;
pub use response::{ImportResult, RejectedRow, WarningRow};
