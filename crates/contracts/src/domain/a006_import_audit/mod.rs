pub mod aggregate;

pub use aggregate::{ImportAudit, ImportAuditDto};
