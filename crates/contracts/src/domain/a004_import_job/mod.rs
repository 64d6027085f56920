pub mod aggregate;

pub use aggregate::{ImportJob, ImportJobDto, ImportJobStatus};
