pub mod aggregate;

pub use aggregate::ExecutionLease;
