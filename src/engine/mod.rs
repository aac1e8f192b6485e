//! Transaction-aware execution on top of the storage layer: open databases,
//! run statements, and the single-table transaction protocol.

pub mod database;
pub mod manager;

pub use database::Database;
pub use manager::{ExecutionResult, Manager};
