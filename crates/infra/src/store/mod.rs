//! External table store boundary.
//!
//! The spreadsheet service is the system of record. This module defines the
//! two collaborator calls the rest of the crate relies on (read a whole table,
//! conditionally overwrite a whole table) plus two backends: an in-memory one
//! for tests/dev and a JSON-file one for a single-machine deployment.

pub mod in_memory;
pub mod json_file;
pub mod r#trait;

pub use in_memory::InMemoryTableStore;
pub use json_file::JsonFileTableStore;
pub use r#trait::{Row, StoreError, TableName, TableSnapshot, TableStore};
