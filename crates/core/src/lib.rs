//! `everglow-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod error;
pub mod id;
pub mod revision;

pub use error::{DomainError, DomainResult};
pub use id::{OrderId, ProductCode};
pub use revision::ExpectedRevision;
