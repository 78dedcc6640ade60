//! Inventory domain module.
//!
//! This crate contains business rules for the jewelry catalog, implemented
//! purely as deterministic domain logic (no IO, no storage).

pub mod catalog;
pub mod item;

pub use catalog::{find_by_code, position_of};
pub use item::{InventoryItem, ItemUpdate, NewItem};
