//! Order intake domain module.
//!
//! Order records, their two-state lifecycle, and the rules for who must be
//! named on an order request. Pure logic; persistence lives in the infra crate.

pub mod order;
pub mod requester;

pub use order::{OrderRecord, OrderStatus};
pub use requester::{OrderChannel, RequesterField, RequesterInfo, RequesterPolicies, RequesterPolicy};
