//! Infrastructure layer: the external table store, row codecs, and the
//! catalog/order operations built on them.

pub mod catalog;
pub mod config;
pub mod desk;
pub mod error;
pub mod order_handler;
pub mod order_queue;
pub mod store;
pub mod tables;

mod retry;

#[cfg(test)]
mod integration_tests;

pub use catalog::CatalogService;
pub use config::{DeskConfig, StoreBackend};
pub use desk::OrderDesk;
pub use error::ServiceError;
pub use order_handler::{OrderRequest, OrderTransactionHandler};
pub use order_queue::OrderQueue;
pub use retry::RetryPolicy;
pub use store::{InMemoryTableStore, JsonFileTableStore, Row, StoreError, TableName, TableSnapshot, TableStore};
