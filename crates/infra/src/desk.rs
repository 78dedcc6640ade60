//! One entry point bundling the catalog, order placement and order queue
//! over a shared store.

use std::sync::Arc;

use everglow_auth::Principal;
use everglow_core::OrderId;
use everglow_inventory::{InventoryItem, ItemUpdate, NewItem};
use everglow_orders::{OrderRecord, OrderStatus};

use crate::catalog::CatalogService;
use crate::config::DeskConfig;
use crate::error::ServiceError;
use crate::order_handler::{OrderRequest, OrderTransactionHandler};
use crate::order_queue::OrderQueue;
use crate::store::TableStore;

/// The operations the presentation layer calls, each taking the caller
/// explicitly.
pub struct OrderDesk<S = Arc<dyn TableStore>> {
    catalog: CatalogService<S>,
    handler: OrderTransactionHandler<S>,
    queue: OrderQueue<S>,
}

impl OrderDesk {
    /// Open the configured store backend and wire the services to it.
    pub fn open(config: &DeskConfig) -> Result<Self, ServiceError> {
        let store = config.open_store()?;
        Ok(Self::with_store(store, config))
    }
}

impl<S: TableStore + Clone> OrderDesk<S> {
    pub fn with_store(store: S, config: &DeskConfig) -> Self {
        Self {
            catalog: CatalogService::from_config(store.clone(), config),
            handler: OrderTransactionHandler::from_config(store.clone(), config),
            queue: OrderQueue::from_config(store, config),
        }
    }

    pub fn catalog(&self) -> &CatalogService<S> {
        &self.catalog
    }

    pub fn handler(&self) -> &OrderTransactionHandler<S> {
        &self.handler
    }

    pub fn queue(&self) -> &OrderQueue<S> {
        &self.queue
    }

    pub fn place_order(&self, caller: &Principal, request: OrderRequest) -> Result<OrderRecord, ServiceError> {
        self.handler.place_order(caller, request)
    }

    pub fn mark_dispatched(&self, caller: &Principal, order_id: OrderId) -> Result<OrderRecord, ServiceError> {
        self.queue.mark_dispatched(caller, order_id)
    }

    pub fn find_by_code(&self, caller: &Principal, code: &str) -> Result<InventoryItem, ServiceError> {
        self.catalog.find_by_code(caller, code)
    }

    pub fn list_all(&self, caller: &Principal) -> Result<Vec<InventoryItem>, ServiceError> {
        self.catalog.list_all(caller)
    }

    pub fn list_orders(
        &self,
        caller: &Principal,
        status: Option<OrderStatus>,
    ) -> Result<Vec<OrderRecord>, ServiceError> {
        self.queue.list_orders(caller, status)
    }

    pub fn add_item(&self, caller: &Principal, item: NewItem) -> Result<InventoryItem, ServiceError> {
        self.catalog.add_item(caller, item)
    }

    pub fn update_item(
        &self,
        caller: &Principal,
        code: &str,
        update: ItemUpdate,
    ) -> Result<InventoryItem, ServiceError> {
        self.catalog.update_item(caller, code, update)
    }
}
