//! Catalog queries and administrative edits over the Inventory table.

use tracing::info;

use everglow_auth::{Permission, Principal, authorize};
use everglow_core::{ExpectedRevision, ProductCode};
use everglow_inventory::{InventoryItem, ItemUpdate, NewItem, find_by_code, position_of};

use crate::config::DeskConfig;
use crate::error::ServiceError;
use crate::retry::{RetryPolicy, commit, write_with_retry};
use crate::store::{TableName, TableStore};
use crate::tables::inventory;

#[derive(Debug, Clone)]
pub struct CatalogService<S> {
    store: S,
    retry: RetryPolicy,
}

impl<S: TableStore> CatalogService<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            retry: RetryPolicy::default(),
        }
    }

    pub fn from_config(store: S, config: &DeskConfig) -> Self {
        Self {
            store,
            retry: config.retry_policy(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Exact, case-insensitive lookup. `"eg-r001"` finds `EG-R001`; `"EG-R"`
    /// finds nothing.
    pub fn find_by_code(&self, caller: &Principal, code: &str) -> Result<InventoryItem, ServiceError> {
        authorize(caller, &Permission::catalog_read())?;
        let code = ProductCode::parse(code)?;
        let table = inventory::decode(self.store.read_table(TableName::Inventory)?)?;
        find_by_code(table.records(), &code)
            .cloned()
            .ok_or_else(|| ServiceError::NotFound(format!("product code {code}")))
    }

    /// Every item, in the store's row order.
    pub fn list_all(&self, caller: &Principal) -> Result<Vec<InventoryItem>, ServiceError> {
        authorize(caller, &Permission::catalog_read())?;
        let table = inventory::decode(self.store.read_table(TableName::Inventory)?)?;
        Ok(table.into_records())
    }

    /// Append a new item. Codes are unique ignoring case.
    #[tracing::instrument(skip_all, fields(caller = %caller.display_name, product_code = %item.code))]
    pub fn add_item(&self, caller: &Principal, item: NewItem) -> Result<InventoryItem, ServiceError> {
        authorize(caller, &Permission::catalog_write())?;
        let item = InventoryItem::new(item)?;

        write_with_retry(TableName::Inventory, &self.retry, |_| {
            let mut table = inventory::decode(self.store.read_table(TableName::Inventory)?)?;
            if let Some(existing) = find_by_code(table.records(), item.code()) {
                return Err(ServiceError::AlreadyExists(format!(
                    "product code {}",
                    existing.code()
                )));
            }
            table.push_row(inventory::encode(&item));

            let expected = ExpectedRevision::Exact(table.revision());
            let written = self
                .store
                .write_table(TableName::Inventory, table.into_rows(), expected);
            commit(written, ())
        })?;

        info!(product_code = %item.code(), stock = item.stock(), "catalog item added");
        Ok(item)
    }

    /// Administrative direct edit of one item.
    #[tracing::instrument(skip_all, fields(caller = %caller.display_name, product_code = %code))]
    pub fn update_item(
        &self,
        caller: &Principal,
        code: &str,
        update: ItemUpdate,
    ) -> Result<InventoryItem, ServiceError> {
        authorize(caller, &Permission::catalog_write())?;
        let code = ProductCode::parse(code)?;

        let updated = write_with_retry(TableName::Inventory, &self.retry, |_| {
            let mut table = inventory::decode(self.store.read_table(TableName::Inventory)?)?;
            let idx = position_of(table.records(), &code)
                .ok_or_else(|| ServiceError::NotFound(format!("product code {code}")))?;

            let updated = table.records()[idx].apply_update(&update)?;
            inventory::encode_into(table.row_mut(idx), &updated);

            let expected = ExpectedRevision::Exact(table.revision());
            let written = self
                .store
                .write_table(TableName::Inventory, table.into_rows(), expected);
            commit(written, updated)
        })?;

        info!(product_code = %updated.code(), stock = updated.stock(), "catalog item updated");
        Ok(updated)
    }
}
