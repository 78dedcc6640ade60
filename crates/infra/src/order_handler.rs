//! Order placement: reserve stock, then record the order.
//!
//! ```text
//! OrderRequest
//!   ↓
//! 1. Authorize the caller (orders.place)
//!   ↓
//! 2. Validate quantity, product code and requester fields
//!   ↓
//! 3. Read Inventory, check stock, write it back at the revision read
//!    (conflict → re-read and re-decide)
//!   ↓
//! 4. Append the order row to Orders, same conditional loop
//! ```
//!
//! Steps 3 and 4 are two independent commits. Inventory goes first: if step 4
//! fails the stock is already gone and the caller gets
//! [`ServiceError::OrphanedReservation`] naming what to reconcile. Every
//! failure before step 3 commits leaves both tables untouched.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use everglow_auth::{Permission, Principal, authorize};
use everglow_core::{ExpectedRevision, OrderId, ProductCode};
use everglow_inventory::{InventoryItem, position_of};
use everglow_orders::{OrderChannel, OrderRecord, RequesterInfo, RequesterPolicies};

use crate::config::DeskConfig;
use crate::error::ServiceError;
use crate::retry::{RetryPolicy, commit, write_with_retry};
use crate::store::{TableName, TableStore};
use crate::tables::{inventory, orders};

/// A partner's order as submitted by the presentation layer.
///
/// `quantity` is taken as entered; anything outside `1..=u32::MAX` is
/// rejected as invalid input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub product_code: String,
    pub quantity: i64,
    #[serde(default)]
    pub channel: OrderChannel,
    #[serde(default)]
    pub requester: RequesterInfo,
}

impl OrderRequest {
    /// A direct partner order.
    pub fn direct(product_code: impl Into<String>, quantity: i64, requester: RequesterInfo) -> Self {
        Self {
            product_code: product_code.into(),
            quantity,
            channel: OrderChannel::PartnerDirect,
            requester,
        }
    }

    /// An order a partner enters on a customer's behalf.
    pub fn on_behalf(product_code: impl Into<String>, quantity: i64, requester: RequesterInfo) -> Self {
        Self {
            product_code: product_code.into(),
            quantity,
            channel: OrderChannel::CustomerOnBehalf,
            requester,
        }
    }
}

/// Places orders against the external Inventory and Orders tables.
///
/// Holds no state between calls beyond its configuration; the store is the
/// only system of record.
#[derive(Debug, Clone)]
pub struct OrderTransactionHandler<S> {
    store: S,
    policies: RequesterPolicies,
    retry: RetryPolicy,
}

impl<S: TableStore> OrderTransactionHandler<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            policies: RequesterPolicies::default(),
            retry: RetryPolicy::default(),
        }
    }

    pub fn from_config(store: S, config: &DeskConfig) -> Self {
        Self {
            store,
            policies: config.requester_policies.clone(),
            retry: config.retry_policy(),
        }
    }

    pub fn with_policies(mut self, policies: RequesterPolicies) -> Self {
        self.policies = policies;
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Reserve `request.quantity` of the item and record a `Pending` order.
    #[tracing::instrument(
        skip_all,
        fields(caller = %caller.display_name, product_code = %request.product_code, quantity = request.quantity)
    )]
    pub fn place_order(&self, caller: &Principal, request: OrderRequest) -> Result<OrderRecord, ServiceError> {
        authorize(caller, &Permission::orders_place())?;

        let (code, quantity) = self.validate(&request)?;
        let order = OrderRecord::place(OrderId::new(), code, quantity, request.requester, Utc::now())?;

        let reserved = self.reserve_stock(order.product_code(), quantity)?;
        self.append_order(&order)?;

        info!(
            order_id = %order.order_id(),
            product_code = %order.product_code(),
            quantity,
            remaining_stock = reserved.stock(),
            "order placed"
        );
        Ok(order)
    }

    fn validate(&self, request: &OrderRequest) -> Result<(ProductCode, u32), ServiceError> {
        let quantity = match u32::try_from(request.quantity) {
            Ok(q) if q > 0 => q,
            _ => {
                warn!(quantity = request.quantity, "rejected order quantity");
                return Err(ServiceError::InvalidInput(format!(
                    "quantity must be a positive integer, got {}",
                    request.quantity
                )));
            }
        };
        let code = ProductCode::parse(&request.product_code)?;
        self.policies
            .for_channel(request.channel)
            .validate(&request.requester)?;
        Ok((code, quantity))
    }

    /// Deduct stock at the revision just read. Returns the updated item.
    fn reserve_stock(&self, code: &ProductCode, quantity: u32) -> Result<InventoryItem, ServiceError> {
        write_with_retry(TableName::Inventory, &self.retry, |_| {
            let mut table = inventory::decode(self.store.read_table(TableName::Inventory)?)?;
            let idx = position_of(table.records(), code)
                .ok_or_else(|| ServiceError::NotFound(format!("product code {code}")))?;

            let reserved = table.records()[idx].reserve(quantity)?;
            inventory::encode_into(table.row_mut(idx), &reserved);

            let expected = ExpectedRevision::Exact(table.revision());
            let written = self
                .store
                .write_table(TableName::Inventory, table.into_rows(), expected);
            commit(written, reserved)
        })
    }

    fn append_order(&self, order: &OrderRecord) -> Result<(), ServiceError> {
        let appended = write_with_retry(TableName::Orders, &self.retry, |_| {
            let snapshot = self.store.read_table(TableName::Orders)?;
            let expected = ExpectedRevision::Exact(snapshot.revision);
            let mut rows = snapshot.rows;
            rows.push(orders::encode(order));
            commit(self.store.write_table(TableName::Orders, rows, expected), ())
        });

        appended.map_err(|cause| {
            error!(
                order_id = %order.order_id(),
                product_code = %order.product_code(),
                quantity = order.quantity(),
                error = %cause,
                "stock reserved but order row not recorded; needs manual reconciliation"
            );
            ServiceError::OrphanedReservation {
                order_id: order.order_id(),
                product_code: order.product_code().to_string(),
                quantity: order.quantity(),
                reason: cause.to_string(),
            }
        })
    }

    /// Dry-run the input checks of [`Self::place_order`] without touching the
    /// store.
    pub fn check_request(&self, caller: &Principal, request: &OrderRequest) -> Result<(), ServiceError> {
        authorize(caller, &Permission::orders_place())?;
        self.validate(request).map(|_| ())
    }
}
