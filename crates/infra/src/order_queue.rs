//! Administrative order queue: listing and the dispatch hand-off.

use chrono::Utc;
use tracing::info;

use everglow_auth::{Permission, Principal, authorize};
use everglow_core::{ExpectedRevision, OrderId};
use everglow_orders::{OrderRecord, OrderStatus};

use crate::config::DeskConfig;
use crate::error::ServiceError;
use crate::retry::{RetryPolicy, commit, write_with_retry};
use crate::store::{TableName, TableStore};
use crate::tables::orders;

#[derive(Debug, Clone)]
pub struct OrderQueue<S> {
    store: S,
    retry: RetryPolicy,
}

impl<S: TableStore> OrderQueue<S> {
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

    /// Orders in store order, optionally only those in `status`.
    pub fn list_orders(
        &self,
        caller: &Principal,
        status: Option<OrderStatus>,
    ) -> Result<Vec<OrderRecord>, ServiceError> {
        authorize(caller, &Permission::orders_read())?;
        let table = orders::decode(self.store.read_table(TableName::Orders)?)?;
        Ok(table
            .into_records()
            .into_iter()
            .filter(|order| status.is_none_or(|s| order.status() == s))
            .collect())
    }

    /// Move a `Pending` order to `Dispatched`.
    ///
    /// A second call for the same order returns
    /// [`ServiceError::AlreadyDispatched`] and writes nothing.
    #[tracing::instrument(skip_all, fields(caller = %caller.display_name, order_id = %order_id))]
    pub fn mark_dispatched(&self, caller: &Principal, order_id: OrderId) -> Result<OrderRecord, ServiceError> {
        authorize(caller, &Permission::orders_dispatch())?;

        let dispatched = write_with_retry(TableName::Orders, &self.retry, |_| {
            let mut table = orders::decode(self.store.read_table(TableName::Orders)?)?;
            let idx = table
                .records()
                .iter()
                .position(|order| order.order_id() == order_id)
                .ok_or_else(|| ServiceError::NotFound(format!("order {order_id}")))?;

            let dispatched = table.records()[idx].dispatch(Utc::now())?;
            orders::encode_into(table.row_mut(idx), &dispatched);

            let expected = ExpectedRevision::Exact(table.revision());
            let written = self
                .store
                .write_table(TableName::Orders, table.into_rows(), expected);
            commit(written, dispatched)
        })?;

        info!(
            order_id = %dispatched.order_id(),
            product_code = %dispatched.product_code(),
            "order dispatched"
        );
        Ok(dispatched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryTableStore;
    use everglow_core::ProductCode;
    use everglow_orders::RequesterInfo;

    fn pending(code: &str) -> OrderRecord {
        OrderRecord::place(
            OrderId::new(),
            ProductCode::parse(code).unwrap(),
            2,
            RequesterInfo {
                name: "Shop A".to_string(),
                contact: "01700-000000".to_string(),
                ..RequesterInfo::default()
            },
            Utc::now(),
        )
        .unwrap()
    }

    fn queue_with(records: &[OrderRecord]) -> OrderQueue<InMemoryTableStore> {
        let rows = records.iter().map(orders::encode).collect();
        OrderQueue::new(InMemoryTableStore::new().with_rows(TableName::Orders, rows))
    }

    #[test]
    fn dispatch_then_dispatch_again() {
        let order = pending("EG-R001");
        let queue = queue_with(std::slice::from_ref(&order));
        let admin = Principal::admin("owner");

        let dispatched = queue.mark_dispatched(&admin, order.order_id()).unwrap();
        assert_eq!(dispatched.status(), OrderStatus::Dispatched);
        assert!(dispatched.dispatched_at().is_some());

        let revision = queue.store().read_table(TableName::Orders).unwrap().revision;
        assert_eq!(
            queue.mark_dispatched(&admin, order.order_id()),
            Err(ServiceError::AlreadyDispatched)
        );
        assert_eq!(queue.store().read_table(TableName::Orders).unwrap().revision, revision);
    }

    #[test]
    fn unknown_order_is_not_found() {
        let queue = queue_with(&[pending("EG-R001")]);
        let err = queue
            .mark_dispatched(&Principal::admin("owner"), OrderId::new())
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[test]
    fn partners_cannot_dispatch_or_list() {
        let order = pending("EG-R001");
        let queue = queue_with(std::slice::from_ref(&order));
        let partner = Principal::partner("Shop A");
        assert!(matches!(
            queue.mark_dispatched(&partner, order.order_id()),
            Err(ServiceError::Forbidden(_))
        ));
        assert!(matches!(queue.list_orders(&partner, None), Err(ServiceError::Forbidden(_))));
    }

    #[test]
    fn list_orders_filters_by_status() {
        let first = pending("EG-R001");
        let second = pending("EG-N002");
        let queue = queue_with(&[first.clone(), second.clone()]);
        let admin = Principal::admin("owner");
        queue.mark_dispatched(&admin, first.order_id()).unwrap();

        let all = queue.list_orders(&admin, None).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].order_id(), first.order_id());

        let waiting = queue.list_orders(&admin, Some(OrderStatus::Pending)).unwrap();
        assert_eq!(waiting, vec![second]);
    }
}
