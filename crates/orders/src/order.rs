use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use everglow_core::{DomainError, DomainResult, OrderId, ProductCode};

use crate::requester::RequesterInfo;

/// Order status lifecycle: `Pending → Dispatched`, exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Pending,
    Dispatched,
}

impl OrderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Dispatched => "Dispatched",
        }
    }

    /// Parse the status cell of an orders sheet (case-insensitive).
    pub fn parse(raw: &str) -> DomainResult<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(OrderStatus::Pending),
            "dispatched" => Ok(OrderStatus::Dispatched),
            other => Err(DomainError::validation(format!(
                "unknown order status '{other}'"
            ))),
        }
    }
}

impl core::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A recorded order request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRecord {
    order_id: OrderId,
    product_code: ProductCode,
    quantity: u32,
    status: OrderStatus,
    requester: RequesterInfo,
    created_at: DateTime<Utc>,
    dispatched_at: Option<DateTime<Utc>>,
}

impl OrderRecord {
    /// Create a new `Pending` order.
    ///
    /// Stock is not checked here; the caller reserves it first.
    pub fn place(
        order_id: OrderId,
        product_code: ProductCode,
        quantity: u32,
        requester: RequesterInfo,
        created_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if quantity == 0 {
            return Err(DomainError::validation("quantity must be positive"));
        }
        Ok(Self {
            order_id,
            product_code,
            quantity,
            status: OrderStatus::Pending,
            requester,
            created_at,
            dispatched_at: None,
        })
    }

    /// Reassemble a record read back from the external store.
    pub fn restore(
        order_id: OrderId,
        product_code: ProductCode,
        quantity: u32,
        status: OrderStatus,
        requester: RequesterInfo,
        created_at: DateTime<Utc>,
        dispatched_at: Option<DateTime<Utc>>,
    ) -> DomainResult<Self> {
        if quantity == 0 {
            return Err(DomainError::validation("quantity must be positive"));
        }
        if status == OrderStatus::Pending && dispatched_at.is_some() {
            return Err(DomainError::invariant("pending order has a dispatch time"));
        }
        Ok(Self {
            order_id,
            product_code,
            quantity,
            status,
            requester,
            created_at,
            dispatched_at,
        })
    }

    pub fn order_id(&self) -> OrderId {
        self.order_id
    }

    pub fn product_code(&self) -> &ProductCode {
        &self.product_code
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn requester(&self) -> &RequesterInfo {
        &self.requester
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn dispatched_at(&self) -> Option<DateTime<Utc>> {
        self.dispatched_at
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.status, OrderStatus::Pending)
    }

    /// Decide the hand-off to delivery. Returns the dispatched record.
    pub fn dispatch(&self, at: DateTime<Utc>) -> DomainResult<OrderRecord> {
        if !self.is_pending() {
            return Err(DomainError::AlreadyDispatched);
        }
        let mut next = self.clone();
        next.status = OrderStatus::Dispatched;
        next.dispatched_at = Some(at);
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn requester() -> RequesterInfo {
        RequesterInfo {
            name: "Shop A".to_string(),
            contact: "01700-000000".to_string(),
            ..RequesterInfo::default()
        }
    }

    fn pending(quantity: u32) -> OrderRecord {
        OrderRecord::place(
            OrderId::new(),
            ProductCode::parse("EG-R001").unwrap(),
            quantity,
            requester(),
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn placed_orders_start_pending() {
        let order = pending(4);
        assert_eq!(order.status(), OrderStatus::Pending);
        assert_eq!(order.quantity(), 4);
        assert!(order.dispatched_at().is_none());
    }

    #[test]
    fn zero_quantity_is_rejected() {
        let err = OrderRecord::place(
            OrderId::new(),
            ProductCode::parse("EG-R001").unwrap(),
            0,
            requester(),
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn dispatch_happens_exactly_once() {
        let order = pending(1);
        let at = Utc::now();
        let dispatched = order.dispatch(at).unwrap();
        assert_eq!(dispatched.status(), OrderStatus::Dispatched);
        assert_eq!(dispatched.dispatched_at(), Some(at));
        assert_eq!(order.status(), OrderStatus::Pending);

        assert_eq!(dispatched.dispatch(Utc::now()), Err(DomainError::AlreadyDispatched));
    }

    #[test]
    fn status_parsing_is_case_insensitive() {
        assert_eq!(OrderStatus::parse(" pending ").unwrap(), OrderStatus::Pending);
        assert_eq!(OrderStatus::parse("DISPATCHED").unwrap(), OrderStatus::Dispatched);
        assert!(OrderStatus::parse("shipped").is_err());
    }

    #[test]
    fn restore_rejects_pending_with_dispatch_time() {
        let err = OrderRecord::restore(
            OrderId::new(),
            ProductCode::parse("EG-R001").unwrap(),
            1,
            OrderStatus::Pending,
            requester(),
            Utc::now(),
            Some(Utc::now()),
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
    }
}
