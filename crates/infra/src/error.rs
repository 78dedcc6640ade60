//! Operation-level errors returned to the presentation layer.

use thiserror::Error;

use everglow_auth::AuthzError;
use everglow_core::{DomainError, OrderId};

use crate::store::StoreError;
use crate::tables::MalformedRow;

/// Typed failure of a catalog or order operation.
///
/// Only [`ServiceError::StoreUnavailable`] may be retried unchanged. Every
/// other variant is a precondition failure that a retry would hit again.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// Unknown product code or order id.
    #[error("not found: {0}")]
    NotFound(String),

    #[error("insufficient stock: requested {requested}, available {available}")]
    InsufficientStock { requested: u32, available: u32 },

    /// Malformed quantity, product code, or missing requester fields.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The order was already handed off. Nothing was written.
    #[error("order already dispatched")]
    AlreadyDispatched,

    /// The external read/write failed, timed out, or stayed contended.
    /// Nothing from this call was committed.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// The caller's role does not grant the operation.
    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// A row in the external table failed boundary validation.
    #[error("malformed table: {0}")]
    MalformedTable(String),

    /// Stock was deducted but the order row could not be appended.
    ///
    /// The two tables cannot be committed atomically; inventory is written
    /// first, so this is the one partial state the order path can leave
    /// behind. Needs manual reconciliation: do not retry.
    #[error(
        "stock for {product_code} reduced by {quantity} but order {order_id} was not recorded: {reason}"
    )]
    OrphanedReservation {
        order_id: OrderId,
        product_code: String,
        quantity: u32,
        reason: String,
    },
}

impl ServiceError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, ServiceError::StoreUnavailable(_))
    }
}

impl From<StoreError> for ServiceError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Corrupt(msg) => ServiceError::MalformedTable(msg),
            other => ServiceError::StoreUnavailable(other.to_string()),
        }
    }
}

impl From<MalformedRow> for ServiceError {
    fn from(value: MalformedRow) -> Self {
        ServiceError::MalformedTable(value.to_string())
    }
}

impl From<AuthzError> for ServiceError {
    fn from(value: AuthzError) -> Self {
        ServiceError::Forbidden(value.to_string())
    }
}

impl From<DomainError> for ServiceError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation(msg)
            | DomainError::InvalidId(msg)
            | DomainError::InvariantViolation(msg) => ServiceError::InvalidInput(msg),
            DomainError::NotFound(what) => ServiceError::NotFound(what),
            DomainError::InsufficientStock {
                requested,
                available,
            } => ServiceError::InsufficientStock {
                requested,
                available,
            },
            DomainError::AlreadyDispatched => ServiceError::AlreadyDispatched,
            DomainError::Conflict(msg) => ServiceError::AlreadyExists(msg),
            DomainError::Unauthorized => ServiceError::Forbidden("unauthorized".to_string()),
        }
    }
}
