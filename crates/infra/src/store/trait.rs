use std::sync::Arc;

use serde_json::Value as JsonValue;
use thiserror::Error;

use everglow_core::ExpectedRevision;

/// The two sheets the dashboard works with.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum TableName {
    Inventory,
    Orders,
}

impl TableName {
    /// Worksheet name in the external store.
    pub fn as_str(self) -> &'static str {
        match self {
            TableName::Inventory => "Inventory",
            TableName::Orders => "Orders",
        }
    }
}

impl core::fmt::Display for TableName {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One sheet row: column header → cell value.
pub type Row = serde_json::Map<String, JsonValue>;

/// A whole table as read at one revision.
#[derive(Debug, Clone, PartialEq)]
pub struct TableSnapshot {
    pub table: TableName,
    /// Bumped by the store on every committed write. A table that was never
    /// written reads as revision 0 with no rows.
    pub revision: u64,
    /// Rows in the store's natural order.
    pub rows: Vec<Row>,
}

/// Collaborator-level failure.
///
/// `Unavailable` and `Timeout` are transport problems; `Conflict` means the
/// conditional write lost a race and nothing was written.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("store call timed out: {0}")]
    Timeout(String),

    #[error("write conflict on {table}: expected {expected:?}, found revision {actual}")]
    Conflict {
        table: TableName,
        expected: ExpectedRevision,
        actual: u64,
    },

    #[error("stored table is corrupt: {0}")]
    Corrupt(String),
}

/// Whole-table access to the external store.
///
/// There is no multi-table transaction: two `write_table` calls are two
/// independent commits. What implementations must provide is the revision
/// check on a single table, so that a read-decide-write sequence can detect
/// that someone else wrote in between.
pub trait TableStore: Send + Sync {
    /// Read every row of `table` together with its current revision.
    fn read_table(&self, table: TableName) -> Result<TableSnapshot, StoreError>;

    /// Replace the contents of `table` with `rows` if its revision still
    /// matches `expected`. Returns the new revision.
    fn write_table(
        &self,
        table: TableName,
        rows: Vec<Row>,
        expected: ExpectedRevision,
    ) -> Result<u64, StoreError>;
}

impl<S> TableStore for Arc<S>
where
    S: TableStore + ?Sized,
{
    fn read_table(&self, table: TableName) -> Result<TableSnapshot, StoreError> {
        (**self).read_table(table)
    }

    fn write_table(
        &self,
        table: TableName,
        rows: Vec<Row>,
        expected: ExpectedRevision,
    ) -> Result<u64, StoreError> {
        (**self).write_table(table, rows, expected)
    }
}
