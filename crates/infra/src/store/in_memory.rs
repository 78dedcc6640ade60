use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use everglow_core::ExpectedRevision;

use super::r#trait::{Row, StoreError, TableName, TableSnapshot, TableStore};

#[derive(Debug, Clone, Default)]
struct TableState {
    revision: u64,
    rows: Vec<Row>,
}

/// In-memory table store.
///
/// Intended for tests/dev. The revision check and the write happen under one
/// write lock, so conditional writes are linearizable.
#[derive(Debug, Default)]
pub struct InMemoryTableStore {
    tables: RwLock<HashMap<TableName, TableState>>,
}

impl InMemoryTableStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a table (fixture helper). Bumps the revision like any write.
    ///
    /// The store is owned here, so a poisoned lock is recovered rather than
    /// dropping the seed rows; the returned store starts unpoisoned.
    pub fn with_rows(self, table: TableName, rows: Vec<Row>) -> Self {
        let mut tables = self.tables.into_inner().unwrap_or_else(PoisonError::into_inner);
        let state = tables.entry(table).or_default();
        state.rows = rows;
        state.revision += 1;
        Self {
            tables: RwLock::new(tables),
        }
    }
}

impl TableStore for InMemoryTableStore {
    fn read_table(&self, table: TableName) -> Result<TableSnapshot, StoreError> {
        let tables = self
            .tables
            .read()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))?;

        let state = tables.get(&table).cloned().unwrap_or_default();
        Ok(TableSnapshot {
            table,
            revision: state.revision,
            rows: state.rows,
        })
    }

    fn write_table(
        &self,
        table: TableName,
        rows: Vec<Row>,
        expected: ExpectedRevision,
    ) -> Result<u64, StoreError> {
        let mut tables = self
            .tables
            .write()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))?;

        let state = tables.entry(table).or_default();
        if !expected.matches(state.revision) {
            return Err(StoreError::Conflict {
                table,
                expected,
                actual: state.revision,
            });
        }

        state.rows = rows;
        state.revision += 1;
        Ok(state.revision)
    }
}
