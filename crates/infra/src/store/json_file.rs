//! JSON-file backed table store.
//!
//! Each table lives in `<dir>/<table>.json` as `{ "revision": n, "rows": [...] }`.
//! Writes go to a temp file that is synced and renamed over the table file.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::instrument;

use everglow_core::ExpectedRevision;

use super::r#trait::{Row, StoreError, TableName, TableSnapshot, TableStore};

#[derive(Debug, Default, Serialize, Deserialize)]
struct TableFile {
    revision: u64,
    #[serde(default)]
    rows: Vec<Row>,
}

/// File-backed store for a single host.
///
/// The revision check and rename are serialized by an in-process mutex. Two
/// processes sharing the same directory can still interleave between the
/// check and the rename; run one writer process per directory.
#[derive(Debug)]
pub struct JsonFileTableStore {
    dir: PathBuf,
    write_guard: Mutex<()>,
}

impl JsonFileTableStore {
    /// Open (and create if needed) a store rooted at `dir`.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| {
            StoreError::Unavailable(format!("cannot create {}: {e}", dir.display()))
        })?;
        Ok(Self {
            dir,
            write_guard: Mutex::new(()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn table_path(&self, table: TableName) -> PathBuf {
        self.dir
            .join(format!("{}.json", table.as_str().to_ascii_lowercase()))
    }

    fn load(&self, table: TableName) -> Result<TableFile, StoreError> {
        let path = self.table_path(table);
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(TableFile::default()),
            Err(e) => {
                return Err(StoreError::Unavailable(format!(
                    "cannot read {}: {e}",
                    path.display()
                )));
            }
        };
        serde_json::from_str(&text)
            .map_err(|e| StoreError::Corrupt(format!("{}: {e}", path.display())))
    }

    fn persist(&self, table: TableName, file: &TableFile) -> Result<(), StoreError> {
        let path = self.table_path(table);
        let tmp = path.with_extension("json.tmp");
        let bytes = serde_json::to_vec_pretty(file)
            .map_err(|e| StoreError::Unavailable(format!("cannot encode {table}: {e}")))?;

        write_and_sync(&tmp, &bytes)?;
        fs::rename(&tmp, &path).map_err(|e| {
            StoreError::Unavailable(format!("cannot replace {}: {e}", path.display()))
        })
    }
}

fn write_and_sync(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let mut f = File::create(path)
        .map_err(|e| StoreError::Unavailable(format!("cannot create {}: {e}", path.display())))?;
    f.write_all(bytes)
        .and_then(|_| f.sync_all())
        .map_err(|e| StoreError::Unavailable(format!("cannot write {}: {e}", path.display())))
}

impl TableStore for JsonFileTableStore {
    #[instrument(skip(self), fields(table = %table), err)]
    fn read_table(&self, table: TableName) -> Result<TableSnapshot, StoreError> {
        let file = self.load(table)?;
        Ok(TableSnapshot {
            table,
            revision: file.revision,
            rows: file.rows,
        })
    }

    #[instrument(skip(self, rows), fields(table = %table, row_count = rows.len()), err)]
    fn write_table(
        &self,
        table: TableName,
        rows: Vec<Row>,
        expected: ExpectedRevision,
    ) -> Result<u64, StoreError> {
        let _guard = self
            .write_guard
            .lock()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))?;

        let current = self.load(table)?;
        if !expected.matches(current.revision) {
            return Err(StoreError::Conflict {
                table,
                expected,
                actual: current.revision,
            });
        }

        let next = TableFile {
            revision: current.revision + 1,
            rows,
        };
        self.persist(table, &next)?;
        Ok(next.revision)
    }
}
