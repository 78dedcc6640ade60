//! Row codecs: typed records ⇄ loosely typed sheet rows.
//!
//! Rows are validated here, at the boundary, and nowhere else. Sheet cells may
//! hold numbers or numeric strings; blank lines are skipped on decode but kept
//! on write-back, and columns the codec does not know about are preserved.

pub mod inventory;
pub mod orders;

use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use thiserror::Error;

use crate::store::{Row, TableName, TableSnapshot};

/// A sheet row that failed boundary validation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{table} row {row}: {message}")]
pub struct MalformedRow {
    pub table: TableName,
    /// 1-based data row (header excluded).
    pub row: usize,
    pub message: String,
}

/// A table decoded into typed records, still holding its raw rows for
/// write-back at the revision it was read at.
#[derive(Debug, Clone)]
pub struct DecodedTable<T> {
    revision: u64,
    rows: Vec<Row>,
    records: Vec<T>,
    positions: Vec<usize>,
}

impl<T> DecodedTable<T> {
    pub fn decode(
        snapshot: TableSnapshot,
        decode_row: impl Fn(&Row) -> Result<T, String>,
    ) -> Result<Self, MalformedRow> {
        let mut records = Vec::with_capacity(snapshot.rows.len());
        let mut positions = Vec::with_capacity(snapshot.rows.len());

        for (idx, row) in snapshot.rows.iter().enumerate() {
            if is_blank(row) {
                continue;
            }
            let record = decode_row(row).map_err(|message| MalformedRow {
                table: snapshot.table,
                row: idx + 1,
                message,
            })?;
            records.push(record);
            positions.push(idx);
        }

        Ok(Self {
            revision: snapshot.revision,
            rows: snapshot.rows,
            records,
            positions,
        })
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn records(&self) -> &[T] {
        &self.records
    }

    pub fn into_records(self) -> Vec<T> {
        self.records
    }

    /// Raw row backing the record at `record_idx`.
    pub fn row_mut(&mut self, record_idx: usize) -> &mut Row {
        &mut self.rows[self.positions[record_idx]]
    }

    pub fn push_row(&mut self, row: Row) {
        self.rows.push(row);
    }

    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }
}

fn is_blank(row: &Row) -> bool {
    row.values().all(|v| match v {
        JsonValue::Null => true,
        JsonValue::String(s) => s.trim().is_empty(),
        _ => false,
    })
}

/// Trimmed text of a cell; numbers are rendered, blanks are `None`.
pub(crate) fn text(row: &Row, column: &str) -> Option<String> {
    let s = match row.get(column)? {
        JsonValue::String(s) => s.trim().to_string(),
        JsonValue::Number(n) => n.to_string(),
        JsonValue::Bool(b) => b.to_string(),
        _ => return None,
    };
    (!s.is_empty()).then_some(s)
}

pub(crate) fn required_text(row: &Row, column: &str) -> Result<String, String> {
    text(row, column).ok_or_else(|| format!("'{column}' is empty"))
}

fn number(row: &Row, column: &str) -> Result<f64, String> {
    let value = match row.get(column) {
        Some(JsonValue::Number(n)) => n
            .as_f64()
            .ok_or_else(|| format!("'{column}' is not a number"))?,
        Some(JsonValue::String(s)) if !s.trim().is_empty() => s
            .trim()
            .replace(',', "")
            .parse::<f64>()
            .map_err(|_| format!("'{column}' is not a number: '{s}'"))?,
        _ => return Err(format!("'{column}' is empty")),
    };
    if !value.is_finite() {
        return Err(format!("'{column}' is not a finite number"));
    }
    if value < 0.0 {
        return Err(format!("'{column}' cannot be negative"));
    }
    Ok(value)
}

/// Non-negative whole count (stock, quantity). `10` and `10.0` both decode.
pub(crate) fn count(row: &Row, column: &str) -> Result<u32, String> {
    let value = number(row, column)?;
    if value.fract() != 0.0 {
        return Err(format!("'{column}' must be a whole number"));
    }
    if value > f64::from(u32::MAX) {
        return Err(format!("'{column}' is too large"));
    }
    Ok(value as u32)
}

/// Decimal currency amount, returned in minor units (1/100).
pub(crate) fn money(row: &Row, column: &str) -> Result<u64, String> {
    let minor = (number(row, column)? * 100.0).round();
    if minor > 9.0e15 {
        return Err(format!("'{column}' is too large"));
    }
    Ok(minor as u64)
}

/// Inverse of [`money`]: whole amounts are written as integers.
pub(crate) fn money_cell(minor: u64) -> JsonValue {
    if minor % 100 == 0 {
        JsonValue::from(minor / 100)
    } else {
        JsonValue::from(minor as f64 / 100.0)
    }
}

pub(crate) fn timestamp(row: &Row, column: &str) -> Result<Option<DateTime<Utc>>, String> {
    match text(row, column) {
        None => Ok(None),
        Some(s) => DateTime::parse_from_rfc3339(&s)
            .map(|t| Some(t.with_timezone(&Utc)))
            .map_err(|e| format!("'{column}' is not an RFC 3339 timestamp: {e}")),
    }
}

pub(crate) fn optional_text_cell(value: Option<&str>) -> JsonValue {
    JsonValue::from(value.unwrap_or_default())
}
