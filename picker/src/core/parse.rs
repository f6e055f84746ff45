//! Typed parsing of raw tracking-table rows.
//!
//! Cells arrive as untyped JSON values (the Sheets `ValueRange` shape). This
//! is the only place they are inspected; everything downstream works on
//! [`TrackingEntry`].

use serde_json::Value;

use crate::core::types::TrackingEntry;
use crate::error::DataSourceError;

pub const COL_IDENTIFIER: usize = 0;
pub const COL_TITLE: usize = 1;
pub const COL_AUTHOR: usize = 3;
pub const COL_COMMIT_HASH: usize = 5;
pub const COL_DEPLOYABLE: usize = 7;
pub const COL_RELEASE_CANDIDATE: usize = 8;
pub const COL_PRODUCTION: usize = 9;

const TRUE_TOKEN: &str = "TRUE";

/// Parse all data rows, skipping the header row and blank rows.
///
/// Row numbers in errors are 1-indexed as shown in a spreadsheet.
pub fn parse_rows(rows: &[Vec<Value>]) -> Result<Vec<TrackingEntry>, DataSourceError> {
    let mut entries = Vec::new();
    for (index, row) in rows.iter().enumerate().skip(1) {
        if is_blank(row) {
            continue;
        }
        entries.push(parse_row(index + 1, row)?);
    }
    Ok(entries)
}

/// Parse a single data row. `row_number` is used for error reporting only.
pub fn parse_row(row_number: usize, row: &[Value]) -> Result<TrackingEntry, DataSourceError> {
    Ok(TrackingEntry {
        identifier: text_cell(row, row_number, COL_IDENTIFIER)?,
        commit_hash: hash_cell(row, row_number)?,
        title: text_cell(row, row_number, COL_TITLE)?,
        author: text_cell(row, row_number, COL_AUTHOR)?,
        deployable: flag_cell(row, row_number, COL_DEPLOYABLE)?,
        release_candidate: flag_cell(row, row_number, COL_RELEASE_CANDIDATE)?,
        production: flag_cell(row, row_number, COL_PRODUCTION)?,
    })
}

fn is_blank(row: &[Value]) -> bool {
    row.iter().all(|cell| match cell {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    })
}

/// Trailing empty cells are omitted by the Sheets API, so a missing flag is `false`.
fn flag_cell(row: &[Value], row_number: usize, column: usize) -> Result<bool, DataSourceError> {
    match row.get(column) {
        None => Ok(false),
        Some(Value::String(s)) => Ok(s == TRUE_TOKEN),
        Some(Value::Bool(b)) => Ok(*b),
        Some(other) => Err(DataSourceError::InvalidFlag {
            row: row_number,
            column,
            found: describe(other),
        }),
    }
}

fn text_cell(row: &[Value], row_number: usize, column: usize) -> Result<String, DataSourceError> {
    match row.get(column) {
        None => Ok(String::new()),
        Some(Value::String(s)) => Ok(s.trim().to_string()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        Some(other) => Err(DataSourceError::InvalidCell {
            row: row_number,
            column,
            found: describe(other),
        }),
    }
}

/// Hash cells end up as a git argument; option-like text is never a revision.
fn hash_cell(row: &[Value], row_number: usize) -> Result<String, DataSourceError> {
    let hash = text_cell(row, row_number, COL_COMMIT_HASH)?;
    if hash.starts_with('-') {
        return Err(DataSourceError::InvalidRevision {
            row: row_number,
            found: hash,
        });
    }
    Ok(hash)
}

fn describe(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(_) => "bool".to_string(),
        Value::Number(n) => format!("number {n}"),
        Value::String(s) => format!("text '{s}'"),
        Value::Array(_) => "array".to_string(),
        Value::Object(_) => "object".to_string(),
    }
}
