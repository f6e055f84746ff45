//! Selection helpers for `picker list`, `picker plan` and `picker pick`.

use tracing::{debug, info};

use crate::core::parse::parse_rows;
use crate::core::selection::select;
use crate::core::types::TrackingEntry;
use crate::error::DataSourceError;
use crate::io::sheet::TrackingSource;

/// Parsed tracking table and the entries eligible for picking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    /// Number of data rows parsed (header and blank rows excluded).
    pub total: usize,
    pub eligible: Vec<TrackingEntry>,
}

impl Selection {
    pub fn is_empty(&self) -> bool {
        self.eligible.is_empty()
    }
}

/// Fetch rows from `source`, parse them, and keep the eligible entries in order.
pub fn load_selection<S: TrackingSource + ?Sized>(
    source: &S,
) -> Result<Selection, DataSourceError> {
    let rows = source.fetch_rows()?;
    let entries = parse_rows(&rows)?;
    let eligible = select(&entries);
    debug!(rows = rows.len(), parsed = entries.len(), "tracking rows parsed");
    info!(total = entries.len(), eligible = eligible.len(), "selection ready");
    Ok(Selection {
        total: entries.len(),
        eligible,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::sheet::Rows;
    use crate::test_support::{entry, sheet_row, value_range};
    use serde_json::{Value, json};

    struct StaticSource(Rows);

    impl TrackingSource for StaticSource {
        fn fetch_rows(&self) -> Result<Rows, DataSourceError> {
            Ok(self.0.clone())
        }
    }

    fn rows_of(range: Value) -> Rows {
        serde_json::from_value(range["values"].clone()).expect("rows")
    }

    #[test]
    fn header_plus_two_rows_selects_only_eligible() {
        let a = entry("A", true, false, false);
        let b = entry("B", true, true, false);
        let source = StaticSource(rows_of(value_range(&[a.clone(), b])));
        let selection = load_selection(&source).expect("select");
        assert_eq!(selection.total, 2);
        assert_eq!(selection.eligible, vec![a]);
    }

    #[test]
    fn no_eligible_rows_is_empty_not_error() {
        let source = StaticSource(rows_of(value_range(&[entry("P", true, false, true)])));
        let selection = load_selection(&source).expect("select");
        assert!(selection.is_empty());
    }

    #[test]
    fn malformed_flag_fails_whole_selection() {
        let mut bad = sheet_row(&entry("X", true, false, false));
        bad[7] = json!(3);
        let source = StaticSource(vec![
            vec![json!("Number")],
            serde_json::from_value(bad).expect("row"),
        ]);
        let err = load_selection(&source).expect_err("bad flag");
        assert!(matches!(err, DataSourceError::InvalidFlag { row: 2, .. }));
    }

    #[test]
    fn fetch_failure_propagates() {
        struct Down;
        impl TrackingSource for Down {
            fn fetch_rows(&self) -> Result<Rows, DataSourceError> {
                Err(DataSourceError::Unavailable("503".to_string()))
            }
        }
        let err = load_selection(&Down).expect_err("down");
        assert_eq!(err, DataSourceError::Unavailable("503".to_string()));
    }
}
