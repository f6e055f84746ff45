//! Investigation test against the live Sheets values API.
//!
//! Excluded from regular runs because it needs network access and a real
//! bearer token.
//!
//! Run with:
//! `PICKER_SHEET_ID=... PICKER_CREDENTIALS=/path/to/token cargo test --test investigation_sheets -- --ignored`

use picker::core::parse::parse_rows;
use picker::io::config::DEFAULT_RANGE;
use picker::io::sheet::{SheetsApiSource, TrackingSource};

#[test]
#[ignore = "requires network access and Sheets credentials"]
fn live_sheet_rows_parse() {
    let spreadsheet_id = std::env::var("PICKER_SHEET_ID").expect("PICKER_SHEET_ID");
    let credentials = std::env::var("PICKER_CREDENTIALS").expect("PICKER_CREDENTIALS");
    let source = SheetsApiSource::new(spreadsheet_id, DEFAULT_RANGE, credentials);

    let rows = source.fetch_rows().expect("fetch rows");
    assert!(!rows.is_empty(), "sheet should have at least a header row");
    let entries = parse_rows(&rows).expect("parse rows");
    println!("parsed {} tracking entries", entries.len());
}
