//! Text rendering for listings, progress lines and final run reports.
//!
//! Everything here is a pure function of its inputs so output can be asserted
//! in tests without a terminal.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::core::types::{ApplicationOutcome, EntryRecord, RunReport, RunStatus, TrackingEntry};

const LISTING_HEADERS: [&str; 5] = ["#", "Number", "Title", "Author", "Hash"];
const PROGRESS_GAP: usize = 5;

/// Column widths used when rendering (the `[display]` config table).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DisplayConfig {
    /// Title characters shown in the listing table.
    pub listing_title_width: usize,
    /// Title characters shown in progress lines; outcomes align after this column.
    pub progress_title_width: usize,
    /// Abbreviated commit hash length.
    pub hash_width: usize,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            listing_title_width: 50,
            progress_title_width: 100,
            hash_width: 10,
        }
    }
}

/// Truncate to at most `width` characters (never splits a UTF-8 sequence).
pub fn truncate(text: &str, width: usize) -> String {
    text.chars().take(width).collect()
}

/// Render the table of eligible entries shown before processing.
pub fn render_listing(entries: &[TrackingEntry], display: &DisplayConfig) -> String {
    let rows: Vec<[String; 5]> = entries
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            [
                (i + 1).to_string(),
                entry.identifier.clone(),
                truncate(&entry.title, display.listing_title_width),
                entry.author.clone(),
                truncate(&entry.commit_hash, display.hash_width),
            ]
        })
        .collect();

    let mut widths = LISTING_HEADERS.map(|h| h.chars().count());
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row.iter()) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let border = {
        let mut line = String::from("+");
        for width in widths {
            line.push_str(&"-".repeat(width + 2));
            line.push('+');
        }
        line
    };

    let mut out = String::new();
    out.push_str(&border);
    out.push('\n');
    out.push_str(&table_row(&LISTING_HEADERS.map(str::to_string), &widths));
    out.push_str(&border);
    out.push('\n');
    for row in &rows {
        out.push_str(&table_row(row, &widths));
    }
    out.push_str(&border);
    out.push('\n');
    out
}

fn table_row(cells: &[String; 5], widths: &[usize; 5]) -> String {
    let mut line = String::from("|");
    for (cell, width) in cells.iter().zip(widths.iter()) {
        let pad = width - cell.chars().count();
        let _ = write!(line, " {cell}{} |", " ".repeat(pad));
    }
    line.push('\n');
    line
}

/// Short label for an outcome.
pub fn outcome_label(outcome: &ApplicationOutcome) -> String {
    match outcome {
        ApplicationOutcome::AlreadyPresent => "already picked".to_string(),
        ApplicationOutcome::Applied => "picked".to_string(),
        ApplicationOutcome::NoOpClean => "no changes, skipped".to_string(),
        ApplicationOutcome::Conflict => "CONFLICT, needs manual resolution".to_string(),
        ApplicationOutcome::OtherFailure(message) => {
            format!("failed: {}", first_line(message))
        }
    }
}

fn first_line(message: &str) -> &str {
    message.lines().find(|l| !l.trim().is_empty()).unwrap_or("").trim()
}

/// `[n] <id> <title>` padded to a fixed column, followed by the outcome label.
pub fn render_progress_line(record: &EntryRecord, display: &DisplayConfig) -> String {
    format!(
        "{}{}",
        progress_prefix(record.position, &record.entry, display),
        outcome_label(&record.outcome)
    )
}

/// Progress-style line for a dry run: `already picked` or `pending`.
pub fn render_plan_line(
    position: usize,
    entry: &TrackingEntry,
    already_present: bool,
    display: &DisplayConfig,
) -> String {
    let label = if already_present {
        outcome_label(&ApplicationOutcome::AlreadyPresent)
    } else {
        "pending".to_string()
    };
    format!("{}{label}", progress_prefix(position, entry, display))
}

fn progress_prefix(position: usize, entry: &TrackingEntry, display: &DisplayConfig) -> String {
    let title = truncate(&entry.title, display.progress_title_width);
    let pad = display.progress_title_width - title.chars().count() + PROGRESS_GAP;
    format!(
        "[{position}] {} {title}{}",
        entry.identifier,
        " ".repeat(pad)
    )
}

/// Render a full report: one progress line per entry, counts, and a final status line.
pub fn render(report: &RunReport, display: &DisplayConfig) -> String {
    let mut out = String::new();
    for record in &report.records {
        out.push_str(&render_progress_line(record, display));
        out.push('\n');
    }
    out.push('\n');
    out.push_str(&render_summary(report));
    out
}

/// Counts plus the terminal status line.
pub fn render_summary(report: &RunReport) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "picked={} already={} noop={} failed={} conflict={}",
        report.count(|o| *o == ApplicationOutcome::Applied),
        report.count(|o| *o == ApplicationOutcome::AlreadyPresent),
        report.count(|o| *o == ApplicationOutcome::NoOpClean),
        report.count(|o| matches!(o, ApplicationOutcome::OtherFailure(_))),
        report.count(|o| *o == ApplicationOutcome::Conflict),
    );
    if report.has_failures() {
        out.push_str("Some entries failed to apply; review them before continuing.\n");
    }
    match &report.status {
        RunStatus::Completed => out.push_str("Picking completed.\n"),
        RunStatus::HaltedOnConflict => {
            let at = report
                .records
                .last()
                .map(|r| format!(" at [{}] {}", r.position, r.entry.identifier))
                .unwrap_or_default();
            let _ = writeln!(
                out,
                "Halted on conflict{at}. Resolve the conflict manually, then run again."
            );
        }
        RunStatus::HaltedOnAdapterFailure(message) => {
            let _ = writeln!(out, "Halted: {message}");
        }
    }
    out
}
