//! Typed error taxonomy for picker.
//!
//! Fatal classes ([`ConfigError`], [`DataSourceError`] and fatal
//! [`AdapterError`]s) stop the process before or during a run. Per-entry
//! conditions (conflicts, rejected cherry-picks) are recorded in the
//! [`RunReport`](crate::core::types::RunReport) instead of being raised.

use thiserror::Error;

/// Required configuration is missing or invalid.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required setting `{key}` ({hint})")]
    Missing { key: &'static str, hint: &'static str },

    #[error("invalid setting `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Tracking rows could not be retrieved or are malformed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DataSourceError {
    #[error("tracking data unavailable: {0}")]
    Unavailable(String),

    #[error("tracking data malformed: {0}")]
    Malformed(String),

    #[error("row {row}, column {column}: flag cell is not a boolean token (got {found})")]
    InvalidFlag {
        row: usize,
        column: usize,
        found: String,
    },

    #[error("row {row}, column {column}: expected text cell (got {found})")]
    InvalidCell {
        row: usize,
        column: usize,
        found: String,
    },

    #[error("row {row}: commit hash '{found}' is not a revision")]
    InvalidRevision { row: usize, found: String },
}

/// Failure reported by a [`SourceControl`](crate::io::git::SourceControl) adapter.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AdapterError {
    /// The version-control tool could not be invoked or the query itself failed.
    #[error("source control unavailable: {command}: {reason}")]
    Unavailable { command: String, reason: String },

    /// The bounded wait on the tool expired.
    #[error("source control timed out after {secs}s: {command}")]
    TimedOut { command: String, secs: u64 },

    /// The apply attempt failed in a way that matched no known marker.
    #[error("{diagnostic}")]
    Rejected { diagnostic: String },
}

impl AdapterError {
    /// True if the adapter itself is unusable and the run must halt.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Rejected { .. })
    }
}
