//! Shared deterministic types for picker core logic.
//!
//! These types define stable contracts between the selection policy, the
//! application engine and the reporter. They carry no I/O and are never
//! mutated once constructed from tracking data.

use serde::Serialize;

/// One parsed row of the tracking table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackingEntry {
    /// External reference number, used for display and history lookups.
    pub identifier: String,
    /// Revision to cherry-pick.
    pub commit_hash: String,
    pub title: String,
    pub author: String,
    pub deployable: bool,
    pub release_candidate: bool,
    pub production: bool,
}

/// Classified result of a single apply attempt, as reported by the adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplyResult {
    /// The change was applied and recorded on the branch tip.
    Applied,
    /// The change is already reflected in the tree; nothing was committed.
    NoOpClean,
    /// The change conflicts with the tree; the tree is left conflicted.
    Conflict,
}

/// Per-entry outcome recorded by the application engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "message")]
pub enum ApplicationOutcome {
    AlreadyPresent,
    Applied,
    NoOpClean,
    Conflict,
    OtherFailure(String),
}

impl From<ApplyResult> for ApplicationOutcome {
    fn from(result: ApplyResult) -> Self {
        match result {
            ApplyResult::Applied => Self::Applied,
            ApplyResult::NoOpClean => Self::NoOpClean,
            ApplyResult::Conflict => Self::Conflict,
        }
    }
}

/// Terminal status of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "message")]
pub enum RunStatus {
    /// Every selected entry was processed.
    Completed,
    /// An entry conflicted; later entries were not attempted.
    HaltedOnConflict,
    /// Source control could not be used at all; later entries were not attempted.
    HaltedOnAdapterFailure(String),
}

/// Outcome of one entry, with its 1-indexed position in the selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryRecord {
    pub position: usize,
    pub entry: TrackingEntry,
    pub outcome: ApplicationOutcome,
}

/// Ordered record of a run plus its terminal status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub records: Vec<EntryRecord>,
    pub status: RunStatus,
}

impl RunReport {
    /// Number of entries whose outcome matches `predicate`.
    pub fn count(&self, predicate: impl Fn(&ApplicationOutcome) -> bool) -> usize {
        self.records
            .iter()
            .filter(|record| predicate(&record.outcome))
            .count()
    }

    /// True if any entry ended in `OtherFailure`.
    pub fn has_failures(&self) -> bool {
        self.count(|outcome| matches!(outcome, ApplicationOutcome::OtherFailure(_))) > 0
    }
}
