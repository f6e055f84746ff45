//! Lifecycle-flag selection policy.

use crate::core::types::TrackingEntry;

/// An entry is eligible when it is deployable and has not yet progressed to
/// release-candidate or production.
pub fn is_eligible(entry: &TrackingEntry) -> bool {
    entry.deployable && !entry.release_candidate && !entry.production
}

/// Return the eligible entries in source order.
///
/// Ineligible entries are dropped silently. An empty result is a valid
/// "nothing to pick" outcome.
pub fn select(entries: &[TrackingEntry]) -> Vec<TrackingEntry> {
    entries
        .iter()
        .filter(|entry| is_eligible(entry))
        .cloned()
        .collect()
}
