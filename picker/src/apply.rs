//! Application engine: applies selected entries in order over a [`SourceControl`].
//!
//! Processing is strictly sequential. Each "already applied?" query is only
//! meaningful relative to every pick made earlier in the same run, so entries
//! are never reordered or run concurrently.

use tracing::{debug, info, warn};

use crate::core::types::{ApplicationOutcome, EntryRecord, RunReport, RunStatus, TrackingEntry};
use crate::error::AdapterError;
use crate::io::git::SourceControl;

/// Drives one run. Consumed by [`ApplicationEngine::run`]; holds no state across runs.
pub struct ApplicationEngine<'a, S: SourceControl + ?Sized> {
    adapter: &'a S,
    records: Vec<EntryRecord>,
}

/// Dry-run view of one selected entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedEntry {
    pub position: usize,
    pub entry: TrackingEntry,
    pub already_present: bool,
}

impl<'a, S: SourceControl + ?Sized> ApplicationEngine<'a, S> {
    pub fn new(adapter: &'a S) -> Self {
        Self {
            adapter,
            records: Vec::new(),
        }
    }

    /// Process `selection` in order, calling `on_outcome` as each record is produced.
    ///
    /// Stops at the first conflict (`HaltedOnConflict`) or the first fatal
    /// adapter failure (`HaltedOnAdapterFailure`). An empty selection completes
    /// immediately without touching the adapter.
    pub fn run<F: FnMut(&EntryRecord)>(
        mut self,
        selection: &[TrackingEntry],
        mut on_outcome: F,
    ) -> RunReport {
        if selection.is_empty() {
            debug!("empty selection, nothing to pick");
            return self.finish(RunStatus::Completed);
        }

        for (index, entry) in selection.iter().enumerate() {
            let position = index + 1;
            let step = self.process(entry);
            let (outcome, halt) = match step {
                Step::Record(outcome) => {
                    let halt = (outcome == ApplicationOutcome::Conflict)
                        .then_some(RunStatus::HaltedOnConflict);
                    (Some(outcome), halt)
                }
                Step::Fatal(err) => {
                    let status = RunStatus::HaltedOnAdapterFailure(err.to_string());
                    (None, Some(status))
                }
            };

            if let Some(outcome) = outcome {
                let record = EntryRecord {
                    position,
                    entry: entry.clone(),
                    outcome,
                };
                on_outcome(&record);
                self.records.push(record);
            }

            if let Some(status) = halt {
                warn!(position, identifier = %entry.identifier, ?status, "run halted");
                return self.finish(status);
            }
        }

        info!(processed = self.records.len(), "run completed");
        self.finish(RunStatus::Completed)
    }

    /// Presence check for every entry without applying anything.
    pub fn plan(self, selection: &[TrackingEntry]) -> Result<Vec<PlannedEntry>, AdapterError> {
        selection
            .iter()
            .enumerate()
            .map(|(index, entry)| -> Result<PlannedEntry, AdapterError> {
                Ok(PlannedEntry {
                    position: index + 1,
                    entry: entry.clone(),
                    already_present: self.adapter.is_already_applied(&entry.identifier)?,
                })
            })
            .collect()
    }

    fn process(&self, entry: &TrackingEntry) -> Step {
        match self.adapter.is_already_applied(&entry.identifier) {
            Ok(true) => {
                debug!(identifier = %entry.identifier, "already present");
                return Step::Record(ApplicationOutcome::AlreadyPresent);
            }
            Ok(false) => {}
            Err(err) => return Step::Fatal(err),
        }

        match self.adapter.apply_change(&entry.commit_hash) {
            Ok(result) => Step::Record(result.into()),
            Err(err) if err.is_fatal() => Step::Fatal(err),
            Err(err) => {
                warn!(identifier = %entry.identifier, error = %err, "apply failed");
                Step::Record(ApplicationOutcome::OtherFailure(err.to_string()))
            }
        }
    }

    fn finish(self, status: RunStatus) -> RunReport {
        debug!(records = self.records.len(), ?status, "run finished");
        RunReport {
            records: self.records,
            status,
        }
    }
}

enum Step {
    Record(ApplicationOutcome),
    Fatal(AdapterError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::ApplyResult;
    use crate::test_support::{
        Call, FakeHistory, ScriptedResponse, ScriptedSourceControl, entry, entry_with_hash,
    };

    #[test]
    fn empty_selection_completes_without_adapter_calls() {
        let adapter = ScriptedSourceControl::new(Vec::new());
        let report = ApplicationEngine::new(&adapter).run(&[], |_| {});
        assert_eq!(report.status, RunStatus::Completed);
        assert!(report.records.is_empty());
        assert!(adapter.calls().is_empty());
    }

    #[test]
    fn already_present_entry_is_not_applied() {
        let adapter = ScriptedSourceControl::new(vec![ScriptedResponse::Present(true)]);
        let selection = vec![entry("42", true, false, false)];
        let report = ApplicationEngine::new(&adapter).run(&selection, |_| {});
        assert_eq!(report.records[0].outcome, ApplicationOutcome::AlreadyPresent);
        assert_eq!(adapter.calls(), vec![Call::IsApplied("42".to_string())]);
        adapter.assert_drained().expect("drained");
    }

    #[test]
    fn conflict_halts_remaining_entries() {
        let adapter = ScriptedSourceControl::new(vec![
            ScriptedResponse::Present(false),
            ScriptedResponse::Apply(Ok(ApplyResult::Applied)),
            ScriptedResponse::Present(false),
            ScriptedResponse::Apply(Ok(ApplyResult::Conflict)),
        ]);
        let selection = vec![
            entry("1", true, false, false),
            entry("2", true, false, false),
            entry("3", true, false, false),
        ];
        let report = ApplicationEngine::new(&adapter).run(&selection, |_| {});
        assert_eq!(report.status, RunStatus::HaltedOnConflict);
        assert_eq!(report.records.len(), 2);
        assert_eq!(report.records[1].outcome, ApplicationOutcome::Conflict);
        assert!(
            !adapter
                .calls()
                .iter()
                .any(|call| *call == Call::IsApplied("3".to_string()))
        );
        adapter.assert_drained().expect("drained");
    }

    #[test]
    fn rejected_apply_is_recorded_and_run_continues() {
        let adapter = ScriptedSourceControl::new(vec![
            ScriptedResponse::Present(false),
            ScriptedResponse::Apply(Err(AdapterError::Rejected {
                diagnostic: "fatal: bad object deadbeef".to_string(),
            })),
            ScriptedResponse::Present(false),
            ScriptedResponse::Apply(Ok(ApplyResult::NoOpClean)),
        ]);
        let selection = vec![entry("1", true, false, false), entry("2", true, false, false)];
        let report = ApplicationEngine::new(&adapter).run(&selection, |_| {});
        assert_eq!(report.status, RunStatus::Completed);
        assert_eq!(
            report.records[0].outcome,
            ApplicationOutcome::OtherFailure("fatal: bad object deadbeef".to_string())
        );
        assert_eq!(report.records[1].outcome, ApplicationOutcome::NoOpClean);
        assert!(report.has_failures());
    }

    #[test]
    fn unavailable_adapter_halts_with_distinct_status() {
        let adapter = ScriptedSourceControl::new(vec![ScriptedResponse::PresentErr(
            AdapterError::Unavailable {
                command: "git log".to_string(),
                reason: "not a git repository".to_string(),
            },
        )]);
        let selection = vec![entry("1", true, false, false), entry("2", true, false, false)];
        let report = ApplicationEngine::new(&adapter).run(&selection, |_| {});
        assert!(matches!(
            report.status,
            RunStatus::HaltedOnAdapterFailure(ref msg) if msg.contains("not a git repository")
        ));
        assert!(report.records.is_empty());
    }

    #[test]
    fn timed_out_apply_halts() {
        let adapter = ScriptedSourceControl::new(vec![
            ScriptedResponse::Present(false),
            ScriptedResponse::Apply(Err(AdapterError::TimedOut {
                command: "git cherry-pick abc".to_string(),
                secs: 1,
            })),
        ]);
        let selection = vec![entry("1", true, false, false), entry("2", true, false, false)];
        let report = ApplicationEngine::new(&adapter).run(&selection, |_| {});
        assert!(matches!(report.status, RunStatus::HaltedOnAdapterFailure(_)));
        adapter.assert_drained().expect("drained");
    }

    #[test]
    fn callback_sees_each_record_in_order() {
        let adapter = ScriptedSourceControl::new(vec![
            ScriptedResponse::Present(true),
            ScriptedResponse::Present(false),
            ScriptedResponse::Apply(Ok(ApplyResult::Applied)),
        ]);
        let selection = vec![entry("a", true, false, false), entry("b", true, false, false)];
        let mut seen = Vec::new();
        ApplicationEngine::new(&adapter).run(&selection, |record| {
            seen.push((record.position, record.entry.identifier.clone()));
        });
        assert_eq!(seen, vec![(1, "a".to_string()), (2, "b".to_string())]);
    }

    #[test]
    fn second_run_never_reapplies() {
        let history = FakeHistory::default();
        let selection = vec![
            entry_with_hash("10", "h10"),
            entry_with_hash("11", "h11"),
            entry_with_hash("12", "h12"),
        ];
        for e in &selection {
            history.register(&e.commit_hash, &e.identifier);
        }

        let first = ApplicationEngine::new(&history).run(&selection, |_| {});
        assert!(
            first
                .records
                .iter()
                .all(|r| r.outcome == ApplicationOutcome::Applied)
        );

        let second = ApplicationEngine::new(&history).run(&selection, |_| {});
        assert_eq!(second.status, RunStatus::Completed);
        assert!(second.records.iter().all(|r| matches!(
            r.outcome,
            ApplicationOutcome::AlreadyPresent | ApplicationOutcome::NoOpClean
        )));
        assert_eq!(history.apply_count(), 3);
    }

    #[test]
    fn plan_reports_presence_without_applying() {
        let adapter = ScriptedSourceControl::new(vec![
            ScriptedResponse::Present(true),
            ScriptedResponse::Present(false),
        ]);
        let selection = vec![entry("1", true, false, false), entry("2", true, false, false)];
        let planned = ApplicationEngine::new(&adapter).plan(&selection).expect("plan");
        assert!(planned[0].already_present);
        assert!(!planned[1].already_present);
        assert!(
            adapter
                .calls()
                .iter()
                .all(|call| matches!(call, Call::IsApplied(_)))
        );
    }
}
