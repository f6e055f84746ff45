//! Deterministic classification of raw cherry-pick output.

use anyhow::{Context, Result};
use regex::Regex;

use crate::core::types::ApplyResult;

/// Marker patterns that identify conflicts and no-op applies in tool output.
#[derive(Debug, Clone)]
pub struct OutcomeMarkers {
    conflict: Vec<Regex>,
    no_op: Vec<Regex>,
}

/// Classification of one apply attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Known(ApplyResult),
    /// Failed without matching any marker.
    Unrecognized,
}

impl OutcomeMarkers {
    /// Compile marker patterns (regular expressions).
    pub fn compile<S: AsRef<str>>(conflict: &[S], no_op: &[S]) -> Result<Self> {
        Ok(Self {
            conflict: compile_all(conflict).context("compile conflict markers")?,
            no_op: compile_all(no_op).context("compile no-op markers")?,
        })
    }

    /// Classify an apply attempt.
    ///
    /// A successful exit is always `Applied`: on success git echoes the commit
    /// subject, which may itself contain a marker. On failure conflict markers
    /// are checked first, then no-op markers, otherwise `Unrecognized`.
    pub fn classify(&self, succeeded: bool, output: &str) -> Classification {
        if succeeded {
            return Classification::Known(ApplyResult::Applied);
        }
        if self.conflict.iter().any(|re| re.is_match(output)) {
            return Classification::Known(ApplyResult::Conflict);
        }
        if self.no_op.iter().any(|re| re.is_match(output)) {
            return Classification::Known(ApplyResult::NoOpClean);
        }
        Classification::Unrecognized
    }
}

fn compile_all<S: AsRef<str>>(patterns: &[S]) -> Result<Vec<Regex>> {
    patterns
        .iter()
        .map(|pattern| {
            let pattern = pattern.as_ref();
            Regex::new(pattern).with_context(|| format!("invalid marker pattern '{pattern}'"))
        })
        .collect()
}
