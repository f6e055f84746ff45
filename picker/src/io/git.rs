//! Git adapter for history lookups and cherry-picks.
//!
//! The application engine only sees the [`SourceControl`] trait; this module
//! owns the subprocess calls and the raw-output markers that classify them.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use anyhow::{Context, Result};
use minijinja::{Environment, context};
use tracing::{debug, info, instrument, warn};

use crate::core::classifier::{Classification, OutcomeMarkers};
use crate::core::types::ApplyResult;
use crate::error::AdapterError;
use crate::io::config::GitConfig;
use crate::io::process::{CommandOutput, SpawnError, run_command_with_timeout};

/// The two version-control primitives the application engine needs.
pub trait SourceControl {
    /// True iff the branch history already references `identifier`.
    fn is_already_applied(&self, identifier: &str) -> Result<bool, AdapterError>;

    /// Apply the change `commit_hash` onto the current branch tip.
    ///
    /// Unclassified failures are returned as [`AdapterError::Rejected`].
    fn apply_change(&self, commit_hash: &str) -> Result<ApplyResult, AdapterError>;
}

/// Wrapper for executing git commands in a working directory.
#[derive(Debug)]
pub struct Git {
    workdir: PathBuf,
    timeout: Duration,
    output_limit_bytes: usize,
    markers: OutcomeMarkers,
    templates: Environment<'static>,
    reference_template: String,
}

impl Git {
    pub fn new(workdir: impl Into<PathBuf>, config: &GitConfig) -> Result<Self> {
        let markers = OutcomeMarkers::compile(&config.conflict_markers, &config.no_op_markers)?;
        let templates = Environment::new();
        templates
            .template_from_str(&config.reference_template)
            .context("parse git.reference_template")?;
        Ok(Self {
            workdir: workdir.into(),
            timeout: Duration::from_secs(config.timeout_secs),
            output_limit_bytes: config.output_limit_bytes,
            markers,
            templates,
            reference_template: config.reference_template.clone(),
        })
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// Text searched for in commit messages to detect a prior pick of `identifier`.
    pub fn history_reference(&self, identifier: &str) -> Result<String> {
        let rendered = self
            .templates
            .render_str(&self.reference_template, context! { identifier })
            .with_context(|| format!("render history reference for {identifier}"))?;
        Ok(rendered)
    }

    /// True while a cherry-pick is in progress (`CHERRY_PICK_HEAD` exists).
    fn cherry_pick_in_progress(&self) -> Result<bool, AdapterError> {
        let args = ["rev-parse", "-q", "--verify", "CHERRY_PICK_HEAD"];
        let output = self.run(&args)?;
        Ok(output.status.success())
    }

    fn run(&self, args: &[&str]) -> Result<CommandOutput, AdapterError> {
        let command = format!("git {}", args.join(" "));
        let mut cmd = Command::new("git");
        cmd.args(args).current_dir(&self.workdir);
        let output = run_command_with_timeout(cmd, self.timeout, self.output_limit_bytes)
            .map_err(|err| AdapterError::Unavailable {
                command: command.clone(),
                reason: match err.downcast_ref::<SpawnError>() {
                    Some(spawn) => spawn.to_string(),
                    None => format!("{err:#}"),
                },
            })?;
        if output.timed_out {
            return Err(AdapterError::TimedOut {
                command,
                secs: self.timeout.as_secs(),
            });
        }
        Ok(output)
    }
}

impl SourceControl for Git {
    #[instrument(skip_all, fields(identifier))]
    fn is_already_applied(&self, identifier: &str) -> Result<bool, AdapterError> {
        let reference =
            self.history_reference(identifier)
                .map_err(|err| AdapterError::Unavailable {
                    command: "render history reference".to_string(),
                    reason: format!("{err:#}"),
                })?;
        let grep = format!("--grep={reference}");
        let args = ["log", "--oneline", "--fixed-strings", grep.as_str()];
        let output = self.run(&args)?;
        if !output.success() {
            warn!(exit_code = ?output.status.code(), "history search failed");
            return Err(AdapterError::Unavailable {
                command: format!("git {}", args.join(" ")),
                reason: output.stderr_text().trim().to_string(),
            });
        }
        let found = !output.stdout_text().trim().is_empty();
        debug!(%reference, found, "history search");
        Ok(found)
    }

    #[instrument(skip_all, fields(commit_hash))]
    fn apply_change(&self, commit_hash: &str) -> Result<ApplyResult, AdapterError> {
        if commit_hash.is_empty() || commit_hash.starts_with('-') {
            return Err(AdapterError::Rejected {
                diagnostic: format!("invalid commit hash '{commit_hash}'"),
            });
        }
        let output = self.run(&["cherry-pick", "--end-of-options", commit_hash])?;
        let text = output.combined_text();
        match self.markers.classify(output.success(), &text) {
            Classification::Known(ApplyResult::NoOpClean) => {
                if self.cherry_pick_in_progress()? {
                    debug!("skipping empty cherry-pick");
                    let skip = self.run(&["cherry-pick", "--skip"])?;
                    if !skip.success() {
                        return Err(AdapterError::Rejected {
                            diagnostic: skip.combined_text().trim().to_string(),
                        });
                    }
                }
                Ok(ApplyResult::NoOpClean)
            }
            Classification::Known(result) => {
                info!(?result, "cherry-pick finished");
                Ok(result)
            }
            Classification::Unrecognized => {
                warn!(exit_code = ?output.status.code(), "cherry-pick failed");
                Err(AdapterError::Rejected {
                    diagnostic: text.trim().to_string(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_reference_wraps_identifier() {
        let git = Git::new("/tmp", &GitConfig::default()).expect("git");
        assert_eq!(git.history_reference("42").expect("render"), "(#42)");
    }

    #[test]
    fn custom_reference_template() {
        let config = GitConfig {
            reference_template: "Refs: TRACK-{{ identifier }}".to_string(),
            ..GitConfig::default()
        };
        let git = Git::new("/tmp", &config).expect("git");
        assert_eq!(
            git.history_reference("7").expect("render"),
            "Refs: TRACK-7"
        );
    }

    #[test]
    fn empty_or_option_like_hash_is_rejected_without_running_git() {
        let temp = tempfile::tempdir().expect("tempdir");
        let git = Git::new(temp.path(), &GitConfig::default()).expect("git");
        for hash in ["", "--quit", "--abort"] {
            let err = git.apply_change(hash).expect_err("invalid hash");
            assert!(!err.is_fatal(), "{hash:?} should be per-entry");
            assert!(err.to_string().contains("invalid commit hash"));
        }
    }

    #[test]
    fn history_query_outside_repository_is_unavailable() {
        let temp = tempfile::tempdir().expect("tempdir");
        let git = Git::new(temp.path(), &GitConfig::default()).expect("git");
        let err = git.is_already_applied("1").expect_err("not a repo");
        assert!(err.is_fatal());
    }
}
