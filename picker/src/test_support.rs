//! Test-only helpers: entry builders, scripted adapters and temporary git repos.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result, anyhow};
use serde_json::{Value, json};
use tempfile::TempDir;

use crate::core::types::{ApplyResult, TrackingEntry};
use crate::error::AdapterError;
use crate::io::git::SourceControl;

/// Create a deterministic entry with explicit lifecycle flags.
pub fn entry(id: &str, deployable: bool, release_candidate: bool, production: bool) -> TrackingEntry {
    TrackingEntry {
        identifier: id.to_string(),
        commit_hash: format!("{id}0000000000"),
        title: format!("{id} title"),
        author: "dev".to_string(),
        deployable,
        release_candidate,
        production,
    }
}

/// Create an eligible entry with an explicit commit hash.
pub fn entry_with_hash(id: &str, hash: &str) -> TrackingEntry {
    TrackingEntry {
        commit_hash: hash.to_string(),
        ..entry(id, true, false, false)
    }
}

/// Sheet row for `entry`, in tracking-table column order.
pub fn sheet_row(entry: &TrackingEntry) -> Value {
    let flag = |b: bool| if b { "TRUE" } else { "FALSE" };
    json!([
        entry.identifier,
        entry.title,
        "",
        entry.author,
        "",
        entry.commit_hash,
        "",
        flag(entry.deployable),
        flag(entry.release_candidate),
        flag(entry.production)
    ])
}

/// `ValueRange` document (header + rows) for a file source.
pub fn value_range(entries: &[TrackingEntry]) -> Value {
    let mut values = vec![json!([
        "Number", "Title", "Status", "Author", "Reviewer", "Hash", "Notes", "Deployable", "RC",
        "Production"
    ])];
    values.extend(entries.iter().map(sheet_row));
    json!({ "range": "Tracking!A1:J", "majorDimension": "ROWS", "values": values })
}

/// Adapter call observed by [`ScriptedSourceControl`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    IsApplied(String),
    Apply(String),
}

/// Queued response for the next adapter call.
#[derive(Debug, Clone)]
pub enum ScriptedResponse {
    Present(bool),
    PresentErr(AdapterError),
    Apply(Result<ApplyResult, AdapterError>),
}

/// Adapter that replays queued responses in order and records every call.
pub struct ScriptedSourceControl {
    queue: RefCell<VecDeque<ScriptedResponse>>,
    calls: RefCell<Vec<Call>>,
}

impl ScriptedSourceControl {
    pub fn new(responses: Vec<ScriptedResponse>) -> Self {
        Self {
            queue: RefCell::new(responses.into()),
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn assert_drained(&self) -> Result<()> {
        let remaining = self.queue.borrow().len();
        if remaining == 0 {
            Ok(())
        } else {
            Err(anyhow!("{remaining} scripted responses left unused"))
        }
    }

    fn next(&self) -> ScriptedResponse {
        self.queue
            .borrow_mut()
            .pop_front()
            .expect("no scripted response left")
    }
}

impl SourceControl for ScriptedSourceControl {
    fn is_already_applied(&self, identifier: &str) -> Result<bool, AdapterError> {
        self.calls
            .borrow_mut()
            .push(Call::IsApplied(identifier.to_string()));
        match self.next() {
            ScriptedResponse::Present(present) => Ok(present),
            ScriptedResponse::PresentErr(err) => Err(err),
            other => panic!("expected presence response, got {other:?}"),
        }
    }

    fn apply_change(&self, commit_hash: &str) -> Result<ApplyResult, AdapterError> {
        self.calls
            .borrow_mut()
            .push(Call::Apply(commit_hash.to_string()));
        match self.next() {
            ScriptedResponse::Apply(result) => result,
            other => panic!("expected apply response, got {other:?}"),
        }
    }
}

/// In-memory branch history: applying a hash records its identifier.
#[derive(Default)]
pub struct FakeHistory {
    changes: RefCell<HashMap<String, String>>,
    applied: RefCell<Vec<String>>,
    apply_calls: RefCell<usize>,
}

impl FakeHistory {
    /// Declare that `hash` carries the change referenced by `identifier`.
    pub fn register(&self, hash: &str, identifier: &str) {
        self.changes
            .borrow_mut()
            .insert(hash.to_string(), identifier.to_string());
    }

    pub fn apply_count(&self) -> usize {
        *self.apply_calls.borrow()
    }
}

impl SourceControl for FakeHistory {
    fn is_already_applied(&self, identifier: &str) -> Result<bool, AdapterError> {
        Ok(self.applied.borrow().iter().any(|id| id == identifier))
    }

    fn apply_change(&self, commit_hash: &str) -> Result<ApplyResult, AdapterError> {
        *self.apply_calls.borrow_mut() += 1;
        let identifier = self
            .changes
            .borrow()
            .get(commit_hash)
            .cloned()
            .ok_or_else(|| AdapterError::Rejected {
                diagnostic: format!("fatal: bad revision '{commit_hash}'"),
            })?;
        if self.applied.borrow().contains(&identifier) {
            return Ok(ApplyResult::NoOpClean);
        }
        self.applied.borrow_mut().push(identifier);
        Ok(ApplyResult::Applied)
    }
}

/// Temporary git repository with a `main` branch and a committed base file.
pub struct TestRepo {
    dir: TempDir,
}

impl TestRepo {
    pub fn new() -> Result<Self> {
        let dir = tempfile::tempdir().context("create tempdir")?;
        let repo = Self { dir };
        repo.git(&["init", "-q", "-b", "main"])?;
        repo.git(&["config", "user.name", "Picker Test"])?;
        repo.git(&["config", "user.email", "picker@example.com"])?;
        repo.git(&["config", "commit.gpgsign", "false"])?;
        repo.write_file("base.txt", "one\ntwo\nthree\n")?;
        repo.commit_all("chore: base")?;
        Ok(repo)
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn file_path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    pub fn write_file(&self, name: &str, contents: &str) -> Result<()> {
        let path = self.file_path(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create {}", parent.display()))?;
        }
        fs::write(&path, contents).with_context(|| format!("write {}", path.display()))
    }

    /// Stage everything and commit; returns the new HEAD hash.
    pub fn commit_all(&self, message: &str) -> Result<String> {
        self.git(&["add", "-A"])?;
        self.git(&["commit", "-q", "-m", message])?;
        self.head()
    }

    pub fn head(&self) -> Result<String> {
        Ok(self.git(&["rev-parse", "HEAD"])?.trim().to_string())
    }

    /// Run git in the repo and return stdout; errors on non-zero exit.
    pub fn git(&self, args: &[&str]) -> Result<String> {
        let output = Command::new("git")
            .args(args)
            .current_dir(self.dir.path())
            .output()
            .with_context(|| format!("spawn git {}", args.join(" ")))?;
        if !output.status.success() {
            return Err(anyhow!(
                "git {} failed: {}",
                args.join(" "),
                String::from_utf8_lossy(&output.stderr).trim()
            ));
        }
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    /// Number of commits reachable from HEAD.
    pub fn commit_count(&self) -> Result<usize> {
        Ok(self
            .git(&["rev-list", "--count", "HEAD"])?
            .trim()
            .parse()
            .context("parse commit count")?)
    }
}
