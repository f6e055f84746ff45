//! Promote approved changes from a release-tracking table onto a git branch.
//!
//! Entries that are deployable but not yet release-candidate or production
//! are cherry-picked in table order. Entries already referenced in branch
//! history are skipped, and the first conflict stops the run for a human.
//!
//! - **[`core`]**: Pure, deterministic logic (row parsing, selection, output
//!   classification, rendering). No I/O.
//! - **[`io`]**: Side-effecting adapters (config, git subprocesses, tracking
//!   data sources). Isolated behind traits so tests can script them.
//!
//! [`select`] and [`apply`] coordinate the two to implement the CLI commands.

pub mod apply;
pub mod core;
pub mod error;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod select;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
