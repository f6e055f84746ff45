//! Stable exit codes for picker CLI commands.

/// Command succeeded (including "nothing to pick").
pub const OK: i32 = 0;
/// Configuration, tracking data or source control failed; nothing or only part of the run happened.
pub const FATAL: i32 = 1;
/// `picker pick` halted on a conflict that needs manual resolution.
pub const CONFLICT: i32 = 2;
/// `picker pick` completed but at least one entry failed to apply.
pub const PARTIAL: i32 = 3;
