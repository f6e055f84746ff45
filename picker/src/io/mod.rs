//! I/O adapters for picker commands.

pub mod config;
pub mod git;
pub mod process;
pub mod sheet;
