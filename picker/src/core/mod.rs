//! Deterministic, pure logic shared by the picker commands.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! data and return deterministic outputs suitable for tests.

pub mod classifier;
pub mod parse;
pub mod report;
pub mod selection;
pub mod types;
