//! Deterministic, pure logic for the settings merge.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! data structures and return deterministic outputs suitable for tests.

pub mod merge;
pub mod plugin_id;
pub mod types;
