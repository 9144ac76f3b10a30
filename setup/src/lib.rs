//! Plugin activation settings merge engine.
//!
//! Adds plugin activations to a host application's JSON settings file without
//! losing or corrupting anything already in it. The crate keeps a strict
//! separation:
//!
//! - **[`core`]**: Pure, deterministic logic (identifier canonicalization,
//!   merge). No I/O.
//! - **[`io`]**: Reading the settings file and replacing it atomically.
//!
//! [`setup`] sequences the two and is the single entry point the CLI uses;
//! [`list`] is a read-only view of what is configured.

pub mod core;
pub mod error;
pub mod exit_codes;
pub mod io;
pub mod list;
pub mod logging;
pub mod setup;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
