//! Stable exit codes for the setup CLI.

/// Command succeeded.
pub const OK: i32 = 0;
/// Setup failed (malformed settings, permissions, I/O, invalid identifier).
pub const FAILED: i32 = 1;
