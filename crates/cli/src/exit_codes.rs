//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract; scripts rely on them.
//!
//! | Code | Meaning                                               |
//! |------|-------------------------------------------------------|
//! | 0    | Success                                               |
//! | 1    | Backing store write failed (nothing or part applied)  |
//! | 2    | Usage error (bad args, unknown setting, invalid value)|
//! | 3    | Configuration error (store paths cannot be resolved)  |
//!
//! Reads never fail: an unreadable store prints defaults and exits 0.
//! An unreadable or invalid `cli.toml` is logged and ignored, not an error.

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// The backing store rejected a write. A batch may be partially applied.
pub const EXIT_STORE: u8 = 1;

/// Usage error - bad arguments, unknown setting name, value of the wrong kind.
/// Matches clap's own exit code for argument errors.
pub const EXIT_USAGE: u8 = 2;

/// Store locations could not be resolved.
pub const EXIT_CONFIG: u8 = 3;
