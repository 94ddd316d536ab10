//! Library defaults for `SimulationConfig`

/// Job body sleep, milliseconds
pub const SLEEP_MS: u64 = 500;

/// Accepted sleep range, milliseconds (inclusive)
pub const SLEEP_MS_MIN: u64 = 100;
pub const SLEEP_MS_MAX: u64 = 2000;

/// Initial counter value
pub const COUNTER_DEFAULT: &str = "retro+";

/// Guard switch at startup
pub const GUARD_ENABLED: bool = false;

/// Read-to-write window per appended character, microseconds
pub const APPEND_WINDOW_US: u64 = 1000;

/// How often a unit waiting on the guard re-checks its checkpoint
pub const LOCK_POLL_MS: u64 = 10;

/// Event journal capacity
pub const JOURNAL_CAPACITY: usize = 1024;
