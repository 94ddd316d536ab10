//! Guarded counter: the shared string that job bodies append to
//!
//! The value itself is always memory-safe to touch; an internal lock covers
//! each single load or store. What the [`ToggleableMutex`] decides is whether
//! a whole append is serialized. An append is a sequence of read-copy-write
//! steps, one per character, with a window between the read and the write.
//! Unserialized appends that overlap in that window lose characters or
//! interleave them, which is the race this crate exists to show.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use crate::error::CtlResult;
use crate::toggle::{ToggleableMutex, DEFAULT_LOCK_POLL};
use crate::traits::Checkpoint;

/// Default initial value
pub const DEFAULT_VALUE: &str = "retro+";

pub struct GuardedCounter {
    default: String,
    value: Mutex<String>,
    guard: ToggleableMutex,
}

impl GuardedCounter {
    pub fn new(default: impl Into<String>, guard_enabled: bool) -> Self {
        Self::with_guard(default, ToggleableMutex::with_poll(guard_enabled, DEFAULT_LOCK_POLL))
    }

    pub fn with_guard(default: impl Into<String>, guard: ToggleableMutex) -> Self {
        let default = default.into();
        Self {
            value: Mutex::new(default.clone()),
            default,
            guard,
        }
    }

    fn slot(&self) -> MutexGuard<'_, String> {
        self.value.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Snapshot of the current value
    pub fn value(&self) -> String {
        self.slot().clone()
    }

    pub fn default_value(&self) -> &str {
        &self.default
    }

    /// Restore the default value
    ///
    /// Not serialized with appends: an append in flight may write its stale
    /// read back over the reset.
    pub fn reset(&self) {
        *self.slot() = self.default.clone();
    }

    #[inline]
    pub fn guard(&self) -> &ToggleableMutex {
        &self.guard
    }

    /// Append `fragment` as read-copy-write steps
    ///
    /// Between reading the value and writing it back, the caller passes
    /// through `unit`'s checkpoint and waits `window` (a bare yield when
    /// zero). Callers that want the append atomic must hold a guard from
    /// [`GuardedCounter::guard`].
    pub fn append(&self, fragment: &str, window: Duration, unit: &dyn Checkpoint) -> CtlResult<()> {
        for ch in fragment.chars() {
            let mut next = self.value();
            if window.is_zero() {
                unit.checkpoint()?;
                std::thread::yield_now();
            } else {
                unit.sleep(window)?;
            }
            next.push(ch);
            *self.slot() = next;
        }
        Ok(())
    }
}

impl Default for GuardedCounter {
    fn default() -> Self {
        Self::new(DEFAULT_VALUE, false)
    }
}

impl std::fmt::Debug for GuardedCounter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GuardedCounter")
            .field("value", &self.value())
            .field("guard", &self.guard)
            .finish()
    }
}
