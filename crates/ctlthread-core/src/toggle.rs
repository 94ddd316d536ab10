//! Toggleable mutex
//!
//! A mutual-exclusion guard whose enforcement can be switched on and off
//! at runtime. With the switch off, `lock` hands out a guard that holds
//! nothing and releasing it does nothing, so callers run unserialized.
//!
//! The switch is sampled once per `lock` call. Flipping it while a guard is
//! out does not affect that guard: a held guard still releases, a bypass
//! guard still releases nothing.
//!
//! # Poisoning
//!
//! A holder that is terminated abandons its guard instead of dropping it
//! (see [`ToggleGuard::abandon`]). The mutex then stays locked for good and
//! every later acquisition fails with `CtlError::GuardPoisoned` instead of
//! waiting forever. There is no way to clear it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use crate::error::{CtlError, CtlResult};
use crate::id::CtlThreadId;
use crate::traits::Checkpoint;

/// Default interval at which a waiter re-checks its checkpoint
pub const DEFAULT_LOCK_POLL: Duration = Duration::from_millis(10);

#[derive(Debug, Default)]
struct LockState {
    holder: Option<CtlThreadId>,
    poisoned: bool,
}

pub struct ToggleableMutex {
    enabled: AtomicBool,
    state: Mutex<LockState>,
    released: Condvar,
    poll: Duration,
}

impl ToggleableMutex {
    pub fn new(enabled: bool) -> Self {
        Self::with_poll(enabled, DEFAULT_LOCK_POLL)
    }

    /// `poll` bounds how long a waiter goes without reaching its checkpoint,
    /// i.e. how quickly a blocked unit reacts to pause or terminate.
    pub fn with_poll(enabled: bool, poll: Duration) -> Self {
        Self {
            enabled: AtomicBool::new(enabled),
            state: Mutex::new(LockState::default()),
            released: Condvar::new(),
            poll: poll.max(Duration::from_millis(1)),
        }
    }

    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Release);
    }

    fn state(&self) -> MutexGuard<'_, LockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Acquire on behalf of `unit`
    ///
    /// Waits while another unit holds the guard, passing through `unit`'s
    /// checkpoint every poll interval so the waiter can still be paused or
    /// terminated.
    pub fn lock<'a>(&'a self, unit: &dyn Checkpoint) -> CtlResult<ToggleGuard<'a>> {
        if !self.is_enabled() {
            return Ok(ToggleGuard { mutex: self, held: false });
        }

        loop {
            {
                let mut st = self.state();
                if st.holder.is_none() {
                    st.holder = Some(unit.id());
                    return Ok(ToggleGuard { mutex: self, held: true });
                }
                if st.poisoned {
                    return Err(CtlError::GuardPoisoned);
                }
                let (st, _) = self
                    .released
                    .wait_timeout(st, self.poll)
                    .unwrap_or_else(PoisonError::into_inner);
                if st.holder.is_none() {
                    continue;
                }
                if st.poisoned {
                    return Err(CtlError::GuardPoisoned);
                }
            }
            // Never park with the state lock held
            unit.checkpoint()?;
        }
    }

    pub fn is_locked(&self) -> bool {
        self.state().holder.is_some()
    }

    pub fn is_poisoned(&self) -> bool {
        self.state().poisoned
    }

    /// Current holder, if any
    pub fn holder(&self) -> Option<CtlThreadId> {
        self.state().holder
    }

    fn release(&self) {
        let mut st = self.state();
        st.holder = None;
        drop(st);
        self.released.notify_one();
    }

    fn poison(&self) {
        let mut st = self.state();
        st.poisoned = true;
        drop(st);
        self.released.notify_all();
    }
}

impl Default for ToggleableMutex {
    fn default() -> Self {
        Self::new(false)
    }
}

impl std::fmt::Debug for ToggleableMutex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let st = self.state();
        f.debug_struct("ToggleableMutex")
            .field("enabled", &self.is_enabled())
            .field("holder", &st.holder)
            .field("poisoned", &st.poisoned)
            .finish()
    }
}

/// Guard returned by [`ToggleableMutex::lock`]
///
/// Releases the mutex when dropped if it actually holds it.
#[must_use = "dropping the guard releases the mutex immediately"]
pub struct ToggleGuard<'a> {
    mutex: &'a ToggleableMutex,
    held: bool,
}

impl<'a> ToggleGuard<'a> {
    /// Whether this guard serializes anything (switch was on at lock time)
    #[inline]
    pub fn is_held(&self) -> bool {
        self.held
    }

    /// Give the guard up without releasing it
    ///
    /// Models a holder that stops existing mid-critical-section: the mutex
    /// stays locked and is marked poisoned. A bypass guard has nothing to
    /// abandon. Returns whether the mutex was poisoned.
    pub fn abandon(mut self) -> bool {
        let held = self.held;
        if held {
            self.mutex.poison();
            self.held = false;
        }
        held
    }
}

impl<'a> Drop for ToggleGuard<'a> {
    fn drop(&mut self) {
        if self.held {
            self.mutex.release();
        }
    }
}
