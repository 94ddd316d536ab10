//! Simulation configuration
//!
//! Compile-time defaults with runtime environment overrides, plus the one
//! knob that stays live after construction: the job sleep duration. Job
//! bodies hold the config by reference and read the sleep at the moment
//! they sleep, so a change reaches in-flight and future bodies alike.
//!
//! # Example
//!
//! ```rust,ignore
//! use ctlthread_runtime::config::SimulationConfig;
//!
//! let config = SimulationConfig::from_env().sleep_ms(250).guard_enabled(true);
//! config.validate()?;
//! ```

pub mod defaults;

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use ctlthread_core::env::{env_get, env_get_bool, env_get_str};
use ctlthread_core::{kprintln, ConfigError};

#[derive(Debug)]
pub struct SimulationConfig {
    /// Job body sleep in milliseconds; live
    sleep_ms: AtomicU64,
    /// Counter value at startup and after reset
    pub counter_default: String,
    /// Guard switch at startup
    pub guard_enabled: bool,
    /// Read-to-write window of each appended character
    pub append_window: Duration,
    /// Checkpoint interval of a unit waiting on the guard
    pub lock_poll: Duration,
    /// Event journal capacity
    pub journal_capacity: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

impl SimulationConfig {
    /// Defaults with environment overrides.
    ///
    /// Environment variables (all optional):
    /// - `CTL_SLEEP_MS` - job body sleep in milliseconds
    /// - `CTL_COUNTER_DEFAULT` - initial counter value
    /// - `CTL_GUARD` - start with the guard enabled (0/1)
    /// - `CTL_APPEND_WINDOW_US` - per-character append window
    /// - `CTL_LOCK_POLL_MS` - guard wait checkpoint interval
    /// - `CTL_JOURNAL_CAPACITY` - event journal capacity
    pub fn from_env() -> Self {
        Self {
            sleep_ms: AtomicU64::new(env_get("CTL_SLEEP_MS", defaults::SLEEP_MS)),
            counter_default: env_get_str("CTL_COUNTER_DEFAULT", defaults::COUNTER_DEFAULT),
            guard_enabled: env_get_bool("CTL_GUARD", defaults::GUARD_ENABLED),
            append_window: Duration::from_micros(env_get(
                "CTL_APPEND_WINDOW_US",
                defaults::APPEND_WINDOW_US,
            )),
            lock_poll: Duration::from_millis(env_get("CTL_LOCK_POLL_MS", defaults::LOCK_POLL_MS)),
            journal_capacity: env_get("CTL_JOURNAL_CAPACITY", defaults::JOURNAL_CAPACITY),
        }
    }

    /// Library defaults, no environment lookup. Useful for tests.
    pub fn new() -> Self {
        Self {
            sleep_ms: AtomicU64::new(defaults::SLEEP_MS),
            counter_default: defaults::COUNTER_DEFAULT.to_string(),
            guard_enabled: defaults::GUARD_ENABLED,
            append_window: Duration::from_micros(defaults::APPEND_WINDOW_US),
            lock_poll: Duration::from_millis(defaults::LOCK_POLL_MS),
            journal_capacity: defaults::JOURNAL_CAPACITY,
        }
    }

    // Builder methods

    /// Unchecked; `validate()` reports an out-of-range value
    pub fn sleep_ms(self, ms: u64) -> Self {
        self.sleep_ms.store(ms, Ordering::Relaxed);
        self
    }

    pub fn counter_default(mut self, value: impl Into<String>) -> Self {
        self.counter_default = value.into();
        self
    }

    pub fn guard_enabled(mut self, enabled: bool) -> Self {
        self.guard_enabled = enabled;
        self
    }

    pub fn append_window(mut self, d: Duration) -> Self {
        self.append_window = d;
        self
    }

    pub fn lock_poll(mut self, d: Duration) -> Self {
        self.lock_poll = d;
        self
    }

    pub fn journal_capacity(mut self, cap: usize) -> Self {
        self.journal_capacity = cap;
        self
    }

    // Live knob

    /// Current job sleep, read fresh on every call
    #[inline]
    pub fn sleep_duration(&self) -> Duration {
        Duration::from_millis(self.sleep_ms.load(Ordering::Relaxed))
    }

    #[inline]
    pub fn sleep_ms_value(&self) -> u64 {
        self.sleep_ms.load(Ordering::Relaxed)
    }

    /// Change the job sleep; `ms` must lie in `[SLEEP_MS_MIN, SLEEP_MS_MAX]`
    pub fn set_sleep_ms(&self, ms: u64) -> Result<(), ConfigError> {
        check_sleep_ms(ms)?;
        self.sleep_ms.store(ms, Ordering::Relaxed);
        Ok(())
    }

    /// Validate configuration and return the first problem found
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_sleep_ms(self.sleep_ms_value())?;
        if self.lock_poll.is_zero() {
            return Err(ConfigError::InvalidValue("lock_poll must be > 0"));
        }
        if self.journal_capacity == 0 {
            return Err(ConfigError::InvalidValue("journal_capacity must be > 0"));
        }
        Ok(())
    }

    /// Print configuration (for debugging)
    pub fn print(&self) {
        kprintln!("ctlthread configuration:");
        kprintln!("  sleep_ms:          {}", self.sleep_ms_value());
        kprintln!("  counter_default:   {:?}", self.counter_default);
        kprintln!("  guard_enabled:     {}", self.guard_enabled);
        kprintln!("  append_window:     {:?}", self.append_window);
        kprintln!("  lock_poll:         {:?}", self.lock_poll);
        kprintln!("  journal_capacity:  {}", self.journal_capacity);
    }
}

fn check_sleep_ms(ms: u64) -> Result<(), ConfigError> {
    if !(defaults::SLEEP_MS_MIN..=defaults::SLEEP_MS_MAX).contains(&ms) {
        return Err(ConfigError::OutOfRange {
            name: "sleep_ms",
            value: ms,
            min: defaults::SLEEP_MS_MIN,
            max: defaults::SLEEP_MS_MAX,
        });
    }
    Ok(())
}
