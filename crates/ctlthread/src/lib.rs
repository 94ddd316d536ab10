//! # ctlthread - Controllable Threads
//!
//! Worker threads that a control surface can run, pause, resume, terminate
//! and join one by one or in bulk, all appending to one shared string
//! whose guard can be switched off to make the race visible.
//!
//! ## Quick Start
//!
//! ```ignore
//! use ctlthread::{Simulation, SimulationConfig};
//!
//! let mut sim = Simulation::new(SimulationConfig::from_env().guard_enabled(true))?;
//! for _ in 0..3 {
//!     sim.create_thread()?;
//! }
//! sim.run_all();
//! sim.join_all();
//! println!("{}", sim.get_counter_value()); // retro+012 in some order
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                   Control surface                    │
//! │        console, race demo, tests (Simulation)        │
//! └──────────────────────────────────────────────────────┘
//!                            │
//!                            ▼
//! ┌──────────────────────────────────────────────────────┐
//! │                   ThreadRegistry                     │
//! │   CtlThread × N, bulk ops, shared config + journal   │
//! └──────────────────────────────────────────────────────┘
//!          │                                  │
//!          ▼                                  ▼
//!   ┌─────────────┐                   ┌───────────────┐
//!   │  OS thread  │  ── append ──►    │ GuardedCounter│
//!   │ ControlBlock│                   │ToggleableMutex│
//!   └─────────────┘                   └───────────────┘
//! ```
//!
//! ## Hazard
//!
//! Terminating a thread that holds the guard leaves the guard locked for
//! the rest of the process. Later acquisitions fail with
//! [`CtlError::GuardPoisoned`]; `reset_counter` does not clear it.

use std::time::Duration;

// Re-export core types
pub use ctlthread_core::{
    CtlThreadId,
    CtlThreadState,
    Priority,
    ParsePriorityError,
    CtlError,
    CtlResult,
    ConfigError,
    EventKind,
    ThreadEvent,
};

// Re-export kprint macros for debug logging
pub use ctlthread_core::{kprintln, kerror, kwarn, kinfo, kdebug, ktrace};
pub use ctlthread_core::kprint::{LogLevel, init as init_logging, set_log_level, set_flush_enabled, set_time_enabled};

// Re-export env utilities
pub use ctlthread_core::{env_get, env_get_bool, env_get_opt, env_get_str};

// Re-export runtime types
pub use ctlthread_runtime::{BulkReport, CtlThread, SimulationConfig, ThreadRegistry};
pub use ctlthread_runtime::config::defaults;

/// One registry row as a control surface renders it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadView {
    pub index: usize,
    pub id: CtlThreadId,
    pub argument: usize,
    pub state: CtlThreadState,
    pub priority: Priority,
}

impl ThreadView {
    pub fn is_running(&self) -> bool {
        self.state == CtlThreadState::Running
    }

    pub fn is_paused(&self) -> bool {
        self.state == CtlThreadState::Paused
    }

    pub fn is_finished(&self) -> bool {
        self.state == CtlThreadState::Finished
    }
}

/// The operations a control surface issues, one call per user action
///
/// Entries are addressed by their current index in the registry, which
/// shifts down when an earlier entry is removed.
pub struct Simulation {
    registry: ThreadRegistry,
}

impl Simulation {
    /// Fails with `Config` when `config` does not validate, e.g. a sleep
    /// outside `[SLEEP_MS_MIN, SLEEP_MS_MAX]`
    pub fn new(config: SimulationConfig) -> CtlResult<Self> {
        ctlthread_core::kprint::init();
        Ok(Self { registry: ThreadRegistry::new(config)? })
    }

    pub fn registry(&self) -> &ThreadRegistry {
        &self.registry
    }

    /// Add an Idle thread; returns its index
    pub fn create_thread(&mut self) -> CtlResult<usize> {
        let thread = self.registry.add()?;
        kinfo!("created {} (arg {})", thread.id(), thread.argument());
        Ok(self.registry.len() - 1)
    }

    pub fn run(&self, i: usize) -> CtlResult<()> {
        self.registry.get(i)?.run()
    }

    pub fn join(&self, i: usize) -> CtlResult<()> {
        self.registry.get(i)?.join()
    }

    pub fn pause(&self, i: usize) -> CtlResult<()> {
        self.registry.get(i)?.pause()
    }

    pub fn resume(&self, i: usize) -> CtlResult<()> {
        self.registry.get(i)?.resume()
    }

    pub fn terminate(&self, i: usize) -> CtlResult<()> {
        self.registry.get(i)?.terminate()
    }

    /// Remove an Idle or Finished entry
    pub fn remove(&mut self, i: usize) -> CtlResult<()> {
        self.registry.remove(i)
    }

    pub fn set_priority(&self, i: usize, priority: Priority) -> CtlResult<()> {
        self.registry.get(i)?.set_priority(priority);
        Ok(())
    }

    /// Restore the counter's default value
    pub fn reset_counter(&self) {
        self.registry.counter().reset();
    }

    pub fn set_guard_enabled(&self, enabled: bool) {
        self.registry.counter().guard().set_enabled(enabled);
        kinfo!("guard {}", if enabled { "on" } else { "off" });
    }

    /// Change the shared job sleep; in-flight bodies see it at their next
    /// sleep
    pub fn set_sleep_duration(&self, ms: u64) -> CtlResult<()> {
        self.registry.config().set_sleep_ms(ms)?;
        Ok(())
    }

    pub fn run_all(&self) -> BulkReport {
        self.registry.run_all()
    }

    pub fn pause_all(&self) -> BulkReport {
        self.registry.pause_all()
    }

    pub fn resume_all(&self) -> BulkReport {
        self.registry.resume_all()
    }

    pub fn terminate_all(&self) -> BulkReport {
        self.registry.terminate_all()
    }

    pub fn join_all(&self) -> BulkReport {
        self.registry.join_all()
    }

    // Queries

    pub fn get_state(&self, i: usize) -> CtlResult<CtlThreadState> {
        Ok(self.registry.get(i)?.state())
    }

    pub fn get_priority(&self, i: usize) -> CtlResult<Priority> {
        Ok(self.registry.get(i)?.priority())
    }

    pub fn get_counter_value(&self) -> String {
        self.registry.counter().value()
    }

    pub fn get_guard_enabled(&self) -> bool {
        self.registry.counter().guard().is_enabled()
    }

    pub fn get_sleep_duration(&self) -> Duration {
        self.registry.config().sleep_duration()
    }

    pub fn count(&self) -> usize {
        self.registry.len()
    }

    /// True once a terminated holder left the guard locked
    pub fn guard_poisoned(&self) -> bool {
        self.registry.counter().guard().is_poisoned()
    }

    pub fn snapshot(&self) -> Vec<ThreadView> {
        self.registry
            .iter()
            .enumerate()
            .map(|(index, t)| ThreadView {
                index,
                id: t.id(),
                argument: t.argument(),
                state: t.state(),
                priority: t.priority(),
            })
            .collect()
    }

    /// Take every journaled event since the last drain, oldest first
    pub fn drain_events(&self) -> Vec<ThreadEvent> {
        self.registry.journal().drain()
    }

    /// Events lost to journal overflow so far
    pub fn events_evicted(&self) -> u64 {
        self.registry.journal().evicted()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sim() -> Simulation {
        Simulation::new(SimulationConfig::new().sleep_ms(100)).unwrap()
    }

    #[test]
    fn test_queries_on_empty() {
        let sim = sim();
        assert_eq!(sim.count(), 0);
        assert_eq!(sim.get_counter_value(), "retro+");
        assert!(!sim.get_guard_enabled());
        assert_eq!(sim.get_sleep_duration(), Duration::from_millis(100));
        assert!(matches!(sim.run(0), Err(CtlError::IndexOutOfRange { index: 0, len: 0 })));
        assert!(sim.get_state(3).is_err());
    }

    #[test]
    fn test_out_of_range_config_rejected() {
        let err = Simulation::new(SimulationConfig::new().sleep_ms(5)).err();
        assert_eq!(
            err,
            Some(CtlError::Config(ConfigError::OutOfRange {
                name: "sleep_ms",
                value: 5,
                min: defaults::SLEEP_MS_MIN,
                max: defaults::SLEEP_MS_MAX,
            }))
        );
        assert!(Simulation::new(SimulationConfig::new().sleep_ms(2001)).is_err());
        assert!(Simulation::new(SimulationConfig::new().sleep_ms(defaults::SLEEP_MS_MIN)).is_ok());
    }

    #[test]
    fn test_sleep_duration_range() {
        let sim = sim();
        assert!(sim.set_sleep_duration(99).is_err());
        assert!(matches!(
            sim.set_sleep_duration(2001),
            Err(CtlError::Config(ConfigError::OutOfRange { .. }))
        ));
        sim.set_sleep_duration(2000).unwrap();
        assert_eq!(sim.get_sleep_duration(), Duration::from_secs(2));
    }

    #[test]
    fn test_snapshot_tracks_entries() {
        let mut sim = sim();
        sim.create_thread().unwrap();
        sim.create_thread().unwrap();
        sim.set_priority(1, Priority::High).unwrap();

        let rows = sim.snapshot();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].argument, 1);
        assert_eq!(rows[1].priority, Priority::High);
        assert!(rows.iter().all(|r| r.state == CtlThreadState::Idle));

        sim.remove(0).unwrap();
        assert_eq!(sim.snapshot()[0].argument, 1);
    }

    #[test]
    fn test_toggle_guard() {
        let sim = sim();
        sim.set_guard_enabled(true);
        assert!(sim.get_guard_enabled());
        sim.set_guard_enabled(false);
        assert!(!sim.get_guard_enabled());
        assert!(!sim.guard_poisoned());
    }
}
