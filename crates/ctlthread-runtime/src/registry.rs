//! Thread registry
//!
//! Ordered collection of controllable threads sharing one counter, one
//! config and one event journal. Bulk operations walk the entries in order
//! and never stop at a failing entry.

use std::sync::Arc;
use ctlthread_core::{
    kdebug, CtlError, CtlResult, CtlThreadState, EventJournal, EventKind, ExecutionSubstrate,
    GuardedCounter, ToggleableMutex,
};
use crate::config::SimulationConfig;
use crate::job::{append_job, Job};
use crate::os_thread::OsThreadSubstrate;
use crate::thread::CtlThread;

/// Result of a bulk operation
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BulkReport {
    /// Entries the operation was applied to
    pub applied: usize,
    /// Entries for which the operation was not valid in their state
    pub skipped: usize,
    /// Entry index and error for every other failure
    pub errors: Vec<(usize, CtlError)>,
}

impl BulkReport {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    fn note(&mut self, index: usize, result: CtlResult<()>) {
        match result {
            Ok(()) => self.applied += 1,
            Err(CtlError::InvalidState { .. }) => self.skipped += 1,
            Err(e) => self.errors.push((index, e)),
        }
    }
}

pub struct ThreadRegistry {
    entries: Vec<CtlThread>,
    counter: Arc<GuardedCounter>,
    config: Arc<SimulationConfig>,
    journal: Arc<EventJournal>,
    substrate: Arc<dyn ExecutionSubstrate>,
    job: Job,
}

impl ThreadRegistry {
    /// Registry running units on OS threads
    pub fn new(config: SimulationConfig) -> CtlResult<Self> {
        Self::with_substrate(config, Arc::new(OsThreadSubstrate::new()))
    }

    /// Fails with `Config` when `config` does not validate
    pub fn with_substrate(
        config: SimulationConfig,
        substrate: Arc<dyn ExecutionSubstrate>,
    ) -> CtlResult<Self> {
        config.validate()?;
        let guard = ToggleableMutex::with_poll(config.guard_enabled, config.lock_poll);
        let counter = Arc::new(GuardedCounter::with_guard(config.counter_default.clone(), guard));
        let journal = Arc::new(EventJournal::new(config.journal_capacity));
        let config = Arc::new(config);
        let job = append_job(Arc::clone(&counter), Arc::clone(&config), Arc::clone(&journal));
        kdebug!("registry on {} substrate", substrate.name());

        Ok(Self {
            entries: Vec::new(),
            counter,
            config,
            journal,
            substrate,
            job,
        })
    }

    /// Append a new Idle thread whose argument is the current length
    pub fn add(&mut self) -> CtlResult<&CtlThread> {
        self.entries
            .try_reserve(1)
            .map_err(|e| CtlError::ResourceExhausted(e.to_string()))?;

        let thread = CtlThread::new(
            self.entries.len(),
            Arc::clone(&self.job),
            Arc::clone(&self.substrate),
            Arc::clone(&self.journal),
        );
        self.entries.push(thread);
        let index = self.entries.len() - 1;
        Ok(&self.entries[index])
    }

    /// Remove an Idle or Finished entry
    ///
    /// Running and Paused entries are refused with `InvalidState`; terminate
    /// them first.
    pub fn remove(&mut self, index: usize) -> CtlResult<()> {
        let state = self.get(index)?.state();
        if !state.is_removable() {
            return Err(CtlError::InvalidState { op: "remove", state });
        }
        let thread = self.entries.remove(index);
        self.journal.record(thread.id(), EventKind::Removed);
        kdebug!("{} removed from slot {}", thread.id(), index);
        Ok(())
    }

    pub fn get(&self, index: usize) -> CtlResult<&CtlThread> {
        self.entries.get(index).ok_or(CtlError::IndexOutOfRange {
            index,
            len: self.entries.len(),
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CtlThread> {
        self.entries.iter()
    }

    fn for_each(&self, op: impl Fn(&CtlThread) -> CtlResult<()>) -> BulkReport {
        let mut report = BulkReport::default();
        for (index, thread) in self.entries.iter().enumerate() {
            report.note(index, op(thread));
        }
        report
    }

    pub fn run_all(&self) -> BulkReport {
        self.for_each(CtlThread::run)
    }

    pub fn pause_all(&self) -> BulkReport {
        self.for_each(|t| {
            if !t.is_running() {
                return Err(CtlError::InvalidState { op: "pause", state: t.state() });
            }
            t.pause()
        })
    }

    pub fn resume_all(&self) -> BulkReport {
        self.for_each(|t| {
            if !t.is_paused() {
                return Err(CtlError::InvalidState { op: "resume", state: t.state() });
            }
            t.resume()
        })
    }

    pub fn terminate_all(&self) -> BulkReport {
        self.for_each(|t| {
            if !t.state().is_live() {
                return Err(CtlError::InvalidState { op: "terminate", state: t.state() });
            }
            t.terminate()
        })
    }

    /// Join every entry in order; Idle entries are skipped
    pub fn join_all(&self) -> BulkReport {
        self.for_each(|t| {
            if t.state() == CtlThreadState::Idle {
                return Err(CtlError::InvalidState { op: "join", state: t.state() });
            }
            t.join()
        })
    }

    pub fn counter(&self) -> &GuardedCounter {
        &self.counter
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn journal(&self) -> &EventJournal {
        &self.journal
    }
}

impl Drop for ThreadRegistry {
    fn drop(&mut self) {
        let live = self.entries.iter().filter(|t| t.state().is_live()).count();
        if live > 0 {
            kdebug!("registry dropped with {} live threads; terminating", live);
        }
        // Entries terminate themselves on drop; newest first
        while self.entries.pop().is_some() {}
    }
}
