//! Controllable thread
//!
//! Wraps one execution unit running a fixed job with a fixed argument, and
//! drives it through `Idle → Running ⇄ Paused → Finished`.
//!
//! Every operation takes `&self`, so a control surface can `join` on one
//! thread while another pauses, resumes or terminates the same entry.
//! State changes made by the controller happen under the entry's control
//! lock; the only change the unit makes itself is the final `Finished`.
//!
//! # Policies
//!
//! - `run` on a thread that is not `Idle` fails with `InvalidState`.
//! - `pause`, `resume`, `terminate` outside their source states are no-ops.
//! - `pause` returns once the unit is parked; `resume` does not wait.
//! - `join` on `Idle` is a no-op; on a finished thread it returns at once.
//!   It reports the job body's error, except a termination, which joins as
//!   `Ok`.
//! - `set_priority` is recorded in any state, applied natively when live
//!   and at spawn otherwise.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use ctlthread_core::{
    kdebug, kwarn, Checkpoint, CtlError, CtlResult, CtlThreadId, CtlThreadState, EventJournal,
    EventKind, ExecutionContext, ExecutionSubstrate, Priority, UnitBody,
};
use crate::job::Job;

/// Stores `Finished` when the body leaves, even by unwinding
struct MarkFinished(Arc<AtomicU8>);

impl Drop for MarkFinished {
    fn drop(&mut self) {
        self.0.store(CtlThreadState::Finished as u8, Ordering::SeqCst);
    }
}

pub struct CtlThread {
    id: CtlThreadId,
    argument: usize,
    job: Job,
    substrate: Arc<dyn ExecutionSubstrate>,
    journal: Arc<EventJournal>,
    state: Arc<AtomicU8>,
    priority: AtomicU8,
    /// Live unit, once run; serializes controller transitions
    context: Mutex<Option<Arc<dyn ExecutionContext>>>,
}

impl CtlThread {
    pub fn new(
        argument: usize,
        job: Job,
        substrate: Arc<dyn ExecutionSubstrate>,
        journal: Arc<EventJournal>,
    ) -> Self {
        let id = CtlThreadId::next();
        journal.record(id, EventKind::Created { argument });
        Self {
            id,
            argument,
            job,
            substrate,
            journal,
            state: Arc::new(AtomicU8::new(CtlThreadState::Idle as u8)),
            priority: AtomicU8::new(Priority::Normal as u8),
            context: Mutex::new(None),
        }
    }

    #[inline]
    pub fn id(&self) -> CtlThreadId {
        self.id
    }

    /// Argument captured at creation
    #[inline]
    pub fn argument(&self) -> usize {
        self.argument
    }

    #[inline]
    pub fn state(&self) -> CtlThreadState {
        CtlThreadState::from(self.state.load(Ordering::SeqCst))
    }

    #[inline]
    pub fn priority(&self) -> Priority {
        Priority::from(self.priority.load(Ordering::SeqCst))
    }

    pub fn is_running(&self) -> bool {
        self.state() == CtlThreadState::Running
    }

    pub fn is_paused(&self) -> bool {
        self.state() == CtlThreadState::Paused
    }

    pub fn is_finished(&self) -> bool {
        self.state() == CtlThreadState::Finished
    }

    fn lock_context(&self) -> MutexGuard<'_, Option<Arc<dyn ExecutionContext>>> {
        self.context.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn transition(&self, from: CtlThreadState, to: CtlThreadState) -> bool {
        self.state
            .compare_exchange(from as u8, to as u8, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    /// Spawn the unit. Valid only from `Idle`.
    pub fn run(&self) -> CtlResult<()> {
        let mut context = self.lock_context();
        if !self.transition(CtlThreadState::Idle, CtlThreadState::Running) {
            return Err(CtlError::InvalidState { op: "run", state: self.state() });
        }

        let job = Arc::clone(&self.job);
        let journal = Arc::clone(&self.journal);
        let state = Arc::clone(&self.state);
        let argument = self.argument;
        let id = self.id;

        let body: UnitBody = Box::new(move |unit: &dyn Checkpoint| {
            let _finished = MarkFinished(state);
            let outcome = job(unit, argument);
            match &outcome {
                Ok(()) => journal.record(id, EventKind::Finished),
                Err(CtlError::Terminated) => journal.record(id, EventKind::Terminated),
                Err(e) => {
                    kwarn!("{} job failed: {}", id, e);
                    journal.record(id, EventKind::Failed(e.clone()));
                }
            }
            outcome
        });

        match self.substrate.spawn(self.id, self.priority(), body) {
            Ok(ctx) => {
                *context = Some(Arc::from(ctx));
                self.journal.record(self.id, EventKind::Started);
                kdebug!("{} running (arg {})", self.id, self.argument);
                Ok(())
            }
            Err(e) => {
                self.state.store(CtlThreadState::Idle as u8, Ordering::SeqCst);
                Err(e)
            }
        }
    }

    /// Park a running unit; returns once it is parked or finished
    pub fn pause(&self) -> CtlResult<()> {
        let context = self.lock_context();
        if self.state() != CtlThreadState::Running {
            return Ok(());
        }
        if let Some(ctx) = context.as_ref() {
            ctx.suspend();
        }
        // Fails if the unit finished before it reached a checkpoint
        if self.transition(CtlThreadState::Running, CtlThreadState::Paused) {
            self.journal.record(self.id, EventKind::Paused);
            kdebug!("{} paused", self.id);
        }
        Ok(())
    }

    pub fn resume(&self) -> CtlResult<()> {
        let context = self.lock_context();
        if !self.transition(CtlThreadState::Paused, CtlThreadState::Running) {
            return Ok(());
        }
        if let Some(ctx) = context.as_ref() {
            ctx.resume();
        }
        self.journal.record(self.id, EventKind::Resumed);
        kdebug!("{} resumed", self.id);
        Ok(())
    }

    /// Forcibly end a live unit
    ///
    /// Returns once the unit can no longer run. A guard it held stays
    /// locked for good.
    pub fn terminate(&self) -> CtlResult<()> {
        let context = self.lock_context();
        if !self.state().is_live() {
            return Ok(());
        }
        if let Some(ctx) = context.as_ref() {
            ctx.terminate();
        }
        self.state.store(CtlThreadState::Finished as u8, Ordering::SeqCst);
        kdebug!("{} terminated", self.id);
        Ok(())
    }

    /// Block until the unit finished
    ///
    /// Holds no control lock while waiting, so pause, resume and terminate
    /// from other threads proceed normally.
    pub fn join(&self) -> CtlResult<()> {
        let ctx = match self.lock_context().as_ref() {
            Some(ctx) => Arc::clone(ctx),
            None => return Ok(()),
        };
        match ctx.wait() {
            Err(CtlError::Terminated) => Ok(()),
            other => other,
        }
    }

    pub fn set_priority(&self, priority: Priority) {
        let context = self.lock_context();
        let previous = self.priority.swap(priority as u8, Ordering::SeqCst);
        if previous == priority as u8 {
            return;
        }
        self.journal.record(self.id, EventKind::PriorityChanged(priority));
        if self.state().is_live() {
            if let Some(ctx) = context.as_ref() {
                ctx.apply_priority(priority);
            }
        }
    }
}

impl Drop for CtlThread {
    fn drop(&mut self) {
        // No unit outlives its entry
        let _ = self.terminate();
    }
}

impl std::fmt::Debug for CtlThread {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CtlThread")
            .field("id", &self.id)
            .field("argument", &self.argument)
            .field("state", &self.state())
            .field("priority", &self.priority())
            .finish()
    }
}
