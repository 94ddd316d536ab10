//! Execution traits
//!
//! These traits define the interface between the platform-agnostic core
//! (guard, counter, registry bookkeeping) and the runtime's execution
//! substrate.

use std::time::Duration;
use crate::error::CtlResult;
use crate::id::CtlThreadId;
use crate::state::Priority;

/// Control points inside a running execution unit
///
/// Every blocking or multi-step operation a job body performs goes through
/// its `Checkpoint`. This is where a pause parks the unit and where a
/// termination ends it.
pub trait Checkpoint: Sync {
    /// Identity of the unit this checkpoint belongs to
    fn id(&self) -> CtlThreadId;

    /// Park while paused; `Err(Terminated)` once termination was requested
    fn checkpoint(&self) -> CtlResult<()>;

    /// Sleep for `duration` of running time. Time spent paused does not
    /// count toward it.
    fn sleep(&self, duration: Duration) -> CtlResult<()>;
}

/// A checkpoint that is never paused nor terminated
///
/// Used for work done outside any controllable thread.
#[derive(Debug, Clone, Copy)]
pub struct FreeRunning(pub CtlThreadId);

impl Checkpoint for FreeRunning {
    fn id(&self) -> CtlThreadId {
        self.0
    }

    fn checkpoint(&self) -> CtlResult<()> {
        Ok(())
    }

    fn sleep(&self, duration: Duration) -> CtlResult<()> {
        if !duration.is_zero() {
            std::thread::sleep(duration);
        }
        Ok(())
    }
}

/// Body run by an execution unit
pub type UnitBody = Box<dyn FnOnce(&dyn Checkpoint) -> CtlResult<()> + Send + 'static>;

/// A live execution unit, as seen from its controller
///
/// `terminate` is a hard capability: once it returns the unit will not be
/// scheduled again, and nothing the unit held (in particular a guard) is
/// released on its behalf.
pub trait ExecutionContext: Send + Sync {
    /// Park the unit at its next checkpoint. Returns once parked or exited.
    fn suspend(&self);

    /// Let a parked unit continue. Does not wait.
    fn resume(&self);

    /// Forcibly end the unit. Returns once it is no longer schedulable.
    fn terminate(&self);

    /// Block until the unit exited; yields the body's outcome
    fn wait(&self) -> CtlResult<()>;

    /// Non-blocking: has the unit exited
    fn has_exited(&self) -> bool;

    /// Apply a scheduling priority to the live unit
    fn apply_priority(&self, priority: Priority);
}

/// Creates execution units
pub trait ExecutionSubstrate: Send + Sync {
    /// Spawn `body` as a new unit with an initial priority
    fn spawn(
        &self,
        id: CtlThreadId,
        priority: Priority,
        body: UnitBody,
    ) -> CtlResult<Box<dyn ExecutionContext>>;

    /// Substrate name (e.g. "linux", "portable")
    fn name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn test_free_running_never_interrupts() {
        let unit = FreeRunning(CtlThreadId::new(3));
        assert_eq!(unit.id(), CtlThreadId::new(3));
        assert!(unit.checkpoint().is_ok());

        let start = Instant::now();
        unit.sleep(Duration::from_millis(20)).unwrap();
        assert!(start.elapsed() >= Duration::from_millis(20));
    }
}
