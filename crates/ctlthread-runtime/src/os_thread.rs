//! OS-thread execution substrate
//!
//! One native thread per execution unit. Pause, resume and terminate are
//! delivered through the unit's [`ControlBlock`]: the job body reaches a
//! checkpoint at every sleep slice, guard wait step and appended character,
//! so a request takes effect within one of those steps.
//!
//! Termination does not unwind the body. The body sees `Err(Terminated)`
//! and must leave at once without releasing what it holds. That is how a
//! terminated holder leaves the guard poisoned.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use ctlthread_core::{
    kdebug, kwarn, CtlError, CtlResult, CtlThreadId, ExecutionContext, ExecutionSubstrate,
    Priority, UnitBody,
};
use crate::control::ControlBlock;
use crate::platform::{self, PriorityCell};

/// State shared by a unit and its controller
struct UnitShared {
    control: ControlBlock,
    priority: Mutex<PriorityCell>,
}

impl UnitShared {
    fn priority_cell(&self) -> MutexGuard<'_, PriorityCell> {
        self.priority.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Unit side: record the native id and apply any non-default priority
    fn publish_native_id(&self) {
        let mut cell = self.priority_cell();
        let tid = platform::current_native_id();
        cell.native = Some(tid);
        if cell.desired != Priority::Normal {
            apply_native(self.control_id(), tid, cell.desired);
        }
    }

    fn control_id(&self) -> CtlThreadId {
        ctlthread_core::Checkpoint::id(&self.control)
    }
}

fn apply_native(id: CtlThreadId, tid: platform::NativeThreadId, priority: Priority) {
    match platform::apply_priority(tid, priority) {
        Ok(()) => kdebug!("{} priority -> {}", id, priority),
        Err(e) if platform::is_permission_error(&e) => {
            kwarn!("{} priority {} refused by the OS ({}); keeping the old one", id, priority, e)
        }
        Err(e) if !platform::PRIORITY_SUPPORTED => {
            kwarn!("{} priority {} not mapped on {}: {}", id, priority, platform::PLATFORM_NAME, e)
        }
        Err(e) => kwarn!("{} priority {} failed: {}", id, priority, e),
    }
}

/// Reports the unit's exit even if the body unwinds
struct ExitNotice<'a> {
    control: &'a ControlBlock,
    outcome: Option<CtlResult<()>>,
}

impl Drop for ExitNotice<'_> {
    fn drop(&mut self) {
        let outcome = self.outcome.take().unwrap_or(Err(CtlError::Panicked));
        self.control.finish(outcome);
    }
}

fn unit_main(shared: Arc<UnitShared>, body: UnitBody) {
    shared.publish_native_id();
    let mut notice = ExitNotice { control: &shared.control, outcome: None };
    let outcome = body(&shared.control);
    notice.outcome = Some(outcome);
}

/// Spawns one OS thread per unit
#[derive(Debug, Default, Clone, Copy)]
pub struct OsThreadSubstrate;

impl OsThreadSubstrate {
    pub fn new() -> Self {
        Self
    }
}

impl ExecutionSubstrate for OsThreadSubstrate {
    fn spawn(
        &self,
        id: CtlThreadId,
        priority: Priority,
        body: UnitBody,
    ) -> CtlResult<Box<dyn ExecutionContext>> {
        let shared = Arc::new(UnitShared {
            control: ControlBlock::new(id),
            priority: Mutex::new(PriorityCell { desired: priority, native: None }),
        });
        let unit = Arc::clone(&shared);

        let handle = thread::Builder::new()
            .name(format!("ctl-{}", id.as_u32()))
            .spawn(move || unit_main(unit, body))
            .map_err(|e| CtlError::ResourceExhausted(e.to_string()))?;

        Ok(Box::new(OsThreadContext {
            shared,
            handle: Mutex::new(Some(handle)),
        }))
    }

    fn name(&self) -> &'static str {
        platform::PLATFORM_NAME
    }
}

/// Controller's view of one OS-thread unit
pub struct OsThreadContext {
    shared: Arc<UnitShared>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl OsThreadContext {
    /// Join the OS thread once the unit reported its exit
    fn reap(&self) {
        let handle = self
            .handle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            // A panicking body was already reported as Panicked
            let _ = handle.join();
        }
    }
}

impl ExecutionContext for OsThreadContext {
    fn suspend(&self) {
        self.shared.control.request_pause();
    }

    fn resume(&self) {
        self.shared.control.request_resume();
    }

    fn terminate(&self) {
        self.shared.control.request_terminate();
        self.reap();
    }

    fn wait(&self) -> CtlResult<()> {
        let outcome = self.shared.control.wait_exit();
        self.reap();
        outcome
    }

    fn has_exited(&self) -> bool {
        self.shared.control.has_exited()
    }

    fn apply_priority(&self, priority: Priority) {
        let mut cell = self.shared.priority_cell();
        cell.desired = priority;
        if let Some(tid) = cell.native {
            if !self.shared.control.has_exited() {
                apply_native(self.shared.control_id(), tid, priority);
            }
        }
    }
}

impl Drop for OsThreadContext {
    fn drop(&mut self) {
        if !self.shared.control.has_exited() {
            self.shared.control.request_terminate();
        }
        self.reap();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ctlthread_core::Checkpoint;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::{Duration, Instant};

    fn spawn_body(body: UnitBody) -> Box<dyn ExecutionContext> {
        OsThreadSubstrate::new()
            .spawn(CtlThreadId::next(), Priority::Normal, body)
            .unwrap()
    }

    #[test]
    fn test_wait_returns_outcome() {
        let ctx = spawn_body(Box::new(|_unit: &dyn Checkpoint| Err(CtlError::GuardPoisoned)));
        assert_eq!(ctx.wait(), Err(CtlError::GuardPoisoned));
        assert!(ctx.has_exited());
    }

    #[test]
    fn test_terminate_stops_progress() {
        let steps = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&steps);
        let ctx = spawn_body(Box::new(move |unit: &dyn Checkpoint| -> CtlResult<()> {
            loop {
                unit.sleep(Duration::from_millis(5))?;
                seen.fetch_add(1, Ordering::SeqCst);
            }
        }));

        thread::sleep(Duration::from_millis(30));
        let start = Instant::now();
        ctx.terminate();
        assert!(start.elapsed() < Duration::from_millis(500));
        assert!(ctx.has_exited());

        let frozen = steps.load(Ordering::SeqCst);
        thread::sleep(Duration::from_millis(30));
        assert_eq!(steps.load(Ordering::SeqCst), frozen);
        assert_eq!(ctx.wait(), Err(CtlError::Terminated));
    }

    #[test]
    fn test_suspend_then_resume() {
        let steps = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&steps);
        let ctx = spawn_body(Box::new(move |unit: &dyn Checkpoint| -> CtlResult<()> {
            for _ in 0..20 {
                unit.sleep(Duration::from_millis(5))?;
                seen.fetch_add(1, Ordering::SeqCst);
            }
            Ok(())
        }));

        thread::sleep(Duration::from_millis(20));
        ctx.suspend();
        let frozen = steps.load(Ordering::SeqCst);
        thread::sleep(Duration::from_millis(50));
        assert_eq!(steps.load(Ordering::SeqCst), frozen);

        ctx.resume();
        assert_eq!(ctx.wait(), Ok(()));
        assert_eq!(steps.load(Ordering::SeqCst), 20);
    }

    #[test]
    fn test_panicking_body_reports_panicked() {
        let ctx = spawn_body(Box::new(|_unit: &dyn Checkpoint| -> CtlResult<()> { panic!("job exploded") }));
        assert_eq!(ctx.wait(), Err(CtlError::Panicked));
    }

    #[test]
    fn test_drop_terminates_live_unit() {
        let steps = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&steps);
        let ctx = spawn_body(Box::new(move |unit: &dyn Checkpoint| -> CtlResult<()> {
            loop {
                unit.sleep(Duration::from_millis(5))?;
                seen.fetch_add(1, Ordering::SeqCst);
            }
        }));
        thread::sleep(Duration::from_millis(20));
        drop(ctx);

        let frozen = steps.load(Ordering::SeqCst);
        thread::sleep(Duration::from_millis(30));
        assert_eq!(steps.load(Ordering::SeqCst), frozen);
    }

    #[test]
    fn test_priority_before_and_after_start() {
        let ctx = OsThreadSubstrate::new()
            .spawn(
                CtlThreadId::next(),
                Priority::BelowNormal,
                Box::new(|unit: &dyn Checkpoint| unit.sleep(Duration::from_millis(30))),
            )
            .unwrap();
        ctx.apply_priority(Priority::Low);
        assert_eq!(ctx.wait(), Ok(()));
    }
}
