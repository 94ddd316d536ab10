//! Control block shared by a controller and its execution unit
//!
//! The controller posts requests (run, pause, terminate); the unit observes
//! them at its checkpoints. One mutex covers the whole exchange and one
//! condvar wakes both sides, so a request and its acknowledgement can never
//! be missed.
//!
//! ```text
//!   controller                         unit
//!   ----------                         ----
//!   request = Pause  ──notify──►   checkpoint(): parked = true
//!   wait until parked ◄──notify──      wait for request change
//!   request = Run    ──notify──►   parked = false, continue
//!   request = Terminate ─notify─►  Err(Terminated) ... finish()
//!   wait until exited ◄──notify──      exited = true
//! ```

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use ctlthread_core::{Checkpoint, CtlError, CtlResult, CtlThreadId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Request {
    Run,
    Pause,
    Terminate,
}

#[derive(Debug)]
struct Control {
    request: Request,
    parked: bool,
    exited: bool,
    outcome: Option<CtlResult<()>>,
}

#[derive(Debug)]
pub struct ControlBlock {
    id: CtlThreadId,
    ctl: Mutex<Control>,
    changed: Condvar,
}

impl ControlBlock {
    pub fn new(id: CtlThreadId) -> Self {
        Self {
            id,
            ctl: Mutex::new(Control {
                request: Request::Run,
                parked: false,
                exited: false,
                outcome: None,
            }),
            changed: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Control> {
        self.ctl.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn wait<'a>(&self, guard: MutexGuard<'a, Control>) -> MutexGuard<'a, Control> {
        self.changed.wait(guard).unwrap_or_else(PoisonError::into_inner)
    }

    // Controller side

    /// Ask the unit to park and wait until it did (or exited)
    pub fn request_pause(&self) {
        let mut ctl = self.lock();
        if ctl.exited || ctl.request != Request::Run {
            return;
        }
        ctl.request = Request::Pause;
        self.changed.notify_all();
        while !ctl.parked && !ctl.exited && ctl.request == Request::Pause {
            ctl = self.wait(ctl);
        }
    }

    /// Let a parked unit continue; does not wait
    pub fn request_resume(&self) {
        let mut ctl = self.lock();
        if ctl.request == Request::Pause {
            ctl.request = Request::Run;
            self.changed.notify_all();
        }
    }

    /// Ask the unit to stop and wait until it exited
    pub fn request_terminate(&self) {
        let mut ctl = self.lock();
        if !ctl.exited {
            ctl.request = Request::Terminate;
            self.changed.notify_all();
        }
        while !ctl.exited {
            ctl = self.wait(ctl);
        }
    }

    /// Wait for the unit to exit and return its outcome
    pub fn wait_exit(&self) -> CtlResult<()> {
        let mut ctl = self.lock();
        while !ctl.exited {
            ctl = self.wait(ctl);
        }
        ctl.outcome.clone().unwrap_or(Ok(()))
    }

    pub fn has_exited(&self) -> bool {
        self.lock().exited
    }

    // Unit side

    /// Record the unit's outcome and wake every waiter. Called once, last.
    pub fn finish(&self, outcome: CtlResult<()>) {
        let mut ctl = self.lock();
        ctl.exited = true;
        ctl.parked = false;
        ctl.outcome = Some(outcome);
        self.changed.notify_all();
    }
}

impl Checkpoint for ControlBlock {
    fn id(&self) -> CtlThreadId {
        self.id
    }

    fn checkpoint(&self) -> CtlResult<()> {
        let mut ctl = self.lock();
        loop {
            match ctl.request {
                Request::Run => {
                    ctl.parked = false;
                    return Ok(());
                }
                Request::Terminate => {
                    ctl.parked = false;
                    return Err(CtlError::Terminated);
                }
                Request::Pause => {
                    if !ctl.parked {
                        ctl.parked = true;
                        self.changed.notify_all();
                    }
                    ctl = self.wait(ctl);
                }
            }
        }
    }

    fn sleep(&self, duration: Duration) -> CtlResult<()> {
        let mut remaining = duration;
        let mut ctl = self.lock();
        loop {
            match ctl.request {
                Request::Terminate => return Err(CtlError::Terminated),
                Request::Pause => {
                    // Paused time does not count
                    drop(ctl);
                    self.checkpoint()?;
                    ctl = self.lock();
                }
                Request::Run => {
                    if remaining.is_zero() {
                        return Ok(());
                    }
                    let started = Instant::now();
                    let (guard, _) = self
                        .changed
                        .wait_timeout(ctl, remaining)
                        .unwrap_or_else(PoisonError::into_inner);
                    ctl = guard;
                    remaining = remaining.saturating_sub(started.elapsed());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn block() -> Arc<ControlBlock> {
        Arc::new(ControlBlock::new(CtlThreadId::new(1)))
    }

    #[test]
    fn test_sleep_runs_to_completion() {
        let b = block();
        let start = Instant::now();
        b.sleep(Duration::from_millis(30)).unwrap();
        assert!(start.elapsed() >= Duration::from_millis(30));
    }

    #[test]
    fn test_pause_parks_and_freezes_sleep() {
        let b = block();
        let unit = Arc::clone(&b);
        let start = Instant::now();
        let h = thread::spawn(move || {
            let r = unit.sleep(Duration::from_millis(100));
            unit.finish(r.clone());
            r
        });

        thread::sleep(Duration::from_millis(20));
        b.request_pause();
        assert!(!b.has_exited());
        thread::sleep(Duration::from_millis(150));
        assert!(!b.has_exited());

        b.request_resume();
        assert_eq!(h.join().unwrap(), Ok(()));
        // 20ms before the pause + 150ms parked + the remaining ~80ms
        assert!(start.elapsed() >= Duration::from_millis(240));
    }

    #[test]
    fn test_terminate_sleeping_unit() {
        let b = block();
        let unit = Arc::clone(&b);
        let h = thread::spawn(move || {
            let r = unit.sleep(Duration::from_secs(10));
            unit.finish(r.clone());
            r
        });

        thread::sleep(Duration::from_millis(20));
        let start = Instant::now();
        b.request_terminate();
        assert!(start.elapsed() < Duration::from_secs(1));
        assert!(b.has_exited());
        assert_eq!(b.wait_exit(), Err(CtlError::Terminated));
        assert_eq!(h.join().unwrap(), Err(CtlError::Terminated));
    }

    #[test]
    fn test_terminate_parked_unit() {
        let b = block();
        let unit = Arc::clone(&b);
        let h = thread::spawn(move || {
            let r = unit.sleep(Duration::from_secs(10));
            unit.finish(r);
        });

        thread::sleep(Duration::from_millis(10));
        b.request_pause();
        b.request_terminate();
        assert!(b.has_exited());
        h.join().unwrap();
    }

    #[test]
    fn test_pause_after_exit_returns() {
        let b = block();
        b.finish(Ok(()));
        b.request_pause();
        b.request_resume();
        b.request_terminate();
        assert_eq!(b.wait_exit(), Ok(()));
    }
}
