//! The fixed job body: guarded append to the shared counter
//!
//! 1. take the counter's guard (a bypass guard when the switch is off)
//! 2. sleep for the configured duration, read now
//! 3. append the decimal argument to the counter
//! 4. release the guard
//!
//! A unit terminated between 1 and 4 abandons its guard, leaving it
//! poisoned.

use std::sync::Arc;
use ctlthread_core::{
    ktrace, kwarn, Checkpoint, CtlError, CtlResult, EventJournal, EventKind, GuardedCounter,
};
use crate::config::SimulationConfig;

/// A job body, invoked once per run with the thread's argument
pub type Job = Arc<dyn Fn(&dyn Checkpoint, usize) -> CtlResult<()> + Send + Sync>;

/// Build the append job over shared counter, config and journal
pub fn append_job(
    counter: Arc<GuardedCounter>,
    config: Arc<SimulationConfig>,
    journal: Arc<EventJournal>,
) -> Job {
    Arc::new(move |unit: &dyn Checkpoint, argument: usize| {
        run_append(unit, argument, &counter, &config, &journal)
    })
}

pub fn run_append(
    unit: &dyn Checkpoint,
    argument: usize,
    counter: &GuardedCounter,
    config: &SimulationConfig,
    journal: &EventJournal,
) -> CtlResult<()> {
    let guard = counter.guard().lock(unit)?;
    let fragment = argument.to_string();

    let outcome = unit
        .sleep(config.sleep_duration())
        .and_then(|()| counter.append(&fragment, config.append_window, unit));

    match outcome {
        Ok(()) => {
            ktrace!("{} append {:?}", unit.id(), fragment);
            journal.record(unit.id(), EventKind::Appended(fragment));
            drop(guard);
            Ok(())
        }
        Err(CtlError::Terminated) => {
            if guard.abandon() {
                kwarn!("{} terminated while holding the guard; guard is now poisoned", unit.id());
            }
            Err(CtlError::Terminated)
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ctlthread_core::{CtlThreadId, FreeRunning};
    use std::time::Duration;

    fn fixture(guard: bool) -> (Arc<GuardedCounter>, Arc<SimulationConfig>, Arc<EventJournal>) {
        let config = SimulationConfig::new()
            .sleep_ms(100)
            .append_window(Duration::ZERO);
        (
            Arc::new(GuardedCounter::new(config.counter_default.clone(), guard)),
            Arc::new(config),
            Arc::new(EventJournal::new(16)),
        )
    }

    #[test]
    fn test_append_job_appends_argument() {
        let (counter, config, journal) = fixture(true);
        let job = append_job(Arc::clone(&counter), config, Arc::clone(&journal));

        job(&FreeRunning(CtlThreadId::new(0)), 42).unwrap();
        assert_eq!(counter.value(), "retro+42");
        assert!(!counter.guard().is_locked());

        let events = journal.drain();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, EventKind::Appended("42".into()));
    }

    #[test]
    fn test_poisoned_guard_fails_job() {
        let (counter, config, journal) = fixture(true);
        let held = counter.guard().lock(&FreeRunning(CtlThreadId::new(9))).unwrap();
        held.abandon();

        let r = run_append(&FreeRunning(CtlThreadId::new(1)), 1, &counter, &config, &journal);
        assert_eq!(r, Err(CtlError::GuardPoisoned));
        assert_eq!(counter.value(), "retro+");
    }
}
