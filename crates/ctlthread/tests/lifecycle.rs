//! End-to-end lifecycle tests through the `Simulation` API

use std::thread;
use std::time::{Duration, Instant};
use ctlthread::{CtlError, CtlThreadState, EventKind, Simulation, SimulationConfig};

const PREFIX: &str = "retro+";

fn simulation(guard: bool) -> Simulation {
    Simulation::new(
        SimulationConfig::new()
            .sleep_ms(100)
            .guard_enabled(guard)
            .append_window(Duration::from_micros(500)),
    )
    .unwrap()
}

fn with_threads(guard: bool, n: usize) -> Simulation {
    let mut sim = simulation(guard);
    for _ in 0..n {
        sim.create_thread().unwrap();
    }
    sim
}

/// Poll until `cond` holds or the deadline passes
fn eventually(timeout: Duration, cond: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    cond()
}

#[test]
fn run_pause_resume_join_appends_once() {
    let sim = with_threads(true, 1);
    sim.run(0).unwrap();
    sim.pause(0).unwrap();
    sim.resume(0).unwrap();
    sim.join(0).unwrap();

    assert_eq!(sim.get_state(0).unwrap(), CtlThreadState::Finished);
    assert_eq!(sim.get_counter_value(), "retro+0");
}

#[test]
fn paused_thread_makes_no_progress() {
    let sim = with_threads(false, 1);
    sim.run(0).unwrap();
    sim.pause(0).unwrap();

    assert!(eventually(Duration::from_millis(200), || {
        sim.get_state(0).unwrap() != CtlThreadState::Running
    }));
    // Well past the 100ms sleep
    thread::sleep(Duration::from_millis(300));
    assert_eq!(sim.get_counter_value(), PREFIX);
    assert_eq!(sim.get_state(0).unwrap(), CtlThreadState::Paused);

    sim.resume(0).unwrap();
    sim.join(0).unwrap();
    assert_eq!(sim.get_counter_value(), "retro+0");
}

#[test]
fn terminate_running_and_paused_joins_promptly() {
    let sim = with_threads(false, 2);
    sim.set_sleep_duration(2000).unwrap();
    sim.run_all();
    sim.pause(1).unwrap();

    for i in 0..2 {
        sim.terminate(i).unwrap();
        assert_eq!(sim.get_state(i).unwrap(), CtlThreadState::Finished);

        let start = Instant::now();
        sim.join(i).unwrap();
        assert!(start.elapsed() < Duration::from_millis(500));
    }
    assert_eq!(sim.get_counter_value(), PREFIX);
}

#[test]
fn guarded_threads_append_each_argument_once() {
    let n = 6;
    let sim = with_threads(true, n);
    assert_eq!(sim.run_all().applied, n);
    assert!(sim.join_all().is_ok());

    let value = sim.get_counter_value();
    let tail = value.strip_prefix(PREFIX).unwrap();
    let mut digits: Vec<char> = tail.chars().collect();
    digits.sort_unstable();
    assert_eq!(digits.into_iter().collect::<String>(), "012345");
}

#[test]
fn three_threads_example() {
    let sim = with_threads(false, 3);
    sim.set_guard_enabled(true);
    sim.run_all();
    sim.join_all();

    let value = sim.get_counter_value();
    assert!(value.starts_with(PREFIX));
    assert_eq!(value.len(), PREFIX.len() + 3);
    for arg in ["0", "1", "2"] {
        assert_eq!(value.matches(arg).count(), 1);
    }
}

#[test]
fn unguarded_stress_keeps_structure() {
    let mut torn = 0;
    for _round in 0..5 {
        // Wide read/write window so the appends overlap
        let mut sim = Simulation::new(
            SimulationConfig::new()
                .sleep_ms(100)
                .guard_enabled(false)
                .append_window(Duration::from_millis(20)),
        )
        .unwrap();
        for _ in 0..8 {
            sim.create_thread().unwrap();
        }
        sim.run_all();
        assert!(sim.join_all().is_ok());

        let value = sim.get_counter_value();
        let tail = value.strip_prefix(PREFIX).unwrap();
        assert!(tail.len() <= 8);
        for c in tail.chars() {
            assert!(c.is_ascii_digit());
            assert_eq!(tail.matches(c).count(), 1);
        }
        if tail.len() < 8 {
            torn += 1;
        }
    }
    // All eight wake from the same sleep and overlap inside the window
    assert!(torn > 0, "no unguarded round lost a fragment");
}

#[test]
fn remove_running_entry_is_refused() {
    let mut sim = with_threads(false, 2);
    sim.run(0).unwrap();

    assert!(matches!(sim.remove(0), Err(CtlError::InvalidState { .. })));
    assert_eq!(sim.count(), 2);

    sim.remove(1).unwrap();
    sim.terminate(0).unwrap();
    sim.remove(0).unwrap();
    assert_eq!(sim.count(), 0);
}

#[test]
fn terminating_guard_holder_poisons_guard() {
    let mut sim = with_threads(true, 1);
    sim.run(0).unwrap();
    assert!(eventually(Duration::from_millis(200), || {
        sim.registry().counter().guard().is_locked()
    }));
    sim.terminate(0).unwrap();
    assert!(sim.guard_poisoned());

    sim.create_thread().unwrap();
    sim.run(1).unwrap();
    assert_eq!(sim.join(1), Err(CtlError::GuardPoisoned));
    assert_eq!(sim.get_counter_value(), PREFIX);

    // Turning the switch off bypasses the dead guard
    sim.set_guard_enabled(false);
    sim.create_thread().unwrap();
    sim.run(2).unwrap();
    sim.join(2).unwrap();
    assert_eq!(sim.get_counter_value(), "retro+2");
}

#[test]
fn journal_records_lifecycle() {
    let sim = with_threads(true, 1);
    sim.run(0).unwrap();
    sim.join(0).unwrap();

    let kinds: Vec<EventKind> = sim.drain_events().into_iter().map(|e| e.kind).collect();
    assert_eq!(kinds.first(), Some(&EventKind::Created { argument: 0 }));
    assert!(kinds.contains(&EventKind::Started));
    assert!(kinds.contains(&EventKind::Appended("0".into())));
    assert_eq!(kinds.last(), Some(&EventKind::Finished));
    assert!(sim.drain_events().is_empty());
}
