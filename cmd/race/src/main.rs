//! Race demonstration - guarded vs unguarded appends
//!
//! Runs N threads against the shared counter for a number of rounds, first
//! with the guard on, then off, and reports how many rounds lost
//! fragments.
//!
//! # Usage
//!
//! ```text
//! race [threads] [rounds]
//! ```
//!
//! # Environment Variables
//!
//! - `CTL_SLEEP_MS=100` - job sleep (100..=2000)
//! - `CTL_APPEND_WINDOW_US=1000` - per-character read/write window
//! - `CTL_LOG_LEVEL=debug` - Set log level (off, error, warn, info, debug, trace)

use ctlthread::{env_get, kinfo, CtlResult, Simulation, SimulationConfig};
use std::time::Instant;

struct RoundResult {
    value: String,
    lost: usize,
}

fn run_round(guard: bool, threads: usize) -> CtlResult<RoundResult> {
    let config = SimulationConfig::from_env().guard_enabled(guard);
    let prefix_len = config.counter_default.len();
    let mut sim = Simulation::new(config)?;

    for _ in 0..threads {
        if let Err(e) = sim.create_thread() {
            kinfo!("create failed: {}", e);
            break;
        }
    }
    let started = sim.run_all();
    let joined = sim.join_all();
    for (i, e) in started.errors.iter().chain(joined.errors.iter()) {
        println!("  thread {}: {}", i, e);
    }

    let value = sim.get_counter_value();
    let expected: usize = (0..sim.count()).map(|i| i.to_string().len()).sum();
    let appended = value.len().saturating_sub(prefix_len);
    Ok(RoundResult {
        lost: expected.saturating_sub(appended),
        value,
    })
}

fn report(label: &str, guard: bool, threads: usize, rounds: usize) -> CtlResult<()> {
    println!("--- guard {} ---", label);
    let start = Instant::now();
    let mut damaged = 0;
    for round in 0..rounds {
        let r = run_round(guard, threads)?;
        if r.lost > 0 {
            damaged += 1;
        }
        println!("round {:>3}: {:<40} lost {} chars", round, r.value, r.lost);
    }
    println!(
        "guard {}: {}/{} rounds damaged in {:?}\n",
        label,
        damaged,
        rounds,
        start.elapsed()
    );
    Ok(())
}

fn main() {
    println!("=== ctlthread Race Demo ===\n");
    ctlthread::init_logging();

    let threads: usize = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| env_get("CTL_RACE_THREADS", 8));
    let rounds: usize = std::env::args()
        .nth(2)
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| env_get("CTL_RACE_ROUNDS", 5));

    let config = SimulationConfig::from_env();
    if let Err(e) = config.validate() {
        eprintln!("invalid configuration: {}", e);
        std::process::exit(2);
    }
    config.print();
    println!("\n{} threads x {} rounds\n", threads, rounds);

    for (label, guard) in [("on", true), ("off", false)] {
        if let Err(e) = report(label, guard, threads, rounds) {
            eprintln!("guard {}: {}", label, e);
            std::process::exit(1);
        }
    }

    println!("=== Race Demo Complete ===");
}
