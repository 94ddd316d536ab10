//! Interactive control console
//!
//! Line-oriented control surface over one `Simulation`. Each command is one
//! user action; `show` renders the registry, `events` drains the journal.
//!
//! # Environment Variables
//!
//! - `CTL_SLEEP_MS=500` - initial job sleep
//! - `CTL_GUARD=1` - start with the guard on
//! - `CTL_LOG_LEVEL=debug` - Set log level (off, error, warn, info, debug, trace)
//! - `CTL_FLUSH_EPRINT=1` - Flush log output immediately

use ctlthread::{
    BulkReport, ConfigError, CtlError, CtlResult, Priority, Simulation, SimulationConfig,
};
use std::io::{self, BufRead, Write};

const HELP: &str = "\
commands:
  create                 add an idle thread
  run|join|pause|resume|terminate|remove <i>
  priority <i> <p>       p: 0..4 or low, below normal, normal, above normal, high
  runall|pauseall|resumeall|terminateall|joinall
  reset                  restore the counter default
  guard on|off           toggle the guard
  sleep <ms>             job sleep, 100..=2000
  show                   list threads and the counter
  events                 print journaled events
  help | quit";

enum Outcome {
    Continue,
    Quit,
}

fn index(arg: Option<&str>) -> CtlResult<usize> {
    arg.and_then(|s| s.parse().ok())
        .ok_or(CtlError::Config(ConfigError::InvalidValue("expected a thread index")))
}

fn print_bulk(op: &str, r: &BulkReport) {
    println!("{}: {} applied, {} skipped", op, r.applied, r.skipped);
    for (i, e) in &r.errors {
        println!("  [{}] {}", i, e);
    }
}

fn show(sim: &Simulation) {
    println!(
        "counter: {:?}  guard: {}{}  sleep: {:?}",
        sim.get_counter_value(),
        if sim.get_guard_enabled() { "on" } else { "off" },
        if sim.guard_poisoned() { " (poisoned)" } else { "" },
        sim.get_sleep_duration()
    );
    for row in sim.snapshot() {
        println!(
            "  [{}] {} arg={:<3} {:<9} {}",
            row.index, row.id, row.argument, row.state, row.priority
        );
    }
}

fn execute(sim: &mut Simulation, line: &str) -> CtlResult<Outcome> {
    let mut words = line.split_whitespace();
    let Some(cmd) = words.next() else {
        return Ok(Outcome::Continue);
    };
    let arg = words.next();

    match cmd {
        "create" => println!("created [{}]", sim.create_thread()?),
        "run" => sim.run(index(arg)?)?,
        "join" => sim.join(index(arg)?)?,
        "pause" => sim.pause(index(arg)?)?,
        "resume" => sim.resume(index(arg)?)?,
        "terminate" => sim.terminate(index(arg)?)?,
        "remove" => sim.remove(index(arg)?)?,
        "priority" => {
            let i = index(arg)?;
            let name = words.collect::<Vec<_>>().join(" ");
            match name.parse::<Priority>() {
                Ok(p) => sim.set_priority(i, p)?,
                Err(e) => println!("{}", e),
            }
        }
        "runall" => print_bulk(cmd, &sim.run_all()),
        "pauseall" => print_bulk(cmd, &sim.pause_all()),
        "resumeall" => print_bulk(cmd, &sim.resume_all()),
        "terminateall" => print_bulk(cmd, &sim.terminate_all()),
        "joinall" => print_bulk(cmd, &sim.join_all()),
        "reset" => sim.reset_counter(),
        "guard" => match arg {
            Some("on") => sim.set_guard_enabled(true),
            Some("off") => sim.set_guard_enabled(false),
            _ => println!("usage: guard on|off"),
        },
        "sleep" => match arg.and_then(|s| s.parse().ok()) {
            Some(ms) => sim.set_sleep_duration(ms)?,
            None => println!("usage: sleep <ms>"),
        },
        "show" => show(sim),
        "events" => {
            for event in sim.drain_events() {
                println!("{}", event);
            }
            let evicted = sim.events_evicted();
            if evicted > 0 {
                println!("({} older events evicted)", evicted);
            }
        }
        "help" => println!("{}", HELP),
        "quit" | "exit" => return Ok(Outcome::Quit),
        other => println!("unknown command {:?}; try help", other),
    }
    Ok(Outcome::Continue)
}

fn main() {
    println!("=== ctlthread Console ===\n");

    let mut sim = match Simulation::new(SimulationConfig::from_env()) {
        Ok(sim) => sim,
        Err(e) => {
            eprintln!("invalid configuration: {}", e);
            std::process::exit(2);
        }
    };
    println!("{}\n", HELP);

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("ctl> ");
        let _ = io::stdout().flush();
        let Some(Ok(line)) = lines.next() else {
            break;
        };
        match execute(&mut sim, &line) {
            Ok(Outcome::Quit) => break,
            Ok(Outcome::Continue) => {}
            Err(e) => println!("error: {}", e),
        }
    }

    let report = sim.terminate_all();
    if report.applied > 0 {
        println!("terminated {} live threads", report.applied);
    }
    println!("\n=== Console Closed ===");
}
