//! # ctlthread-runtime
//!
//! Platform-specific runtime for controllable threads.
//!
//! This crate provides:
//! - Simulation configuration (defaults plus `CTL_*` environment overrides)
//! - The control block through which units observe pause and terminate
//! - The OS-thread execution substrate
//! - Native priority mapping (per-thread nice on Linux)
//! - The append job body, `CtlThread` and `ThreadRegistry`

pub mod config;
pub mod control;
pub mod platform;
pub mod os_thread;
pub mod job;
pub mod thread;
pub mod registry;

// Re-exports
pub use config::SimulationConfig;
pub use control::ControlBlock;
pub use os_thread::{OsThreadContext, OsThreadSubstrate};
pub use job::{append_job, Job};
pub use thread::CtlThread;
pub use registry::{BulkReport, ThreadRegistry};
