//! # ctlthread-core
//!
//! Core types and traits for controllable threads.
//!
//! This crate is platform-agnostic and contains no OS-specific code.
//! Spawning, parking and native priorities live in `ctlthread-runtime`.
//!
//! ## Modules
//!
//! - `id` - Controllable thread identifier
//! - `state` - Thread state and priority enums
//! - `error` - Error types
//! - `traits` - Checkpoint and execution substrate traits
//! - `toggle` - Mutex whose enforcement can be switched at runtime
//! - `counter` - Shared string value guarded by a toggleable mutex
//! - `event` - Bounded event journal
//! - `kprint` - Kernel-style debug printing macros
//! - `env` - Environment variable utilities

pub mod id;
pub mod state;
pub mod error;
pub mod traits;
pub mod toggle;
pub mod counter;
pub mod event;
pub mod kprint;
pub mod env;

// Re-exports for convenience
pub use id::CtlThreadId;
pub use state::{CtlThreadState, Priority, ParsePriorityError};
pub use error::{CtlError, CtlResult, ConfigError};
pub use traits::{Checkpoint, ExecutionContext, ExecutionSubstrate, FreeRunning, UnitBody};
pub use toggle::{ToggleableMutex, ToggleGuard};
pub use counter::GuardedCounter;
pub use event::{EventJournal, EventKind, ThreadEvent};
pub use env::{env_get, env_get_bool, env_get_opt, env_get_str};
