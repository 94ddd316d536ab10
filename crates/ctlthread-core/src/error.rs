//! Error types for controllable threads

use core::fmt;
use crate::state::CtlThreadState;

/// Result type for control operations
pub type CtlResult<T> = Result<T, CtlError>;

/// Errors reported to the control surface
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CtlError {
    /// Operation not valid for the thread's current state
    InvalidState {
        op: &'static str,
        state: CtlThreadState,
    },

    /// Operation addressed a registry entry that does not exist
    IndexOutOfRange {
        index: usize,
        len: usize,
    },

    /// The OS refused to create another thread
    ResourceExhausted(String),

    /// The guard is held by a terminated thread and will never be released
    GuardPoisoned,

    /// Rejected configuration value
    Config(ConfigError),

    /// The job body panicked
    Panicked,

    /// OS error code from a native call, -1 where the platform has no
    /// native mapping
    PlatformError(i32),

    /// The execution unit was forcibly terminated.
    ///
    /// Only observed inside a unit that is being torn down; it never
    /// reaches the control surface.
    Terminated,
}

impl fmt::Display for CtlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CtlError::InvalidState { op, state } => {
                write!(f, "cannot {} a thread that is {}", op, state)
            }
            CtlError::IndexOutOfRange { index, len } => {
                write!(f, "thread index {} out of range (count {})", index, len)
            }
            CtlError::ResourceExhausted(msg) => write!(f, "resource exhausted: {}", msg),
            CtlError::GuardPoisoned => write!(f, "guard poisoned by a terminated holder"),
            CtlError::Config(e) => write!(f, "config error: {}", e),
            CtlError::Panicked => write!(f, "job body panicked"),
            CtlError::PlatformError(code) => write!(f, "platform error: {}", code),
            CtlError::Terminated => write!(f, "execution terminated"),
        }
    }
}

impl std::error::Error for CtlError {}

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Numeric value outside its accepted range
    OutOfRange {
        name: &'static str,
        value: u64,
        min: u64,
        max: u64,
    },

    InvalidValue(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::OutOfRange { name, value, min, max } => {
                write!(f, "{} = {} outside [{}, {}]", name, value, min, max)
            }
            ConfigError::InvalidValue(msg) => write!(f, "invalid value: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for CtlError {
    fn from(e: ConfigError) -> Self {
        CtlError::Config(e)
    }
}
