//! Native scheduling hints
//!
//! Each platform maps the five `Priority` levels onto whatever per-thread
//! hint it exposes. Platforms without a mapping accept the call and do
//! nothing; the caller logs a warning.

use ctlthread_core::Priority;

cfg_if::cfg_if! {
    if #[cfg(target_os = "linux")] {
        mod linux;
        pub use linux::*;
    } else {
        mod fallback;
        pub use fallback::*;
    }
}

/// Native handle recorded by a unit so its priority can be changed from
/// outside
#[derive(Debug, Default)]
pub struct PriorityCell {
    pub desired: Priority,
    pub native: Option<NativeThreadId>,
}
