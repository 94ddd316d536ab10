//! Platforms without a per-thread priority mapping

use ctlthread_core::{CtlError, CtlResult, Priority};

pub const PLATFORM_NAME: &str = "portable";

pub const PRIORITY_SUPPORTED: bool = false;

pub type NativeThreadId = u64;

#[inline]
pub fn current_native_id() -> NativeThreadId {
    0
}

pub fn apply_priority(_tid: NativeThreadId, _priority: Priority) -> CtlResult<()> {
    Err(CtlError::PlatformError(-1))
}

pub fn is_permission_error(_err: &CtlError) -> bool {
    false
}
