//! Linux: per-thread nice values
//!
//! `setpriority(PRIO_PROCESS, tid, nice)` on a kernel thread id changes that
//! thread only. Raising priority (negative nice) needs `CAP_SYS_NICE` or a
//! permissive `RLIMIT_NICE`; without it the kernel answers `EACCES`/`EPERM`.

use ctlthread_core::{CtlError, CtlResult, Priority};
use nix::errno::Errno;

pub const PLATFORM_NAME: &str = "linux";

pub const PRIORITY_SUPPORTED: bool = true;

/// Kernel thread id
pub type NativeThreadId = libc::pid_t;

#[inline]
pub fn current_native_id() -> NativeThreadId {
    nix::unistd::gettid().as_raw()
}

/// Nice value for each level
pub const fn nice_for(priority: Priority) -> libc::c_int {
    match priority {
        Priority::Low => 10,
        Priority::BelowNormal => 5,
        Priority::Normal => 0,
        Priority::AboveNormal => -5,
        Priority::High => -10,
    }
}

pub fn apply_priority(tid: NativeThreadId, priority: Priority) -> CtlResult<()> {
    let rc = unsafe { libc::setpriority(libc::PRIO_PROCESS, tid as libc::id_t, nice_for(priority)) };
    Errno::result(rc)
        .map(drop)
        .map_err(|errno| CtlError::PlatformError(errno as i32))
}

/// Whether an error from `apply_priority` is a privilege refusal
pub fn is_permission_error(err: &CtlError) -> bool {
    matches!(err, CtlError::PlatformError(code)
        if *code == libc::EACCES || *code == libc::EPERM)
}
