//! Controllable thread identifier type

use core::fmt;
use core::sync::atomic::{AtomicU32, Ordering};

/// Stable identity of a controllable thread
///
/// Assigned once at creation and never reused within a process. It only
/// serves to correlate rows in a control surface; registry indices shift on
/// removal, ids do not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct CtlThreadId(u32);

static NEXT_ID: AtomicU32 = AtomicU32::new(0);

impl CtlThreadId {
    /// Allocate the next process-unique id
    pub fn next() -> Self {
        CtlThreadId(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    #[inline]
    pub const fn new(id: u32) -> Self {
        CtlThreadId(id)
    }

    #[inline]
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Display for CtlThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_is_unique() {
        let a = CtlThreadId::next();
        let b = CtlThreadId::next();
        assert_ne!(a, b);
        assert!(b > a);
        assert_eq!(CtlThreadId::new(b.as_u32()), b);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", CtlThreadId::new(7)), "#7");
    }
}
