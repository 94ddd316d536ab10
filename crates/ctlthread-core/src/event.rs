//! Event journal
//!
//! A bounded, lock-free record of what controllable threads did. Producers
//! are the control surface and the execution units; the consumer is
//! whatever renders the surface. When full, the oldest event is evicted.

use core::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use crossbeam_queue::ArrayQueue;
use crate::error::CtlError;
use crate::id::CtlThreadId;
use crate::state::Priority;

/// Default journal capacity
pub const DEFAULT_JOURNAL_CAPACITY: usize = 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    Created { argument: usize },
    Started,
    Paused,
    Resumed,
    /// Job body returned normally
    Finished,
    Terminated,
    /// Job body returned an error
    Failed(CtlError),
    Appended(String),
    PriorityChanged(Priority),
    Removed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadEvent {
    pub id: CtlThreadId,
    /// Time since the journal was created
    pub at: Duration,
    pub kind: EventKind,
}

impl fmt::Display for ThreadEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>6}ms {} ", self.at.as_millis(), self.id)?;
        match &self.kind {
            EventKind::Created { argument } => write!(f, "created (arg {})", argument),
            EventKind::Started => write!(f, "started"),
            EventKind::Paused => write!(f, "paused"),
            EventKind::Resumed => write!(f, "resumed"),
            EventKind::Finished => write!(f, "finished"),
            EventKind::Terminated => write!(f, "terminated"),
            EventKind::Failed(e) => write!(f, "failed: {}", e),
            EventKind::Appended(s) => write!(f, "appended \"{}\"", s),
            EventKind::PriorityChanged(p) => write!(f, "priority -> {}", p),
            EventKind::Removed => write!(f, "removed"),
        }
    }
}

pub struct EventJournal {
    queue: ArrayQueue<ThreadEvent>,
    epoch: Instant,
    evicted: AtomicU64,
}

impl EventJournal {
    pub fn new(capacity: usize) -> Self {
        Self {
            queue: ArrayQueue::new(capacity.max(1)),
            epoch: Instant::now(),
            evicted: AtomicU64::new(0),
        }
    }

    pub fn record(&self, id: CtlThreadId, kind: EventKind) {
        let event = ThreadEvent { id, at: self.epoch.elapsed(), kind };
        if self.queue.force_push(event).is_some() {
            self.evicted.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Take every queued event, oldest first
    pub fn drain(&self) -> Vec<ThreadEvent> {
        let mut out = Vec::with_capacity(self.queue.len());
        while let Some(event) = self.queue.pop() {
            out.push(event);
        }
        out
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Events lost to eviction since creation
    pub fn evicted(&self) -> u64 {
        self.evicted.load(Ordering::Relaxed)
    }
}

impl Default for EventJournal {
    fn default() -> Self {
        Self::new(DEFAULT_JOURNAL_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_in_order() {
        let j = EventJournal::new(8);
        let id = CtlThreadId::new(1);
        j.record(id, EventKind::Started);
        j.record(id, EventKind::Appended("1".into()));
        j.record(id, EventKind::Finished);

        let kinds: Vec<_> = j.drain().into_iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![EventKind::Started, EventKind::Appended("1".into()), EventKind::Finished]
        );
        assert!(j.is_empty());
    }

    #[test]
    fn test_eviction() {
        let j = EventJournal::new(2);
        let id = CtlThreadId::new(0);
        for _ in 0..5 {
            j.record(id, EventKind::Paused);
        }
        assert_eq!(j.len(), 2);
        assert_eq!(j.evicted(), 3);
    }

    #[test]
    fn test_display() {
        let e = ThreadEvent {
            id: CtlThreadId::new(4),
            at: Duration::from_millis(12),
            kind: EventKind::PriorityChanged(Priority::AboveNormal),
        };
        assert_eq!(e.to_string(), "    12ms #4 priority -> Above Normal");
    }
}
