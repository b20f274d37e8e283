//! Append-only event log with offset-based tailing
//!
//! Every accepted font request lands here exactly once, at a strictly
//! increasing index. Pollers keep the last `total` they saw and ask for
//! everything after it.

use std::sync::{PoisonError, RwLock};

use crate::event::IngestEvent;

/// Default number of entries returned by [`EventLog::tail`]
pub const DEFAULT_TAIL_LIMIT: usize = 100;

/// Ordered, append-only record of ingest events
#[derive(Debug)]
pub struct EventLog {
    entries: RwLock<Vec<IngestEvent>>,
    tail_limit: usize,
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new(DEFAULT_TAIL_LIMIT)
    }
}

impl EventLog {
    /// Create an empty log whose `tail` returns at most `tail_limit` entries
    pub fn new(tail_limit: usize) -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
            tail_limit: tail_limit.max(1),
        }
    }

    /// Append an event and return its index
    pub fn append(&self, event: IngestEvent) -> usize {
        self.append_then(event, |_| {})
    }

    /// Append an event, then run `after` before the write lock is released
    ///
    /// Readers of the log cannot observe the new entry without also
    /// observing whatever `after` did.
    pub fn append_then<F>(&self, event: IngestEvent, after: F) -> usize
    where
        F: FnOnce(&IngestEvent),
    {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let index = entries.len();
        entries.push(event);
        after(&entries[index]);
        index
    }

    /// Events at or after `since`, bounded to the most recent `tail_limit`
    pub fn tail(&self, since: usize) -> Vec<IngestEvent> {
        self.tail_with_total(since).0
    }

    /// Like [`tail`](Self::tail), plus the log length seen by the same read
    pub fn tail_with_total(&self, since: usize) -> (Vec<IngestEvent>, usize) {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        let total = entries.len();
        if since >= total {
            return (Vec::new(), total);
        }
        let newer = &entries[since..];
        let start = newer.len().saturating_sub(self.tail_limit);
        (newer[start..].to_vec(), total)
    }

    /// Run `f` with the current length while holding the read lock
    ///
    /// No append can complete while `f` runs.
    pub fn with_len<R, F>(&self, f: F) -> R
    where
        F: FnOnce(usize) -> R,
    {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        f(entries.len())
    }

    /// Number of events appended so far
    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn tail_limit(&self) -> usize {
        self.tail_limit
    }

    /// Drop every event (process-wide reset)
    pub fn clear(&self) {
        self.clear_then(|| {});
    }

    /// Drop every event, then run `after` before the write lock is released
    pub fn clear_then<F: FnOnce()>(&self, after: F) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.clear();
        after();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn event(session: &str, cp: u32) -> IngestEvent {
        IngestEvent::new(Utc::now(), session, cp, "127.0.0.1", "test-agent")
    }

    #[test]
    fn test_append_assigns_increasing_indices() {
        let log = EventLog::default();
        assert_eq!(log.append(event("a", 0x41)), 0);
        assert_eq!(log.append(event("a", 0x42)), 1);
        assert_eq!(log.append(event("b", 0x41)), 2);
        assert_eq!(log.len(), 3);
    }

    #[test]
    fn test_tail_since_offset() {
        let log = EventLog::default();
        for cp in 0x41..0x46 {
            log.append(event("a", cp));
        }
        let tail = log.tail(3);
        assert_eq!(tail.len(), 2);
        assert_eq!(tail[0].codepoint, 0x44);
        assert_eq!(tail[1].codepoint, 0x45);
    }

    #[test]
    fn test_tail_past_end_is_empty() {
        let log = EventLog::default();
        log.append(event("a", 0x41));
        assert!(log.tail(1).is_empty());
        assert!(log.tail(50).is_empty());
    }

    #[test]
    fn test_tail_bounded_to_most_recent() {
        let log = EventLog::new(100);
        for i in 0..250u32 {
            log.append(event("a", 0x20 + (i % 90)));
        }
        let tail = log.tail(0);
        assert_eq!(tail.len(), 100);
        // Most recent entries, still in append order
        assert_eq!(tail[0].codepoint, 0x20 + (150 % 90));
        assert_eq!(tail[99].codepoint, 0x20 + (249 % 90));
    }

    #[test]
    fn test_append_then_runs_under_lock() {
        let log = EventLog::default();
        let mut seen = None;
        let index = log.append_then(event("s", 0x61), |e| seen = Some(e.codepoint));
        assert_eq!(index, 0);
        assert_eq!(seen, Some(0x61));
    }

    #[test]
    fn test_tail_with_total() {
        let log = EventLog::new(2);
        for cp in 0x41..0x45 {
            log.append(event("a", cp));
        }
        let (tail, total) = log.tail_with_total(0);
        assert_eq!(total, 4);
        assert_eq!(tail.len(), 2);
        assert_eq!(log.with_len(|len| len * 10), 40);
    }

    #[test]
    fn test_clear() {
        let log = EventLog::default();
        log.append(event("a", 0x41));
        log.clear();
        assert!(log.is_empty());
    }
}
