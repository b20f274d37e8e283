//! Durable JSON-lines journal of ingested events
//!
//! The ingest path only enqueues; a sidecar thread owns the file and does
//! all the writing. Each line is a [`LogEntry`], the same record shape the
//! replay adapter reads, so a journal can be fed straight back into
//! `typebleed --log`.
//!
//! ```text
//! ingest() ── try_send ──▶ bounded channel ──▶ sidecar: write + flush
//! ```
//!
//! When the channel is full the record is dropped and counted; ingest never
//! waits on disk.

use crossbeam::channel::{self, Receiver, Sender, TrySendError};
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::json_output::LogEntry;

/// Append-only journal writer with a sidecar thread
pub struct Journal {
    path: PathBuf,
    sender: Option<Sender<LogEntry>>,
    writer_handle: Option<JoinHandle<()>>,
    total_pushed: Arc<AtomicU64>,
    total_dropped: Arc<AtomicU64>,
    total_written: Arc<AtomicU64>,
}

impl Journal {
    /// Open (or create) `path` for appending and start the writer thread
    ///
    /// # Panics
    ///
    /// Panics if capacity is 0.
    pub fn open<P: AsRef<Path>>(path: P, capacity: usize) -> io::Result<Self> {
        assert!(capacity > 0, "Journal capacity must be > 0");

        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let (sender, receiver) = channel::bounded(capacity);
        let total_written = Arc::new(AtomicU64::new(0));

        let written = total_written.clone();
        let writer_path = path.clone();
        let writer_handle = thread::Builder::new()
            .name("typebleed-journal".to_string())
            .spawn(move || Self::writer_worker(file, receiver, written, writer_path))?;

        Ok(Self {
            path,
            sender: Some(sender),
            writer_handle: Some(writer_handle),
            total_pushed: Arc::new(AtomicU64::new(0)),
            total_dropped: Arc::new(AtomicU64::new(0)),
            total_written,
        })
    }

    /// Queue one record for writing; never blocks
    pub fn push(&self, entry: LogEntry) {
        self.total_pushed.fetch_add(1, Ordering::Relaxed);

        let Some(sender) = &self.sender else {
            self.total_dropped.fetch_add(1, Ordering::Relaxed);
            return;
        };

        match sender.try_send(entry) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                self.total_dropped.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(path = %self.path.display(), "journal queue full, record dropped");
            }
            Err(TrySendError::Disconnected(_)) => {
                self.total_dropped.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(path = %self.path.display(), "journal writer gone, record dropped");
            }
        }
    }

    /// Flush everything queued so far and stop the writer thread
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        // Closing the channel ends the writer loop after it drains
        self.sender.take();
        if let Some(handle) = self.writer_handle.take() {
            if handle.join().is_err() {
                tracing::warn!(path = %self.path.display(), "journal writer panicked");
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn stats(&self) -> JournalStats {
        JournalStats {
            total_pushed: self.total_pushed.load(Ordering::Relaxed),
            total_dropped: self.total_dropped.load(Ordering::Relaxed),
            total_written: self.total_written.load(Ordering::Relaxed),
        }
    }

    fn writer_worker(
        file: File,
        receiver: Receiver<LogEntry>,
        written: Arc<AtomicU64>,
        path: PathBuf,
    ) {
        let mut out = BufWriter::new(file);

        // recv() fails only once every sender is gone and the queue is empty
        while let Ok(first) = receiver.recv() {
            let mut batch = vec![first];
            batch.extend(receiver.try_iter());

            for entry in &batch {
                if let Err(e) = Self::write_entry(&mut out, entry) {
                    tracing::warn!(path = %path.display(), error = %e, "journal write failed");
                    continue;
                }
                written.fetch_add(1, Ordering::Relaxed);
            }
            if let Err(e) = out.flush() {
                tracing::warn!(path = %path.display(), error = %e, "journal flush failed");
            }
        }
    }

    fn write_entry<W: Write>(out: &mut W, entry: &LogEntry) -> io::Result<()> {
        serde_json::to_writer(&mut *out, entry)?;
        out.write_all(b"\n")
    }
}

impl Drop for Journal {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for Journal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Journal")
            .field("path", &self.path)
            .field("stats", &self.stats())
            .finish()
    }
}

/// Journal counters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JournalStats {
    pub total_pushed: u64,
    pub total_dropped: u64,
    pub total_written: u64,
}

impl JournalStats {
    /// Fraction of pushed records that were dropped (0.0 to 1.0)
    pub fn drop_rate(&self) -> f64 {
        if self.total_pushed == 0 {
            0.0
        } else {
            self.total_dropped as f64 / self.total_pushed as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::IngestEvent;
    use chrono::Utc;
    use tempfile::TempDir;

    fn entry(cp: u32) -> LogEntry {
        LogEntry::from_event(&IngestEvent::new(Utc::now(), "sess", cp, "10.0.0.1", "ua"))
    }

    #[test]
    fn test_shutdown_flushes_all_records() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("journal.jsonl");
        let journal = Journal::open(&path, 64).unwrap();
        for cp in 0x41..0x45 {
            journal.push(entry(cp));
        }
        journal.shutdown();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 4);
        let first: LogEntry = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first.codepoint, "0041");
        assert_eq!(first.character, "A");
    }

    #[test]
    fn test_appends_to_existing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("journal.jsonl");
        std::fs::write(&path, "{\"existing\":true}\n").unwrap();
        let journal = Journal::open(&path, 8).unwrap();
        journal.push(entry(0x61));
        journal.shutdown();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
        assert!(content.starts_with("{\"existing\":true}"));
    }

    #[test]
    fn test_stats_count_pushes() {
        let dir = TempDir::new().unwrap();
        let journal = Journal::open(dir.path().join("j.jsonl"), 1024).unwrap();
        journal.push(entry(0x41));
        journal.push(entry(0x42));
        let stats = journal.stats();
        assert_eq!(stats.total_pushed, 2);
        assert_eq!(stats.total_dropped, 0);
    }

    #[test]
    #[should_panic(expected = "Journal capacity must be > 0")]
    fn test_zero_capacity_panics() {
        let dir = TempDir::new().unwrap();
        let _ = Journal::open(dir.path().join("j.jsonl"), 0);
    }

    #[test]
    fn test_open_fails_for_missing_directory() {
        assert!(Journal::open("/nonexistent/dir/journal.jsonl", 8).is_err());
    }

    #[test]
    fn test_drop_rate_calculation() {
        let stats = JournalStats {
            total_pushed: 100,
            total_dropped: 5,
            total_written: 95,
        };
        assert_eq!(stats.drop_rate(), 0.05);
    }
}
