//! Offline replay: rebuild sessions from recorded font requests
//!
//! Two sources feed the reconstructor:
//!
//! - a JSON-lines access log (the collector journal, or any log with at
//!   least `session_id`, `codepoint` and `ip` per line), aggregated here in
//!   one pass without touching a live event log;
//! - a running collector's sessions endpoint, fetched over HTTP.
//!
//! A bad line is skipped on its own. Failing to reach the source at all is
//! a [`ReplayError`], never an empty report.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::event::IngestEvent;
use crate::json_output::{timestamp_from_json, ReportOptions, SessionsReport};
use crate::session::{RetentionPolicy, SessionSnapshot, SessionStore};

/// Path of the sessions snapshot on a live collector
pub const SESSIONS_ENDPOINT: &str = "/api/sessions";

/// Timeout for fetching a live snapshot
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Session id used for records that carry none
pub const UNKNOWN_SESSION: &str = "unknown";

/// Errors that make a replay source unusable
#[derive(Error, Debug)]
pub enum ReplayError {
    #[error("Failed to read log file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Collector unreachable at {url}: {source}")]
    Unreachable {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Unexpected response from {url}: {reason}")]
    BadResponse { url: String, reason: String },
}

/// Result type for replay sources
pub type Result<T> = std::result::Result<T, ReplayError>;

/// Per-replay line counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplayStats {
    /// Non-blank lines seen
    pub lines_read: usize,
    /// Lines that became ingest events
    pub records_ingested: usize,
    /// Lines dropped as malformed
    pub skipped_lines: usize,
}

/// Sessions rebuilt from a log, ordered most recently active first
#[derive(Debug, Clone, Default)]
pub struct ReplayOutcome {
    pub sessions: Vec<SessionSnapshot>,
    pub stats: ReplayStats,
}

impl ReplayOutcome {
    /// Same shape the live collector serves
    pub fn into_report(self, options: &ReportOptions<'_>) -> SessionsReport {
        SessionsReport::from_snapshots(&self.sessions, self.stats.records_ingested, options)
    }
}

#[derive(Debug, Deserialize)]
struct ReplayRecord {
    #[serde(default)]
    session_id: Option<String>,
    codepoint: String,
    #[serde(default)]
    ip: String,
    #[serde(default)]
    timestamp: Option<serde_json::Value>,
    #[serde(default, alias = "user_agent")]
    client_identifier: String,
}

/// Parse one log line into an ingest event
///
/// `fallback` stamps records without a usable timestamp. Returns `None`
/// for blank, malformed, or codepoint-less lines.
pub fn parse_line(line: &str, fallback: DateTime<Utc>) -> Option<IngestEvent> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let record: ReplayRecord = serde_json::from_str(line).ok()?;
    let timestamp = record
        .timestamp
        .as_ref()
        .and_then(timestamp_from_json)
        .unwrap_or(fallback);
    let session_id = record
        .session_id
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| UNKNOWN_SESSION.to_string());

    IngestEvent::from_hex(
        timestamp,
        session_id,
        &record.codepoint,
        record.ip,
        record.client_identifier,
    )
}

/// Aggregate log lines into sessions
pub fn replay_lines<I, S>(lines: I) -> ReplayOutcome
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut replay = Replay::new();
    for line in lines {
        replay.feed(line.as_ref());
    }
    replay.finish()
}

/// Aggregate a JSON-lines stream into sessions
///
/// An I/O error part-way through fails the whole replay; malformed lines
/// do not.
pub fn replay_reader<R: BufRead>(reader: R, source: &Path) -> Result<ReplayOutcome> {
    let mut replay = Replay::new();
    for line in reader.lines() {
        let line = line.map_err(|source_err| ReplayError::Io {
            path: source.to_path_buf(),
            source: source_err,
        })?;
        replay.feed(&line);
    }
    Ok(replay.finish())
}

/// Aggregate a JSON-lines log file into sessions
pub fn replay_file<P: AsRef<Path>>(path: P) -> Result<ReplayOutcome> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| ReplayError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    replay_reader(BufReader::new(file), path)
}

/// One-shot aggregation state
struct Replay {
    store: SessionStore,
    stats: ReplayStats,
    started: DateTime<Utc>,
}

impl Replay {
    fn new() -> Self {
        Self {
            store: SessionStore::new(RetentionPolicy::unbounded()),
            stats: ReplayStats::default(),
            started: Utc::now(),
        }
    }

    fn feed(&mut self, line: &str) {
        if line.trim().is_empty() {
            return;
        }
        self.stats.lines_read += 1;
        match parse_line(line, self.started) {
            Some(event) => {
                self.store.ingest(&event);
                self.stats.records_ingested += 1;
            }
            None => {
                self.stats.skipped_lines += 1;
                tracing::debug!(line = self.stats.lines_read, "skipping malformed log line");
            }
        }
    }

    fn finish(self) -> ReplayOutcome {
        ReplayOutcome {
            sessions: self.store.list_sessions(),
            stats: self.stats,
        }
    }
}

/// Fetch the sessions snapshot from a running collector
///
/// `base_url` is the collector root, e.g. `http://localhost:8080`.
pub fn fetch_sessions(base_url: &str) -> Result<SessionsReport> {
    let url = format!("{}{}", base_url.trim_end_matches('/'), SESSIONS_ENDPOINT);
    let unreachable = |source| ReplayError::Unreachable {
        url: url.clone(),
        source,
    };

    let client = reqwest::blocking::Client::builder()
        .timeout(FETCH_TIMEOUT)
        .build()
        .map_err(unreachable)?;
    let response = client.get(&url).send().map_err(unreachable)?;

    let status = response.status();
    if !status.is_success() {
        return Err(ReplayError::BadResponse {
            url: url.clone(),
            reason: format!("HTTP {}", status),
        });
    }

    let body = response.text().map_err(unreachable)?;
    serde_json::from_str(&body).map_err(|e| ReplayError::BadResponse {
        url: url.clone(),
        reason: format!("invalid sessions JSON: {}", e),
    })
}
