//! Live collector: the shared engine behind the font-serving endpoint
//!
//! Owns the event log and the session store. Construct one per process,
//! wrap it in an `Arc`, and hand it to every request handler. The delivery
//! layer calls [`Collector::record_font_request`] for each tracked font URL
//! and polls [`Collector::sessions_report`] / [`Collector::log_tail`] for the
//! dashboard.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};

use crate::analyzer::{self, CharacterSetAnalysis};
use crate::codepoint;
use crate::config::EngineConfig;
use crate::event::IngestEvent;
use crate::event_log::EventLog;
use crate::inference::{self, Vocabulary, WordInferenceResult};
use crate::journal::{Journal, JournalStats};
use crate::json_output::{LogEntry, LogTail, ReportOptions, SessionsReport};
use crate::session::{SessionSnapshot, SessionStore};

/// Path prefix of tracked font URLs: `/fonts/t/<session>/<codepoint>.woff2`
pub const TRACKED_FONT_PREFIX: &str = "/fonts/t/";

/// One tracked font request as seen by the delivery layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontRequest {
    pub session_id: String,
    pub codepoint_hex: String,
    pub remote_addr: String,
    pub user_agent: String,
}

impl FontRequest {
    pub fn new(
        session_id: impl Into<String>,
        codepoint_hex: impl Into<String>,
        remote_addr: impl Into<String>,
        user_agent: Option<&str>,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            codepoint_hex: codepoint_hex.into(),
            remote_addr: remote_addr.into(),
            user_agent: user_agent.unwrap_or_default().to_string(),
        }
    }

    /// Parse a tracked font URL path
    ///
    /// Returns `None` unless the path is `/fonts/t/<session>/<hex>.woff2`
    /// with a non-empty session and code point.
    pub fn from_path(path: &str, remote_addr: &str, user_agent: Option<&str>) -> Option<Self> {
        let rest = path.strip_prefix(TRACKED_FONT_PREFIX)?;
        let (session_id, file) = rest.split_once('/')?;
        let codepoint_hex = file.strip_suffix(".woff2")?;
        if session_id.is_empty() || codepoint_hex.is_empty() || codepoint_hex.contains('/') {
            return None;
        }
        Some(Self::new(session_id, codepoint_hex, remote_addr, user_agent))
    }
}

/// What a single font request revealed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capture {
    /// Index of the event in the log
    pub index: usize,
    pub codepoint: u32,
    pub glyph: String,
    /// False when the session had already captured this code point
    pub is_new: bool,
}

/// Shared collector engine
#[derive(Debug)]
pub struct Collector {
    log: EventLog,
    sessions: SessionStore,
    vocabulary: Vocabulary,
    config: EngineConfig,
    journal: Option<Journal>,
}

impl Collector {
    /// Build a collector from configuration
    ///
    /// Loads the configured vocabulary and opens the journal, if any.
    pub fn new(config: EngineConfig) -> Result<Self> {
        let vocabulary = config.load_vocabulary()?;
        let journal = match &config.journal_path {
            Some(path) => Some(
                Journal::open(path, config.journal_capacity.max(1))
                    .with_context(|| format!("Failed to open journal: {}", path.display()))?,
            ),
            None => None,
        };
        let mut collector = Self::with_vocabulary(config, vocabulary);
        collector.journal = journal;
        Ok(collector)
    }

    /// Build a collector with an explicit vocabulary and no journal
    pub fn with_vocabulary(config: EngineConfig, vocabulary: Vocabulary) -> Self {
        Self {
            log: EventLog::new(config.tail_limit),
            sessions: SessionStore::new(config.retention()),
            vocabulary,
            config,
            journal: None,
        }
    }

    /// Append an event to the log and fold it into its session
    ///
    /// The session update and the journal enqueue happen while the log
    /// entry is still being published, so a reader never sees one without
    /// the other and the journal keeps log order.
    pub fn ingest_event(&self, event: IngestEvent) -> Capture {
        let entry = self.journal.as_ref().map(|_| LogEntry::from_event(&event));
        let codepoint = event.codepoint;

        let mut is_new = false;
        let index = self.log.append_then(event, |e| {
            is_new = self.sessions.ingest(e);
            // try_send only, nothing blocks under the lock
            if let (Some(journal), Some(entry)) = (&self.journal, entry) {
                journal.push(entry);
            }
        });

        Capture {
            index,
            codepoint,
            glyph: codepoint::glyph_for(codepoint),
            is_new,
        }
    }

    /// Ingest one observed character from its hex code point
    ///
    /// Returns `None` (and records nothing) if the hex is not a code point.
    pub fn ingest(
        &self,
        session_id: &str,
        codepoint_hex: &str,
        ip: &str,
        client_identifier: &str,
        timestamp: DateTime<Utc>,
    ) -> Option<Capture> {
        match IngestEvent::from_hex(timestamp, session_id, codepoint_hex, ip, client_identifier) {
            Some(event) => Some(self.ingest_event(event)),
            None => {
                tracing::debug!(session = %session_id, codepoint = %codepoint_hex, "ignoring unparsable code point");
                None
            }
        }
    }

    /// Live adapter: record one tracked font request at the current time
    pub fn record_font_request(&self, request: &FontRequest) -> Option<Capture> {
        let capture = self.ingest(
            &request.session_id,
            &request.codepoint_hex,
            &request.remote_addr,
            &request.user_agent,
            Utc::now(),
        )?;
        let short: String = request.session_id.chars().take(8).collect();
        tracing::info!(
            session = %short,
            codepoint = %codepoint::format_hex(capture.codepoint),
            glyph = %capture.glyph,
            ip = %request.remote_addr,
            new = capture.is_new,
            "captured font request"
        );
        Some(capture)
    }

    /// Snapshot of every non-empty session, most recently active first
    pub fn list_sessions(&self) -> Vec<SessionSnapshot> {
        self.sessions.list_sessions()
    }

    /// Snapshot of one session
    pub fn session(&self, session_id: &str) -> Option<SessionSnapshot> {
        self.sessions.get(session_id)
    }

    /// Total events ever appended
    pub fn total_requests(&self) -> usize {
        self.log.len()
    }

    /// Distinct source IPs across non-empty sessions
    pub fn unique_ips(&self) -> usize {
        self.sessions.unique_ips()
    }

    /// Dashboard snapshot: every session with its live word list
    pub fn sessions_report(&self) -> SessionsReport {
        // Count and snapshot under the same log read, so total_requests
        // covers every event reflected in the sessions
        let (total_requests, snapshots) = self
            .log
            .with_len(|len| (len, self.sessions.list_sessions()));

        let categories: Vec<&str> = self.config.live_categories.iter().map(String::as_str).collect();
        let options = ReportOptions {
            vocabulary: &self.vocabulary,
            categories: Some(&categories),
            word_limit: Some(self.config.live_word_limit),
            client_identifier_max_len: self.config.client_identifier_max_len,
        };
        SessionsReport::from_snapshots(&snapshots, total_requests, &options)
    }

    /// Incremental log poll
    pub fn log_tail(&self, since: usize) -> LogTail {
        let (events, total) = self.log.tail_with_total(since);
        LogTail {
            entries: events.iter().map(LogEntry::from_event).collect(),
            total,
        }
    }

    /// Character-set analysis of one session
    pub fn analyze_session(&self, session_id: &str) -> Option<CharacterSetAnalysis> {
        let snapshot = self.sessions.get(session_id)?;
        Some(analyzer::analyze(snapshot.char_set()))
    }

    /// Candidate words for one session
    pub fn infer_session(
        &self,
        session_id: &str,
        categories: Option<&[&str]>,
        limit: Option<usize>,
    ) -> Option<WordInferenceResult> {
        let snapshot = self.sessions.get(session_id)?;
        Some(inference::infer(&self.vocabulary, snapshot.char_set(), categories, limit))
    }

    /// Drop sessions idle past the configured TTL
    pub fn evict_expired(&self) -> usize {
        self.sessions.evict_expired(Utc::now())
    }

    /// Forget all sessions and events
    pub fn reset(&self) {
        // Same lock order as ingest: log first, then sessions
        self.log.clear_then(|| self.sessions.reset());
        tracing::info!("collector state reset");
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn journal_stats(&self) -> Option<JournalStats> {
        self.journal.as_ref().map(Journal::stats)
    }

    /// Flush the journal and release the collector
    pub fn shutdown(mut self) {
        if let Some(journal) = self.journal.take() {
            journal.shutdown();
        }
    }
}
