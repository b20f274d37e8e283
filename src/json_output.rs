//! JSON shapes exchanged with the dashboard and the reconstructor
//!
//! The live collector and the offline replay both emit [`SessionsReport`];
//! the reconstructor reads it back (from a file replay or over HTTP) and
//! writes [`ReconstructionReport`] for `--format json`.

use chrono::{DateTime, TimeZone, Utc};
use serde::{de, Deserialize, Deserializer, Serialize};
use std::collections::HashSet;

use crate::analyzer::{self, CharacterSetAnalysis};
use crate::event::IngestEvent;
use crate::inference::{self, Vocabulary, WordInferenceResult};
use crate::session::SessionSnapshot;

/// Shown in place of a space in `sorted_chars`
pub const SPACE_MARKER: char = '␣';

/// One non-empty session as shown on the dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionView {
    pub session_id: String,
    pub ip: String,
    #[serde(default, alias = "user_agent")]
    pub client_identifier: String,
    #[serde(default, deserialize_with = "deserialize_optional_timestamp")]
    pub first_seen: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "deserialize_optional_timestamp")]
    pub last_seen: Option<DateTime<Utc>>,
    pub char_count: usize,
    pub characters: Vec<String>,
    pub codepoints: Vec<String>,
    #[serde(default)]
    pub sorted_chars: String,
    #[serde(default)]
    pub inferred_words: Vec<String>,
}

/// Sessions snapshot plus aggregate counters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionsReport {
    pub sessions: Vec<SessionView>,
    pub session_count: usize,
    pub total_chars: usize,
    pub total_requests: usize,
    pub unique_ips: usize,
}

/// How snapshots are turned into views
#[derive(Debug, Clone, Copy)]
pub struct ReportOptions<'a> {
    pub vocabulary: &'a Vocabulary,
    /// Categories merged into `inferred_words` (None = all)
    pub categories: Option<&'a [&'a str]>,
    pub word_limit: Option<usize>,
    pub client_identifier_max_len: usize,
}

impl<'a> ReportOptions<'a> {
    /// Options that leave `inferred_words` empty, for callers that run
    /// their own per-category inference
    pub fn without_words(vocabulary: &'a Vocabulary, client_identifier_max_len: usize) -> Self {
        Self {
            vocabulary,
            categories: Some(&[]),
            word_limit: Some(0),
            client_identifier_max_len,
        }
    }
}

/// Timestamp from JSON: RFC 3339 string or float/integer Unix seconds
pub fn timestamp_from_json(value: &serde_json::Value) -> Option<DateTime<Utc>> {
    match value {
        serde_json::Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        serde_json::Value::Number(n) => {
            let secs = n.as_f64()?;
            if !secs.is_finite() || secs < 0.0 {
                return None;
            }
            let whole = secs.trunc();
            let nanos = ((secs - whole) * 1e9).round().min(999_999_999.0) as u32;
            Utc.timestamp_opt(whole as i64, nanos).single()
        }
        _ => None,
    }
}

// Live collectors may send epoch seconds instead of RFC 3339
fn deserialize_optional_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<serde_json::Value>::deserialize(deserializer)? {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(value) => timestamp_from_json(&value)
            .map(Some)
            .ok_or_else(|| de::Error::custom(format!("invalid timestamp: {}", value))),
    }
}

/// Glyphs sorted as strings, spaces made visible
pub fn sorted_chars<S: AsRef<str>>(characters: &[S]) -> String {
    let mut sorted: Vec<&str> = characters.iter().map(|c| c.as_ref()).collect();
    sorted.sort_unstable();
    sorted
        .into_iter()
        .map(|c| if c == " " { SPACE_MARKER.to_string() } else { c.to_string() })
        .collect()
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

impl SessionView {
    pub fn from_snapshot(snapshot: &SessionSnapshot, options: &ReportOptions<'_>) -> Self {
        let session = &snapshot.session;
        let characters = session.glyphs();
        let codepoints = session
            .captured
            .iter()
            .map(|&cp| crate::codepoint::format_hex(cp))
            .collect();
        let inferred_words = inference::infer_flat(
            options.vocabulary,
            &characters,
            options.categories,
            options.word_limit,
        );

        Self {
            session_id: snapshot.session_id.clone(),
            ip: session.ip.clone(),
            client_identifier: truncate_chars(
                &session.client_identifier,
                options.client_identifier_max_len,
            ),
            first_seen: session.first_seen,
            last_seen: session.last_seen,
            char_count: characters.len(),
            sorted_chars: sorted_chars(&characters),
            characters,
            codepoints,
            inferred_words,
        }
    }
}

impl SessionsReport {
    /// Build a report from snapshots already ordered for display
    pub fn from_snapshots(
        snapshots: &[SessionSnapshot],
        total_requests: usize,
        options: &ReportOptions<'_>,
    ) -> Self {
        let sessions: Vec<SessionView> = snapshots
            .iter()
            .filter(|s| !s.session.is_empty())
            .map(|s| SessionView::from_snapshot(s, options))
            .collect();
        let unique_ips = sessions
            .iter()
            .map(|s| s.ip.as_str())
            .collect::<HashSet<_>>()
            .len();

        Self {
            session_count: sessions.len(),
            total_chars: sessions.iter().map(|s| s.char_count).sum(),
            total_requests,
            unique_ips,
            sessions,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// One event as shown in the live access log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub ip: String,
    pub session_id: String,
    /// Upper-case hex code point
    pub codepoint: String,
    pub character: String,
    #[serde(default, alias = "user_agent")]
    pub client_identifier: String,
}

impl LogEntry {
    pub fn from_event(event: &IngestEvent) -> Self {
        Self {
            timestamp: event.timestamp,
            ip: event.source_ip.clone(),
            session_id: event.session_id.clone(),
            codepoint: event.codepoint_hex(),
            character: event.glyph(),
            client_identifier: event.client_identifier.clone(),
        }
    }
}

/// Incremental log poll result
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogTail {
    pub entries: Vec<LogEntry>,
    /// Log length at the time of the poll; pass it back as the next `since`
    pub total: usize,
}

/// Analysis of one session for the reconstructor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionReconstruction {
    pub session_id: String,
    pub ip: String,
    pub char_count: usize,
    pub characters: Vec<String>,
    pub codepoints: Vec<String>,
    pub analysis: CharacterSetAnalysis,
    pub inferred_words: WordInferenceResult,
}

impl SessionReconstruction {
    pub fn from_view(
        view: &SessionView,
        vocabulary: &Vocabulary,
        categories: Option<&[&str]>,
        word_limit: Option<usize>,
    ) -> Self {
        Self {
            session_id: view.session_id.clone(),
            ip: view.ip.clone(),
            char_count: view.characters.len(),
            characters: view.characters.clone(),
            codepoints: view.codepoints.clone(),
            analysis: analyzer::analyze(&view.characters),
            inferred_words: inference::infer(vocabulary, &view.characters, categories, word_limit),
        }
    }
}

/// Root structure for `--format json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconstructionReport {
    /// Format version identifier
    pub version: String,
    /// Format name
    pub format: String,
    pub sessions: Vec<SessionReconstruction>,
}

impl ReconstructionReport {
    pub fn new() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            format: "typebleed-reconstruction-v1".to_string(),
            sessions: Vec::new(),
        }
    }

    pub fn add_session(&mut self, session: SessionReconstruction) {
        self.sessions.push(session);
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl Default for ReconstructionReport {
    fn default() -> Self {
        Self::new()
    }
}
