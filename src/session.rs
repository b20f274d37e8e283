//! Per-session aggregation of ingest events
//!
//! A session is one page instance: every font request carrying the same
//! session id contributes its code point to that session's captured set.
//! The set only ever grows, and repeated code points collapse.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::codepoint;
use crate::event::IngestEvent;

/// Aggregate state for one session id
///
/// A previously unseen id starts from `Session::default()` (empty set, no
/// timestamps, empty strings) before its first event is applied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub captured: BTreeSet<u32>,
    pub first_seen: Option<DateTime<Utc>>,
    pub last_seen: Option<DateTime<Utc>>,
    pub ip: String,
    pub client_identifier: String,
}

impl Session {
    /// Fold one event into the aggregate
    ///
    /// Returns `true` if the code point was not captured before.
    pub fn apply(&mut self, event: &IngestEvent) -> bool {
        let inserted = self.captured.insert(event.codepoint);
        if self.first_seen.is_none() {
            self.first_seen = Some(event.timestamp);
        }
        // Late events never move last_seen backwards
        self.last_seen = Some(match self.last_seen {
            Some(current) => current.max(event.timestamp),
            None => event.timestamp,
        });
        self.ip = event.source_ip.clone();
        self.client_identifier = event.client_identifier.clone();
        inserted
    }

    pub fn is_empty(&self) -> bool {
        self.captured.is_empty()
    }

    pub fn char_count(&self) -> usize {
        self.captured.len()
    }

    /// Display glyphs of the captured set, ordered by code point
    pub fn glyphs(&self) -> Vec<String> {
        self.captured.iter().map(|&cp| codepoint::glyph_for(cp)).collect()
    }
}

/// Point-in-time copy of a session, safe to read while ingest continues
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub session_id: String,
    pub session: Session,
}

impl SessionSnapshot {
    /// Glyph set for analysis and inference
    pub fn char_set(&self) -> BTreeSet<String> {
        self.session.glyphs().into_iter().collect()
    }
}

/// Limits applied to the session table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    /// Maximum number of live sessions; the least recently seen is evicted
    /// when a new session would exceed it
    pub max_sessions: Option<usize>,
    /// Sessions idle for longer than this are dropped on the next sweep
    pub ttl: Option<Duration>,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            max_sessions: Some(10_000),
            ttl: None,
        }
    }
}

impl RetentionPolicy {
    pub fn unbounded() -> Self {
        Self {
            max_sessions: None,
            ttl: None,
        }
    }
}

/// Keyed store of all session aggregates
///
/// `ingest` is the only write path. Each event is applied under one lock,
/// so the set insertion and the `last_seen` update are never observed apart.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: Mutex<HashMap<String, Session>>,
    policy: RetentionPolicy,
}

impl SessionStore {
    pub fn new(policy: RetentionPolicy) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            policy,
        }
    }

    /// Apply one event to its session, creating the session if needed
    ///
    /// Returns `true` if the event added a new code point to the session.
    pub fn ingest(&self, event: &IngestEvent) -> bool {
        let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        if !sessions.contains_key(&event.session_id) {
            self.make_room(&mut sessions, event.timestamp);
        }
        sessions
            .entry(event.session_id.clone())
            .or_default()
            .apply(event)
    }

    /// Sweep expired sessions and enforce the session cap before an insert
    fn make_room(&self, sessions: &mut HashMap<String, Session>, now: DateTime<Utc>) {
        if let Some(ttl) = self.policy.ttl {
            let before = sessions.len();
            sessions.retain(|_, s| !is_expired(s, now, ttl));
            let evicted = before - sessions.len();
            if evicted > 0 {
                tracing::debug!(evicted, "expired idle sessions");
            }
        }

        if let Some(max) = self.policy.max_sessions {
            while !sessions.is_empty() && sessions.len() >= max {
                let oldest = sessions
                    .iter()
                    .min_by_key(|(_, s)| s.last_seen)
                    .map(|(id, _)| id.clone());
                match oldest {
                    Some(id) => {
                        tracing::warn!(session = %id, max, "session table full, evicting least recently seen");
                        sessions.remove(&id);
                    }
                    None => break,
                }
            }
        }
    }

    /// Drop sessions idle longer than the configured TTL
    ///
    /// Returns the number of sessions removed. A store without a TTL never
    /// expires anything.
    pub fn evict_expired(&self, now: DateTime<Utc>) -> usize {
        let Some(ttl) = self.policy.ttl else {
            return 0;
        };
        let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        let before = sessions.len();
        sessions.retain(|_, s| !is_expired(s, now, ttl));
        before - sessions.len()
    }

    /// Snapshot of every non-empty session, most recently active first
    pub fn list_sessions(&self) -> Vec<SessionSnapshot> {
        let mut listed: Vec<SessionSnapshot> = {
            let sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
            sessions
                .iter()
                .filter(|(_, s)| !s.is_empty())
                .map(|(id, s)| SessionSnapshot {
                    session_id: id.clone(),
                    session: s.clone(),
                })
                .collect()
        };
        // Ties broken by id so listings are deterministic
        listed.sort_by(|a, b| {
            b.session
                .last_seen
                .cmp(&a.session.last_seen)
                .then_with(|| a.session_id.cmp(&b.session_id))
        });
        listed
    }

    /// Snapshot of one session, if it exists
    pub fn get(&self, session_id: &str) -> Option<SessionSnapshot> {
        let sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        sessions.get(session_id).map(|s| SessionSnapshot {
            session_id: session_id.to_string(),
            session: s.clone(),
        })
    }

    /// Distinct source IPs across listed (non-empty) sessions
    pub fn unique_ips(&self) -> usize {
        let sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        sessions
            .values()
            .filter(|s| !s.is_empty())
            .map(|s| s.ip.as_str())
            .collect::<HashSet<_>>()
            .len()
    }

    /// Number of sessions in the table, including empty ones
    pub fn len(&self) -> usize {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Forget every session
    pub fn reset(&self) {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn policy(&self) -> RetentionPolicy {
        self.policy
    }
}

fn is_expired(session: &Session, now: DateTime<Utc>, ttl: Duration) -> bool {
    match session.last_seen {
        Some(last) => now - last > ttl,
        None => false,
    }
}
