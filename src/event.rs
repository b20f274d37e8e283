//! Ingest events: one per observed font request

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::codepoint;

/// A single "this character was rendered" signal
///
/// Produced by an ingestion adapter and appended exactly once to the
/// [`EventLog`](crate::event_log::EventLog).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestEvent {
    pub timestamp: DateTime<Utc>,
    pub session_id: String,
    pub codepoint: u32,
    pub source_ip: String,
    pub client_identifier: String,
}

impl IngestEvent {
    pub fn new(
        timestamp: DateTime<Utc>,
        session_id: impl Into<String>,
        codepoint: u32,
        source_ip: impl Into<String>,
        client_identifier: impl Into<String>,
    ) -> Self {
        Self {
            timestamp,
            session_id: session_id.into(),
            codepoint,
            source_ip: source_ip.into(),
            client_identifier: client_identifier.into(),
        }
    }

    /// Build an event from a hex code point as it appears in a font URL
    ///
    /// Returns `None` if the hex cannot be parsed.
    pub fn from_hex(
        timestamp: DateTime<Utc>,
        session_id: impl Into<String>,
        codepoint_hex: &str,
        source_ip: impl Into<String>,
        client_identifier: impl Into<String>,
    ) -> Option<Self> {
        let codepoint = codepoint::parse_hex(codepoint_hex)?;
        Some(Self::new(
            timestamp,
            session_id,
            codepoint,
            source_ip,
            client_identifier,
        ))
    }

    /// Display glyph for this event's code point
    pub fn glyph(&self) -> String {
        codepoint::glyph_for(self.codepoint)
    }

    /// Upper-case hex form of this event's code point
    pub fn codepoint_hex(&self) -> String {
        codepoint::format_hex(self.codepoint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_hex_parses_codepoint() {
        let event = IngestEvent::from_hex(Utc::now(), "abc", "0046", "10.0.0.1", "curl").unwrap();
        assert_eq!(event.codepoint, 0x46);
        assert_eq!(event.glyph(), "F");
        assert_eq!(event.codepoint_hex(), "0046");
    }

    #[test]
    fn test_from_hex_rejects_garbage() {
        assert!(IngestEvent::from_hex(Utc::now(), "abc", "nope", "10.0.0.1", "").is_none());
    }
}
