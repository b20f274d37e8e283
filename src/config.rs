//! Engine configuration
//!
//! Every field has a default, so an empty TOML file (or no file at all)
//! yields the stock collector behaviour.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::event_log::DEFAULT_TAIL_LIMIT;
use crate::inference::Vocabulary;
use crate::session::RetentionPolicy;

/// Configuration for the collector engine and its adapters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum entries returned by one log tail request
    #[serde(default = "default_tail_limit")]
    pub tail_limit: usize,

    /// Word cap for the live sessions snapshot
    #[serde(default = "default_live_word_limit")]
    pub live_word_limit: usize,

    /// Word cap per category for offline reconstruction reports
    #[serde(default = "default_replay_word_limit")]
    pub replay_word_limit: usize,

    /// Client identifiers are cut to this many characters in snapshots
    #[serde(default = "default_client_identifier_max_len")]
    pub client_identifier_max_len: usize,

    /// Session table cap (0 = unbounded)
    #[serde(default = "default_max_sessions")]
    pub max_sessions: Option<usize>,

    /// Idle sessions older than this are evicted (None = never)
    pub session_ttl_secs: Option<u64>,

    /// Vocabulary categories merged into the live snapshot's word list
    #[serde(default = "default_live_categories")]
    pub live_categories: Vec<String>,

    /// Alternative vocabulary file (None = embedded default)
    pub vocabulary_path: Option<PathBuf>,

    /// Append every ingested event to this JSON-lines file
    pub journal_path: Option<PathBuf>,

    /// Records buffered between the ingest path and the journal writer
    #[serde(default = "default_journal_capacity")]
    pub journal_capacity: usize,
}

fn default_tail_limit() -> usize {
    DEFAULT_TAIL_LIMIT
}

fn default_live_word_limit() -> usize {
    15
}

fn default_replay_word_limit() -> usize {
    10
}

fn default_client_identifier_max_len() -> usize {
    80
}

fn default_max_sessions() -> Option<usize> {
    Some(10_000)
}

fn default_live_categories() -> Vec<String> {
    vec!["live".to_string()]
}

fn default_journal_capacity() -> usize {
    8192
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tail_limit: default_tail_limit(),
            live_word_limit: default_live_word_limit(),
            replay_word_limit: default_replay_word_limit(),
            client_identifier_max_len: default_client_identifier_max_len(),
            max_sessions: default_max_sessions(),
            session_ttl_secs: None,
            live_categories: default_live_categories(),
            vocabulary_path: None,
            journal_path: None,
            journal_capacity: default_journal_capacity(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from a TOML file
    pub fn from_toml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).with_context(|| {
            format!("Failed to read config file: {}", path.as_ref().display())
        })?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))
    }

    /// Session retention derived from the cap and TTL settings
    pub fn retention(&self) -> RetentionPolicy {
        RetentionPolicy {
            max_sessions: self.max_sessions.filter(|&max| max > 0),
            ttl: self
                .session_ttl_secs
                .map(|secs| chrono::Duration::seconds(secs.min(u32::MAX as u64) as i64)),
        }
    }

    /// The configured vocabulary, or the embedded one
    pub fn load_vocabulary(&self) -> Result<Vocabulary> {
        match &self.vocabulary_path {
            Some(path) => Vocabulary::from_toml(path),
            None => Vocabulary::embedded(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_config_default() {
        let config = EngineConfig::default();
        assert_eq!(config.tail_limit, 100);
        assert_eq!(config.live_word_limit, 15);
        assert_eq!(config.replay_word_limit, 10);
        assert_eq!(config.client_identifier_max_len, 80);
        assert_eq!(config.max_sessions, Some(10_000));
        assert!(config.session_ttl_secs.is_none());
        assert_eq!(config.live_categories, vec!["live"]);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "tail_limit = 25\nsession_ttl_secs = 3600").unwrap();
        let config = EngineConfig::from_toml(file.path()).unwrap();
        assert_eq!(config.tail_limit, 25);
        assert_eq!(config.session_ttl_secs, Some(3600));
        assert_eq!(config.live_word_limit, 15);
        assert_eq!(
            config.retention().ttl,
            Some(chrono::Duration::seconds(3600))
        );
    }

    #[test]
    fn test_zero_max_sessions_is_unbounded() {
        let config: EngineConfig = toml::from_str("max_sessions = 0").unwrap();
        assert_eq!(config.retention().max_sessions, None);
    }

    #[test]
    fn test_empty_toml_is_default() {
        let config: EngineConfig = toml::from_str("").unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_invalid_toml() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "tail_limit = \"lots\"").unwrap();
        let err = EngineConfig::from_toml(file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn test_load_embedded_vocabulary() {
        let vocab = EngineConfig::default().load_vocabulary().unwrap();
        assert!(vocab.get("banking").is_some());
    }
}
