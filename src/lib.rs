//! TypeBleed - session aggregation and character-set reconstruction
//!
//! A page that routes every glyph through its own font URL leaks which
//! characters it rendered, one request per code point. This library collects
//! those requests into per-session character sets, then classifies each set
//! and lists the vocabulary words it could have spelled.

pub mod analyzer;
pub mod cli;
pub mod codepoint;
pub mod collector;
pub mod config;
pub mod event;
pub mod event_log;
pub mod inference;
pub mod journal;
pub mod json_output;
pub mod replay;
pub mod session;
pub mod text_output;
