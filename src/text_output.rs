//! Human-readable reconstruction report
//!
//! Mirrors what an analyst reads at the terminal: the character set per
//! session, how it classifies, which patterns fire, and the words it could
//! spell.

use std::fmt::Write;

use crate::codepoint;
use crate::json_output::{sorted_chars, SessionReconstruction};

const RULE_WIDTH: usize = 60;

/// Text report formatter
#[derive(Debug)]
pub struct TextReport {
    sessions: Vec<SessionReconstruction>,
    verbose: bool,
}

impl TextReport {
    pub fn new(verbose: bool) -> Self {
        Self {
            sessions: Vec::new(),
            verbose,
        }
    }

    pub fn add_session(&mut self, session: SessionReconstruction) {
        self.sessions.push(session);
    }

    fn header(out: &mut String) {
        out.push_str("╔══════════════════════════════════════════════════════════╗\n");
        out.push_str("║         TypeBleed - Text Reconstruction Analysis         ║\n");
        out.push_str("╚══════════════════════════════════════════════════════════╝\n");
    }

    fn format_session(&self, out: &mut String, session: &SessionReconstruction) {
        let rule = "=".repeat(RULE_WIDTH);
        let analysis = &session.analysis;

        let _ = writeln!(out, "\n{}", rule);
        let _ = writeln!(out, "  Session: {}", session.session_id);
        if !session.ip.is_empty() {
            let _ = writeln!(out, "  IP:      {}", session.ip);
        }
        let _ = writeln!(out, "  Unique characters captured: {}", session.char_count);
        let _ = writeln!(out, "{}", rule);

        let _ = writeln!(out, "\n  [Character Set]");
        let _ = writeln!(out, "  {{{}}}", sorted_chars(&session.characters));

        let _ = writeln!(out, "\n  [Classification]");
        let _ = writeln!(out, "  Digits:      {}", yes_no(analysis.has_digits));
        let _ = writeln!(out, "  Uppercase:   {}", yes_no(analysis.has_uppercase));
        let _ = writeln!(out, "  Lowercase:   {}", yes_no(analysis.has_lowercase));
        let _ = writeln!(out, "  Currency:    {}", yes_no(analysis.has_currency));
        let _ = writeln!(out, "  Punctuation: {}", yes_no(analysis.has_punctuation));
        if !analysis.uppercase.is_empty() {
            let _ = writeln!(out, "  Uppercase:   {}", analysis.uppercase.concat());
        }
        if !analysis.lowercase.is_empty() {
            let _ = writeln!(out, "  Lowercase:   {}", analysis.lowercase.concat());
        }
        if !analysis.digits.is_empty() {
            let _ = writeln!(out, "  Digits:      {}", analysis.digits.concat());
        }
        if !analysis.special.is_empty() {
            let _ = writeln!(out, "  Special:     {}", analysis.special.concat());
        }

        if !analysis.patterns.is_empty() {
            let _ = writeln!(out, "\n  [Detected Patterns]");
            for pattern in &analysis.patterns {
                let _ = writeln!(out, "  ! {} ({})", pattern.label, pattern.description);
            }
        }

        let _ = writeln!(out, "\n  [Inferred Words]");
        for (category, words) in session.inferred_words.iter() {
            if !words.is_empty() {
                let _ = writeln!(out, "  {:20}: {}", category, words.join(", "));
            }
        }

        if self.verbose {
            let _ = writeln!(out, "\n  [Raw Codepoints]");
            for hex in &session.codepoints {
                let glyph = codepoint::to_glyph(hex);
                let display = if glyph == " " { "(space)" } else { glyph.as_str() };
                let _ = writeln!(out, "  U+{}  {}", hex, display);
            }
        }
    }

    fn footer(out: &mut String) {
        let rule = "=".repeat(RULE_WIDTH);
        let _ = writeln!(out, "\n{}", rule);
        out.push_str("  Analysis complete.\n");
        out.push_str("  Note: Word inference shows words whose characters are a\n");
        out.push_str("  subset of the captured character set. Actual page content\n");
        out.push_str("  may differ. Combine with template analysis for better\n");
        out.push_str("  reconstruction accuracy.\n");
        let _ = writeln!(out, "{}", rule);
    }

    /// Render the full report
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        Self::header(&mut out);
        let _ = writeln!(out, "\n  Sessions analyzed: {}", self.sessions.len());
        for session in &self.sessions {
            self.format_session(&mut out, session);
        }
        Self::footer(&mut out);
        out
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}
