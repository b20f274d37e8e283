//! Character-set classification and pattern detection
//!
//! Works on membership only: which glyphs were rendered, never their order
//! or how often. Every detector is a plain predicate over the classified
//! set, so new ones can be registered without touching the classifier.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Currency glyphs recognized by the classifier
pub const CURRENCY_CHARS: &[char] = &['€', '£', '¥', '₿', '$'];

/// Punctuation glyphs recognized by the classifier
pub const PUNCTUATION_CHARS: &[char] = &['.', ',', '!', '?', ';', ':', '-', '(', ')', '\'', '"'];

/// A pattern reported for a character set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectedPattern {
    pub label: String,
    pub description: String,
}

/// Structural summary of a character set
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterSetAnalysis {
    pub total_unique: usize,
    pub has_digits: bool,
    pub has_uppercase: bool,
    pub has_lowercase: bool,
    pub has_currency: bool,
    pub has_punctuation: bool,
    pub digits: Vec<String>,
    pub uppercase: Vec<String>,
    pub lowercase: Vec<String>,
    pub special: Vec<String>,
    pub patterns: Vec<DetectedPattern>,
}

impl CharacterSetAnalysis {
    /// Labels of the detected patterns, in detector order
    pub fn pattern_labels(&self) -> Vec<&str> {
        self.patterns.iter().map(|p| p.label.as_str()).collect()
    }

    pub fn has_pattern(&self, label: &str) -> bool {
        self.patterns.iter().any(|p| p.label == label)
    }
}

/// Predicate over a classified set and its raw glyphs
pub type PatternPredicate = fn(&CharacterSetAnalysis, &BTreeSet<String>) -> bool;

/// A registered `(label, predicate)` pair
#[derive(Debug, Clone, Copy)]
pub struct PatternDetector {
    pub label: &'static str,
    pub description: &'static str,
    pub predicate: PatternPredicate,
}

impl PatternDetector {
    pub const fn new(label: &'static str, description: &'static str, predicate: PatternPredicate) -> Self {
        Self {
            label,
            description,
            predicate,
        }
    }
}

fn currency_amount(a: &CharacterSetAnalysis, _: &BTreeSet<String>) -> bool {
    a.has_currency && a.has_digits
}

fn mixed_case(a: &CharacterSetAnalysis, _: &BTreeSet<String>) -> bool {
    a.has_uppercase && a.has_lowercase
}

// Independent membership of F and I, not the adjacent "FI" prefix
fn finnish_iban(a: &CharacterSetAnalysis, chars: &BTreeSet<String>) -> bool {
    chars.contains("F") && chars.contains("I") && a.has_digits
}

fn email_address(_: &CharacterSetAnalysis, chars: &BTreeSet<String>) -> bool {
    chars.contains("@")
}

/// The built-in detectors, in reporting order
pub const DEFAULT_DETECTORS: [PatternDetector; 4] = [
    PatternDetector::new("CURRENCY_AMOUNT", "monetary values detected", currency_amount),
    PatternDetector::new("MIXED_CASE", "proper nouns or sentences", mixed_case),
    PatternDetector::new("FINNISH_IBAN", "FI prefix + digits", finnish_iban),
    PatternDetector::new("EMAIL_ADDRESS", "@ symbol present", email_address),
];

/// Classifier plus an ordered list of pattern detectors
#[derive(Debug, Clone)]
pub struct Analyzer {
    detectors: Vec<PatternDetector>,
}

impl Default for Analyzer {
    fn default() -> Self {
        Self {
            detectors: DEFAULT_DETECTORS.to_vec(),
        }
    }
}

impl Analyzer {
    /// Analyzer with no detectors; classification only
    pub fn empty() -> Self {
        Self {
            detectors: Vec::new(),
        }
    }

    /// Register an additional detector, evaluated after the existing ones
    pub fn with_detector(mut self, detector: PatternDetector) -> Self {
        self.detectors.push(detector);
        self
    }

    pub fn detectors(&self) -> &[PatternDetector] {
        &self.detectors
    }

    /// Classify a set of glyphs and run every detector over it
    pub fn analyze<I, S>(&self, chars: I) -> CharacterSetAnalysis
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let set: BTreeSet<String> = chars.into_iter().map(|c| c.as_ref().to_string()).collect();
        let mut analysis = classify(&set);
        analysis.patterns = self
            .detectors
            .iter()
            .filter(|d| (d.predicate)(&analysis, &set))
            .map(|d| DetectedPattern {
                label: d.label.to_string(),
                description: d.description.to_string(),
            })
            .collect();
        analysis
    }
}

/// Analyze with the built-in detectors
pub fn analyze<I, S>(chars: I) -> CharacterSetAnalysis
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    Analyzer::default().analyze(chars)
}

/// Single-character glyph, if the token is one
fn single_char(glyph: &str) -> Option<char> {
    let mut it = glyph.chars();
    match (it.next(), it.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}

fn classify(set: &BTreeSet<String>) -> CharacterSetAnalysis {
    let mut analysis = CharacterSetAnalysis {
        total_unique: set.len(),
        ..Default::default()
    };

    for glyph in set {
        match single_char(glyph) {
            Some(c) if c.is_ascii_digit() => analysis.digits.push(glyph.clone()),
            Some(c) if c.is_ascii_uppercase() => analysis.uppercase.push(glyph.clone()),
            Some(c) if c.is_ascii_lowercase() => analysis.lowercase.push(glyph.clone()),
            Some(' ') => {}
            Some(c) => {
                if CURRENCY_CHARS.contains(&c) {
                    analysis.has_currency = true;
                }
                if PUNCTUATION_CHARS.contains(&c) {
                    analysis.has_punctuation = true;
                }
                analysis.special.push(glyph.clone());
            }
            // Placeholder tokens such as "U+1F600"
            None => analysis.special.push(glyph.clone()),
        }
    }

    analysis.has_digits = !analysis.digits.is_empty();
    analysis.has_uppercase = !analysis.uppercase.is_empty();
    analysis.has_lowercase = !analysis.lowercase.is_empty();
    analysis
}
