// Word inference from a captured character set
//
// A word is a candidate when every one of its characters (case-folded) was
// captured. Order and repetition are invisible to the collector, so "balance"
// only needs a, b, c, e, l, n to be present once each.
//
// Vocabularies are data, not logic: the default list ships embedded from
// vocabulary-default.toml and can be swapped for any TOML file with the same
// layout.

mod vocabulary;

pub use vocabulary::{Category, Vocabulary};

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashSet;
use std::fmt;

/// Candidate words per category, in category order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WordInferenceResult {
    entries: Vec<(String, Vec<String>)>,
}

impl WordInferenceResult {
    /// Words for one category; empty if the category was not requested
    pub fn words(&self, category: &str) -> &[String] {
        self.entries
            .iter()
            .find(|(name, _)| name == category)
            .map(|(_, words)| words.as_slice())
            .unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(name, words)| (name.as_str(), words.as_slice()))
    }

    pub fn categories(&self) -> Vec<&str> {
        self.entries.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// True when no category produced any candidate
    pub fn is_empty(&self) -> bool {
        self.entries.iter().all(|(_, words)| words.is_empty())
    }

    /// Keep at most `limit` words per category
    pub fn truncated(mut self, limit: usize) -> Self {
        for (_, words) in &mut self.entries {
            words.truncate(limit);
        }
        self
    }
}

impl Serialize for WordInferenceResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, words) in &self.entries {
            map.serialize_entry(name, words)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for WordInferenceResult {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct OrderedVisitor;

        impl<'de> Visitor<'de> for OrderedVisitor {
            type Value = WordInferenceResult;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of category name to word list")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::new();
                while let Some((name, words)) = access.next_entry::<String, Vec<String>>()? {
                    entries.push((name, words));
                }
                Ok(WordInferenceResult { entries })
            }
        }

        deserializer.deserialize_map(OrderedVisitor)
    }
}

/// Case-folded single characters of a glyph set
///
/// Multi-character placeholder glyphs (`U+XXXX`) can never spell a word
/// and are left out.
fn fold_chars<I, S>(chars: I) -> HashSet<char>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut folded = HashSet::new();
    for glyph in chars {
        let mut it = glyph.as_ref().chars();
        if let (Some(c), None) = (it.next(), it.next()) {
            folded.extend(c.to_lowercase());
        }
    }
    folded
}

fn spellable(word: &str, folded: &HashSet<char>) -> bool {
    word.chars()
        .all(|c| c.to_lowercase().all(|l| folded.contains(&l)))
}

/// Stable sort, longest first
fn sort_by_length(words: &mut [String]) {
    words.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()));
}

fn candidates(category: &Category, folded: &HashSet<char>) -> Vec<String> {
    let mut words: Vec<String> = category
        .words
        .iter()
        .filter(|w| spellable(w, folded))
        .cloned()
        .collect();
    sort_by_length(&mut words);
    words
}

/// Candidate words per category
///
/// * `categories` - restrict to these names (default: every listed
///   vocabulary category, in vocabulary order). Unknown names yield an
///   empty list; a repeated name is reported once.
/// * `limit` - keep at most this many words per category (default: all)
pub fn infer<I, S>(
    vocabulary: &Vocabulary,
    chars: I,
    categories: Option<&[&str]>,
    limit: Option<usize>,
) -> WordInferenceResult
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let folded = fold_chars(chars);
    let names: Vec<&str> = match categories {
        Some(requested) => requested.to_vec(),
        None => vocabulary.listed_names(),
    };

    let mut seen = HashSet::new();
    let entries = names
        .into_iter()
        .filter(|name| seen.insert(*name))
        .map(|name| {
            let mut words = vocabulary
                .get(name)
                .map(|c| candidates(c, &folded))
                .unwrap_or_default();
            if let Some(limit) = limit {
                words.truncate(limit);
            }
            (name.to_string(), words)
        })
        .collect();

    WordInferenceResult { entries }
}

/// Candidate words from several categories merged into one ranked list
///
/// Categories are concatenated in the requested order, duplicates keep their
/// first occurrence, and the merged list is ranked longest first.
pub fn infer_flat<I, S>(
    vocabulary: &Vocabulary,
    chars: I,
    categories: Option<&[&str]>,
    limit: Option<usize>,
) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let per_category = infer(vocabulary, chars, categories, None);
    let mut seen = HashSet::new();
    let mut merged: Vec<String> = per_category
        .entries
        .into_iter()
        .flat_map(|(_, words)| words)
        .filter(|w| seen.insert(w.clone()))
        .collect();
    // Per-category lists are already length-sorted; re-rank the merge
    sort_by_length(&mut merged);
    if let Some(limit) = limit {
        merged.truncate(limit);
    }
    merged
}

#[cfg(test)]
mod tests;
