use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// One named, ordered word list
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Category {
    pub name: String,
    pub words: Vec<String>,
    /// Included when no categories are requested explicitly
    #[serde(default = "default_listed")]
    pub listed: bool,
}

fn default_listed() -> bool {
    true
}

impl Category {
    pub fn new(name: impl Into<String>, words: Vec<String>) -> Self {
        Self {
            name: name.into(),
            words,
            listed: true,
        }
    }
}

#[derive(Deserialize)]
struct VocabularyFile {
    category: Vec<Category>,
}

/// Candidate words grouped by category, loaded from TOML
///
/// # Example TOML
/// ```toml
/// [[category]]
/// name = "banking"
/// words = ["account", "balance", "iban"]
///
/// [[category]]
/// name = "dashboard"
/// listed = false
/// words = ["bank"]
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vocabulary {
    categories: Vec<Category>,
}

impl Vocabulary {
    /// Load a vocabulary from a TOML file
    ///
    /// # Errors
    /// Returns error if the file is unreadable, is not valid TOML, or defines
    /// the same category twice.
    pub fn from_toml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).with_context(|| {
            format!("Failed to read vocabulary file: {}", path.as_ref().display())
        })?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Invalid vocabulary file: {}", path.as_ref().display()))
    }

    /// Parse a vocabulary from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: VocabularyFile =
            toml::from_str(content).context("Failed to parse TOML vocabulary")?;
        Self::from_categories(file.category)
    }

    /// Build a vocabulary from in-memory categories
    pub fn from_categories(categories: Vec<Category>) -> Result<Self> {
        let mut names = HashSet::new();
        for category in &categories {
            if !names.insert(category.name.as_str()) {
                anyhow::bail!("Duplicate vocabulary category '{}'", category.name);
            }
        }
        Ok(Self { categories })
    }

    /// The vocabulary compiled into the binary
    pub fn embedded() -> Result<Self> {
        const DEFAULT_TOML: &str = include_str!("../../vocabulary-default.toml");
        Self::from_toml_str(DEFAULT_TOML).context("Failed to parse embedded vocabulary-default.toml")
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn category_names(&self) -> Vec<&str> {
        self.categories.iter().map(|c| c.name.as_str()).collect()
    }

    /// Categories used when the caller does not name any
    pub fn listed_names(&self) -> Vec<&str> {
        self.categories
            .iter()
            .filter(|c| c.listed)
            .map(|c| c.name.as_str())
            .collect()
    }

    pub fn get(&self, name: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.name == name)
    }
}
