// Word inference tests: membership filtering, ranking, vocabulary loading

use super::*;
use std::io::Write;
use tempfile::NamedTempFile;

fn vocab() -> Vocabulary {
    Vocabulary::embedded().expect("embedded vocabulary parses")
}

fn glyphs(s: &str) -> Vec<String> {
    s.chars().map(|c| c.to_string()).collect()
}

#[test]
fn test_embedded_vocabulary_categories() {
    let v = vocab();
    assert_eq!(
        v.category_names(),
        vec!["banking", "common", "names", "numbers_currency", "live"]
    );
    assert_eq!(
        v.listed_names(),
        vec!["banking", "common", "names", "numbers_currency"]
    );
    assert!(v.get("banking").unwrap().words.contains(&"balance".to_string()));
}

#[test]
fn test_balance_spellable_from_set() {
    // Repeated letters collapse under set semantics
    let result = infer(&vocab(), glyphs("balance"), Some(&["banking"]), None);
    assert!(result.words("banking").contains(&"balance".to_string()));
    assert_eq!(result.categories(), vec!["banking"]);
}

#[test]
fn test_finnish_iban_chars_spell_no_banking_word() {
    let result = infer(&vocab(), glyphs("FI210"), Some(&["banking"]), None);
    assert!(result.words("banking").is_empty());
}

#[test]
fn test_case_folding() {
    let result = infer(&vocab(), glyphs("IBAN"), Some(&["banking"]), None);
    assert_eq!(result.words("banking"), &["iban".to_string()]);
}

#[test]
fn test_sorted_by_length_stable() {
    let words = ["ab", "abc", "ba", "cab", "a"].iter().map(|s| s.to_string()).collect();
    let v = Vocabulary::from_categories(vec![Category::new("t", words)])
    .unwrap();
    let result = infer(&v, glyphs("abc"), None, None);
    assert_eq!(result.words("t"), &["abc", "cab", "ab", "ba", "a"]);
}

#[test]
fn test_limit_truncates_per_category() {
    let all = infer(&vocab(), glyphs("abcdefghijklmnopqrstuvwxyz"), None, None);
    assert!(all.words("common").len() > 10);
    let capped = infer(&vocab(), glyphs("abcdefghijklmnopqrstuvwxyz"), None, Some(10));
    for (_, words) in capped.iter() {
        assert!(words.len() <= 10);
    }
    assert_eq!(capped.words("common"), &all.words("common")[..10]);
}

#[test]
fn test_empty_set_yields_empty_lists() {
    let result = infer(&vocab(), Vec::<String>::new(), None, None);
    assert_eq!(result.categories().len(), 4);
    assert!(result.is_empty());
}

#[test]
fn test_empty_string_word_always_matches() {
    let v = Vocabulary::from_categories(vec![Category::new("blank", vec![String::new()])])
    .unwrap();
    let result = infer(&v, Vec::<String>::new(), None, None);
    assert_eq!(result.words("blank"), &[String::new()]);
}

#[test]
fn test_unlisted_category_only_on_request() {
    let all = infer(&vocab(), glyphs("bank"), None, None);
    assert!(!all.categories().contains(&"live"));

    let live = infer(&vocab(), glyphs("bank"), Some(&["live"]), None);
    assert_eq!(live.words("live"), &["bank", "an", "a"]);
}

#[test]
fn test_repeated_category_reported_once() {
    let result = infer(&vocab(), glyphs("iban"), Some(&["banking", "banking"]), None);
    assert_eq!(result.categories(), vec!["banking"]);
    let json = serde_json::to_string(&result).unwrap();
    assert_eq!(json, r#"{"banking":["iban"]}"#);
}

#[test]
fn test_unlisted_flag_from_toml() {
    let toml = r#"
[[category]]
name = "shown"
words = ["a"]

[[category]]
name = "hidden"
listed = false
words = ["a"]
"#;
    let v = Vocabulary::from_toml_str(toml).unwrap();
    assert_eq!(v.listed_names(), vec!["shown"]);
    assert!(v.get("hidden").is_some());
}

#[test]
fn test_unknown_category_is_empty() {
    let result = infer(&vocab(), glyphs("abc"), Some(&["nonexistent"]), None);
    assert!(result.words("nonexistent").is_empty());
    assert_eq!(result.categories(), vec!["nonexistent"]);
}

#[test]
fn test_digits_category() {
    let result = infer(&vocab(), glyphs("50€"), Some(&["numbers_currency"]), None);
    assert_eq!(result.words("numbers_currency"), &["0", "5"]);
}

#[test]
fn test_placeholder_glyphs_ignored() {
    let result = infer(&vocab(), ["U+1F600"], None, None);
    assert!(result.is_empty());
}

#[test]
fn test_infer_flat_merges_and_dedupes() {
    let v = Vocabulary::from_categories(vec![
        Category::new("one", vec!["to".to_string(), "toast".to_string()]),
        Category::new("two", vec!["toast".to_string(), "oats".to_string()]),
    ])
    .unwrap();
    let merged = infer_flat(&v, glyphs("toas"), None, None);
    assert_eq!(merged, vec!["toast", "oats", "to"]);
    let capped = infer_flat(&v, glyphs("toas"), None, Some(2));
    assert_eq!(capped, vec!["toast", "oats"]);
}

#[test]
fn test_result_serializes_in_category_order() {
    let result = infer(&vocab(), glyphs("iban"), Some(&["names", "banking"]), None);
    let json = serde_json::to_string(&result).unwrap();
    assert_eq!(json, r#"{"names":[],"banking":["iban"]}"#);
    let back: WordInferenceResult = serde_json::from_str(&json).unwrap();
    assert_eq!(back, result);
}

#[test]
fn test_vocabulary_from_toml_file() -> anyhow::Result<()> {
    let mut file = NamedTempFile::new()?;
    writeln!(
        file,
        r#"
[[category]]
name = "custom"
words = ["bleed", "font"]
"#
    )?;
    let v = Vocabulary::from_toml(file.path())?;
    let result = infer(&v, glyphs("bled"), None, None);
    assert_eq!(result.words("custom"), &["bleed"]);
    Ok(())
}

#[test]
fn test_duplicate_category_rejected() {
    let toml = r#"
[[category]]
name = "x"
words = ["a"]

[[category]]
name = "x"
words = ["b"]
"#;
    let err = Vocabulary::from_toml_str(toml).unwrap_err();
    assert!(err.to_string().contains("Duplicate vocabulary category"));
}

#[test]
fn test_missing_vocabulary_file() {
    let err = Vocabulary::from_toml("/nonexistent/vocab.toml").unwrap_err();
    assert!(err.to_string().contains("Failed to read vocabulary file"));
}
