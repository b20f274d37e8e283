//! Codepoint registry: code point <-> display glyph
//!
//! The registry covers every code point the decoy page ships a font subset
//! for: printable ASCII (`U+0020..=U+007E`) plus four currency symbols.
//! Lookups are total. A code point outside the registry renders as the
//! literal `U+XXXX` token instead of failing.

use std::collections::BTreeMap;
use std::sync::OnceLock;

/// Currency symbols served in addition to printable ASCII
pub const CURRENCY_GLYPHS: [char; 4] = ['€', '£', '¥', '₿'];

/// First and last printable ASCII code point
const ASCII_PRINTABLE: std::ops::RangeInclusive<u32> = 0x0020..=0x007E;

/// One registry entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodepointRecord {
    pub codepoint: u32,
    pub glyph: String,
}

fn registry() -> &'static BTreeMap<u32, char> {
    static REGISTRY: OnceLock<BTreeMap<u32, char>> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        let mut map = BTreeMap::new();
        for cp in ASCII_PRINTABLE {
            if let Some(ch) = char::from_u32(cp) {
                map.insert(cp, ch);
            }
        }
        for ch in CURRENCY_GLYPHS {
            map.insert(ch as u32, ch);
        }
        map
    })
}

/// Format a code point as upper-case hex, zero-padded to four digits
pub fn format_hex(codepoint: u32) -> String {
    format!("{:04X}", codepoint)
}

/// Parse a hex code point (case-insensitive, optional `U+` prefix)
///
/// Returns `None` for empty input, anything but ASCII hex digits after the
/// prefix (signs included), or values that overflow.
pub fn parse_hex(hex: &str) -> Option<u32> {
    let trimmed = hex.trim();
    let digits = trimmed
        .strip_prefix("U+")
        .or_else(|| trimmed.strip_prefix("u+"))
        .unwrap_or(trimmed);
    // from_str_radix alone would also take a leading sign
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u32::from_str_radix(digits, 16).ok()
}

/// Display glyph for a numeric code point
pub fn glyph_for(codepoint: u32) -> String {
    match registry().get(&codepoint) {
        Some(ch) => ch.to_string(),
        None => format!("U+{}", format_hex(codepoint)),
    }
}

/// Display glyph for a hex code point string
///
/// Never fails: unmapped or unparsable input becomes `U+<HEX>`.
pub fn to_glyph(hex: &str) -> String {
    match parse_hex(hex) {
        Some(cp) => glyph_for(cp),
        None => format!("U+{}", hex.trim().to_uppercase()),
    }
}

/// Whether the code point has a registered glyph
pub fn is_registered(codepoint: u32) -> bool {
    registry().contains_key(&codepoint)
}

/// All registry entries, ordered by code point
pub fn records() -> Vec<CodepointRecord> {
    registry()
        .iter()
        .map(|(&codepoint, ch)| CodepointRecord {
            codepoint,
            glyph: ch.to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_printable_ascii_maps_to_itself() {
        assert_eq!(to_glyph("0041"), "A");
        assert_eq!(to_glyph("007a"), "z");
        assert_eq!(to_glyph("0020"), " ");
        assert_eq!(to_glyph("007E"), "~");
    }

    #[test]
    fn test_currency_symbols() {
        assert_eq!(to_glyph("20AC"), "€");
        assert_eq!(to_glyph("00a3"), "£");
        assert_eq!(to_glyph("00A5"), "¥");
        assert_eq!(to_glyph("20BF"), "₿");
    }

    #[test]
    fn test_unmapped_codepoint_falls_back() {
        assert_eq!(to_glyph("FFFF"), "U+FFFF");
        assert_eq!(to_glyph("ffff"), "U+FFFF");
        // DEL is just past the printable range
        assert_eq!(to_glyph("007F"), "U+007F");
        assert_eq!(glyph_for(0x1F600), "U+1F600");
    }

    #[test]
    fn test_garbage_input_is_total() {
        assert_eq!(to_glyph("zz"), "U+ZZ");
        assert_eq!(to_glyph(""), "U+");
    }

    #[test]
    fn test_parse_hex() {
        assert_eq!(parse_hex("0041"), Some(0x41));
        assert_eq!(parse_hex("U+20ac"), Some(0x20AC));
        assert_eq!(parse_hex("  7a "), Some(0x7A));
        assert_eq!(parse_hex("xyz"), None);
        assert_eq!(parse_hex(""), None);
    }

    #[test]
    fn test_parse_hex_rejects_signs() {
        assert_eq!(parse_hex("+41"), None);
        assert_eq!(parse_hex("-41"), None);
        assert_eq!(parse_hex("U++41"), None);
        assert_eq!(to_glyph("+41"), "U++41");
    }

    #[test]
    fn test_format_hex_pads() {
        assert_eq!(format_hex(0x41), "0041");
        assert_eq!(format_hex(0x20AC), "20AC");
        assert_eq!(format_hex(0x1F600), "1F600");
    }

    #[test]
    fn test_records_cover_registry() {
        let records = records();
        assert_eq!(records.len(), 95 + 4);
        assert_eq!(records[0].codepoint, 0x20);
        assert!(records.windows(2).all(|w| w[0].codepoint < w[1].codepoint));
        assert!(is_registered(0x20BF));
        assert!(!is_registered(0x7F));
    }
}
