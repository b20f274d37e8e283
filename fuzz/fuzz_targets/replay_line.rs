#![no_main]

use chrono::{TimeZone, Utc};
use libfuzzer_sys::fuzz_target;
use typebleed::replay::parse_line;

fuzz_target!(|data: &[u8]| {
    if let Ok(line) = std::str::from_utf8(data) {
        // Arbitrary log lines must be accepted or skipped, never panic
        if let Some(fallback) = Utc.timestamp_opt(0, 0).single() {
            if let Some(event) = parse_line(line, fallback) {
                let _ = event.glyph();
            }
        }
    }
});
