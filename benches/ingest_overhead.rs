//! Ingest and snapshot benchmarks
//!
//! The font endpoint calls `record_font_request` once per rendered glyph, so
//! ingest sits on the request path. Snapshots run on every dashboard poll.
//!
//! ```bash
//! cargo bench --bench ingest_overhead
//! ```

use chrono::Utc;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use typebleed::collector::Collector;
use typebleed::config::EngineConfig;
use typebleed::inference::{infer, Vocabulary};

const PAGE: &str = "Account balance: €12,450.00 FI21 1234 5600 0007 85 Helsinki";

fn populated_collector(sessions: usize) -> Collector {
    let collector = Collector::new(EngineConfig::default()).unwrap();
    let now = Utc::now();
    for s in 0..sessions {
        let session = format!("session-{}", s);
        for c in PAGE.chars() {
            let hex = format!("{:04X}", c as u32);
            collector.ingest(&session, &hex, "10.0.0.1", "bench", now);
        }
    }
    collector
}

/// Single ingest into an existing session (the hot path)
fn bench_ingest(c: &mut Criterion) {
    let collector = Collector::new(EngineConfig::default()).unwrap();
    let now = Utc::now();
    let mut i = 0u32;

    c.bench_function("collector_ingest", |b| {
        b.iter(|| {
            let hex = format!("{:04X}", 0x20 + (i % 95));
            black_box(collector.ingest("bench", &hex, "10.0.0.1", "bench", now));
            i = i.wrapping_add(1);
        });
    });
}

/// Dashboard snapshot as the session table grows
fn bench_sessions_report(c: &mut Criterion) {
    let mut group = c.benchmark_group("sessions_report");

    for sessions in [1, 10, 100] {
        let collector = populated_collector(sessions);
        group.bench_with_input(BenchmarkId::from_parameter(sessions), &sessions, |b, _| {
            b.iter(|| black_box(collector.sessions_report()));
        });
    }

    group.finish();
}

/// Word inference over one page's character set
fn bench_infer(c: &mut Criterion) {
    let vocab = Vocabulary::embedded().unwrap();
    let chars: Vec<String> = PAGE.chars().map(|c| c.to_string()).collect();

    c.bench_function("infer_all_categories", |b| {
        b.iter(|| black_box(infer(&vocab, &chars, None, Some(10))));
    });
}

criterion_group!(benches, bench_ingest, bench_sessions_report, bench_infer);
criterion_main!(benches);
