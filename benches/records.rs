//! Record framing and classification benchmarks.
//!
//! Measures splitting multi-record frames and classifying records of the
//! sizes the backend typically streams.
//!
//! Run with: cargo bench --bench records
//! Results saved to: target/criterion/

use std::hint::black_box;

use chathub_stream::protocol::{classify, split_records};
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};

// ============================================================================
// Benchmark Parameters
// ============================================================================

const RECORDS_PER_FRAME: &[usize] = &[1, 8, 64];
const TEXT_LENGTHS: &[usize] = &[64, 1024, 16 * 1024];

// ============================================================================
// Fixtures
// ============================================================================

fn update_record(text_len: usize) -> String {
    let text = "x".repeat(text_len);
    format!(r#"{{"type":1,"target":"update","arguments":[{{"messages":[{{"text":"{text}"}}]}}]}}"#)
}

fn frame(records: usize, text_len: usize) -> String {
    let record = update_record(text_len);
    let mut frame = String::new();
    for _ in 0..records {
        frame.push_str(&record);
        frame.push('\u{1e}');
    }
    frame
}

// ============================================================================
// Benchmark: Frame Splitting
// ============================================================================

fn bench_split(c: &mut Criterion) {
    let mut group = c.benchmark_group("split_records");

    for &count in RECORDS_PER_FRAME {
        let payload = frame(count, 256);
        group.throughput(Throughput::Bytes(payload.len() as u64));
        group.bench_with_input(BenchmarkId::new("records", count), &payload, |b, payload| {
            b.iter(|| split_records(black_box(payload)));
        });
    }

    group.finish();
}

// ============================================================================
// Benchmark: Classification
// ============================================================================

fn bench_classify(c: &mut Criterion) {
    let mut group = c.benchmark_group("classify");

    for &len in TEXT_LENGTHS {
        let record = update_record(len);
        group.throughput(Throughput::Bytes(record.len() as u64));
        group.bench_with_input(BenchmarkId::new("update", len), &record, |b, record| {
            b.iter(|| classify(black_box(record)));
        });
    }

    let done = r#"{"type":2,"invocationId":"0","item":{"result":{"value":"Success"}}}"#;
    group.bench_function("completion", |b| b.iter(|| classify(black_box(done))));

    group.finish();
}

criterion_group!(benches, bench_split, bench_classify);
criterion_main!(benches);
