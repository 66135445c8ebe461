//! Criterion benchmarks for replay seeking.
//!
//! Three benchmark groups:
//! - `forward_playback`: 60 fps style small advances across a 20k event log
//! - `backward_seek`: scrubbing backwards, full replay vs. checkpoints
//! - `archive`: encoding and decoding the binary log archive

use std::hint::black_box;
use std::sync::Arc;

use criterion::{criterion_group, criterion_main, Criterion};
use shopfloor_core::config::ReplayConfig;
use shopfloor_core::engine::ReplayEngine;
use shopfloor_core::log::EventLog;
use shopfloor_core::test_utils::busy_log;

const EVENTS: usize = 20_000;

fn bench_forward_playback(c: &mut Criterion) {
    let log = Arc::new(busy_log(EVENTS));
    let mut group = c.benchmark_group("forward_playback");

    group.bench_function("advance_16ms_frames", |b| {
        b.iter(|| {
            let mut engine = ReplayEngine::new(log.clone());
            while !engine.is_at_end() {
                engine.advance(black_box(0.016 * 60.0));
            }
            engine.pointer()
        });
    });

    group.finish();
}

fn bench_backward_seek(c: &mut Criterion) {
    let log = Arc::new(busy_log(EVENTS));
    let end = log.end_time();
    let mut group = c.benchmark_group("backward_seek");

    let mut plain = ReplayEngine::new(log.clone());
    group.bench_function("full_replay", |b| {
        b.iter(|| {
            plain.seek(end);
            plain.seek(black_box(end * 0.9));
        });
    });

    for interval in [256, 1024] {
        let mut engine = ReplayEngine::with_config(
            log.clone(),
            ReplayConfig::default().with_checkpoint_interval(interval),
        );
        group.bench_function(format!("checkpoint_every_{interval}"), |b| {
            b.iter(|| {
                engine.seek(end);
                engine.seek(black_box(end * 0.9));
            });
        });
    }

    group.finish();
}

fn bench_archive(c: &mut Criterion) {
    let log = busy_log(EVENTS);
    let bytes = log.to_bytes().unwrap();
    let mut group = c.benchmark_group("archive");

    group.bench_function("encode_20k_events", |b| {
        b.iter(|| black_box(&log).to_bytes().unwrap());
    });
    group.bench_function("decode_20k_events", |b| {
        b.iter(|| EventLog::from_bytes(black_box(&bytes)).unwrap());
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_forward_playback,
    bench_backward_seek,
    bench_archive
);
criterion_main!(benches);
