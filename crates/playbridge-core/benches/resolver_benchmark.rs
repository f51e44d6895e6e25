//! Benchmark tests for playbridge-core stream resolution and event emission
//!
//! Run with: cargo bench -p playbridge-core

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::sync::Arc;
use url::Url;

use playbridge_core::resolver::{infer_stream_kind, infer_subtitle_format};
use playbridge_core::{
    resolve, HeadlessSurfaceProvider, MediaSource, RecordingChannel, SessionConfig,
    SessionController, SimulatedEngineFactory,
};

// ============================================================================
// Resolver Benchmarks
// ============================================================================

fn bench_inference(c: &mut Criterion) {
    let mut group = c.benchmark_group("inference");

    let uris = [
        ("hls", "https://cdn.example.com/live/master.m3u8"),
        ("dash", "https://cdn.example.com/live/manifest.mpd"),
        ("smooth", "https://cdn.example.com/vod/movie.ism/Manifest(format=m3u8-aapl)"),
        ("progressive", "https://cdn.example.com/vod/movie.mp4?token=abc123"),
    ];

    for (name, uri) in uris {
        let url = Url::parse(uri).unwrap();
        group.bench_with_input(BenchmarkId::new("by_url", name), &url, |b, url| {
            b.iter(|| black_box(infer_stream_kind(black_box(url), None)))
        });
    }

    group.bench_function("by_mime_hint", |b| {
        let url = Url::parse("https://cdn.example.com/stream?id=42").unwrap();
        b.iter(|| {
            black_box(infer_stream_kind(
                black_box(&url),
                Some(black_box("application/vnd.apple.mpegurl; charset=utf-8")),
            ))
        });
    });

    group.bench_function("subtitle_format", |b| {
        let url = Url::parse("https://cdn.example.com/subs/en.vtt").unwrap();
        b.iter(|| black_box(infer_subtitle_format(black_box(&url))));
    });

    group.finish();
}

fn bench_resolve(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve");

    let plain = SessionConfig::new("https://cdn.example.com/live/master.m3u8");
    group.bench_function("without_subtitle", |b| {
        b.iter(|| black_box(resolve(black_box(&plain.uri), &plain).unwrap()))
    });

    let with_subs = SessionConfig::new("https://cdn.example.com/vod/movie.mp4")
        .with_subtitle("https://cdn.example.com/subs/en.srt");
    group.bench_function("with_subtitle_and_source", |b| {
        b.iter(|| {
            let descriptor = resolve(black_box(&with_subs.uri), &with_subs).unwrap();
            black_box(MediaSource::build(&descriptor))
        })
    });

    group.finish();
}

// ============================================================================
// Session Benchmarks
// ============================================================================

fn bench_session(c: &mut Criterion) {
    let mut group = c.benchmark_group("session");

    group.bench_function("create_seek_close", |b| {
        b.iter(|| {
            let mut controller = SessionController::new(
                Box::new(SimulatedEngineFactory::new(Some(60_000))),
                Box::new(HeadlessSurfaceProvider::new()),
                Arc::new(RecordingChannel::new()),
            );
            controller.create_session(SessionConfig::new("https://cdn.example.com/live/master.m3u8"));
            for target in [-500, 15_000, 90_000] {
                controller.seek_to(black_box(target));
            }
            controller.drain_signals();
            controller.close();
        })
    });

    group.finish();
}

criterion_group!(
    resolver_benches,
    bench_inference,
    bench_resolve,
);

criterion_group!(
    session_benches,
    bench_session,
);

criterion_main!(
    resolver_benches,
    session_benches,
);
