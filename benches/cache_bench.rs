// ABOUTME: Criterion benchmarks for the widget response cache and key derivation
// ABOUTME: Measures set/get/invalidate latency and throughput for various payload sizes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Synq Labs

//! Criterion benchmarks for cache operations.
//!
//! Measures fingerprint derivation plus set/get/invalidate latency and
//! throughput for various payload sizes using the in-memory backend.

#![allow(
    clippy::missing_docs_in_private_items,
    clippy::unwrap_used,
    missing_docs
)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use serde_json::{json, Value};
use std::time::Duration;
use synq_server::cache::{CacheConfig, CacheProvider, Fingerprint, InMemoryCache};
use tokio::runtime::Runtime;

/// Test payload sizes for benchmarking
#[derive(Debug, Clone, Copy)]
enum PayloadSize {
    Small,
    Medium,
    Large,
    ExtraLarge,
}

impl PayloadSize {
    const fn bytes(self) -> usize {
        match self {
            Self::Small => 100,
            Self::Medium => 1_000,
            Self::Large => 10_000,
            Self::ExtraLarge => 100_000,
        }
    }

    const fn name(self) -> &'static str {
        match self {
            Self::Small => "100B",
            Self::Medium => "1KB",
            Self::Large => "10KB",
            Self::ExtraLarge => "100KB",
        }
    }
}

/// Generate a JSON payload of roughly the requested size
fn generate_payload(size: PayloadSize) -> Value {
    let target_size = size.bytes();
    let data_size = target_size.saturating_sub(50);
    json!({
        "data": "x".repeat(data_size),
        "count": target_size,
    })
}

/// Generate a realistic pull request payload with `count` entries
fn generate_pull_requests(count: usize) -> Value {
    let items: Vec<Value> = (0..count)
        .map(|i| {
            json!({
                "id": i,
                "title": format!("Rework connection pooling ({i})"),
                "repo": "synq-labs/synq-server",
                "url": format!("https://github.com/synq-labs/synq-server/pull/{i}"),
                "created_at": "2025-06-01T12:00:00Z",
            })
        })
        .collect();
    json!({ "pull_requests": items })
}

/// Create a fingerprint for benchmarking
fn make_fingerprint(index: usize) -> Fingerprint {
    Fingerprint::for_request(
        1_000,
        "github",
        "pull_requests",
        Some(&json!({ "index": index })),
    )
}

/// Test cache configuration (no background cleanup for benchmarks)
fn test_cache_config() -> CacheConfig {
    CacheConfig {
        max_entries: 100_000,
        cleanup_interval: Duration::from_secs(3600),
        enable_background_cleanup: false,
        ..Default::default()
    }
}

/// Benchmark fingerprint derivation for different config shapes
fn bench_fingerprint(c: &mut Criterion) {
    let mut group = c.benchmark_group("fingerprint");

    group.bench_function("no_config", |b| {
        b.iter(|| {
            Fingerprint::for_request(
                black_box(42),
                black_box("github"),
                black_box("pull_requests"),
                None,
            )
        });
    });

    let small = json!({ "limit": 10, "state": "open" });
    group.bench_function("small_config", |b| {
        b.iter(|| {
            Fingerprint::for_request(
                black_box(42),
                black_box("github"),
                black_box("pull_requests"),
                Some(black_box(&small)),
            )
        });
    });

    // Deep config exercises the canonical key-sorting path
    let nested = json!({
        "filters": {
            "state": "open",
            "labels": ["bug", "p1", "backend"],
            "assignees": { "include": ["casey", "devon"], "exclude": [] },
        },
        "limit": 50,
        "sort": { "field": "updated_at", "direction": "desc" },
    });
    group.bench_function("nested_config", |b| {
        b.iter(|| {
            Fingerprint::for_request(
                black_box(42),
                black_box("github"),
                black_box("pull_requests"),
                Some(black_box(&nested)),
            )
        });
    });

    group.finish();
}

/// Benchmark cache set operations with different payload sizes
#[allow(clippy::cast_possible_truncation)]
fn bench_cache_set(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("cache_set");

    for size in [
        PayloadSize::Small,
        PayloadSize::Medium,
        PayloadSize::Large,
        PayloadSize::ExtraLarge,
    ] {
        let payload = generate_payload(size);
        let cache = InMemoryCache::new(&test_cache_config());

        group.throughput(Throughput::Bytes(size.bytes() as u64));
        group.bench_with_input(
            BenchmarkId::new("memory", size.name()),
            &payload,
            |b, payload| {
                let mut key_index = 0_usize;
                b.iter(|| {
                    let key = make_fingerprint(key_index);
                    key_index = key_index.wrapping_add(1);
                    rt.block_on(async {
                        cache
                            .set(
                                black_box(&key),
                                black_box(payload),
                                Duration::from_secs(3600),
                            )
                            .await
                    })
                });
            },
        );
    }

    group.finish();
}

/// Benchmark cache get operations (hits vs misses)
fn bench_cache_get(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("cache_get");

    let cache = InMemoryCache::new(&test_cache_config());

    // Pre-populate cache with 1000 entries
    let payload = generate_payload(PayloadSize::Medium);
    rt.block_on(async {
        for i in 0..1000 {
            let key = make_fingerprint(i);
            let _ = cache.set(&key, &payload, Duration::from_secs(3600)).await;
        }
    });

    // Benchmark cache hits
    group.bench_function("memory_hit", |b| {
        let mut key_index = 0_usize;
        b.iter(|| {
            let key = make_fingerprint(key_index % 1000);
            key_index = key_index.wrapping_add(1);
            rt.block_on(async {
                let _ = cache.get(black_box(&key)).await.unwrap();
            });
        });
    });

    // Benchmark cache misses
    group.bench_function("memory_miss", |b| {
        let mut key_index = 10_000_usize;
        b.iter(|| {
            let key = make_fingerprint(key_index);
            key_index = key_index.wrapping_add(1);
            rt.block_on(async {
                let _ = cache.get(black_box(&key)).await.unwrap();
            });
        });
    });

    group.finish();
}

/// Benchmark cache invalidation
fn bench_cache_invalidate(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("cache_invalidate");

    // Single key invalidation
    group.bench_function("memory_single_key", |b| {
        let cache = InMemoryCache::new(&test_cache_config());
        let payload = generate_payload(PayloadSize::Small);

        b.iter(|| {
            let key = make_fingerprint(0);
            rt.block_on(async {
                let _ = cache.set(&key, &payload, Duration::from_secs(3600)).await;
                let _ = cache.invalidate(black_box(&key)).await;
            });
        });
    });

    // Pattern invalidation scans every key, so measure the scan over a
    // populated cache with a pattern that matches none of them.
    group.bench_function("memory_pattern_scan_1000_entries", |b| {
        let cache = InMemoryCache::new(&test_cache_config());
        let payload = generate_payload(PayloadSize::Small);

        rt.block_on(async {
            for i in 0..1000 {
                let key = make_fingerprint(i);
                let _ = cache.set(&key, &payload, Duration::from_secs(3600)).await;
            }
        });

        let pattern = Fingerprint::service_pattern(1_000, "jira");
        b.iter(|| {
            rt.block_on(async {
                let _ = cache.invalidate_pattern(black_box(&pattern)).await;
            });
        });
    });

    group.finish();
}

/// Benchmark cache with realistic widget payloads
#[allow(clippy::cast_possible_truncation)]
fn bench_cache_widgets(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("cache_widgets");

    let batch_small = generate_pull_requests(10);
    let batch_medium = generate_pull_requests(100);

    let cache = InMemoryCache::new(&test_cache_config());

    // Cache 10 pull requests
    let serialized_small = serde_json::to_vec(&batch_small).unwrap();
    group.throughput(Throughput::Bytes(serialized_small.len() as u64));
    group.bench_function("set_10_pull_requests", |b| {
        let mut key_index = 0_usize;
        b.iter(|| {
            let key = make_fingerprint(key_index);
            key_index = key_index.wrapping_add(1);
            rt.block_on(async {
                cache
                    .set(
                        black_box(&key),
                        black_box(&batch_small),
                        Duration::from_secs(3600),
                    )
                    .await
            })
        });
    });

    // Cache 100 pull requests
    let serialized_medium = serde_json::to_vec(&batch_medium).unwrap();
    group.throughput(Throughput::Bytes(serialized_medium.len() as u64));
    group.bench_function("set_100_pull_requests", |b| {
        let mut key_index = 0_usize;
        b.iter(|| {
            let key = make_fingerprint(key_index);
            key_index = key_index.wrapping_add(1);
            rt.block_on(async {
                cache
                    .set(
                        black_box(&key),
                        black_box(&batch_medium),
                        Duration::from_secs(3600),
                    )
                    .await
            })
        });
    });

    // Pre-populate and benchmark retrieval
    let retrieval_key = make_fingerprint(99_999);
    rt.block_on(async {
        let _ = cache
            .set(&retrieval_key, &batch_medium, Duration::from_secs(3600))
            .await;
    });

    group.bench_function("get_100_pull_requests", |b| {
        b.iter(|| {
            rt.block_on(async {
                let _ = cache.get(black_box(&retrieval_key)).await.unwrap();
            });
        });
    });

    group.finish();
}

/// Benchmark concurrent cache operations
fn bench_cache_concurrent(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("cache_concurrent");
    group.sample_size(50);

    let cache = InMemoryCache::new(&test_cache_config());
    let payload = generate_payload(PayloadSize::Medium);

    // Pre-populate cache
    rt.block_on(async {
        for i in 0..1000 {
            let key = make_fingerprint(i);
            let _ = cache.set(&key, &payload, Duration::from_secs(3600)).await;
        }
    });

    // Concurrent reads (10 parallel)
    group.throughput(Throughput::Elements(10));
    group.bench_function("10_parallel_reads", |b| {
        b.iter(|| {
            rt.block_on(async {
                let handles: Vec<_> = (0..10)
                    .map(|i| {
                        let cache = cache.clone();
                        let key = make_fingerprint(i % 1000);
                        tokio::spawn(async move {
                            let _ = cache.get(&key).await.unwrap();
                        })
                    })
                    .collect();

                for handle in handles {
                    let _ = handle.await;
                }
            });
        });
    });

    // Mixed read/write workload
    group.throughput(Throughput::Elements(20));
    group.bench_function("mixed_10_reads_10_writes", |b| {
        let mut write_index = 2000_usize;
        b.iter(|| {
            rt.block_on(async {
                let mut handles = Vec::with_capacity(20);

                // 10 reads
                for i in 0..10 {
                    let cache = cache.clone();
                    let key = make_fingerprint(i % 1000);
                    handles.push(tokio::spawn(async move {
                        let _ = cache.get(&key).await.unwrap();
                    }));
                }

                // 10 writes
                for i in 0..10 {
                    let cache = cache.clone();
                    let key = make_fingerprint(write_index + i);
                    let payload = payload.clone();
                    handles.push(tokio::spawn(async move {
                        let _ = cache.set(&key, &payload, Duration::from_secs(3600)).await;
                    }));
                }

                for handle in handles {
                    let _ = handle.await;
                }
            });
            write_index = write_index.wrapping_add(10);
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_fingerprint,
    bench_cache_set,
    bench_cache_get,
    bench_cache_invalidate,
    bench_cache_widgets,
    bench_cache_concurrent,
);
criterion_main!(benches);
