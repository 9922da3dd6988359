/*
 * SPDX-FileCopyrightText: 2023 Tommaso Fontana
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use seqpress::prelude::*;

/// Slowly drifting series, the typical telemetry shape.
fn generate(n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| 20.0 + 5.0 * f64::sin(i as f64 * 0.01) + i as f64 * 0.001)
        .collect()
}

fn compress_gorilla(data: &[f64]) -> Vec<u8> {
    let mut compressor = GorillaCompressor::new(Vec::with_capacity(data.len() * 8));
    for &value in data {
        compressor.add(value).unwrap();
    }
    compressor.finish().unwrap()
}

fn compress_entropy(data: &[f64]) -> Vec<u8> {
    let mut compressor = EntropyCompressor::new(Vec::with_capacity(data.len() * 8));
    for &value in data {
        compressor.add(value).unwrap();
    }
    compressor.finish().unwrap()
}

fn bench_compress(c: &mut Criterion) {
    let mut group = c.benchmark_group("compress");
    for size in [1_000, 100_000] {
        let data = generate(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("gorilla", size), &data, |b, data| {
            b.iter(|| black_box(compress_gorilla(black_box(data))));
        });
        group.bench_with_input(BenchmarkId::new("entropy", size), &data, |b, data| {
            b.iter(|| black_box(compress_entropy(black_box(data))));
        });
    }
    group.finish();
}

fn bench_decompress(c: &mut Criterion) {
    let mut group = c.benchmark_group("decompress");
    for size in [1_000, 100_000] {
        let data = generate(size);
        group.throughput(Throughput::Elements(size as u64));

        let compressed = compress_gorilla(&data);
        group.bench_with_input(
            BenchmarkId::new("gorilla", size),
            &compressed,
            |b, compressed| {
                b.iter(|| {
                    let mut decompressor =
                        GorillaDecompressor::<f64, _>::new(black_box(&compressed[..]));
                    for _ in 0..size {
                        black_box(decompressor.get().unwrap());
                    }
                });
            },
        );

        let compressed = compress_entropy(&data);
        group.bench_with_input(
            BenchmarkId::new("entropy", size),
            &compressed,
            |b, compressed| {
                b.iter(|| {
                    let mut decompressor =
                        EntropyDecompressor::<f64, _>::new(black_box(&compressed[..]));
                    for _ in 0..size {
                        black_box(decompressor.get().unwrap());
                    }
                });
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_compress, bench_decompress);
criterion_main!(benches);
