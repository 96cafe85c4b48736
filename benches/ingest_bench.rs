// Melvin - emergent associative graph engine.
// Copyright (C) 2024-2025 Melvin Engine Team
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Ingest benchmarks.
//!
//! - sequential_ingest_fresh_bytes: every byte is new, worst case for
//!   node creation
//! - sequential_ingest_known_pattern: a window the graph has already
//!   learned, exercising `find_exact` and the adaptive window bound

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use melvin_core::graph::Graph;
use melvin_core::ingest;

fn bench_ingest_fresh_bytes(c: &mut Criterion) {
    let mut group = c.benchmark_group("ingest_fresh_bytes");

    for size in [16usize, 64, 256].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            b.iter_batched(
                || Graph::new(),
                |mut graph| {
                    let input: Vec<u8> = (0..size).map(|i| (i % 251) as u8).collect();
                    black_box(ingest::sequential_ingest(&mut graph, black_box(&input)))
                },
                criterion::BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

fn bench_ingest_known_pattern(c: &mut Criterion) {
    let mut graph = Graph::new();
    let pattern = b"the quick brown fox jumps over the lazy dog";
    // Warm the graph up so the pattern's windows already exist.
    for _ in 0..8 {
        ingest::sequential_ingest(&mut graph, pattern);
    }

    c.bench_function("ingest_known_pattern", |b| {
        b.iter(|| black_box(ingest::sequential_ingest(&mut graph, black_box(pattern))))
    });
}

criterion_group!(benches, bench_ingest_fresh_bytes, bench_ingest_known_pattern);
criterion_main!(benches);
