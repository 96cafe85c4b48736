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

//! Brain-file (de)serialization benchmarks: save and open round trips
//! over graphs of increasing size, all in-memory via `std::io::Cursor`
//! so the numbers reflect encoding cost, not disk I/O.

use std::io::Cursor;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use melvin_core::brainfile;
use melvin_core::edge::EdgeKind;
use melvin_core::graph::Graph;

fn build_graph(size: usize) -> Graph {
    let mut graph = Graph::new();
    let mut nodes = Vec::with_capacity(size);
    for i in 0..size {
        nodes.push(graph.add_node(vec![i as u8, (i / 2) as u8]));
    }
    for w in nodes.windows(2) {
        graph.link_and_strengthen(w[0], w[1], EdgeKind::CoActivation, 0.5);
    }
    graph
}

fn bench_save(c: &mut Criterion) {
    let mut group = c.benchmark_group("brainfile_save");

    for size in [16usize, 128, 1024].iter() {
        let graph = build_graph(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| {
                let mut buf = Vec::new();
                brainfile::save(black_box(&graph), &[], &[], 0, &mut buf).unwrap();
                black_box(buf)
            })
        });
    }

    group.finish();
}

fn bench_open(c: &mut Criterion) {
    let mut group = c.benchmark_group("brainfile_open");

    for size in [16usize, 128, 1024].iter() {
        let graph = build_graph(*size);
        let mut buf = Vec::new();
        brainfile::save(&graph, &[], &[], 0, &mut buf).unwrap();

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| {
                let cursor = Cursor::new(black_box(buf.clone()));
                black_box(brainfile::open(cursor).unwrap())
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_save, bench_open);
criterion_main!(benches);
