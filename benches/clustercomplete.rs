// SPDX-FileCopyrightText: Copyright (c) 2024 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

//! Benchmarks for ClusterComplete against the exhaustive reference.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use sidbsim::layout::{ExternalPotentials, SidbLayout};
use sidbsim::physics::SimulationParameters;
use sidbsim::sim::{clustercomplete, exhaustive_ground_state_simulation, ClusterCompleteParams};

fn y_gate() -> SidbLayout {
    SidbLayout::new([
        (6, 2, 0),
        (8, 3, 0),
        (12, 3, 0),
        (14, 2, 0),
        (10, 5, 0),
        (10, 6, 1),
        (10, 8, 1),
        (16, 1, 0),
    ])
}

fn bdl_wire(pairs: i64) -> SidbLayout {
    SidbLayout::new((0..pairs).flat_map(|p| [(7 * p, 0, 0), (7 * p + 2, 0, 0)]))
}

fn bench_y_gate(c: &mut Criterion) {
    let mut group = c.benchmark_group("y_gate");
    let layout = y_gate();

    for base in [2u8, 3] {
        let sim_params = SimulationParameters::new(base, -0.28);
        group.bench_function(BenchmarkId::new("clustercomplete", base), |b| {
            let params = ClusterCompleteParams {
                simulation_parameters: sim_params,
                seed: Some(0),
                ..Default::default()
            };
            b.iter(|| black_box(clustercomplete(black_box(&layout), &params)))
        });
        group.bench_function(BenchmarkId::new("exhaustive", base), |b| {
            let external = ExternalPotentials::default();
            b.iter(|| black_box(exhaustive_ground_state_simulation(black_box(&layout), &sim_params, &external)))
        });
    }

    group.finish();
}

fn bench_threads(c: &mut Criterion) {
    let mut group = c.benchmark_group("clustercomplete_threads");
    group.sample_size(10);
    let layout = bdl_wire(10);

    for threads in [1, 2, 4, 8] {
        group.bench_with_input(BenchmarkId::new("bdl_wire_20", threads), &threads, |b, &threads| {
            let params = ClusterCompleteParams {
                simulation_parameters: SimulationParameters::new(3, -0.32),
                available_threads: threads,
                seed: Some(0),
                ..Default::default()
            };
            b.iter(|| black_box(clustercomplete(&layout, &params)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_y_gate, bench_threads);
criterion_main!(benches);
