//! Criterion benchmarks for walk generation
//!
//! Covers the hot paths: graph load (CSR build + reverse index), single-walk
//! sampling per model, and full multi-threaded corpus generation.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::hint::black_box;
use walkgen::model::{PassAccumulator, SecondOrderBiased, Uniform};
use walkgen::sampler::ChainSet;
use walkgen::walker::generate_walk;
use walkgen::{generate_corpus, CsrGraph, ModelConfig, RunConfig, StartMode, WalkModel};

/// Generate a random undirected graph (simple LCG for reproducibility)
fn generate_random_graph(num_vertices: usize, edges_per_vertex: usize) -> CsrGraph {
    let mut edges = Vec::new();
    let mut rng_state = 12345_u64;

    for vertex in 0..num_vertices {
        for _ in 0..edges_per_vertex {
            rng_state = rng_state.wrapping_mul(1103515245).wrapping_add(12345);
            let target = (rng_state % num_vertices as u64) as u32;
            if target != vertex as u32 {
                rng_state = rng_state.wrapping_mul(1103515245).wrapping_add(12345);
                let weight = 0.5 + (rng_state % 100) as f32 / 100.0;
                edges.push((vertex as u32, target, weight));
            }
        }
    }

    let types: Vec<u32> = (0..num_vertices as u32).map(|v| 1 + v % 3).collect();
    CsrGraph::from_undirected_edges(num_vertices, &edges, Some(types)).unwrap()
}

/// Benchmark: CSR construction and reverse-index build
fn bench_graph_load(c: &mut Criterion) {
    let mut group = c.benchmark_group("graph_load");

    for size in [1_000, 10_000, 50_000].iter() {
        group.bench_with_input(BenchmarkId::new("build", size), size, |b, &size| {
            b.iter(|| {
                let graph = generate_random_graph(black_box(size), 5);
                black_box(graph);
            });
        });
    }

    group.finish();
}

/// Benchmark: single walks per model on one thread
fn bench_single_walks(c: &mut Criterion) {
    let mut group = c.benchmark_group("single_walk");
    let graph = generate_random_graph(10_000, 5);

    let models = [
        ("uniform", WalkModel::Uniform(Uniform::new())),
        (
            "second_order",
            WalkModel::SecondOrder(SecondOrderBiased::new(0.5, 2.0)),
        ),
    ];
    for (name, model) in models {
        let chains = ChainSet::new(&graph, &model, StartMode::Random, true);
        group.bench_function(BenchmarkId::new(name, 80), |b| {
            let mut rng = ChaCha8Rng::seed_from_u64(1);
            let mut acc = PassAccumulator::new();
            let mut start = 0u32;
            b.iter(|| {
                start = (start + 1) % 10_000;
                let outcome =
                    generate_walk(&graph, &model, &chains, start, 80, &mut rng, &mut acc);
                black_box(outcome);
            });
        });
    }

    group.finish();
}

/// Benchmark: full corpus generation across the worker pool
fn bench_corpus_generation(c: &mut Criterion) {
    let mut group = c.benchmark_group("corpus_generation");
    group.sample_size(10);

    for size in [1_000, 5_000].iter() {
        let graph = generate_random_graph(*size, 5);
        let config = RunConfig {
            walk_length: 40,
            walks_per_vertex: 2,
            workers: 4,
            seed: 99,
            output: None,
            ..RunConfig::default()
        };

        group.bench_with_input(BenchmarkId::new("uniform", size), &graph, |b, graph| {
            b.iter(|| {
                let summary = generate_corpus(graph, &ModelConfig::Uniform, &config).unwrap();
                black_box(summary);
            });
        });

        group.bench_with_input(
            BenchmarkId::new("second_order", size),
            &graph,
            |b, graph| {
                b.iter(|| {
                    let summary = generate_corpus(
                        graph,
                        &ModelConfig::SecondOrder { p: 0.5, q: 2.0 },
                        &config,
                    )
                    .unwrap();
                    black_box(summary);
                });
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_graph_load,
    bench_single_walks,
    bench_corpus_generation
);
criterion_main!(benches);
