//! Parallel corpus generation.
//!
//! One run fans `vertex_count x walks_per_vertex` walks per pass across a
//! dedicated thread pool, round-robin over start vertices. Worker-local state
//! (RNG stream, corpus writer, pass accumulator) is indexed by pool thread;
//! the chain arena is shared. A pass fully drains before accumulators are
//! merged and the model's inter-pass hook runs, so model state is only ever
//! mutated single-threaded at the barrier.

use crate::config::{ModelConfig, RunConfig};
use crate::model::PassAccumulator;
use crate::output::{merge_parts, CorpusPaths, CorpusWriter};
use crate::sampler::ChainSet;
use crate::storage::CsrGraph;
use crate::walker::{generate_walk, WalkStatus};
use crate::{Context, Result};
use parking_lot::Mutex;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use std::io;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info};

/// What a finished run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Full-length walks across all passes
    pub walks_generated: u64,
    /// Walks whose start vertex admits no walk under the model
    pub walks_skipped: u64,
    /// Walks truncated by a dead end
    pub dead_ends: u64,
    /// Generation passes executed
    pub passes: usize,
    /// Merged corpus files, when output was configured
    pub corpus: Option<CorpusPaths>,
}

/// Everything one pool thread owns for the duration of a run
struct WorkerState {
    rng: ChaCha8Rng,
    writer: Option<CorpusWriter>,
    acc: PassAccumulator,
}

impl WorkerState {
    fn new(seed: u64, worker: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        rng.set_stream(worker);
        Self {
            rng,
            writer: None,
            acc: PassAccumulator::new(),
        }
    }
}

/// Generate a walk corpus over `graph` with the given model and run
/// configuration.
///
/// Every pass's walks are written to the corpus; multi-pass models refit
/// between passes, so later passes reflect the learned weights. Dead ends
/// and inadmissible starts are counted, never propagated as errors.
///
/// # Errors
///
/// Returns configuration and model-validation errors, pool construction
/// failures, and corpus I/O failures. A failed run may leave part files
/// behind in the output directory.
pub fn generate_corpus(
    graph: &CsrGraph,
    model_config: &ModelConfig,
    config: &RunConfig,
) -> Result<RunSummary> {
    config.validate()?;
    let mut model = model_config.build(graph)?;

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.workers)
        .build()
        .context("failed to build walker thread pool")?;

    let chains = ChainSet::new(graph, &model, config.start_mode, config.cache_weights);
    let workers: Vec<Mutex<WorkerState>> = (0..config.workers)
        .map(|w| Mutex::new(WorkerState::new(config.seed, w as u64)))
        .collect();

    let vertex_count = graph.vertex_count();
    let walk_count = vertex_count * config.walks_per_vertex;
    let total_passes = model.passes();

    info!(
        model = model.name(),
        vertices = vertex_count,
        walk_count,
        walk_length = config.walk_length,
        workers = config.workers,
        passes = total_passes,
        chains = chains.chain_count(),
        "starting corpus generation"
    );

    let generated = AtomicU64::new(0);
    let skipped = AtomicU64::new(0);
    let dead_ends = AtomicU64::new(0);

    for pass in 0..total_passes {
        let final_pass = pass + 1 == total_passes;
        let model_ref = &model;

        pool.install(|| {
            (0..walk_count).into_par_iter().try_for_each(|i| {
                let worker = rayon::current_thread_index().unwrap_or(0);
                let mut state = workers[worker].lock();
                let state = &mut *state;

                #[allow(clippy::cast_possible_truncation)]
                let start = (i % vertex_count) as u32;
                let outcome = generate_walk(
                    graph,
                    model_ref,
                    &chains,
                    start,
                    config.walk_length,
                    &mut state.rng,
                    &mut state.acc,
                );

                match outcome.status {
                    WalkStatus::Completed => generated.fetch_add(1, Ordering::Relaxed),
                    WalkStatus::Skipped => skipped.fetch_add(1, Ordering::Relaxed),
                    WalkStatus::DeadEnd { .. } => dead_ends.fetch_add(1, Ordering::Relaxed),
                };

                if !outcome.sequence.is_empty() {
                    if let Some(output) = &config.output {
                        if state.writer.is_none() {
                            state.writer = Some(CorpusWriter::create(
                                &output.directory,
                                worker,
                                config.walk_length,
                                output.text_mirror,
                            )?);
                        }
                        if let Some(writer) = state.writer.as_mut() {
                            writer.write_walk(&outcome.sequence)?;
                        }
                    }
                }
                Ok::<(), io::Error>(())
            })
        })
        .context("corpus write failed")?;

        debug!(pass, final_pass, "pass drained");

        // Inter-pass barrier: all walkers are done, merge the worker-local
        // accumulators and let the model refit once.
        if !final_pass {
            let mut merged = PassAccumulator::new();
            for state in &workers {
                merged.merge(std::mem::take(&mut state.lock().acc));
            }
            model.end_pass(graph, &merged);
        }
    }

    let corpus = if let Some(output) = &config.output {
        for state in &workers {
            if let Some(writer) = state.lock().writer.take() {
                writer.finish().context("failed to flush corpus part")?;
            }
        }
        Some(
            merge_parts(&output.directory, config.workers, output.text_mirror)
                .context("failed to merge corpus parts")?,
        )
    } else {
        None
    };

    let summary = RunSummary {
        walks_generated: generated.into_inner(),
        walks_skipped: skipped.into_inner(),
        dead_ends: dead_ends.into_inner(),
        passes: total_passes,
        corpus,
    };
    info!(
        walks_generated = summary.walks_generated,
        walks_skipped = summary.walks_skipped,
        dead_ends = summary.dead_ends,
        passes = summary.passes,
        "corpus generation finished"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutputConfig;
    use tempfile::tempdir;

    fn ring4(types: Option<Vec<u32>>) -> CsrGraph {
        CsrGraph::from_undirected_edges(
            4,
            &[(0, 1, 1.0), (1, 2, 1.0), (2, 3, 1.0), (3, 0, 1.0)],
            types,
        )
        .unwrap()
    }

    fn small_config(dir: Option<&std::path::Path>) -> RunConfig {
        RunConfig {
            walk_length: 8,
            walks_per_vertex: 5,
            workers: 2,
            seed: 42,
            output: dir.map(OutputConfig::new),
            ..RunConfig::default()
        }
    }

    #[test]
    fn test_uniform_run_generates_every_walk() {
        let graph = ring4(None);
        let dir = tempdir().unwrap();
        let config = small_config(Some(dir.path()));

        let summary = generate_corpus(&graph, &ModelConfig::Uniform, &config).unwrap();
        assert_eq!(summary.walks_generated, 20);
        assert_eq!(summary.walks_skipped, 0);
        assert_eq!(summary.dead_ends, 0);
        assert_eq!(summary.passes, 1);

        let corpus = summary.corpus.unwrap();
        let bytes = std::fs::read(&corpus.binary).unwrap();
        assert_eq!(bytes.len(), 20 * 8 * 4);
    }

    #[test]
    fn test_metapath_skips_wrong_start_types() {
        let graph = ring4(Some(vec![1, 2, 1, 2]));
        let config = small_config(None);

        let summary = generate_corpus(
            &graph,
            &ModelConfig::Metapath {
                path: "121".to_owned(),
            },
            &config,
        )
        .unwrap();
        // Vertices 1 and 3 carry type 2 and cannot start a "121" walk.
        assert_eq!(summary.walks_skipped, 10);
        assert_eq!(summary.walks_generated, 10);
    }

    #[test]
    fn test_isolated_vertices_dead_end_without_aborting() {
        let graph = CsrGraph::from_undirected_edges(3, &[(0, 1, 1.0)], None).unwrap();
        let config = small_config(None);

        let summary = generate_corpus(&graph, &ModelConfig::Uniform, &config).unwrap();
        assert_eq!(summary.dead_ends, 5);
        assert_eq!(summary.walks_generated, 10);
    }

    #[test]
    fn test_hetero_corpus_carries_every_pass() {
        let graph = ring4(Some(vec![1, 2, 1, 2]));
        let dir = tempdir().unwrap();
        let config = small_config(Some(dir.path()));

        let summary = generate_corpus(
            &graph,
            &ModelConfig::Hetero {
                p: 1.0,
                q: 1.0,
                passes: 3,
            },
            &config,
        )
        .unwrap();
        assert_eq!(summary.passes, 3);
        assert_eq!(summary.walks_generated, 60);

        // Every pass's walks land in the corpus.
        let corpus = summary.corpus.unwrap();
        let bytes = std::fs::read(&corpus.binary).unwrap();
        assert_eq!(bytes.len(), 60 * 8 * 4);
    }

    #[test]
    fn test_invalid_config_rejected_before_running() {
        let graph = ring4(None);
        let config = RunConfig {
            walk_length: 0,
            ..RunConfig::default()
        };
        assert!(generate_corpus(&graph, &ModelConfig::Uniform, &config).is_err());
    }
}
