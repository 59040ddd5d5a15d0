//! walkgen: random-walk corpus generation over large labeled weighted graphs
//!
//! # Overview
//!
//! walkgen loads an undirected, optionally weighted and vertex-typed graph
//! into CSR (Compressed Sparse Row) storage and generates a corpus of random
//! walks over it for downstream embedding training. Transition distributions
//! are sampled with persistent Metropolis-Hastings chains instead of alias
//! tables, so second-order models run without quadratic preprocessing.
//!
//! # Quick Start
//!
//! ```no_run
//! use walkgen::{CsrGraph, GraphOptions, ModelConfig, OutputConfig, RunConfig};
//!
//! # async fn example() -> walkgen::Result<()> {
//! // Load a binary graph with edge weights and vertex types
//! let graph = CsrGraph::read_binary(
//!     "graph.bin",
//!     GraphOptions::plain().with_weights().with_types(),
//! )
//! .await?;
//!
//! // Generate a node2vec-style corpus into ./corpus
//! let config = RunConfig {
//!     output: Some(OutputConfig::new("corpus")),
//!     ..RunConfig::default()
//! };
//! let summary = walkgen::generate_corpus(
//!     &graph,
//!     &ModelConfig::SecondOrder { p: 0.5, q: 2.0 },
//!     &config,
//! )?;
//! println!("generated {} walks", summary.walks_generated);
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! - **Storage**: CSR adjacency with a precomputed reverse-edge index
//! - **Models**: five per-step weighting policies behind one closed enum
//! - **Sampling**: per-(vertex, slot) Metropolis-Hastings chains
//! - **Orchestration**: dedicated rayon pool, per-worker output parts merged
//!   in-process

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod model;
pub mod orchestrator;
pub mod output;
pub mod sampler;
pub mod storage;
pub mod walker;

// Re-export core types
pub use config::{ModelConfig, OutputConfig, RunConfig};
pub use error::{ConfigError, DeadEnd, LoadError};
pub use model::{State, WalkModel};
pub use orchestrator::{generate_corpus, RunSummary};
pub use output::CorpusPaths;
pub use sampler::{ChainSet, StartMode};
pub use storage::{CsrGraph, GraphOptions};
pub use walker::{WalkOutcome, WalkStatus};

// Error type
pub use anyhow::{Context, Error, Result};
