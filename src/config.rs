//! Run configuration and model selection.
//!
//! Everything here is validated up front, before any chain is allocated or
//! any pass starts; a run either rejects its configuration immediately or
//! executes it unchanged.

use crate::error::ConfigError;
use crate::model::{
    HeterogeneousLearned, MetapathConstrained, SecondOrderBiased, TypeFair, Uniform, WalkModel,
};
use crate::sampler::StartMode;
use crate::storage::CsrGraph;
use std::path::PathBuf;

/// Default walk length in vertices
pub const DEFAULT_WALK_LENGTH: usize = 80;
/// Default walks started per vertex per pass
pub const DEFAULT_WALKS_PER_VERTEX: usize = 10;
/// Default worker thread count
pub const DEFAULT_WORKERS: usize = 16;
/// Default generation passes for the heterogeneous model
pub const DEFAULT_HETERO_PASSES: usize = 4;

/// Where and how the walk corpus is written.
#[derive(Debug, Clone)]
pub struct OutputConfig {
    /// Directory receiving the part files and the merged corpus
    pub directory: PathBuf,
    /// Also write the whitespace-separated text mirror
    pub text_mirror: bool,
}

impl OutputConfig {
    /// Binary-only corpus under `directory`
    #[must_use]
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            text_mirror: false,
        }
    }

    /// Enable the text mirror
    #[must_use]
    pub fn with_text_mirror(mut self) -> Self {
        self.text_mirror = true;
        self
    }
}

/// One corpus-generation run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Vertices per walk
    pub walk_length: usize,
    /// Walks started from each vertex per pass
    pub walks_per_vertex: usize,
    /// Worker threads in the dedicated pool
    pub workers: usize,
    /// Chain initialization strategy
    pub start_mode: StartMode,
    /// Root seed; worker RNG streams derive from it
    pub seed: u64,
    /// Cache per-chain current-edge weights instead of recomputing
    pub cache_weights: bool,
    /// Corpus output; `None` generates and discards (benchmarks, learning
    /// passes)
    pub output: Option<OutputConfig>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            walk_length: DEFAULT_WALK_LENGTH,
            walks_per_vertex: DEFAULT_WALKS_PER_VERTEX,
            workers: DEFAULT_WORKERS,
            start_mode: StartMode::Random,
            seed: 0,
            cache_weights: true,
            output: None,
        }
    }
}

impl RunConfig {
    /// Check the scalar parameters.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ParameterOutOfRange`] for zero lengths, counts,
    /// or worker counts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_positive("walk_length", self.walk_length)?;
        require_positive("walks_per_vertex", self.walks_per_vertex)?;
        require_positive("workers", self.workers)?;
        Ok(())
    }
}

fn require_positive(name: &'static str, value: usize) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::ParameterOutOfRange {
            name,
            reason: "must be at least 1".to_owned(),
        });
    }
    Ok(())
}

fn require_positive_f32(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(ConfigError::ParameterOutOfRange {
            name,
            reason: format!("must be positive and finite, got {value}"),
        });
    }
    Ok(())
}

/// Walk-model selector with per-variant parameters.
#[derive(Debug, Clone)]
pub enum ModelConfig {
    /// Every neighbor equally likely
    Uniform,
    /// Second-order p/q bias
    SecondOrder {
        /// Return parameter
        p: f32,
        /// In-out parameter
        q: f32,
    },
    /// p/q bias equalized across neighbor types (typed graphs only)
    TypeFair {
        /// Return parameter
        p: f32,
        /// In-out parameter
        q: f32,
    },
    /// Cyclic vertex-type constraint (typed graphs only)
    Metapath {
        /// Metapath string, e.g. `"121"`
        path: String,
    },
    /// Learned edge-type correlation reweighting (typed graphs only)
    Hetero {
        /// Return parameter
        p: f32,
        /// In-out parameter
        q: f32,
        /// Generation passes
        passes: usize,
    },
}

impl ModelConfig {
    /// Heterogeneous model with the default pass count
    #[must_use]
    pub fn hetero(p: f32, q: f32) -> Self {
        Self::Hetero {
            p,
            q,
            passes: DEFAULT_HETERO_PASSES,
        }
    }

    /// Validate the parameters against `graph` and build the model.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for non-positive p/q, malformed metapaths, or
    /// models requiring vertex types the graph does not carry.
    pub fn build(&self, graph: &CsrGraph) -> Result<WalkModel, ConfigError> {
        match self {
            Self::Uniform => Ok(WalkModel::Uniform(Uniform::new())),
            Self::SecondOrder { p, q } => {
                require_positive_f32("p", *p)?;
                require_positive_f32("q", *q)?;
                Ok(WalkModel::SecondOrder(SecondOrderBiased::new(*p, *q)))
            }
            Self::TypeFair { p, q } => {
                require_positive_f32("p", *p)?;
                require_positive_f32("q", *q)?;
                Ok(WalkModel::TypeFair(TypeFair::new(graph, *p, *q)?))
            }
            Self::Metapath { path } => Ok(WalkModel::Metapath(MetapathConstrained::new(
                graph, path,
            )?)),
            Self::Hetero { p, q, passes } => {
                require_positive_f32("p", *p)?;
                require_positive_f32("q", *q)?;
                Ok(WalkModel::Hetero(HeterogeneousLearned::with_passes(
                    graph, *p, *q, *passes,
                )?))
            }
        }
    }
}
