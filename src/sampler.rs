//! Metropolis-Hastings edge sampling with persistent per-state chains.
//!
//! Every (vertex, slot) state owns one chain holding the edge it currently
//! sits on. A walker step proposes a uniformly random neighbor edge; the chain
//! accepts it when it is at least as heavy as the current edge, otherwise with
//! probability `w_candidate / w_current`, and the walker always moves along
//! the chain's (possibly unchanged) current edge. Chains persist across walks
//! and passes, so later walks resume already-mixed chains.
//!
//! Chains live in one flat arena indexed by cumulative per-vertex slot
//! offsets; each chain sits behind its own lock, and a step touches exactly
//! one chain.

use crate::error::DeadEnd;
use crate::model::{State, WalkModel};
use crate::storage::CsrGraph;
use parking_lot::Mutex;
use rand::Rng;

/// Discarded accept/reject proposals under [`StartMode::BurnIn`]
const BURN_IN_STEPS: usize = 100;
/// Random proposals compared under [`StartMode::Weight`]
const WEIGHT_PROPOSALS: usize = 20;

/// How a chain picks its first edge.
///
/// One mode applies to a whole run; chains initialize lazily on first use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StartMode {
    /// Uniformly random neighbor edge, falling back to an in-order scan for
    /// the first positive-weight edge
    #[default]
    Random,
    /// [`StartMode::Random`], then `BURN_IN_STEPS` discarded proposals
    BurnIn,
    /// [`StartMode::Random`], then the heaviest of `WEIGHT_PROPOSALS` random
    /// proposals
    Weight,
}

/// One persistent chain: the edge the sampler currently sits on for a single
/// (vertex, slot) state
#[derive(Debug, Clone, Copy)]
struct Chain {
    started: bool,
    edge: usize,
    /// Model weight of `edge`, kept in step with it; read only when weight
    /// caching is enabled
    weight: f32,
}

impl Chain {
    const fn unstarted() -> Self {
        Self {
            started: false,
            edge: 0,
            weight: 0.0,
        }
    }
}

/// Flat arena of per-(vertex, slot) chains.
///
/// Sized from the model's slot space at construction; thereafter only
/// individual chains are locked, never the arena.
pub struct ChainSet {
    chains: Vec<Mutex<Chain>>,
    /// `offsets[v]..offsets[v + 1]` indexes vertex `v`'s chains
    offsets: Vec<usize>,
    start_mode: StartMode,
    cache_weights: bool,
}

impl ChainSet {
    /// Allocate unstarted chains for every (vertex, slot) state the model
    /// defines on `graph`.
    #[must_use]
    pub fn new(
        graph: &CsrGraph,
        model: &WalkModel,
        start_mode: StartMode,
        cache_weights: bool,
    ) -> Self {
        let mut offsets = Vec::with_capacity(graph.vertex_count() + 1);
        offsets.push(0);
        let mut total = 0usize;
        for v in 0..graph.vertex_count() as u32 {
            total += model.state_count(graph, v);
            offsets.push(total);
        }

        let chains = (0..total).map(|_| Mutex::new(Chain::unstarted())).collect();
        Self {
            chains,
            offsets,
            start_mode,
            cache_weights,
        }
    }

    /// Total number of chains in the arena
    #[must_use]
    pub fn chain_count(&self) -> usize {
        self.chains.len()
    }

    fn chain_index(&self, state: State) -> usize {
        self.offsets[state.vertex as usize] + state.slot
    }

    /// Run one accept/reject step for `state` against `candidate` and return
    /// the edge the walker should take (the chain's current edge, whether or
    /// not the candidate was accepted).
    ///
    /// The chain is initialized under the same lock on first use.
    ///
    /// # Errors
    ///
    /// Returns [`DeadEnd`] when the state has no positive-weight outgoing
    /// edge, which can only surface during initialization.
    pub fn next_edge<R: Rng>(
        &self,
        graph: &CsrGraph,
        model: &WalkModel,
        state: State,
        candidate: usize,
        rng: &mut R,
    ) -> Result<usize, DeadEnd> {
        let mut chain = self.chains[self.chain_index(state)].lock();

        if !chain.started {
            let (edge, weight) = self.init_chain(graph, model, state, rng)?;
            chain.edge = edge;
            chain.weight = weight;
            chain.started = true;
        }

        let current = if self.cache_weights {
            chain.weight
        } else {
            model.weight(graph, state, chain.edge)
        };
        let proposed = model.weight(graph, state, candidate);

        if proposed >= current || rng.random::<f32>() < proposed / current {
            chain.edge = candidate;
            chain.weight = proposed;
        }
        Ok(chain.edge)
    }

    /// First edge and weight for a fresh chain, per the configured start mode
    fn init_chain<R: Rng>(
        &self,
        graph: &CsrGraph,
        model: &WalkModel,
        state: State,
        rng: &mut R,
    ) -> Result<(usize, f32), DeadEnd> {
        let (mut edge, mut weight) = random_init(graph, model, state, rng)?;

        match self.start_mode {
            StartMode::Random => {}
            StartMode::BurnIn => {
                let range = graph.neighbor_range(state.vertex);
                for _ in 0..BURN_IN_STEPS {
                    let proposal = rng.random_range(range.clone());
                    let w1 = model.weight(graph, state, proposal);
                    if w1 >= weight || rng.random::<f32>() < w1 / weight {
                        edge = proposal;
                        weight = w1;
                    }
                }
            }
            StartMode::Weight => {
                let range = graph.neighbor_range(state.vertex);
                for _ in 0..WEIGHT_PROPOSALS {
                    let proposal = rng.random_range(range.clone());
                    let w1 = model.weight(graph, state, proposal);
                    if w1 > weight {
                        edge = proposal;
                        weight = w1;
                    }
                }
            }
        }
        Ok((edge, weight))
    }
}

/// Uniformly random neighbor edge; if its weight is not positive, the first
/// positive-weight edge in slice order; otherwise the state is a dead end.
fn random_init<R: Rng>(
    graph: &CsrGraph,
    model: &WalkModel,
    state: State,
    rng: &mut R,
) -> Result<(usize, f32), DeadEnd> {
    let range = graph.neighbor_range(state.vertex);
    if range.is_empty() {
        return Err(DeadEnd {
            vertex: state.vertex,
        });
    }

    let pick = rng.random_range(range.clone());
    let weight = model.weight(graph, state, pick);
    if weight > 0.0 {
        return Ok((pick, weight));
    }
    for edge in range {
        let weight = model.weight(graph, state, edge);
        if weight > 0.0 {
            return Ok((edge, weight));
        }
    }
    Err(DeadEnd {
        vertex: state.vertex,
    })
}
