//! Single-walk execution: drive one random walk from a start vertex through
//! the model and the chain arena.
//!
//! A walk makes `walk_length - 1` steps. Each step proposes a uniformly
//! random neighbor edge of the current vertex and moves along whatever edge
//! the chain for the current state returns. Walks that cannot start yield an
//! empty sequence; walks that hit a dead end keep what they have.

use crate::model::{PassAccumulator, WalkModel};
use crate::sampler::ChainSet;
use crate::storage::CsrGraph;
use rand::Rng;
use tracing::debug;

/// How a walk ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkStatus {
    /// Full `walk_length` vertices generated
    Completed,
    /// The model admits no walk from the start vertex; the sequence is empty
    Skipped,
    /// No viable transition from `vertex`; the sequence is truncated
    DeadEnd {
        /// Vertex the walk stalled on
        vertex: u32,
    },
}

/// One finished walk: the vertex sequence plus how it ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkOutcome {
    /// Visited vertices in order; empty for skipped walks
    pub sequence: Vec<u32>,
    /// Terminal status
    pub status: WalkStatus,
}

impl WalkOutcome {
    /// Whether the walk reached its full length
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.status == WalkStatus::Completed
    }
}

/// Generate one walk of up to `walk_length` vertices starting at `start`.
///
/// Completed walks are folded into `acc` for models that learn across passes.
pub fn generate_walk<R: Rng>(
    graph: &CsrGraph,
    model: &WalkModel,
    chains: &ChainSet,
    start: u32,
    walk_length: usize,
    rng: &mut R,
    acc: &mut PassAccumulator,
) -> WalkOutcome {
    let Some(mut state) = model.initial_state(graph, start, rng) else {
        return WalkOutcome {
            sequence: Vec::new(),
            status: WalkStatus::Skipped,
        };
    };

    let mut sequence = Vec::with_capacity(walk_length);
    sequence.push(start);

    let mut status = WalkStatus::Completed;
    while sequence.len() < walk_length {
        let range = graph.neighbor_range(state.vertex);
        if range.is_empty() {
            status = WalkStatus::DeadEnd {
                vertex: state.vertex,
            };
            break;
        }

        let candidate = rng.random_range(range);
        match chains.next_edge(graph, model, state, candidate, rng) {
            Ok(edge) => {
                sequence.push(graph.edge_target(edge));
                state = model.next_state(graph, state, edge);
            }
            Err(dead) => {
                status = WalkStatus::DeadEnd {
                    vertex: dead.vertex,
                };
                break;
            }
        }
    }

    if status == WalkStatus::Completed {
        model.record_walk(graph, &sequence, acc);
    } else if let WalkStatus::DeadEnd { vertex } = status {
        debug!(start, vertex, steps = sequence.len(), "walk hit a dead end");
    }
    WalkOutcome { sequence, status }
}
