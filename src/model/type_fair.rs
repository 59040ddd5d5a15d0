//! Type-fair walk policy: second-order p/q bias divided by the number of
//! current-vertex neighbors sharing the candidate's type, so sampling mass is
//! split evenly across types regardless of per-type degree.
//!
//! The slot space is fixed at 1 and the arrival slot is pinned to 0, so the
//! p/q bias always reads arrival offset 0 rather than the true arrival edge.
//! This is the contract inherited from the original policy definition; do
//! not widen the slot space without revising it.

use super::{pq_bias, previous_vertex, State};
use crate::error::ConfigError;
use crate::storage::CsrGraph;

/// Type-equalized p/q policy with precomputed per-vertex neighbor-type
/// counts.
#[derive(Debug, Clone)]
pub struct TypeFair {
    p: f32,
    q: f32,
    /// `counts[v * stride + t]` = neighbors of `v` with type `t`
    /// (types are 1-based; index 0 unused)
    counts: Vec<u32>,
    stride: usize,
}

impl TypeFair {
    /// Build the model, precomputing neighbor-type counts for every vertex.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::TypedGraphRequired`] when the graph carries no
    /// vertex types.
    pub fn new(graph: &CsrGraph, p: f32, q: f32) -> Result<Self, ConfigError> {
        if !graph.is_typed() {
            return Err(ConfigError::TypedGraphRequired { model: "type-fair" });
        }

        let stride = graph.type_count() + 1;
        let mut counts = vec![0u32; graph.vertex_count() * stride];
        for v in 0..graph.vertex_count() as u32 {
            for &neighbor in graph.neighbors(v) {
                counts[v as usize * stride + graph.vertex_type(neighbor) as usize] += 1;
            }
        }

        Ok(Self { p, q, counts, stride })
    }

    /// Neighbors of `v` sharing type `t`
    fn neighbor_type_count(&self, v: u32, t: u32) -> u32 {
        self.counts[v as usize * self.stride + t as usize]
    }

    pub(crate) fn weight(&self, graph: &CsrGraph, state: State, candidate: usize) -> f32 {
        let prev = previous_vertex(graph, state);
        let next = graph.edge_target(candidate);
        let next_type = graph.vertex_type(next);
        // The candidate is a neighbor of the current vertex, so its type
        // count is at least 1.
        let share = self.neighbor_type_count(state.vertex, next_type) as f32;
        graph.weight(candidate) * pq_bias(graph, prev, next, self.p, self.q) / share
    }

    pub(crate) fn next_state(&self, graph: &CsrGraph, _state: State, chosen: usize) -> State {
        // Slot pinned to 0 (see module docs).
        State::new(graph.edge_target(chosen), 0)
    }

    pub(crate) fn initial_state(&self, _graph: &CsrGraph, vertex: u32) -> Option<State> {
        Some(State::new(vertex, 0))
    }

    pub(crate) fn state_count(&self) -> usize {
        1
    }
}
