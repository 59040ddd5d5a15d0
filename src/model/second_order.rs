//! Second-order biased walk policy (return parameter `p`, in-out parameter
//! `q`).
//!
//! The transition weight depends on both the current vertex and the vertex
//! the walk arrived from: `w/p` back to the previous vertex, `w` to common
//! neighbors of previous and current, `w/q` everywhere else. The arrival
//! edge is tracked as the sampler slot, so each vertex needs `degree(v)`
//! chains.

use super::{pq_bias, previous_vertex, State};
use crate::storage::CsrGraph;
use rand::Rng;

/// p/q-biased second-order policy.
#[derive(Debug, Clone, Copy)]
pub struct SecondOrderBiased {
    p: f32,
    q: f32,
}

impl SecondOrderBiased {
    /// New model with return parameter `p` and in-out parameter `q`
    #[must_use]
    pub fn new(p: f32, q: f32) -> Self {
        Self { p, q }
    }

    pub(crate) fn weight(&self, graph: &CsrGraph, state: State, candidate: usize) -> f32 {
        let prev = previous_vertex(graph, state);
        let next = graph.edge_target(candidate);
        graph.weight(candidate) * pq_bias(graph, prev, next, self.p, self.q)
    }

    pub(crate) fn next_state(&self, graph: &CsrGraph, _state: State, chosen: usize) -> State {
        State::new(graph.edge_target(chosen), graph.arrival_slot(chosen))
    }

    /// A fresh walk has no real arrival edge; draw one uniformly so the
    /// first step behaves like an arbitrary continuation.
    pub(crate) fn initial_state<R: Rng>(
        &self,
        graph: &CsrGraph,
        vertex: u32,
        rng: &mut R,
    ) -> Option<State> {
        let degree = graph.degree(vertex);
        if degree == 0 {
            return None;
        }
        Some(State::new(vertex, rng.random_range(0..degree)))
    }

    pub(crate) fn state_count(&self, graph: &CsrGraph, vertex: u32) -> usize {
        graph.degree(vertex)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    /// Triangle 0-1-2 plus pendant 3 attached to 2: gives all three bias
    /// cases from vertex 2 after arriving via 1.
    fn triangle_with_tail() -> CsrGraph {
        CsrGraph::from_undirected_edges(
            4,
            &[(0, 1, 1.0), (0, 2, 1.0), (1, 2, 1.0), (2, 3, 1.0)],
            None,
        )
        .unwrap()
    }

    #[test]
    fn test_weight_rules() {
        let graph = triangle_with_tail();
        let model = SecondOrderBiased::new(4.0, 0.25);

        // Arrived at 2 via the edge 1 -> 2.
        let arrival = graph.find_edge(1, 2).unwrap();
        let state = State::new(2, graph.arrival_slot(arrival));
        assert_eq!(super::super::previous_vertex(&graph, state), 1);

        // Back to previous vertex: w / p.
        let back = graph.find_edge(2, 1).unwrap();
        assert!((model.weight(&graph, state, back) - 1.0 / 4.0).abs() < 1e-6);

        // Common neighbor of 1 and 2: plain w.
        let common = graph.find_edge(2, 0).unwrap();
        assert!((model.weight(&graph, state, common) - 1.0).abs() < 1e-6);

        // Neither: w / q.
        let out = graph.find_edge(2, 3).unwrap();
        assert!((model.weight(&graph, state, out) - 4.0).abs() < 1e-6);
    }

    #[test]
    fn test_neutral_parameters_weigh_everything_by_edge_weight() {
        let graph = triangle_with_tail();
        let model = SecondOrderBiased::new(1.0, 1.0);
        let arrival = graph.find_edge(1, 2).unwrap();
        let state = State::new(2, graph.arrival_slot(arrival));
        for e in graph.neighbor_range(2) {
            assert_eq!(model.weight(&graph, state, e), graph.weight(e));
        }
    }

    #[test]
    fn test_state_tracks_arrival_slot() {
        let graph = triangle_with_tail();
        let model = SecondOrderBiased::new(1.0, 1.0);
        let e = graph.find_edge(0, 2).unwrap();
        let next = model.next_state(&graph, State::new(0, 0), e);
        assert_eq!(next.vertex, 2);
        assert_eq!(next.slot, graph.arrival_slot(e));
        // The implied previous vertex round-trips.
        assert_eq!(super::super::previous_vertex(&graph, next), 0);
    }

    #[test]
    fn test_slot_space_is_degree() {
        let graph = triangle_with_tail();
        let model = SecondOrderBiased::new(1.0, 1.0);
        assert_eq!(model.state_count(&graph, 2), 3);
        assert_eq!(model.state_count(&graph, 3), 1);
    }

    #[test]
    fn test_initial_state_none_for_isolated_vertex() {
        let graph = CsrGraph::from_undirected_edges(3, &[(0, 1, 1.0)], None).unwrap();
        let model = SecondOrderBiased::new(1.0, 1.0);
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        assert!(model.initial_state(&graph, 2, &mut rng).is_none());
        let state = model.initial_state(&graph, 0, &mut rng).unwrap();
        assert!(state.slot < graph.degree(0));
    }
}
