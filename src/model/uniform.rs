//! Uniform (first-order) walk policy: every neighbor equally likely.

use super::State;
use crate::storage::CsrGraph;

/// Stateless uniform policy; weight 1 for every candidate.
#[derive(Debug, Clone, Copy, Default)]
pub struct Uniform;

impl Uniform {
    /// New uniform model
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    pub(crate) fn weight(&self, _graph: &CsrGraph, _state: State, _candidate: usize) -> f32 {
        1.0
    }

    pub(crate) fn next_state(&self, graph: &CsrGraph, _state: State, chosen: usize) -> State {
        State::new(graph.edge_target(chosen), 0)
    }

    pub(crate) fn initial_state(&self, _graph: &CsrGraph, vertex: u32) -> Option<State> {
        Some(State::new(vertex, 0))
    }

    pub(crate) fn state_count(&self) -> usize {
        1
    }
}
