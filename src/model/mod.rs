//! Walk-model family
//!
//! Five per-step weighting/state-transition policies behind one closed enum,
//! selected once at startup. Each variant answers four questions for the
//! sampler and walker: how heavy is a candidate edge given the current state,
//! what is the state after taking an edge, where does a walk start, and how
//! many sampler slots a vertex needs.
//!
//! All weighting is pure with respect to concurrent sampling; the only
//! mutable model state (the heterogeneous variant's correlation matrix) is
//! updated exclusively at the inter-pass barrier via [`WalkModel::end_pass`].

pub mod hetero;
pub mod metapath;
pub mod second_order;
pub mod type_fair;
pub mod uniform;

pub use hetero::HeterogeneousLearned;
pub use metapath::MetapathConstrained;
pub use second_order::SecondOrderBiased;
pub use type_fair::TypeFair;
pub use uniform::Uniform;

use crate::storage::CsrGraph;
use rand::Rng;
use std::collections::HashMap;

/// Walk state: the current vertex plus the arrival slot identifying which
/// incoming edge was used to reach it.
///
/// Order-independent models keep the slot pinned at 0. "This walk cannot
/// proceed" is expressed as `Option<State>::None` at walk start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct State {
    /// Current vertex
    pub vertex: u32,
    /// Arrival slot: index of the incoming edge within the vertex's
    /// adjacency slice (0 for order-independent models)
    pub slot: usize,
}

impl State {
    /// State at `vertex` with arrival slot `slot`
    #[must_use]
    pub fn new(vertex: u32, slot: usize) -> Self {
        Self { vertex, slot }
    }
}

/// Worker-local statistics folded out of finished walks within one pass.
///
/// Only the heterogeneous variant reads these: per start vertex, the
/// edge-type counts of the most recent finished walk (later walks overwrite
/// earlier ones, and on merge the incoming accumulator wins). Merging happens
/// at the inter-pass barrier, never during sampling.
#[derive(Debug, Default)]
pub struct PassAccumulator {
    per_start: HashMap<u32, Box<[u32]>>,
}

impl PassAccumulator {
    /// Empty accumulator
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the edge-type count vector of a walk started at `start`,
    /// replacing any earlier walk from the same start vertex.
    pub fn record(&mut self, start: u32, counts: Box<[u32]>) {
        self.per_start.insert(start, counts);
    }

    /// Fold another worker's accumulator into this one (the incoming
    /// accumulator wins on shared start vertices).
    pub fn merge(&mut self, other: Self) {
        self.per_start.extend(other.per_start);
    }

    /// Drop all recorded walks (between passes)
    pub fn clear(&mut self) {
        self.per_start.clear();
    }

    /// Count vector recorded for `start`, if any walk finished there
    #[must_use]
    pub fn counts_for(&self, start: u32) -> Option<&[u32]> {
        self.per_start.get(&start).map(AsRef::as_ref)
    }

    /// Start vertices with a recorded walk
    pub fn starts(&self) -> impl Iterator<Item = u32> + '_ {
        self.per_start.keys().copied()
    }

    /// Whether any walk was recorded this pass
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.per_start.is_empty()
    }
}

/// The closed family of walk policies.
///
/// Dispatch is a match over a fixed variant set; per-variant parameters and
/// precomputed tables live inside the variants.
#[derive(Debug, Clone)]
pub enum WalkModel {
    /// Every neighbor equally likely; stateless
    Uniform(Uniform),
    /// node2vec-style p/q bias keyed on the arrival edge
    SecondOrder(SecondOrderBiased),
    /// p/q bias equalized across neighbor types
    TypeFair(TypeFair),
    /// Cyclic vertex-type constraint
    Metapath(MetapathConstrained),
    /// Learned edge-type correlation reweighting across passes
    Hetero(HeterogeneousLearned),
}

impl WalkModel {
    /// Unnormalized transition weight of `candidate` (an edge index incident
    /// to `state.vertex`) given the current state. Deterministic and >= 0.
    #[must_use]
    pub fn weight(&self, graph: &CsrGraph, state: State, candidate: usize) -> f32 {
        match self {
            Self::Uniform(m) => m.weight(graph, state, candidate),
            Self::SecondOrder(m) => m.weight(graph, state, candidate),
            Self::TypeFair(m) => m.weight(graph, state, candidate),
            Self::Metapath(m) => m.weight(graph, state, candidate),
            Self::Hetero(m) => m.weight(graph, state, candidate),
        }
    }

    /// State after moving along `chosen` (an accepted edge index)
    #[must_use]
    pub fn next_state(&self, graph: &CsrGraph, state: State, chosen: usize) -> State {
        match self {
            Self::Uniform(m) => m.next_state(graph, state, chosen),
            Self::SecondOrder(m) => m.next_state(graph, state, chosen),
            Self::TypeFair(m) => m.next_state(graph, state, chosen),
            Self::Metapath(m) => m.next_state(graph, state, chosen),
            Self::Hetero(m) => m.next_state(graph, state, chosen),
        }
    }

    /// Starting state for a walk at `vertex`, or `None` when no walk can
    /// proceed from there under this model (type mismatch, zero degree).
    pub fn initial_state<R: Rng>(
        &self,
        graph: &CsrGraph,
        vertex: u32,
        rng: &mut R,
    ) -> Option<State> {
        match self {
            Self::Uniform(m) => m.initial_state(graph, vertex),
            Self::SecondOrder(m) => m.initial_state(graph, vertex, rng),
            Self::TypeFair(m) => m.initial_state(graph, vertex),
            Self::Metapath(m) => m.initial_state(graph, vertex),
            Self::Hetero(m) => m.initial_state(graph, vertex, rng),
        }
    }

    /// Size of `vertex`'s sampler-slot space (1 for order-independent
    /// models, `degree(vertex)` for second-order ones)
    #[must_use]
    pub fn state_count(&self, graph: &CsrGraph, vertex: u32) -> usize {
        match self {
            Self::Uniform(m) => m.state_count(),
            Self::SecondOrder(m) => m.state_count(graph, vertex),
            Self::TypeFair(m) => m.state_count(),
            Self::Metapath(m) => m.state_count(),
            Self::Hetero(m) => m.state_count(graph, vertex),
        }
    }

    /// Number of generation passes this model needs (1 except for the
    /// heterogeneous variant)
    #[must_use]
    pub fn passes(&self) -> usize {
        match self {
            Self::Hetero(m) => m.passes(),
            _ => 1,
        }
    }

    /// Fold a finished walk into the worker-local pass accumulator.
    /// No-op for every variant but the heterogeneous one.
    pub fn record_walk(&self, graph: &CsrGraph, walk: &[u32], acc: &mut PassAccumulator) {
        if let Self::Hetero(m) = self {
            m.record_walk(graph, walk, acc);
        }
    }

    /// Inter-pass hook, run exactly once per pass after all workers drained.
    /// No-op for every variant but the heterogeneous one.
    pub fn end_pass(&mut self, graph: &CsrGraph, acc: &PassAccumulator) {
        if let Self::Hetero(m) = self {
            m.end_pass(graph, acc);
        }
    }

    /// Stable model name for logs and summaries
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Uniform(_) => "uniform",
            Self::SecondOrder(_) => "second-order",
            Self::TypeFair(_) => "type-fair",
            Self::Metapath(_) => "metapath",
            Self::Hetero(_) => "heterogeneous",
        }
    }
}

/// Shared node2vec-style second-order bias: `1/p` toward the previous vertex,
/// `1` toward common neighbors of previous and current, `1/q` otherwise.
pub(crate) fn pq_bias(graph: &CsrGraph, prev: u32, next: u32, p: f32, q: f32) -> f32 {
    if next == prev {
        1.0 / p
    } else if graph.has_edge(prev, next) {
        1.0
    } else {
        1.0 / q
    }
}

/// Previous vertex implied by `state`: the target of the arrival-slot edge
/// within the current vertex's slice (valid on symmetric graphs).
pub(crate) fn previous_vertex(graph: &CsrGraph, state: State) -> u32 {
    graph.edge_target(graph.neighbor_range(state.vertex).start + state.slot)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pass_accumulator_last_walk_wins() {
        let mut acc = PassAccumulator::new();
        acc.record(3, vec![1, 0].into_boxed_slice());
        acc.record(3, vec![0, 2].into_boxed_slice());
        assert_eq!(acc.counts_for(3), Some(&[0, 2][..]));
        assert_eq!(acc.starts().count(), 1);
    }

    #[test]
    fn test_pass_accumulator_merge_prefers_incoming() {
        let mut left = PassAccumulator::new();
        left.record(0, vec![5].into_boxed_slice());
        left.record(1, vec![1].into_boxed_slice());

        let mut right = PassAccumulator::new();
        right.record(1, vec![9].into_boxed_slice());

        left.merge(right);
        assert_eq!(left.counts_for(0), Some(&[5][..]));
        assert_eq!(left.counts_for(1), Some(&[9][..]));
    }

    #[test]
    fn test_pass_accumulator_clear() {
        let mut acc = PassAccumulator::new();
        acc.record(0, vec![1].into_boxed_slice());
        acc.clear();
        assert!(acc.is_empty());
    }
}
