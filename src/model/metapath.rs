//! Metapath-constrained walk policy: candidates are admissible only when
//! their type matches the next symbol of a cyclic metapath (e.g. "121"
//! alternates types 1 and 2 forever).

use super::State;
use crate::error::ConfigError;
use crate::storage::CsrGraph;

/// Cyclic vertex-type constraint; the sampler slot is the walk's position in
/// the metapath cycle.
#[derive(Debug, Clone)]
pub struct MetapathConstrained {
    /// Required type per cycle position (closing duplicate symbol dropped)
    cycle: Vec<u32>,
}

impl MetapathConstrained {
    /// Parse and validate a metapath string against the graph.
    ///
    /// A metapath is a string of type digits (1-9) whose first and last
    /// symbols match, e.g. `"1231"`; every digit must be a type the graph
    /// declares.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for an untyped graph, a non-digit symbol, a
    /// too-short path, an unclosed cycle, or an out-of-range type.
    pub fn new(graph: &CsrGraph, path: &str) -> Result<Self, ConfigError> {
        if !graph.is_typed() {
            return Err(ConfigError::TypedGraphRequired { model: "metapath" });
        }

        let malformed = |reason: &str| ConfigError::MalformedMetapath {
            path: path.to_owned(),
            reason: reason.to_owned(),
        };

        if path.len() < 2 {
            return Err(malformed("needs at least two symbols"));
        }

        let mut digits = Vec::with_capacity(path.len());
        for c in path.chars() {
            let digit = c
                .to_digit(10)
                .filter(|&d| d >= 1)
                .ok_or_else(|| malformed("symbols must be digits 1-9"))?;
            if digit as usize > graph.type_count() {
                return Err(ConfigError::MalformedMetapath {
                    path: path.to_owned(),
                    reason: format!(
                        "type {digit} exceeds the graph's {} declared types",
                        graph.type_count()
                    ),
                });
            }
            digits.push(digit);
        }

        if digits.first() != digits.last() {
            return Err(malformed("first and last symbols must match (cyclic)"));
        }

        // The closing symbol repeats the opening one; the cycle drops it.
        digits.pop();
        Ok(Self { cycle: digits })
    }

    /// Required type at cycle position `slot`
    fn required_type(&self, slot: usize) -> u32 {
        self.cycle[slot % self.cycle.len()]
    }

    pub(crate) fn weight(&self, graph: &CsrGraph, state: State, candidate: usize) -> f32 {
        let next_type = graph.vertex_type(graph.edge_target(candidate));
        if next_type == self.required_type(state.slot + 1) {
            graph.weight(candidate)
        } else {
            0.0
        }
    }

    pub(crate) fn next_state(&self, graph: &CsrGraph, state: State, chosen: usize) -> State {
        State::new(graph.edge_target(chosen), (state.slot + 1) % self.cycle.len())
    }

    /// Walks may only start on vertices matching the metapath's first
    /// symbol; anywhere else the walk cannot proceed.
    pub(crate) fn initial_state(&self, graph: &CsrGraph, vertex: u32) -> Option<State> {
        if graph.vertex_type(vertex) == self.cycle[0] {
            Some(State::new(vertex, 0))
        } else {
            None
        }
    }

    pub(crate) fn state_count(&self) -> usize {
        self.cycle.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn typed_ring() -> CsrGraph {
        CsrGraph::from_undirected_edges(
            4,
            &[(0, 1, 1.0), (1, 2, 1.0), (2, 3, 1.0), (3, 0, 1.0)],
            Some(vec![1, 2, 1, 2]),
        )
        .unwrap()
    }

    #[test]
    fn test_validation() {
        let graph = typed_ring();
        assert!(MetapathConstrained::new(&graph, "121").is_ok());
        assert!(matches!(
            MetapathConstrained::new(&graph, "12"),
            Err(ConfigError::MalformedMetapath { .. })
        ));
        assert!(matches!(
            MetapathConstrained::new(&graph, "1a1"),
            Err(ConfigError::MalformedMetapath { .. })
        ));
        assert!(matches!(
            MetapathConstrained::new(&graph, "101"),
            Err(ConfigError::MalformedMetapath { .. })
        ));
        // Type 3 not declared by a graph with types {1, 2}.
        assert!(matches!(
            MetapathConstrained::new(&graph, "131"),
            Err(ConfigError::MalformedMetapath { .. })
        ));
        assert!(matches!(
            MetapathConstrained::new(&graph, "1"),
            Err(ConfigError::MalformedMetapath { .. })
        ));

        let untyped = CsrGraph::from_undirected_edges(2, &[(0, 1, 1.0)], None).unwrap();
        assert!(matches!(
            MetapathConstrained::new(&untyped, "121"),
            Err(ConfigError::TypedGraphRequired { .. })
        ));
    }

    #[test]
    fn test_cycle_length_is_slot_space() {
        let graph = typed_ring();
        let model = MetapathConstrained::new(&graph, "121").unwrap();
        assert_eq!(model.state_count(), 2);
        let model = MetapathConstrained::new(&graph, "12121").unwrap();
        assert_eq!(model.state_count(), 4);
    }

    #[test]
    fn test_weight_zero_on_type_mismatch() {
        let graph = typed_ring();
        let model = MetapathConstrained::new(&graph, "121").unwrap();

        // At position 0 (type 1, vertex 0) the next required type is 2.
        let state = State::new(0, 0);
        for e in graph.neighbor_range(0) {
            let target_type = graph.vertex_type(graph.edge_target(e));
            let w = model.weight(&graph, state, e);
            if target_type == 2 {
                assert_eq!(w, 1.0);
            } else {
                assert_eq!(w, 0.0);
            }
        }
    }

    #[test]
    fn test_cycle_wraps() {
        let graph = typed_ring();
        let model = MetapathConstrained::new(&graph, "121").unwrap();
        let e01 = graph.find_edge(0, 1).unwrap();
        let s1 = model.next_state(&graph, State::new(0, 0), e01);
        assert_eq!(s1, State::new(1, 1));
        // From position 1 the next required type wraps back to 1.
        let e12 = graph.find_edge(1, 2).unwrap();
        assert_eq!(model.weight(&graph, s1, e12), 1.0);
        let s2 = model.next_state(&graph, s1, e12);
        assert_eq!(s2, State::new(2, 0));
    }

    #[test]
    fn test_initial_state_requires_first_symbol() {
        let graph = typed_ring();
        let model = MetapathConstrained::new(&graph, "121").unwrap();
        assert_eq!(model.initial_state(&graph, 0), Some(State::new(0, 0)));
        assert_eq!(model.initial_state(&graph, 1), None);

        let model = MetapathConstrained::new(&graph, "212").unwrap();
        assert!(model.initial_state(&graph, 0).is_none());
        assert!(model.initial_state(&graph, 1).is_some());
    }
}
