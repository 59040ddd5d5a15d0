//! CSR (Compressed Sparse Row) graph store
//!
//! Immutable after load. Adjacency is stored as per-vertex offset ranges into
//! a flat edge array; destinations within each vertex slice are strictly
//! increasing, which makes `has_edge`/`find_edge` a binary search.
//!
//! ```text
//! Ring 0-1, 1-2, 2-0 (symmetric):
//!   offsets: [0, 2, 4, 6]
//!   edges:   [1, 2, 0, 2, 0, 1]
//!   reverse: [2, 4, 0, 5, 1, 3]   // reverse[e] = position of the back-edge
//! ```
//!
//! The graph is required to be symmetric: every (u -> v) has a matching
//! (v -> u). The reverse-edge index caches each back-edge position and is
//! load-bearing for every second-order walk model.

use crate::error::LoadError;
use rayon::prelude::*;
use std::ops::Range;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{info, warn};

/// Reverse-index slot value before any writer has claimed it.
const REV_UNSET: usize = usize::MAX;

/// Immutable CSR graph with edge weights, vertex types, and a reverse-edge
/// index.
///
/// Owns all of its storage exclusively and exposes immutable slice views;
/// loaded once per run and freely shared across worker threads without
/// locking.
#[derive(Debug, Clone)]
pub struct CsrGraph {
    /// Per-vertex edge ranges; length `vertex_count + 1`, non-decreasing,
    /// `offsets[vertex_count] == edge_count`
    offsets: Vec<usize>,

    /// Edge destinations; length `edge_count`, strictly increasing within
    /// each vertex slice
    edges: Vec<u32>,

    /// Edge weights; all 1.0 when the source file was unweighted
    weights: Vec<f32>,

    /// Vertex type labels (1-based when typed, all 0 when untyped)
    types: Vec<u32>,

    /// `reverse[e]` = edge index of the matching back-edge
    reverse: Vec<usize>,

    /// Largest type label (1 for untyped graphs)
    type_count: usize,

    weighted: bool,
    typed: bool,
}

impl CsrGraph {
    /// Assemble a graph from already-decoded CSR sections, validate the load
    /// invariants, and build the reverse-edge index.
    ///
    /// `weights`/`types` are `None` when the corresponding file section was
    /// absent; defaults (1.0 / 0) are filled in.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError`] if offsets are not monotonic, any adjacency
    /// slice is not strictly increasing, any target is out of range, or the
    /// graph is not symmetric.
    pub fn from_parts(
        offsets: Vec<usize>,
        edges: Vec<u32>,
        weights: Option<Vec<f32>>,
        types: Option<Vec<u32>>,
    ) -> Result<Self, LoadError> {
        let vertex_count = offsets.len().saturating_sub(1);
        let edge_count = edges.len();

        validate_csr(&offsets, &edges)?;

        let weighted = weights.is_some();
        let typed = types.is_some();
        let weights = weights.unwrap_or_else(|| vec![1.0; edge_count]);
        let types = types.unwrap_or_else(|| vec![0; vertex_count]);
        if typed {
            if types.len() != vertex_count {
                return Err(LoadError::InvalidHeader(format!(
                    "type section has {} entries for {vertex_count} vertices",
                    types.len()
                )));
            }
            if let Some(v) = types.iter().position(|&t| t == 0) {
                return Err(LoadError::InvalidHeader(format!(
                    "vertex {v} has type 0; typed graphs use labels >= 1"
                )));
            }
        }
        let type_count = if typed {
            types.iter().copied().max().unwrap_or(0) as usize
        } else {
            1
        };

        let reverse = build_reverse_index(&offsets, &edges)?;

        info!(
            vertices = vertex_count,
            edges = edge_count,
            weighted,
            typed,
            "graph loaded"
        );

        Ok(Self {
            offsets,
            edges,
            weights,
            types,
            reverse,
            type_count,
            weighted,
            typed,
        })
    }

    /// Build a symmetric graph from an undirected edge list.
    ///
    /// Both directions of every edge are inserted; duplicate pairs collapse
    /// to one edge. Mainly a convenience for tests and benchmarks; real
    /// graphs arrive through [`decode_graph`](crate::storage::decode_graph).
    ///
    /// # Errors
    ///
    /// Returns [`LoadError`] if any endpoint is `>= vertex_count` or the
    /// resulting CSR fails validation.
    pub fn from_undirected_edges(
        vertex_count: usize,
        undirected: &[(u32, u32, f32)],
        types: Option<Vec<u32>>,
    ) -> Result<Self, LoadError> {
        let mut adjacency: Vec<Vec<(u32, f32)>> = vec![Vec::new(); vertex_count];
        for &(u, v, w) in undirected {
            if (u as usize) >= vertex_count || (v as usize) >= vertex_count {
                return Err(LoadError::TargetOutOfRange {
                    edge: 0,
                    target: u.max(v) as i32,
                    vertex_count,
                });
            }
            adjacency[u as usize].push((v, w));
            adjacency[v as usize].push((u, w));
        }

        let mut offsets = Vec::with_capacity(vertex_count + 1);
        let mut edges = Vec::new();
        let mut weights = Vec::new();
        offsets.push(0);
        for neighbors in &mut adjacency {
            neighbors.sort_unstable_by_key(|&(dst, _)| dst);
            neighbors.dedup_by_key(|&mut (dst, _)| dst);
            for &(dst, w) in neighbors.iter() {
                edges.push(dst);
                weights.push(w);
            }
            offsets.push(edges.len());
        }

        Self::from_parts(offsets, edges, Some(weights), types)
    }

    /// Number of vertices
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.offsets.len().saturating_sub(1)
    }

    /// Number of directed edge records
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Out-degree of `v`
    ///
    /// # Panics
    ///
    /// Panics if `v` is out of range.
    #[must_use]
    pub fn degree(&self, v: u32) -> usize {
        self.offsets[v as usize + 1] - self.offsets[v as usize]
    }

    /// Edge-index range of `v`'s adjacency slice
    ///
    /// # Panics
    ///
    /// Panics if `v` is out of range.
    #[must_use]
    pub fn neighbor_range(&self, v: u32) -> Range<usize> {
        self.offsets[v as usize]..self.offsets[v as usize + 1]
    }

    /// Borrowed destination slice of `v` (strictly increasing)
    ///
    /// # Panics
    ///
    /// Panics if `v` is out of range.
    #[must_use]
    pub fn neighbors(&self, v: u32) -> &[u32] {
        &self.edges[self.neighbor_range(v)]
    }

    /// Destination vertex of edge record `e`
    ///
    /// # Panics
    ///
    /// Panics if `e` is out of range.
    #[must_use]
    pub fn edge_target(&self, e: usize) -> u32 {
        self.edges[e]
    }

    /// Weight of edge record `e` (1.0 when the graph is unweighted)
    ///
    /// # Panics
    ///
    /// Panics if `e` is out of range.
    #[must_use]
    pub fn weight(&self, e: usize) -> f32 {
        self.weights[e]
    }

    /// Type label of vertex `v` (0 when the graph is untyped)
    ///
    /// # Panics
    ///
    /// Panics if `v` is out of range.
    #[must_use]
    pub fn vertex_type(&self, v: u32) -> u32 {
        self.types[v as usize]
    }

    /// Largest vertex-type label (1 for untyped graphs)
    #[must_use]
    pub fn type_count(&self) -> usize {
        self.type_count
    }

    /// Whether the source file carried a weight section
    #[must_use]
    pub fn is_weighted(&self) -> bool {
        self.weighted
    }

    /// Whether the source file carried a type section
    #[must_use]
    pub fn is_typed(&self) -> bool {
        self.typed
    }

    /// Whether edge (u -> v) exists, via binary search over `u`'s sorted
    /// adjacency
    #[must_use]
    pub fn has_edge(&self, u: u32, v: u32) -> bool {
        self.find_edge(u, v).is_some()
    }

    /// Edge index of (u -> v), if present
    #[must_use]
    pub fn find_edge(&self, u: u32, v: u32) -> Option<usize> {
        let range = self.neighbor_range(u);
        let slice = &self.edges[range.clone()];
        slice.binary_search(&v).ok().map(|i| range.start + i)
    }

    /// Edge index of the back-edge matching edge record `e`
    ///
    /// # Panics
    ///
    /// Panics if `e` is out of range.
    #[must_use]
    pub fn reverse_edge(&self, e: usize) -> usize {
        self.reverse[e]
    }

    /// Arrival slot of edge `e` at its destination: the position of the
    /// back-edge within the destination's adjacency slice.
    ///
    /// # Panics
    ///
    /// Panics if `e` is out of range.
    #[must_use]
    pub fn arrival_slot(&self, e: usize) -> usize {
        let dst = self.edges[e] as usize;
        self.reverse[e] - self.offsets[dst]
    }

    /// Raw CSR sections `(offsets, edges, weights)` for encoders and tests
    #[must_use]
    pub fn csr_components(&self) -> (&[usize], &[u32], &[f32]) {
        (&self.offsets, &self.edges, &self.weights)
    }

    /// Vertex type section (all zero when untyped)
    #[must_use]
    pub fn type_components(&self) -> &[u32] {
        &self.types
    }
}

/// Check offset monotonicity and strictly-increasing adjacency slices.
fn validate_csr(offsets: &[usize], edges: &[u32]) -> Result<(), LoadError> {
    let vertex_count = offsets.len().saturating_sub(1);

    if offsets.last() != Some(&edges.len()) {
        return Err(LoadError::InvalidHeader(format!(
            "final offset {:?} does not match edge count {}",
            offsets.last(),
            edges.len()
        )));
    }

    #[allow(clippy::cast_possible_truncation)] // vertex ids are i32 in the file format
    for v in 0..vertex_count {
        if offsets[v + 1] < offsets[v] {
            return Err(LoadError::OffsetsNotMonotonic {
                vertex: v as u32,
                previous: offsets[v],
                current: offsets[v + 1],
            });
        }
        for e in offsets[v]..offsets[v + 1] {
            if edges[e] as usize >= vertex_count {
                return Err(LoadError::TargetOutOfRange {
                    edge: e,
                    target: edges[e] as i32,
                    vertex_count,
                });
            }
            if e > offsets[v] && edges[e] <= edges[e - 1] {
                return Err(LoadError::AdjacencyNotSorted {
                    vertex: v as u32,
                    edge: e,
                });
            }
        }
    }

    Ok(())
}

/// Binary search for (src -> dst) within `src`'s sorted slice.
fn find_edge_in(offsets: &[usize], edges: &[u32], src: u32, dst: u32) -> Option<usize> {
    let start = offsets[src as usize];
    let end = offsets[src as usize + 1];
    edges[start..end].binary_search(&dst).ok().map(|i| start + i)
}

/// Build the reverse-edge index for a symmetric CSR graph.
///
/// For each source vertex in parallel, each outgoing edge is resolved only by
/// the "heavier" endpoint (`degree(src) > degree(dst)`, ties broken by id),
/// which binary-searches the lighter side and writes both directions at once,
/// halving the work. A validation pass then re-checks every link and repairs
/// any mismatch via direct binary search; an edge with no back-edge at all
/// fails the load.
fn build_reverse_index(offsets: &[usize], edges: &[u32]) -> Result<Vec<usize>, LoadError> {
    let vertex_count = offsets.len().saturating_sub(1);
    let degree = |v: u32| offsets[v as usize + 1] - offsets[v as usize];

    let slots: Vec<AtomicUsize> = (0..edges.len()).map(|_| AtomicUsize::new(REV_UNSET)).collect();

    #[allow(clippy::cast_possible_truncation)]
    (0..vertex_count as u32).into_par_iter().for_each(|src| {
        for e in offsets[src as usize]..offsets[src as usize + 1] {
            let dst = edges[e];
            // Only the heavier side computes; it fills both directions.
            if degree(src) < degree(dst) || (degree(src) == degree(dst) && src < dst) {
                continue;
            }
            if let Some(pos) = find_edge_in(offsets, edges, dst, src) {
                slots[e].store(pos, Ordering::Relaxed);
                slots[pos].store(e, Ordering::Relaxed);
            }
        }
    });

    let mut reverse: Vec<usize> = slots.into_iter().map(AtomicUsize::into_inner).collect();

    // Every reverse link must land inside the destination's slice and point
    // back at the origin. Anything else is repaired here, never left wrong.
    #[allow(clippy::cast_possible_truncation)]
    let mismatches: Vec<(usize, u32, u32)> = (0..vertex_count as u32)
        .into_par_iter()
        .flat_map_iter(|src| {
            let reverse = &reverse;
            (offsets[src as usize]..offsets[src as usize + 1]).filter_map(move |e| {
                let dst = edges[e];
                let rev = reverse[e];
                let in_slice = rev >= offsets[dst as usize] && rev < offsets[dst as usize + 1];
                if in_slice && edges[rev] == src {
                    None
                } else {
                    Some((e, src, dst))
                }
            })
        })
        .collect();

    for (e, src, dst) in mismatches {
        let Some(pos) = find_edge_in(offsets, edges, dst, src) else {
            return Err(LoadError::MissingReverseEdge { src, dst });
        };
        warn!(edge = e, src, dst, repaired_to = pos, "reverse index mismatch repaired");
        reverse[e] = pos;
    }

    Ok(reverse)
}
