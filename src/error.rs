//! Error taxonomy for graph loading and run configuration.
//!
//! Load and config failures are fatal and surface before any sampling starts;
//! per-walker dead ends are recoverable and travel as [`DeadEnd`] values, not
//! errors.

use thiserror::Error;

/// Errors produced while decoding a binary graph file.
///
/// All variants are fatal: a graph that fails to load leaves no partial state
/// behind.
#[derive(Debug, Error)]
pub enum LoadError {
    /// File ended before the declared section was fully read
    #[error("truncated graph file: expected {expected} bytes for {section}, got {actual}")]
    Truncated {
        /// Section being decoded when the input ran out
        section: &'static str,
        /// Bytes required by the declared counts
        expected: usize,
        /// Bytes actually available
        actual: usize,
    },

    /// Negative or nonsensical count in the header
    #[error("invalid graph header: {0}")]
    InvalidHeader(String),

    /// Offset array is not non-decreasing or exceeds the edge count
    #[error("offsets not monotonic at vertex {vertex}: {previous} -> {current}")]
    OffsetsNotMonotonic {
        /// Vertex whose offset breaks monotonicity
        vertex: u32,
        /// Offset of the preceding vertex
        previous: usize,
        /// Offending offset
        current: usize,
    },

    /// Adjacency slice of a vertex is unsorted or contains duplicates
    #[error("adjacency of vertex {vertex} not strictly increasing at edge {edge}")]
    AdjacencyNotSorted {
        /// Vertex whose slice is malformed
        vertex: u32,
        /// Index of the offending edge record
        edge: usize,
    },

    /// Edge target outside `0..vertex_count`
    #[error("edge {edge} targets vertex {target} out of range (vertex count {vertex_count})")]
    TargetOutOfRange {
        /// Index of the offending edge record
        edge: usize,
        /// Out-of-range destination id
        target: i32,
        /// Number of vertices in the graph
        vertex_count: usize,
    },

    /// Symmetry invariant violated: an edge has no matching back-edge
    #[error("edge {src} -> {dst} has no reverse edge; graph is not symmetric")]
    MissingReverseEdge {
        /// Source vertex of the unpaired edge
        src: u32,
        /// Destination vertex of the unpaired edge
        dst: u32,
    },

    /// Underlying file I/O failure
    #[error("graph file I/O failed")]
    Io(#[from] std::io::Error),
}

/// Errors produced while validating a run configuration against a graph.
///
/// Checked before any generation pass starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A numeric parameter is outside its valid range
    #[error("parameter {name} out of range: {reason}")]
    ParameterOutOfRange {
        /// Parameter name as exposed in the configuration
        name: &'static str,
        /// Why the value is rejected
        reason: String,
    },

    /// Metapath string failed validation
    #[error("malformed metapath {path:?}: {reason}")]
    MalformedMetapath {
        /// The offending metapath string
        path: String,
        /// Why it is rejected
        reason: String,
    },

    /// The selected model needs vertex types the graph does not carry
    #[error("model {model} requires a typed graph")]
    TypedGraphRequired {
        /// Name of the selected walk model
        model: &'static str,
    },
}

/// Recoverable per-walker failure: no positive-weight transition exists from
/// a (vertex, slot) state under the active model.
///
/// The walker owning the state yields a truncated (possibly empty) sequence;
/// the orchestrator absorbs the signal without interrupting other walkers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeadEnd {
    /// Vertex with no viable outgoing transition
    pub vertex: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_error_display() {
        let err = LoadError::Truncated {
            section: "offsets",
            expected: 80,
            actual: 16,
        };
        assert_eq!(
            err.to_string(),
            "truncated graph file: expected 80 bytes for offsets, got 16"
        );

        let err = LoadError::MissingReverseEdge { src: 3, dst: 7 };
        assert_eq!(
            err.to_string(),
            "edge 3 -> 7 has no reverse edge; graph is not symmetric"
        );
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::TypedGraphRequired { model: "metapath" };
        assert_eq!(err.to_string(), "model metapath requires a typed graph");
    }
}
