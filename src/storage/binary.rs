//! Binary graph format decode/encode
//!
//! The on-disk layout is produced by an offline converter and consumed here:
//!
//! ```text
//! i64 vertex_count
//! i64 edge_count
//! i64 offsets[vertex_count]        // implicit offsets[vertex_count] = edge_count
//! i32 edges[edge_count]
//! i32 types[vertex_count]          // only when GraphOptions::typed
//! f32 weights[edge_count]          // only when GraphOptions::weighted
//! ```
//!
//! All values little-endian. Whether the optional sections are present is not
//! self-describing; the caller states it via [`GraphOptions`].

use super::CsrGraph;
use crate::error::LoadError;
use anyhow::{Context, Result};
use std::path::Path;

/// Declares which optional sections the binary file carries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GraphOptions {
    /// File ends with an `f32 weights[edge_count]` section
    pub weighted: bool,
    /// File carries an `i32 types[vertex_count]` section
    pub typed: bool,
}

impl GraphOptions {
    /// Options for a plain unweighted, untyped graph
    #[must_use]
    pub fn plain() -> Self {
        Self::default()
    }

    /// Enable the weight section
    #[must_use]
    pub fn with_weights(mut self) -> Self {
        self.weighted = true;
        self
    }

    /// Enable the type section
    #[must_use]
    pub fn with_types(mut self) -> Self {
        self.typed = true;
        self
    }
}

/// Little-endian reader over the raw file bytes with per-section truncation
/// checks.
struct SectionReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> SectionReader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn take(&mut self, len: usize, section: &'static str) -> Result<&'a [u8], LoadError> {
        let available = self.bytes.len() - self.pos;
        if available < len {
            return Err(LoadError::Truncated {
                section,
                expected: len,
                actual: available,
            });
        }
        let slice = &self.bytes[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    fn read_i64(&mut self, section: &'static str) -> Result<i64, LoadError> {
        let raw = self.take(8, section)?;
        #[allow(clippy::unwrap_used)] // take() guarantees exactly 8 bytes
        Ok(i64::from_le_bytes(raw.try_into().unwrap()))
    }

    fn read_i64_section(&mut self, count: usize, section: &'static str) -> Result<Vec<i64>, LoadError> {
        let raw = self.take(count * 8, section)?;
        Ok(raw
            .chunks_exact(8)
            .map(|c| {
                #[allow(clippy::unwrap_used)]
                i64::from_le_bytes(c.try_into().unwrap())
            })
            .collect())
    }

    fn read_i32_section(&mut self, count: usize, section: &'static str) -> Result<Vec<i32>, LoadError> {
        let raw = self.take(count * 4, section)?;
        Ok(raw
            .chunks_exact(4)
            .map(|c| {
                #[allow(clippy::unwrap_used)]
                i32::from_le_bytes(c.try_into().unwrap())
            })
            .collect())
    }

    fn read_f32_section(&mut self, count: usize, section: &'static str) -> Result<Vec<f32>, LoadError> {
        let raw = self.take(count * 4, section)?;
        Ok(raw
            .chunks_exact(4)
            .map(|c| {
                #[allow(clippy::unwrap_used)]
                f32::from_le_bytes(c.try_into().unwrap())
            })
            .collect())
    }
}

/// Decode a binary graph image into a validated [`CsrGraph`].
///
/// # Errors
///
/// Returns [`LoadError`] on truncation, malformed counts, CSR invariant
/// violations, or an asymmetric graph. No partial state survives a failure.
pub fn decode_graph(bytes: &[u8], options: GraphOptions) -> Result<CsrGraph, LoadError> {
    let mut reader = SectionReader::new(bytes);

    let vertex_count = reader.read_i64("header")?;
    let edge_count = reader.read_i64("header")?;
    if vertex_count < 0 || edge_count < 0 {
        return Err(LoadError::InvalidHeader(format!(
            "negative counts: vertices {vertex_count}, edges {edge_count}"
        )));
    }
    #[allow(clippy::cast_sign_loss)] // negativity checked above
    let (vertex_count, edge_count) = (vertex_count as usize, edge_count as usize);

    let raw_offsets = reader.read_i64_section(vertex_count, "offsets")?;
    let mut offsets = Vec::with_capacity(vertex_count + 1);
    for (v, &raw) in raw_offsets.iter().enumerate() {
        if raw < 0 || raw as usize > edge_count {
            return Err(LoadError::InvalidHeader(format!(
                "offset {raw} of vertex {v} outside 0..={edge_count}"
            )));
        }
        #[allow(clippy::cast_sign_loss)]
        offsets.push(raw as usize);
    }
    // The final offset is implicit in the format.
    offsets.push(edge_count);

    let raw_edges = reader.read_i32_section(edge_count, "edges")?;
    let mut edges = Vec::with_capacity(edge_count);
    for (e, &raw) in raw_edges.iter().enumerate() {
        if raw < 0 || raw as usize >= vertex_count {
            return Err(LoadError::TargetOutOfRange {
                edge: e,
                target: raw,
                vertex_count,
            });
        }
        #[allow(clippy::cast_sign_loss)]
        edges.push(raw as u32);
    }

    let types = if options.typed {
        let raw_types = reader.read_i32_section(vertex_count, "types")?;
        let mut types = Vec::with_capacity(vertex_count);
        for (v, &raw) in raw_types.iter().enumerate() {
            if raw < 1 {
                return Err(LoadError::InvalidHeader(format!(
                    "vertex {v} has type {raw}; typed graphs use labels >= 1"
                )));
            }
            #[allow(clippy::cast_sign_loss)]
            types.push(raw as u32);
        }
        Some(types)
    } else {
        None
    };

    let weights = if options.weighted {
        Some(reader.read_f32_section(edge_count, "weights")?)
    } else {
        None
    };

    CsrGraph::from_parts(offsets, edges, weights, types)
}

/// Encode a graph back into the binary layout (the exact inverse of
/// [`decode_graph`] under the graph's own weighted/typed flags).
#[must_use]
pub fn encode_graph(graph: &CsrGraph) -> Vec<u8> {
    let (offsets, edges, weights) = graph.csr_components();
    let vertex_count = graph.vertex_count();

    let mut bytes = Vec::new();
    bytes.extend_from_slice(&(vertex_count as i64).to_le_bytes());
    bytes.extend_from_slice(&(graph.edge_count() as i64).to_le_bytes());
    for &offset in &offsets[..vertex_count] {
        bytes.extend_from_slice(&(offset as i64).to_le_bytes());
    }
    for &target in edges {
        bytes.extend_from_slice(&(target as i32).to_le_bytes());
    }
    if graph.is_typed() {
        for &ty in graph.type_components() {
            bytes.extend_from_slice(&(ty as i32).to_le_bytes());
        }
    }
    if graph.is_weighted() {
        for &w in weights {
            bytes.extend_from_slice(&w.to_le_bytes());
        }
    }
    bytes
}

impl CsrGraph {
    /// Read and decode a binary graph file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or fails
    /// [`decode_graph`] validation.
    pub async fn read_binary<P: AsRef<Path>>(path: P, options: GraphOptions) -> Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("reading graph file {}", path.display()))?;
        let graph = decode_graph(&bytes, options)
            .with_context(|| format!("decoding graph file {}", path.display()))?;
        Ok(graph)
    }

    /// Encode and write this graph in the binary layout.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub async fn write_binary<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        tokio::fs::write(path, encode_graph(self))
            .await
            .with_context(|| format!("writing graph file {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ring4_bytes(weighted: bool, typed: bool) -> Vec<u8> {
        // Ring 0-1-2-3-0, both directions, sorted slices.
        let offsets: [i64; 4] = [0, 2, 4, 6];
        let edges: [i32; 8] = [1, 3, 0, 2, 1, 3, 0, 2];

        let mut bytes = Vec::new();
        bytes.extend_from_slice(&4i64.to_le_bytes());
        bytes.extend_from_slice(&8i64.to_le_bytes());
        for o in offsets {
            bytes.extend_from_slice(&o.to_le_bytes());
        }
        for e in edges {
            bytes.extend_from_slice(&e.to_le_bytes());
        }
        if typed {
            for t in [1i32, 2, 1, 2] {
                bytes.extend_from_slice(&t.to_le_bytes());
            }
        }
        if weighted {
            for w in [1.0f32, 2.0, 1.0, 3.0, 3.0, 1.0, 2.0, 1.0] {
                bytes.extend_from_slice(&w.to_le_bytes());
            }
        }
        bytes
    }

    #[test]
    fn test_decode_plain() {
        let graph = decode_graph(&ring4_bytes(false, false), GraphOptions::plain()).unwrap();
        assert_eq!(graph.vertex_count(), 4);
        assert_eq!(graph.edge_count(), 8);
        assert_eq!(graph.neighbors(0), &[1, 3]);
        assert_eq!(graph.weight(0), 1.0); // defaulted
        assert_eq!(graph.vertex_type(0), 0);
    }

    #[test]
    fn test_decode_weighted_typed() {
        let options = GraphOptions::plain().with_weights().with_types();
        let graph = decode_graph(&ring4_bytes(true, true), options).unwrap();
        assert!(graph.is_weighted());
        assert!(graph.is_typed());
        assert_eq!(graph.weight(1), 2.0);
        assert_eq!(graph.vertex_type(3), 2);
        assert_eq!(graph.type_count(), 2);
    }

    #[test]
    fn test_truncated_header() {
        let err = decode_graph(&[0u8; 7], GraphOptions::plain());
        assert!(matches!(err, Err(LoadError::Truncated { section: "header", .. })));
    }

    #[test]
    fn test_truncated_edges() {
        let mut bytes = ring4_bytes(false, false);
        bytes.truncate(bytes.len() - 4);
        let err = decode_graph(&bytes, GraphOptions::plain());
        assert!(matches!(err, Err(LoadError::Truncated { section: "edges", .. })));
    }

    #[test]
    fn test_missing_weight_section() {
        // Declared weighted but no weight bytes present.
        let err = decode_graph(&ring4_bytes(false, false), GraphOptions::plain().with_weights());
        assert!(matches!(err, Err(LoadError::Truncated { section: "weights", .. })));
    }

    #[test]
    fn test_negative_counts_rejected() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&(-1i64).to_le_bytes());
        bytes.extend_from_slice(&0i64.to_le_bytes());
        let err = decode_graph(&bytes, GraphOptions::plain());
        assert!(matches!(err, Err(LoadError::InvalidHeader(_))));
    }

    #[test]
    fn test_zero_type_label_rejected() {
        let mut bytes = ring4_bytes(false, true);
        // Overwrite the first type label with 0.
        let type_offset = 16 + 4 * 8 + 8 * 4;
        bytes[type_offset..type_offset + 4].copy_from_slice(&0i32.to_le_bytes());
        let err = decode_graph(&bytes, GraphOptions::plain().with_types());
        assert!(matches!(err, Err(LoadError::InvalidHeader(_))));
    }

    #[test]
    fn test_encode_decode_roundtrip() {
        let options = GraphOptions::plain().with_weights().with_types();
        let graph = decode_graph(&ring4_bytes(true, true), options).unwrap();
        assert_eq!(encode_graph(&graph), ring4_bytes(true, true));
    }

    #[tokio::test]
    async fn test_read_write_binary() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ring.graph");

        let graph = decode_graph(&ring4_bytes(false, false), GraphOptions::plain()).unwrap();
        graph.write_binary(&path).await.unwrap();

        let loaded = CsrGraph::read_binary(&path, GraphOptions::plain()).await.unwrap();
        assert_eq!(loaded.vertex_count(), 4);
        assert_eq!(loaded.neighbors(2), graph.neighbors(2));
    }

    #[tokio::test]
    async fn test_read_binary_missing_file() {
        let err = CsrGraph::read_binary("/nonexistent/graph.bin", GraphOptions::plain()).await;
        assert!(err.is_err());
    }
}
