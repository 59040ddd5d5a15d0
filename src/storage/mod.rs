//! Graph storage layer
//!
//! Provides the CSR (Compressed Sparse Row) graph store and the binary
//! graph-file codec.

pub mod binary;
pub mod csr;

pub use binary::{decode_graph, encode_graph, GraphOptions};
pub use csr::CsrGraph;
