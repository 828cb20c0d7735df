//! Graph and matrix storage layer
//!
//! Provides the adjacency-map weighted graph, the sparse similarity matrix,
//! and the text edge-list codec shared by every component.

pub mod edgelist;
pub mod graph;
pub mod similarity;

pub use graph::{NodeId, WeightedGraph};
pub use similarity::SimilarityMatrix;
