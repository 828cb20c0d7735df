//! affinity-graph: similarity diffusion and personalized random walks
//!
//! # Overview
//!
//! affinity-graph scores node affinity in weighted interaction graphs by
//! combining a content-derived similarity signal with a structure-derived
//! diffusion signal, and by estimating personalized random-walk affinity from
//! seed nodes. Outputs are themselves weighted graphs (or per-seed affinity
//! vectors) for downstream clustering and plotting tools.
//!
//! # Quick Start
//!
//! ```no_run
//! use affinity_graph::{
//!     diffuse, personalized_walk, storage::edgelist, NodeId, WalkConfig,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! // Load the interaction graph and its content-similarity scores
//! let mut graph = edgelist::read_graph("interactions.txt").await?;
//! let content = edgelist::read_similarity("content.txt", graph.num_nodes()).await?;
//!
//! // Smooth content similarity one structural hop
//! let smoothed = diffuse(&mut graph, &content)?;
//! edgelist::write_matrix(&smoothed, "structure.txt").await?;
//!
//! // Affinity of every node to seed 42
//! let outcome = personalized_walk(&mut graph, NodeId(42), &WalkConfig::default())?;
//! edgelist::write_affinity(&outcome.affinity, Some(NodeId(42)), "affinity_42.txt").await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! - **Storage**: adjacency-map weighted graph + sparse similarity matrix
//! - **Persistence**: flat `node node weight` text edge lists
//! - **Algorithms**: matrix-free transition models, diffusion, power iteration
//! - **Safety**: the random walk's temporary graph mutation is scope-guarded;
//!   the caller's graph is restored on every exit path

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod algorithms;
pub mod error;
pub mod storage;

// Re-export core types
pub use algorithms::{
    diffuse, diffuse_normalized, pagerank, personalized_walk, TransitionScope, WalkConfig,
    WalkOutcome,
};
pub use error::AffinityError;
pub use storage::{NodeId, SimilarityMatrix, WeightedGraph};

// Error type for fallible I/O boundaries
pub use anyhow::{Error, Result};
