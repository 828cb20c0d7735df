//! Error taxonomy for the diffusion and random-walk engine
//!
//! Every precondition failure is raised before any graph mutation, so callers
//! never observe a partially transformed graph. Non-convergence is not an
//! error: the iteration budget is a valid stopping rule and the solver reports
//! it through [`WalkOutcome::converged`](crate::WalkOutcome).

use thiserror::Error;

/// Engine errors
#[derive(Debug, Error, PartialEq)]
pub enum AffinityError {
    /// Damping factor outside `[0, 1]`
    #[error("damping factor {0} outside [0, 1]")]
    InvalidDamping(f64),

    /// Seed node absent from the graph
    #[error("seed node {seed} not in graph with {num_nodes} nodes")]
    UnknownSeed {
        /// Requested seed node id
        seed: u32,
        /// Number of nodes in the graph
        num_nodes: usize,
    },

    /// Input carries no usable signal (empty graph, all-zero matrix, zero budget)
    #[error("degenerate input: {0}")]
    DegenerateInput(String),

    /// Node id outside the graph's dense `[0, N)` id range
    #[error("node id {node} out of bounds for graph with {num_nodes} nodes")]
    NodeOutOfBounds {
        /// Offending node id
        node: u32,
        /// Number of nodes in the graph
        num_nodes: usize,
    },

    /// Similarity matrix dimension does not match the structure graph
    #[error("matrix dimension {matrix} does not match graph with {graph} nodes")]
    DimensionMismatch {
        /// Matrix dimension
        matrix: usize,
        /// Graph node count
        graph: usize,
    },

    /// Self-loops are rejected at the public boundary; only the synthetic
    /// restart self-loop (crate-internal) may exist
    #[error("self-loop on node {0} not allowed")]
    SelfLoop(u32),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AffinityError::InvalidDamping(1.5);
        assert_eq!(err.to_string(), "damping factor 1.5 outside [0, 1]");

        let err = AffinityError::UnknownSeed {
            seed: 7,
            num_nodes: 4,
        };
        assert_eq!(err.to_string(), "seed node 7 not in graph with 4 nodes");
    }

    #[test]
    fn test_converts_into_anyhow() {
        let err: anyhow::Error = AffinityError::SelfLoop(3).into();
        assert!(err.downcast_ref::<AffinityError>().is_some());
    }
}
