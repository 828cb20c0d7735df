//! Structural diffusion of a content-similarity matrix
//!
//! Propagates content-derived similarity one structural hop: with `T` the
//! row-normalized transition matrix of the interaction graph and `C` the
//! symmetric content matrix, the smoothed matrix is
//!
//! ```text
//! M = 0.5 * (C·T + Tᵀ·C)
//! ```
//!
//! i.e. each node's content similarity blended with its neighbors' weighted
//! average, averaged over both propagation directions so symmetry is
//! preserved. The result is rescaled linearly so its maximum matches the
//! input's (or exactly 1.0 in the normalized variant), keeping repeated
//! applications in a comparable numeric range.
//!
//! Everything stays sparse: the product is accumulated row-by-row over stored
//! entries only, and no transition matrix is ever materialized outside the
//! graph's own edges.

use crate::algorithms::transitions::TransitionScope;
use crate::error::AffinityError;
use crate::storage::graph::{NodeId, WeightedGraph};
use crate::storage::similarity::SimilarityMatrix;
use std::collections::BTreeMap;

/// Rescale target for the smoothed matrix
enum Rescale {
    /// Match the maximum of the input content matrix
    ContentMax,
    /// Normalize the maximum to exactly 1.0
    Unit,
}

/// Smooth `content` one hop along `structure`, rescaled back to the content
/// matrix's maximum
///
/// The structure graph is borrowed mutably because the transition model lives
/// on its edges while the product is computed; it is restored (no transition
/// attributes, no added edges) before the function returns.
///
/// # Errors
///
/// Returns [`AffinityError::DegenerateInput`] if the structure graph is empty
/// or the content matrix has no non-zero entries, and
/// [`AffinityError::DimensionMismatch`] if their dimensions disagree. All are
/// raised before the graph is touched.
///
/// # Example
///
/// ```
/// use affinity_graph::{diffuse, NodeId, SimilarityMatrix, WeightedGraph};
///
/// let mut ring = WeightedGraph::from_edge_list(&[
///     (NodeId(0), NodeId(1), 1.0),
///     (NodeId(1), NodeId(2), 1.0),
///     (NodeId(2), NodeId(3), 1.0),
///     (NodeId(3), NodeId(0), 1.0),
/// ]).unwrap();
///
/// let mut content = SimilarityMatrix::new(4);
/// content.set_symmetric(NodeId(0), NodeId(1), 0.8).unwrap();
///
/// let smoothed = diffuse(&mut ring, &content).unwrap();
/// assert_eq!(smoothed.max_value(), Some(0.8));
/// ```
pub fn diffuse(
    structure: &mut WeightedGraph,
    content: &SimilarityMatrix,
) -> Result<SimilarityMatrix, AffinityError> {
    diffuse_with(structure, content, Rescale::ContentMax)
}

/// Smooth `content` one hop along `structure`, rescaled to a maximum of 1.0
///
/// Same operator as [`diffuse`]; only the rescale target differs.
///
/// # Errors
///
/// As [`diffuse`].
pub fn diffuse_normalized(
    structure: &mut WeightedGraph,
    content: &SimilarityMatrix,
) -> Result<SimilarityMatrix, AffinityError> {
    diffuse_with(structure, content, Rescale::Unit)
}

fn diffuse_with(
    structure: &mut WeightedGraph,
    content: &SimilarityMatrix,
    rescale: Rescale,
) -> Result<SimilarityMatrix, AffinityError> {
    let n = structure.num_nodes();
    if n == 0 {
        return Err(AffinityError::DegenerateInput(
            "structure graph is empty".into(),
        ));
    }
    if content.dim() != n {
        return Err(AffinityError::DimensionMismatch {
            matrix: content.dim(),
            graph: n,
        });
    }
    let Some(content_max) = content.max_value() else {
        return Err(AffinityError::DegenerateInput(
            "content matrix has no non-zero entries".into(),
        ));
    };

    // One-hop product A = C·T over stored entries only.
    let mut product: Vec<BTreeMap<u32, f64>> = vec![BTreeMap::new(); n];
    {
        let scope = TransitionScope::structural(structure);
        let graph = scope.graph();
        for (i, row) in product.iter_mut().enumerate() {
            for (u, c) in content.row(i) {
                for (j, t) in graph.out_transitions(u) {
                    *row.entry(j).or_insert(0.0) += c * t;
                }
            }
        }
    }
    // Scope dropped: the structure graph is back to weights-only.

    // Symmetrize: M = 0.5·(A + Aᵀ), materialized in both orientations.
    let mut smoothed = SimilarityMatrix::new(n);
    #[allow(clippy::cast_possible_truncation)] // ids fit u32 by construction
    for (i, row) in product.iter().enumerate() {
        let i = NodeId(i as u32);
        for (&j, &a) in row {
            let j = NodeId(j);
            let half = 0.5 * a;
            smoothed.set(i, j, smoothed.get(i, j) + half)?;
            smoothed.set(j, i, smoothed.get(j, i) + half)?;
        }
    }

    match smoothed.max_value() {
        Some(max) if max != 0.0 => {
            let target = match rescale {
                Rescale::ContentMax => content_max,
                Rescale::Unit => 1.0,
            };
            smoothed.scale(target / max);
        }
        // Content orthogonal to structure: nothing to scale.
        _ => {}
    }

    Ok(smoothed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ring() -> WeightedGraph {
        WeightedGraph::from_edge_list(&[
            (NodeId(0), NodeId(1), 1.0),
            (NodeId(1), NodeId(2), 1.0),
            (NodeId(2), NodeId(3), 1.0),
            (NodeId(3), NodeId(0), 1.0),
        ])
        .unwrap()
    }

    #[test]
    fn test_single_entry_on_ring() {
        let mut graph = ring();
        let mut content = SimilarityMatrix::new(4);
        content.set_symmetric(NodeId(0), NodeId(1), 0.8).unwrap();

        let smoothed = diffuse(&mut graph, &content).unwrap();

        // The (0,1) signal moves one hop: onto the diagonal and onto the
        // pairs joining each endpoint to the other's second neighbor.
        assert!((smoothed.get(NodeId(0), NodeId(0)) - 0.8).abs() < 1e-12);
        assert!((smoothed.get(NodeId(1), NodeId(1)) - 0.8).abs() < 1e-12);
        assert!((smoothed.get(NodeId(0), NodeId(2)) - 0.4).abs() < 1e-12);
        assert!((smoothed.get(NodeId(1), NodeId(3)) - 0.4).abs() < 1e-12);
        assert_eq!(smoothed.num_entries(), 6);

        // Rescaled back to the content maximum
        assert_eq!(smoothed.max_value(), Some(0.8));
    }

    #[test]
    fn test_output_is_symmetric() {
        let mut graph = ring();
        let mut content = SimilarityMatrix::new(4);
        content.set_symmetric(NodeId(0), NodeId(1), 0.8).unwrap();
        content.set_symmetric(NodeId(1), NodeId(2), 0.3).unwrap();

        let smoothed = diffuse(&mut graph, &content).unwrap();
        for (i, j, v) in smoothed.entries() {
            assert!(
                (smoothed.get(j, i) - v).abs() < 1e-12,
                "asymmetric at ({},{})",
                i.0,
                j.0
            );
        }
    }

    #[test]
    fn test_normalized_variant_peaks_at_one() {
        let mut graph = ring();
        let mut content = SimilarityMatrix::new(4);
        content.set_symmetric(NodeId(0), NodeId(1), 0.8).unwrap();

        let smoothed = diffuse_normalized(&mut graph, &content).unwrap();
        let max = smoothed.max_value().unwrap();
        assert!((max - 1.0).abs() < 1e-12, "max = {max}");
    }

    #[test]
    fn test_structure_graph_restored() {
        let mut graph = ring();
        let before = graph.edges();
        let mut content = SimilarityMatrix::new(4);
        content.set_symmetric(NodeId(0), NodeId(1), 0.8).unwrap();

        let _ = diffuse(&mut graph, &content).unwrap();

        assert_eq!(graph.edges(), before);
        for (u, v, _) in graph.edges() {
            assert_eq!(graph.transition(u, v), None);
            assert_eq!(graph.transition(v, u), None);
        }
    }

    #[test]
    fn test_degenerate_inputs_rejected() {
        let mut empty = WeightedGraph::new();
        let content = SimilarityMatrix::new(0);
        assert!(matches!(
            diffuse(&mut empty, &content).unwrap_err(),
            AffinityError::DegenerateInput(_)
        ));

        let mut graph = ring();
        let all_zero = SimilarityMatrix::new(4);
        assert!(matches!(
            diffuse(&mut graph, &all_zero).unwrap_err(),
            AffinityError::DegenerateInput(_)
        ));

        let wrong_dim = {
            let mut m = SimilarityMatrix::new(3);
            m.set(NodeId(0), NodeId(1), 1.0).unwrap();
            m
        };
        assert_eq!(
            diffuse(&mut graph, &wrong_dim).unwrap_err(),
            AffinityError::DimensionMismatch { matrix: 3, graph: 4 }
        );
    }

    #[test]
    fn test_isolated_content_yields_empty_matrix() {
        // Content similarity on a pair with no structural edges at all:
        // the zero transition rows absorb the signal entirely.
        let mut graph = WeightedGraph::with_nodes(4);
        graph.add_edge(NodeId(2), NodeId(3), 1.0).unwrap();
        let mut content = SimilarityMatrix::new(4);
        content.set_symmetric(NodeId(0), NodeId(1), 0.9).unwrap();

        let smoothed = diffuse(&mut graph, &content).unwrap();
        assert_eq!(smoothed.num_entries(), 0);
        assert_eq!(smoothed.max_value(), None);
    }
}
