//! Undirected weighted graph over a dense node-id range
//!
//! Adjacency-map representation: each node owns a sorted map from neighbor id
//! to edge state. An undirected edge is stored in both endpoint maps with a
//! shared weight and an *independent* per-direction transition probability —
//! the transition model is directional even though the graph is not.
//!
//! Node ids are contiguous in `[0, N)` and validated at every mutating entry
//! point; the graph never grows implicitly. Self-loops are rejected except for
//! the synthetic restart self-loop created internally by the transition
//! builder.

use crate::error::AffinityError;
use std::collections::BTreeMap;

/// Node identifier (zero-indexed)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

/// Per-direction edge state
///
/// `weight` is mirrored across both directions of an undirected edge;
/// `transition` belongs to one direction only and exists solely while a
/// transition scope is alive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct EdgeState {
    pub(crate) weight: f64,
    pub(crate) transition: Option<f64>,
}

/// Undirected weighted graph with dense integer node ids
///
/// # Example
///
/// ```
/// use affinity_graph::{NodeId, WeightedGraph};
///
/// let mut graph = WeightedGraph::with_nodes(3);
/// graph.add_edge(NodeId(0), NodeId(1), 0.8).unwrap();
/// graph.add_edge(NodeId(1), NodeId(2), 1.0).unwrap();
///
/// assert_eq!(graph.num_nodes(), 3);
/// assert_eq!(graph.num_edges(), 2);
/// assert_eq!(graph.weight(NodeId(0), NodeId(1)), Some(0.8));
/// ```
#[derive(Debug, Clone, Default)]
pub struct WeightedGraph {
    /// `adj[u]` maps neighbor id -> edge state for the direction `u -> v`
    adj: Vec<BTreeMap<u32, EdgeState>>,
}

impl WeightedGraph {
    /// Create an empty graph with no nodes
    #[must_use]
    pub fn new() -> Self {
        Self { adj: Vec::new() }
    }

    /// Create a graph with `n` nodes and no edges
    #[must_use]
    pub fn with_nodes(n: usize) -> Self {
        Self {
            adj: vec![BTreeMap::new(); n],
        }
    }

    /// Build a graph from an undirected edge list
    ///
    /// The node count is `max id + 1`. Duplicate edges overwrite the weight
    /// rather than accumulating it.
    ///
    /// # Errors
    ///
    /// Returns [`AffinityError::SelfLoop`] if the list contains a self-loop.
    pub fn from_edge_list(edges: &[(NodeId, NodeId, f64)]) -> Result<Self, AffinityError> {
        let Some(max_node) = edges
            .iter()
            .flat_map(|(src, dst, _)| [src.0, dst.0])
            .max()
        else {
            return Ok(Self::new());
        };

        let mut graph = Self::with_nodes(max_node as usize + 1);
        for &(src, dst, weight) in edges {
            graph.add_edge(src, dst, weight)?;
        }
        Ok(graph)
    }

    /// Number of nodes
    #[must_use]
    pub fn num_nodes(&self) -> usize {
        self.adj.len()
    }

    /// Number of undirected edges
    #[must_use]
    pub fn num_edges(&self) -> usize {
        self.adj
            .iter()
            .enumerate()
            .map(|(u, nbrs)| nbrs.keys().filter(|&&v| v as usize >= u).count())
            .sum()
    }

    /// True if the graph has no nodes
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.adj.is_empty()
    }

    /// Insert or overwrite the undirected edge `(u, v)`
    ///
    /// Overwriting resets any transition attribute carried by the edge.
    ///
    /// # Errors
    ///
    /// Returns [`AffinityError::NodeOutOfBounds`] for ids outside `[0, N)` and
    /// [`AffinityError::SelfLoop`] for `u == v`.
    pub fn add_edge(&mut self, u: NodeId, v: NodeId, weight: f64) -> Result<(), AffinityError> {
        self.check_bounds(u.0)?;
        self.check_bounds(v.0)?;
        if u == v {
            return Err(AffinityError::SelfLoop(u.0));
        }

        let state = EdgeState {
            weight,
            transition: None,
        };
        self.adj[u.0 as usize].insert(v.0, state);
        self.adj[v.0 as usize].insert(u.0, state);
        Ok(())
    }

    /// Remove the undirected edge `(u, v)`, returning whether it was present
    ///
    /// Out-of-range ids are treated as "not present" rather than an error so
    /// that teardown paths never fail.
    pub fn remove_edge(&mut self, u: NodeId, v: NodeId) -> bool {
        if u.0 as usize >= self.adj.len() || v.0 as usize >= self.adj.len() {
            return false;
        }
        let forward = self.adj[u.0 as usize].remove(&v.0).is_some();
        if u != v {
            self.adj[v.0 as usize].remove(&u.0);
        }
        forward
    }

    /// True if the undirected edge `(u, v)` exists
    #[must_use]
    pub fn has_edge(&self, u: NodeId, v: NodeId) -> bool {
        self.adj
            .get(u.0 as usize)
            .is_some_and(|nbrs| nbrs.contains_key(&v.0))
    }

    /// Weight of the edge `(u, v)`, if present
    #[must_use]
    pub fn weight(&self, u: NodeId, v: NodeId) -> Option<f64> {
        self.adj
            .get(u.0 as usize)
            .and_then(|nbrs| nbrs.get(&v.0))
            .map(|e| e.weight)
    }

    /// Transition probability assigned to the direction `u -> v`, if any
    ///
    /// Only meaningful while a transition scope is alive; `None` otherwise.
    #[must_use]
    pub fn transition(&self, u: NodeId, v: NodeId) -> Option<f64> {
        self.adj
            .get(u.0 as usize)
            .and_then(|nbrs| nbrs.get(&v.0))
            .and_then(|e| e.transition)
    }

    /// Neighbors of `u` with edge weights, in ascending id order
    ///
    /// # Errors
    ///
    /// Returns [`AffinityError::NodeOutOfBounds`] for ids outside `[0, N)`.
    pub fn neighbors(
        &self,
        u: NodeId,
    ) -> Result<impl Iterator<Item = (NodeId, f64)> + '_, AffinityError> {
        self.check_bounds(u.0)?;
        Ok(self.adj[u.0 as usize]
            .iter()
            .map(|(&v, e)| (NodeId(v), e.weight)))
    }

    /// Degree of `u`
    ///
    /// # Errors
    ///
    /// Returns [`AffinityError::NodeOutOfBounds`] for ids outside `[0, N)`.
    pub fn degree(&self, u: NodeId) -> Result<usize, AffinityError> {
        self.check_bounds(u.0)?;
        Ok(self.adj[u.0 as usize].len())
    }

    /// Canonical snapshot of the undirected edge set as `(min, max, weight)`
    /// triples in ascending order
    ///
    /// Transition attributes are deliberately excluded: this is the
    /// restoration-invariant view of the graph.
    #[must_use]
    pub fn edges(&self) -> Vec<(NodeId, NodeId, f64)> {
        let mut out = Vec::new();
        for (u, nbrs) in self.adj.iter().enumerate() {
            for (&v, e) in nbrs {
                if v as usize >= u {
                    #[allow(clippy::cast_possible_truncation)] // ids fit u32 by construction
                    out.push((NodeId(u as u32), NodeId(v), e.weight));
                }
            }
        }
        out
    }

    /// Sum of outgoing edge weights of `u` (the normalizer `S` of the
    /// transition builder)
    pub(crate) fn total_out_weight(&self, u: u32) -> f64 {
        self.adj[u as usize].values().map(|e| e.weight).sum()
    }

    /// Snapshot of `u`'s neighbor ids and weights
    pub(crate) fn neighbor_weights(&self, u: u32) -> Vec<(u32, f64)> {
        self.adj[u as usize]
            .iter()
            .map(|(&v, e)| (v, e.weight))
            .collect()
    }

    /// Outgoing directions of `u` that carry a transition probability
    pub(crate) fn out_transitions(&self, u: u32) -> impl Iterator<Item = (u32, f64)> + '_ {
        self.adj[u as usize]
            .iter()
            .filter_map(|(&v, e)| e.transition.map(|t| (v, t)))
    }

    /// Set the transition probability of the direction `u -> v`
    ///
    /// The edge must exist.
    pub(crate) fn set_transition(&mut self, u: u32, v: u32, p: f64) {
        if let Some(e) = self.adj[u as usize].get_mut(&v) {
            e.transition = Some(p);
        }
    }

    /// Add `delta` to the transition probability of the direction `u -> v`
    /// (missing transition counts as zero)
    pub(crate) fn add_transition(&mut self, u: u32, v: u32, delta: f64) {
        if let Some(e) = self.adj[u as usize].get_mut(&v) {
            e.transition = Some(e.transition.unwrap_or(0.0) + delta);
        }
    }

    /// Insert a zero-weight restart edge, bypassing the self-loop check
    ///
    /// Used only by the transition builder; the scope that created the edge is
    /// responsible for removing it.
    pub(crate) fn insert_restart_edge(&mut self, u: u32, v: u32) {
        let state = EdgeState {
            weight: 0.0,
            transition: None,
        };
        self.adj[u as usize].insert(v, state);
        if u != v {
            self.adj[v as usize].insert(u, state);
        }
    }

    /// Drop every transition attribute in the graph
    pub(crate) fn clear_transitions(&mut self) {
        for nbrs in &mut self.adj {
            for e in nbrs.values_mut() {
                e.transition = None;
            }
        }
    }

    fn check_bounds(&self, node: u32) -> Result<(), AffinityError> {
        if (node as usize) < self.adj.len() {
            Ok(())
        } else {
            Err(AffinityError::NodeOutOfBounds {
                node,
                num_nodes: self.adj.len(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_graph() {
        let graph = WeightedGraph::new();
        assert_eq!(graph.num_nodes(), 0);
        assert_eq!(graph.num_edges(), 0);
        assert!(graph.is_empty());
    }

    #[test]
    fn test_from_edge_list_simple() {
        let edges = vec![
            (NodeId(0), NodeId(1), 1.0),
            (NodeId(0), NodeId(2), 2.0),
            (NodeId(1), NodeId(2), 3.0),
        ];

        let graph = WeightedGraph::from_edge_list(&edges).unwrap();

        assert_eq!(graph.num_nodes(), 3);
        assert_eq!(graph.num_edges(), 3);
        assert_eq!(graph.weight(NodeId(0), NodeId(2)), Some(2.0));
        // Undirected: both directions resolve
        assert_eq!(graph.weight(NodeId(2), NodeId(0)), Some(2.0));
    }

    #[test]
    fn test_duplicate_edge_overwrites() {
        let edges = vec![(NodeId(0), NodeId(1), 1.0), (NodeId(1), NodeId(0), 4.0)];
        let graph = WeightedGraph::from_edge_list(&edges).unwrap();

        assert_eq!(graph.num_edges(), 1);
        assert_eq!(graph.weight(NodeId(0), NodeId(1)), Some(4.0));
    }

    #[test]
    fn test_self_loop_rejected() {
        let mut graph = WeightedGraph::with_nodes(2);
        assert_eq!(
            graph.add_edge(NodeId(1), NodeId(1), 1.0),
            Err(AffinityError::SelfLoop(1))
        );
    }

    #[test]
    fn test_out_of_bounds_rejected() {
        let mut graph = WeightedGraph::with_nodes(2);
        let err = graph.add_edge(NodeId(0), NodeId(5), 1.0).unwrap_err();
        assert_eq!(
            err,
            AffinityError::NodeOutOfBounds {
                node: 5,
                num_nodes: 2
            }
        );
    }

    #[test]
    fn test_remove_edge() {
        let mut graph = WeightedGraph::with_nodes(3);
        graph.add_edge(NodeId(0), NodeId(1), 1.0).unwrap();

        assert!(graph.remove_edge(NodeId(1), NodeId(0)));
        assert!(!graph.has_edge(NodeId(0), NodeId(1)));
        assert!(!graph.remove_edge(NodeId(0), NodeId(1)));
    }

    #[test]
    fn test_edges_canonical_order() {
        let mut graph = WeightedGraph::with_nodes(3);
        graph.add_edge(NodeId(2), NodeId(1), 0.5).unwrap();
        graph.add_edge(NodeId(1), NodeId(0), 0.25).unwrap();

        assert_eq!(
            graph.edges(),
            vec![
                (NodeId(0), NodeId(1), 0.25),
                (NodeId(1), NodeId(2), 0.5),
            ]
        );
    }

    #[test]
    fn test_transitions_are_directional() {
        let mut graph = WeightedGraph::with_nodes(2);
        graph.add_edge(NodeId(0), NodeId(1), 1.0).unwrap();

        graph.set_transition(0, 1, 0.7);
        assert_eq!(graph.transition(NodeId(0), NodeId(1)), Some(0.7));
        assert_eq!(graph.transition(NodeId(1), NodeId(0)), None);

        graph.add_transition(0, 1, 0.15);
        assert_eq!(graph.transition(NodeId(0), NodeId(1)), Some(0.85));

        graph.clear_transitions();
        assert_eq!(graph.transition(NodeId(0), NodeId(1)), None);
    }

    #[test]
    fn test_restart_self_loop_internal() {
        let mut graph = WeightedGraph::with_nodes(2);
        graph.insert_restart_edge(0, 0);

        assert!(graph.has_edge(NodeId(0), NodeId(0)));
        assert_eq!(graph.weight(NodeId(0), NodeId(0)), Some(0.0));
        // A self-loop counts once
        assert_eq!(graph.num_edges(), 1);

        assert!(graph.remove_edge(NodeId(0), NodeId(0)));
        assert_eq!(graph.num_edges(), 0);
    }

    #[test]
    fn test_negative_weights_are_valid() {
        let mut graph = WeightedGraph::with_nodes(2);
        graph.add_edge(NodeId(0), NodeId(1), -2.5).unwrap();
        assert_eq!(graph.weight(NodeId(0), NodeId(1)), Some(-2.5));
        assert_eq!(graph.total_out_weight(0), -2.5);
    }
}
