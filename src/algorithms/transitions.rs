//! Transition-probability builder
//!
//! Derives a per-node stochastic outgoing distribution from edge weights,
//! optionally injecting restart mass toward a designated node. The builder
//! mutates the graph in place (transition attributes, plus zero-weight restart
//! edges where none existed) and hands back a [`TransitionScope`] guard that
//! undoes exactly those mutations when dropped — on normal return, early exit,
//! or panic alike.
//!
//! Transition probabilities are directional: `u -> v` and `v -> u` are
//! normalized against different totals even though the underlying edge is
//! undirected.

use crate::error::AffinityError;
use crate::storage::graph::{NodeId, WeightedGraph};

/// Scoped transition model over a mutably borrowed graph
///
/// While the scope is alive, every outgoing direction of every node carries a
/// transition probability; in restart mode the per-node outgoing sum is 1.
/// Dropping the scope removes the restart edges it created and clears all
/// transition attributes, restoring the graph to its pre-scope structure.
///
/// # Example
///
/// ```
/// use affinity_graph::{NodeId, TransitionScope, WeightedGraph};
///
/// let mut graph = WeightedGraph::with_nodes(3);
/// graph.add_edge(NodeId(0), NodeId(1), 1.0).unwrap();
/// graph.add_edge(NodeId(1), NodeId(2), 3.0).unwrap();
///
/// {
///     let scope = TransitionScope::with_restart(&mut graph, 0.25, NodeId(0)).unwrap();
///     // node 1 splits (1 - 0.25) over weights 1.0 and 3.0, plus restart mass
///     let g = scope.graph();
///     assert_eq!(g.transition(NodeId(1), NodeId(0)), Some(0.75 * 0.25 + 0.25));
///     assert_eq!(g.transition(NodeId(1), NodeId(2)), Some(0.75 * 0.75));
/// }
///
/// // scope dropped: restart edges gone, transitions cleared
/// assert_eq!(graph.num_edges(), 2);
/// assert_eq!(graph.transition(NodeId(1), NodeId(0)), None);
/// ```
#[derive(Debug)]
pub struct TransitionScope<'g> {
    graph: &'g mut WeightedGraph,
    added: Vec<(NodeId, NodeId)>,
}

impl<'g> TransitionScope<'g> {
    /// Build a restart transition model: each node keeps `1 - damping` of its
    /// mass for weight-proportional neighbor moves and sends `damping` to
    /// `restart`
    ///
    /// For a node `n` with total outgoing weight `S != 0`, each neighbor
    /// direction gets `(1 - damping) * weight / S`; the restart direction then
    /// receives `damping` on top (over an existing edge, or over a newly
    /// created zero-weight edge). A node with `S == 0` transitions entirely to
    /// `restart` — including the synthetic self-loop when `n == restart`.
    ///
    /// # Errors
    ///
    /// Returns [`AffinityError::InvalidDamping`] for damping outside `[0, 1]`
    /// and [`AffinityError::UnknownSeed`] for a restart node outside the
    /// graph. Both are raised before any mutation.
    pub fn with_restart(
        graph: &'g mut WeightedGraph,
        damping: f64,
        restart: NodeId,
    ) -> Result<Self, AffinityError> {
        if !(0.0..=1.0).contains(&damping) {
            return Err(AffinityError::InvalidDamping(damping));
        }
        if restart.0 as usize >= graph.num_nodes() {
            return Err(AffinityError::UnknownSeed {
                seed: restart.0,
                num_nodes: graph.num_nodes(),
            });
        }

        let mut scope = Self {
            graph,
            added: Vec::new(),
        };
        scope.build_restart_rows(damping, restart);
        Ok(scope)
    }

    /// Build a pure structural model: plain row normalization, no restart
    ///
    /// Each direction `n -> v` gets `weight / S`; nodes with `S == 0` keep an
    /// empty (zero) row. No edges are added, so teardown only clears
    /// transition attributes.
    pub fn structural(graph: &'g mut WeightedGraph) -> Self {
        let n = graph.num_nodes();
        for u in 0..n {
            #[allow(clippy::cast_possible_truncation)] // ids fit u32 by construction
            let u = u as u32;
            let neighbors = graph.neighbor_weights(u);
            let total: f64 = neighbors.iter().map(|&(_, w)| w).sum();
            if total != 0.0 {
                for (v, w) in neighbors {
                    graph.set_transition(u, v, w / total);
                }
            }
        }
        Self {
            graph,
            added: Vec::new(),
        }
    }

    /// The graph carrying the transition model
    #[must_use]
    pub fn graph(&self) -> &WeightedGraph {
        self.graph
    }

    /// Edges this scope created (and will remove on drop)
    ///
    /// Pre-existing edges whose transition was merely incremented are not
    /// listed; their attribute is cleared on drop instead.
    #[must_use]
    pub fn added_edges(&self) -> &[(NodeId, NodeId)] {
        &self.added
    }

    fn build_restart_rows(&mut self, damping: f64, restart: NodeId) {
        let n = self.graph.num_nodes();
        for u in 0..n {
            #[allow(clippy::cast_possible_truncation)] // ids fit u32 by construction
            let u = u as u32;
            // Snapshot before touching the row: restart edges created for
            // earlier nodes show up here with weight 0 and normalize to 0.
            let neighbors = self.graph.neighbor_weights(u);
            let total: f64 = neighbors.iter().map(|&(_, w)| w).sum();

            if total != 0.0 {
                for &(v, w) in &neighbors {
                    self.graph
                        .set_transition(u, v, (1.0 - damping) * w / total);
                }
                if self.graph.has_edge(NodeId(u), restart) {
                    self.graph.add_transition(u, restart.0, damping);
                } else {
                    self.graph.insert_restart_edge(u, restart.0);
                    self.graph.set_transition(u, restart.0, damping);
                    self.added.push((NodeId(u), restart));
                }
            } else {
                // No outgoing weight at all: the walk restarts with certainty.
                for &(v, _) in &neighbors {
                    self.graph.set_transition(u, v, 0.0);
                }
                if !self.graph.has_edge(NodeId(u), restart) {
                    self.graph.insert_restart_edge(u, restart.0);
                    self.added.push((NodeId(u), restart));
                }
                self.graph.set_transition(u, restart.0, 1.0);
            }
        }
    }
}

impl Drop for TransitionScope<'_> {
    fn drop(&mut self) {
        for &(u, v) in &self.added {
            self.graph.remove_edge(u, v);
        }
        self.graph.clear_transitions();
    }
}
