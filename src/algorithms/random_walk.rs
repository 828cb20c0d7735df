//! Personalized random walk with restart
//!
//! Power iteration over the restart transition model: starting from all mass
//! on the seed, repeatedly push mass along the directional transition
//! probabilities until the vector stabilizes (max-norm) or the iteration
//! budget runs out. No matrix is materialized; each iteration walks the
//! adjacency once, O(edges).
//!
//! The graph is mutated only through a [`TransitionScope`], so the restart
//! edges and transition attributes are torn down on every exit path and the
//! caller's graph comes back structurally untouched.

use crate::algorithms::transitions::TransitionScope;
use crate::error::AffinityError;
use crate::storage::graph::{NodeId, WeightedGraph};

/// Power-iteration parameters
///
/// Every tolerance lives here; the crate keeps no module-level knobs.
///
/// # Example
///
/// ```
/// use affinity_graph::WalkConfig;
///
/// let config = WalkConfig {
///     max_iterations: 100,
///     ..WalkConfig::default()
/// };
/// assert_eq!(config.damping, 0.15);
/// assert_eq!(config.threshold, 1e-4);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WalkConfig {
    /// Restart probability: mass re-injected at the seed each step
    pub damping: f64,
    /// Iteration budget; the walk stops here even without convergence
    pub max_iterations: usize,
    /// Convergence bound on the max-norm of successive iterates
    pub threshold: f64,
}

impl Default for WalkConfig {
    fn default() -> Self {
        Self {
            damping: 0.15,
            max_iterations: 50,
            threshold: 1e-4,
        }
    }
}

impl WalkConfig {
    fn validate(&self) -> Result<(), AffinityError> {
        if !(0.0..=1.0).contains(&self.damping) {
            return Err(AffinityError::InvalidDamping(self.damping));
        }
        if self.max_iterations == 0 {
            return Err(AffinityError::DegenerateInput(
                "iteration budget is zero".into(),
            ));
        }
        if !(self.threshold > 0.0 && self.threshold.is_finite()) {
            return Err(AffinityError::DegenerateInput(format!(
                "convergence threshold {} is not a positive finite number",
                self.threshold
            )));
        }
        Ok(())
    }
}

/// Result of a random-walk computation
///
/// `affinity[v]` is the probability mass resting on node `v`. When
/// `converged` is false the budget ran out first and the vector is an
/// approximation of the stationary distribution.
#[derive(Debug, Clone, PartialEq)]
pub struct WalkOutcome {
    /// Probability mass per node, summing to 1 up to floating error
    pub affinity: Vec<f64>,
    /// Iterations actually performed
    pub iterations: usize,
    /// Whether the max-norm difference dropped below the threshold
    pub converged: bool,
}

/// Compute the personalized random-walk affinity of every node to `seed`
///
/// Builds the restart transition model over `graph` (temporarily adding
/// zero-weight restart edges), runs power iteration from all mass on `seed`,
/// and restores the graph before returning — also when validation fails or
/// the iteration panics.
///
/// # Arguments
///
/// * `graph` - weighted interaction graph; exclusively borrowed for the call
/// * `seed` - personalization node receiving the restart mass
/// * `config` - damping, iteration budget, and convergence threshold
///
/// # Errors
///
/// Returns [`AffinityError::InvalidDamping`], [`AffinityError::UnknownSeed`],
/// or [`AffinityError::DegenerateInput`] — all raised before the graph is
/// touched. Exhausting the iteration budget is not an error; it is reported
/// through [`WalkOutcome::converged`] and a warning log.
///
/// # Example
///
/// ```
/// use affinity_graph::{personalized_walk, NodeId, WalkConfig, WeightedGraph};
///
/// let mut graph = WeightedGraph::from_edge_list(&[
///     (NodeId(0), NodeId(1), 1.0),
///     (NodeId(1), NodeId(2), 1.0),
/// ]).unwrap();
///
/// let outcome = personalized_walk(&mut graph, NodeId(0), &WalkConfig::default()).unwrap();
/// assert_eq!(outcome.affinity.len(), 3);
/// let total: f64 = outcome.affinity.iter().sum();
/// assert!((total - 1.0).abs() < 1e-6);
/// // The seed outranks the far end of the chain
/// assert!(outcome.affinity[0] > outcome.affinity[2]);
/// ```
pub fn personalized_walk(
    graph: &mut WeightedGraph,
    seed: NodeId,
    config: &WalkConfig,
) -> Result<WalkOutcome, AffinityError> {
    config.validate()?;

    let n = graph.num_nodes();
    let scope = TransitionScope::with_restart(graph, config.damping, seed)?;

    let seed_idx = seed.0 as usize;
    let mut p = vec![0.0; n];
    p[seed_idx] = 1.0;
    let mut p_next = vec![0.0; n];

    let mut iterations = 0;
    let mut converged = false;

    for iteration in 1..=config.max_iterations {
        iterations = iteration;
        p_next.fill(0.0);

        for u in 0..n {
            let mass = p[u];
            if mass == 0.0 {
                continue;
            }
            #[allow(clippy::cast_possible_truncation)] // ids fit u32 by construction
            for (v, t) in scope.graph().out_transitions(u as u32) {
                p_next[v as usize] += t * mass;
            }
        }

        // The restart column feeds the seed from every node, but if the seed
        // received nothing this step the self-restart still injects its mass.
        if p_next[seed_idx] == 0.0 {
            p_next[seed_idx] = config.damping * p[seed_idx];
        }

        let diff = p
            .iter()
            .zip(&p_next)
            .map(|(old, new)| (old - new).abs())
            .fold(0.0, f64::max);

        std::mem::swap(&mut p, &mut p_next);

        if diff <= config.threshold {
            converged = true;
            log::debug!(
                "personalized walk from seed {} converged after {iteration} iterations (diff={diff:.2e})",
                seed.0
            );
            break;
        }
    }

    drop(scope);

    if !converged {
        log::warn!(
            "personalized walk from seed {} exhausted its {}-iteration budget without reaching threshold {:.1e}; result is approximate",
            seed.0,
            config.max_iterations,
            config.threshold
        );
    }

    Ok(WalkOutcome {
        affinity: p,
        iterations,
        converged,
    })
}

/// Uniform-restart random walk over the whole graph
///
/// The non-personalized variant: restart mass spreads evenly over all nodes
/// instead of concentrating on a seed, and a node with zero outgoing weight
/// sheds its mass uniformly. Reads the graph without mutating it (there is no
/// restart edge to inject), and applies the same always-on convergence check
/// as [`personalized_walk`].
///
/// # Errors
///
/// Returns [`AffinityError::InvalidDamping`] or
/// [`AffinityError::DegenerateInput`] for invalid parameters.
///
/// # Example
///
/// ```
/// use affinity_graph::{pagerank, NodeId, WalkConfig, WeightedGraph};
///
/// let graph = WeightedGraph::from_edge_list(&[
///     (NodeId(0), NodeId(1), 1.0),
///     (NodeId(1), NodeId(2), 1.0),
/// ]).unwrap();
///
/// let outcome = pagerank(&graph, &WalkConfig::default()).unwrap();
/// // The middle node is visited most
/// assert!(outcome.affinity[1] > outcome.affinity[0]);
/// ```
#[allow(clippy::cast_precision_loss)] // graphs stay far below 2^52 nodes
pub fn pagerank(graph: &WeightedGraph, config: &WalkConfig) -> Result<WalkOutcome, AffinityError> {
    config.validate()?;

    let n = graph.num_nodes();
    if n == 0 {
        return Ok(WalkOutcome {
            affinity: Vec::new(),
            iterations: 0,
            converged: true,
        });
    }

    #[allow(clippy::cast_possible_truncation)] // ids fit u32 by construction
    let totals: Vec<f64> = (0..n).map(|u| graph.total_out_weight(u as u32)).collect();
    let teleport = config.damping / n as f64;

    let mut p = vec![1.0 / n as f64; n];
    let mut p_next = vec![0.0; n];

    let mut iterations = 0;
    let mut converged = false;

    for iteration in 1..=config.max_iterations {
        iterations = iteration;
        p_next.fill(teleport);

        let mut dangling = 0.0;
        for u in 0..n {
            if totals[u] == 0.0 {
                dangling += p[u];
                continue;
            }
            let share = (1.0 - config.damping) * p[u] / totals[u];
            #[allow(clippy::cast_possible_truncation)] // ids fit u32 by construction
            for (v, w) in graph.neighbors(NodeId(u as u32))? {
                p_next[v.0 as usize] += share * w;
            }
        }
        if dangling != 0.0 {
            let spread = (1.0 - config.damping) * dangling / n as f64;
            for mass in &mut p_next {
                *mass += spread;
            }
        }

        let diff = p
            .iter()
            .zip(&p_next)
            .map(|(old, new)| (old - new).abs())
            .fold(0.0, f64::max);

        std::mem::swap(&mut p, &mut p_next);

        if diff <= config.threshold {
            converged = true;
            break;
        }
    }

    if !converged {
        log::warn!(
            "pagerank exhausted its {}-iteration budget without reaching threshold {:.1e}; result is approximate",
            config.max_iterations,
            config.threshold
        );
    }

    Ok(WalkOutcome {
        affinity: p,
        iterations,
        converged,
    })
}
