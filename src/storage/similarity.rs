//! Sparse similarity matrix keyed by dense node ids
//!
//! Zero means "no recorded similarity" and is represented by absence: storing
//! a `0.0` removes the entry. Symmetric data is materialized in both
//! orientations so the edge-list codec can emit exactly what is stored.

use crate::error::AffinityError;
use crate::storage::graph::NodeId;
use std::collections::BTreeMap;

/// Sparse square similarity/affinity matrix
///
/// # Example
///
/// ```
/// use affinity_graph::{NodeId, SimilarityMatrix};
///
/// let mut m = SimilarityMatrix::new(3);
/// m.set_symmetric(NodeId(0), NodeId(1), 0.8).unwrap();
///
/// assert_eq!(m.get(NodeId(0), NodeId(1)), 0.8);
/// assert_eq!(m.get(NodeId(1), NodeId(0)), 0.8);
/// assert_eq!(m.get(NodeId(0), NodeId(2)), 0.0);
/// assert_eq!(m.num_entries(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimilarityMatrix {
    rows: Vec<BTreeMap<u32, f64>>,
}

impl SimilarityMatrix {
    /// Create an all-zero `dim x dim` matrix
    #[must_use]
    pub fn new(dim: usize) -> Self {
        Self {
            rows: vec![BTreeMap::new(); dim],
        }
    }

    /// Matrix dimension
    #[must_use]
    pub fn dim(&self) -> usize {
        self.rows.len()
    }

    /// Number of stored (non-zero) entries
    #[must_use]
    pub fn num_entries(&self) -> usize {
        self.rows.iter().map(BTreeMap::len).sum()
    }

    /// Value at `(i, j)`; absent entries (and out-of-range indices) read as 0
    #[must_use]
    pub fn get(&self, i: NodeId, j: NodeId) -> f64 {
        self.rows
            .get(i.0 as usize)
            .and_then(|row| row.get(&j.0))
            .copied()
            .unwrap_or(0.0)
    }

    /// Store `value` at `(i, j)`; `0.0` removes the entry
    ///
    /// # Errors
    ///
    /// Returns [`AffinityError::NodeOutOfBounds`] for indices outside the
    /// matrix dimension.
    pub fn set(&mut self, i: NodeId, j: NodeId, value: f64) -> Result<(), AffinityError> {
        self.check_bounds(i.0)?;
        self.check_bounds(j.0)?;
        if value == 0.0 {
            self.rows[i.0 as usize].remove(&j.0);
        } else {
            self.rows[i.0 as usize].insert(j.0, value);
        }
        Ok(())
    }

    /// Store `value` at `(i, j)` and `(j, i)`
    ///
    /// # Errors
    ///
    /// Returns [`AffinityError::NodeOutOfBounds`] for indices outside the
    /// matrix dimension.
    pub fn set_symmetric(&mut self, i: NodeId, j: NodeId, value: f64) -> Result<(), AffinityError> {
        self.set(i, j, value)?;
        if i != j {
            self.set(j, i, value)?;
        }
        Ok(())
    }

    /// Iterate over stored entries as `(row, col, value)` in row-major order
    #[allow(clippy::cast_possible_truncation)] // ids fit u32 by construction
    pub fn entries(&self) -> impl Iterator<Item = (NodeId, NodeId, f64)> + '_ {
        self.rows.iter().enumerate().flat_map(|(i, row)| {
            row.iter()
                .map(move |(&j, &v)| (NodeId(i as u32), NodeId(j), v))
        })
    }

    /// Largest stored value, or `None` if the matrix has no entries
    ///
    /// Only stored entries participate; implicit zeros are ignored.
    #[must_use]
    pub fn max_value(&self) -> Option<f64> {
        self.rows
            .iter()
            .flat_map(BTreeMap::values)
            .copied()
            .fold(None, |acc, v| Some(acc.map_or(v, |m: f64| m.max(v))))
    }

    /// Multiply every stored entry by `factor`
    ///
    /// A zero factor empties the matrix (zeros are never stored).
    pub fn scale(&mut self, factor: f64) {
        if factor == 0.0 {
            for row in &mut self.rows {
                row.clear();
            }
            return;
        }
        for row in &mut self.rows {
            for v in row.values_mut() {
                *v *= factor;
            }
        }
    }

    /// Convex per-entry blend: `alpha * self + (1 - alpha) * other`
    ///
    /// The data-flow step that combines a content-similarity matrix with a
    /// structure-derived one before seeding a random walk.
    ///
    /// # Errors
    ///
    /// Returns [`AffinityError::DimensionMismatch`] if the dimensions differ
    /// and [`AffinityError::DegenerateInput`] if `alpha` is outside `[0, 1]`.
    pub fn blend(&self, other: &Self, alpha: f64) -> Result<Self, AffinityError> {
        if !(0.0..=1.0).contains(&alpha) {
            return Err(AffinityError::DegenerateInput(format!(
                "blend factor {alpha} outside [0, 1]"
            )));
        }
        if self.dim() != other.dim() {
            return Err(AffinityError::DimensionMismatch {
                matrix: other.dim(),
                graph: self.dim(),
            });
        }

        let mut out = Self::new(self.dim());
        for (i, j, v) in self.entries() {
            out.set(i, j, alpha * v)?;
        }
        for (i, j, v) in other.entries() {
            let blended = out.get(i, j) + (1.0 - alpha) * v;
            out.set(i, j, blended)?;
        }
        Ok(out)
    }

    /// Row `i` as `(col, value)` pairs
    pub(crate) fn row(&self, i: usize) -> impl Iterator<Item = (u32, f64)> + '_ {
        self.rows[i].iter().map(|(&j, &v)| (j, v))
    }

    fn check_bounds(&self, idx: u32) -> Result<(), AffinityError> {
        if (idx as usize) < self.rows.len() {
            Ok(())
        } else {
            Err(AffinityError::NodeOutOfBounds {
                node: idx,
                num_nodes: self.rows.len(),
            })
        }
    }
}
