//! Text edge-list codec
//!
//! Flat `node node weight` serialization shared by every component: weighted
//! graphs are read from it, smoothed similarity matrices and per-seed affinity
//! vectors are written to it. Downstream clustering consumes the matrix form;
//! plotting consumes the vector form with its optional seed header.
//!
//! # Format
//!
//! ```text
//! # graph / matrix: one entry per line, weight optional on input (default 1.0)
//! 0 1 0.800000
//! 1 2 1.000000
//!
//! # affinity vector: optional seed header, then one line per node id
//! 0
//! 0 0.345229
//! 1 0.229771
//! ```
//!
//! Writers emit only stored entries (symmetric pairs are not deduplicated) in
//! fixed-point `%.6` notation. `write_*` truncates, `append_*` accumulates —
//! the surrounding system distributes one output across repeated calls.

use crate::storage::graph::{NodeId, WeightedGraph};
use crate::storage::similarity::SimilarityMatrix;
use anyhow::{bail, Context, Result};
use std::fmt::Write as _;
use std::path::Path;
use tokio::io::AsyncWriteExt;

/// Read a weighted graph from a whitespace-separated edge list
///
/// Each line is `node node [weight]`; a missing weight defaults to 1.0.
/// Duplicate edges overwrite rather than accumulate. Blank lines are skipped.
/// The graph is sized to the largest id seen.
///
/// # Errors
///
/// Fails on unreadable files, malformed lines (with line context), and
/// self-loop entries.
pub async fn read_graph<P: AsRef<Path>>(path: P) -> Result<WeightedGraph> {
    let path = path.as_ref();
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading graph edge list {}", path.display()))?;
    parse_graph(&text).with_context(|| format!("parsing graph edge list {}", path.display()))
}

/// Read a content-similarity matrix from an edge list
///
/// Each line is `node node weight`. An explicit `0.0` weight means "no
/// comparable annotation" and is recorded as absence. Entries are materialized
/// symmetrically. All ids must be below `dim`.
///
/// # Errors
///
/// Fails on unreadable files, malformed lines, and ids outside `[0, dim)`.
pub async fn read_similarity<P: AsRef<Path>>(path: P, dim: usize) -> Result<SimilarityMatrix> {
    let path = path.as_ref();
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading similarity edge list {}", path.display()))?;
    parse_similarity(&text, dim)
        .with_context(|| format!("parsing similarity edge list {}", path.display()))
}

/// Write the stored entries of a sparse matrix as `row col weight` lines,
/// truncating any existing file
///
/// # Errors
///
/// Fails if the file cannot be written.
pub async fn write_matrix<P: AsRef<Path>>(matrix: &SimilarityMatrix, path: P) -> Result<()> {
    let path = path.as_ref();
    tokio::fs::write(path, render_matrix(matrix))
        .await
        .with_context(|| format!("writing matrix edge list {}", path.display()))
}

/// Append the stored entries of a sparse matrix to `path`, creating it if
/// missing
///
/// # Errors
///
/// Fails if the file cannot be opened or written.
pub async fn append_matrix<P: AsRef<Path>>(matrix: &SimilarityMatrix, path: P) -> Result<()> {
    append(path.as_ref(), render_matrix(matrix)).await
}

/// Write an affinity vector, truncating any existing file
///
/// When `seed` is given it is written alone on the first line; then one
/// `node weight` line per position, zeros included, in index order.
///
/// # Errors
///
/// Fails if the file cannot be written.
pub async fn write_affinity<P: AsRef<Path>>(
    affinity: &[f64],
    seed: Option<NodeId>,
    path: P,
) -> Result<()> {
    let path = path.as_ref();
    tokio::fs::write(path, render_affinity(affinity, seed))
        .await
        .with_context(|| format!("writing affinity vector {}", path.display()))
}

/// Append an affinity vector to `path`, creating it if missing
///
/// # Errors
///
/// Fails if the file cannot be opened or written.
pub async fn append_affinity<P: AsRef<Path>>(
    affinity: &[f64],
    seed: Option<NodeId>,
    path: P,
) -> Result<()> {
    append(path.as_ref(), render_affinity(affinity, seed)).await
}

async fn append(path: &Path, contents: String) -> Result<()> {
    let mut file = tokio::fs::OpenOptions::new()
        .append(true)
        .create(true)
        .open(path)
        .await
        .with_context(|| format!("opening {} for append", path.display()))?;
    file.write_all(contents.as_bytes())
        .await
        .with_context(|| format!("appending to {}", path.display()))?;
    file.flush()
        .await
        .with_context(|| format!("flushing {}", path.display()))
}

fn parse_graph(text: &str) -> Result<WeightedGraph> {
    let mut edges = Vec::new();
    for (lineno, line) in text.lines().enumerate() {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        match tokens.as_slice() {
            [] => {}
            [src, dst] => edges.push((parse_id(src, lineno)?, parse_id(dst, lineno)?, 1.0)),
            [src, dst, weight] => edges.push((
                parse_id(src, lineno)?,
                parse_id(dst, lineno)?,
                parse_weight(weight, lineno)?,
            )),
            _ => bail!(
                "line {}: expected `node node [weight]`, got {} tokens",
                lineno + 1,
                tokens.len()
            ),
        }
    }
    WeightedGraph::from_edge_list(&edges).map_err(Into::into)
}

fn parse_similarity(text: &str, dim: usize) -> Result<SimilarityMatrix> {
    let mut matrix = SimilarityMatrix::new(dim);
    for (lineno, line) in text.lines().enumerate() {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        match tokens.as_slice() {
            [] => {}
            [src, dst, weight] => {
                let i = parse_id(src, lineno)?;
                let j = parse_id(dst, lineno)?;
                let w = parse_weight(weight, lineno)?;
                // 0.0 entries stay absent
                matrix
                    .set_symmetric(i, j, w)
                    .with_context(|| format!("line {}", lineno + 1))?;
            }
            _ => bail!(
                "line {}: expected `node node weight`, got {} tokens",
                lineno + 1,
                tokens.len()
            ),
        }
    }
    Ok(matrix)
}

fn parse_id(token: &str, lineno: usize) -> Result<NodeId> {
    token
        .parse::<u32>()
        .map(NodeId)
        .with_context(|| format!("line {}: invalid node id `{token}`", lineno + 1))
}

fn parse_weight(token: &str, lineno: usize) -> Result<f64> {
    let w = token
        .parse::<f64>()
        .with_context(|| format!("line {}: invalid weight `{token}`", lineno + 1))?;
    if !w.is_finite() {
        bail!("line {}: non-finite weight `{token}`", lineno + 1);
    }
    Ok(w)
}

fn render_matrix(matrix: &SimilarityMatrix) -> String {
    let mut out = String::new();
    for (i, j, v) in matrix.entries() {
        let _ = writeln!(out, "{} {} {v:.6}", i.0, j.0);
    }
    out
}

fn render_affinity(affinity: &[f64], seed: Option<NodeId>) -> String {
    let mut out = String::new();
    if let Some(seed) = seed {
        let _ = writeln!(out, "{}", seed.0);
    }
    for (node, mass) in affinity.iter().enumerate() {
        let _ = writeln!(out, "{node} {mass:.6}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_parse_graph_default_weight() {
        let graph = parse_graph("0 1\n1 2 0.5\n\n2 3 2\n").unwrap();
        assert_eq!(graph.num_nodes(), 4);
        assert_eq!(graph.weight(NodeId(0), NodeId(1)), Some(1.0));
        assert_eq!(graph.weight(NodeId(1), NodeId(2)), Some(0.5));
        assert_eq!(graph.weight(NodeId(2), NodeId(3)), Some(2.0));
    }

    #[test]
    fn test_parse_graph_duplicate_overwrites() {
        let graph = parse_graph("0 1 1.0\n1 0 3.0\n").unwrap();
        assert_eq!(graph.num_edges(), 1);
        assert_eq!(graph.weight(NodeId(0), NodeId(1)), Some(3.0));
    }

    #[test]
    fn test_parse_graph_rejects_garbage() {
        let err = parse_graph("0 x 1.0\n").unwrap_err();
        assert!(err.to_string().contains("line 1"));

        assert!(parse_graph("0 1 2 3\n").is_err());
        assert!(parse_graph("0 0\n").is_err()); // self-loop
        assert!(parse_graph("0 1 inf\n").is_err());
    }

    #[test]
    fn test_parse_similarity_zero_is_absence() {
        let m = parse_similarity("0 1 0.8\n1 2 0.0\n", 3).unwrap();
        assert_eq!(m.get(NodeId(0), NodeId(1)), 0.8);
        assert_eq!(m.get(NodeId(1), NodeId(0)), 0.8);
        assert_eq!(m.num_entries(), 2);
    }

    #[test]
    fn test_parse_similarity_bounds() {
        assert!(parse_similarity("0 7 0.5\n", 3).is_err());
    }

    #[test]
    fn test_render_affinity_with_seed_header() {
        let text = render_affinity(&[0.5, 0.0, 0.5], Some(NodeId(2)));
        assert_eq!(text, "2\n0 0.500000\n1 0.000000\n2 0.500000\n");

        let text = render_affinity(&[1.0], None);
        assert_eq!(text, "0 1.000000\n");
    }

    #[test]
    fn test_matrix_file_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("smoothed");

        let mut m = SimilarityMatrix::new(3);
        m.set_symmetric(NodeId(0), NodeId(1), 0.8).unwrap();
        m.set_symmetric(NodeId(1), NodeId(2), 0.25).unwrap();

        tokio_test::block_on(async {
            write_matrix(&m, &path).await.unwrap();
            // Both orientations of each stored pair come back
            let loaded = read_similarity(&path, 3).await.unwrap();
            assert_eq!(loaded, m);
        });
    }

    #[test]
    fn test_append_accumulates() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("distributed");

        let mut first = SimilarityMatrix::new(4);
        first.set(NodeId(0), NodeId(1), 0.5).unwrap();
        let mut second = SimilarityMatrix::new(4);
        second.set(NodeId(2), NodeId(3), 0.25).unwrap();

        tokio_test::block_on(async {
            append_matrix(&first, &path).await.unwrap();
            append_matrix(&second, &path).await.unwrap();

            let text = tokio::fs::read_to_string(&path).await.unwrap();
            assert_eq!(text, "0 1 0.500000\n2 3 0.250000\n");

            // write_matrix truncates
            write_matrix(&second, &path).await.unwrap();
            let text = tokio::fs::read_to_string(&path).await.unwrap();
            assert_eq!(text, "2 3 0.250000\n");
        });
    }

    #[test]
    fn test_append_affinity_accumulates_vectors() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("affinities");

        tokio_test::block_on(async {
            append_affinity(&[1.0, 0.0], Some(NodeId(0)), &path)
                .await
                .unwrap();
            append_affinity(&[0.0, 1.0], Some(NodeId(1)), &path)
                .await
                .unwrap();

            let text = tokio::fs::read_to_string(&path).await.unwrap();
            assert_eq!(
                text,
                "0\n0 1.000000\n1 0.000000\n1\n0 0.000000\n1 1.000000\n"
            );
        });
    }

    #[test]
    fn test_graph_file_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ring");

        tokio_test::block_on(async {
            tokio::fs::write(&path, "0 1\n1 2\n2 3\n3 0\n").await.unwrap();
            let graph = read_graph(&path).await.unwrap();
            assert_eq!(graph.num_nodes(), 4);
            assert_eq!(graph.num_edges(), 4);
        });
    }
}
