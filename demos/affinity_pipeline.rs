//! Full pipeline example: content similarity → structural diffusion →
//! seeded random walk → edge-list outputs
//!
//! Run with: cargo run --example affinity_pipeline

use affinity_graph::{
    diffuse, pagerank, personalized_walk, storage::edgelist, NodeId, SimilarityMatrix,
    WalkConfig, WeightedGraph,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    println!("🔬 affinity-graph: diffusion + random-walk pipeline\n");

    // 1. A small interaction graph: two tight groups bridged by one edge
    println!("📊 Building interaction graph...");
    let mut graph = WeightedGraph::with_nodes(7);
    // group A
    graph.add_edge(NodeId(0), NodeId(1), 1.0)?;
    graph.add_edge(NodeId(1), NodeId(2), 1.0)?;
    graph.add_edge(NodeId(2), NodeId(0), 1.0)?;
    // bridge
    graph.add_edge(NodeId(2), NodeId(3), 0.5)?;
    // group B
    graph.add_edge(NodeId(3), NodeId(4), 1.0)?;
    graph.add_edge(NodeId(4), NodeId(5), 1.0)?;
    graph.add_edge(NodeId(5), NodeId(6), 1.0)?;
    graph.add_edge(NodeId(6), NodeId(3), 1.0)?;
    println!(
        "  ✅ {} nodes, {} edges\n",
        graph.num_nodes(),
        graph.num_edges()
    );

    // 2. Content similarity on a few annotated pairs
    println!("🧬 Content similarity (annotation overlap)...");
    let mut content = SimilarityMatrix::new(7);
    content.set_symmetric(NodeId(0), NodeId(1), 0.9)?;
    content.set_symmetric(NodeId(1), NodeId(2), 0.7)?;
    content.set_symmetric(NodeId(4), NodeId(5), 0.6)?;
    println!("  {} stored entries\n", content.num_entries());

    // 3. Smooth the content scores one structural hop
    println!("🌊 Diffusing content scores along the graph...");
    let smoothed = diffuse(&mut graph, &content)?;
    println!(
        "  {} entries, max {:?} (rescaled to the content maximum)",
        smoothed.num_entries(),
        smoothed.max_value()
    );
    let dir = tempfile::tempdir()?;
    let structure_path = dir.path().join("structure_similarity.txt");
    edgelist::write_matrix(&smoothed, &structure_path).await?;
    println!("  💾 wrote {}\n", structure_path.display());

    // 4. Personalized walk from node 0
    println!("🚶 Personalized random walk from seed 0...");
    let config = WalkConfig {
        max_iterations: 200,
        ..WalkConfig::default()
    };
    let outcome = personalized_walk(&mut graph, NodeId(0), &config)?;
    println!(
        "  converged: {} after {} iterations",
        outcome.converged, outcome.iterations
    );
    for (node, mass) in outcome.affinity.iter().enumerate() {
        println!("    node {node}: {mass:.6}");
    }
    let affinity_path = dir.path().join("affinity_seed0.txt");
    edgelist::write_affinity(&outcome.affinity, Some(NodeId(0)), &affinity_path).await?;
    println!("  💾 wrote {}\n", affinity_path.display());

    // 5. Uniform pagerank for comparison
    println!("📈 Uniform-restart pagerank...");
    let global = pagerank(&graph, &config)?;
    let mut ranked: Vec<_> = global.affinity.iter().enumerate().collect();
    ranked.sort_by(|a, b| b.1.partial_cmp(a.1).unwrap_or(std::cmp::Ordering::Equal));
    for (node, mass) in ranked.iter().take(3) {
        println!("    #{node}: {mass:.6}");
    }

    println!("\n✅ Pipeline complete");
    Ok(())
}
