//! Graph-build command handler: compile the triplicated network to an artifact.

use std::path::Path;

use anyhow::{Context, Result};
use serde_json::json;
use tracing::info;

use searoute_cli::input::InputOptions;
use searoute_cli::output::OutputFormat;
use searoute_lib::{triplicate, RoutingGraph};

pub fn handle_graph_build_command(
    input: &InputOptions,
    format: OutputFormat,
    output: &Path,
) -> Result<()> {
    let network = input.load_network()?;
    let graph = RoutingGraph::compile(&triplicate(&network), input.tolerance)
        .context("failed to compile the routing graph")?;
    graph
        .save(output)
        .with_context(|| format!("failed to write routing graph to {}", output.display()))?;

    info!(
        path = %output.display(),
        vertices = graph.vertex_count(),
        edges = graph.edge_count(),
        "routing graph saved"
    );

    if format.is_text() {
        println!(
            "Routing graph written to {} ({} vertices, {} edges)",
            output.display(),
            graph.vertex_count(),
            graph.edge_count()
        );
    } else {
        let summary = json!({
            "path": output.display().to_string(),
            "vertices": graph.vertex_count(),
            "edges": graph.edge_count(),
            "tolerance": graph.tolerance(),
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }
    Ok(())
}
