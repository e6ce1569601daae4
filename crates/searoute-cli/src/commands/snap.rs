//! Snap command handler: nearest network vertex for a position.

use anyhow::{Context, Result};
use serde::Serialize;

use searoute_cli::input::InputOptions;
use searoute_cli::output::OutputFormat;
use searoute_lib::{haversine_distance, Coordinate, CoordinateIndex};

#[derive(Debug, Serialize)]
struct SnapOutput {
    input: Coordinate,
    vertex: Coordinate,
    /// Great-circle distance from the input to the vertex, in kilometers.
    offset_km: f64,
}

pub fn handle_snap_command(
    input: &InputOptions,
    format: OutputFormat,
    point: Coordinate,
) -> Result<()> {
    let network = input.load_network()?;
    let index = CoordinateIndex::from_network(&network);
    let vertex = index
        .snap_to_nearest_vertex(&point.to_position())
        .context("failed to query the coordinate index")?
        .with_context(|| format!("cannot snap {point}: the network has no vertices"))?;

    let output = SnapOutput {
        input: point,
        vertex,
        offset_km: haversine_distance(point, vertex).round() / 1000.0,
    };

    if format.is_text() {
        println!(
            "{} -> {} ({:.3} km)",
            output.input, output.vertex, output.offset_km
        );
    } else {
        println!("{}", serde_json::to_string_pretty(&output)?);
    }
    Ok(())
}
