//! Route command handler for computing sea routes between two positions.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use tracing::info;

use searoute_cli::input::InputOptions;
use searoute_cli::output::OutputFormat;
use searoute_lib::{Coordinate, RouteOptions};

/// Arguments for the route command.
#[derive(Debug, Clone)]
pub struct RouteCommandArgs {
    pub from: Coordinate,
    pub to: Coordinate,
    /// Routing profile: `default` or a vessel class name.
    pub profile: String,
    /// Include the path geometry in the output.
    pub path: bool,
    /// Route between the given points as-is instead of snapping them first.
    pub no_snap: bool,
    /// Keep paths that cross the antimeridian as a single line.
    pub no_split: bool,
    /// Reuse a compiled routing graph artifact.
    pub graph: Option<PathBuf>,
}

impl RouteCommandArgs {
    pub fn route_options(&self) -> RouteOptions {
        let mut options = RouteOptions::for_profile(self.profile.as_str()).with_path(self.path);
        options.split_antimeridian = !self.no_split;
        options
    }
}

pub fn handle_route_command(
    input: &InputOptions,
    format: OutputFormat,
    args: &RouteCommandArgs,
) -> Result<()> {
    let (router, _) = input.build_router(args.graph.as_deref())?;
    let options = args.route_options();

    let result = if args.no_snap {
        router.shortest_path(args.from, args.to, &options)
    } else {
        router.shortest_route(
            &args.from.to_position(),
            &args.to.to_position(),
            &options,
        )
    }
    .with_context(|| format!("failed to route from {} to {}", args.from, args.to))?;

    let Some(result) = result else {
        bail!(
            "no route found from {} to {} for profile '{}'",
            args.from,
            args.to,
            args.profile
        );
    };

    info!(
        profile = %result.profile,
        distance_km = result.distance_km,
        "route computed"
    );
    print!("{}", result.render(format.render_mode())?);
    if !format.is_text() {
        println!();
    }
    Ok(())
}
