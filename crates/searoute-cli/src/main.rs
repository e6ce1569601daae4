mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use searoute_cli::input::{parse_coordinate, InputOptions};
use searoute_cli::output::OutputFormat;
use searoute_lib::{Coordinate, DEFAULT_PROFILE, DEFAULT_RESTRICTED_MULTIPLIER, DEFAULT_TOLERANCE};

use commands::route::RouteCommandArgs;

#[derive(Parser, Debug)]
#[command(author, version, about = "Maritime shortest-route utilities")]
struct Cli {
    #[command(flatten)]
    global: GlobalOptions,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct GlobalOptions {
    /// Shipping-lane network (GeoJSON FeatureCollection of LineStrings).
    #[arg(long, env = "SEAROUTE_NETWORK", global = true)]
    network: Option<PathBuf>,

    /// Passage rule configuration (JSON). Without it only the default profile exists.
    #[arg(long, env = "SEAROUTE_RULES", global = true)]
    rules: Option<PathBuf>,

    /// Weight multiplier applied to restricted passages.
    #[arg(long, default_value_t = DEFAULT_RESTRICTED_MULTIPLIER, global = true)]
    restricted_multiplier: f64,

    /// Coordinate tolerance (degrees) used to merge graph vertices.
    #[arg(long, default_value_t = DEFAULT_TOLERANCE, global = true)]
    tolerance: f64,

    /// Build profiles only for these vessel classes.
    #[arg(long = "class", value_delimiter = ',', global = true)]
    classes: Vec<String>,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    format: OutputFormat,
}

impl GlobalOptions {
    fn input(&self) -> InputOptions {
        InputOptions {
            network: self.network.clone(),
            rules: self.rules.clone(),
            restricted_multiplier: self.restricted_multiplier,
            tolerance: self.tolerance,
            classes: self.classes.clone(),
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compute the shortest sea route between two positions.
    Route {
        /// Origin as `lon,lat`.
        #[arg(long, allow_hyphen_values = true, value_parser = parse_coordinate)]
        from: Coordinate,
        /// Destination as `lon,lat`.
        #[arg(long, allow_hyphen_values = true, value_parser = parse_coordinate)]
        to: Coordinate,
        /// Routing profile: `default` or a vessel class.
        #[arg(long, default_value = DEFAULT_PROFILE)]
        profile: String,
        /// Include the route geometry.
        #[arg(long)]
        path: bool,
        /// Require both positions to be network vertices instead of snapping them.
        #[arg(long)]
        no_snap: bool,
        /// Do not split paths at the antimeridian.
        #[arg(long)]
        no_split: bool,
        /// Load a routing graph built with `graph-build` instead of compiling one.
        #[arg(long)]
        graph: Option<PathBuf>,
    },
    /// Snap a position onto the nearest network vertex.
    Snap {
        /// Position as `lon,lat`.
        #[arg(long, allow_hyphen_values = true, value_parser = parse_coordinate)]
        point: Coordinate,
    },
    /// List routing profiles and their passage rule counts.
    Profiles,
    /// Compile the triplicated network into a routing graph artifact.
    GraphBuild {
        /// Destination file for the artifact.
        #[arg(long, short)]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let input = cli.global.input();
    let format = cli.global.format;

    match cli.command {
        Command::Route {
            from,
            to,
            profile,
            path,
            no_snap,
            no_split,
            graph,
        } => {
            let args = RouteCommandArgs {
                from,
                to,
                profile,
                path,
                no_snap,
                no_split,
                graph,
            };
            commands::route::handle_route_command(&input, format, &args)
        }
        Command::Snap { point } => commands::snap::handle_snap_command(&input, format, point),
        Command::Profiles => commands::profiles::handle_profiles_command(&input, format),
        Command::GraphBuild { output } => {
            commands::graph::handle_graph_build_command(&input, format, &output)
        }
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}
