//! Loading the network, passage rules and router from command-line options.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use tracing::debug;

use searoute_lib::{
    Coordinate, Error as LibError, Network, PassageRuleConfig, RouterOptions, RoutingGraph,
    SeaRouter,
};

/// Options shared by every subcommand that needs the network.
#[derive(Debug, Clone, Default)]
pub struct InputOptions {
    pub network: Option<PathBuf>,
    pub rules: Option<PathBuf>,
    pub restricted_multiplier: f64,
    pub tolerance: f64,
    /// Restrict profiles to these vessel classes (empty means all).
    pub classes: Vec<String>,
}

impl InputOptions {
    pub fn network_path(&self) -> Result<&Path> {
        self.network.as_deref().ok_or_else(|| {
            anyhow!("no network given; pass --network <path> or set SEAROUTE_NETWORK")
        })
    }

    pub fn load_network(&self) -> Result<Network> {
        let path = self.network_path()?;
        Network::load(path)
            .with_context(|| format!("failed to load network from {}", path.display()))
    }

    pub fn load_rules(&self) -> Result<Option<PassageRuleConfig>> {
        self.rules
            .as_deref()
            .map(|path| {
                PassageRuleConfig::load(path)
                    .with_context(|| format!("failed to load passage rules from {}", path.display()))
            })
            .transpose()
    }

    pub fn router_options(&self) -> RouterOptions {
        RouterOptions {
            restricted_multiplier: self.restricted_multiplier,
            tolerance: self.tolerance,
            classes: (!self.classes.is_empty()).then(|| self.classes.clone()),
        }
    }

    /// Build a router, reusing a compiled graph artifact when `graph` is given.
    pub fn build_router(
        &self,
        graph: Option<&Path>,
    ) -> Result<(SeaRouter, Option<PassageRuleConfig>)> {
        let network = self.load_network()?;
        let rules = self.load_rules()?;
        debug!(
            features = network.len(),
            has_rules = rules.is_some(),
            "building router"
        );

        let router = match graph {
            Some(path) => {
                let graph = RoutingGraph::load(path)
                    .with_context(|| format!("failed to load routing graph {}", path.display()))?;
                SeaRouter::with_graph(network, graph, rules.as_ref(), self.router_options())
            }
            None => SeaRouter::new(network, rules.as_ref(), self.router_options()),
        }
        .context("failed to build the sea router")?;

        Ok((router, rules))
    }
}

/// Parse a `lon,lat` argument.
pub fn parse_coordinate(value: &str) -> std::result::Result<Coordinate, String> {
    value
        .parse::<Coordinate>()
        .map_err(|error: LibError| format!("{error}; expected <lon>,<lat>"))
}
