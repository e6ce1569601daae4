//! Route orchestration across routing profiles.
//!
//! A [`SeaRouter`] is built in a fixed sequence of stages:
//!
//! 1. the [`CoordinateIndex`] over the raw network (`IndexBuilt`),
//! 2. the triplicated network and its compiled graph (`NetworkTriplicated`),
//! 3. one search structure per profile (`ProfilesBuilt`).
//!
//! Only a router that completed every stage is ever returned (`Ready`). All
//! state is immutable afterwards, so a router can be shared across threads and
//! queried concurrently.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use geojson::{Geometry, Value};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::antimeridian::{normalize_pair, split_at_antimeridian, triplicate, unwrap_path};
use crate::error::{fuzzy_matches, Error, Result};
use crate::geodesy::{haversine_distance, path_length, Coordinate};
use crate::graph::{RoutingGraph, DEFAULT_TOLERANCE};
use crate::network::Network;
use crate::path::{DijkstraEngine, PathEngine};
use crate::rules::{
    collect_class_edge_rules, compute_effective_status, unmatched_passage_features, EdgeRules,
    EffectiveStatus, PassageRuleConfig, UnmatchedFeature, VesselClass,
};
use crate::spatial::CoordinateIndex;
use crate::weight::{default_weight_fn, make_weight_fn, validate_multiplier, WeightFn};

/// Name of the profile that ignores passage rules.
pub const DEFAULT_PROFILE: &str = "default";

/// Default penalty factor for restricted passages.
pub const DEFAULT_RESTRICTED_MULTIPLIER: f64 = 1.5;

/// Nautical miles per kilometer.
pub const KM_TO_NM: f64 = 0.539957;

/// Construction stage of a [`SeaRouter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RouterStage {
    Uninitialized,
    IndexBuilt,
    NetworkTriplicated,
    ProfilesBuilt,
    Ready,
}

/// Options applied while building a router.
#[derive(Debug, Clone, PartialEq)]
pub struct RouterOptions {
    /// Weight factor applied to restricted passages.
    pub restricted_multiplier: f64,
    /// Vertex merge tolerance in degrees.
    pub tolerance: f64,
    /// Vessel classes to build profiles for; `None` builds every declared class.
    pub classes: Option<Vec<String>>,
}

impl Default for RouterOptions {
    fn default() -> Self {
        Self {
            restricted_multiplier: DEFAULT_RESTRICTED_MULTIPLIER,
            tolerance: DEFAULT_TOLERANCE,
            classes: None,
        }
    }
}

/// Per-query options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteOptions {
    pub profile: String,
    /// Include the path geometry in the result.
    pub want_path: bool,
    /// Emit a `MultiLineString` when the path crosses the antimeridian.
    pub split_antimeridian: bool,
}

impl Default for RouteOptions {
    fn default() -> Self {
        Self {
            profile: DEFAULT_PROFILE.to_string(),
            want_path: false,
            split_antimeridian: true,
        }
    }
}

impl RouteOptions {
    pub fn for_profile(profile: impl Into<String>) -> Self {
        Self {
            profile: profile.into(),
            ..Self::default()
        }
    }

    pub fn with_path(mut self, want_path: bool) -> Self {
        self.want_path = want_path;
        self
    }
}

/// Route geometry with every longitude in `(-180, 180]`.
#[derive(Debug, Clone, PartialEq)]
pub enum RoutePath {
    Line(Vec<Coordinate>),
    /// Parts of a path split at the antimeridian.
    MultiLine(Vec<Vec<Coordinate>>),
}

impl RoutePath {
    pub fn is_multi_part(&self) -> bool {
        matches!(self, RoutePath::MultiLine(_))
    }

    /// Every coordinate, in order, across all parts.
    pub fn coordinates(&self) -> Vec<Coordinate> {
        match self {
            RoutePath::Line(line) => line.clone(),
            RoutePath::MultiLine(parts) => parts.iter().flatten().copied().collect(),
        }
    }

    pub fn to_geometry(&self) -> Geometry {
        let positions = |line: &[Coordinate]| -> Vec<Vec<f64>> {
            line.iter().map(|c| c.to_position()).collect()
        };
        let value = match self {
            RoutePath::Line(line) => Value::LineString(positions(line)),
            RoutePath::MultiLine(parts) => {
                Value::MultiLineString(parts.iter().map(|part| positions(part)).collect())
            }
        };
        Geometry::new(value)
    }
}

impl Serialize for RoutePath {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.to_geometry().serialize(serializer)
    }
}

/// Outcome of a successful route query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteResult {
    pub profile: String,
    /// Start point as routed (after snapping, before antimeridian normalization).
    pub from: Coordinate,
    pub to: Coordinate,
    /// Path weight in kilometers, rounded to 3 decimals.
    pub distance_km: f64,
    /// `distance_km` in nautical miles, rounded to 2 decimals.
    pub distance_nm: f64,
    /// Geodesic length of the path in kilometers, rounded to 3 decimals.
    pub length_km: f64,
    /// Number of path vertices.
    pub vertex_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<RoutePath>,
}

struct Profile {
    name: String,
    class: Option<VesselClass>,
    rules: Option<EdgeRules>,
    weight_fn: WeightFn,
    engine: Arc<dyn PathEngine>,
}

/// Maritime router holding every built profile.
pub struct SeaRouter {
    network: Arc<Network>,
    index: Arc<CoordinateIndex>,
    graph: Arc<RoutingGraph>,
    effective: Option<Arc<EffectiveStatus>>,
    unmatched: Vec<UnmatchedFeature>,
    profiles: Vec<Profile>,
    options: RouterOptions,
}

impl SeaRouter {
    /// Build a router over `network`.
    ///
    /// Without a rule configuration only the `default` profile exists.
    pub fn new(
        network: Network,
        rules: Option<&PassageRuleConfig>,
        options: RouterOptions,
    ) -> Result<Self> {
        Self::build(network, None, rules, options)
    }

    /// Build a router that reuses a previously compiled graph.
    ///
    /// The graph must have been compiled from the triplicated `network`,
    /// otherwise construction fails with [`Error::GraphArtifactLoad`]. Its
    /// tolerance replaces `options.tolerance`.
    pub fn with_graph(
        network: Network,
        graph: RoutingGraph,
        rules: Option<&PassageRuleConfig>,
        options: RouterOptions,
    ) -> Result<Self> {
        Self::build(network, Some(graph), rules, options)
    }

    fn build(
        network: Network,
        graph: Option<RoutingGraph>,
        rules: Option<&PassageRuleConfig>,
        mut options: RouterOptions,
    ) -> Result<Self> {
        let mut stage = RouterStage::Uninitialized;
        validate_multiplier(options.restricted_multiplier)?;
        let classes = resolve_classes(rules, options.classes.as_deref())?;

        let index = CoordinateIndex::from_network(&network);
        advance(&mut stage, RouterStage::IndexBuilt);

        let triplicated = triplicate(&network);
        let graph = match graph {
            Some(graph) => {
                if !graph.matches(&triplicated) {
                    return Err(Error::GraphArtifactLoad {
                        path: graph.source().map(Path::to_path_buf).unwrap_or_default(),
                        message: "graph was compiled from a different network".to_string(),
                    });
                }
                if graph.tolerance() != options.tolerance {
                    warn!(
                        requested = options.tolerance,
                        graph = graph.tolerance(),
                        "using tolerance of the precompiled graph"
                    );
                    options.tolerance = graph.tolerance();
                }
                graph
            }
            None => RoutingGraph::compile(&triplicated, options.tolerance)?,
        };
        let graph = Arc::new(graph);
        advance(&mut stage, RouterStage::NetworkTriplicated);

        let default_fn = default_weight_fn(haversine_distance);
        let mut profiles = vec![Profile {
            name: DEFAULT_PROFILE.to_string(),
            class: None,
            rules: None,
            engine: Arc::new(DijkstraEngine::new(Arc::clone(&graph), &default_fn)),
            weight_fn: default_fn,
        }];

        let mut unmatched = Vec::new();
        let effective = match (rules, classes) {
            (Some(config), Some(classes)) => {
                let effective = compute_effective_status(config, &classes)?;
                let class_rules = collect_class_edge_rules(&effective, &classes);
                unmatched = unmatched_passage_features(&effective, &network);
                for class in classes {
                    let weight_fn = make_weight_fn(
                        &class,
                        &class_rules,
                        options.restricted_multiplier,
                        haversine_distance,
                    )?;
                    let engine = DijkstraEngine::new(Arc::clone(&graph), &weight_fn);
                    debug!(
                        profile = %class,
                        usable_edges = engine.usable_edge_count(),
                        "built profile"
                    );
                    profiles.push(Profile {
                        name: class.name().to_string(),
                        rules: class_rules.get(&class).cloned(),
                        class: Some(class),
                        weight_fn,
                        engine: Arc::new(engine),
                    });
                }
                Some(Arc::new(effective))
            }
            _ => None,
        };
        advance(&mut stage, RouterStage::ProfilesBuilt);

        let router = Self {
            network: Arc::new(triplicated),
            index: Arc::new(index),
            graph,
            effective,
            unmatched,
            profiles,
            options,
        };
        advance(&mut stage, RouterStage::Ready);
        info!(
            features = router.network.len(),
            vertices = router.graph.vertex_count(),
            profiles = router.profiles.len(),
            "sea router ready"
        );
        Ok(router)
    }

    /// Profile names, `default` first, then vessel classes in declaration order.
    pub fn profiles(&self) -> Vec<&str> {
        self.profiles.iter().map(|p| p.name.as_str()).collect()
    }

    /// Vessel class behind a profile (`None` for `default`).
    pub fn profile_class(&self, name: &str) -> Result<Option<&VesselClass>> {
        Ok(self.profile(name)?.class.as_ref())
    }

    /// Forbidden and restricted feature ids of a profile (`None` for `default`).
    pub fn profile_rules(&self, name: &str) -> Result<Option<&EdgeRules>> {
        Ok(self.profile(name)?.rules.as_ref())
    }

    /// Weight function of a profile.
    pub fn weight_fn(&self, name: &str) -> Result<WeightFn> {
        Ok(Arc::clone(&self.profile(name)?.weight_fn))
    }

    /// Triplicated network the graph was compiled from.
    pub fn network(&self) -> &Network {
        &self.network
    }

    pub fn graph(&self) -> &RoutingGraph {
        &self.graph
    }

    /// Passage statuses the profiles were built from (`None` without rules).
    pub fn effective_status(&self) -> Option<&EffectiveStatus> {
        self.effective.as_deref()
    }

    /// Passage feature ids that matched no network feature, or several.
    pub fn unmatched_passage_features(&self) -> &[UnmatchedFeature] {
        &self.unmatched
    }

    pub fn options(&self) -> &RouterOptions {
        &self.options
    }

    /// Snap a raw position onto the nearest vertex of the original network.
    pub fn snap(&self, position: &[f64]) -> Result<Option<Coordinate>> {
        self.index.snap_to_nearest_vertex(position)
    }

    /// Shortest path between two network vertices.
    ///
    /// Returns `Ok(None)` when no path exists (including when either point is
    /// not a network vertex).
    pub fn shortest_path(
        &self,
        a: Coordinate,
        b: Coordinate,
        options: &RouteOptions,
    ) -> Result<Option<RouteResult>> {
        let profile = self.profile(&options.profile)?;
        for point in [a, b] {
            if Coordinate::from_position(&[point.lon, point.lat]).is_none() {
                return Err(Error::MalformedCoordinate {
                    input: point.to_string(),
                });
            }
        }

        let (start, goal) = normalize_pair(a, b);
        debug!(
            profile = %profile.name,
            from = %start,
            to = %goal,
            "routing"
        );

        let Some(found) = profile.engine.find_path(start, goal) else {
            debug!(profile = %profile.name, "no path found");
            return Ok(None);
        };

        let distance_km = round_to(found.weight / 1000.0, 3);
        let unwrapped = unwrap_path(&found.path);
        let path = options.want_path.then(|| {
            if options.split_antimeridian {
                let parts = split_at_antimeridian(&unwrapped);
                if parts.len() > 1 {
                    return RoutePath::MultiLine(parts);
                }
            }
            RoutePath::Line(unwrapped.clone())
        });

        Ok(Some(RouteResult {
            profile: profile.name.clone(),
            from: a,
            to: b,
            distance_km,
            distance_nm: round_to(distance_km * KM_TO_NM, 2),
            length_km: round_to(path_length(&found.path) / 1000.0, 3),
            vertex_count: found.path.len(),
            path,
        }))
    }

    /// Snap both raw positions onto the network, then route between them.
    pub fn shortest_route(
        &self,
        a: &[f64],
        b: &[f64],
        options: &RouteOptions,
    ) -> Result<Option<RouteResult>> {
        self.profile(&options.profile)?;
        let start = self.snap_endpoint(a)?;
        let goal = self.snap_endpoint(b)?;
        self.shortest_path(start, goal, options)
    }

    fn snap_endpoint(&self, position: &[f64]) -> Result<Coordinate> {
        if Coordinate::from_position(position).is_none() {
            return Err(Error::MalformedCoordinate {
                input: format!("{position:?}"),
            });
        }
        self.snap(position)?
            .ok_or_else(|| Error::UnsnappablePoint {
                input: format!("{position:?}"),
            })
    }

    fn profile(&self, name: &str) -> Result<&Profile> {
        self.profiles
            .iter()
            .find(|profile| profile.name == name)
            .ok_or_else(|| {
                let available: Vec<String> =
                    self.profiles().into_iter().map(String::from).collect();
                Error::UnknownProfile {
                    name: name.to_string(),
                    suggestions: fuzzy_matches(name, available.iter().map(String::as_str), 3),
                    available,
                }
            })
    }
}

impl fmt::Debug for SeaRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SeaRouter")
            .field("index", &self.index)
            .field("graph", &self.graph)
            .field("profiles", &self.profiles())
            .field("options", &self.options)
            .finish()
    }
}

fn advance(stage: &mut RouterStage, next: RouterStage) {
    debug_assert!(next > *stage, "router stage {next:?} after {stage:?}");
    debug!(from = ?stage, to = ?next, "sea router stage");
    *stage = next;
}

/// Vessel classes to build profiles for, or `None` when no rules were given.
fn resolve_classes(
    rules: Option<&PassageRuleConfig>,
    requested: Option<&[String]>,
) -> Result<Option<Vec<VesselClass>>> {
    match (rules, requested) {
        (None, None) => Ok(None),
        (None, Some(_)) => Err(Error::InvalidOption {
            option: "classes",
            message: "vessel classes require a passage rule configuration".to_string(),
        }),
        (Some(config), None) => Ok(Some(config.vessel_classes())),
        (Some(config), Some(names)) => {
            let classes = names
                .iter()
                .map(|name| config.vessel_class(name))
                .collect::<Result<Vec<_>>>()?;
            Ok(Some(classes))
        }
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
