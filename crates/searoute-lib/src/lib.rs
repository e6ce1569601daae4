//! Maritime shortest-route weighting and antimeridian geometry.
//!
//! This crate loads a shipping-lane network, triplicates it across the date
//! line, evaluates vessel-class passage rules into per-profile edge weights and
//! answers point-to-point route queries. Higher-level consumers (the CLI) should
//! only depend on the items exported here.
//!

#![deny(warnings)]

pub mod antimeridian;
pub mod error;
pub mod geodesy;
pub mod graph;
pub mod network;
pub mod output;
pub mod path;
pub mod router;
pub mod rules;
pub mod spatial;
pub mod weight;

pub use antimeridian::{normalize_pair, split_at_antimeridian, triplicate, unwrap_path, wrap_longitude};
pub use error::{Error, ErrorKind, Result};
pub use geodesy::{haversine_distance, path_length, Coordinate, DistanceFn, EARTH_RADIUS_M};
pub use graph::{RoutingGraph, DEFAULT_TOLERANCE};
pub use network::{normalize_fid, FeatureId, Network, NetworkFeature, WrapShift};
pub use output::{render_profiles, ProfileSummary, RouteRenderMode};
pub use path::{DijkstraEngine, PathEngine, PathResult};
pub use router::{
    RouteOptions, RoutePath, RouteResult, RouterOptions, RouterStage, SeaRouter,
    DEFAULT_PROFILE, DEFAULT_RESTRICTED_MULTIPLIER, KM_TO_NM,
};
pub use rules::{
    collect_class_edge_rules, compute_effective_status, unmatched_passage_features, ClassRules,
    EdgeRules, EffectivePassage, EffectiveStatus, PassageRule, PassageRuleConfig, PassageStatus,
    RuleOverride, UnmatchedFeature, VesselClass,
};
pub use spatial::CoordinateIndex;
pub use weight::{default_weight_fn, make_weight_fn, EdgeData, WeightFn};
