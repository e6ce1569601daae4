//! Per-profile edge weight functions.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::geodesy::{Coordinate, DistanceFn};
use crate::network::{FeatureId, WrapShift};
use crate::rules::{ClassRules, VesselClass};

/// Metadata the weight function sees for an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeData {
    /// Logical feature identifier, `None` when the feature carries no usable id.
    pub fid: Option<FeatureId>,
    /// Sequential id of the feature the edge belongs to.
    pub feature: usize,
    pub wrap_shift: WrapShift,
}

/// Edge weight in meters; `f64::INFINITY` excludes the edge.
pub type WeightFn = Arc<dyn Fn(Coordinate, Coordinate, &EdgeData) -> f64 + Send + Sync>;

/// Weight function that charges the truncated distance of every edge.
pub fn default_weight_fn(distance_fn: DistanceFn) -> WeightFn {
    Arc::new(move |a: Coordinate, b: Coordinate, _edge: &EdgeData| {
        distance_fn(a, b).trunc()
    })
}

/// Build the weight function for one vessel class.
///
/// Forbidden features weigh `+∞`, restricted ones weigh the truncated distance
/// times `restricted_multiplier`, everything else the truncated distance.
pub fn make_weight_fn(
    class: &VesselClass,
    rules: &ClassRules,
    restricted_multiplier: f64,
    distance_fn: DistanceFn,
) -> Result<WeightFn> {
    validate_multiplier(restricted_multiplier)?;

    let edge_rules = rules
        .get(class)
        .cloned()
        .ok_or_else(|| Error::UnknownVesselClass {
            name: class.name().to_string(),
            suggestions: crate::error::fuzzy_matches(
                class.name(),
                rules.keys().map(VesselClass::name),
                3,
            ),
        })?;

    Ok(Arc::new(move |a: Coordinate, b: Coordinate, edge: &EdgeData| {
        let distance = distance_fn(a, b).trunc();
        match edge.fid {
            Some(fid) if edge_rules.forbidden.contains(&fid) => f64::INFINITY,
            Some(fid) if edge_rules.restricted.contains(&fid) => distance * restricted_multiplier,
            _ => distance,
        }
    }))
}

/// The restricted multiplier must be a finite, positive factor.
pub fn validate_multiplier(multiplier: f64) -> Result<()> {
    if multiplier.is_finite() && multiplier > 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidOption {
            option: "restricted_multiplier",
            message: format!("expected a finite positive number, got {multiplier}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geodesy::haversine_distance;
    use crate::rules::{collect_class_edge_rules, compute_effective_status, PassageRuleConfig};

    fn config() -> PassageRuleConfig {
        PassageRuleConfig::from_json_str(
            r#"{
                "default_policy": "allowed",
                "classes": { "panamax": "", "vlcc": "" },
                "passages": {
                    "panama": { "status": { "vlcc": "forbidden" }, "feature_ids": [1] },
                    "malacca": { "status": { "vlcc": "restricted" }, "feature_ids": [2] }
                }
            }"#,
        )
        .expect("valid rules")
    }

    fn class_rules(config: &PassageRuleConfig) -> ClassRules {
        let classes = config.vessel_classes();
        let effective = compute_effective_status(config, &classes).unwrap();
        collect_class_edge_rules(&effective, &classes)
    }

    fn edge(fid: Option<FeatureId>) -> EdgeData {
        EdgeData {
            fid,
            feature: 0,
            wrap_shift: WrapShift::Center,
        }
    }

    const POINTS: [(Coordinate, Coordinate); 3] = [
        (Coordinate::new(0.0, 0.0), Coordinate::new(1.0, 1.0)),
        (Coordinate::new(179.5, 10.0), Coordinate::new(180.5, 10.0)),
        (Coordinate::new(-20.0, 55.0), Coordinate::new(-20.0, 55.0)),
    ];

    #[test]
    fn forbidden_features_are_infinite() {
        let config = config();
        let vlcc = config.vessel_class("vlcc").unwrap();
        let weight = make_weight_fn(&vlcc, &class_rules(&config), 1.5, haversine_distance).unwrap();
        for (a, b) in POINTS {
            assert_eq!(weight(a, b, &edge(Some(1))), f64::INFINITY);
        }
    }

    #[test]
    fn restricted_features_are_multiplied() {
        let config = config();
        let vlcc = config.vessel_class("vlcc").unwrap();
        let weight = make_weight_fn(&vlcc, &class_rules(&config), 2.5, haversine_distance).unwrap();
        for (a, b) in POINTS {
            let expected = haversine_distance(a, b).trunc() * 2.5;
            assert_eq!(weight(a, b, &edge(Some(2))), expected);
        }
    }

    #[test]
    fn other_features_cost_truncated_distance() {
        let config = config();
        let rules = class_rules(&config);
        let panamax = config.vessel_class("panamax").unwrap();
        let weight = make_weight_fn(&panamax, &rules, 1.5, haversine_distance).unwrap();
        let (a, b) = POINTS[0];
        let expected = haversine_distance(a, b).trunc();
        assert_eq!(weight(a, b, &edge(Some(1))), expected);
        assert_eq!(weight(a, b, &edge(Some(2))), expected);
        assert_eq!(weight(a, b, &edge(None)), expected);
        assert_eq!(expected.fract(), 0.0);

        let default = default_weight_fn(haversine_distance);
        assert_eq!(default(a, b, &edge(Some(1))), expected);
    }

    #[test]
    fn class_without_rules_is_rejected() {
        let config = config();
        let panamax = config.vessel_class("panamax").unwrap();
        let rules = ClassRules::new();
        let error = make_weight_fn(&panamax, &rules, 1.5, haversine_distance)
            .err()
            .expect("class has no rules");
        assert!(matches!(error, Error::UnknownVesselClass { .. }));
    }

    #[test]
    fn non_positive_multiplier_is_rejected() {
        let config = config();
        let vlcc = config.vessel_class("vlcc").unwrap();
        let rules = class_rules(&config);
        for multiplier in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let error = make_weight_fn(&vlcc, &rules, multiplier, haversine_distance)
                .err()
                .expect("invalid multiplier");
            assert!(matches!(error, Error::InvalidOption { .. }));
        }
    }
}
