//! Vessel-class passage rules.
//!
//! A passage rule file names the vessel classes, a default policy, and a set of
//! passages (canals, straits, chokepoints) mapped to network feature ids. For
//! every vessel class the engine resolves each passage's effective status and
//! then aggregates the feature ids that class must never use (`forbidden`) or
//! pays a penalty for (`restricted`).
//!
//! Passages are evaluated in the order the configuration declares them. When
//! two passages list the same feature id with different statuses for one class,
//! the later passage wins. Time-windowed `overrides` are parsed and kept, but
//! never applied.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::marker::PhantomData;
use std::path::Path;

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, warn};

use crate::error::{fuzzy_matches, Error, Result};
use crate::network::{FeatureId, Network};

/// Identifier of a passage in the rule file (e.g. `"suez"`).
pub type PassageId = String;

/// Passage status for a vessel class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PassageStatus {
    Allowed,
    Restricted,
    Forbidden,
}

impl fmt::Display for PassageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            PassageStatus::Allowed => "allowed",
            PassageStatus::Restricted => "restricted",
            PassageStatus::Forbidden => "forbidden",
        };
        f.write_str(value)
    }
}

/// A vessel class declared by a [`PassageRuleConfig`].
///
/// Values can only be obtained from a configuration, so holding one means the
/// class was validated against the registry it came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct VesselClass(String);

impl VesselClass {
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VesselClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single passage entry.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PassageRule {
    /// Free-form category such as `canal` or `strait`.
    #[serde(default)]
    pub kind: Option<String>,
    /// Explicit per-class status; classes not listed fall back to the default policy.
    #[serde(default)]
    pub status: BTreeMap<String, PassageStatus>,
    #[serde(default)]
    pub risk_group: Vec<String>,
    #[serde(default)]
    pub feature_ids: Vec<FeatureId>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Conditional rule override. Preserved verbatim; never evaluated.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct RuleOverride(pub serde_json::Value);

/// Parsed passage rule file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PassageRuleConfig {
    #[serde(default)]
    pub version: Option<serde_json::Value>,
    pub default_policy: PassageStatus,
    /// Class name and description, in declaration order.
    #[serde(default, deserialize_with = "ordered_entries")]
    pub classes: Vec<(String, String)>,
    #[serde(default)]
    pub risk_groups: serde_json::Map<String, serde_json::Value>,
    /// Passages in declaration order.
    #[serde(default, deserialize_with = "ordered_entries")]
    pub passages: Vec<(PassageId, PassageRule)>,
    #[serde(default)]
    pub overrides: Vec<RuleOverride>,
}

impl PassageRuleConfig {
    /// Read and validate a rule file.
    pub fn load(path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "loading passage rules");
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Parse and validate a rule document.
    pub fn from_json_str(content: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(content).map_err(|e| Error::InvalidRuleConfig {
                message: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for (name, _) in &self.classes {
            if !seen.insert(name.as_str()) {
                return Err(Error::InvalidRuleConfig {
                    message: format!("vessel class '{name}' is declared twice"),
                });
            }
        }

        let mut passages = HashSet::new();
        for (id, rule) in &self.passages {
            if !passages.insert(id.as_str()) {
                return Err(Error::InvalidRuleConfig {
                    message: format!("passage '{id}' is declared twice"),
                });
            }
            for class in rule.status.keys() {
                if !seen.contains(class.as_str()) {
                    warn!(
                        passage = %id,
                        class = %class,
                        "passage status references an undeclared vessel class; ignoring"
                    );
                }
            }
        }

        if !self.overrides.is_empty() {
            debug!(
                overrides = self.overrides.len(),
                "rule overrides are preserved but not evaluated"
            );
        }

        Ok(())
    }

    /// Resolve a class name against the declared classes.
    pub fn vessel_class(&self, name: &str) -> Result<VesselClass> {
        if self.classes.iter().any(|(declared, _)| declared == name) {
            return Ok(VesselClass(name.to_string()));
        }
        Err(Error::UnknownVesselClass {
            name: name.to_string(),
            suggestions: fuzzy_matches(name, self.class_names(), 3),
        })
    }

    /// Every declared class, in declaration order.
    pub fn vessel_classes(&self) -> Vec<VesselClass> {
        self.class_names()
            .map(|name| VesselClass(name.to_string()))
            .collect()
    }

    pub fn class_names(&self) -> impl Iterator<Item = &str> {
        self.classes.iter().map(|(name, _)| name.as_str())
    }

    pub fn class_description(&self, class: &VesselClass) -> Option<&str> {
        self.classes
            .iter()
            .find(|(name, _)| name == class.name())
            .map(|(_, description)| description.as_str())
    }

    pub fn passage(&self, id: &str) -> Option<&PassageRule> {
        self.passages
            .iter()
            .find(|(passage, _)| passage == id)
            .map(|(_, rule)| rule)
    }
}

/// Effective status of one passage for every evaluated class.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectivePassage {
    pub id: PassageId,
    pub status: BTreeMap<VesselClass, PassageStatus>,
    pub feature_ids: Vec<FeatureId>,
}

/// Passage statuses with defaults filled in, in declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EffectiveStatus {
    pub passages: Vec<EffectivePassage>,
}

impl EffectiveStatus {
    pub fn passage(&self, id: &str) -> Option<&EffectivePassage> {
        self.passages.iter().find(|passage| passage.id == id)
    }

    /// Status of `passage` for `class`, if both were evaluated.
    pub fn status(&self, id: &str, class: &VesselClass) -> Option<PassageStatus> {
        self.passage(id)?.status.get(class).copied()
    }
}

/// Feature ids a class must avoid or is penalized for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EdgeRules {
    pub forbidden: HashSet<FeatureId>,
    pub restricted: HashSet<FeatureId>,
}

impl EdgeRules {
    /// Status a feature resolves to for this class.
    pub fn status_of(&self, fid: FeatureId) -> PassageStatus {
        if self.forbidden.contains(&fid) {
            PassageStatus::Forbidden
        } else if self.restricted.contains(&fid) {
            PassageStatus::Restricted
        } else {
            PassageStatus::Allowed
        }
    }
}

/// Edge rules per vessel class.
pub type ClassRules = BTreeMap<VesselClass, EdgeRules>;

/// Fill in every (passage, class) status, falling back to the default policy.
///
/// Fails with [`Error::EmptyClassList`] when `classes` is empty and
/// [`Error::UnknownVesselClass`] when a class is not declared by `config`.
pub fn compute_effective_status(
    config: &PassageRuleConfig,
    classes: &[VesselClass],
) -> Result<EffectiveStatus> {
    if classes.is_empty() {
        return Err(Error::EmptyClassList);
    }
    for class in classes {
        config.vessel_class(class.name())?;
    }

    let passages = config
        .passages
        .iter()
        .map(|(id, rule)| EffectivePassage {
            id: id.clone(),
            status: classes
                .iter()
                .map(|class| {
                    let status = rule
                        .status
                        .get(class.name())
                        .copied()
                        .unwrap_or(config.default_policy);
                    (class.clone(), status)
                })
                .collect(),
            feature_ids: rule.feature_ids.clone(),
        })
        .collect();

    Ok(EffectiveStatus { passages })
}

/// Aggregate forbidden and restricted feature ids per class.
///
/// Passages are scanned in declaration order. A `forbidden` or `restricted`
/// status moves the passage's feature ids into that set (and out of the other);
/// `allowed` leaves earlier decisions untouched.
pub fn collect_class_edge_rules(
    effective: &EffectiveStatus,
    classes: &[VesselClass],
) -> ClassRules {
    let mut rules: ClassRules = classes
        .iter()
        .map(|class| (class.clone(), EdgeRules::default()))
        .collect();

    for passage in &effective.passages {
        for (class, edge_rules) in rules.iter_mut() {
            match passage.status.get(class) {
                Some(PassageStatus::Forbidden) => {
                    for fid in &passage.feature_ids {
                        edge_rules.restricted.remove(fid);
                        edge_rules.forbidden.insert(*fid);
                    }
                }
                Some(PassageStatus::Restricted) => {
                    for fid in &passage.feature_ids {
                        edge_rules.forbidden.remove(fid);
                        edge_rules.restricted.insert(*fid);
                    }
                }
                Some(PassageStatus::Allowed) | None => {}
            }
        }
    }

    for (class, edge_rules) in &rules {
        debug!(
            class = %class,
            forbidden = edge_rules.forbidden.len(),
            restricted = edge_rules.restricted.len(),
            "collected class edge rules"
        );
    }

    rules
}

/// Passage feature id that does not name exactly one network feature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnmatchedFeature {
    pub passage: PassageId,
    pub fid: FeatureId,
    /// Number of network features carrying `fid` (0, or more than one).
    pub matches: usize,
}

/// Feature ids referenced by passages that match no feature, or several, in
/// the original `network`.
pub fn unmatched_passage_features(
    effective: &EffectiveStatus,
    network: &Network,
) -> Vec<UnmatchedFeature> {
    let counts = network.fid_counts();
    let mut unmatched = Vec::new();
    for passage in &effective.passages {
        for &fid in &passage.feature_ids {
            let matches = counts.get(&fid).copied().unwrap_or(0);
            if matches != 1 {
                warn!(
                    passage = %passage.id,
                    fid,
                    matches,
                    "passage feature id does not match exactly one network feature"
                );
                unmatched.push(UnmatchedFeature {
                    passage: passage.id.clone(),
                    fid,
                    matches,
                });
            }
        }
    }
    unmatched
}

/// Deserialize a JSON object into `(key, value)` pairs, keeping document order.
fn ordered_entries<'de, D, V>(deserializer: D) -> std::result::Result<Vec<(String, V)>, D::Error>
where
    D: Deserializer<'de>,
    V: Deserialize<'de>,
{
    struct EntriesVisitor<V>(PhantomData<V>);

    impl<'de, V: Deserialize<'de>> Visitor<'de> for EntriesVisitor<V> {
        type Value = Vec<(String, V)>;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            formatter.write_str("a JSON object")
        }

        fn visit_map<A>(self, mut map: A) -> std::result::Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some(entry) = map.next_entry::<String, V>()? {
                entries.push(entry);
            }
            Ok(entries)
        }
    }

    deserializer.deserialize_map(EntriesVisitor(PhantomData))
}
