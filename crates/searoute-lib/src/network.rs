//! Shipping-lane network loaded from GeoJSON.
//!
//! Each feature keeps its geometry as a [`geojson::Value`] so any geometry type
//! survives triplication, but only `LineString` and `MultiLineString` features
//! become routable edges.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use geojson::{feature::Id, Feature, FeatureCollection, GeoJson, Value};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::geodesy::{path_length, Coordinate};

/// Logical feature identifier referenced by passage rules.
pub type FeatureId = i64;

/// Longitude band a feature copy belongs to after triplication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum WrapShift {
    /// Copy shifted by −360°.
    West,
    /// The original feature.
    Center,
    /// Copy shifted by +360°.
    East,
}

impl WrapShift {
    /// Every shift in triplication order.
    pub const ALL: [WrapShift; 3] = [WrapShift::West, WrapShift::Center, WrapShift::East];

    /// Longitude offset in degrees.
    pub fn offset(self) -> f64 {
        match self {
            WrapShift::West => -360.0,
            WrapShift::Center => 0.0,
            WrapShift::East => 360.0,
        }
    }
}

/// A single network feature.
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkFeature {
    /// Sequential identifier: position in the feature list (triplication renumbers copies).
    pub id: usize,
    /// Logical feature identifier, shared by all triplicated copies.
    pub fid: Option<FeatureId>,
    pub geometry: Value,
    /// Geodesic length of the feature in meters.
    pub cost: f64,
    pub wrap_shift: WrapShift,
}

impl NetworkFeature {
    /// Create a feature from a geometry, computing its geodesic cost.
    pub fn new(id: usize, fid: Option<FeatureId>, geometry: Value) -> Self {
        let cost = geometry_length(&geometry);
        Self {
            id,
            fid,
            geometry,
            cost,
            wrap_shift: WrapShift::Center,
        }
    }

    /// Convenience constructor for a line feature.
    pub fn line(id: usize, fid: Option<FeatureId>, coords: &[Coordinate]) -> Self {
        let positions = coords.iter().map(|c| c.to_position()).collect();
        Self::new(id, fid, Value::LineString(positions))
    }

    /// Routable polylines of this feature (one per line part).
    pub fn lines(&self) -> Vec<Vec<Coordinate>> {
        match &self.geometry {
            Value::LineString(line) => vec![to_coordinates(line)],
            Value::MultiLineString(lines) => lines.iter().map(|l| to_coordinates(l)).collect(),
            _ => Vec::new(),
        }
    }
}

/// In-memory shipping-lane network.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Network {
    pub features: Vec<NetworkFeature>,
}

impl Network {
    pub fn new(features: Vec<NetworkFeature>) -> Self {
        Self { features }
    }

    /// Read a GeoJSON network file.
    pub fn load(path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "loading network");
        let content = fs::read_to_string(path)?;
        Self::from_geojson_str(&content)
    }

    /// Parse a GeoJSON `FeatureCollection` (a lone `Feature` is also accepted).
    pub fn from_geojson_str(content: &str) -> Result<Self> {
        let geojson: GeoJson = content.parse()?;
        match geojson {
            GeoJson::FeatureCollection(collection) => Ok(Self::from_feature_collection(collection)),
            GeoJson::Feature(feature) => Ok(Self::from_features(vec![feature])),
            GeoJson::Geometry(_) => Err(Error::InvalidNetwork {
                message: "expected a FeatureCollection, found a bare geometry".to_string(),
            }),
        }
    }

    pub fn from_feature_collection(collection: FeatureCollection) -> Self {
        Self::from_features(collection.features)
    }

    fn from_features(features: Vec<Feature>) -> Self {
        let mut skipped = 0usize;
        let mut loaded = Vec::with_capacity(features.len());

        for feature in features {
            let fid = feature_fid(&feature);
            let Some(geometry) = feature.geometry else {
                skipped += 1;
                continue;
            };
            loaded.push(NetworkFeature::new(loaded.len(), fid, geometry.value));
        }

        if skipped > 0 {
            warn!(skipped, "ignored network features without geometry");
        }

        Self { features: loaded }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Every coordinate of every feature, in feature order, duplicates included.
    ///
    /// Malformed positions are skipped.
    pub fn vertices(&self) -> Vec<Coordinate> {
        let mut vertices = Vec::new();
        for feature in &self.features {
            for_each_position(&feature.geometry, &mut |position| {
                if let Some(coordinate) = Coordinate::from_position(position) {
                    vertices.push(coordinate);
                }
            });
        }
        vertices
    }

    /// Look up the original feature carrying a logical identifier.
    pub fn feature_by_fid(&self, fid: FeatureId) -> Option<&NetworkFeature> {
        self.features.iter().find(|feature| feature.fid == Some(fid))
    }

    /// Number of features carrying each logical identifier.
    pub fn fid_counts(&self) -> HashMap<FeatureId, usize> {
        let mut counts = HashMap::new();
        for fid in self.features.iter().filter_map(|feature| feature.fid) {
            *counts.entry(fid).or_insert(0) += 1;
        }
        counts
    }

    /// SHA-256 over the ordered feature ids and positions.
    ///
    /// Two networks with the same fingerprint compile to the same routing graph.
    pub fn fingerprint(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update((self.features.len() as u64).to_le_bytes());
        for feature in &self.features {
            match feature.fid {
                Some(fid) => {
                    hasher.update([1u8]);
                    hasher.update(fid.to_le_bytes());
                }
                None => hasher.update([0u8]),
            }
            let mut positions = 0u64;
            for_each_position(&feature.geometry, &mut |position| {
                positions += 1;
                for ordinate in position {
                    hasher.update(ordinate.to_le_bytes());
                }
            });
            hasher.update(positions.to_le_bytes());
        }
        hasher.finalize().into()
    }
}

/// Normalize a JSON value into a feature identifier.
///
/// Integers are taken as-is, finite floats and numeric strings are truncated
/// toward zero; anything else means "no identifier".
pub fn normalize_fid(value: &serde_json::Value) -> Option<FeatureId> {
    match value {
        serde_json::Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().and_then(truncate_finite)),
        serde_json::Value::String(text) => {
            let text = text.trim();
            text.parse::<i64>()
                .ok()
                .or_else(|| text.parse::<f64>().ok().and_then(truncate_finite))
        }
        _ => None,
    }
}

fn truncate_finite(value: f64) -> Option<FeatureId> {
    if value.is_finite() && value.abs() < i64::MAX as f64 {
        Some(value.trunc() as FeatureId)
    } else {
        None
    }
}

fn feature_fid(feature: &Feature) -> Option<FeatureId> {
    if let Some(value) = feature.property("fid") {
        return normalize_fid(value);
    }
    match feature.id.as_ref()? {
        Id::Number(number) => normalize_fid(&serde_json::Value::Number(number.clone())),
        Id::String(text) => normalize_fid(&serde_json::Value::String(text.clone())),
    }
}

fn to_coordinates(line: &[Vec<f64>]) -> Vec<Coordinate> {
    line.iter()
        .filter_map(|position| Coordinate::from_position(position))
        .collect()
}

fn geometry_length(geometry: &Value) -> f64 {
    match geometry {
        Value::LineString(line) => path_length(&to_coordinates(line)),
        Value::MultiLineString(lines) => lines
            .iter()
            .map(|line| path_length(&to_coordinates(line)))
            .sum(),
        _ => 0.0,
    }
}

/// Visit every position of a geometry, whatever its nesting depth.
pub(crate) fn for_each_position(value: &Value, visit: &mut impl FnMut(&[f64])) {
    match value {
        Value::Point(position) => visit(position.as_slice()),
        Value::MultiPoint(positions) | Value::LineString(positions) => {
            positions.iter().for_each(|p| visit(p.as_slice()));
        }
        Value::MultiLineString(lines) | Value::Polygon(lines) => {
            lines.iter().flatten().for_each(|p| visit(p.as_slice()));
        }
        Value::MultiPolygon(polygons) => {
            polygons
                .iter()
                .flatten()
                .flatten()
                .for_each(|p| visit(p.as_slice()));
        }
        Value::GeometryCollection(geometries) => {
            for geometry in geometries {
                for_each_position(&geometry.value, visit);
            }
        }
    }
}

/// Mutate every position of a geometry, whatever its nesting depth.
pub(crate) fn for_each_position_mut(value: &mut Value, visit: &mut impl FnMut(&mut Vec<f64>)) {
    match value {
        Value::Point(position) => visit(position),
        Value::MultiPoint(positions) | Value::LineString(positions) => {
            positions.iter_mut().for_each(|p| visit(p));
        }
        Value::MultiLineString(lines) | Value::Polygon(lines) => {
            lines.iter_mut().flatten().for_each(|p| visit(p));
        }
        Value::MultiPolygon(polygons) => {
            polygons
                .iter_mut()
                .flatten()
                .flatten()
                .for_each(|p| visit(p));
        }
        Value::GeometryCollection(geometries) => {
            for geometry in geometries {
                for_each_position_mut(&mut geometry.value, visit);
            }
        }
    }
}
