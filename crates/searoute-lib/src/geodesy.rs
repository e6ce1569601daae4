//! Great-circle distance on a spherical Earth.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Mean Earth radius in meters used by the haversine formula.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Distance function signature accepted by the weight-function factory.
pub type DistanceFn = fn(Coordinate, Coordinate) -> f64;

/// WGS-84 position in degrees, stored as `(longitude, latitude)`.
///
/// Longitudes outside `[-180, 180]` are valid while a route is being computed
/// against the triplicated network; they are normalized before being handed
/// back to callers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lon: f64,
    pub lat: f64,
}

impl Coordinate {
    pub const fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// Extract a coordinate from a GeoJSON position (`[lon, lat, ...]`).
    ///
    /// Returns `None` when fewer than two ordinates are present or either
    /// ordinate is not finite. Altitude is ignored.
    pub fn from_position(position: &[f64]) -> Option<Self> {
        match position {
            [lon, lat, ..] if lon.is_finite() && lat.is_finite() => Some(Self::new(*lon, *lat)),
            _ => None,
        }
    }

    /// Convert back into a GeoJSON position.
    pub fn to_position(self) -> Vec<f64> {
        vec![self.lon, self.lat]
    }

    /// Same position with the longitude moved by `offset` degrees.
    pub fn shifted(self, offset: f64) -> Self {
        Self::new(self.lon + offset, self.lat)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.lon, self.lat)
    }
}

impl FromStr for Coordinate {
    type Err = Error;

    /// Parse `"lon,lat"` (whitespace around either value is allowed).
    fn from_str(s: &str) -> Result<Self> {
        let malformed = || Error::MalformedCoordinate {
            input: s.to_string(),
        };

        let mut parts = s.split(',').map(str::trim);
        let (Some(lon), Some(lat), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(malformed());
        };
        let lon: f64 = lon.parse().map_err(|_| malformed())?;
        let lat: f64 = lat.parse().map_err(|_| malformed())?;

        Coordinate::from_position(&[lon, lat]).ok_or_else(malformed)
    }
}

/// Haversine great-circle distance in meters.
///
/// Symmetric and non-negative; exactly zero when both coordinates are equal.
pub fn haversine_distance(a: Coordinate, b: Coordinate) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let delta_lat = (b.lat - a.lat).to_radians();
    let delta_lon = (b.lon - a.lon).to_radians();

    let h = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().min(1.0).asin();

    EARTH_RADIUS_M * c
}

/// Total haversine length of a polyline in meters.
pub fn path_length(coords: &[Coordinate]) -> f64 {
    coords
        .windows(2)
        .map(|pair| haversine_distance(pair[0], pair[1]))
        .sum()
}
