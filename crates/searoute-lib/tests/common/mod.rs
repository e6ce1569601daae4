#![allow(dead_code)]

use std::path::PathBuf;

use searoute_lib::{
    haversine_distance, Coordinate, Network, PassageRuleConfig, RouterOptions, SeaRouter,
};

pub const ANCONA: Coordinate = Coordinate::new(13.5029, 43.6214);
pub const IGOUMENITSA: Coordinate = Coordinate::new(20.2621, 39.4982);
pub const BAB_EL_MANDEB: Coordinate = Coordinate::new(43.3, 12.6);
pub const SUEZ_SOUTH: Coordinate = Coordinate::new(32.55, 29.95);
pub const VANCOUVER: Coordinate = Coordinate::new(-123.1203, 49.2705);
pub const TIANJIN: Coordinate = Coordinate::new(117.7006, 38.9847);

pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../docs/fixtures")
}

pub fn network() -> Network {
    Network::load(&fixtures_dir().join("sample_network.geojson")).expect("fixture network loads")
}

pub fn rules() -> PassageRuleConfig {
    PassageRuleConfig::load(&fixtures_dir().join("passages.json")).expect("fixture rules load")
}

pub fn router() -> SeaRouter {
    SeaRouter::new(network(), Some(&rules()), RouterOptions::default()).expect("router builds")
}

/// Kilometers charged for walking `coords` with unpenalized edges.
pub fn expected_km(coords: &[Coordinate]) -> f64 {
    let meters: f64 = coords
        .windows(2)
        .map(|pair| haversine_distance(pair[0], pair[1]).trunc())
        .sum();
    meters.round() / 1000.0
}
