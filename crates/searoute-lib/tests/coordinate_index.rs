mod common;

use common::*;
use searoute_lib::{Coordinate, CoordinateIndex, Error, Network};

#[test]
fn fixture_index_covers_every_vertex() {
    let network = network();
    let index = CoordinateIndex::from_network(&network);
    assert_eq!(index.len(), network.vertices().len());
    assert!(!index.is_empty());
}

#[test]
fn snaps_to_closest_port() {
    let index = CoordinateIndex::from_network(&network());
    assert_eq!(
        index.snap_to_nearest_vertex(&[117.9, 39.1]).unwrap(),
        Some(TIANJIN)
    );
    assert_eq!(
        index.snap_to_nearest_vertex(&[-179.9, 45.2]).unwrap(),
        Some(Coordinate::new(-180.0, 45.0))
    );
}

#[test]
fn lifecycle_errors() {
    let mut index = CoordinateIndex::new();
    assert!(matches!(
        index.snap_to_nearest_vertex(&[0.0, 0.0]),
        Err(Error::IndexNotBuilt)
    ));

    index.build(&Network::default());
    assert_eq!(index.snap_to_nearest_vertex(&[0.0, 0.0]).unwrap(), None);

    index.build(&network());
    assert_eq!(index.snap_to_nearest_vertex(&[]).unwrap(), None);
    assert!(index.snap_to_nearest_vertex(&[0.0, 0.0]).unwrap().is_some());
}
