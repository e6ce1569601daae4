//! Static KD-tree over network vertices used to snap route endpoints.
//!
//! Route endpoints supplied by callers rarely lie exactly on a network vertex,
//! while the search structure only knows the vertices it was built from. The
//! [`CoordinateIndex`] maps an arbitrary position onto the nearest vertex of the
//! original (non-triplicated) network.
//!
//! # Overview
//!
//! - Every coordinate of every feature is indexed, at any nesting depth.
//!   Duplicates are kept in their original positions.
//! - Distances are planar in degree space (k=2), matching the behaviour callers
//!   expect from a bounding-box index over raw lon/lat.
//! - An empty network produces an empty index; queries then return `None`.
//!
//! # Example
//!
//! ```no_run
//! use searoute_lib::{CoordinateIndex, Network};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let network = Network::load(std::path::Path::new("network.geojson"))?;
//! let index = CoordinateIndex::from_network(&network);
//! let snapped = index.snap_to_nearest_vertex(&[13.5, 43.6])?;
//! # Ok(())
//! # }
//! ```

use kiddo::immutable::float::kdtree::ImmutableKdTree;
use kiddo::SquaredEuclidean;
use tracing::info;

use crate::error::{Error, Result};
use crate::geodesy::Coordinate;
use crate::network::Network;

/// KD-tree bucket size (kiddo default).
const BUCKET_SIZE: usize = 32;

type VertexTree = ImmutableKdTree<f64, u64, 2, BUCKET_SIZE>;

struct BuiltIndex {
    /// `None` when the network had no vertices.
    tree: Option<VertexTree>,
    vertices: Vec<Coordinate>,
}

/// Nearest-vertex lookup over all network vertices.
#[derive(Default)]
pub struct CoordinateIndex {
    built: Option<BuiltIndex>,
}

impl CoordinateIndex {
    /// Create an index that has not been built yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index over every vertex of `network`.
    pub fn from_network(network: &Network) -> Self {
        let mut index = Self::new();
        index.build(network);
        index
    }

    /// (Re)build the index from every vertex of `network`.
    pub fn build(&mut self, network: &Network) {
        let vertices = network.vertices();
        let tree = if vertices.is_empty() {
            None
        } else {
            let points: Vec<[f64; 2]> = vertices.iter().map(|c| [c.lon, c.lat]).collect();
            Some(VertexTree::new_from_slice(&points))
        };

        info!(
            vertex_count = vertices.len(),
            feature_count = network.len(),
            "built coordinate index"
        );

        self.built = Some(BuiltIndex { tree, vertices });
    }

    /// Whether [`build`](Self::build) has been called.
    pub fn is_built(&self) -> bool {
        self.built.is_some()
    }

    /// Number of indexed vertices (zero before the index is built).
    pub fn len(&self) -> usize {
        self.built.as_ref().map_or(0, |built| built.vertices.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snap a raw GeoJSON position onto the nearest network vertex.
    ///
    /// Returns `Ok(None)` when the position is malformed (fewer than two finite
    /// ordinates) or the index holds no vertices, and
    /// [`Error::IndexNotBuilt`] when called before [`build`](Self::build).
    pub fn snap_to_nearest_vertex(&self, position: &[f64]) -> Result<Option<Coordinate>> {
        let built = self.built.as_ref().ok_or(Error::IndexNotBuilt)?;
        let Some(point) = Coordinate::from_position(position) else {
            return Ok(None);
        };
        Ok(built.nearest_one(point))
    }
}

impl BuiltIndex {
    fn nearest_one(&self, point: Coordinate) -> Option<Coordinate> {
        let tree = self.tree.as_ref()?;
        let neighbour = tree.nearest_one::<SquaredEuclidean>(&[point.lon, point.lat]);
        self.vertices.get(neighbour.item as usize).copied()
    }
}

impl std::fmt::Debug for CoordinateIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoordinateIndex")
            .field("built", &self.is_built())
            .field("vertex_count", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::NetworkFeature;

    fn grid_network() -> Network {
        Network::new(vec![
            NetworkFeature::line(
                0,
                Some(1),
                &[Coordinate::new(0.0, 0.0), Coordinate::new(10.0, 0.0)],
            ),
            NetworkFeature::line(
                1,
                Some(2),
                &[Coordinate::new(10.0, 0.0), Coordinate::new(10.0, 10.0)],
            ),
        ])
    }

    #[test]
    fn snaps_to_nearest_vertex() {
        let index = CoordinateIndex::from_network(&grid_network());
        assert_eq!(index.len(), 4);

        let snapped = index
            .snap_to_nearest_vertex(&[9.0, 8.5])
            .expect("index built");
        assert_eq!(snapped, Some(Coordinate::new(10.0, 10.0)));

        let snapped = index
            .snap_to_nearest_vertex(&[1.0, -1.0, 100.0])
            .expect("index built");
        assert_eq!(snapped, Some(Coordinate::new(0.0, 0.0)));
    }

    #[test]
    fn malformed_point_snaps_to_none() {
        let index = CoordinateIndex::from_network(&grid_network());
        assert_eq!(index.snap_to_nearest_vertex(&[1.0]).expect("built"), None);
        assert_eq!(
            index
                .snap_to_nearest_vertex(&[f64::NAN, 1.0])
                .expect("built"),
            None
        );
    }

    #[test]
    fn empty_network_snaps_to_none() {
        let index = CoordinateIndex::from_network(&Network::default());
        assert!(index.is_built());
        assert!(index.is_empty());
        assert_eq!(
            index.snap_to_nearest_vertex(&[1.0, 2.0]).expect("built"),
            None
        );
    }

    #[test]
    fn query_before_build_is_an_error() {
        let index = CoordinateIndex::new();
        let error = index
            .snap_to_nearest_vertex(&[1.0, 2.0])
            .expect_err("not built");
        assert!(matches!(error, Error::IndexNotBuilt));
    }
}
