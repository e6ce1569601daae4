//! Antimeridian handling.
//!
//! The routing graph is built over three copies of the network, shifted by
//! −360°, 0° and +360° of longitude, so that a route crossing the date line is an
//! ordinary traversal through neighbouring copies instead of a jump from +180 to
//! −180. Query endpoints are moved into a shared longitude span before the search
//! ([`normalize_pair`]) and result paths are folded back into the standard range
//! afterwards ([`unwrap_path`], [`split_at_antimeridian`]).

use crate::geodesy::Coordinate;
use crate::network::{for_each_position_mut, Network, WrapShift};

/// Emit three copies of every feature, shifted by each [`WrapShift`].
///
/// The result holds exactly `3 × network.len()` features, numbered
/// sequentially: the west band first, then center, then east. Copies keep the
/// logical `fid`; the original feature of copy `id` is `id % network.len()`.
pub fn triplicate(network: &Network) -> Network {
    let mut features = Vec::with_capacity(network.len() * WrapShift::ALL.len());

    for shift in WrapShift::ALL {
        let offset = shift.offset();
        for feature in &network.features {
            let mut copy = feature.clone();
            copy.id = features.len();
            for_each_position_mut(&mut copy.geometry, &mut |position| {
                if let Some(lon) = position.first_mut() {
                    *lon += offset;
                }
            });
            copy.wrap_shift = shift;
            features.push(copy);
        }
    }

    Network::new(features)
}

/// Normalize a longitude into `(-180, 180]`.
pub fn wrap_longitude(lon: f64) -> f64 {
    let wrapped = (lon + 180.0).rem_euclid(360.0) - 180.0;
    if wrapped <= -180.0 {
        wrapped + 360.0
    } else {
        wrapped
    }
}

/// Fold every longitude of a path back into `(-180, 180]`.
pub fn unwrap_path(coords: &[Coordinate]) -> Vec<Coordinate> {
    coords
        .iter()
        .map(|c| Coordinate::new(wrap_longitude(c.lon), c.lat))
        .collect()
}

/// Move a pair of endpoints into a shared, contiguous longitude span.
///
/// When the two longitudes are more than 180° apart the pair is assumed to cross
/// the antimeridian and the point with the smaller longitude is moved east by
/// 360°. This is a local heuristic; it does not prove the resulting span holds
/// the shortest great-circle route.
pub fn normalize_pair(a: Coordinate, b: Coordinate) -> (Coordinate, Coordinate) {
    if (a.lon - b.lon).abs() <= 180.0 {
        return (a, b);
    }

    if a.lon < b.lon {
        (a.shifted(360.0), b)
    } else {
        (a, b.shifted(360.0))
    }
}

/// Cut an unwrapped path into parts that never jump across the date line.
///
/// Wherever two consecutive points are more than 180° of longitude apart the
/// segment is assumed to cross the antimeridian: the crossing latitude is
/// interpolated, the current part is closed on the meridian (±180) and the next
/// part opens on the opposite side. Parts shorter than two points are dropped.
pub fn split_at_antimeridian(coords: &[Coordinate]) -> Vec<Vec<Coordinate>> {
    let mut parts: Vec<Vec<Coordinate>> = Vec::new();
    let mut current: Vec<Coordinate> = Vec::new();

    for (index, &point) in coords.iter().enumerate() {
        if index > 0 {
            let previous = coords[index - 1];
            let delta = point.lon - previous.lon;
            if delta.abs() > 180.0 {
                let (edge, lat) = crossing(previous, point);
                push_distinct(&mut current, Coordinate::new(edge, lat));
                parts.push(std::mem::take(&mut current));
                push_distinct(&mut current, Coordinate::new(-edge, lat));
            }
        }
        push_distinct(&mut current, point);
    }
    parts.push(current);

    parts.retain(|part| part.len() >= 2);
    parts
}

/// Meridian (+180 or −180) on `from`'s side and the latitude where the segment
/// `from → to` meets it.
fn crossing(from: Coordinate, to: Coordinate) -> (f64, f64) {
    let edge = if from.lon >= 0.0 { 180.0 } else { -180.0 };
    let to_lon = if to.lon < from.lon {
        to.lon + 360.0
    } else {
        to.lon - 360.0
    };

    let span = to_lon - from.lon;
    let t = if span == 0.0 {
        0.0
    } else {
        (edge - from.lon) / span
    };
    (edge, from.lat + t * (to.lat - from.lat))
}

fn push_distinct(part: &mut Vec<Coordinate>, point: Coordinate) {
    if part.last() != Some(&point) {
        part.push(point);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::NetworkFeature;
    use geojson::Value;

    fn sample_network() -> Network {
        Network::new(vec![
            NetworkFeature::line(
                0,
                Some(10),
                &[Coordinate::new(170.0, 10.0), Coordinate::new(180.0, 12.0)],
            ),
            NetworkFeature::new(
                1,
                Some(11),
                Value::GeometryCollection(vec![
                    geojson::Geometry::new(Value::Point(vec![1.0, 2.0])),
                    geojson::Geometry::new(Value::MultiPolygon(vec![vec![vec![
                        vec![0.0, 0.0],
                        vec![1.0, 0.0],
                        vec![1.0, 1.0],
                        vec![0.0, 0.0],
                    ]]])),
                ]),
            ),
        ])
    }

    #[test]
    fn triplicate_emits_three_copies_per_feature() {
        let network = sample_network();
        let tripled = triplicate(&network);
        assert_eq!(tripled.len(), 3 * network.len());

        let ids: Vec<usize> = tripled.features.iter().map(|f| f.id).collect();
        assert_eq!(ids, (0..6).collect::<Vec<_>>());

        for original in &network.features {
            let mut shifts: Vec<WrapShift> = tripled
                .features
                .iter()
                .filter(|copy| copy.id % network.len() == original.id)
                .map(|copy| copy.wrap_shift)
                .collect();
            shifts.sort();
            assert_eq!(shifts, WrapShift::ALL.to_vec());
            assert!(tripled
                .features
                .iter()
                .filter(|copy| copy.id % network.len() == original.id)
                .all(|copy| copy.fid == original.fid));
        }
    }

    #[test]
    fn triplicate_shifts_nested_geometries() {
        let tripled = triplicate(&sample_network());
        let east_collection = tripled
            .features
            .iter()
            .find(|f| f.fid == Some(11) && f.wrap_shift == WrapShift::East)
            .expect("east copy");

        let vertices = Network::new(vec![east_collection.clone()]).vertices();
        assert_eq!(vertices[0], Coordinate::new(361.0, 2.0));
        assert!(vertices.iter().all(|c| c.lon >= 360.0));

        let west_line = tripled
            .features
            .iter()
            .find(|f| f.fid == Some(10) && f.wrap_shift == WrapShift::West)
            .expect("west copy");
        assert_eq!(
            west_line.lines()[0],
            vec![Coordinate::new(-190.0, 10.0), Coordinate::new(-180.0, 12.0)]
        );
        assert_eq!(west_line.fid, Some(10));
        assert_eq!(west_line.cost, sample_network().features[0].cost);
    }

    #[test]
    fn triplicate_of_empty_network_is_empty() {
        assert!(triplicate(&Network::default()).is_empty());
    }

    #[test]
    fn wrap_longitude_stays_in_half_open_range() {
        for lon in [-540.0, -360.0, -190.0, -180.0, -0.0, 0.0, 179.9, 180.0, 190.0, 540.0] {
            let wrapped = wrap_longitude(lon);
            assert!(wrapped > -180.0 && wrapped <= 180.0, "{lon} -> {wrapped}");
        }
        assert_eq!(wrap_longitude(190.0), -170.0);
        assert_eq!(wrap_longitude(-190.0), 170.0);
        assert_eq!(wrap_longitude(-180.0), 180.0);
        assert_eq!(wrap_longitude(45.5), 45.5);
    }

    #[test]
    fn unwrap_path_keeps_latitude() {
        let path = unwrap_path(&[Coordinate::new(200.0, -33.0), Coordinate::new(-200.0, 12.0)]);
        assert_eq!(
            path,
            vec![Coordinate::new(-160.0, -33.0), Coordinate::new(160.0, 12.0)]
        );
    }

    #[test]
    fn normalize_pair_shifts_smaller_longitude() {
        let vancouver = Coordinate::new(-123.1203, 49.2705);
        let tianjin = Coordinate::new(117.7006, 38.9847);

        let (a, b) = normalize_pair(vancouver, tianjin);
        assert_eq!(a, Coordinate::new(-123.1203 + 360.0, 49.2705));
        assert_eq!(b, tianjin);

        let (a, b) = normalize_pair(tianjin, vancouver);
        assert_eq!(a, tianjin);
        assert_eq!(b, Coordinate::new(-123.1203 + 360.0, 49.2705));
    }

    #[test]
    fn normalize_pair_leaves_close_pairs_alone() {
        let a = Coordinate::new(13.5029, 43.6214);
        let b = Coordinate::new(20.2621, 39.4982);
        assert_eq!(normalize_pair(a, b), (a, b));

        let edge = (Coordinate::new(-90.0, 0.0), Coordinate::new(90.0, 0.0));
        assert_eq!(normalize_pair(edge.0, edge.1), edge);
    }

    #[test]
    fn split_interpolates_crossing_latitude() {
        let parts = split_at_antimeridian(&[
            Coordinate::new(170.0, 0.0),
            Coordinate::new(-170.0, 10.0),
            Coordinate::new(-160.0, 10.0),
        ]);
        assert_eq!(parts.len(), 2);
        assert_eq!(
            parts[0],
            vec![Coordinate::new(170.0, 0.0), Coordinate::new(180.0, 5.0)]
        );
        assert_eq!(
            parts[1],
            vec![
                Coordinate::new(-180.0, 5.0),
                Coordinate::new(-170.0, 10.0),
                Coordinate::new(-160.0, 10.0),
            ]
        );
    }

    #[test]
    fn split_westbound_crossing() {
        let parts = split_at_antimeridian(&[
            Coordinate::new(-175.0, 20.0),
            Coordinate::new(175.0, 30.0),
        ]);
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].last(), Some(&Coordinate::new(-180.0, 25.0)));
        assert_eq!(parts[1].first(), Some(&Coordinate::new(180.0, 25.0)));
    }

    #[test]
    fn split_on_vertex_at_meridian_does_not_duplicate() {
        let parts = split_at_antimeridian(&[
            Coordinate::new(175.0, 0.0),
            Coordinate::new(180.0, 1.0),
            Coordinate::new(-175.0, 2.0),
        ]);
        assert_eq!(parts.len(), 2);
        assert_eq!(
            parts[0],
            vec![Coordinate::new(175.0, 0.0), Coordinate::new(180.0, 1.0)]
        );
        assert_eq!(
            parts[1],
            vec![Coordinate::new(-180.0, 1.0), Coordinate::new(-175.0, 2.0)]
        );
    }

    #[test]
    fn split_without_crossing_is_single_part() {
        let path = vec![Coordinate::new(10.0, 0.0), Coordinate::new(20.0, 0.0)];
        assert_eq!(split_at_antimeridian(&path), vec![path]);
        assert!(split_at_antimeridian(&[]).is_empty());
    }
}
