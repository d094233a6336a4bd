//! Topology-preserving simplification
//!
//! Plain Douglas-Peucker visibly corrupts polygons at render scale
//! (self-intersections, collapsed rings), so the pipeline only offers
//! the topology-preserving Visvalingam variant.

use geo::SimplifyVwPreserve;
use geo_types::{Geometry, GeometryCollection};

/// Simplify a geometry with a distance tolerance, preserving topology.
///
/// Point-dimension geometry passes through untouched; collections are
/// simplified per member.
pub fn simplify_preserving(geom: &Geometry<f64>, distance_tolerance: f64) -> Geometry<f64> {
    // The preserving simplifier takes an effective-area epsilon, not a
    // distance; a deviation of d over a span of ~d sweeps ~d² of area.
    let epsilon = distance_tolerance * distance_tolerance;
    simplify_with_epsilon(geom, epsilon)
}

fn simplify_with_epsilon(geom: &Geometry<f64>, epsilon: f64) -> Geometry<f64> {
    match geom {
        Geometry::LineString(ls) => Geometry::LineString(ls.simplify_vw_preserve(&epsilon)),
        Geometry::MultiLineString(mls) => {
            Geometry::MultiLineString(mls.simplify_vw_preserve(&epsilon))
        }
        Geometry::Polygon(p) => Geometry::Polygon(p.simplify_vw_preserve(&epsilon)),
        Geometry::MultiPolygon(mp) => Geometry::MultiPolygon(mp.simplify_vw_preserve(&epsilon)),
        Geometry::GeometryCollection(gc) => {
            let members = gc
                .0
                .iter()
                .map(|g| simplify_with_epsilon(g, epsilon))
                .collect();
            Geometry::GeometryCollection(GeometryCollection::new_from(members))
        }
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::{line_string, polygon, Point};

    fn zigzag() -> Geometry<f64> {
        Geometry::LineString(line_string![
            (x: 0.0, y: 0.0),
            (x: 1.0, y: 0.01),
            (x: 2.0, y: 0.0),
            (x: 3.0, y: -0.01),
            (x: 4.0, y: 0.0),
            (x: 5.0, y: 0.0),
            (x: 10.0, y: 0.0),
        ])
    }

    #[test]
    fn test_reduces_vertices() {
        let simplified = simplify_preserving(&zigzag(), 0.5);
        if let Geometry::LineString(ls) = simplified {
            assert!(ls.0.len() < 7, "should drop near-collinear vertices");
            assert_eq!(ls.0.first().unwrap().x, 0.0);
            assert_eq!(ls.0.last().unwrap().x, 10.0);
        } else {
            panic!("expected LineString");
        }
    }

    #[test]
    fn test_point_passes_through() {
        let point = Geometry::Point(Point::new(1.0, 2.0));
        let result = simplify_preserving(&point, 100.0);
        assert_eq!(result, point);
    }

    #[test]
    fn test_polygon_ring_survives_large_tolerance() {
        // Topology preservation: the ring must not collapse even when the
        // tolerance dwarfs the polygon.
        let poly: Geometry<f64> = polygon![
            (x: 0.0, y: 0.0),
            (x: 4.0, y: 0.0),
            (x: 4.0, y: 4.0),
            (x: 0.0, y: 4.0),
        ]
        .into();
        let result = simplify_preserving(&poly, 1000.0);
        if let Geometry::Polygon(p) = result {
            assert!(p.exterior().0.len() >= 4, "ring must stay closed and 2-D");
        } else {
            panic!("expected Polygon");
        }
    }

    #[test]
    fn test_collection_simplifies_members() {
        let gc = Geometry::GeometryCollection(GeometryCollection::new_from(vec![
            zigzag(),
            Geometry::Point(Point::new(1.0, 1.0)),
        ]));
        if let Geometry::GeometryCollection(out) = simplify_preserving(&gc, 0.5) {
            assert_eq!(out.0.len(), 2);
            if let Geometry::LineString(ls) = &out.0[0] {
                assert!(ls.0.len() < 7);
            } else {
                panic!("expected LineString member");
            }
        } else {
            panic!("expected GeometryCollection");
        }
    }
}
