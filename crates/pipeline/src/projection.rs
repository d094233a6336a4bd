//! CRS-specific pre-processing of source geometry
//!
//! Some source/map CRS pairings leave part of the world unprojectable
//! (web mercator has no poles, a UTM zone degrades far from its central
//! meridian). A [`ProjectionHandler`] clips source geometry down to the
//! area where the reprojection is actually defined, before any
//! transform stage touches it.

use crate::clip;
use geo_types::Geometry;
use vectile_core::transform::MERCATOR_MAX_LATITUDE;
use vectile_core::{Crs, Envelope};

/// Valid latitude range of a UTM zone
const UTM_MIN_LATITUDE: f64 = -80.0;
const UTM_MAX_LATITUDE: f64 = 84.0;
/// Degrees of longitude either side of a zone's central meridian within
/// which the transverse-mercator series is still usable
const UTM_LON_TOLERANCE: f64 = 20.0;

/// Pre-clips source geometry to the valid area of the source→map
/// reprojection.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionHandler {
    valid_area: Envelope,
}

impl ProjectionHandler {
    /// The source-CRS area within which reprojection is defined
    pub fn valid_area(&self) -> &Envelope {
        &self.valid_area
    }

    /// Restrict a geometry to the valid area.
    ///
    /// Returns the geometry unchanged when it lies entirely inside,
    /// None when it lies entirely outside, and the clipped geometry
    /// otherwise.
    pub fn pre_process(&self, geom: &Geometry<f64>) -> Option<Geometry<f64>> {
        let env = Envelope::of(geom)?;
        if self.valid_area.contains(&env) {
            return Some(geom.clone());
        }
        if !self.valid_area.intersects(&env) {
            return None;
        }
        clip::clip_remove_degenerate(geom, &self.valid_area)
    }
}

/// Find a handler for rendering `source_crs` data onto a `map_crs` map.
///
/// Only geographic sources need one: projected source data is already
/// confined to its projection's domain. `wrap` widens the valid
/// longitudes by a full world on each side to accept data that has been
/// shifted across the antimeridian; the pipeline itself always requests
/// it disabled.
pub fn find_handler(map_crs: &Crs, source_crs: &Crs, wrap: bool) -> Option<ProjectionHandler> {
    if !source_crs.is_geographic() {
        return None;
    }

    let lon_slack = if wrap { 360.0 } else { 0.0 };

    if map_crs.epsg() == 3857 {
        return Some(ProjectionHandler {
            valid_area: Envelope::new(
                -180.0 - lon_slack,
                -MERCATOR_MAX_LATITUDE,
                180.0 + lon_slack,
                MERCATOR_MAX_LATITUDE,
            ),
        });
    }

    if let Some((zone, _north)) = map_crs.as_utm() {
        let central_meridian = (zone as f64 - 1.0) * 6.0 - 180.0 + 3.0;
        return Some(ProjectionHandler {
            valid_area: Envelope::new(
                central_meridian - UTM_LON_TOLERANCE - lon_slack,
                UTM_MIN_LATITUDE,
                central_meridian + UTM_LON_TOLERANCE + lon_slack,
                UTM_MAX_LATITUDE,
            ),
        });
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::{line_string, polygon, Point};

    #[test]
    fn test_no_handler_for_projected_source() {
        assert_eq!(
            find_handler(&Crs::web_mercator(), &Crs::web_mercator(), false),
            None
        );
        assert_eq!(
            find_handler(&Crs::web_mercator(), &Crs::utm(30, true), false),
            None
        );
    }

    #[test]
    fn test_no_handler_for_geographic_map() {
        assert_eq!(find_handler(&Crs::wgs84(), &Crs::wgs84(), false), None);
    }

    #[test]
    fn test_mercator_handler_clamps_latitude() {
        let handler = find_handler(&Crs::web_mercator(), &Crs::wgs84(), false).unwrap();
        assert!(handler.valid_area().max_y < 86.0);
        assert!(handler.valid_area().max_y > 85.0);
    }

    #[test]
    fn test_pre_process_inside_is_unchanged() {
        let handler = find_handler(&Crs::web_mercator(), &Crs::wgs84(), false).unwrap();
        let geom = Geometry::Point(Point::new(10.0, 50.0));
        assert_eq!(handler.pre_process(&geom), Some(geom));
    }

    #[test]
    fn test_pre_process_outside_is_none() {
        let handler = find_handler(&Crs::web_mercator(), &Crs::wgs84(), false).unwrap();
        let polar = Geometry::LineString(line_string![
            (x: 0.0, y: 87.0),
            (x: 10.0, y: 89.0),
        ]);
        assert_eq!(handler.pre_process(&polar), None);
    }

    #[test]
    fn test_pre_process_straddling_is_clipped() {
        let handler = find_handler(&Crs::web_mercator(), &Crs::wgs84(), false).unwrap();
        let straddling: Geometry<f64> = polygon![
            (x: 0.0, y: 80.0),
            (x: 10.0, y: 80.0),
            (x: 10.0, y: 89.0),
            (x: 0.0, y: 89.0),
        ]
        .into();
        let clipped = handler.pre_process(&straddling).unwrap();
        let env = Envelope::of(&clipped).unwrap();
        assert!(env.max_y <= MERCATOR_MAX_LATITUDE + 1e-9);
        assert!(env.min_y >= 80.0 - 1e-9);
    }

    #[test]
    fn test_utm_handler_spans_zone() {
        // Zone 30: central meridian -3°
        let handler = find_handler(&Crs::utm(30, true), &Crs::wgs84(), false).unwrap();
        let area = handler.valid_area();
        assert_eq!(area.min_x, -23.0);
        assert_eq!(area.max_x, 17.0);
        assert_eq!(area.min_y, -80.0);
        assert_eq!(area.max_y, 84.0);
    }
}
