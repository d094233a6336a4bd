//! Composable coordinate transforms
//!
//! A [`MathTransform`] is a value describing a coordinate mapping that
//! can be inverted and concatenated. [`build_transform`] produces the
//! transform between two CRSs, routing through WGS84 when the pair has
//! no direct projection step.

mod affine;
mod proj;

pub use affine::Affine;
pub use proj::MERCATOR_MAX_LATITUDE;

use crate::crs::Crs;
use crate::envelope::PixelRect;
use crate::error::{Error, Result};
use geo::MapCoords;
use geo_types::{Coord, Geometry};

/// A composable coordinate transform.
#[derive(Debug, Clone, PartialEq)]
pub enum MathTransform {
    Identity,
    Affine(Affine),
    /// Spherical web mercator; forward maps lon/lat degrees to metres
    WebMercator { inverse: bool },
    /// UTM zone projection; forward maps lon/lat degrees to metres
    Utm { zone: u32, north: bool, inverse: bool },
    /// Transforms applied left to right
    Sequence(Vec<MathTransform>),
}

impl MathTransform {
    /// Transform a single coordinate
    pub fn apply(&self, x: f64, y: f64) -> Result<(f64, f64)> {
        match self {
            MathTransform::Identity => Ok((x, y)),
            MathTransform::Affine(a) => Ok(a.apply(x, y)),
            MathTransform::WebMercator { inverse: false } => proj::mercator_forward(x, y),
            MathTransform::WebMercator { inverse: true } => Ok(proj::mercator_inverse(x, y)),
            MathTransform::Utm { zone, north, inverse: false } => {
                proj::utm_forward(x, y, *zone, *north)
            }
            MathTransform::Utm { zone, north, inverse: true } => {
                Ok(proj::utm_inverse(x, y, *zone, *north))
            }
            MathTransform::Sequence(parts) => {
                let mut coord = (x, y);
                for part in parts {
                    coord = part.apply(coord.0, coord.1)?;
                }
                Ok(coord)
            }
        }
    }

    /// The inverse transform, failing on a singular affine step
    pub fn invert(&self) -> Result<MathTransform> {
        Ok(match self {
            MathTransform::Identity => MathTransform::Identity,
            MathTransform::Affine(a) => MathTransform::Affine(a.invert()?),
            MathTransform::WebMercator { inverse } => {
                MathTransform::WebMercator { inverse: !inverse }
            }
            MathTransform::Utm { zone, north, inverse } => MathTransform::Utm {
                zone: *zone,
                north: *north,
                inverse: !inverse,
            },
            MathTransform::Sequence(parts) => {
                let inverted = parts
                    .iter()
                    .rev()
                    .map(|p| p.invert())
                    .collect::<Result<Vec<_>>>()?;
                MathTransform::Sequence(inverted)
            }
        })
    }

    /// Concatenate: apply `self`, then `next`. Flattens nested sequences.
    pub fn then(self, next: MathTransform) -> MathTransform {
        let mut parts = match self {
            MathTransform::Identity => Vec::new(),
            MathTransform::Sequence(p) => p,
            other => vec![other],
        };
        match next {
            MathTransform::Identity => {}
            MathTransform::Sequence(p) => parts.extend(p),
            other => parts.push(other),
        }
        if parts.is_empty() {
            MathTransform::Identity
        } else if parts.len() == 1 {
            parts.remove(0)
        } else {
            MathTransform::Sequence(parts)
        }
    }
}

/// The projection step mapping WGS84 onto `crs`, None if unsupported
fn leg_from_wgs84(crs: &Crs) -> Option<MathTransform> {
    if crs.is_geographic() {
        return Some(MathTransform::Identity);
    }
    if crs.epsg() == 3857 {
        return Some(MathTransform::WebMercator { inverse: false });
    }
    crs.as_utm()
        .map(|(zone, north)| MathTransform::Utm { zone, north, inverse: false })
}

/// Build the transform from one CRS to another.
///
/// Pairs without a shared projection step route through WGS84
/// (e.g. UTM → web mercator). Fails with [`Error::NoTransformPath`]
/// when either side is unsupported.
pub fn build_transform(from: &Crs, to: &Crs) -> Result<MathTransform> {
    if from == to {
        return Ok(MathTransform::Identity);
    }
    let no_path = || Error::NoTransformPath { from: *from, to: *to };
    let from_leg = leg_from_wgs84(from).ok_or_else(no_path)?;
    let to_leg = leg_from_wgs84(to).ok_or_else(no_path)?;
    Ok(from_leg.invert()?.then(to_leg))
}

/// Transform every coordinate of a geometry.
///
/// A failure for any single coordinate fails the whole geometry; partial
/// results are never returned.
pub fn transform_geometry(tx: &MathTransform, geom: &Geometry<f64>) -> Result<Geometry<f64>> {
    geom.try_map_coords(|coord| {
        let (x, y) = tx.apply(coord.x, coord.y)?;
        Ok(Coord { x, y })
    })
}

/// Per-axis size of one screen pixel in world units.
///
/// Pushes the paint-area corners through `screen_to_world` and divides
/// the resulting edge lengths by the pixel counts, scaled by
/// `per_pixel` (a fraction of a pixel to generalize by).
pub fn generalization_distances(
    screen_to_world: &MathTransform,
    paint_area: &PixelRect,
    per_pixel: f64,
) -> Result<(f64, f64)> {
    let x0 = paint_area.x as f64;
    let y0 = paint_area.y as f64;
    let w = paint_area.width as f64;
    let h = paint_area.height as f64;

    let ul = screen_to_world.apply(x0, y0)?;
    let ur = screen_to_world.apply(x0 + w, y0)?;
    let ll = screen_to_world.apply(x0, y0 + h)?;

    let dx = (ur.0 - ul.0).hypot(ur.1 - ul.1) / w * per_pixel;
    let dy = (ll.0 - ul.0).hypot(ll.1 - ul.1) / h * per_pixel;
    Ok((dx, dy))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::Envelope;
    use approx::assert_relative_eq;
    use geo_types::{line_string, Geometry};

    #[test]
    fn test_same_crs_is_identity() {
        let tx = build_transform(&Crs::web_mercator(), &Crs::web_mercator()).unwrap();
        assert_eq!(tx, MathTransform::Identity);
    }

    #[test]
    fn test_unknown_crs_has_no_path() {
        let err = build_transform(&Crs::from_epsg(27700), &Crs::wgs84()).unwrap_err();
        assert!(matches!(err, Error::NoTransformPath { .. }));
    }

    #[test]
    fn test_route_via_wgs84() {
        // UTM 30N → web mercator has no direct step; the built transform
        // must agree with unprojecting and reprojecting by hand.
        let tx = build_transform(&Crs::utm(30, true), &Crs::web_mercator()).unwrap();

        let utm_inv = MathTransform::Utm { zone: 30, north: true, inverse: true };
        let merc = MathTransform::WebMercator { inverse: false };

        let (lon, lat) = utm_inv.apply(440_298.94, 4_474_257.31).unwrap();
        let expected = merc.apply(lon, lat).unwrap();
        let got = tx.apply(440_298.94, 4_474_257.31).unwrap();

        assert_relative_eq!(got.0, expected.0, epsilon = 1e-9);
        assert_relative_eq!(got.1, expected.1, epsilon = 1e-9);
    }

    #[test]
    fn test_sequence_invert_reverses_order() {
        let world = Envelope::new(0.0, 0.0, 100.0, 100.0);
        let screen = PixelRect::sized(256, 256);
        let tx = MathTransform::WebMercator { inverse: true }
            .then(MathTransform::Affine(Affine::world_to_screen(&world, &screen)));
        let inv = tx.invert().unwrap();

        let (x, y) = tx.apply(5_000_000.0, 4_000_000.0).unwrap();
        let (bx, by) = inv.apply(x, y).unwrap();
        assert_relative_eq!(bx, 5_000_000.0, epsilon = 1e-6);
        assert_relative_eq!(by, 4_000_000.0, epsilon = 1e-6);
    }

    #[test]
    fn test_then_flattens() {
        let a = MathTransform::WebMercator { inverse: false };
        let b = MathTransform::Identity;
        assert_eq!(a.clone().then(b), a);
    }

    #[test]
    fn test_transform_geometry_all_coords() {
        let world = Envelope::new(0.0, 0.0, 10.0, 10.0);
        let screen = PixelRect::sized(10, 10);
        let tx = MathTransform::Affine(Affine::world_to_screen(&world, &screen));

        let geom = Geometry::LineString(line_string![
            (x: 0.0, y: 0.0),
            (x: 10.0, y: 10.0),
        ]);
        let out = transform_geometry(&tx, &geom).unwrap();
        if let Geometry::LineString(ls) = out {
            // y-down flip: world (0,0) is the bottom-left pixel corner
            assert_relative_eq!(ls.0[0].x, 0.0);
            assert_relative_eq!(ls.0[0].y, 10.0);
            assert_relative_eq!(ls.0[1].x, 10.0);
            assert_relative_eq!(ls.0[1].y, 0.0);
        } else {
            panic!("expected LineString");
        }
    }

    #[test]
    fn test_generalization_distances_affine() {
        // 100 world units across 256 pixels → one pixel ≈ 0.390625 units
        let world = Envelope::new(0.0, 0.0, 100.0, 100.0);
        let screen = PixelRect::sized(256, 256);
        let tx = MathTransform::Affine(Affine::world_to_screen(&world, &screen));
        let inv = tx.invert().unwrap();

        let (dx, dy) = generalization_distances(&inv, &screen, 1.0).unwrap();
        assert_relative_eq!(dx, 100.0 / 256.0, epsilon = 1e-12);
        assert_relative_eq!(dy, 100.0 / 256.0, epsilon = 1e-12);

        let (dx08, _) = generalization_distances(&inv, &screen, 0.8).unwrap();
        assert_relative_eq!(dx08, 0.8 * 100.0 / 256.0, epsilon = 1e-12);
    }
}
