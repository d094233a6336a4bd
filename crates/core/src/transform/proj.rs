//! Pure-Rust map projection math (Snyder 1987, USGS formulas).
//!
//! Spherical web mercator plus WGS84 ↔ UTM in both directions. EPSG
//! 326xx (UTM North) and 327xx (UTM South) cover Sentinel-2, Landsat and
//! most satellite imagery. No external C dependencies (no libproj).

use crate::error::{Error, Result};

// ── WGS84 ellipsoid constants ────────────────────────────────────────────

const A: f64 = 6_378_137.0; // semi-major axis (m)
const F: f64 = 1.0 / 298.257_223_563; // flattening
const E2: f64 = 2.0 * F - F * F; // eccentricity squared
const E_PRIME2: f64 = E2 / (1.0 - E2); // second eccentricity squared
const K0: f64 = 0.9996; // UTM scale factor
const FALSE_EASTING: f64 = 500_000.0;
const FALSE_NORTHING_SOUTH: f64 = 10_000_000.0;

/// Latitude bound of the square web-mercator world, atan(sinh(π))
pub const MERCATOR_MAX_LATITUDE: f64 = 85.051_128_779_806_59;

// ── Web mercator (spherical, EPSG:3857) ─────────────────────────────────

/// Project WGS84 degrees to web-mercator metres.
///
/// Fails at the poles where the projection is singular; latitudes beyond
/// [`MERCATOR_MAX_LATITUDE`] still project (outside the square world) and
/// are a projection-handler concern, not a transform failure.
pub fn mercator_forward(lon_deg: f64, lat_deg: f64) -> Result<(f64, f64)> {
    if lat_deg.abs() >= 90.0 - 1e-9 {
        return Err(Error::TransformFailed {
            x: lon_deg,
            y: lat_deg,
            reason: "latitude at or beyond the pole".into(),
        });
    }
    let x = A * lon_deg.to_radians();
    let y = A * (std::f64::consts::FRAC_PI_4 + lat_deg.to_radians() / 2.0)
        .tan()
        .ln();
    Ok((x, y))
}

/// Unproject web-mercator metres to WGS84 degrees. Total.
pub fn mercator_inverse(x: f64, y: f64) -> (f64, f64) {
    let lon = (x / A).to_degrees();
    let lat = (2.0 * (y / A).exp().atan() - std::f64::consts::FRAC_PI_2).to_degrees();
    (lon, lat)
}

// ── UTM forward (Snyder 1987, USGS Prof. Paper 1395, pp. 61-64) ─────────

/// Central meridian of a UTM zone, in radians
fn central_meridian(zone: u32) -> f64 {
    ((zone as f64 - 1.0) * 6.0 - 180.0 + 3.0).to_radians()
}

/// Convert WGS84 (longitude, latitude) in degrees to UTM (easting,
/// northing) in metres for the given zone and hemisphere.
pub fn utm_forward(lon_deg: f64, lat_deg: f64, zone: u32, north: bool) -> Result<(f64, f64)> {
    if lat_deg.abs() >= 90.0 - 1e-9 {
        return Err(Error::TransformFailed {
            x: lon_deg,
            y: lat_deg,
            reason: "latitude at or beyond the pole".into(),
        });
    }

    let lat = lat_deg.to_radians();
    let lon = lon_deg.to_radians();
    let lon0 = central_meridian(zone);

    let sin_lat = lat.sin();
    let cos_lat = lat.cos();
    let tan_lat = lat.tan();

    let n = A / (1.0 - E2 * sin_lat * sin_lat).sqrt();
    let t = tan_lat * tan_lat;
    let c = E_PRIME2 * cos_lat * cos_lat;
    let a_coeff = cos_lat * (lon - lon0);

    // Meridional arc length M (Snyder eq. 3-21)
    let m = meridional_arc(lat);

    let a2 = a_coeff * a_coeff;
    let a4 = a2 * a2;
    let a6 = a4 * a2;

    // Easting (Snyder eq. 8-9)
    let easting = K0 * n
        * (a_coeff
            + (1.0 - t + c) * a2 * a_coeff / 6.0
            + (5.0 - 18.0 * t + t * t + 72.0 * c - 58.0 * E_PRIME2) * a4 * a_coeff / 120.0)
        + FALSE_EASTING;

    // Northing (Snyder eq. 8-10)
    let northing = K0
        * (m + n
            * tan_lat
            * (a2 / 2.0
                + (5.0 - t + 9.0 * c + 4.0 * c * c) * a4 / 24.0
                + (61.0 - 58.0 * t + t * t + 600.0 * c - 330.0 * E_PRIME2) * a6 / 720.0));

    let northing = if north {
        northing
    } else {
        northing + FALSE_NORTHING_SOUTH
    };

    Ok((easting, northing))
}

/// Meridional arc from equator to latitude `lat` (radians).
/// Snyder eq. 3-21.
fn meridional_arc(lat: f64) -> f64 {
    let e2 = E2;
    let e4 = e2 * e2;
    let e6 = e4 * e2;

    A * ((1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0) * lat
        - (3.0 * e2 / 8.0 + 3.0 * e4 / 32.0 + 45.0 * e6 / 1024.0) * (2.0 * lat).sin()
        + (15.0 * e4 / 256.0 + 45.0 * e6 / 1024.0) * (4.0 * lat).sin()
        - (35.0 * e6 / 3072.0) * (6.0 * lat).sin())
}

// ── UTM inverse (Snyder 1987, pp. 63-64, eqs 8-12 to 8-25) ──────────────

/// Convert UTM (easting, northing) in metres back to WGS84 (longitude,
/// latitude) in degrees for the given zone and hemisphere.
pub fn utm_inverse(easting: f64, northing: f64, zone: u32, north: bool) -> (f64, f64) {
    let x = easting - FALSE_EASTING;
    let y = if north {
        northing
    } else {
        northing - FALSE_NORTHING_SOUTH
    };

    // Footpoint latitude (Snyder eqs 7-19, 3-24)
    let m = y / K0;
    let mu = m / (A * (1.0 - E2 / 4.0 - 3.0 * E2 * E2 / 64.0 - 5.0 * E2 * E2 * E2 / 256.0));
    let sqrt_1me2 = (1.0 - E2).sqrt();
    let e1 = (1.0 - sqrt_1me2) / (1.0 + sqrt_1me2);
    let e1_2 = e1 * e1;
    let e1_3 = e1_2 * e1;
    let e1_4 = e1_2 * e1_2;

    let phi1 = mu
        + (3.0 * e1 / 2.0 - 27.0 * e1_3 / 32.0) * (2.0 * mu).sin()
        + (21.0 * e1_2 / 16.0 - 55.0 * e1_4 / 32.0) * (4.0 * mu).sin()
        + (151.0 * e1_3 / 96.0) * (6.0 * mu).sin()
        + (1097.0 * e1_4 / 512.0) * (8.0 * mu).sin();

    let sin_phi1 = phi1.sin();
    let cos_phi1 = phi1.cos();
    let tan_phi1 = phi1.tan();

    let c1 = E_PRIME2 * cos_phi1 * cos_phi1;
    let t1 = tan_phi1 * tan_phi1;
    let n1 = A / (1.0 - E2 * sin_phi1 * sin_phi1).sqrt();
    let r1 = A * (1.0 - E2) / (1.0 - E2 * sin_phi1 * sin_phi1).powf(1.5);
    let d = x / (n1 * K0);

    let d2 = d * d;
    let d3 = d2 * d;
    let d4 = d2 * d2;
    let d5 = d4 * d;
    let d6 = d4 * d2;

    // Latitude (Snyder eq. 8-17)
    let lat = phi1
        - (n1 * tan_phi1 / r1)
            * (d2 / 2.0
                - (5.0 + 3.0 * t1 + 10.0 * c1 - 4.0 * c1 * c1 - 9.0 * E_PRIME2) * d4 / 24.0
                + (61.0 + 90.0 * t1 + 298.0 * c1 + 45.0 * t1 * t1
                    - 252.0 * E_PRIME2
                    - 3.0 * c1 * c1)
                    * d6
                    / 720.0);

    // Longitude (Snyder eq. 8-18)
    let lon = central_meridian(zone)
        + (d - (1.0 + 2.0 * t1 + c1) * d3 / 6.0
            + (5.0 - 2.0 * c1 + 28.0 * t1 - 3.0 * c1 * c1 + 8.0 * E_PRIME2 + 24.0 * t1 * t1)
                * d5
                / 120.0)
            / cos_phi1;

    (lon.to_degrees(), lat.to_degrees())
}

// ── Tests ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Helper: assert two values are within `tol` of each other.
    fn assert_close(a: f64, b: f64, tol: f64, msg: &str) {
        let diff = (a - b).abs();
        assert!(
            diff < tol,
            "{msg}: expected {b}, got {a}, diff {diff} exceeds tolerance {tol}"
        );
    }

    // Reference values from pyproj (PROJ 9.x):
    //   from pyproj import Transformer
    //   t = Transformer.from_crs(4326, 32630, always_xy=True)
    //   t.transform(-3.7037, 40.4168) → (440298.94, 4474257.31)
    #[test]
    fn madrid_wgs84_to_utm30n() {
        let (e, n) = utm_forward(-3.7037, 40.4168, 30, true).unwrap();
        assert_close(e, 440_298.94, 1.0, "easting");
        assert_close(n, 4_474_257.31, 1.0, "northing");
    }

    // Buenos Aires: (-58.3816, -34.6037) → UTM 21S (EPSG:32721)
    //   t = Transformer.from_crs(4326, 32721, always_xy=True)
    //   t.transform(-58.3816, -34.6037) → (373317.50, 6170036.17)
    #[test]
    fn buenos_aires_wgs84_to_utm21s() {
        let (e, n) = utm_forward(-58.3816, -34.6037, 21, false).unwrap();
        assert_close(e, 373_317.50, 1.0, "easting");
        assert_close(n, 6_170_036.17, 1.0, "northing");
    }

    // Equator at zone 30 central meridian (-3°): easting should be 500000
    #[test]
    fn equator_central_meridian() {
        let (e, n) = utm_forward(-3.0, 0.0, 30, true).unwrap();
        assert_close(e, 500_000.0, 0.01, "easting at CM");
        assert_close(n, 0.0, 0.01, "northing at equator");
    }

    #[test]
    fn utm_roundtrip_north() {
        let (e, n) = utm_forward(-3.7037, 40.4168, 30, true).unwrap();
        let (lon, lat) = utm_inverse(e, n, 30, true);
        assert_relative_eq!(lon, -3.7037, epsilon = 1e-7);
        assert_relative_eq!(lat, 40.4168, epsilon = 1e-7);
    }

    #[test]
    fn utm_roundtrip_south() {
        let (e, n) = utm_forward(-58.3816, -34.6037, 21, false).unwrap();
        let (lon, lat) = utm_inverse(e, n, 21, false);
        assert_relative_eq!(lon, -58.3816, epsilon = 1e-7);
        assert_relative_eq!(lat, -34.6037, epsilon = 1e-7);
    }

    // Reference values from pyproj:
    //   t = Transformer.from_crs(4326, 3857, always_xy=True)
    //   t.transform(-3.7037, 40.4168) → (-412316.23, 4926881.72)
    #[test]
    fn madrid_wgs84_to_mercator() {
        let (x, y) = mercator_forward(-3.7037, 40.4168).unwrap();
        assert_close(x, -412_316.23, 1.0, "x");
        assert_close(y, 4_926_881.72, 1.0, "y");
    }

    #[test]
    fn mercator_roundtrip() {
        let (x, y) = mercator_forward(139.6917, 35.6895).unwrap();
        let (lon, lat) = mercator_inverse(x, y);
        assert_relative_eq!(lon, 139.6917, epsilon = 1e-9);
        assert_relative_eq!(lat, 35.6895, epsilon = 1e-9);
    }

    #[test]
    fn mercator_fails_at_pole() {
        assert!(mercator_forward(0.0, 90.0).is_err());
        assert!(mercator_forward(0.0, -90.0).is_err());
        // The edge of the square world still projects
        assert!(mercator_forward(0.0, MERCATOR_MAX_LATITUDE).is_ok());
    }

    #[test]
    fn mercator_world_edge() {
        // The square world: ±180° lon maps to ±85.0511° lat extent
        let (x, _) = mercator_forward(180.0, 0.0).unwrap();
        let (_, y) = mercator_forward(0.0, MERCATOR_MAX_LATITUDE).unwrap();
        assert_relative_eq!(x, y, epsilon = 1e-6);
    }
}
