//! Coordinate Reference System identifiers

use serde::{Deserialize, Serialize};
use std::fmt;

/// An EPSG-identified coordinate reference system.
///
/// Transform support covers WGS84 geographic (4326), spherical web
/// mercator (3857) and the UTM grid (326xx north / 327xx south); other
/// codes can be carried around but have no transform path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Crs {
    epsg: u32,
}

impl Crs {
    /// Create a CRS from an EPSG code
    pub fn from_epsg(code: u32) -> Self {
        Self { epsg: code }
    }

    /// WGS84 geographic CRS (EPSG:4326)
    pub fn wgs84() -> Self {
        Self::from_epsg(4326)
    }

    /// Spherical web mercator (EPSG:3857)
    pub fn web_mercator() -> Self {
        Self::from_epsg(3857)
    }

    /// UTM zone CRS (EPSG:326xx for north, 327xx for south)
    pub fn utm(zone: u32, north: bool) -> Self {
        let base = if north { 32600 } else { 32700 };
        Self::from_epsg(base + zone)
    }

    /// Get the EPSG code
    pub fn epsg(&self) -> u32 {
        self.epsg
    }

    /// Whether coordinates are geographic degrees (longitude, latitude)
    pub fn is_geographic(&self) -> bool {
        self.epsg == 4326
    }

    /// Parse a UTM code into `Some((zone, is_north))`.
    ///
    /// - EPSG 326xx → zone xx, North hemisphere
    /// - EPSG 327xx → zone xx, South hemisphere
    pub fn as_utm(&self) -> Option<(u32, bool)> {
        if (32601..=32660).contains(&self.epsg) {
            Some((self.epsg - 32600, true))
        } else if (32701..=32760).contains(&self.epsg) {
            Some((self.epsg - 32700, false))
        } else {
            None
        }
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.epsg)
    }
}

impl Default for Crs {
    fn default() -> Self {
        Self::wgs84()
    }
}
