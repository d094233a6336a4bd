//! World and screen rectangles

use geo::BoundingRect;
use geo_types::{Geometry, LineString, Polygon};
use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in world coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Envelope {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self { min_x, min_y, max_x, max_y }
    }

    /// Bounding envelope of a geometry, None for empty geometry
    pub fn of(geom: &Geometry<f64>) -> Option<Self> {
        geom.bounding_rect().map(|rect| Self {
            min_x: rect.min().x,
            min_y: rect.min().y,
            max_x: rect.max().x,
            max_y: rect.max().y,
        })
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn center(&self) -> (f64, f64) {
        ((self.min_x + self.max_x) / 2.0, (self.min_y + self.max_y) / 2.0)
    }

    /// Grow the envelope by `margin` on every side
    pub fn expand_by(&self, margin: f64) -> Self {
        Self {
            min_x: self.min_x - margin,
            min_y: self.min_y - margin,
            max_x: self.max_x + margin,
            max_y: self.max_y + margin,
        }
    }

    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }

    /// Whether `other` lies entirely inside this envelope
    pub fn contains(&self, other: &Envelope) -> bool {
        other.min_x >= self.min_x
            && other.max_x <= self.max_x
            && other.min_y >= self.min_y
            && other.max_y <= self.max_y
    }

    pub fn intersects(&self, other: &Envelope) -> bool {
        self.min_x <= other.max_x
            && self.max_x >= other.min_x
            && self.min_y <= other.max_y
            && self.max_y >= other.min_y
    }

    pub fn is_degenerate(&self) -> bool {
        self.width() <= 0.0 || self.height() <= 0.0
    }

    pub fn to_polygon(&self) -> Polygon<f64> {
        Polygon::new(
            LineString::from(vec![
                (self.min_x, self.min_y),
                (self.max_x, self.min_y),
                (self.max_x, self.max_y),
                (self.min_x, self.max_y),
                (self.min_x, self.min_y),
            ]),
            vec![],
        )
    }
}

/// Integer pixel rectangle of an output image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelRect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Paint area at the origin, the common tile case
    pub fn sized(width: u32, height: u32) -> Self {
        Self::new(0, 0, width, height)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// The pixel rectangle as a world-style envelope
    pub fn envelope(&self) -> Envelope {
        Envelope::new(
            self.x as f64,
            self.y as f64,
            (self.x + self.width as i32) as f64,
            (self.y + self.height as i32) as f64,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::Point;

    #[test]
    fn test_expand_by() {
        let env = Envelope::new(0.0, 0.0, 256.0, 256.0).expand_by(12.0);
        assert_eq!(env, Envelope::new(-12.0, -12.0, 268.0, 268.0));
    }

    #[test]
    fn test_contains_and_intersects() {
        let outer = Envelope::new(0.0, 0.0, 10.0, 10.0);
        let inner = Envelope::new(2.0, 2.0, 3.0, 3.0);
        let crossing = Envelope::new(8.0, 8.0, 12.0, 12.0);
        let outside = Envelope::new(20.0, 20.0, 30.0, 30.0);

        assert!(outer.contains(&inner));
        assert!(!outer.contains(&crossing));
        assert!(outer.intersects(&crossing));
        assert!(!outer.intersects(&outside));
    }

    #[test]
    fn test_of_geometry() {
        let env = Envelope::of(&Geometry::Point(Point::new(3.0, 4.0))).unwrap();
        assert_eq!(env.center(), (3.0, 4.0));
        assert!(env.is_degenerate());
    }

    #[test]
    fn test_pixel_rect_envelope() {
        let rect = PixelRect::sized(256, 128);
        let env = rect.envelope();
        assert_eq!(env, Envelope::new(0.0, 0.0, 256.0, 128.0));
    }
}
