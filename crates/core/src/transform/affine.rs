//! 2-D affine transforms

use crate::envelope::{Envelope, PixelRect};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Affine transform coefficients:
///
/// ```text
/// x' = a * x + b * y + c
/// y' = d * x + e * y + f
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Affine {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Affine {
    pub fn identity() -> Self {
        Self { a: 1.0, b: 0.0, c: 0.0, d: 0.0, e: 1.0, f: 0.0 }
    }

    /// Map a world envelope onto a pixel rectangle, y-down.
    ///
    /// The top edge of `world` lands on the top pixel row of `screen`,
    /// the standard map-to-screen convention.
    pub fn world_to_screen(world: &Envelope, screen: &PixelRect) -> Self {
        let sx = screen.width as f64 / world.width();
        let sy = screen.height as f64 / world.height();
        Self {
            a: sx,
            b: 0.0,
            c: screen.x as f64 - world.min_x * sx,
            d: 0.0,
            e: -sy,
            f: screen.y as f64 + world.max_y * sy,
        }
    }

    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        (
            self.a * x + self.b * y + self.c,
            self.d * x + self.e * y + self.f,
        )
    }

    /// Invert the transform, failing on a singular matrix
    pub fn invert(&self) -> Result<Affine> {
        let det = self.a * self.e - self.b * self.d;
        if det.abs() < 1e-12 {
            return Err(Error::NonInvertibleTransform);
        }
        Ok(Affine {
            a: self.e / det,
            b: -self.b / det,
            c: (self.b * self.f - self.e * self.c) / det,
            d: -self.d / det,
            e: self.a / det,
            f: (self.d * self.c - self.a * self.f) / det,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_world_to_screen_corners() {
        let world = Envelope::new(-180.0, -90.0, 180.0, 90.0);
        let screen = PixelRect::sized(360, 180);
        let tx = Affine::world_to_screen(&world, &screen);

        // Top-left world corner lands on pixel (0, 0)
        let (x, y) = tx.apply(-180.0, 90.0);
        assert_relative_eq!(x, 0.0);
        assert_relative_eq!(y, 0.0);

        // Bottom-right world corner lands on (width, height)
        let (x, y) = tx.apply(180.0, -90.0);
        assert_relative_eq!(x, 360.0);
        assert_relative_eq!(y, 180.0);
    }

    #[test]
    fn test_invert_roundtrip() {
        let world = Envelope::new(10.0, 20.0, 110.0, 70.0);
        let screen = PixelRect::sized(256, 256);
        let tx = Affine::world_to_screen(&world, &screen);
        let inv = tx.invert().unwrap();

        let (sx, sy) = tx.apply(42.5, 33.25);
        let (x, y) = inv.apply(sx, sy);
        assert_relative_eq!(x, 42.5, epsilon = 1e-10);
        assert_relative_eq!(y, 33.25, epsilon = 1e-10);
    }

    #[test]
    fn test_invert_singular() {
        let singular = Affine { a: 0.0, b: 0.0, c: 1.0, d: 0.0, e: 0.0, f: 1.0 };
        assert!(matches!(
            singular.invert(),
            Err(Error::NonInvertibleTransform)
        ));
    }
}
