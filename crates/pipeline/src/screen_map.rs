//! Sub-pixel degeneracy tracking
//!
//! A [`ScreenMap`] records which screen pixels have already received a
//! sub-pixel ("degenerate") feature during one render request. Thousands
//! of features too small to affect more than one pixel can then be
//! collapsed to a single coarse shape per pixel instead of each being
//! transformed, simplified and clipped in full.
//!
//! The map accumulates across all geometries of one request and is never
//! reset in between; that is what makes the dedup cross-geometry.

use geo::dimensions::Dimensions;
use geo_types::{Geometry, Line, LineString, Point};
use ndarray::Array2;
use vectile_core::{Envelope, MathTransform, PixelRect};

/// Degeneracy tracker over a paint area.
#[derive(Debug)]
pub struct ScreenMap {
    area: PixelRect,
    grid: Array2<bool>,
    span_x: f64,
    span_y: f64,
    source_to_screen: MathTransform,
}

impl ScreenMap {
    /// Create an empty map over the paint area. Spans start at zero, so
    /// nothing is considered sub-pixel until [`set_spans`] is called.
    ///
    /// [`set_spans`]: ScreenMap::set_spans
    pub fn new(area: PixelRect) -> Self {
        Self {
            area,
            grid: Array2::from_elem((area.height as usize, area.width as usize), false),
            span_x: 0.0,
            span_y: 0.0,
            source_to_screen: MathTransform::Identity,
        }
    }

    /// Set the per-axis source-CRS size below which a feature cannot
    /// produce more than one visible pixel.
    pub fn set_spans(&mut self, span_x: f64, span_y: f64) {
        self.span_x = span_x;
        self.span_y = span_y;
    }

    /// Attach the source-to-screen transform used to locate the pixel
    /// cell of an envelope.
    pub fn set_transform(&mut self, source_to_screen: MathTransform) {
        self.source_to_screen = source_to_screen;
    }

    /// Whether a geometry with this envelope is sub-pixel on both axes.
    pub fn can_simplify(&self, env: &Envelope) -> bool {
        env.width() < self.span_x && env.height() < self.span_y
    }

    /// Record the envelope's pixel cell. Returns true when the cell had
    /// already been recorded (the feature is a duplicate and can be
    /// dropped), false when it was newly set or falls outside the map.
    pub fn check_and_set(&mut self, env: &Envelope) -> vectile_core::Result<bool> {
        if !self.can_simplify(env) {
            return Ok(false);
        }
        let (cx, cy) = env.center();
        let (sx, sy) = self.source_to_screen.apply(cx, cy)?;
        let col = sx.floor() as i64 - self.area.x as i64;
        let row = sy.floor() as i64 - self.area.y as i64;
        if col < 0 || row < 0 || col >= self.area.width as i64 || row >= self.area.height as i64 {
            return Ok(false);
        }
        let cell = &mut self.grid[[row as usize, col as usize]];
        if *cell {
            Ok(true)
        } else {
            *cell = true;
            Ok(false)
        }
    }

    /// Coarse stand-in shape for a sub-pixel feature, in source-CRS
    /// coordinates, matching the dimension of the original geometry.
    pub fn simplified_shape(&self, env: &Envelope, dimensions: Dimensions) -> Geometry<f64> {
        match dimensions {
            Dimensions::TwoDimensional => Geometry::Polygon(env.to_polygon()),
            Dimensions::OneDimensional => Geometry::LineString(LineString::from(Line::new(
                (env.min_x, env.min_y),
                (env.max_x, env.max_y),
            ))),
            _ => {
                let (cx, cy) = env.center();
                Geometry::Point(Point::new(cx, cy))
            }
        }
    }
}
