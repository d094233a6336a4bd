//! # Vectile Core
//!
//! Shared types for the vectile geometry pipeline:
//! - `Crs`: EPSG-identified coordinate reference systems
//! - `Envelope` / `PixelRect`: world and screen rectangles
//! - `MathTransform`: composable coordinate transforms (affine,
//!   web mercator, UTM) with inversion and concatenation
//!
//! Reprojection math is pure Rust (no libproj binding), covering the
//! CRS families that tiled map requests actually use: WGS84 geographic,
//! spherical web mercator, and the UTM grid.

pub mod crs;
pub mod envelope;
pub mod error;
pub mod transform;

pub use crs::Crs;
pub use envelope::{Envelope, PixelRect};
pub use error::{Error, Result};
pub use transform::{
    build_transform, generalization_distances, transform_geometry, Affine, MathTransform,
};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::crs::Crs;
    pub use crate::envelope::{Envelope, PixelRect};
    pub use crate::error::{Error, Result};
    pub use crate::transform::{build_transform, transform_geometry, Affine, MathTransform};
}
