//! # Vectile Pipeline
//!
//! A configurable geometry-shaping pipeline for tiled map rendering:
//! source-CRS vector geometries go in, simplified, clipped, screen- or
//! target-CRS geometries come out, ready for a vector tile encoder.
//!
//! One [`PipelineBuilder`] derives the per-request [`Context`]
//! (transforms, tolerances, clip envelopes, sub-pixel tracker) and
//! assembles the requested stages; the resulting [`Pipeline`] is then
//! run once per input geometry:
//!
//! ```
//! use geo_types::{polygon, Geometry};
//! use vectile_core::{Crs, Envelope, PixelRect};
//! use vectile_pipeline::{PipelineBuilder, RenderParams};
//!
//! # fn main() -> Result<(), vectile_pipeline::PipelineError> {
//! let params = RenderParams {
//!     rendering_area: Envelope::new(-413_000.0, 4_926_000.0, -411_000.0, 4_928_000.0),
//!     map_crs: Crs::web_mercator(),
//!     paint_area: PixelRect::sized(256, 256),
//!     source_crs: Crs::wgs84(),
//!     over_sample_factor: 2.0,
//! };
//!
//! let mut pipeline = PipelineBuilder::new(params)?
//!     .preprocess()
//!     .transform(true)
//!     .simplify(true)
//!     .clip(true, true)
//!     .collapse_collections()
//!     .build();
//!
//! let feature: Geometry<f64> = polygon![
//!     (x: -3.7046, y: 40.4160),
//!     (x: -3.7036, y: 40.4160),
//!     (x: -3.7036, y: 40.4170),
//!     (x: -3.7046, y: 40.4170),
//! ]
//! .into();
//!
//! let shaped = pipeline.run(feature)?;
//! assert!(shaped.is_some());
//! # Ok(())
//! # }
//! ```
//!
//! `Ok(None)` from [`Pipeline::run`] means the feature was fully
//! eliminated (outside the clip bounds, or deduplicated as sub-pixel
//! noise) and nothing should be emitted for it.
//!
//! A pipeline serves exactly one render request on one thread; build a
//! fresh one per request. Independent requests need no coordination.

pub mod builder;
pub mod clip;
pub mod error;
pub mod pipeline;
pub mod projection;
pub mod screen_map;
pub mod simplify;

pub use builder::{Context, PipelineBuilder, RenderParams};
pub use error::{PipelineError, Result};
pub use pipeline::Pipeline;
pub use screen_map::ScreenMap;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::builder::{Context, PipelineBuilder, RenderParams};
    pub use crate::error::{PipelineError, Result};
    pub use crate::pipeline::Pipeline;
    pub use vectile_core::prelude::*;
}
