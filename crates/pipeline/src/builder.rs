//! Request context derivation and the stage builder

use crate::error::{PipelineError, Result};
use crate::pipeline::{Pipeline, Stage};
use crate::projection::{self, ProjectionHandler};
use crate::screen_map::ScreenMap;
use serde::{Deserialize, Serialize};
use tracing::debug;
use vectile_core::{
    build_transform, generalization_distances, Affine, Crs, Envelope, MathTransform, PixelRect,
};

// When clipping, expand the clipping box a bit so the client doesn't
// draw the clip lines created when a polygon is clipped to the request
// bbox. 12 is what streaming WMS renderers use.
const CLIP_BBOX_MARGIN_PIXELS: f64 = 12.0;

/// Raw per-request render parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderParams {
    /// Map request bounding box, in `map_crs`
    pub rendering_area: Envelope,
    /// CRS the map is rendered in (the target CRS)
    pub map_crs: Crs,
    /// Pixel rectangle of the output image
    pub paint_area: PixelRect,
    /// CRS of the source data
    pub source_crs: Crs,
    /// Values above 1 retain more detail than the nominal screen
    /// resolution needs; must be > 0
    pub over_sample_factor: f64,
}

/// Configuration computed once per render request, read-only after
/// construction. The screen map is the one deliberately mutable part,
/// shared by every geometry of the request.
#[derive(Debug)]
pub struct Context {
    pub source_crs: Crs,
    pub map_crs: Crs,
    pub rendering_area: Envelope,
    pub paint_area: PixelRect,
    pub source_to_target: MathTransform,
    pub target_to_screen: MathTransform,
    pub source_to_screen: MathTransform,
    pub(crate) projection_handler: Option<ProjectionHandler>,
    pub(crate) screen_map: ScreenMap,
    /// Simplification tolerance for geometry in target-CRS space
    pub target_crs_simplification_distance: f64,
    /// Simplification tolerance for geometry in screen space, in pixels
    pub screen_simplification_distance: f64,
    /// Approximate size of one pixel in target-CRS units
    pub pixel_size_in_target_crs: f64,
}

impl Context {
    fn derive(params: &RenderParams) -> Result<Context> {
        let k = params.over_sample_factor;
        if !(k > 0.0) {
            return Err(PipelineError::InvalidParameter {
                name: "over_sample_factor",
                reason: format!("{k} is not > 0"),
            });
        }
        if params.paint_area.is_empty() {
            return Err(PipelineError::InvalidParameter {
                name: "paint_area",
                reason: "zero-size paint area".into(),
            });
        }
        if params.rendering_area.is_degenerate() {
            return Err(PipelineError::InvalidParameter {
                name: "rendering_area",
                reason: "degenerate rendering area".into(),
            });
        }

        let world_to_screen = Affine::world_to_screen(&params.rendering_area, &params.paint_area);

        let projection_handler =
            projection::find_handler(&params.map_crs, &params.source_crs, false);

        let source_to_target =
            build_transform(&params.source_crs, &params.map_crs).map_err(PipelineError::Setup)?;
        let target_to_screen = MathTransform::Affine(world_to_screen);
        let source_to_screen = source_to_target.clone().then(target_to_screen.clone());

        let screen_to_source = source_to_screen.invert().map_err(PipelineError::Setup)?;
        let screen_to_target = target_to_screen.invert().map_err(PipelineError::Setup)?;

        // 0.8 px keeps generalization ahead of reprojection slightly
        // under one pixel, so it makes no visible change.
        let spans_source = generalization_distances(&screen_to_source, &params.paint_area, 0.8)
            .map_err(PipelineError::Setup)?;
        let spans_target = generalization_distances(&screen_to_target, &params.paint_area, 1.0)
            .map_err(PipelineError::Setup)?;

        // Clipping pads the request bbox by whole pixels, so take the
        // larger span to get at least that many pixels on either axis.
        let pixel_size_in_target_crs = spans_target.0.max(spans_target.1);

        let screen_simplification_distance = 0.25 / k;
        // min so generalization is never more aggressive than the
        // tighter axis when pixels aren't square in the target CRS
        let target_crs_simplification_distance = spans_target.0.min(spans_target.1) / k;

        let mut screen_map = ScreenMap::new(params.paint_area);
        screen_map.set_spans(spans_source.0 / k, spans_source.1 / k);
        screen_map.set_transform(source_to_screen.clone());

        debug!(
            screen_simplification_distance,
            target_crs_simplification_distance,
            pixel_size_in_target_crs,
            "derived pipeline context"
        );

        Ok(Context {
            source_crs: params.source_crs,
            map_crs: params.map_crs,
            rendering_area: params.rendering_area,
            paint_area: params.paint_area,
            source_to_target,
            target_to_screen,
            source_to_screen,
            projection_handler,
            screen_map,
            target_crs_simplification_distance,
            screen_simplification_distance,
            pixel_size_in_target_crs,
        })
    }

    /// Clip envelope for screen-space clipping: the paint area with a
    /// fixed pixel margin on all sides.
    pub fn screen_clip_envelope(&self) -> Envelope {
        self.paint_area.envelope().expand_by(CLIP_BBOX_MARGIN_PIXELS)
    }

    /// Clip envelope for target-CRS clipping: the rendering area with
    /// the equivalent real-world margin.
    pub fn map_clip_envelope(&self) -> Envelope {
        self.rendering_area
            .expand_by(CLIP_BBOX_MARGIN_PIXELS * self.pixel_size_in_target_crs)
    }
}

/// Assembles the stage chain for one render request.
///
/// Stages run in the order they are requested; each call appends one
/// stage descriptor and [`build`](PipelineBuilder::build) materializes
/// the executable pipeline.
#[derive(Debug)]
pub struct PipelineBuilder {
    context: Context,
    stages: Vec<Stage>,
}

impl PipelineBuilder {
    /// Derive the request context. Fails when no transform path exists
    /// between the CRSs, a transform is not invertible, or a parameter
    /// is out of range; no partial pipeline is ever returned.
    pub fn new(params: RenderParams) -> Result<Self> {
        Ok(Self {
            context: Context::derive(&params)?,
            stages: Vec::new(),
        })
    }

    /// The derived request context
    pub fn context(&self) -> &Context {
        &self.context
    }

    /// Append the preprocess stage: projection-handler clipping plus
    /// sub-pixel degeneracy collapsing via the screen map.
    pub fn preprocess(mut self) -> Self {
        self.stages.push(Stage::Preprocess);
        self
    }

    /// Append a transform stage: full source→screen when
    /// `to_screen_coordinates`, source→target-CRS otherwise.
    pub fn transform(mut self, to_screen_coordinates: bool) -> Self {
        let tx = if to_screen_coordinates {
            self.context.source_to_screen.clone()
        } else {
            self.context.source_to_target.clone()
        };
        self.stages.push(Stage::Transform(tx));
        self
    }

    /// Append a simplify stage with the tolerance matching the space
    /// the geometry is in at this point of the chain.
    pub fn simplify(mut self, to_screen_coordinates: bool) -> Self {
        let tolerance = if to_screen_coordinates {
            self.context.screen_simplification_distance
        } else {
            self.context.target_crs_simplification_distance
        };
        self.stages.push(Stage::Simplify(tolerance));
        self
    }

    /// Append a clip stage against the margin-padded request bounds.
    /// No stage is appended when `clip_to_map_bounds` is false.
    pub fn clip(mut self, clip_to_map_bounds: bool, to_screen_coordinates: bool) -> Self {
        if clip_to_map_bounds {
            let envelope = if to_screen_coordinates {
                self.context.screen_clip_envelope()
            } else {
                self.context.map_clip_envelope()
            };
            self.stages.push(Stage::Clip(envelope));
        }
        self
    }

    /// Append the stage unwrapping single-member collections.
    pub fn collapse_collections(mut self) -> Self {
        self.stages.push(Stage::CollapseCollections);
        self
    }

    /// Materialize the executable pipeline.
    pub fn build(self) -> Pipeline {
        Pipeline::new(self.context, self.stages)
    }
}
