//! Stage chain execution

use crate::builder::Context;
use crate::clip;
use crate::error::{PipelineError, Result};
use crate::simplify;
use geo::dimensions::{Dimensions, HasDimensions};
use geo_types::Geometry;
use vectile_core::{transform_geometry, Envelope, MathTransform};

/// One step of the chain. The set of stages is closed, so a plain enum
/// executed by iteration replaces any dispatch machinery.
#[derive(Debug)]
pub(crate) enum Stage {
    Preprocess,
    Transform(MathTransform),
    Simplify(f64),
    Clip(Envelope),
    CollapseCollections,
}

/// An executable stage chain for one render request.
///
/// Feed each input geometry through [`run`](Pipeline::run); `Ok(None)`
/// means the feature was fully eliminated and nothing should be emitted
/// for it. A per-geometry error leaves the pipeline usable for the
/// remaining geometries of the request.
#[derive(Debug)]
pub struct Pipeline {
    context: Context,
    stages: Vec<Stage>,
}

impl Pipeline {
    pub(crate) fn new(context: Context, stages: Vec<Stage>) -> Self {
        Self { context, stages }
    }

    /// The request context this pipeline was built from
    pub fn context(&self) -> &Context {
        &self.context
    }

    /// Push one geometry through the stage chain.
    pub fn run(&mut self, geom: Geometry<f64>) -> Result<Option<Geometry<f64>>> {
        let Pipeline { context, stages } = self;
        let mut current = geom;

        for stage in stages.iter() {
            let next = match stage {
                Stage::Preprocess => preprocess(context, current)?,
                Stage::Transform(tx) => Some(
                    transform_geometry(tx, &current).map_err(PipelineError::GeometryTransform)?,
                ),
                Stage::Simplify(tolerance) => {
                    Some(simplify::simplify_preserving(&current, *tolerance))
                }
                Stage::Clip(envelope) => clip::clip_remove_degenerate(&current, envelope),
                Stage::CollapseCollections => Some(collapse_collections(current)),
            };
            match next {
                Some(g) if !g.is_empty() => current = g,
                _ => return Ok(None),
            }
        }
        Ok(Some(current))
    }
}

/// Projection-handler clipping, then sub-pixel degeneracy collapsing.
///
/// A positive-dimension geometry whose envelope is below the per-pixel
/// threshold is either dropped (its screen cell already holds an
/// equivalent degenerate feature) or replaced by the cell's coarse
/// stand-in shape, so it skips the expensive downstream stages.
fn preprocess(context: &mut Context, geom: Geometry<f64>) -> Result<Option<Geometry<f64>>> {
    let geom = match &context.projection_handler {
        Some(handler) => match handler.pre_process(&geom) {
            Some(g) => g,
            None => return Ok(None),
        },
        None => geom,
    };

    if geom.is_empty() {
        return Ok(None);
    }

    let dimensions = geom.dimensions();
    if matches!(dimensions, Dimensions::ZeroDimensional | Dimensions::Empty) {
        return Ok(Some(geom));
    }

    let Some(envelope) = Envelope::of(&geom) else {
        return Ok(None);
    };
    if context.screen_map.can_simplify(&envelope) {
        if context
            .screen_map
            .check_and_set(&envelope)
            .map_err(PipelineError::GeometryTransform)?
        {
            return Ok(None);
        }
        return Ok(Some(
            context.screen_map.simplified_shape(&envelope, dimensions),
        ));
    }
    Ok(Some(geom))
}

/// Unwrap single-member collections, through any nesting depth, so the
/// stage is idempotent for every input.
fn collapse_collections(mut geom: Geometry<f64>) -> Geometry<f64> {
    loop {
        match geom {
            Geometry::GeometryCollection(mut gc) if gc.0.len() == 1 => {
                geom = gc.0.remove(0);
            }
            other => return other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::{polygon, GeometryCollection, Point};

    #[test]
    fn test_collapse_singleton() {
        let inner = Geometry::Point(Point::new(1.0, 2.0));
        let gc = Geometry::GeometryCollection(GeometryCollection::new_from(vec![inner.clone()]));
        assert_eq!(collapse_collections(gc), inner);
    }

    #[test]
    fn test_collapse_nested_singleton_is_idempotent() {
        let inner = Geometry::Point(Point::new(1.0, 2.0));
        let nested = Geometry::GeometryCollection(GeometryCollection::new_from(vec![
            Geometry::GeometryCollection(GeometryCollection::new_from(vec![inner.clone()])),
        ]));

        let once = collapse_collections(nested.clone());
        let twice = collapse_collections(once.clone());
        assert_eq!(once, twice);
        assert_eq!(once, inner);
    }

    #[test]
    fn test_collapse_leaves_multi_member_collections() {
        let gc = Geometry::GeometryCollection(GeometryCollection::new_from(vec![
            Geometry::Point(Point::new(1.0, 2.0)),
            Geometry::Point(Point::new(3.0, 4.0)),
        ]));
        assert_eq!(collapse_collections(gc.clone()), gc);
    }

    #[test]
    fn test_collapse_passes_plain_geometry() {
        let poly: Geometry<f64> = polygon![
            (x: 0.0, y: 0.0),
            (x: 1.0, y: 0.0),
            (x: 1.0, y: 1.0),
        ]
        .into();
        assert_eq!(collapse_collections(poly.clone()), poly);
    }
}
