//! Clipping against a rectangular envelope
//!
//! Two clipping paths: a robust boolean-overlay path and a non-robust
//! fallback (Sutherland-Hodgman for rings, Cohen-Sutherland for
//! segments). The overlay can fail on degenerate or invalid input; when
//! it does, the fallback runs exactly once and never raises itself.
//!
//! [`clip_remove_degenerate`] wraps the base clip with the
//! type-preservation policy tile encoders rely on: clipping a polygon
//! must never surface a stray line or point artifact as a top-level
//! result.

use geo::{BooleanOps, HasDimensions};
use geo_types::{
    Coord, Geometry, GeometryCollection, LineString, MultiLineString, MultiPoint, MultiPolygon,
    Point, Polygon,
};
use std::panic::{catch_unwind, AssertUnwindSafe};
use tracing::debug;
use vectile_core::Envelope;

/// Geometric family of an input, deciding which clip pieces survive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Family {
    Point,
    Line,
    Polygon,
    Mixed,
}

fn family_of(geom: &Geometry<f64>) -> Family {
    match geom {
        Geometry::Point(_) | Geometry::MultiPoint(_) => Family::Point,
        Geometry::Line(_) | Geometry::LineString(_) | Geometry::MultiLineString(_) => Family::Line,
        Geometry::Polygon(_)
        | Geometry::MultiPolygon(_)
        | Geometry::Rect(_)
        | Geometry::Triangle(_) => Family::Polygon,
        Geometry::GeometryCollection(_) => Family::Mixed,
    }
}

/// The robust path could not produce a result for this geometry
struct RobustClipFailure;

/// Clip a geometry against the envelope.
///
/// Runs the robust overlay first; on failure, retries once with the
/// non-robust clipper. Returns None when nothing of the geometry lies
/// inside the envelope.
pub fn clip_geometry(geom: &Geometry<f64>, env: &Envelope) -> Option<Geometry<f64>> {
    clip_geometry_with(robust_clip, fallback_clip, geom, env)
}

fn clip_geometry_with<R, F>(
    robust: R,
    fallback: F,
    geom: &Geometry<f64>,
    env: &Envelope,
) -> Option<Geometry<f64>>
where
    R: Fn(&Geometry<f64>, &Envelope) -> Result<Option<Geometry<f64>>, RobustClipFailure>,
    F: Fn(&Geometry<f64>, &Envelope) -> Option<Geometry<f64>>,
{
    match robust(geom, env) {
        Ok(result) => result,
        Err(RobustClipFailure) => {
            debug!("robust clip failed, retrying with the non-robust clipper");
            fallback(geom, env)
        }
    }
}

/// Clip with degenerate-geometry removal, the user-facing clip.
///
/// Collections are clipped per member and re-wrapped; single geometries
/// are clipped and then coerced back to the input's family, so a
/// polygon input only ever yields polygons, a line input only lines, a
/// point input only points.
pub fn clip_remove_degenerate(geom: &Geometry<f64>, env: &Envelope) -> Option<Geometry<f64>> {
    if geom.is_empty() {
        return None;
    }

    if let Geometry::GeometryCollection(gc) = geom {
        return collection_clip(gc, env);
    }

    let result = clip_geometry(geom, env)?;
    if result.is_empty() {
        return None;
    }

    match family_of(geom) {
        Family::Point => only_points(&result),
        Family::Line => only_lines(&result),
        Family::Polygon => only_polygons(&result),
        Family::Mixed => Some(result),
    }
}

/// Clip each member on its own and re-wrap the survivors. None when no
/// member survives.
fn collection_clip(gc: &GeometryCollection<f64>, env: &Envelope) -> Option<Geometry<f64>> {
    let mut kept = Vec::new();
    for member in &gc.0 {
        if let Some(clipped) = clip_remove_degenerate(member, env) {
            if !clipped.is_empty() {
                kept.push(clipped);
            }
        }
    }
    if kept.is_empty() {
        None
    } else {
        Some(Geometry::GeometryCollection(GeometryCollection::new_from(
            kept,
        )))
    }
}

// ── Robust path (boolean overlay) ────────────────────────────────────────

fn robust_clip(
    geom: &Geometry<f64>,
    env: &Envelope,
) -> Result<Option<Geometry<f64>>, RobustClipFailure> {
    match geom {
        Geometry::Point(p) => Ok(if env.contains_point(p.x(), p.y()) {
            Some(geom.clone())
        } else {
            None
        }),
        Geometry::MultiPoint(mp) => {
            let kept: Vec<Point<f64>> = mp
                .0
                .iter()
                .filter(|p| env.contains_point(p.x(), p.y()))
                .cloned()
                .collect();
            Ok(wrap_points(kept))
        }
        Geometry::Line(line) => {
            robust_clip_lines(&MultiLineString::new(vec![LineString::from(*line)]), env)
        }
        Geometry::LineString(ls) => {
            robust_clip_lines(&MultiLineString::new(vec![ls.clone()]), env)
        }
        Geometry::MultiLineString(mls) => robust_clip_lines(mls, env),
        Geometry::Polygon(p) => robust_clip_polygons(&MultiPolygon::new(vec![p.clone()]), env),
        Geometry::MultiPolygon(mp) => robust_clip_polygons(mp, env),
        Geometry::Rect(r) => {
            robust_clip_polygons(&MultiPolygon::new(vec![r.to_polygon()]), env)
        }
        Geometry::Triangle(t) => {
            robust_clip_polygons(&MultiPolygon::new(vec![t.to_polygon()]), env)
        }
        Geometry::GeometryCollection(gc) => {
            let mut kept = Vec::new();
            for member in &gc.0 {
                if let Some(clipped) = robust_clip(member, env)? {
                    if !clipped.is_empty() {
                        kept.push(clipped);
                    }
                }
            }
            Ok(if kept.is_empty() {
                None
            } else {
                Some(Geometry::GeometryCollection(GeometryCollection::new_from(
                    kept,
                )))
            })
        }
    }
}

fn robust_clip_lines(
    mls: &MultiLineString<f64>,
    env: &Envelope,
) -> Result<Option<Geometry<f64>>, RobustClipFailure> {
    let window = env.to_polygon();
    let clipped = catch_unwind(AssertUnwindSafe(|| window.clip(mls, false)))
        .map_err(|_| RobustClipFailure)?;
    let pieces: Vec<LineString<f64>> =
        clipped.0.into_iter().filter(|ls| ls.0.len() >= 2).collect();
    Ok(wrap_lines(pieces))
}

fn robust_clip_polygons(
    mp: &MultiPolygon<f64>,
    env: &Envelope,
) -> Result<Option<Geometry<f64>>, RobustClipFailure> {
    let window = MultiPolygon::new(vec![env.to_polygon()]);
    let clipped = catch_unwind(AssertUnwindSafe(|| mp.intersection(&window)))
        .map_err(|_| RobustClipFailure)?;
    Ok(wrap_polygons(clipped.0))
}

// ── Non-robust fallback (Sutherland-Hodgman / Cohen-Sutherland) ─────────

/// Degraded-precision clip. Total: never fails, at the price of
/// boundary-running edges on polygons cut into several pieces.
fn fallback_clip(geom: &Geometry<f64>, env: &Envelope) -> Option<Geometry<f64>> {
    match geom {
        Geometry::Point(p) => {
            if env.contains_point(p.x(), p.y()) {
                Some(geom.clone())
            } else {
                None
            }
        }
        Geometry::MultiPoint(mp) => {
            let kept: Vec<Point<f64>> = mp
                .0
                .iter()
                .filter(|p| env.contains_point(p.x(), p.y()))
                .cloned()
                .collect();
            wrap_points(kept)
        }
        Geometry::Line(line) => {
            wrap_lines(clip_linestring(&LineString::from(*line), env))
        }
        Geometry::LineString(ls) => wrap_lines(clip_linestring(ls, env)),
        Geometry::MultiLineString(mls) => {
            let pieces: Vec<LineString<f64>> = mls
                .0
                .iter()
                .flat_map(|ls| clip_linestring(ls, env))
                .collect();
            wrap_lines(pieces)
        }
        Geometry::Polygon(p) => wrap_polygons(clip_polygon(p, env).into_iter().collect()),
        Geometry::MultiPolygon(mp) => {
            let pieces: Vec<Polygon<f64>> =
                mp.0.iter().filter_map(|p| clip_polygon(p, env)).collect();
            wrap_polygons(pieces)
        }
        Geometry::Rect(r) => wrap_polygons(clip_polygon(&r.to_polygon(), env).into_iter().collect()),
        Geometry::Triangle(t) => {
            wrap_polygons(clip_polygon(&t.to_polygon(), env).into_iter().collect())
        }
        Geometry::GeometryCollection(gc) => {
            let kept: Vec<Geometry<f64>> = gc
                .0
                .iter()
                .filter_map(|member| fallback_clip(member, env))
                .collect();
            if kept.is_empty() {
                None
            } else {
                Some(Geometry::GeometryCollection(GeometryCollection::new_from(
                    kept,
                )))
            }
        }
    }
}

/// Edge of the clipping rectangle
#[derive(Debug, Clone, Copy)]
enum Edge {
    Left,
    Right,
    Bottom,
    Top,
}

impl Edge {
    fn is_inside(&self, p: &Coord, env: &Envelope) -> bool {
        match self {
            Edge::Left => p.x >= env.min_x,
            Edge::Right => p.x <= env.max_x,
            Edge::Bottom => p.y >= env.min_y,
            Edge::Top => p.y <= env.max_y,
        }
    }

    fn intersect(&self, p: &Coord, q: &Coord, env: &Envelope) -> Coord {
        let dx = q.x - p.x;
        let dy = q.y - p.y;
        match self {
            Edge::Left => {
                let t = (env.min_x - p.x) / dx;
                Coord { x: env.min_x, y: p.y + t * dy }
            }
            Edge::Right => {
                let t = (env.max_x - p.x) / dx;
                Coord { x: env.max_x, y: p.y + t * dy }
            }
            Edge::Bottom => {
                let t = (env.min_y - p.y) / dy;
                Coord { x: p.x + t * dx, y: env.min_y }
            }
            Edge::Top => {
                let t = (env.max_y - p.y) / dy;
                Coord { x: p.x + t * dx, y: env.max_y }
            }
        }
    }
}

/// Clip a ring against one edge (Sutherland-Hodgman step). Input and
/// output are open rings (no closing vertex).
fn clip_ring_edge(vertices: &[Coord], edge: Edge, env: &Envelope) -> Vec<Coord> {
    if vertices.is_empty() {
        return Vec::new();
    }

    let mut output = Vec::new();
    let n = vertices.len();

    for i in 0..n {
        let current = &vertices[i];
        let next = &vertices[(i + 1) % n];

        let current_inside = edge.is_inside(current, env);
        let next_inside = edge.is_inside(next, env);

        match (current_inside, next_inside) {
            (true, true) => output.push(*next),
            (true, false) => output.push(edge.intersect(current, next, env)),
            (false, true) => {
                output.push(edge.intersect(current, next, env));
                output.push(*next);
            }
            (false, false) => {}
        }
    }

    output
}

fn clip_ring(ring: &LineString<f64>, env: &Envelope) -> Option<LineString<f64>> {
    let mut vertices = ring.0.clone();
    if vertices.len() > 1 && vertices.first() == vertices.last() {
        vertices.pop();
    }

    for edge in [Edge::Left, Edge::Right, Edge::Bottom, Edge::Top] {
        vertices = clip_ring_edge(&vertices, edge, env);
        if vertices.is_empty() {
            return None;
        }
    }

    if vertices.len() < 3 {
        return None;
    }
    vertices.push(vertices[0]);
    Some(LineString::new(vertices))
}

fn clip_polygon(polygon: &Polygon<f64>, env: &Envelope) -> Option<Polygon<f64>> {
    let exterior = clip_ring(polygon.exterior(), env)?;
    let interiors: Vec<LineString<f64>> = polygon
        .interiors()
        .iter()
        .filter_map(|ring| clip_ring(ring, env))
        .filter(|ring| ring.0.len() >= 4)
        .collect();
    Some(Polygon::new(exterior, interiors))
}

/// Cohen-Sutherland region codes
const INSIDE: u8 = 0b0000;
const LEFT: u8 = 0b0001;
const RIGHT: u8 = 0b0010;
const BOTTOM: u8 = 0b0100;
const TOP: u8 = 0b1000;

fn outcode(p: Coord, env: &Envelope) -> u8 {
    let mut code = INSIDE;
    if p.x < env.min_x {
        code |= LEFT;
    }
    if p.x > env.max_x {
        code |= RIGHT;
    }
    if p.y < env.min_y {
        code |= BOTTOM;
    }
    if p.y > env.max_y {
        code |= TOP;
    }
    code
}

fn clip_segment(mut p0: Coord, mut p1: Coord, env: &Envelope) -> Option<(Coord, Coord)> {
    let mut code0 = outcode(p0, env);
    let mut code1 = outcode(p1, env);

    loop {
        if (code0 | code1) == 0 {
            return Some((p0, p1)); // both inside
        }
        if (code0 & code1) != 0 {
            return None; // both outside the same region
        }

        let code_out = if code0 != 0 { code0 } else { code1 };
        let dx = p1.x - p0.x;
        let dy = p1.y - p0.y;

        let new_point = if code_out & TOP != 0 {
            let t = (env.max_y - p0.y) / dy;
            Coord { x: p0.x + t * dx, y: env.max_y }
        } else if code_out & BOTTOM != 0 {
            let t = (env.min_y - p0.y) / dy;
            Coord { x: p0.x + t * dx, y: env.min_y }
        } else if code_out & RIGHT != 0 {
            let t = (env.max_x - p0.x) / dx;
            Coord { x: env.max_x, y: p0.y + t * dy }
        } else {
            let t = (env.min_x - p0.x) / dx;
            Coord { x: env.min_x, y: p0.y + t * dy }
        };

        if code_out == code0 {
            p0 = new_point;
            code0 = outcode(p0, env);
        } else {
            p1 = new_point;
            code1 = outcode(p1, env);
        }
    }
}

/// Clip a line string, splitting it into pieces where it leaves and
/// re-enters the envelope.
fn clip_linestring(ls: &LineString<f64>, env: &Envelope) -> Vec<LineString<f64>> {
    let mut pieces: Vec<LineString<f64>> = Vec::new();
    let mut current: Vec<Coord> = Vec::new();

    for window in ls.0.windows(2) {
        match clip_segment(window[0], window[1], env) {
            Some((c0, c1)) => {
                if current.last() != Some(&c0) {
                    // The segment does not continue the current piece
                    if current.len() >= 2 {
                        pieces.push(LineString::new(std::mem::take(&mut current)));
                    } else {
                        current.clear();
                    }
                    current.push(c0);
                }
                current.push(c1);
            }
            None => {
                if current.len() >= 2 {
                    pieces.push(LineString::new(std::mem::take(&mut current)));
                } else {
                    current.clear();
                }
            }
        }
    }
    if current.len() >= 2 {
        pieces.push(LineString::new(current));
    }
    pieces
}

// ── Family coercion ──────────────────────────────────────────────────────

/// Collect every point-dimension piece of a geometry
fn points_of(geom: &Geometry<f64>) -> Vec<Point<f64>> {
    match geom {
        Geometry::Point(p) => vec![*p],
        Geometry::MultiPoint(mp) => mp.0.clone(),
        Geometry::GeometryCollection(gc) => gc.0.iter().flat_map(points_of).collect(),
        _ => Vec::new(),
    }
}

/// Collect every line-dimension piece of a geometry
fn lines_of(geom: &Geometry<f64>) -> Vec<LineString<f64>> {
    match geom {
        Geometry::Line(line) => vec![LineString::from(*line)],
        Geometry::LineString(ls) => vec![ls.clone()],
        Geometry::MultiLineString(mls) => mls.0.clone(),
        Geometry::GeometryCollection(gc) => gc.0.iter().flat_map(lines_of).collect(),
        _ => Vec::new(),
    }
}

/// Collect every polygon piece of a geometry
fn polygons_of(geom: &Geometry<f64>) -> Vec<Polygon<f64>> {
    match geom {
        Geometry::Polygon(p) => vec![p.clone()],
        Geometry::MultiPolygon(mp) => mp.0.clone(),
        Geometry::Rect(r) => vec![r.to_polygon()],
        Geometry::Triangle(t) => vec![t.to_polygon()],
        Geometry::GeometryCollection(gc) => gc.0.iter().flat_map(polygons_of).collect(),
        _ => Vec::new(),
    }
}

fn only_points(result: &Geometry<f64>) -> Option<Geometry<f64>> {
    if matches!(result, Geometry::Point(_) | Geometry::MultiPoint(_)) {
        return Some(result.clone());
    }
    wrap_points(points_of(result))
}

fn only_lines(result: &Geometry<f64>) -> Option<Geometry<f64>> {
    if matches!(result, Geometry::LineString(_) | Geometry::MultiLineString(_)) {
        return Some(result.clone());
    }
    wrap_lines(lines_of(result))
}

fn only_polygons(result: &Geometry<f64>) -> Option<Geometry<f64>> {
    if matches!(result, Geometry::Polygon(_) | Geometry::MultiPolygon(_)) {
        return Some(result.clone());
    }
    wrap_polygons(polygons_of(result))
}

fn wrap_points(pieces: Vec<Point<f64>>) -> Option<Geometry<f64>> {
    match pieces.len() {
        0 => None,
        1 => Some(Geometry::Point(pieces[0])),
        _ => Some(Geometry::MultiPoint(MultiPoint::new(pieces))),
    }
}

fn wrap_lines(mut pieces: Vec<LineString<f64>>) -> Option<Geometry<f64>> {
    match pieces.len() {
        0 => None,
        1 => Some(Geometry::LineString(pieces.remove(0))),
        _ => Some(Geometry::MultiLineString(MultiLineString::new(pieces))),
    }
}

/// More than one piece goes straight into a multipolygon. The pieces may
/// share edges, so the assembly is not always valid by strict adjacency
/// rules; no repair is attempted.
fn wrap_polygons(mut pieces: Vec<Polygon<f64>>) -> Option<Geometry<f64>> {
    match pieces.len() {
        0 => None,
        1 => Some(Geometry::Polygon(pieces.remove(0))),
        _ => Some(Geometry::MultiPolygon(MultiPolygon::new(pieces))),
    }
}
