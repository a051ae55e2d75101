//! Fog-of-war polygon engine: cut, subtract and merge over fog shape lists.
//!
//! DESIGN
//! ======
//! Every entry point is a pure function of its inputs. Boolean operations are
//! delegated to `geo`; this module owns the conversion between [`FogShape`]
//! rings and `geo` polygons, ring orientation of the results, and id
//! derivation for the pieces a cut produces.
//!
//! Failures are handled one shape at a time. A shape that cannot be clipped
//! is left as it was and reported in [`FogDelta::warnings`]; the rest of the
//! batch still goes through.
//!
//! Ids of cut pieces are name-based UUIDs derived from the parent id, so two
//! peers cutting the same fog with the same shapes produce identical ids.

#[cfg(test)]
#[path = "fog_test.rs"]
mod fog_test;

use std::collections::BTreeSet;
use std::panic::{self, AssertUnwindSafe};

use geo::algorithm::orient::{Direction, Orient};
use geo::{Area, BooleanOps, Coord, LineString, MultiPolygon, Polygon, Simplify};
use tracing::warn;
use uuid::Uuid;

use crate::consts::{MERGED_FOG_COLOR, MERGED_FOG_STROKE_WIDTH};
use crate::doc::{EntityId, FogShape, PolygonData};
use crate::error::ErrorCode;
use crate::math::{BoundingBox, Vector2};

/// Namespace for ids of shapes produced by cut and subtract.
const FOG_ID_NAMESPACE: Uuid = Uuid::from_u128(0x6f67_2d63_7574_4b1d_9a3e_5c0f_d1b2_a7e4);

/// Pieces smaller than this (in normalized units²) are dropped as slivers.
const MIN_PIECE_AREA: f64 = 1e-12;

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GeometryError {
    #[error("shape {id} has a degenerate ring")]
    Degenerate { id: EntityId },
    #[error("shape {id} has non-finite coordinates")]
    NonFinite { id: EntityId },
    #[error("clipping failed for shape {id}")]
    Clipping { id: EntityId },
}

impl ErrorCode for GeometryError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Degenerate { .. } => "E_DEGENERATE_SHAPE",
            Self::NonFinite { .. } => "E_NON_FINITE_SHAPE",
            Self::Clipping { .. } => "E_CLIPPING_FAILED",
        }
    }
}

/// User-facing classification of a cut that changed nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CutNotice {
    /// There was no fog to cut at all.
    NoFogToCut,
    /// Fog exists but none of it was changed.
    AlreadyCut,
}

/// Result of a cut or subtract: the shapes replaced, the shapes created, and
/// the per-shape failures that were skipped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FogDelta {
    pub removed: Vec<FogShape>,
    pub added: Vec<FogShape>,
    pub warnings: Vec<GeometryError>,
    /// Number of fog shapes the operation ran against.
    pub input_count: usize,
}

impl FogDelta {
    /// `shapes` with the removed shapes dropped and the new ones appended.
    #[must_use]
    pub fn apply_to(&self, shapes: &[FogShape]) -> Vec<FogShape> {
        let removed: BTreeSet<&str> = self.removed.iter().map(|s| s.id.as_str()).collect();
        shapes
            .iter()
            .filter(|s| !removed.contains(s.id.as_str()))
            .cloned()
            .chain(self.added.iter().cloned())
            .collect()
    }

    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.removed.is_empty() && self.added.is_empty()
    }

    #[must_use]
    pub fn notice(&self) -> Option<CutNotice> {
        if self.input_count == 0 {
            Some(CutNotice::NoFogToCut)
        } else if self.is_noop() {
            Some(CutNotice::AlreadyCut)
        } else {
            None
        }
    }
}

// =============================================================================
// CONVERSION
// =============================================================================

fn ring_to_line_string(id: &str, ring: &[Vector2]) -> Result<LineString<f64>, GeometryError> {
    if ring.iter().any(|p| !p.is_finite()) {
        return Err(GeometryError::NonFinite { id: id.to_string() });
    }
    if ring.len() < 3 {
        return Err(GeometryError::Degenerate { id: id.to_string() });
    }
    Ok(LineString::from(ring.iter().map(|p| Coord { x: p.x, y: p.y }).collect::<Vec<_>>()))
}

/// Convert a fog shape into a `geo` polygon, rejecting rings that cannot bound an area.
///
/// # Errors
///
/// `NonFinite` for NaN/infinite coordinates, `Degenerate` for rings with
/// fewer than three points or an outer ring with no area.
pub fn shape_to_polygon(shape: &FogShape) -> Result<Polygon<f64>, GeometryError> {
    let exterior = ring_to_line_string(&shape.id, &shape.data.points)?;
    let interiors = shape
        .data
        .holes
        .iter()
        .map(|hole| ring_to_line_string(&shape.id, hole))
        .collect::<Result<Vec<_>, _>>()?;
    let polygon = Polygon::new(exterior, interiors);
    if Polygon::new(polygon.exterior().clone(), vec![]).unsigned_area() <= MIN_PIECE_AREA {
        return Err(GeometryError::Degenerate { id: shape.id.clone() });
    }
    Ok(polygon)
}

fn ring_points(ring: &LineString<f64>) -> Vec<Vector2> {
    let coords = &ring.0;
    let open_len = if ring.is_closed() && coords.len() > 1 { coords.len() - 1 } else { coords.len() };
    coords[..open_len].iter().map(|c| Vector2::new(c.x, c.y)).collect()
}

/// Ring 0 becomes `points`, the rest become `holes`, wound opposite to `points`.
fn polygon_to_data(polygon: &Polygon<f64>) -> PolygonData {
    let oriented = polygon.orient(Direction::Default);
    PolygonData {
        points: ring_points(oriented.exterior()),
        holes: oriented.interiors().iter().map(ring_points).collect(),
    }
}

fn derived_id(parent: &str, part: &str, index: usize) -> EntityId {
    Uuid::new_v5(&FOG_ID_NAMESPACE, format!("{parent}/{part}/{index}").as_bytes()).to_string()
}

/// Run a clipping call, turning a library panic into a `Clipping` error for `id`.
///
/// The panic hook still sees the panic; `telemetry::install_panic_hook`
/// routes it to `tracing`.
fn guarded<T>(id: &str, op: impl FnOnce() -> T) -> Result<T, GeometryError> {
    panic::catch_unwind(AssertUnwindSafe(op)).map_err(|_| GeometryError::Clipping { id: id.to_string() })
}

fn pieces(multi: &MultiPolygon<f64>) -> impl Iterator<Item = &Polygon<f64>> {
    multi.0.iter().filter(|p| p.unsigned_area() > MIN_PIECE_AREA)
}

/// Union of every valid shape in `shapes`. Invalid shapes are reported and skipped.
fn union_of(shapes: &[FogShape], warnings: &mut Vec<GeometryError>) -> MultiPolygon<f64> {
    let mut union = MultiPolygon::new(Vec::new());
    for shape in shapes {
        let polygon = match shape_to_polygon(shape) {
            Ok(polygon) => polygon,
            Err(e) => {
                warn!(shape_id = %shape.id, error = %e, "fog: ignoring invalid clipping shape");
                warnings.push(e);
                continue;
            }
        };
        let other = MultiPolygon::new(vec![polygon]);
        match guarded(&shape.id, || union.union(&other)) {
            Ok(merged) => union = merged,
            Err(e) => {
                warn!(shape_id = %shape.id, error = %e, "fog: ignoring clipping shape");
                warnings.push(e);
            }
        }
    }
    union
}

// =============================================================================
// CUT / SUBTRACT
// =============================================================================

/// Outcome for one fog shape: `None` when the clip region does not touch it.
fn clip_shape(
    shape: &FogShape,
    clip: &MultiPolygon<f64>,
    keep_intersection: bool,
) -> Result<Option<Vec<FogShape>>, GeometryError> {
    let subject = MultiPolygon::new(vec![shape_to_polygon(shape)?]);
    let intersection = guarded(&shape.id, || subject.intersection(clip))?;
    if intersection.unsigned_area() <= MIN_PIECE_AREA {
        return Ok(None);
    }
    let difference = guarded(&shape.id, || subject.difference(clip))?;

    let mut out: Vec<FogShape> = pieces(&difference)
        .enumerate()
        .map(|(i, polygon)| FogShape {
            id: derived_id(&shape.id, "difference", i),
            data: polygon_to_data(polygon),
            ..shape.clone()
        })
        .collect();
    if keep_intersection {
        out.extend(pieces(&intersection).enumerate().map(|(i, polygon)| FogShape {
            id: derived_id(&shape.id, "intersection", i),
            visible: false,
            data: polygon_to_data(polygon),
            ..shape.clone()
        }));
    }
    Ok(Some(out))
}

fn clip_all(clipping: &[FogShape], fog: &[FogShape], keep_intersection: bool) -> FogDelta {
    let mut delta = FogDelta { input_count: fog.len(), ..FogDelta::default() };
    if fog.is_empty() {
        return delta;
    }
    let clip = union_of(clipping, &mut delta.warnings);
    if clip.0.is_empty() {
        return delta;
    }

    for shape in fog {
        match clip_shape(shape, &clip, keep_intersection) {
            Ok(Some(replacement)) => {
                delta.removed.push(shape.clone());
                delta.added.extend(replacement);
            }
            Ok(None) => {}
            Err(e) => {
                warn!(shape_id = %shape.id, error = %e, "fog: skipping shape");
                delta.warnings.push(e);
            }
        }
    }
    delta
}

/// Cut `cutting` out of every fog shape it overlaps.
///
/// Each overlapped shape is replaced by its difference with the cut region
/// (keeping its visibility) plus the overlapped part as new hidden shapes.
/// Shapes the cut region does not touch are left as they are.
#[must_use]
pub fn cut(cutting: &[FogShape], fog: &[FogShape]) -> FogDelta {
    clip_all(cutting, fog, true)
}

/// Like [`cut`] but only the difference survives; the overlapped area is discarded.
///
/// To pre-clip a freshly drawn shape, pass the existing shapes it must not
/// overlap as `subtracting` and the new shape as `fog`.
#[must_use]
pub fn subtract(subtracting: &[FogShape], fog: &[FogShape]) -> FogDelta {
    clip_all(subtracting, fog, false)
}

// =============================================================================
// MERGE
// =============================================================================

/// Output of [`try_merge`]: the merged shapes and the shapes left out of them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FogMerge {
    pub shapes: Vec<FogShape>,
    pub warnings: Vec<GeometryError>,
}

fn merge_candidates(shapes: &[FogShape], ignore_hidden: bool) -> impl Iterator<Item = &FogShape> {
    shapes.iter().filter(move |s| s.visible || !ignore_hidden)
}

/// Union of `shapes` (visible ones only when `ignore_hidden`) as non-overlapping
/// polygons with holes, with synthetic `merged-{i}` ids.
///
/// Shapes that cannot be converted to polygons are left out and reported in
/// [`FogMerge::warnings`].
///
/// # Errors
///
/// `Clipping` when the union itself fails.
pub fn try_merge(shapes: &[FogShape], ignore_hidden: bool) -> Result<FogMerge, GeometryError> {
    let mut merged = FogMerge::default();
    let mut union = MultiPolygon::new(Vec::new());
    for shape in merge_candidates(shapes, ignore_hidden) {
        let polygon = match shape_to_polygon(shape) {
            Ok(polygon) => polygon,
            Err(e) => {
                warn!(shape_id = %shape.id, error = %e, "fog: leaving invalid shape out of merge");
                merged.warnings.push(e);
                continue;
            }
        };
        let other = MultiPolygon::new(vec![polygon]);
        union = guarded(&shape.id, || union.union(&other))?;
    }

    merged.shapes = pieces(&union)
        .enumerate()
        .map(|(i, polygon)| FogShape {
            id: format!("merged-{i}"),
            color: MERGED_FOG_COLOR.to_string(),
            stroke_width: MERGED_FOG_STROKE_WIDTH,
            visible: true,
            data: polygon_to_data(polygon),
        })
        .collect();
    Ok(merged)
}

/// [`try_merge`] that fails open: when the union fails, the shapes that
/// would have been merged come back unmerged. Hidden shapes stay out when
/// `ignore_hidden` is set.
#[must_use]
pub fn merge(shapes: &[FogShape], ignore_hidden: bool) -> Vec<FogShape> {
    match try_merge(shapes, ignore_hidden) {
        Ok(merged) => merged.shapes,
        Err(e) => {
            warn!(error = %e, count = shapes.len(), "fog: merge failed, returning shapes unmerged");
            merge_candidates(shapes, ignore_hidden).cloned().collect()
        }
    }
}

// =============================================================================
// HELPERS
// =============================================================================

/// Bounding box of each shape's outer ring.
///
/// When `max_points > 0`, shapes with more vertices than that are skipped.
#[must_use]
pub fn bounding_boxes(shapes: &[FogShape], max_points: usize) -> Vec<BoundingBox> {
    shapes
        .iter()
        .filter(|s| max_points == 0 || s.data.points.len() <= max_points)
        .filter_map(|s| BoundingBox::from_points(&s.data.points))
        .collect()
}

/// Unsigned area of a shape (outer ring minus holes); zero for invalid shapes.
#[must_use]
pub fn shape_area(shape: &FogShape) -> f64 {
    shape_to_polygon(shape).map_or(0.0, |p| p.unsigned_area())
}

/// Ramer–Douglas–Peucker reduction of a brush stroke.
#[must_use]
pub fn simplify_points(points: &[Vector2], tolerance: f64) -> Vec<Vector2> {
    if points.len() < 3 || tolerance <= 0.0 {
        return points.to_vec();
    }
    let line = LineString::from(points.iter().map(|p| Coord { x: p.x, y: p.y }).collect::<Vec<_>>());
    line.simplify(&tolerance).0.iter().map(|c| Vector2::new(c.x, c.y)).collect()
}
