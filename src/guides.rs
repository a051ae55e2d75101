//! Alignment guides and grid snapping for drawing tools.
//!
//! Everything here works in pixel space and is recomputed from scratch on
//! every call. Callers throttle invocation (typically to animation-frame
//! rate); nothing is cached between calls.

#[cfg(test)]
#[path = "guides_test.rs"]
mod guides_test;

use serde::{Deserialize, Serialize};

use crate::grid::{Grid, cell_center, cell_corners, nearest_cell_coordinates};
use crate::math::{BoundingBox, Size, Vector2};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GuideOrientation {
    Horizontal,
    Vertical,
}

/// A transient alignment line. `distance` is from the brush to the line, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Guide {
    pub start: Vector2,
    pub end: Vector2,
    pub orientation: GuideOrientation,
    pub distance: f64,
}

/// Guides from the map bounds and the grid cell under the brush.
///
/// `grid_offset` is the pixel position of the grid origin within the map
/// (see [`crate::grid::grid_pixel_offset`]).
#[must_use]
pub fn guides_from_grid_cell(
    brush: Vector2,
    grid: &Grid,
    cell_size: Size,
    grid_offset: Vector2,
    sensitivity: f64,
    map_size: Vector2,
) -> Vec<Guide> {
    let mut boxes = vec![BoundingBox::from_corners(Vector2::new(0.0, 0.0), map_size)];
    if !cell_size.is_zero() {
        let local = brush.sub(grid_offset);
        let cell = nearest_cell_coordinates(grid, local.x, local.y, cell_size);
        let center = cell_center(grid, cell.x, cell.y, cell_size).add(grid_offset);
        if let Some(bounds) = BoundingBox::from_points(&cell_corners(grid, center.x, center.y, cell_size)) {
            boxes.push(bounds);
        }
    }
    guides_from_bounding_boxes(brush, &boxes, cell_size, sensitivity)
}

/// Guides along the edges and centre lines of each box that lie within
/// `sensitivity` cells of the brush.
#[must_use]
pub fn guides_from_bounding_boxes(
    brush: Vector2,
    boxes: &[BoundingBox],
    cell_size: Size,
    sensitivity: f64,
) -> Vec<Guide> {
    if cell_size.is_zero() {
        return Vec::new();
    }
    let mut guides = Vec::new();
    for bounds in boxes {
        for x in [bounds.min.x, bounds.center.x, bounds.max.x] {
            let distance = (brush.x - x).abs();
            if distance / cell_size.width < sensitivity {
                guides.push(Guide {
                    start: Vector2::new(x, bounds.min.y),
                    end: Vector2::new(x, bounds.max.y),
                    orientation: GuideOrientation::Vertical,
                    distance,
                });
            }
        }
    }
    for bounds in boxes {
        for y in [bounds.min.y, bounds.center.y, bounds.max.y] {
            let distance = (brush.y - y).abs();
            if distance / cell_size.height < sensitivity {
                guides.push(Guide {
                    start: Vector2::new(bounds.min.x, y),
                    end: Vector2::new(bounds.max.x, y),
                    orientation: GuideOrientation::Horizontal,
                    distance,
                });
            }
        }
    }
    guides
}

fn closest(guides: &[Guide], orientation: GuideOrientation) -> Option<Guide> {
    guides
        .iter()
        .filter(|g| g.orientation == orientation)
        .min_by(|a, b| a.distance.total_cmp(&b.distance))
        .copied()
}

/// The closest horizontal and the closest vertical guide, at most one each.
///
/// With both present the segments are stretched into a crosshair; a lone
/// guide is stretched to reach the brush.
#[must_use]
pub fn find_best_guides(brush: Vector2, guides: &[Guide]) -> Vec<Guide> {
    let mut vertical = closest(guides, GuideOrientation::Vertical);
    let mut horizontal = closest(guides, GuideOrientation::Horizontal);

    match (vertical.as_mut(), horizontal.as_mut()) {
        (Some(v), Some(h)) => {
            v.start.y = v.start.y.min(h.start.y);
            v.end.y = v.end.y.max(h.end.y);
            h.start.x = h.start.x.min(v.start.x);
            h.end.x = h.end.x.max(v.end.x);
        }
        (Some(v), None) => {
            v.start.y = v.start.y.min(brush.y);
            v.end.y = v.end.y.max(brush.y);
        }
        (None, Some(h)) => {
            h.start.x = h.start.x.min(brush.x);
            h.end.x = h.end.x.max(brush.x);
        }
        (None, None) => {}
    }
    horizontal.into_iter().chain(vertical).collect()
}

/// Snap `position` to the nearest centre, corner or edge midpoint of the cell
/// under it, if one lies within `sensitivity` of the smaller cell dimension.
/// Otherwise `position` comes back unchanged.
#[must_use]
pub fn snap_to_grid(position: Vector2, grid: &Grid, cell_size: Size, grid_offset: Vector2, sensitivity: f64) -> Vector2 {
    if cell_size.is_zero() {
        return position;
    }
    let local = position.sub(grid_offset);
    let cell = nearest_cell_coordinates(grid, local.x, local.y, cell_size);
    let center = cell_center(grid, cell.x, cell.y, cell_size);
    let corners = cell_corners(grid, center.x, center.y, cell_size);
    let midpoints = corners
        .iter()
        .zip(corners.iter().cycle().skip(1))
        .map(|(a, b)| a.add(*b).scale(0.5));

    let threshold = cell_size.width.min(cell_size.height) * sensitivity;
    std::iter::once(center)
        .chain(corners.iter().copied())
        .chain(midpoints)
        .map(|p| (p, p.distance(local)))
        .filter(|(_, d)| *d < threshold)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map_or(position, |(p, _)| p.add(grid_offset))
}
