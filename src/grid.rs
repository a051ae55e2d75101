//! Grid coordinate math: pixel ↔ cell ↔ cube conversions and distance metrics.
//!
//! Three layouts are supported. `Square` cells are axis-aligned rectangles.
//! `HexVertical` grids use pointy-top hexes in columns, with odd rows shifted
//! right by half a cell. `HexHorizontal` grids use flat-top hexes in rows,
//! with odd columns shifted down by half a cell. In every layout the centre of
//! cell `(0, 0)` sits half a cell in from the grid origin.
//!
//! All functions here are pure. Pixel inputs are relative to the grid origin
//! (the inset top-left), not the map origin; see [`grid_pixel_offset`].

#[cfg(test)]
#[path = "grid_test.rs"]
mod grid_test;

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::consts::SQRT_3;
use crate::math::{Size, Vector2};

/// Cell layout of a grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GridType {
    Square,
    HexVertical,
    HexHorizontal,
}

impl GridType {
    #[must_use]
    pub fn is_hex(self) -> bool {
        matches!(self, Self::HexVertical | Self::HexHorizontal)
    }
}

/// Rule used to count the distance between two cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MeasurementType {
    /// Diagonals cost one step. Square grids only.
    Chebyshev,
    /// Every second diagonal costs two steps. Square grids only.
    Alternating,
    /// Straight-line distance measured in cells.
    Euclidean,
    /// Orthogonal steps on square grids, hex steps on hex grids.
    Manhattan,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridMeasurement {
    #[serde(rename = "type")]
    pub kind: MeasurementType,
    /// Display scale per cell, e.g. `"5ft"`. Parsed with [`parse_grid_scale`].
    pub scale: String,
}

/// Normalized margin placing the playable grid inside the map image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridInset {
    pub top_left: Vector2,
    pub bottom_right: Vector2,
}

impl Default for GridInset {
    fn default() -> Self {
        Self { top_left: Vector2::new(0.0, 0.0), bottom_right: Vector2::new(1.0, 1.0) }
    }
}

/// Grid definition attached to a map.
///
/// `size` holds whole column/row counts. A grid with either count at zero is
/// invalid and every cell query against it yields zero-sized results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    pub size: Vector2,
    pub inset: GridInset,
    #[serde(rename = "type")]
    pub kind: GridType,
    pub measurement: GridMeasurement,
}

impl Grid {
    /// A full-map grid with the default `chebyshev` / `"5ft"` measurement.
    #[must_use]
    pub fn new(kind: GridType, columns: u32, rows: u32) -> Self {
        Self {
            size: Vector2::new(f64::from(columns), f64::from(rows)),
            inset: GridInset::default(),
            kind,
            measurement: GridMeasurement { kind: MeasurementType::Chebyshev, scale: "5ft".into() },
        }
    }

    #[must_use]
    pub fn with_measurement(mut self, kind: MeasurementType) -> Self {
        self.measurement.kind = kind;
        self
    }
}

/// Integer cell coordinate: column in `x`, row in `y`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct CellCoord {
    pub x: i64,
    pub y: i64,
}

impl CellCoord {
    #[must_use]
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }
}

/// Hex cube coordinate. Always satisfies `x + y + z == 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CubeCoordinate {
    pub x: i64,
    pub y: i64,
    pub z: i64,
}

impl CubeCoordinate {
    /// Build from the two independent axes; `y` is derived.
    #[must_use]
    pub const fn from_xz(x: i64, z: i64) -> Self {
        Self { x, y: -x - z, z }
    }

    /// Number of hex steps between two cubes.
    #[must_use]
    pub fn distance(self, other: Self) -> i64 {
        ((self.x - other.x).abs() + (self.y - other.y).abs() + (self.z - other.z).abs()) / 2
    }
}

// =============================================================================
// VALIDITY / SIZING
// =============================================================================

/// True when both axis counts are positive.
#[must_use]
pub fn grid_size_valid(size: Vector2) -> bool {
    size.x.is_finite() && size.y.is_finite() && size.x > 0.0 && size.y > 0.0
}

/// Pixel size of a single cell for a grid drawn `grid_width` × `grid_height` pixels.
///
/// Hex grids derive a radius from one axis only: `HexVertical` from the width,
/// `HexHorizontal` from the height. The other axis follows from the radius.
#[must_use]
pub fn cell_pixel_size(grid: &Grid, grid_width: f64, grid_height: f64) -> Size {
    if !grid_size_valid(grid.size) {
        return Size::zero();
    }
    match grid.kind {
        GridType::Square => Size::new(grid_width / grid.size.x, grid_height / grid.size.y),
        GridType::HexVertical => {
            let radius = grid_width / grid.size.x / SQRT_3;
            Size::new(radius * SQRT_3, radius * 2.0)
        }
        GridType::HexHorizontal => {
            let radius = grid_height / grid.size.y / SQRT_3;
            Size::new(radius * 2.0, radius * SQRT_3)
        }
    }
}

/// Pixel size of the whole grid area inside a `map_width` × `map_height` map.
#[must_use]
pub fn grid_pixel_size(grid: &Grid, map_width: f64, map_height: f64) -> Size {
    let span = grid.inset.bottom_right.sub(grid.inset.top_left);
    Size::new(span.x * map_width, span.y * map_height)
}

/// Pixel offset of the grid origin from the map origin.
#[must_use]
pub fn grid_pixel_offset(grid: &Grid, map_width: f64, map_height: f64) -> Vector2 {
    grid.inset.top_left.mul(Vector2::new(map_width, map_height))
}

/// Full-width inset whose height makes the grid's cells regular.
///
/// Square cells come out square and hex cells come out regular. Invalid grids
/// get the full-map inset.
#[must_use]
pub fn grid_default_inset(grid: &Grid, map_width: f64, map_height: f64) -> GridInset {
    if !grid_size_valid(grid.size) || map_width <= 0.0 || map_height <= 0.0 {
        return GridInset::default();
    }
    let height = match grid.kind {
        GridType::Square => map_width / grid.size.x * grid.size.y,
        GridType::HexVertical => {
            let radius = map_width / grid.size.x / SQRT_3;
            radius * (1.5 * grid.size.y + 0.5)
        }
        GridType::HexHorizontal => {
            let radius = map_width / (1.5 * grid.size.x + 0.5);
            radius * SQRT_3 * grid.size.y
        }
    };
    GridInset { top_left: Vector2::new(0.0, 0.0), bottom_right: Vector2::new(1.0, height / map_height) }
}

fn hex_radius(kind: GridType, cell_size: Size) -> f64 {
    match kind {
        GridType::HexHorizontal => cell_size.width / 2.0,
        _ => cell_size.height / 2.0,
    }
}

// =============================================================================
// CELL POSITIONS
// =============================================================================

/// Pixel centre of the cell at `(col, row)`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn cell_center(grid: &Grid, col: i64, row: i64, cell_size: Size) -> Vector2 {
    let (c, r) = (col as f64, row as f64);
    let half = cell_size.as_vector().scale(0.5);
    match grid.kind {
        GridType::Square => Vector2::new((c + 0.5) * cell_size.width, (r + 0.5) * cell_size.height),
        GridType::HexVertical => {
            let radius = hex_radius(grid.kind, cell_size);
            let stagger = (row & 1) as f64 * 0.5;
            Vector2::new(cell_size.width * (c + stagger) + half.x, radius * 1.5 * r + half.y)
        }
        GridType::HexHorizontal => {
            let radius = hex_radius(grid.kind, cell_size);
            let stagger = (col & 1) as f64 * 0.5;
            Vector2::new(radius * 1.5 * c + half.x, cell_size.height * (r + stagger) + half.y)
        }
    }
}

/// Cell containing the pixel position `(x, y)`.
///
/// Hex grids go through fractional cube coordinates and [`cube_round`].
/// Zero-sized cells always resolve to `(0, 0)`.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn nearest_cell_coordinates(grid: &Grid, x: f64, y: f64, cell_size: Size) -> CellCoord {
    if cell_size.is_zero() || !x.is_finite() || !y.is_finite() {
        return CellCoord::default();
    }
    match grid.kind {
        GridType::Square => CellCoord::new(
            (x / cell_size.width).floor() as i64,
            (y / cell_size.height).floor() as i64,
        ),
        GridType::HexVertical => {
            let radius = hex_radius(grid.kind, cell_size);
            let px = x - cell_size.width / 2.0;
            let py = y - cell_size.height / 2.0;
            let q = (SQRT_3 / 3.0 * px - py / 3.0) / radius;
            let r = (2.0 / 3.0 * py) / radius;
            hex_cube_to_offset(grid.kind, cube_round(q, -q - r, r))
        }
        GridType::HexHorizontal => {
            let radius = hex_radius(grid.kind, cell_size);
            let px = x - cell_size.width / 2.0;
            let py = y - cell_size.height / 2.0;
            let q = (2.0 / 3.0 * px) / radius;
            let r = (-px / 3.0 + SQRT_3 / 3.0 * py) / radius;
            hex_cube_to_offset(grid.kind, cube_round(q, -q - r, r))
        }
    }
}

/// Round fractional cube coordinates to the nearest valid cube.
///
/// Each axis is rounded on its own, then the axis with the largest rounding
/// error is recomputed from the other two so the sum stays zero.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn cube_round(x: f64, y: f64, z: f64) -> CubeCoordinate {
    let (mut rx, mut ry, mut rz) = (x.round(), y.round(), z.round());
    let dx = (rx - x).abs();
    let dy = (ry - y).abs();
    let dz = (rz - z).abs();

    if dx > dy && dx > dz {
        rx = -ry - rz;
    } else if dy > dz {
        ry = -rx - rz;
    } else {
        rz = -rx - ry;
    }
    CubeCoordinate { x: rx as i64, y: ry as i64, z: rz as i64 }
}

/// Corners of the cell centred at `(center_x, center_y)`.
///
/// Square cells yield four corners clockwise from the top-left. Hex cells
/// yield six, stepping 60° from "up" (pointy-top) or "right" (flat-top).
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn cell_corners(grid: &Grid, center_x: f64, center_y: f64, cell_size: Size) -> Vec<Vector2> {
    let center = Vector2::new(center_x, center_y);
    match grid.kind {
        GridType::Square => {
            let hw = cell_size.width / 2.0;
            let hh = cell_size.height / 2.0;
            vec![
                Vector2::new(center_x - hw, center_y - hh),
                Vector2::new(center_x + hw, center_y - hh),
                Vector2::new(center_x + hw, center_y + hh),
                Vector2::new(center_x - hw, center_y + hh),
            ]
        }
        GridType::HexVertical | GridType::HexHorizontal => {
            let radius = hex_radius(grid.kind, cell_size);
            let reference = if grid.kind == GridType::HexVertical {
                Vector2::new(0.0, -radius)
            } else {
                Vector2::new(radius, 0.0)
            };
            (0..6_i32).map(|i| center.add(reference.rotate(60.0 * f64::from(i)))).collect()
        }
    }
}

// =============================================================================
// OFFSET ↔ CUBE
// =============================================================================

/// Offset coordinate of a cube. `HexHorizontal` uses odd-column offsets; any
/// other layout uses odd-row offsets.
#[must_use]
pub fn hex_cube_to_offset(kind: GridType, cube: CubeCoordinate) -> CellCoord {
    match kind {
        GridType::HexHorizontal => CellCoord::new(cube.x, cube.z + (cube.x - (cube.x & 1)) / 2),
        _ => CellCoord::new(cube.x + (cube.z - (cube.z & 1)) / 2, cube.z),
    }
}

/// Inverse of [`hex_cube_to_offset`].
#[must_use]
pub fn hex_offset_to_cube(kind: GridType, offset: CellCoord) -> CubeCoordinate {
    match kind {
        GridType::HexHorizontal => CubeCoordinate::from_xz(offset.x, offset.y - (offset.x - (offset.x & 1)) / 2),
        _ => CubeCoordinate::from_xz(offset.x - (offset.y - (offset.y & 1)) / 2, offset.y),
    }
}

// =============================================================================
// DISTANCE
// =============================================================================

/// Distance in cells between pixel positions `a` and `b`.
///
/// `euclidean` works on raw pixels; every other rule first resolves both
/// points to cells. Hex grids ignore the square-only rules and count hex steps.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn grid_distance(grid: &Grid, a: Vector2, b: Vector2, cell_size: Size) -> f64 {
    if cell_size.is_zero() {
        return 0.0;
    }
    if grid.measurement.kind == MeasurementType::Euclidean {
        return a.sub(b).div_size(cell_size).length();
    }

    let ca = nearest_cell_coordinates(grid, a.x, a.y, cell_size);
    let cb = nearest_cell_coordinates(grid, b.x, b.y, cell_size);
    if grid.kind.is_hex() {
        let steps = hex_offset_to_cube(grid.kind, ca).distance(hex_offset_to_cube(grid.kind, cb));
        return steps as f64;
    }

    let dx = (ca.x - cb.x).abs();
    let dy = (ca.y - cb.y).abs();
    let steps = match grid.measurement.kind {
        MeasurementType::Chebyshev => dx.max(dy),
        MeasurementType::Alternating => {
            let (lo, hi) = (dx.min(dy), dx.max(dy));
            hi - lo + lo * 3 / 2
        }
        MeasurementType::Manhattan | MeasurementType::Euclidean => dx + dy,
    };
    steps as f64
}

// =============================================================================
// SCALE
// =============================================================================

/// Parsed grid scale such as `"5ft"` or `"1.5m"`.
#[derive(Debug, Clone, PartialEq)]
pub struct GridScale {
    pub multiplier: f64,
    pub unit: String,
    /// Number of fractional digits written in the source text.
    pub digits: usize,
}

impl GridScale {
    #[must_use]
    pub fn identity() -> Self {
        Self { multiplier: 1.0, unit: String::new(), digits: 0 }
    }

    /// Render a cell distance in scale units, e.g. `3.0` cells of `"5ft"` → `"15ft"`.
    #[must_use]
    pub fn format(&self, cells: f64) -> String {
        format!("{:.*}{}", self.digits, cells * self.multiplier, self.unit)
    }
}

static SCALE_PATTERN: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"(\d*)(\.\d*)?([a-zA-Z]*)"));

/// Parse a grid scale string. Text with no leading number yields
/// [`GridScale::identity`].
#[must_use]
pub fn parse_grid_scale(text: &str) -> GridScale {
    let Ok(pattern) = SCALE_PATTERN.as_ref() else {
        return GridScale::identity();
    };
    let Some(caps) = pattern.captures(text) else {
        return GridScale::identity();
    };
    let Ok(integer) = caps.get(1).map_or("", |m| m.as_str()).parse::<f64>() else {
        return GridScale::identity();
    };
    let unit = caps.get(3).map_or("", |m| m.as_str()).to_string();

    match caps.get(2).map(|m| m.as_str()) {
        Some(fraction) => match fraction.parse::<f64>() {
            Ok(value) => GridScale { multiplier: integer + value, unit, digits: fraction.len() - 1 },
            Err(_) => GridScale { multiplier: integer, unit, digits: 0 },
        },
        None => GridScale { multiplier: integer, unit, digits: 0 },
    }
}
