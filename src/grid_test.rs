#![allow(clippy::float_cmp)]

use super::*;

const EPS: f64 = 1e-9;

fn square(cols: u32, rows: u32) -> Grid {
    Grid::new(GridType::Square, cols, rows)
}

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < EPS
}

// =============================================================
// Sizing
// =============================================================

#[test]
fn cell_pixel_size_square_divides_axes() {
    let size = cell_pixel_size(&square(10, 5), 500.0, 200.0);
    assert_eq!(size, Size::new(50.0, 40.0));
}

#[test]
fn cell_pixel_size_hex_vertical_derives_from_width() {
    let grid = Grid::new(GridType::HexVertical, 10, 10);
    let size = cell_pixel_size(&grid, 10.0 * SQRT_3 * 10.0, 999.0);
    assert!(approx(size.width, 10.0 * SQRT_3));
    assert!(approx(size.height, 20.0));
}

#[test]
fn cell_pixel_size_hex_horizontal_derives_from_height() {
    let grid = Grid::new(GridType::HexHorizontal, 10, 4);
    let size = cell_pixel_size(&grid, 999.0, 4.0 * SQRT_3 * 10.0);
    assert!(approx(size.width, 20.0));
    assert!(approx(size.height, 10.0 * SQRT_3));
}

#[test]
fn cell_pixel_size_invalid_grid_is_zero() {
    assert_eq!(cell_pixel_size(&square(0, 10), 500.0, 500.0), Size::zero());
    assert_eq!(cell_pixel_size(&square(10, 0), 500.0, 500.0), Size::zero());
    assert!(!grid_size_valid(Vector2::new(0.0, 3.0)));
    assert!(grid_size_valid(Vector2::new(1.0, 3.0)));
}

#[test]
fn grid_pixel_size_and_offset_follow_inset() {
    let mut grid = square(10, 10);
    grid.inset = GridInset { top_left: Vector2::new(0.1, 0.2), bottom_right: Vector2::new(0.9, 0.7) };
    let size = grid_pixel_size(&grid, 1000.0, 500.0);
    assert!(approx(size.width, 800.0));
    assert!(approx(size.height, 250.0));
    let offset = grid_pixel_offset(&grid, 1000.0, 500.0);
    assert!(approx(offset.x, 100.0));
    assert!(approx(offset.y, 100.0));
}

#[test]
fn default_inset_makes_square_cells_square() {
    let grid = square(10, 5);
    let inset = grid_default_inset(&grid, 1000.0, 1000.0);
    assert_eq!(inset.top_left, Vector2::new(0.0, 0.0));
    assert!(approx(inset.bottom_right.x, 1.0));
    assert!(approx(inset.bottom_right.y, 0.5));
    let px = grid_pixel_size(&Grid { inset, ..grid.clone() }, 1000.0, 1000.0);
    let cell = cell_pixel_size(&grid, px.width, px.height);
    assert!(approx(cell.width, cell.height));
}

#[test]
fn default_inset_hex_horizontal_spans_full_width() {
    let grid = Grid::new(GridType::HexHorizontal, 4, 3);
    let inset = grid_default_inset(&grid, 650.0, 1000.0);
    let radius = 650.0 / (1.5 * 4.0 + 0.5);
    assert!(approx(inset.bottom_right.y * 1000.0, radius * SQRT_3 * 3.0));
}

#[test]
fn default_inset_invalid_grid_is_full_map() {
    assert_eq!(grid_default_inset(&square(0, 0), 100.0, 100.0), GridInset::default());
}

// =============================================================
// Cell lookup
// =============================================================

#[test]
fn square_cell_snap_scenario() {
    let grid = square(10, 10);
    let cell = Size::new(50.0, 50.0);
    assert_eq!(nearest_cell_coordinates(&grid, 24.0, 24.0, cell), CellCoord::new(0, 0));
    assert_eq!(nearest_cell_coordinates(&grid, 51.0, 10.0, cell), CellCoord::new(1, 0));
}

#[test]
fn square_cell_negative_positions_floor() {
    let grid = square(10, 10);
    let cell = Size::new(50.0, 50.0);
    assert_eq!(nearest_cell_coordinates(&grid, -1.0, -49.0, cell), CellCoord::new(-1, -1));
}

#[test]
fn zero_cell_size_resolves_to_origin() {
    let grid = Grid::new(GridType::HexVertical, 0, 0);
    assert_eq!(nearest_cell_coordinates(&grid, 120.0, 33.0, Size::zero()), CellCoord::new(0, 0));
}

#[test]
fn square_cell_center() {
    let grid = square(10, 10);
    let center = cell_center(&grid, 2, 3, Size::new(50.0, 40.0));
    assert_eq!(center, Vector2::new(125.0, 140.0));
}

#[test]
fn hex_vertical_odd_rows_are_staggered() {
    let grid = Grid::new(GridType::HexVertical, 10, 10);
    let cell = Size::new(10.0 * SQRT_3, 20.0);
    let even = cell_center(&grid, 0, 0, cell);
    let odd = cell_center(&grid, 0, 1, cell);
    assert!(approx(odd.x - even.x, cell.width / 2.0));
    assert!(approx(odd.y - even.y, 15.0));
}

#[test]
fn hex_horizontal_odd_columns_are_staggered() {
    let grid = Grid::new(GridType::HexHorizontal, 10, 10);
    let cell = Size::new(20.0, 10.0 * SQRT_3);
    let even = cell_center(&grid, 0, 0, cell);
    let odd = cell_center(&grid, 1, 0, cell);
    assert!(approx(odd.x - even.x, 15.0));
    assert!(approx(odd.y - even.y, cell.height / 2.0));
}

#[test]
fn hex_centers_resolve_to_their_own_cell() {
    for kind in [GridType::HexVertical, GridType::HexHorizontal] {
        let grid = Grid::new(kind, 12, 12);
        let cell = cell_pixel_size(&grid, 600.0, 600.0);
        for col in -3..12 {
            for row in -3..12 {
                let c = cell_center(&grid, col, row, cell);
                assert_eq!(
                    nearest_cell_coordinates(&grid, c.x, c.y, cell),
                    CellCoord::new(col, row),
                    "{kind:?} ({col}, {row})"
                );
            }
        }
    }
}

#[test]
fn hex_points_near_center_resolve_to_that_cell() {
    let grid = Grid::new(GridType::HexVertical, 10, 10);
    let cell = Size::new(10.0 * SQRT_3, 20.0);
    let c = cell_center(&grid, 3, 4, cell);
    for (dx, dy) in [(3.0, 0.0), (-3.0, 0.0), (0.0, 5.0), (0.0, -5.0), (4.0, 4.0)] {
        assert_eq!(nearest_cell_coordinates(&grid, c.x + dx, c.y + dy, cell), CellCoord::new(3, 4));
    }
}

#[test]
fn cube_round_keeps_sum_zero_when_axes_disagree() {
    // Independent rounding gives (0, -1, 0), which is not a cube.
    let cube = cube_round(0.4, -0.8, 0.4);
    assert_eq!(cube.x + cube.y + cube.z, 0);
    assert_eq!(cube, CubeCoordinate { x: 0, y: -1, z: 1 });
}

// =============================================================
// Corners
// =============================================================

#[test]
fn square_corners_are_axis_aligned() {
    let corners = cell_corners(&square(4, 4), 25.0, 25.0, Size::new(50.0, 50.0));
    assert_eq!(
        corners,
        vec![
            Vector2::new(0.0, 0.0),
            Vector2::new(50.0, 0.0),
            Vector2::new(50.0, 50.0),
            Vector2::new(0.0, 50.0),
        ]
    );
}

#[test]
fn hex_corners_are_six_points_on_radius() {
    for (kind, cell) in [
        (GridType::HexVertical, Size::new(10.0 * SQRT_3, 20.0)),
        (GridType::HexHorizontal, Size::new(20.0, 10.0 * SQRT_3)),
    ] {
        let grid = Grid::new(kind, 5, 5);
        let center = Vector2::new(40.0, 40.0);
        let corners = cell_corners(&grid, center.x, center.y, cell);
        assert_eq!(corners.len(), 6);
        for corner in &corners {
            assert!(approx(corner.distance(center), 10.0));
        }
    }
}

#[test]
fn hex_vertical_first_corner_points_up() {
    let grid = Grid::new(GridType::HexVertical, 5, 5);
    let corners = cell_corners(&grid, 0.0, 0.0, Size::new(10.0 * SQRT_3, 20.0));
    assert!(approx(corners[0].x, 0.0));
    assert!(approx(corners[0].y, -10.0));
}

#[test]
fn hex_horizontal_first_corner_points_right() {
    let grid = Grid::new(GridType::HexHorizontal, 5, 5);
    let corners = cell_corners(&grid, 0.0, 0.0, Size::new(20.0, 10.0 * SQRT_3));
    assert!(approx(corners[0].x, 10.0));
    assert!(approx(corners[0].y, 0.0));
}

// =============================================================
// Offset ↔ cube
// =============================================================

#[test]
fn offset_cube_round_trip() {
    for kind in [GridType::HexVertical, GridType::HexHorizontal] {
        for x in -50..=50 {
            for y in -50..=50 {
                let offset = CellCoord::new(x, y);
                let cube = hex_offset_to_cube(kind, offset);
                assert_eq!(cube.x + cube.y + cube.z, 0);
                assert_eq!(hex_cube_to_offset(kind, cube), offset, "{kind:?} ({x}, {y})");
            }
        }
    }
}

#[test]
fn cube_distance_counts_hex_steps() {
    let a = CubeCoordinate::from_xz(0, 0);
    let b = CubeCoordinate::from_xz(2, -1);
    assert_eq!(a.distance(b), 2);
    assert_eq!(b.distance(a), 2);
}

// =============================================================
// Distance
// =============================================================

fn square_distance(kind: MeasurementType, from: (i64, i64), to: (i64, i64)) -> f64 {
    let grid = square(10, 10).with_measurement(kind);
    let cell = Size::new(50.0, 50.0);
    let a = cell_center(&grid, from.0, from.1, cell);
    let b = cell_center(&grid, to.0, to.1, cell);
    grid_distance(&grid, a, b, cell)
}

#[test]
fn chebyshev_distance() {
    assert_eq!(square_distance(MeasurementType::Chebyshev, (0, 0), (3, 2)), 3.0);
}

#[test]
fn alternating_distance() {
    assert_eq!(square_distance(MeasurementType::Alternating, (0, 0), (3, 2)), 4.0);
    assert_eq!(square_distance(MeasurementType::Alternating, (0, 0), (1, 1)), 1.0);
    assert_eq!(square_distance(MeasurementType::Alternating, (0, 0), (4, 4)), 6.0);
}

#[test]
fn manhattan_distance_square() {
    assert_eq!(square_distance(MeasurementType::Manhattan, (0, 0), (3, 2)), 5.0);
}

#[test]
fn euclidean_distance_square() {
    let d = square_distance(MeasurementType::Euclidean, (0, 0), (3, 2));
    assert!(approx(d, 13.0_f64.sqrt()));
}

#[test]
fn manhattan_distance_hex_uses_cubes() {
    let grid = Grid::new(GridType::HexVertical, 10, 10).with_measurement(MeasurementType::Manhattan);
    let cell = Size::new(10.0 * SQRT_3, 20.0);
    let a = cell_center(&grid, 0, 0, cell);
    assert_eq!(grid_distance(&grid, a, cell_center(&grid, 2, 0, cell), cell), 2.0);
    assert_eq!(grid_distance(&grid, a, cell_center(&grid, 0, 2, cell), cell), 2.0);
    assert_eq!(grid_distance(&grid, a, cell_center(&grid, 3, 3, cell), cell), 5.0);
}

#[test]
fn hex_ignores_square_only_rules() {
    let cell = Size::new(20.0, 10.0 * SQRT_3);
    for kind in [MeasurementType::Chebyshev, MeasurementType::Alternating] {
        let grid = Grid::new(GridType::HexHorizontal, 10, 10).with_measurement(kind);
        let a = cell_center(&grid, 0, 0, cell);
        let b = cell_center(&grid, 3, 0, cell);
        assert_eq!(grid_distance(&grid, a, b, cell), 3.0);
    }
}

#[test]
fn distance_to_self_is_zero_for_every_rule() {
    let rules = [
        MeasurementType::Chebyshev,
        MeasurementType::Alternating,
        MeasurementType::Euclidean,
        MeasurementType::Manhattan,
    ];
    for kind in [GridType::Square, GridType::HexVertical, GridType::HexHorizontal] {
        for rule in rules {
            let grid = Grid::new(kind, 8, 8).with_measurement(rule);
            let cell = cell_pixel_size(&grid, 400.0, 400.0);
            let p = Vector2::new(123.4, 56.7);
            assert_eq!(grid_distance(&grid, p, p, cell), 0.0, "{kind:?} {rule:?}");
        }
    }
}

#[test]
fn distance_on_invalid_grid_is_zero() {
    let grid = square(0, 0).with_measurement(MeasurementType::Euclidean);
    assert_eq!(grid_distance(&grid, Vector2::new(0.0, 0.0), Vector2::new(10.0, 10.0), Size::zero()), 0.0);
}

// =============================================================
// Scale
// =============================================================

#[test]
fn parse_scale_integer_with_unit() {
    assert_eq!(parse_grid_scale("5ft"), GridScale { multiplier: 5.0, unit: "ft".into(), digits: 0 });
}

#[test]
fn parse_scale_fraction_with_unit() {
    assert_eq!(parse_grid_scale("1.5m"), GridScale { multiplier: 1.5, unit: "m".into(), digits: 1 });
    assert_eq!(parse_grid_scale("2.25km"), GridScale { multiplier: 2.25, unit: "km".into(), digits: 2 });
}

#[test]
fn parse_scale_bare_number() {
    assert_eq!(parse_grid_scale("10"), GridScale { multiplier: 10.0, unit: String::new(), digits: 0 });
}

#[test]
fn parse_scale_trailing_dot_ignores_fraction() {
    assert_eq!(parse_grid_scale("3.ft"), GridScale { multiplier: 3.0, unit: "ft".into(), digits: 0 });
}

#[test]
fn parse_scale_without_number_is_identity() {
    assert_eq!(parse_grid_scale("ft"), GridScale::identity());
    assert_eq!(parse_grid_scale(""), GridScale::identity());
    assert_eq!(parse_grid_scale(".5ft"), GridScale::identity());
}

#[test]
fn scale_formats_distance() {
    assert_eq!(parse_grid_scale("5ft").format(3.0), "15ft");
    assert_eq!(parse_grid_scale("1.5m").format(3.0), "4.5m");
}

// =============================================================
// Serde
// =============================================================

#[test]
fn grid_serde_uses_host_field_names() {
    let json = serde_json::to_value(Grid::new(GridType::HexVertical, 3, 4)).unwrap();
    assert_eq!(json["type"], "hexVertical");
    assert_eq!(json["measurement"]["type"], "chebyshev");
    assert_eq!(json["inset"]["bottomRight"]["x"], 1.0);
}
