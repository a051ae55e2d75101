//! Shared numeric constants for the tabletop crate.

// ── Math ────────────────────────────────────────────────────────

/// √3: ratio between a hex cell's short axis and its radius.
pub const SQRT_3: f64 = 1.732_050_807_568_877_2;

// ── Snapping ────────────────────────────────────────────────────

/// Fraction of a cell within which guides and grid snapping engage.
pub const DEFAULT_SNAP_SENSITIVITY: f64 = 0.2;

/// Fog shapes with more vertices than this are skipped when generating guides.
pub const DEFAULT_GUIDE_MAX_POINTS: usize = 64;

/// Ramer–Douglas–Peucker tolerance for brush strokes, in normalized units.
pub const DEFAULT_SIMPLIFY_TOLERANCE: f64 = 0.001;

// ── Merged fog ──────────────────────────────────────────────────

pub const MERGED_FOG_COLOR: &str = "black";
pub const MERGED_FOG_STROKE_WIDTH: f64 = 0.5;
