//! Shared numeric and color constants for the map engine.

// ── Projection ──────────────────────────────────────────────────

/// Screen pixels per degree of latitude/longitude at zoom scale 1.0.
pub const PIXELS_PER_DEGREE: f64 = 10_000.0;

/// Slippy-map zoom level that corresponds to zoom scale 1.0.
pub const BASE_ZOOM_LEVEL: f64 = 12.0;

// ── Hit-testing ─────────────────────────────────────────────────

/// Default click tolerance around a robot marker center, in screen pixels.
pub const HIT_TOLERANCE_PX: f64 = 15.0;

// ── Markers ─────────────────────────────────────────────────────

/// Robot marker radius when not selected.
pub const MARKER_RADIUS_PX: f64 = 8.0;

/// Robot marker radius when selected.
pub const SELECTED_MARKER_RADIUS_PX: f64 = 12.0;

/// Drop shadow offset (both axes) and radius growth relative to the marker.
pub const SHADOW_OFFSET_PX: f64 = 2.0;

/// Waypoint dot radius.
pub const WAYPOINT_RADIUS_PX: f64 = 4.0;

/// Heading indicator length from the marker center.
pub const HEADING_LENGTH_PX: f64 = 15.0;

/// Arrowhead stroke length.
pub const ARROWHEAD_PX: f64 = 4.0;

/// Arrowhead half-angle in radians (30°).
pub const ARROWHEAD_ANGLE: f64 = std::f64::consts::PI / 6.0;

/// Downward offset of the robot glyph baseline inside the marker.
pub const ROBOT_GLYPH_OFFSET_PX: f64 = 3.0;

/// Vertical offset of the marker label above the marker center.
pub const LABEL_OFFSET_PX: f64 = 18.0;

/// Offset of the low-battery glyph from the marker center.
pub const BATTERY_GLYPH_OFFSET: (f64, f64) = (15.0, -10.0);

/// Reference grid spacing. Fixed, independent of zoom.
pub const GRID_SPACING_PX: f64 = 50.0;

// ── Battery thresholds (percent) ────────────────────────────────

pub const LOW_BATTERY_PCT: f64 = 30.0;
pub const CRITICAL_BATTERY_PCT: f64 = 15.0;

// ── Popup card ──────────────────────────────────────────────────

pub const POPUP_WIDTH_PX: f64 = 280.0;
pub const POPUP_LIFT_PX: f64 = 200.0;
pub const POPUP_MIN_TOP_PX: f64 = 10.0;

// ── Palette ─────────────────────────────────────────────────────

pub const BACKGROUND: &str = "#f8f9fa";
pub const GRID_LINE: &str = "#e9ecef";
pub const FIELD_COLOR: &str = "#059669";
pub const PATH_ACTIVE: &str = "#22c55e";
pub const PATH_MUTED: &str = "#94a3b8";
pub const WAYPOINT_RING: &str = "#6b7280";
pub const WHITE: &str = "#ffffff";
pub const BLACK: &str = "#000000";
pub const SHADOW: &str = "rgba(0, 0, 0, 0.2)";
pub const STATUS_ACTIVE: &str = "#22c55e";
pub const STATUS_IDLE: &str = "#eab308";
pub const STATUS_WARNING: &str = "#f97316";
pub const STATUS_OFFLINE: &str = "#ef4444";
pub const BATTERY_LOW: &str = "#f97316";
pub const BATTERY_CRITICAL: &str = "#ef4444";
