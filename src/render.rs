//! Rendering: draws the full map scene onto a [`Surface`].
//!
//! This module receives read-only views of the fleet snapshot, viewport and
//! selection and produces draw calls. It does not mutate application state
//! and uses no clocks or random numbers, so identical inputs always produce
//! identical output.
//!
//! Layers, back to front:
//!
//! 1. background and reference grid
//! 2. field polygons
//! 3. mission paths
//! 4. waypoint markers
//! 5. robot markers with their robot glyph
//! 6. heading indicators
//! 7. low-battery glyphs
//! 8. marker labels
//!
//! A layer with no data issues no draw calls. Entities with invalid geometry
//! are logged and skipped; everything else still renders. Surface failures
//! abort the pass and propagate to the caller.

#[cfg(test)]
#[path = "render_test.rs"]
mod render_test;

use tracing::{debug, warn};

use crate::consts::{
    ARROWHEAD_ANGLE, ARROWHEAD_PX, BACKGROUND, BATTERY_CRITICAL, BATTERY_GLYPH_OFFSET, BATTERY_LOW, BLACK,
    CRITICAL_BATTERY_PCT, FIELD_COLOR, GRID_LINE, GRID_SPACING_PX, HEADING_LENGTH_PX, LABEL_OFFSET_PX,
    LOW_BATTERY_PCT, MARKER_RADIUS_PX, PATH_ACTIVE, PATH_MUTED, ROBOT_GLYPH_OFFSET_PX, SELECTED_MARKER_RADIUS_PX, SHADOW,
    SHADOW_OFFSET_PX, WAYPOINT_RADIUS_PX, WAYPOINT_RING, WHITE,
};
use crate::error::MapError;
use crate::fleet::{FieldBoundary, Robot, RobotStatus, Snapshot};
use crate::geo::{GeoPoint, ScreenPoint, ViewportState, project};
use crate::selection::SelectionState;
use crate::surface::Surface;

const FIELD_DASH: [f64; 2] = [10.0, 5.0];
const PATH_DASH: [f64; 2] = [5.0, 5.0];
const FIELD_FILL_ALPHA: f64 = 0.1;
const FIELD_LINE_WIDTH: f64 = 3.0;
const PATH_LINE_WIDTH: f64 = 2.0;
const SELECTED_RING_WIDTH: f64 = 3.0;
const BATTERY_GLYPH: &str = "\u{26a0}";
const ROBOT_GLYPH: &str = "\u{1f916}";
const ROBOT_GLYPH_FONT: &str = "bold 8px sans-serif";

/// Which optional overlays are shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayerToggles {
    pub fields: bool,
    /// Mission paths and their waypoints.
    pub missions: bool,
}

impl Default for LayerToggles {
    fn default() -> Self {
        Self { fields: true, missions: true }
    }
}

/// Clear the surface and draw every layer.
///
/// # Errors
///
/// Returns `Err` if a surface call fails. Invalid entities are not errors;
/// they are skipped.
pub fn render<S: Surface + ?Sized>(
    surface: &mut S,
    viewport: &ViewportState,
    snapshot: &Snapshot,
    selection: &SelectionState,
    layers: LayerToggles,
) -> Result<(), MapError> {
    draw_background(surface, viewport);

    if layers.fields && !snapshot.fields.is_empty() {
        draw_fields(surface, viewport, &snapshot.fields)?;
    }

    if layers.missions && !snapshot.missions.is_empty() {
        let paths = resolve_paths(viewport, snapshot);
        draw_paths(surface, &paths)?;
        draw_waypoints(surface, &paths)?;
    }

    let markers = project_robots(viewport, &snapshot.robots);
    if markers.is_empty() {
        return Ok(());
    }
    draw_markers(surface, &markers, selection)?;
    draw_headings(surface, &markers);
    draw_battery_glyphs(surface, &markers)?;
    draw_labels(surface, &markers)?;
    Ok(())
}

// =============================================================
// Layer 1: background
// =============================================================

fn draw_background<S: Surface + ?Sized>(surface: &mut S, viewport: &ViewportState) {
    let w = f64::from(viewport.surface_width());
    let h = f64::from(viewport.surface_height());

    surface.clear_rect(0.0, 0.0, w, h);
    surface.set_fill_style(BACKGROUND);
    surface.fill_rect(0.0, 0.0, w, h);

    surface.set_stroke_style(GRID_LINE);
    surface.set_line_width(1.0);
    surface.begin_path();
    let mut x = 0.0;
    while x < w {
        surface.move_to(x, 0.0);
        surface.line_to(x, h);
        x += GRID_SPACING_PX;
    }
    let mut y = 0.0;
    while y < h {
        surface.move_to(0.0, y);
        surface.line_to(w, y);
        y += GRID_SPACING_PX;
    }
    surface.stroke();
}

// =============================================================
// Layer 2: fields
// =============================================================

fn draw_fields<S: Surface + ?Sized>(
    surface: &mut S,
    viewport: &ViewportState,
    fields: &[FieldBoundary],
) -> Result<(), MapError> {
    for field in fields {
        let outline = match project_all(&field.vertices, viewport) {
            Ok(points) if points.len() >= 3 => points,
            Ok(points) => {
                warn!(field = %field.id, vertices = points.len(), "field skipped: fewer than 3 vertices");
                continue;
            }
            Err(err) => {
                warn!(field = %field.id, %err, "field skipped");
                continue;
            }
        };

        surface.save();
        trace_polyline(surface, &outline);
        surface.close_path();

        surface.set_global_alpha(FIELD_FILL_ALPHA);
        surface.set_fill_style(FIELD_COLOR);
        surface.fill();
        surface.set_global_alpha(1.0);

        surface.set_line_dash(&FIELD_DASH)?;
        surface.set_stroke_style(FIELD_COLOR);
        surface.set_line_width(FIELD_LINE_WIDTH);
        surface.stroke();
        surface.restore();
    }
    Ok(())
}

// =============================================================
// Layers 3-4: mission paths and waypoints
// =============================================================

struct ResolvedPath {
    color: &'static str,
    points: Vec<ScreenPoint>,
}

/// Project every drawable path. Paths whose owner is missing from the
/// snapshot are skipped entirely rather than drawn with a fallback style.
fn resolve_paths(viewport: &ViewportState, snapshot: &Snapshot) -> Vec<ResolvedPath> {
    let mut out = Vec::with_capacity(snapshot.missions.len());
    for (robot_id, path) in &snapshot.missions {
        let Some(owner) = snapshot.robot(robot_id) else {
            debug!(err = %MapError::MissingOwner(robot_id.clone()), "mission path skipped");
            continue;
        };
        if path.is_empty() {
            continue;
        }
        match project_all(path, viewport) {
            Ok(points) => out.push(ResolvedPath { color: path_color(owner.status), points }),
            Err(err) => warn!(robot = %robot_id, %err, "mission path skipped"),
        }
    }
    out
}

fn path_color(status: RobotStatus) -> &'static str {
    match status {
        RobotStatus::Active => PATH_ACTIVE,
        RobotStatus::Idle | RobotStatus::Warning | RobotStatus::Offline => PATH_MUTED,
    }
}

fn draw_paths<S: Surface + ?Sized>(surface: &mut S, paths: &[ResolvedPath]) -> Result<(), MapError> {
    if paths.is_empty() {
        return Ok(());
    }
    surface.save();
    surface.set_line_dash(&PATH_DASH)?;
    surface.set_line_width(PATH_LINE_WIDTH);
    for path in paths {
        surface.set_stroke_style(path.color);
        trace_polyline(surface, &path.points);
        surface.stroke();
    }
    surface.restore();
    Ok(())
}

fn draw_waypoints<S: Surface + ?Sized>(surface: &mut S, paths: &[ResolvedPath]) -> Result<(), MapError> {
    if paths.is_empty() {
        return Ok(());
    }
    surface.save();
    surface.set_line_dash(&[])?;
    surface.set_fill_style(WHITE);
    surface.set_stroke_style(WAYPOINT_RING);
    surface.set_line_width(PATH_LINE_WIDTH);
    for p in paths.iter().flat_map(|path| &path.points) {
        surface.begin_path();
        surface.circle(p.x, p.y, WAYPOINT_RADIUS_PX)?;
        surface.fill();
        surface.stroke();
    }
    surface.restore();
    Ok(())
}

// =============================================================
// Layers 5-8: robots
// =============================================================

fn project_robots<'a>(viewport: &ViewportState, robots: &'a [Robot]) -> Vec<(&'a Robot, ScreenPoint)> {
    robots
        .iter()
        .filter_map(|robot| match project(robot.position, viewport) {
            Ok(p) => Some((robot, p)),
            Err(err) => {
                warn!(robot = %robot.id, %err, "robot marker skipped");
                None
            }
        })
        .collect()
}

fn draw_markers<S: Surface + ?Sized>(
    surface: &mut S,
    markers: &[(&Robot, ScreenPoint)],
    selection: &SelectionState,
) -> Result<(), MapError> {
    surface.set_font(ROBOT_GLYPH_FONT);
    surface.set_text_align("center");
    for (robot, p) in markers {
        let selected = selection.is_selected(&robot.id);
        let radius = if selected { SELECTED_MARKER_RADIUS_PX } else { MARKER_RADIUS_PX };

        surface.set_fill_style(SHADOW);
        surface.begin_path();
        surface.circle(p.x + SHADOW_OFFSET_PX, p.y + SHADOW_OFFSET_PX, radius + SHADOW_OFFSET_PX)?;
        surface.fill();

        surface.set_fill_style(robot.status.color());
        surface.begin_path();
        surface.circle(p.x, p.y, radius)?;
        surface.fill();

        if selected {
            surface.set_stroke_style(WHITE);
            surface.set_line_width(SELECTED_RING_WIDTH);
            surface.stroke();
        }

        surface.set_fill_style(WHITE);
        surface.fill_text(ROBOT_GLYPH, p.x, p.y + ROBOT_GLYPH_OFFSET_PX)?;
    }
    Ok(())
}

fn draw_headings<S: Surface + ?Sized>(surface: &mut S, markers: &[(&Robot, ScreenPoint)]) {
    let moving: Vec<_> = markers
        .iter()
        .filter(|(r, _)| r.speed > 0.0)
        .filter(|(r, _)| {
            if r.heading.is_finite() {
                return true;
            }
            warn!(robot = %r.id, heading = r.heading, "heading indicator skipped: heading not finite");
            false
        })
        .collect();
    if moving.is_empty() {
        return;
    }
    surface.set_stroke_style(BLACK);
    surface.set_line_width(PATH_LINE_WIDTH);
    for (robot, p) in moving {
        let [shaft, left, right] = heading_arrow(*p, robot.heading);
        surface.begin_path();
        surface.move_to(p.x, p.y);
        surface.line_to(shaft.x, shaft.y);
        surface.move_to(shaft.x, shaft.y);
        surface.line_to(left.x, left.y);
        surface.move_to(shaft.x, shaft.y);
        surface.line_to(right.x, right.y);
        surface.stroke();
    }
}

/// Tip of the heading line and the two arrowhead barb ends.
///
/// Heading is degrees clockwise from north; screen `y` grows downward.
fn heading_arrow(center: ScreenPoint, heading_deg: f64) -> [ScreenPoint; 3] {
    let h = heading_deg.to_radians();
    let tip = ScreenPoint::new(center.x + h.sin() * HEADING_LENGTH_PX, center.y - h.cos() * HEADING_LENGTH_PX);
    let barb = |angle: f64| {
        ScreenPoint::new(tip.x - ARROWHEAD_PX * angle.sin(), tip.y + ARROWHEAD_PX * angle.cos())
    };
    [tip, barb(h - ARROWHEAD_ANGLE), barb(h + ARROWHEAD_ANGLE)]
}

fn battery_color(battery: f64) -> Option<&'static str> {
    if battery < CRITICAL_BATTERY_PCT {
        Some(BATTERY_CRITICAL)
    } else if battery < LOW_BATTERY_PCT {
        Some(BATTERY_LOW)
    } else {
        None
    }
}

fn draw_battery_glyphs<S: Surface + ?Sized>(
    surface: &mut S,
    markers: &[(&Robot, ScreenPoint)],
) -> Result<(), MapError> {
    let (dx, dy) = BATTERY_GLYPH_OFFSET;
    let mut font_set = false;
    for (robot, p) in markers {
        let Some(color) = battery_color(robot.battery) else {
            continue;
        };
        if !font_set {
            surface.set_font("12px sans-serif");
            surface.set_text_align("center");
            font_set = true;
        }
        surface.set_fill_style(color);
        surface.fill_text(BATTERY_GLYPH, p.x + dx, p.y + dy)?;
    }
    Ok(())
}

fn draw_labels<S: Surface + ?Sized>(surface: &mut S, markers: &[(&Robot, ScreenPoint)]) -> Result<(), MapError> {
    surface.set_fill_style(BLACK);
    surface.set_font("10px sans-serif");
    surface.set_text_align("center");
    for (robot, p) in markers {
        surface.fill_text(robot.label(), p.x, p.y - LABEL_OFFSET_PX)?;
    }
    Ok(())
}

// =============================================================
// Helpers
// =============================================================

fn project_all(points: &[GeoPoint], viewport: &ViewportState) -> Result<Vec<ScreenPoint>, MapError> {
    points.iter().map(|g| project(*g, viewport)).collect()
}

/// Begin a path and trace `points` as a connected polyline.
fn trace_polyline<S: Surface + ?Sized>(surface: &mut S, points: &[ScreenPoint]) {
    surface.begin_path();
    let mut iter = points.iter();
    if let Some(first) = iter.next() {
        surface.move_to(first.x, first.y);
    }
    for p in iter {
        surface.line_to(p.x, p.y);
    }
}
