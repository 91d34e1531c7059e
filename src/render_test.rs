#![allow(clippy::float_cmp)]

use std::collections::BTreeMap;

use super::*;
use crate::surface::{DrawOp, RecordingSurface};

// =============================================================
// Helpers
// =============================================================

fn viewport() -> ViewportState {
    ViewportState::new(GeoPoint::new(47.0, 28.8), 1.0, 800, 600).unwrap()
}

fn robot(id: &str, lat: f64, lng: f64, status: RobotStatus) -> Robot {
    Robot {
        id: id.into(),
        position: GeoPoint::new(lat, lng),
        status,
        heading: 0.0,
        speed: 0.0,
        battery: 90.0,
        mission: "Wheat Harvest".into(),
    }
}

fn field(id: &str, vertices: Vec<GeoPoint>) -> FieldBoundary {
    FieldBoundary {
        id: id.into(),
        name: "North Field".into(),
        crop_type: "wheat".into(),
        area: 12.0,
        coverage: 40.0,
        vertices,
    }
}

fn square_field() -> FieldBoundary {
    field(
        "f1",
        vec![
            GeoPoint::new(47.01, 28.79),
            GeoPoint::new(47.01, 28.81),
            GeoPoint::new(46.99, 28.81),
            GeoPoint::new(46.99, 28.79),
        ],
    )
}

fn draw(snapshot: &Snapshot, selection: &SelectionState, layers: LayerToggles) -> RecordingSurface {
    let mut surface = RecordingSurface::new();
    render(&mut surface, &viewport(), snapshot, selection, layers).unwrap();
    surface
}

fn draw_default(snapshot: &Snapshot) -> RecordingSurface {
    draw(snapshot, &SelectionState::default(), LayerToggles::default())
}

fn position(surface: &RecordingSurface, pred: impl Fn(&DrawOp) -> bool) -> Option<usize> {
    surface.ops().iter().position(pred)
}

fn has(surface: &RecordingSurface, op: &DrawOp) -> bool {
    surface.ops().contains(op)
}

fn circles(surface: &RecordingSurface, radius: f64) -> Vec<ScreenPoint> {
    surface
        .ops()
        .iter()
        .filter_map(|op| match *op {
            DrawOp::Circle { x, y, radius: r } if r == radius => Some(ScreenPoint::new(x, y)),
            _ => None,
        })
        .collect()
}

fn full_snapshot() -> Snapshot {
    let mut missions = BTreeMap::new();
    missions.insert("AgroBot-01".to_owned(), vec![GeoPoint::new(47.0, 28.8), GeoPoint::new(47.001, 28.801)]);
    Snapshot {
        robots: vec![Robot { speed: 1.5, battery: 20.0, ..robot("AgroBot-01", 47.0, 28.8, RobotStatus::Active) }],
        missions,
        fields: vec![square_field()],
    }
}

// =============================================================
// Background
// =============================================================

#[test]
fn empty_snapshot_draws_only_background() {
    let s = draw_default(&Snapshot::default());
    assert_eq!(s.ops()[0], DrawOp::ClearRect { x: 0.0, y: 0.0, w: 800.0, h: 600.0 });
    assert!(has(&s, &DrawOp::FillRect { x: 0.0, y: 0.0, w: 800.0, h: 600.0 }));
    assert!(!s.ops().iter().any(|op| matches!(op, DrawOp::Circle { .. } | DrawOp::FillText { .. })));
}

#[test]
fn grid_spacing_is_fixed() {
    let s = draw_default(&Snapshot::default());
    let moves = s.ops().iter().filter(|op| matches!(op, DrawOp::MoveTo { .. })).count();
    // 16 vertical lines (0..=750) + 12 horizontal lines (0..=550).
    assert_eq!(moves, 28);
    assert!(has(&s, &DrawOp::MoveTo { x: 750.0, y: 0.0 }));
    assert!(!has(&s, &DrawOp::MoveTo { x: 800.0, y: 0.0 }));
}

// =============================================================
// Layer order
// =============================================================

#[test]
fn layers_draw_back_to_front() {
    let s = draw_default(&full_snapshot());

    let field_fill = position(&s, |op| *op == DrawOp::GlobalAlpha(FIELD_FILL_ALPHA)).unwrap();
    let path_dash = position(&s, |op| *op == DrawOp::LineDash(PATH_DASH.to_vec())).unwrap();
    let waypoint = position(&s, |op| matches!(op, DrawOp::Circle { radius, .. } if *radius == WAYPOINT_RADIUS_PX))
        .unwrap();
    let marker = position(&s, |op| matches!(op, DrawOp::Circle { radius, .. } if *radius == MARKER_RADIUS_PX))
        .unwrap();
    let heading = position(&s, |op| *op == DrawOp::StrokeStyle(BLACK.into())).unwrap();
    let glyph = position(&s, |op| matches!(op, DrawOp::FillText { text, .. } if text == BATTERY_GLYPH)).unwrap();
    let label = position(&s, |op| matches!(op, DrawOp::FillText { text, .. } if text == "01")).unwrap();

    assert!(field_fill < path_dash);
    assert!(path_dash < waypoint);
    assert!(waypoint < marker);
    assert!(marker < heading);
    assert!(heading < glyph);
    assert!(glyph < label);
}

#[test]
fn rendering_is_deterministic() {
    let snapshot = full_snapshot();
    let mut selection = SelectionState::default();
    selection.click(ScreenPoint::new(400.0, 300.0), Some("AgroBot-01"));

    let a = draw(&snapshot, &selection, LayerToggles::default());
    let b = draw(&snapshot, &selection, LayerToggles::default());
    assert_eq!(a.ops(), b.ops());
}

// =============================================================
// Fields
// =============================================================

#[test]
fn field_is_closed_dashed_and_translucent() {
    let s = draw_default(&Snapshot { fields: vec![square_field()], ..Default::default() });
    assert!(has(&s, &DrawOp::ClosePath));
    assert!(has(&s, &DrawOp::LineDash(FIELD_DASH.to_vec())));
    assert!(has(&s, &DrawOp::GlobalAlpha(FIELD_FILL_ALPHA)));
    assert!(has(&s, &DrawOp::LineWidth(FIELD_LINE_WIDTH)));
}

#[test]
fn degenerate_field_is_skipped() {
    let line = field("thin", vec![GeoPoint::new(47.0, 28.8), GeoPoint::new(47.001, 28.8)]);
    let s = draw_default(&Snapshot { fields: vec![line], ..Default::default() });
    assert!(!has(&s, &DrawOp::ClosePath));
}

#[test]
fn invalid_field_is_skipped_others_drawn() {
    let bad = field("bad", vec![GeoPoint::new(f64::NAN, 0.0), GeoPoint::new(47.0, 28.8), GeoPoint::new(47.0, 28.9)]);
    let s = draw_default(&Snapshot { fields: vec![bad, square_field()], ..Default::default() });
    let closes = s.ops().iter().filter(|op| **op == DrawOp::ClosePath).count();
    assert_eq!(closes, 1);
}

#[test]
fn fields_hidden_by_toggle() {
    let layers = LayerToggles { fields: false, missions: true };
    let s = draw(&Snapshot { fields: vec![square_field()], ..Default::default() }, &SelectionState::default(), layers);
    assert!(!has(&s, &DrawOp::ClosePath));
}

// =============================================================
// Mission paths
// =============================================================

#[test]
fn missing_owner_path_is_not_drawn() {
    let mut missions = BTreeMap::new();
    missions.insert(
        "Ghost-09".to_owned(),
        vec![GeoPoint::new(47.005, 28.805), GeoPoint::new(47.006, 28.806), GeoPoint::new(47.004, 28.807)],
    );
    let snapshot = Snapshot {
        robots: vec![robot("AgroBot-01", 47.0, 28.8, RobotStatus::Active)],
        missions,
        fields: vec![],
    };
    let s = draw_default(&snapshot);

    // Path spans x 450..470, y 240..260.
    assert!(!s.touches(ScreenPoint::new(440.0, 230.0), ScreenPoint::new(480.0, 270.0)));
    assert!(!has(&s, &DrawOp::LineDash(PATH_DASH.to_vec())));
    assert!(circles(&s, WAYPOINT_RADIUS_PX).is_empty());
}

#[test]
fn active_owner_path_is_highlighted() {
    let s = draw_default(&full_snapshot());
    assert!(has(&s, &DrawOp::StrokeStyle(PATH_ACTIVE.into())));
    assert!(!has(&s, &DrawOp::StrokeStyle(PATH_MUTED.into())));
}

#[test]
fn inactive_owner_path_is_muted() {
    for status in [RobotStatus::Idle, RobotStatus::Warning, RobotStatus::Offline] {
        let mut snapshot = full_snapshot();
        snapshot.robots[0].status = status;
        let s = draw_default(&snapshot);
        assert!(has(&s, &DrawOp::StrokeStyle(PATH_MUTED.into())), "{status:?}");
    }
}

#[test]
fn path_follows_waypoint_order() {
    let s = draw_default(&full_snapshot());
    let dash = position(&s, |op| *op == DrawOp::LineDash(PATH_DASH.to_vec())).unwrap();
    let tail = &s.ops()[dash..];
    let start = tail.iter().position(|op| *op == DrawOp::MoveTo { x: 400.0, y: 300.0 }).unwrap();
    assert!(matches!(tail[start + 1], DrawOp::LineTo { x, y } if (x - 410.0).abs() < 1e-6 && (y - 290.0).abs() < 1e-6));
}

#[test]
fn waypoints_drawn_for_each_point() {
    let s = draw_default(&full_snapshot());
    assert_eq!(circles(&s, WAYPOINT_RADIUS_PX).len(), 2);
}

#[test]
fn missions_hidden_by_toggle() {
    let layers = LayerToggles { fields: true, missions: false };
    let s = draw(&full_snapshot(), &SelectionState::default(), layers);
    assert!(!has(&s, &DrawOp::LineDash(PATH_DASH.to_vec())));
    assert!(circles(&s, WAYPOINT_RADIUS_PX).is_empty());
}

// =============================================================
// Robot markers
// =============================================================

#[test]
fn unselected_marker_uses_small_radius_and_status_color() {
    let snapshot = Snapshot { robots: vec![robot("AgroBot-02", 47.0, 28.8, RobotStatus::Idle)], ..Default::default() };
    let s = draw_default(&snapshot);
    assert_eq!(circles(&s, MARKER_RADIUS_PX), [ScreenPoint::new(400.0, 300.0)]);
    assert!(circles(&s, SELECTED_MARKER_RADIUS_PX).is_empty());
    assert!(has(&s, &DrawOp::FillStyle(RobotStatus::Idle.color().into())));
    assert!(!has(&s, &DrawOp::StrokeStyle(WHITE.into())));
}

#[test]
fn selected_marker_is_larger_with_white_ring() {
    let snapshot = Snapshot {
        robots: vec![robot("A-1", 47.0, 28.8, RobotStatus::Warning), robot("A-2", 47.001, 28.8, RobotStatus::Active)],
        ..Default::default()
    };
    let mut selection = SelectionState::default();
    selection.select("A-1");
    let s = draw(&snapshot, &selection, LayerToggles::default());

    assert_eq!(circles(&s, SELECTED_MARKER_RADIUS_PX), [ScreenPoint::new(400.0, 300.0)]);
    assert_eq!(circles(&s, MARKER_RADIUS_PX).len(), 1);
    let rings = s.ops().iter().filter(|op| **op == DrawOp::StrokeStyle(WHITE.into())).count();
    assert_eq!(rings, 1);
}

#[test]
fn marker_has_offset_shadow() {
    let snapshot = Snapshot { robots: vec![robot("A-1", 47.0, 28.8, RobotStatus::Active)], ..Default::default() };
    let s = draw_default(&snapshot);
    assert_eq!(circles(&s, MARKER_RADIUS_PX + SHADOW_OFFSET_PX), [ScreenPoint::new(402.0, 302.0)]);
}

#[test]
fn invalid_robot_is_skipped_others_drawn() {
    let snapshot = Snapshot {
        robots: vec![robot("bad-1", 95.0, 28.8, RobotStatus::Active), robot("ok-2", 47.0, 28.8, RobotStatus::Active)],
        ..Default::default()
    };
    let s = draw_default(&snapshot);
    assert_eq!(circles(&s, MARKER_RADIUS_PX).len(), 1);
    assert_eq!(s.texts(), [ROBOT_GLYPH, "2"]);
}

#[test]
fn robot_glyph_drawn_white_inside_marker() {
    let snapshot = Snapshot { robots: vec![robot("A-1", 47.0, 28.8, RobotStatus::Offline)], ..Default::default() };
    let s = draw_default(&snapshot);
    let glyph = position(&s, |op| matches!(op, DrawOp::FillText { text, .. } if text == ROBOT_GLYPH)).unwrap();
    assert_eq!(s.ops()[glyph - 1], DrawOp::FillStyle(WHITE.into()));
    assert_eq!(s.ops()[glyph], DrawOp::FillText { text: ROBOT_GLYPH.into(), x: 400.0, y: 303.0 });
    assert!(has(&s, &DrawOp::Font(ROBOT_GLYPH_FONT.into())));
    let marker = position(&s, |op| matches!(op, DrawOp::Circle { radius, .. } if *radius == MARKER_RADIUS_PX)).unwrap();
    assert!(marker < glyph);
}

// =============================================================
// Heading indicator
// =============================================================

#[test]
fn stationary_robot_has_no_heading() {
    let snapshot = Snapshot { robots: vec![robot("A-1", 47.0, 28.8, RobotStatus::Active)], ..Default::default() };
    let s = draw_default(&snapshot);
    assert!(!has(&s, &DrawOp::StrokeStyle(BLACK.into())));
}

#[test]
fn heading_east_points_right() {
    let r = Robot { speed: 2.0, heading: 90.0, ..robot("A-1", 47.0, 28.8, RobotStatus::Active) };
    let s = draw_default(&Snapshot { robots: vec![r], ..Default::default() });
    let tip = s.ops().iter().find_map(|op| match *op {
        DrawOp::LineTo { x, y } if (x - 415.0).abs() < 1e-9 => Some(y),
        _ => None,
    });
    assert!(tip.is_some_and(|y| (y - 300.0).abs() < 1e-9));
}

#[test]
fn non_finite_heading_skips_indicator_only() {
    let r = Robot { speed: 2.0, heading: f64::NAN, ..robot("A-1", 47.0, 28.8, RobotStatus::Active) };
    let s = draw_default(&Snapshot { robots: vec![r], ..Default::default() });
    assert!(!has(&s, &DrawOp::StrokeStyle(BLACK.into())));
    assert!(s.ops().iter().all(|op| op.anchor().is_none_or(|p| p.x.is_finite() && p.y.is_finite())));
    assert!(s.texts().contains(&"1"));
}

#[test]
fn heading_arrow_geometry() {
    let [tip, left, right] = heading_arrow(ScreenPoint::new(100.0, 100.0), 0.0);
    assert!((tip.x - 100.0).abs() < 1e-9);
    assert!((tip.y - 85.0).abs() < 1e-9);
    // Barbs trail behind the tip, mirrored across the shaft.
    assert!(left.y > tip.y && right.y > tip.y);
    assert!((left.x - 100.0 + (right.x - 100.0)).abs() < 1e-9);
    assert!((tip.distance_to(left) - ARROWHEAD_PX).abs() < 1e-9);
}

// =============================================================
// Battery glyph
// =============================================================

#[test]
fn battery_thresholds() {
    assert_eq!(battery_color(50.0), None);
    assert_eq!(battery_color(30.0), None);
    assert_eq!(battery_color(29.9), Some(BATTERY_LOW));
    assert_eq!(battery_color(15.0), Some(BATTERY_LOW));
    assert_eq!(battery_color(14.9), Some(BATTERY_CRITICAL));
}

#[test]
fn low_battery_glyph_is_offset_from_marker() {
    let r = Robot { battery: 10.0, ..robot("A-1", 47.0, 28.8, RobotStatus::Active) };
    let s = draw_default(&Snapshot { robots: vec![r], ..Default::default() });
    let glyph = position(&s, |op| matches!(op, DrawOp::FillText { text, .. } if text == BATTERY_GLYPH)).unwrap();
    assert_eq!(s.ops()[glyph - 1], DrawOp::FillStyle(BATTERY_CRITICAL.into()));
    assert_eq!(s.ops()[glyph], DrawOp::FillText { text: BATTERY_GLYPH.into(), x: 415.0, y: 290.0 });
}

#[test]
fn healthy_battery_has_no_glyph() {
    let s = draw_default(&Snapshot { robots: vec![robot("A-1", 47.0, 28.8, RobotStatus::Active)], ..Default::default() });
    assert!(!s.texts().contains(&BATTERY_GLYPH));
}

// =============================================================
// Labels
// =============================================================

#[test]
fn label_sits_above_marker() {
    let s = draw_default(&Snapshot { robots: vec![robot("AgroBot-01", 47.0, 28.8, RobotStatus::Active)], ..Default::default() });
    assert!(has(&s, &DrawOp::FillText { text: "01".into(), x: 400.0, y: 282.0 }));
}
