#[cfg(test)]
#[path = "hit_test.rs"]
mod hit_test;

use tracing::warn;

use crate::fleet::{FieldBoundary, Robot};
use crate::geo::{ScreenPoint, ViewportState, project};

/// Find the robot whose marker is closest to `point`, within `tolerance_px`.
///
/// The tolerance is inclusive: a marker exactly `tolerance_px` away is a hit.
/// The strictly nearest robot wins; on an exact distance tie the robot that
/// comes first in `robots` wins. Robots with invalid positions are ignored.
#[must_use]
pub fn hit_test<'a>(
    point: ScreenPoint,
    robots: &'a [Robot],
    viewport: &ViewportState,
    tolerance_px: f64,
) -> Option<&'a str> {
    let mut best: Option<(&'a Robot, f64)> = None;
    for robot in robots {
        let marker = match project(robot.position, viewport) {
            Ok(p) => p,
            Err(err) => {
                warn!(robot = %robot.id, %err, "hit test skipped robot");
                continue;
            }
        };
        let dist = point.distance_to(marker);
        if dist > tolerance_px {
            continue;
        }
        if best.is_none_or(|(_, best_dist)| dist < best_dist) {
            best = Some((robot, dist));
        }
    }
    best.map(|(robot, _)| robot.id.as_str())
}

/// Find the field whose polygon contains `point`.
///
/// Fields are drawn in slice order, so the last containing field is the one
/// on top and wins. Fields with fewer than 3 vertices or invalid vertices are
/// ignored, as they are never drawn.
#[must_use]
pub fn field_hit_test<'a>(point: ScreenPoint, fields: &'a [FieldBoundary], viewport: &ViewportState) -> Option<&'a str> {
    fields.iter().rev().find_map(|field| {
        let outline: Result<Vec<_>, _> = field.vertices.iter().map(|g| project(*g, viewport)).collect();
        match outline {
            Ok(outline) if contains_point(&outline, point) => Some(field.id.as_str()),
            Ok(_) => None,
            Err(err) => {
                warn!(field = %field.id, %err, "hit test skipped field");
                None
            }
        }
    })
}

/// Even-odd ray casting against an implicitly closed polygon.
fn contains_point(polygon: &[ScreenPoint], p: ScreenPoint) -> bool {
    if polygon.len() < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = polygon.len() - 1;
    for (i, a) in polygon.iter().enumerate() {
        let b = polygon[j];
        if (a.y > p.y) != (b.y > p.y) && p.x < (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x {
            inside = !inside;
        }
        j = i;
    }
    inside
}
