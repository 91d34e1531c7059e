//! Fleet model: robots, mission paths, field boundaries, and the snapshot
//! the host hands to the engine.
//!
//! These records are owned by the dashboard's fleet store. The engine keeps
//! the latest [`Snapshot`] and only ever reads it; the renderer and hit
//! tester borrow its collections for a single pass.

#[cfg(test)]
#[path = "fleet_test.rs"]
mod fleet_test;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::consts::{STATUS_ACTIVE, STATUS_IDLE, STATUS_OFFLINE, STATUS_WARNING};
use crate::error::MapError;
use crate::geo::GeoPoint;

/// Operational status reported by a robot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RobotStatus {
    Active,
    Idle,
    Warning,
    Offline,
}

impl RobotStatus {
    /// Marker fill color for this status.
    #[must_use]
    pub fn color(self) -> &'static str {
        match self {
            Self::Active => STATUS_ACTIVE,
            Self::Idle => STATUS_IDLE,
            Self::Warning => STATUS_WARNING,
            Self::Offline => STATUS_OFFLINE,
        }
    }
}

/// A ground robot as reported by the fleet store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Robot {
    /// Unique robot identifier, e.g. `AgroBot-01`.
    pub id: String,
    pub position: GeoPoint,
    pub status: RobotStatus,
    /// Degrees clockwise from north, `[0, 360)`.
    pub heading: f64,
    /// Ground speed in m/s.
    pub speed: f64,
    /// Battery charge in percent.
    pub battery: f64,
    /// Name of the mission the robot is assigned to.
    pub mission: String,
}

impl Robot {
    /// Short marker label: the part after the last `-`, or the whole id.
    #[must_use]
    pub fn label(&self) -> &str {
        match self.id.rsplit_once('-') {
            Some((_, suffix)) if !suffix.is_empty() => suffix,
            _ => &self.id,
        }
    }
}

/// Ordered waypoints for one robot. Vector order is traversal order.
pub type MissionPath = Vec<GeoPoint>;

/// A field polygon plus the descriptive metadata shown in its popup.
///
/// Vertices are implicitly closed: the last vertex connects back to the first
/// and is not repeated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldBoundary {
    pub id: String,
    pub name: String,
    pub crop_type: String,
    /// Area in hectares.
    #[serde(default)]
    pub area: f64,
    /// Work coverage in percent.
    #[serde(default)]
    pub coverage: f64,
    #[serde(alias = "boundaries")]
    pub vertices: Vec<GeoPoint>,
}

/// Everything the map draws, as of one store read.
///
/// Missions are keyed in a `BTreeMap` so iteration order never depends on
/// hashing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub robots: Vec<Robot>,
    #[serde(default)]
    pub missions: BTreeMap<String, MissionPath>,
    #[serde(default)]
    pub fields: Vec<FieldBoundary>,
}

impl Snapshot {
    /// Decode a snapshot from the fleet store's JSON representation.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::Snapshot`] if the JSON does not match the schema.
    pub fn from_json(raw: &str) -> Result<Self, MapError> {
        Ok(serde_json::from_str(raw)?)
    }

    #[must_use]
    pub fn robot(&self, id: &str) -> Option<&Robot> {
        self.robots.iter().find(|r| r.id == id)
    }

    #[must_use]
    pub fn contains_robot(&self, id: &str) -> bool {
        self.robot(id).is_some()
    }

    #[must_use]
    pub fn field(&self, id: &str) -> Option<&FieldBoundary> {
        self.fields.iter().find(|f| f.id == id)
    }
}
