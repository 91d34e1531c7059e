use tracing::debug;

use crate::config::MapConfig;
use crate::error::MapError;
use crate::fleet::{FieldBoundary, Robot, Snapshot};
use crate::geo::{GeoPoint, ScreenPoint, ViewportState, zoom_scale_for_level};
use crate::hit::{field_hit_test, hit_test};
use crate::render::{LayerToggles, render};
use crate::scheduler::{RenderKey, RenderScheduler};
use crate::selection::{Popup, PopupKind, SelectionState};
use crate::surface::Surface;

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

/// Actions returned from engine operations for the host to process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// A click hit this robot. Emitted on every successful hit, even when the
    /// robot was already selected.
    Selected(String),
    /// The robot selection was cleared.
    Deselected,
    /// A click missed every robot and opened this field's info card.
    FieldSelected(String),
    /// The popup's "view details" affordance was activated for this robot.
    ViewRequested(String),
    /// Inputs changed; the host should schedule a frame.
    RenderNeeded,
}

/// Core engine state: all logic that doesn't depend on the canvas element.
///
/// Separated from [`crate::web::Engine`] so it can be tested without
/// WASM/browser dependencies.
#[derive(Debug)]
pub struct EngineCore {
    snapshot: Snapshot,
    snapshot_rev: u64,
    viewport: ViewportState,
    selection: SelectionState,
    layers: LayerToggles,
    config: MapConfig,
    scheduler: RenderScheduler,
}

impl EngineCore {
    /// Create an engine centered on `center` with the config's default zoom.
    ///
    /// # Errors
    ///
    /// Returns an error if the center, default zoom, or surface size is invalid.
    pub fn new(config: MapConfig, center: GeoPoint, width: u32, height: u32) -> Result<Self, MapError> {
        let viewport = ViewportState::new(center, config.default_zoom_scale(), width, height)?;
        Ok(Self {
            snapshot: Snapshot::default(),
            snapshot_rev: 0,
            viewport,
            selection: SelectionState::default(),
            layers: config.layers,
            config,
            scheduler: RenderScheduler::new(),
        })
    }

    // --- Data inputs ---

    /// Replace the fleet snapshot. Drops the selection if its robot or field
    /// is gone.
    pub fn load_snapshot(&mut self, snapshot: Snapshot) -> Vec<Action> {
        self.snapshot = snapshot;
        self.snapshot_rev += 1;
        let had_robot = self.selection.selected_id.is_some();
        let mut actions = Vec::new();
        if self.selection.retain(&self.snapshot) {
            debug!("selected entity left the snapshot");
            if had_robot {
                actions.push(Action::Deselected);
            }
        }
        actions.push(Action::RenderNeeded);
        actions
    }

    /// Decode and load a JSON snapshot from the fleet store.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::Snapshot`] on malformed JSON; the current
    /// snapshot is kept.
    pub fn load_snapshot_json(&mut self, raw: &str) -> Result<Vec<Action>, MapError> {
        let snapshot = Snapshot::from_json(raw)?;
        Ok(self.load_snapshot(snapshot))
    }

    // --- Viewport ---

    /// # Errors
    ///
    /// Returns [`MapError::InvalidGeometry`] for an invalid center.
    pub fn set_center(&mut self, center: GeoPoint) -> Result<Action, MapError> {
        self.viewport = self.viewport.with_center(center)?;
        Ok(Action::RenderNeeded)
    }

    /// # Errors
    ///
    /// Returns [`MapError::InvalidViewport`] unless `scale` is finite and positive.
    pub fn set_zoom_scale(&mut self, scale: f64) -> Result<Action, MapError> {
        self.viewport = self.viewport.with_zoom_scale(scale)?;
        Ok(Action::RenderNeeded)
    }

    /// Set the zoom from a slippy-map level (12 is scale 1).
    ///
    /// # Errors
    ///
    /// Returns [`MapError::InvalidViewport`] if the level maps to an unusable scale.
    pub fn set_zoom_level(&mut self, level: f64) -> Result<Action, MapError> {
        self.set_zoom_scale(zoom_scale_for_level(level))
    }

    /// Show or hide optional layers. Hiding fields closes an open field card.
    pub fn set_layers(&mut self, layers: LayerToggles) -> Action {
        self.layers = layers;
        if !layers.fields && self.selection.close_field_popup() {
            debug!("field card closed with the field layer");
        }
        Action::RenderNeeded
    }

    /// New surface dimensions. The last rendered pass is discarded.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::InvalidViewport`] for a zero dimension.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<Action, MapError> {
        self.viewport = self.viewport.with_surface(width, height)?;
        self.scheduler.invalidate();
        Ok(Action::RenderNeeded)
    }

    /// Mark the surface as freshly acquired; its pixels are undefined.
    pub fn surface_reset(&mut self) {
        self.scheduler.invalidate();
    }

    // --- Pointer input ---

    /// Resolve a click on the surface into a selection change.
    ///
    /// Robots sit above fields: a field is only hit when no robot is.
    pub fn on_click(&mut self, point: ScreenPoint) -> Vec<Action> {
        let had_robot = self.selection.selected_id.is_some();
        let robot = hit_test(point, &self.snapshot.robots, &self.viewport, self.config.hit_tolerance_px)
            .map(str::to_owned);
        let field = match robot {
            None => self.field_at(point).map(|f| f.id.clone()),
            Some(_) => None,
        };
        let changed = match (&robot, &field) {
            (None, Some(id)) => self.selection.open_field(point, id),
            _ => self.selection.click(point, robot.as_deref()),
        };

        let mut actions = Vec::new();
        match (robot, field) {
            (Some(id), _) => actions.push(Action::Selected(id)),
            (None, field) => {
                if had_robot {
                    actions.push(Action::Deselected);
                }
                actions.extend(field.map(Action::FieldSelected));
            }
        }
        if changed {
            actions.push(Action::RenderNeeded);
        }
        actions
    }

    // --- Selection ---

    /// Highlight a robot picked outside the map (e.g. the robot list).
    pub fn select(&mut self, id: &str) -> Vec<Action> {
        if !self.snapshot.contains_robot(id) {
            debug!(robot = %id, "select ignored: robot not in snapshot");
            return Vec::new();
        }
        let mut actions = vec![Action::Selected(id.to_owned())];
        if self.selection.select(id) {
            actions.push(Action::RenderNeeded);
        }
        actions
    }

    /// Select a robot and move the map center onto it.
    pub fn focus(&mut self, id: &str) -> Vec<Action> {
        let Some(position) = self.snapshot.robot(id).map(|r| r.position) else {
            debug!(robot = %id, "focus ignored: robot not in snapshot");
            return Vec::new();
        };
        let mut actions = self.select(id);
        match self.viewport.with_center(position) {
            Ok(viewport) if viewport != self.viewport => {
                self.viewport = viewport;
                if !actions.contains(&Action::RenderNeeded) {
                    actions.push(Action::RenderNeeded);
                }
            }
            Ok(_) => {}
            Err(err) => debug!(robot = %id, %err, "focus kept center"),
        }
        actions
    }

    /// Close the popup card; the marker stays highlighted.
    pub fn dismiss_popup(&mut self) -> Vec<Action> {
        if self.selection.dismiss_popup() { vec![Action::RenderNeeded] } else { Vec::new() }
    }

    /// Drop the selection entirely.
    pub fn clear_selection(&mut self) -> Vec<Action> {
        let had_robot = self.selection.selected_id.is_some();
        if !self.selection.clear() {
            return Vec::new();
        }
        if had_robot { vec![Action::Deselected, Action::RenderNeeded] } else { vec![Action::RenderNeeded] }
    }

    /// The popup's "view details" button: report the robot and close the card.
    pub fn request_view(&mut self) -> Vec<Action> {
        let Some(id) = self.selection.visible_popup_of(PopupKind::Robot).map(|p| p.entity_id.clone()) else {
            return Vec::new();
        };
        let mut actions = vec![Action::ViewRequested(id)];
        actions.extend(self.dismiss_popup());
        actions
    }

    // --- Render ---

    /// Draw a frame if anything changed since the last one.
    ///
    /// Returns `Ok(false)` when the request was coalesced.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::SurfaceUnavailable`] when `surface` is `None`; the
    /// frame is retried on the next call. Surface call failures propagate.
    pub fn frame<S: Surface + ?Sized>(&mut self, surface: Option<&mut S>) -> Result<bool, MapError> {
        let key = self.render_key();
        self.scheduler.run(key, surface, |s| {
            render(s, &self.viewport, &self.snapshot, &self.selection, self.layers)
        })
    }

    fn render_key(&self) -> RenderKey {
        RenderKey {
            snapshot_rev: self.snapshot_rev,
            viewport: self.viewport,
            selection: self.selection.clone(),
            layers: self.layers,
        }
    }

    // --- Queries ---

    #[must_use]
    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    #[must_use]
    pub fn viewport(&self) -> ViewportState {
        self.viewport
    }

    #[must_use]
    pub fn layers(&self) -> LayerToggles {
        self.layers
    }

    #[must_use]
    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    #[must_use]
    pub fn robot(&self, id: &str) -> Option<&Robot> {
        self.snapshot.robot(id)
    }

    /// The visible popup and the robot it describes, for the host to render.
    #[must_use]
    pub fn popup_robot(&self) -> Option<(&Popup, &Robot)> {
        let popup = self.selection.visible_popup_of(PopupKind::Robot)?;
        Some((popup, self.snapshot.robot(&popup.entity_id)?))
    }

    /// The visible field card and the field it describes (name, crop, area,
    /// coverage), for the host to render.
    #[must_use]
    pub fn popup_field(&self) -> Option<(&Popup, &FieldBoundary)> {
        let popup = self.selection.visible_popup_of(PopupKind::Field)?;
        Some((popup, self.snapshot.field(&popup.entity_id)?))
    }

    /// The topmost field under `point`, or `None` while the field layer is
    /// hidden.
    #[must_use]
    pub fn field_at(&self, point: ScreenPoint) -> Option<&FieldBoundary> {
        if !self.layers.fields {
            return None;
        }
        let id = field_hit_test(point, &self.snapshot.fields, &self.viewport)?;
        self.snapshot.field(id)
    }

    #[must_use]
    pub fn scheduler(&self) -> &RenderScheduler {
        &self.scheduler
    }
}
