//! Selection model: which robot is highlighted and the popup card bound to it.
//!
//! The controller is a small state machine:
//!
//! - **Idle**: nothing selected.
//! - **Selected**: a robot is highlighted; its popup may be visible or hidden.
//! - **`FieldPopup`**: no robot is highlighted; a field's info card is open.
//!
//! A click that hits a robot always lands in Selected with the popup anchored
//! at the click, including when another robot was already selected (the
//! transition goes straight from one selection to the next). A click on empty
//! space returns to Idle. Dismissing the popup hides the card but keeps the
//! marker highlighted; clearing the selection returns to Idle. A click that
//! misses every robot but lands inside a field opens that field's card and
//! drops any robot selection. Dismissing a field card returns to Idle.

#[cfg(test)]
#[path = "selection_test.rs"]
mod selection_test;

use crate::consts::{POPUP_LIFT_PX, POPUP_MIN_TOP_PX, POPUP_WIDTH_PX};
use crate::fleet::Snapshot;
use crate::geo::ScreenPoint;

/// What a popup card describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopupKind {
    Robot,
    Field,
}

/// The detail card shown next to a clicked robot marker or field.
#[derive(Debug, Clone, PartialEq)]
pub struct Popup {
    pub kind: PopupKind,
    /// Robot or field id the card describes.
    pub entity_id: String,
    /// Screen position of the click that opened the card.
    pub anchor: ScreenPoint,
    pub visible: bool,
}

impl Popup {
    /// Top-left corner for the card on a surface `surface_width` pixels wide.
    ///
    /// The card is lifted above the click and kept from running off the right
    /// or top edge.
    #[must_use]
    pub fn placement(&self, surface_width: f64) -> ScreenPoint {
        ScreenPoint {
            x: self.anchor.x.min(surface_width - POPUP_WIDTH_PX),
            y: (self.anchor.y - POPUP_LIFT_PX).max(POPUP_MIN_TOP_PX),
        }
    }
}

/// Observable phase of the selection state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionPhase {
    Idle,
    Selected { popup_visible: bool },
    FieldPopup,
}

/// Transient interaction state owned by the engine.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionState {
    /// The id of the currently selected robot, if any.
    pub selected_id: Option<String>,
    pub popup: Option<Popup>,
}

impl SelectionState {
    #[must_use]
    pub fn phase(&self) -> SelectionPhase {
        match &self.selected_id {
            Some(_) => SelectionPhase::Selected { popup_visible: self.popup.as_ref().is_some_and(|p| p.visible) },
            None if self.visible_popup().is_some_and(|p| p.kind == PopupKind::Field) => SelectionPhase::FieldPopup,
            None => SelectionPhase::Idle,
        }
    }

    #[must_use]
    pub fn is_selected(&self, id: &str) -> bool {
        self.selected_id.as_deref() == Some(id)
    }

    /// The popup, only while it is showing.
    #[must_use]
    pub fn visible_popup(&self) -> Option<&Popup> {
        self.popup.as_ref().filter(|p| p.visible)
    }

    /// The visible popup if it belongs to `kind`.
    #[must_use]
    pub fn visible_popup_of(&self, kind: PopupKind) -> Option<&Popup> {
        self.visible_popup().filter(|p| p.kind == kind)
    }

    /// Apply a pointer click whose robot hit-test result is `hit`.
    ///
    /// Returns `true` if the state changed.
    pub fn click(&mut self, point: ScreenPoint, hit: Option<&str>) -> bool {
        let next = match hit {
            Some(id) => Self {
                selected_id: Some(id.to_owned()),
                popup: Some(Popup { kind: PopupKind::Robot, entity_id: id.to_owned(), anchor: point, visible: true }),
            },
            None => Self::default(),
        };
        self.replace(next)
    }

    /// Open the card for field `id` at `point`, dropping any robot selection.
    pub fn open_field(&mut self, point: ScreenPoint, id: &str) -> bool {
        self.replace(Self {
            selected_id: None,
            popup: Some(Popup { kind: PopupKind::Field, entity_id: id.to_owned(), anchor: point, visible: true }),
        })
    }

    /// Highlight `id` without opening a popup (e.g. picked from a list).
    ///
    /// A popup for a different robot is closed; one already bound to `id`
    /// is left as is.
    pub fn select(&mut self, id: &str) -> bool {
        let popup = self.popup.clone().filter(|p| p.kind == PopupKind::Robot && p.entity_id == id);
        self.replace(Self { selected_id: Some(id.to_owned()), popup })
    }

    /// Hide the popup card; a robot selection stays highlighted, a field
    /// card is dropped.
    pub fn dismiss_popup(&mut self) -> bool {
        if self.close_field_popup() {
            return true;
        }
        match self.popup.as_mut() {
            Some(popup) if popup.visible => {
                popup.visible = false;
                true
            }
            _ => false,
        }
    }

    /// Return to Idle.
    pub fn clear(&mut self) -> bool {
        self.replace(Self::default())
    }

    /// Reset to Idle if the selected robot, or the field whose card is
    /// open, is no longer in `snapshot`.
    pub fn retain(&mut self, snapshot: &Snapshot) -> bool {
        let stale_robot = self.selected_id.as_deref().is_some_and(|id| !snapshot.contains_robot(id));
        let stale_field = self
            .popup
            .as_ref()
            .is_some_and(|p| p.kind == PopupKind::Field && snapshot.field(&p.entity_id).is_none());
        if stale_robot || stale_field { self.clear() } else { false }
    }

    /// Close an open field card, e.g. when the field layer is hidden.
    pub fn close_field_popup(&mut self) -> bool {
        if self.popup.as_ref().is_some_and(|p| p.kind == PopupKind::Field) {
            self.popup = None;
            return true;
        }
        false
    }

    fn replace(&mut self, next: Self) -> bool {
        if *self == next {
            return false;
        }
        *self = next;
        true
    }
}
