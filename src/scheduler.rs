//! Redraw scheduling.
//!
//! Every render pass is total and idempotent, so the scheduler is purely an
//! optimisation: it remembers the inputs of the last completed pass and skips
//! requests whose inputs are identical. A resize or a re-acquired surface
//! invalidates the remembered pass, and a pass that could not run (no
//! surface yet, or a failed draw call) leaves the scheduler dirty so the next
//! trigger tries again. There are no timers.

#[cfg(test)]
#[path = "scheduler_test.rs"]
mod scheduler_test;

use tracing::{debug, trace};

use crate::error::MapError;
use crate::geo::ViewportState;
use crate::render::LayerToggles;
use crate::selection::SelectionState;

/// Everything a render pass depends on.
///
/// The fleet snapshot is represented by its revision counter rather than its
/// contents: loading a snapshot always bumps the revision, even if the new
/// records happen to equal the old ones.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderKey {
    pub snapshot_rev: u64,
    pub viewport: ViewportState,
    pub selection: SelectionState,
    pub layers: LayerToggles,
}

#[derive(Debug, Default)]
pub struct RenderScheduler {
    last: Option<RenderKey>,
    dirty: bool,
    passes: u64,
    coalesced: u64,
}

impl RenderScheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a pass with `key` would change what is on screen.
    #[must_use]
    pub fn needs_render(&self, key: &RenderKey) -> bool {
        self.dirty || self.last.as_ref() != Some(key)
    }

    /// Force the next request to render (surface resized or re-acquired).
    pub fn invalidate(&mut self) {
        self.dirty = true;
    }

    /// Run `draw` against `surface` if `key` differs from the last pass.
    ///
    /// Returns `Ok(true)` if a pass ran, `Ok(false)` if it was coalesced.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::SurfaceUnavailable`] when `surface` is `None`, or
    /// whatever `draw` returned. Either way the scheduler stays dirty.
    pub fn run<S, F>(&mut self, key: RenderKey, surface: Option<&mut S>, draw: F) -> Result<bool, MapError>
    where
        S: ?Sized,
        F: FnOnce(&mut S) -> Result<(), MapError>,
    {
        if !self.needs_render(&key) {
            self.coalesced += 1;
            trace!(rev = key.snapshot_rev, "render coalesced");
            return Ok(false);
        }
        let Some(surface) = surface else {
            self.dirty = true;
            debug!("render deferred: surface not acquired");
            return Err(MapError::SurfaceUnavailable);
        };
        if let Err(err) = draw(surface) {
            self.dirty = true;
            return Err(err);
        }
        self.last = Some(key);
        self.dirty = false;
        self.passes += 1;
        Ok(true)
    }

    /// Completed passes.
    #[must_use]
    pub fn passes(&self) -> u64 {
        self.passes
    }

    /// Requests skipped because nothing changed.
    #[must_use]
    pub fn coalesced(&self) -> u64 {
        self.coalesced
    }
}
