//! Map settings parsed from environment variables.
//!
//! The dashboard's settings page persists these values; the engine only
//! consumes them as plain numbers and flags.

use crate::consts::{BASE_ZOOM_LEVEL, HIT_TOLERANCE_PX};
use crate::error::MapError;
use crate::geo::zoom_scale_for_level;
use crate::render::LayerToggles;

pub const DEFAULT_ZOOM_LEVEL: f64 = BASE_ZOOM_LEVEL;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapConfig {
    /// Slippy-map zoom level used until the host sets one.
    pub default_zoom: f64,
    /// Click tolerance around robot markers, in pixels.
    pub hit_tolerance_px: f64,
    pub layers: LayerToggles,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self { default_zoom: DEFAULT_ZOOM_LEVEL, hit_tolerance_px: HIT_TOLERANCE_PX, layers: LayerToggles::default() }
    }
}

impl MapConfig {
    /// Build typed map config from environment variables.
    ///
    /// Optional:
    /// - `MAP_DEFAULT_ZOOM`: zoom level, default 12
    /// - `MAP_HIT_TOLERANCE_PX`: default 15, must be positive
    /// - `MAP_SHOW_FIELDS`: `true` (default) or `false`
    /// - `MAP_SHOW_MISSIONS`: `true` (default) or `false`
    ///
    /// # Errors
    ///
    /// Returns [`MapError::Config`] when a variable is set but unparsable.
    pub fn from_env() -> Result<Self, MapError> {
        let default_zoom = env_parse_f64("MAP_DEFAULT_ZOOM", DEFAULT_ZOOM_LEVEL)?;
        let hit_tolerance_px = env_parse_f64("MAP_HIT_TOLERANCE_PX", HIT_TOLERANCE_PX)?;
        if !(hit_tolerance_px.is_finite() && hit_tolerance_px > 0.0) {
            return Err(MapError::Config(format!("MAP_HIT_TOLERANCE_PX must be positive, got {hit_tolerance_px}")));
        }
        let layers = LayerToggles {
            fields: env_parse_bool("MAP_SHOW_FIELDS", true)?,
            missions: env_parse_bool("MAP_SHOW_MISSIONS", true)?,
        };
        Ok(Self { default_zoom, hit_tolerance_px, layers })
    }

    /// Projection scale for [`Self::default_zoom`].
    #[must_use]
    pub fn default_zoom_scale(&self) -> f64 {
        zoom_scale_for_level(self.default_zoom)
    }
}

fn env_var(key: &str) -> Option<String> {
    match std::env::var(key) {
        Ok(v) if !v.trim().is_empty() => Some(v),
        _ => None,
    }
}

fn env_parse_f64(key: &str, default: f64) -> Result<f64, MapError> {
    let Some(raw) = env_var(key) else {
        return Ok(default);
    };
    match raw.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(MapError::Config(format!("{key}: expected a number, got '{raw}'"))),
    }
}

fn env_parse_bool(key: &str, default: bool) -> Result<bool, MapError> {
    let Some(raw) = env_var(key) else {
        return Ok(default);
    };
    parse_bool(&raw).ok_or_else(|| MapError::Config(format!("{key}: expected true or false, got '{raw}'")))
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
