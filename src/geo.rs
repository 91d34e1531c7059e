//! Geographic points, the viewport, and the local equirectangular projection.
//!
//! The projection treats a degree of latitude and a degree of longitude as
//! the same number of pixels. That is only accurate for the small area a
//! field map covers (tens of kilometres around the center); there is no
//! Mercator or cos(latitude) correction.

#[cfg(test)]
#[path = "geo_test.rs"]
mod geo_test;

use serde::{Deserialize, Serialize};

use crate::consts::{BASE_ZOOM_LEVEL, PIXELS_PER_DEGREE};
use crate::error::MapError;

/// A WGS84-style position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    #[must_use]
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Reject non-finite or out-of-range coordinates.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::InvalidGeometry`] when either coordinate is NaN,
    /// infinite, or outside ±90° / ±180°.
    pub fn validate(self) -> Result<Self, MapError> {
        if !self.lat.is_finite() || !self.lng.is_finite() {
            return Err(MapError::InvalidGeometry(format!("non-finite point ({}, {})", self.lat, self.lng)));
        }
        if !(-90.0..=90.0).contains(&self.lat) || !(-180.0..=180.0).contains(&self.lng) {
            return Err(MapError::InvalidGeometry(format!("point out of range ({}, {})", self.lat, self.lng)));
        }
        Ok(self)
    }
}

/// A position in surface pixels, origin at the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

impl ScreenPoint {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    #[must_use]
    pub fn distance_to(self, other: Self) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// What part of the world is visible and at what size.
///
/// Fields are private so the `zoom_scale > 0` and non-zero surface
/// invariants hold for every instance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportState {
    center: GeoPoint,
    zoom_scale: f64,
    surface_width: u32,
    surface_height: u32,
}

impl ViewportState {
    /// # Errors
    ///
    /// Returns [`MapError::InvalidViewport`] for a non-positive or non-finite
    /// zoom scale or a zero-sized surface, and [`MapError::InvalidGeometry`]
    /// for an invalid center.
    pub fn new(center: GeoPoint, zoom_scale: f64, surface_width: u32, surface_height: u32) -> Result<Self, MapError> {
        let center = center.validate()?;
        check_zoom_scale(zoom_scale)?;
        check_surface(surface_width, surface_height)?;
        Ok(Self { center, zoom_scale, surface_width, surface_height })
    }

    #[must_use]
    pub fn center(&self) -> GeoPoint {
        self.center
    }

    #[must_use]
    pub fn zoom_scale(&self) -> f64 {
        self.zoom_scale
    }

    #[must_use]
    pub fn surface_width(&self) -> u32 {
        self.surface_width
    }

    #[must_use]
    pub fn surface_height(&self) -> u32 {
        self.surface_height
    }

    /// The surface's geometric center, where `center` projects to.
    #[must_use]
    pub fn surface_center(&self) -> ScreenPoint {
        ScreenPoint::new(f64::from(self.surface_width) / 2.0, f64::from(self.surface_height) / 2.0)
    }

    /// # Errors
    ///
    /// Returns [`MapError::InvalidGeometry`] for an invalid center.
    pub fn with_center(self, center: GeoPoint) -> Result<Self, MapError> {
        Ok(Self { center: center.validate()?, ..self })
    }

    /// # Errors
    ///
    /// Returns [`MapError::InvalidViewport`] unless `zoom_scale` is finite and positive.
    pub fn with_zoom_scale(self, zoom_scale: f64) -> Result<Self, MapError> {
        check_zoom_scale(zoom_scale)?;
        Ok(Self { zoom_scale, ..self })
    }

    /// # Errors
    ///
    /// Returns [`MapError::InvalidViewport`] if either dimension is zero.
    pub fn with_surface(self, surface_width: u32, surface_height: u32) -> Result<Self, MapError> {
        check_surface(surface_width, surface_height)?;
        Ok(Self { surface_width, surface_height, ..self })
    }

    fn pixels_per_degree(&self) -> f64 {
        PIXELS_PER_DEGREE * self.zoom_scale
    }
}

fn check_zoom_scale(zoom_scale: f64) -> Result<(), MapError> {
    if zoom_scale.is_finite() && zoom_scale > 0.0 {
        Ok(())
    } else {
        Err(MapError::InvalidViewport(format!("zoom scale must be positive, got {zoom_scale}")))
    }
}

fn check_surface(width: u32, height: u32) -> Result<(), MapError> {
    if width == 0 || height == 0 {
        return Err(MapError::InvalidViewport(format!("surface must be at least 1x1, got {width}x{height}")));
    }
    Ok(())
}

/// Convert a slippy-map zoom level to a projection scale. Level 12 is scale 1.
#[must_use]
pub fn zoom_scale_for_level(level: f64) -> f64 {
    (level - BASE_ZOOM_LEVEL).exp2()
}

/// Map a geographic point onto the surface.
///
/// North is up and east is right: increasing latitude decreases `y`,
/// increasing longitude increases `x`.
///
/// # Errors
///
/// Returns [`MapError::InvalidGeometry`] if `geo` is non-finite or out of range.
pub fn project(geo: GeoPoint, viewport: &ViewportState) -> Result<ScreenPoint, MapError> {
    let geo = geo.validate()?;
    let k = viewport.pixels_per_degree();
    let origin = viewport.surface_center();
    Ok(ScreenPoint {
        x: origin.x + (geo.lng - viewport.center.lng) * k,
        y: origin.y - (geo.lat - viewport.center.lat) * k,
    })
}

/// Inverse of [`project`].
///
/// # Errors
///
/// Returns [`MapError::InvalidGeometry`] if `screen` is non-finite.
pub fn unproject(screen: ScreenPoint, viewport: &ViewportState) -> Result<GeoPoint, MapError> {
    if !screen.x.is_finite() || !screen.y.is_finite() {
        return Err(MapError::InvalidGeometry(format!("non-finite screen point ({}, {})", screen.x, screen.y)));
    }
    let k = viewport.pixels_per_degree();
    let origin = viewport.surface_center();
    Ok(GeoPoint {
        lat: viewport.center.lat - (screen.y - origin.y) / k,
        lng: viewport.center.lng + (screen.x - origin.x) / k,
    })
}
