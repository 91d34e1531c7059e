//! Drawing surface abstraction.
//!
//! The renderer only talks to [`Surface`], a subset of the Canvas 2D API.
//! In the browser the surface is the canvas' `CanvasRenderingContext2d`;
//! headless hosts and tests use [`RecordingSurface`], which keeps the exact
//! sequence of calls so two passes can be compared op for op.

#[cfg(test)]
#[path = "surface_test.rs"]
mod surface_test;

use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use crate::error::MapError;
use crate::geo::ScreenPoint;

/// The 2D drawing operations the renderer needs.
pub trait Surface {
    fn save(&mut self);
    fn restore(&mut self);
    fn clear_rect(&mut self, x: f64, y: f64, w: f64, h: f64);
    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64);
    fn set_fill_style(&mut self, color: &str);
    fn set_stroke_style(&mut self, color: &str);
    fn set_line_width(&mut self, width: f64);
    fn set_global_alpha(&mut self, alpha: f64);
    /// An empty slice restores solid strokes.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::Draw`] if the backend rejects the pattern.
    fn set_line_dash(&mut self, segments: &[f64]) -> Result<(), MapError>;
    fn set_font(&mut self, font: &str);
    fn set_text_align(&mut self, align: &str);
    fn begin_path(&mut self);
    fn move_to(&mut self, x: f64, y: f64);
    fn line_to(&mut self, x: f64, y: f64);
    fn close_path(&mut self);
    /// Add a full circle to the current path.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::Draw`] for a negative radius.
    fn circle(&mut self, x: f64, y: f64, radius: f64) -> Result<(), MapError>;
    fn fill(&mut self);
    fn stroke(&mut self);
    /// # Errors
    ///
    /// Returns [`MapError::Draw`] if the backend fails to lay out the text.
    fn fill_text(&mut self, text: &str, x: f64, y: f64) -> Result<(), MapError>;
}

fn js_err(err: JsValue) -> MapError {
    MapError::Draw(format!("{err:?}"))
}

impl Surface for CanvasRenderingContext2d {
    fn save(&mut self) {
        CanvasRenderingContext2d::save(self);
    }

    fn restore(&mut self) {
        CanvasRenderingContext2d::restore(self);
    }

    fn clear_rect(&mut self, x: f64, y: f64, w: f64, h: f64) {
        CanvasRenderingContext2d::clear_rect(self, x, y, w, h);
    }

    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64) {
        CanvasRenderingContext2d::fill_rect(self, x, y, w, h);
    }

    fn set_fill_style(&mut self, color: &str) {
        self.set_fill_style_str(color);
    }

    fn set_stroke_style(&mut self, color: &str) {
        self.set_stroke_style_str(color);
    }

    fn set_line_width(&mut self, width: f64) {
        CanvasRenderingContext2d::set_line_width(self, width);
    }

    fn set_global_alpha(&mut self, alpha: f64) {
        CanvasRenderingContext2d::set_global_alpha(self, alpha);
    }

    fn set_line_dash(&mut self, segments: &[f64]) -> Result<(), MapError> {
        let dash = js_sys::Array::new();
        for seg in segments {
            dash.push(&JsValue::from_f64(*seg));
        }
        CanvasRenderingContext2d::set_line_dash(self, &dash).map_err(js_err)
    }

    fn set_font(&mut self, font: &str) {
        CanvasRenderingContext2d::set_font(self, font);
    }

    fn set_text_align(&mut self, align: &str) {
        CanvasRenderingContext2d::set_text_align(self, align);
    }

    fn begin_path(&mut self) {
        CanvasRenderingContext2d::begin_path(self);
    }

    fn move_to(&mut self, x: f64, y: f64) {
        CanvasRenderingContext2d::move_to(self, x, y);
    }

    fn line_to(&mut self, x: f64, y: f64) {
        CanvasRenderingContext2d::line_to(self, x, y);
    }

    fn close_path(&mut self) {
        CanvasRenderingContext2d::close_path(self);
    }

    fn circle(&mut self, x: f64, y: f64, radius: f64) -> Result<(), MapError> {
        self.arc(x, y, radius, 0.0, 2.0 * std::f64::consts::PI).map_err(js_err)
    }

    fn fill(&mut self) {
        CanvasRenderingContext2d::fill(self);
    }

    fn stroke(&mut self) {
        CanvasRenderingContext2d::stroke(self);
    }

    fn fill_text(&mut self, text: &str, x: f64, y: f64) -> Result<(), MapError> {
        CanvasRenderingContext2d::fill_text(self, text, x, y).map_err(js_err)
    }
}

// =============================================================
// Recording backend
// =============================================================

/// One recorded surface call.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Save,
    Restore,
    ClearRect { x: f64, y: f64, w: f64, h: f64 },
    FillRect { x: f64, y: f64, w: f64, h: f64 },
    FillStyle(String),
    StrokeStyle(String),
    LineWidth(f64),
    GlobalAlpha(f64),
    LineDash(Vec<f64>),
    Font(String),
    TextAlign(String),
    BeginPath,
    MoveTo { x: f64, y: f64 },
    LineTo { x: f64, y: f64 },
    ClosePath,
    Circle { x: f64, y: f64, radius: f64 },
    Fill,
    Stroke,
    FillText { text: String, x: f64, y: f64 },
}

impl DrawOp {
    /// The anchor coordinate of a geometric op, if it has one.
    #[must_use]
    pub fn anchor(&self) -> Option<ScreenPoint> {
        match *self {
            Self::MoveTo { x, y } | Self::LineTo { x, y } | Self::Circle { x, y, .. } | Self::FillText { x, y, .. } => {
                Some(ScreenPoint::new(x, y))
            }
            _ => None,
        }
    }
}

/// A surface that records calls instead of producing pixels.
#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    ops: Vec<DrawOp>,
}

impl RecordingSurface {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    pub fn clear_ops(&mut self) {
        self.ops.clear();
    }

    /// Whether any geometric op is anchored inside the inclusive box `min..=max`.
    #[must_use]
    pub fn touches(&self, min: ScreenPoint, max: ScreenPoint) -> bool {
        self.ops.iter().filter_map(DrawOp::anchor).any(|p| {
            (min.x..=max.x).contains(&p.x) && (min.y..=max.y).contains(&p.y)
        })
    }

    /// Recorded text draws, in order.
    #[must_use]
    pub fn texts(&self) -> Vec<&str> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::FillText { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    fn push(&mut self, op: DrawOp) {
        self.ops.push(op);
    }
}

impl Surface for RecordingSurface {
    fn save(&mut self) {
        self.push(DrawOp::Save);
    }

    fn restore(&mut self) {
        self.push(DrawOp::Restore);
    }

    fn clear_rect(&mut self, x: f64, y: f64, w: f64, h: f64) {
        self.push(DrawOp::ClearRect { x, y, w, h });
    }

    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64) {
        self.push(DrawOp::FillRect { x, y, w, h });
    }

    fn set_fill_style(&mut self, color: &str) {
        self.push(DrawOp::FillStyle(color.to_owned()));
    }

    fn set_stroke_style(&mut self, color: &str) {
        self.push(DrawOp::StrokeStyle(color.to_owned()));
    }

    fn set_line_width(&mut self, width: f64) {
        self.push(DrawOp::LineWidth(width));
    }

    fn set_global_alpha(&mut self, alpha: f64) {
        self.push(DrawOp::GlobalAlpha(alpha));
    }

    fn set_line_dash(&mut self, segments: &[f64]) -> Result<(), MapError> {
        self.push(DrawOp::LineDash(segments.to_vec()));
        Ok(())
    }

    fn set_font(&mut self, font: &str) {
        self.push(DrawOp::Font(font.to_owned()));
    }

    fn set_text_align(&mut self, align: &str) {
        self.push(DrawOp::TextAlign(align.to_owned()));
    }

    fn begin_path(&mut self) {
        self.push(DrawOp::BeginPath);
    }

    fn move_to(&mut self, x: f64, y: f64) {
        self.push(DrawOp::MoveTo { x, y });
    }

    fn line_to(&mut self, x: f64, y: f64) {
        self.push(DrawOp::LineTo { x, y });
    }

    fn close_path(&mut self) {
        self.push(DrawOp::ClosePath);
    }

    fn circle(&mut self, x: f64, y: f64, radius: f64) -> Result<(), MapError> {
        if radius < 0.0 {
            return Err(MapError::Draw(format!("negative radius {radius}")));
        }
        self.push(DrawOp::Circle { x, y, radius });
        Ok(())
    }

    fn fill(&mut self) {
        self.push(DrawOp::Fill);
    }

    fn stroke(&mut self) {
        self.push(DrawOp::Stroke);
    }

    fn fill_text(&mut self, text: &str, x: f64, y: f64) -> Result<(), MapError> {
        self.push(DrawOp::FillText { text: text.to_owned(), x, y });
        Ok(())
    }
}
