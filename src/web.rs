//! Browser wrapper around [`EngineCore`].
//!
//! [`Engine::attach`] acquires the canvas' 2D context and registers a single
//! click listener that feeds [`EngineCore::on_click`]. Both live in a
//! [`SurfaceHandle`] whose `Drop` removes the listener, so detaching,
//! re-attaching, dropping the engine, and bailing out of `attach` halfway all
//! release the subscription.
//!
//! The engine state is shared with the listener through `Rc<RefCell<_>>`.
//! Host callbacks run with no borrow held: neither the core nor the callback
//! table is borrowed while a callback executes, so a callback may call back
//! into the [`Engine`] (e.g. `focus` from `on_select`). Events raised by such
//! a nested call for the callback that is still running are not delivered to
//! it a second time.

#[cfg(test)]
#[path = "web_test.rs"]
mod web_test;

use std::cell::RefCell;
use std::rc::Rc;

use tracing::{debug, trace, warn};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent};

use crate::config::MapConfig;
use crate::engine::{Action, EngineCore};
use crate::error::MapError;
use crate::fleet::Snapshot;
use crate::geo::{GeoPoint, ScreenPoint};
use crate::render::LayerToggles;

type Callback = Box<dyn FnMut(&str)>;

/// Host callbacks for the engine's outward events.
#[derive(Default)]
pub struct Callbacks {
    /// A robot marker was clicked.
    pub on_select: Option<Callback>,
    /// The popup's "view details" button was pressed.
    pub on_view_requested: Option<Callback>,
    /// A field polygon was clicked; its card is open.
    pub on_field_select: Option<Callback>,
}

/// An acquired canvas: its 2D context and the registered click listener.
pub struct SurfaceHandle {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    on_click: Closure<dyn FnMut(MouseEvent)>,
}

impl Drop for SurfaceHandle {
    fn drop(&mut self) {
        if let Err(err) = self
            .canvas
            .remove_event_listener_with_callback("click", self.on_click.as_ref().unchecked_ref())
        {
            warn!(err = ?err, "failed to remove map click listener");
        }
    }
}

/// The full map engine. Wraps `EngineCore` and owns the browser canvas.
pub struct Engine {
    core: Rc<RefCell<EngineCore>>,
    callbacks: Rc<RefCell<Callbacks>>,
    surface: Rc<RefCell<Option<SurfaceHandle>>>,
}

impl Engine {
    /// Create an engine with no surface yet; frames are deferred until
    /// [`Self::attach`].
    ///
    /// # Errors
    ///
    /// Returns an error if `center` or the configured zoom is invalid.
    pub fn new(config: MapConfig, center: GeoPoint, callbacks: Callbacks) -> Result<Self, MapError> {
        let core = EngineCore::new(config, center, 1, 1)?;
        Ok(Self {
            core: Rc::new(RefCell::new(core)),
            callbacks: Rc::new(RefCell::new(callbacks)),
            surface: Rc::new(RefCell::new(None)),
        })
    }

    /// Bind to `canvas`, sizing its backing store to its laid-out size.
    ///
    /// Any previously attached canvas is released first.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::SurfaceUnavailable`] if the canvas has no 2D
    /// context, or [`MapError::Draw`] if the listener cannot be registered.
    pub fn attach(&mut self, canvas: HtmlCanvasElement) -> Result<(), MapError> {
        self.detach();

        let ctx = context_2d(&canvas)?;
        let (width, height) = (css_px(canvas.client_width()), css_px(canvas.client_height()));
        canvas.set_width(width);
        canvas.set_height(height);

        let on_click = click_listener(
            canvas.clone(),
            Rc::clone(&self.core),
            Rc::clone(&self.callbacks),
            Rc::downgrade(&self.surface),
        );
        canvas
            .add_event_listener_with_callback("click", on_click.as_ref().unchecked_ref())
            .map_err(js_draw_err)?;
        *self.surface.borrow_mut() = Some(SurfaceHandle { canvas, ctx, on_click });

        let resized = self.core.borrow_mut().resize(width, height);
        self.core.borrow_mut().surface_reset();
        self.dispatch(vec![resized?]);
        debug!(width, height, "map surface attached");
        Ok(())
    }

    /// Release the canvas and its click listener.
    pub fn detach(&mut self) {
        if self.surface.borrow_mut().take().is_some() {
            debug!("map surface detached");
        }
    }

    // --- Delegated data inputs ---

    pub fn load_snapshot(&mut self, snapshot: Snapshot) {
        let actions = self.core.borrow_mut().load_snapshot(snapshot);
        self.dispatch(actions);
    }

    /// # Errors
    ///
    /// Returns [`MapError::Snapshot`] on malformed JSON.
    pub fn load_snapshot_json(&mut self, raw: &str) -> Result<(), MapError> {
        let actions = self.core.borrow_mut().load_snapshot_json(raw)?;
        self.dispatch(actions);
        Ok(())
    }

    // --- Viewport ---

    /// # Errors
    ///
    /// Returns [`MapError::InvalidGeometry`] for an invalid center.
    pub fn set_center(&mut self, center: GeoPoint) -> Result<(), MapError> {
        let action = self.core.borrow_mut().set_center(center)?;
        self.dispatch(vec![action]);
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`MapError::InvalidViewport`] unless `scale` is finite and positive.
    pub fn set_zoom_scale(&mut self, scale: f64) -> Result<(), MapError> {
        let action = self.core.borrow_mut().set_zoom_scale(scale)?;
        self.dispatch(vec![action]);
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`MapError::InvalidViewport`] if the level maps to an unusable scale.
    pub fn set_zoom_level(&mut self, level: f64) -> Result<(), MapError> {
        let action = self.core.borrow_mut().set_zoom_level(level)?;
        self.dispatch(vec![action]);
        Ok(())
    }

    pub fn set_layers(&mut self, layers: LayerToggles) {
        let action = self.core.borrow_mut().set_layers(layers);
        self.dispatch(vec![action]);
    }

    /// Resize the canvas backing store and redraw against the new size.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::InvalidViewport`] for a zero dimension.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), MapError> {
        let action = self.core.borrow_mut().resize(width, height)?;
        if let Some(handle) = self.surface.borrow().as_ref() {
            handle.canvas.set_width(width);
            handle.canvas.set_height(height);
        }
        self.dispatch(vec![action]);
        Ok(())
    }

    // --- Delegated selection ---

    /// Highlight a robot picked from the robot list, without a popup.
    pub fn select(&mut self, id: &str) {
        let actions = self.core.borrow_mut().select(id);
        self.dispatch(actions);
    }

    pub fn focus(&mut self, id: &str) {
        let actions = self.core.borrow_mut().focus(id);
        self.dispatch(actions);
    }

    pub fn dismiss_popup(&mut self) {
        let actions = self.core.borrow_mut().dismiss_popup();
        self.dispatch(actions);
    }

    pub fn clear_selection(&mut self) {
        let actions = self.core.borrow_mut().clear_selection();
        self.dispatch(actions);
    }

    pub fn request_view(&mut self) {
        let actions = self.core.borrow_mut().request_view();
        self.dispatch(actions);
    }

    // --- Render ---

    /// Draw a frame if anything changed.
    pub fn render(&self) {
        render_frame(&self.core, &self.surface);
    }

    /// Shared access to the core for queries (popup contents, viewport).
    #[must_use]
    pub fn core(&self) -> std::cell::Ref<'_, EngineCore> {
        self.core.borrow()
    }

    fn dispatch(&self, actions: Vec<Action>) {
        dispatch(&actions, &self.callbacks);
        if actions.contains(&Action::RenderNeeded) {
            self.render();
        }
    }
}

fn context_2d(canvas: &HtmlCanvasElement) -> Result<CanvasRenderingContext2d, MapError> {
    match canvas.get_context("2d") {
        Ok(Some(obj)) => obj.dyn_into::<CanvasRenderingContext2d>().map_err(|_| MapError::SurfaceUnavailable),
        Ok(None) => Err(MapError::SurfaceUnavailable),
        Err(err) => Err(js_draw_err(err)),
    }
}

fn click_listener(
    canvas: HtmlCanvasElement,
    core: Rc<RefCell<EngineCore>>,
    callbacks: Rc<RefCell<Callbacks>>,
    surface: std::rc::Weak<RefCell<Option<SurfaceHandle>>>,
) -> Closure<dyn FnMut(MouseEvent)> {
    Closure::wrap(Box::new(move |event: MouseEvent| {
        let rect = canvas.get_bounding_client_rect();
        let point = ScreenPoint::new(f64::from(event.client_x()) - rect.left(), f64::from(event.client_y()) - rect.top());
        let actions = core.borrow_mut().on_click(point);
        dispatch(&actions, &callbacks);
        if actions.contains(&Action::RenderNeeded) {
            if let Some(surface) = surface.upgrade() {
                render_frame(&core, &surface);
            }
        }
    }) as Box<dyn FnMut(MouseEvent)>)
}

type Slot = fn(&mut Callbacks) -> &mut Option<Callback>;

fn dispatch(actions: &[Action], callbacks: &Rc<RefCell<Callbacks>>) {
    for action in actions {
        match action {
            Action::Selected(id) => invoke(callbacks, |c| &mut c.on_select, id),
            Action::ViewRequested(id) => invoke(callbacks, |c| &mut c.on_view_requested, id),
            Action::FieldSelected(id) => invoke(callbacks, |c| &mut c.on_field_select, id),
            Action::Deselected | Action::RenderNeeded => {}
        }
    }
}

/// Run one callback with the table unborrowed.
///
/// The callback is taken out of its slot for the duration of the call and
/// put back afterwards, unless the host installed a replacement meanwhile.
fn invoke(callbacks: &Rc<RefCell<Callbacks>>, slot: Slot, id: &str) {
    let taken = slot(&mut callbacks.borrow_mut()).take();
    let Some(mut cb) = taken else {
        trace!(id, "no host callback to run");
        return;
    };
    cb(id);
    let mut table = callbacks.borrow_mut();
    let entry = slot(&mut table);
    if entry.is_none() {
        *entry = Some(cb);
    }
}

fn render_frame(core: &Rc<RefCell<EngineCore>>, surface: &Rc<RefCell<Option<SurfaceHandle>>>) {
    let mut surface = surface.borrow_mut();
    let ctx = surface.as_mut().map(|handle| &mut handle.ctx);
    match core.borrow_mut().frame(ctx) {
        Ok(_) => {}
        Err(MapError::SurfaceUnavailable) => debug!("map frame deferred until a canvas is attached"),
        Err(err) => warn!(%err, "map frame failed"),
    }
}

fn css_px(value: i32) -> u32 {
    u32::try_from(value).unwrap_or(0).max(1)
}

fn js_draw_err(err: JsValue) -> MapError {
    MapError::Draw(format!("{err:?}"))
}
