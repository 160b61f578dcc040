use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use fractour_core::{
    AnyFractal, Bounds, Complex, FractalKind, Keyframe, Selection, UndoStack, Viewport,
};
use fractour_render::{PaintedFrame, Painter, Palette, RenderCancel};

use crate::detail_views::DetailViews;
use crate::error::Result;
use crate::export::export_image;
use crate::persistence::{self, SavedView};
use crate::preferences::AppPreferences;
use crate::render_bridge::RenderBridge;
use crate::tour::{TourEngine, TourSettings, TourState};

/// Name given to the keyframe recorded when a session starts.
const INITIAL_KEYFRAME: &str = "Initial view";

/// One exploration session: the viewport and everything hanging off it.
///
/// Only the session mutates the viewport. Renders get copies, so gestures
/// never wait on a render.
pub struct Session {
    viewport: Viewport,
    history: UndoStack<Viewport>,
    painter: Painter,
    julia_c: Complex,

    raster: Option<PaintedFrame>,
    raster_dirty: bool,

    selection: Option<Selection>,
    detail_views: DetailViews,
    tour: TourEngine,
    bridge: Option<RenderBridge>,
    /// Painter of the latest background request.
    requested: Option<Painter>,
}

impl Session {
    pub fn new(prefs: &AppPreferences) -> Self {
        let viewport = Viewport::default_mandelbrot(prefs.canvas_width, prefs.canvas_height);
        let mut tour = TourEngine::new(TourSettings {
            seconds_per_segment: prefs.seconds_per_segment,
            playback_delay: Duration::from_millis(prefs.playback_delay_ms),
            ..TourSettings::default()
        });
        tour.add_keyframe(Some(INITIAL_KEYFRAME), viewport.bounds());

        Self {
            viewport,
            history: UndoStack::with_capacity(prefs.undo_capacity),
            painter: prefs.painter(),
            julia_c: prefs.julia_c(),
            raster: None,
            raster_dirty: true,
            selection: None,
            detail_views: DetailViews::new(),
            tour,
            bridge: None,
            requested: None,
        }
    }

    // -- Accessors --

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn bounds(&self) -> Bounds {
        self.viewport.bounds()
    }

    pub fn painter(&self) -> Painter {
        self.painter
    }

    pub fn selection(&self) -> Option<Selection> {
        self.selection
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn detail_views(&self) -> &DetailViews {
        &self.detail_views
    }

    pub fn detail_views_mut(&mut self) -> &mut DetailViews {
        &mut self.detail_views
    }

    pub fn tour(&self) -> &TourEngine {
        &self.tour
    }

    /// `true` when the cached raster no longer matches the view.
    pub fn is_dirty(&self) -> bool {
        self.raster_dirty
    }

    /// Called after anything that moves or reshapes the visible region.
    fn bounds_changed(&mut self) {
        self.raster_dirty = true;
        self.detail_views.close_all();
    }

    fn push_undo(&mut self) {
        self.history.save(self.viewport);
    }

    // -- Gestures --

    /// Begin a rubber-band selection at a pixel.
    pub fn start_select(&mut self, x: f32, y: f32) {
        self.selection = Some(Selection::new(x, y, 0.0, 0.0));
    }

    /// Grow the selection by a pointer delta. Ignored with no selection open.
    pub fn update_select(&mut self, dx: f32, dy: f32) {
        if let Some(sel) = &mut self.selection {
            sel.width += dx;
            sel.height += dy;
        }
    }

    /// Zoom into the selection. Returns `false` when there was none or it was
    /// too small, in which case nothing changes.
    pub fn end_select(&mut self) -> bool {
        let Some(selection) = self.selection.take() else {
            return false;
        };
        let Some(bounds) = self.viewport.selection_bounds(selection) else {
            debug!(?selection, "Selection too small; ignored");
            return false;
        };
        self.push_undo();
        self.viewport.set_bounds(bounds);
        self.bounds_changed();
        info!(
            x_min = bounds.x_min,
            x_max = bounds.x_max,
            y_min = bounds.y_min,
            y_max = bounds.y_max,
            "Zoomed to selection"
        );
        true
    }

    pub fn cancel_select(&mut self) {
        self.selection = None;
    }

    /// Drag the view by a pixel delta.
    ///
    /// The cached escape values are shifted along with the drag, so the old
    /// raster stays usable as a preview until the next render lands.
    pub fn pan(&mut self, dx: f32, dy: f32) {
        if dx == 0.0 && dy == 0.0 {
            return;
        }
        self.push_undo();
        self.viewport.pan_pixels(dx, dy);
        if let Some(frame) = &mut self.raster {
            frame.values.shift(dx.round() as i32, dy.round() as i32);
            frame.image = self.painter.palette.colorize(&frame.values);
        }
        self.bounds_changed();
    }

    /// The complex point under a pixel, opened as a new detail view.
    pub fn pick(&mut self, x: f32, y: f32) -> (u64, Complex) {
        let c = self.viewport.pixel_to_complex(x, y);
        let id = self.detail_views.open(c);
        (id, c)
    }

    /// Follow the canvas size. No undo entry is recorded.
    pub fn resize(&mut self, width: f32, height: f32) {
        if width == self.viewport.width && height == self.viewport.height {
            return;
        }
        self.viewport.resize(width, height);
        self.raster = None;
        self.bounds_changed();
        debug!(width, height, "Canvas resized");
    }

    /// Step back one view. `false` on empty history.
    pub fn undo(&mut self) -> bool {
        let Some(previous) = self.history.undo() else {
            return false;
        };
        self.apply_viewport(previous);
        true
    }

    /// Restore a snapshot while keeping the current canvas size.
    fn apply_viewport(&mut self, snapshot: Viewport) {
        let (width, height) = (self.viewport.width, self.viewport.height);
        self.viewport = snapshot;
        if snapshot.width != width || snapshot.height != height {
            self.viewport.resize(width, height);
        }
        self.bounds_changed();
    }

    /// Replace the view programmatically, with an undo entry.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.push_undo();
        self.apply_viewport(viewport);
    }

    pub fn set_bounds(&mut self, bounds: Bounds) {
        self.set_viewport(self.viewport.with_bounds(bounds));
    }

    /// Jump to a saved keyframe.
    pub fn jump_to_keyframe(&mut self, id: u64) -> Result<()> {
        let bounds = self
            .tour
            .keyframes()
            .get(id)
            .map(|k| k.bounds)
            .ok_or(fractour_core::CoreError::UnknownKeyframe(id))?;
        self.set_bounds(bounds);
        Ok(())
    }

    // -- Fractal and palette --

    /// Switch fractal. The view is left where it is.
    pub fn set_fractal(&mut self, kind: FractalKind) {
        if kind == self.painter.fractal.kind() {
            return;
        }
        self.painter.fractal = AnyFractal::from_kind(kind, self.julia_c);
        self.raster_dirty = true;
        info!(fractal = %kind, "Fractal changed");
    }

    pub fn set_julia_c(&mut self, c: Complex) {
        self.julia_c = c;
        if self.painter.fractal.kind() == FractalKind::Julia {
            self.painter.fractal = AnyFractal::from_kind(FractalKind::Julia, c);
            self.raster_dirty = true;
        }
    }

    /// Change palette by recoloring the cached escape values; nothing is re-rendered.
    pub fn set_palette(&mut self, palette: Palette) {
        if palette == self.painter.palette {
            return;
        }
        self.painter.palette = palette;
        if let Some(frame) = &mut self.raster {
            frame.image = palette.colorize(&frame.values);
        }
        info!(%palette, "Palette changed");
    }

    // -- Rendering --

    /// The image for the current view, rendering synchronously if stale.
    pub fn raster(&mut self) -> Result<&PaintedFrame> {
        if self.raster_dirty || self.raster.is_none() {
            let frame = self
                .painter
                .paint(&self.viewport, &Arc::new(RenderCancel::new()))?;
            self.raster = Some(frame);
            self.raster_dirty = false;
        }
        self.raster.as_ref().ok_or(crate::error::AppError::EmptyCanvas)
    }

    /// Start the background render worker.
    pub fn enable_background_render(&mut self) -> std::io::Result<()> {
        if self.bridge.is_none() {
            self.bridge = Some(RenderBridge::spawn()?);
        }
        Ok(())
    }

    /// Queue a background render of the current view. `None` without a worker.
    pub fn request_render(&mut self) -> Option<u64> {
        let bridge = self.bridge.as_mut()?;
        self.requested = Some(self.painter);
        Some(bridge.request(self.viewport, self.painter))
    }

    /// Take the latest finished background render, if any. Returns `true`
    /// when the raster was replaced.
    pub fn poll_render(&mut self) -> bool {
        let Some(bridge) = self.bridge.as_mut() else {
            return false;
        };
        let Some(response) = bridge.poll() else {
            return false;
        };
        self.accept_render(response.viewport, response.frame)
    }

    /// Block until the latest background render arrives or `timeout` passes.
    pub fn wait_render(&mut self, timeout: Duration) -> bool {
        let Some(bridge) = self.bridge.as_mut() else {
            return false;
        };
        let Some(response) = bridge.wait(timeout) else {
            return false;
        };
        self.accept_render(response.viewport, response.frame)
    }

    fn accept_render(&mut self, rendered: Viewport, frame: PaintedFrame) -> bool {
        // A gesture may have landed while the worker was busy.
        let Some(requested) = self.requested else {
            return false;
        };
        if rendered != self.viewport || requested.fractal != self.painter.fractal {
            debug!("Render is for an older view; waiting for the next one");
            return false;
        }
        let mut frame = frame;
        if requested.palette != self.painter.palette {
            frame.image = self.painter.palette.colorize(&frame.values);
        }
        self.raster = Some(frame);
        self.raster_dirty = false;
        true
    }

    // -- Keyframes and tour --

    pub fn keyframes(&self) -> &[Keyframe] {
        self.tour.keyframes().as_slice()
    }

    /// Record the current view as a keyframe.
    pub fn add_keyframe(&mut self, name: Option<&str>) -> u64 {
        self.tour.add_keyframe(name, self.viewport.bounds())
    }

    pub fn remove_keyframe(&mut self, id: u64) -> Result<Keyframe> {
        self.tour.remove_keyframe(id)
    }

    pub fn rename_keyframe(&mut self, id: u64, name: &str) -> Result<()> {
        self.tour.rename_keyframe(id, name)
    }

    pub fn start_tour(&mut self) -> bool {
        self.tour
            .start_tour(self.painter, self.viewport.width, self.viewport.height)
    }

    pub fn tour_state(&self) -> TourState {
        self.tour.state()
    }

    /// Stop the tour. If frames were rendered the view moves to the last
    /// keyframe; returns whether it did.
    pub fn stop_tour(&mut self) -> bool {
        match self.tour.stop_tour() {
            Some(bounds) => {
                self.set_bounds(bounds);
                true
            }
            None => false,
        }
    }

    /// Check for the natural end of playback and restore the final view.
    pub fn poll_tour(&mut self) -> bool {
        match self.tour.poll() {
            Some(bounds) => {
                self.set_bounds(bounds);
                true
            }
            None => false,
        }
    }

    // -- Files --

    pub fn saved_view(&self) -> SavedView {
        SavedView::new(
            self.viewport,
            self.painter.fractal.kind(),
            self.painter.palette,
        )
    }

    pub fn save_view(&self, path: &Path) -> Result<()> {
        persistence::save_view(path, &self.saved_view())
    }

    /// Load a saved view: its bounds (fitted to this canvas), fractal and palette.
    pub fn load_view(&mut self, path: &Path) -> Result<()> {
        let view = persistence::load_view(path)?;
        let viewport = view.checked_viewport()?;
        self.set_fractal(view.fractal_type);
        self.set_palette(view.color_type);
        self.set_viewport(viewport);
        Ok(())
    }

    pub fn save_keyframes(&self, path: &Path) -> Result<()> {
        persistence::save_keyframes(path, self.keyframes())
    }

    pub fn load_keyframes(&mut self, path: &Path) -> Result<()> {
        let keyframes = persistence::load_keyframes(path)?;
        if self.tour.is_running() {
            warn!("Stopping the running tour to load keyframes");
            self.tour.stop_tour();
        }
        self.tour.set_keyframes(keyframes);
        Ok(())
    }

    /// Render the current view at its canvas size and save it.
    pub fn export(&self, path: &Path) -> Result<()> {
        export_image(path, &self.viewport, &self.painter)
    }
}
