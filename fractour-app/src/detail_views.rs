use std::sync::Arc;

use tracing::{debug, info};

use fractour_core::{AnyFractal, Complex, Julia, Viewport};
use fractour_render::{PaintedFrame, Painter, RenderCancel};

/// A secondary view opened from a point pick: the Julia set for that point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetailView {
    pub id: u64,
    pub c: Complex,
}

impl DetailView {
    /// `[-2, 2]²` fitted to a `width × height` canvas.
    pub fn viewport(&self, width: f32, height: f32) -> Viewport {
        Viewport::default_centered(width, height)
    }

    /// Julia painter for this view, keeping the palette and iteration policy of `base`.
    pub fn painter(&self, base: &Painter) -> Painter {
        Painter::new(
            AnyFractal::Julia(Julia::with_c(self.c)),
            base.palette,
            base.policy,
        )
    }

    pub fn render(&self, base: &Painter, width: f32, height: f32) -> crate::error::Result<PaintedFrame> {
        let viewport = self.viewport(width, height);
        let frame = self
            .painter(base)
            .paint(&viewport, &Arc::new(RenderCancel::new()))?;
        Ok(frame)
    }
}

/// The open detail views, owned by the session.
#[derive(Debug, Default)]
pub struct DetailViews {
    views: Vec<DetailView>,
    next_id: u64,
}

impl DetailViews {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a view for `c` and return its id.
    pub fn open(&mut self, c: Complex) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.views.push(DetailView { id, c });
        info!(id, c = %c, "Opened detail view");
        id
    }

    pub fn close(&mut self, id: u64) -> bool {
        let before = self.views.len();
        self.views.retain(|v| v.id != id);
        self.views.len() != before
    }

    /// Close every open view; returns how many were open.
    pub fn close_all(&mut self) -> usize {
        let n = self.views.len();
        if n > 0 {
            debug!(count = n, "Closing detail views");
        }
        self.views.clear();
        n
    }

    pub fn get(&self, id: u64) -> Option<&DetailView> {
        self.views.iter().find(|v| v.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &DetailView> {
        self.views.iter()
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }
}
