use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rayon::prelude::*;
use tracing::{debug, info};

use fractour_core::{Fractal, Viewport};

use crate::escape_buffer::EscapeBuffer;
use crate::tile::{build_tile_grid, Tile};

// ---------------------------------------------------------------------------
// Cancellation
// ---------------------------------------------------------------------------

/// Tracks the current render generation for cancellation and progress.
///
/// Incrementing the generation signals all in-flight work to stop early.
/// The progress counters let a caller poll how far a render has got.
#[derive(Debug)]
pub struct RenderCancel {
    generation: AtomicU64,
    progress_done: AtomicUsize,
    progress_total: AtomicUsize,
}

impl RenderCancel {
    pub fn new() -> Self {
        Self {
            generation: AtomicU64::new(0),
            progress_done: AtomicUsize::new(0),
            progress_total: AtomicUsize::new(0),
        }
    }

    /// Cancel the current render by advancing the generation.
    pub fn cancel(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// `true` once the generation has moved past `gen`.
    pub fn is_stale(&self, gen: u64) -> bool {
        self.generation() != gen
    }

    /// Reset progress for a new phase with `total` work units.
    pub fn reset_progress(&self, total: usize) {
        self.progress_total.store(total, Ordering::Relaxed);
        self.progress_done.store(0, Ordering::Relaxed);
    }

    /// Increment completed work units by one and return the new count.
    pub fn inc_progress(&self) -> usize {
        self.progress_done.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Read the current progress as `(done, total)`.
    pub fn progress(&self) -> (usize, usize) {
        (
            self.progress_done.load(Ordering::Relaxed),
            self.progress_total.load(Ordering::Relaxed),
        )
    }
}

impl Default for RenderCancel {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Result
// ---------------------------------------------------------------------------

/// The result of a full-frame render.
///
/// Contains escape values only; the caller applies a palette to produce
/// displayable pixels.
#[derive(Debug, Clone)]
pub struct RenderResult {
    pub values: EscapeBuffer,
    pub elapsed: Duration,
    pub cancelled: bool,
    pub tiles_rendered: usize,
    pub tiles_border_traced: usize,
}

// ---------------------------------------------------------------------------
// Border tracing
// ---------------------------------------------------------------------------

#[inline]
fn eval_pixel<F: Fractal>(fractal: &F, viewport: &Viewport, px: u32, py: u32, max: u32) -> f64 {
    fractal.evaluate(viewport.pixel_to_complex(px as f32, py as f32), max)
}

/// If every border pixel of the tile has the same escape value, return it so
/// the tile can be flood-filled.
fn check_border_uniform<F: Fractal>(
    fractal: &F,
    viewport: &Viewport,
    tile: &Tile,
    max_iterations: u32,
) -> Option<f64> {
    if tile.width < 3 || tile.height < 3 {
        return None;
    }

    let first = eval_pixel(fractal, viewport, tile.x, tile.y, max_iterations);
    let same = |v: f64| v.to_bits() == first.to_bits();

    // Top and bottom rows.
    for px in 0..tile.width {
        if !same(eval_pixel(fractal, viewport, tile.x + px, tile.y, max_iterations)) {
            return None;
        }
        let bottom = tile.y + tile.height - 1;
        if !same(eval_pixel(fractal, viewport, tile.x + px, bottom, max_iterations)) {
            return None;
        }
    }

    // Left and right columns (corners already checked above).
    for py in 1..tile.height - 1 {
        if !same(eval_pixel(fractal, viewport, tile.x, tile.y + py, max_iterations)) {
            return None;
        }
        let right = tile.x + tile.width - 1;
        if !same(eval_pixel(fractal, viewport, right, tile.y + py, max_iterations)) {
            return None;
        }
    }

    Some(first)
}

// ---------------------------------------------------------------------------
// Per-tile rendering
// ---------------------------------------------------------------------------

/// Render a single tile, trying the border-trace shortcut first when allowed.
fn render_tile<F: Fractal>(
    fractal: &F,
    viewport: &Viewport,
    tile: &Tile,
    max_iterations: u32,
    border_trace: bool,
    bt_count: &AtomicUsize,
) -> Vec<f64> {
    if border_trace {
        if let Some(fill) = check_border_uniform(fractal, viewport, tile, max_iterations) {
            bt_count.fetch_add(1, Ordering::Relaxed);
            return vec![fill; tile.pixel_count()];
        }
    }

    let mut data = Vec::with_capacity(tile.pixel_count());
    for py in 0..tile.height {
        for px in 0..tile.width {
            data.push(eval_pixel(fractal, viewport, tile.x + px, tile.y + py, max_iterations));
        }
    }
    data
}

// ---------------------------------------------------------------------------
// Full-frame render
// ---------------------------------------------------------------------------

/// Render a full frame using the tiled, multithreaded pipeline.
///
/// Generic over the fractal type for static dispatch. Tiles are processed in
/// parallel via Rayon; `cancel` can abort the render from another thread and
/// reports per-tile progress.
///
/// Set `use_border_tracing` only for fractals whose escape-time level sets
/// enclose their interiors (Mandelbrot, Julia). Newton basins do not, so pass
/// `false` there.
pub fn render<F: Fractal + Sync>(
    fractal: &F,
    viewport: &Viewport,
    max_iterations: u32,
    cancel: &Arc<RenderCancel>,
    use_border_tracing: bool,
) -> RenderResult {
    let gen = cancel.generation();
    let (w, h) = viewport.pixel_size();
    cancel.reset_progress(build_tile_grid(w, h).len());
    render_generation(fractal, viewport, max_iterations, cancel, gen, use_border_tracing, true)
}

/// Render against a generation captured by the caller.
///
/// Used by the tour pre-render, where many frames share one generation and
/// progress is counted per frame rather than per tile.
pub(crate) fn render_generation<F: Fractal + Sync>(
    fractal: &F,
    viewport: &Viewport,
    max_iterations: u32,
    cancel: &RenderCancel,
    gen: u64,
    use_border_tracing: bool,
    track_progress: bool,
) -> RenderResult {
    let start = Instant::now();
    let bt_count = AtomicUsize::new(0);
    let (width, height) = viewport.pixel_size();

    let tiles = build_tile_grid(width, height);
    debug!(
        tile_count = tiles.len(),
        width, height, max_iterations, "Starting tiled render"
    );

    let tile_data: Vec<Option<Vec<f64>>> = tiles
        .par_iter()
        .map(|tile| {
            if cancel.is_stale(gen) {
                return None;
            }
            let data = render_tile(
                fractal,
                viewport,
                tile,
                max_iterations,
                use_border_tracing,
                &bt_count,
            );
            if track_progress {
                cancel.inc_progress();
            }
            Some(data)
        })
        .collect();

    let cancelled = cancel.is_stale(gen);
    let mut values = EscapeBuffer::new(width, height, max_iterations);
    let mut tiles_rendered = 0;
    for (tile, data) in tiles.iter().zip(tile_data.iter()) {
        if let Some(d) = data {
            values.blit_tile(tile, d);
            tiles_rendered += 1;
        }
    }

    let tiles_border_traced = bt_count.load(Ordering::Relaxed);
    let elapsed = start.elapsed();
    if track_progress {
        info!(
            elapsed_ms = elapsed.as_millis(),
            tiles_rendered, tiles_border_traced, cancelled, "Render complete"
        );
    } else {
        debug!(
            elapsed_ms = elapsed.as_millis(),
            tiles_rendered, tiles_border_traced, cancelled, "Frame rendered"
        );
    }

    RenderResult {
        values,
        elapsed,
        cancelled,
        tiles_rendered,
        tiles_border_traced,
    }
}
