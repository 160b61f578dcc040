use std::sync::mpsc;
use std::time::Instant;

use fractour_core::Viewport;
use tracing::{debug, info};

use crate::buffer::RenderBuffer;
use crate::error::RenderError;
use crate::paint::{check_dimensions, Painter};
use crate::renderer::RenderCancel;

/// Progress is reported roughly this many times over a pre-render.
const PROGRESS_STEPS: usize = 50;

/// Put `(index, item)` pairs that arrived in any order back into index order.
///
/// Returns `None` if an index in `0..len` is missing or out of range.
pub fn reassemble<T>(len: usize, completed: impl IntoIterator<Item = (usize, T)>) -> Option<Vec<T>> {
    let mut slots: Vec<Option<T>> = (0..len).map(|_| None).collect();
    for (index, item) in completed {
        *slots.get_mut(index)? = Some(item);
    }
    slots.into_iter().collect()
}

/// Render every viewport in parallel and return the images in input order.
///
/// Each viewport is an independent task on the rayon pool; finished images
/// come back over a channel tagged with their index. `cancel` is checked
/// before a task starts, inside the tiled renderer and when an image
/// completes; advancing its generation makes the whole call return
/// [`RenderError::Cancelled`] and drops every partial result.
///
/// `on_progress(done, total)` is called about every 2 % of frames, from
/// worker threads.
pub fn prerender_frames<P>(
    painter: &Painter,
    viewports: &[Viewport],
    cancel: &RenderCancel,
    on_progress: P,
) -> crate::Result<Vec<RenderBuffer>>
where
    P: Fn(usize, usize) + Sync,
{
    let gen = cancel.generation();
    let total = viewports.len();
    if let Some(vp) = viewports.first() {
        check_dimensions(vp)?;
    }
    cancel.reset_progress(total);
    let step = (total / PROGRESS_STEPS).max(1);
    let start = Instant::now();
    debug!(total, "Starting tour pre-render");

    let (tx, rx) = mpsc::channel::<(usize, RenderBuffer)>();
    rayon::scope(|s| {
        for (index, viewport) in viewports.iter().copied().enumerate() {
            let tx = tx.clone();
            let on_progress = &on_progress;
            s.spawn(move |_| {
                if cancel.is_stale(gen) {
                    return;
                }
                let Some(image) = painter.paint_generation(&viewport, cancel, gen) else {
                    return;
                };
                if cancel.is_stale(gen) {
                    return;
                }
                let done = cancel.inc_progress();
                if done % step == 0 || done == total {
                    on_progress(done, total);
                }
                // The receiver outlives the scope.
                let _ = tx.send((index, image));
            });
        }
    });
    drop(tx);

    let completed: Vec<(usize, RenderBuffer)> = rx.into_iter().collect();
    if cancel.is_stale(gen) {
        info!(
            completed = completed.len(),
            total, "Tour pre-render cancelled"
        );
        return Err(RenderError::Cancelled);
    }

    let frames = reassemble(total, completed).ok_or(RenderError::Cancelled)?;
    info!(
        frames = total,
        elapsed_ms = start.elapsed().as_millis(),
        "Tour pre-render complete"
    );
    Ok(frames)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use fractour_core::{Bounds, TourPlan};

    #[test]
    fn reassembles_reverse_completion_order() {
        let completed = (0..5).rev().map(|i| (i, format!("frame {i}")));
        let ordered = reassemble(5, completed).unwrap();
        assert_eq!(ordered[0], "frame 0");
        assert_eq!(ordered[4], "frame 4");
    }

    #[test]
    fn reassemble_detects_gaps() {
        assert!(reassemble(3, vec![(0, 'a'), (2, 'c')]).is_none());
        assert!(reassemble(2, vec![(0, 'a'), (1, 'b'), (5, 'x')]).is_none());
        assert_eq!(reassemble::<u8>(0, vec![]), Some(vec![]));
    }

    fn tour_viewports() -> Vec<Viewport> {
        let stops = [Bounds::DEFAULT, Bounds::new(-1.0, 0.0, -0.5, 0.5)];
        TourPlan::from_bounds(&stops, 6)
            .unwrap()
            .viewports(48.0, 32.0)
    }

    #[test]
    fn frames_come_back_in_plan_order() {
        let viewports = tour_viewports();
        let painter = Painter::default();
        let cancel = RenderCancel::new();
        let calls = AtomicUsize::new(0);

        let frames = prerender_frames(&painter, &viewports, &cancel, |done, total| {
            assert!(done <= total);
            calls.fetch_add(1, Ordering::Relaxed);
        })
        .unwrap();

        assert_eq!(frames.len(), viewports.len());
        assert_eq!(cancel.progress(), (6, 6));
        assert!(calls.load(Ordering::Relaxed) > 0);
        for (frame, vp) in frames.iter().zip(&viewports) {
            let single = painter.paint(vp, &Arc::new(RenderCancel::new())).unwrap();
            assert_eq!(frame, &single.image);
        }
    }

    #[test]
    fn cancel_mid_render_discards_frames() {
        let viewports = tour_viewports();
        let cancel = Arc::new(RenderCancel::new());
        let canceller = Arc::clone(&cancel);

        let result = prerender_frames(&Painter::default(), &viewports, &cancel, |_, _| {
            canceller.cancel();
        });

        assert!(matches!(result, Err(RenderError::Cancelled)));
    }

    #[test]
    fn unsized_frames_are_rejected() {
        let viewports = vec![Viewport::default(); 3];
        let result = prerender_frames(&Painter::default(), &viewports, &RenderCancel::new(), |_, _| {});
        assert!(matches!(result, Err(RenderError::InvalidDimensions { .. })));
    }
}
