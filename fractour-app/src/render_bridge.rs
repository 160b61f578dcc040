use std::sync::mpsc;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use fractour_core::Viewport;
use fractour_render::{PaintedFrame, Painter, RenderCancel, RenderError};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

pub(crate) struct RenderRequest {
    pub(crate) id: u64,
    pub(crate) viewport: Viewport,
    pub(crate) painter: Painter,
}

/// A finished interactive render.
#[derive(Debug)]
pub struct RenderResponse {
    pub id: u64,
    pub viewport: Viewport,
    pub frame: PaintedFrame,
}

/// Owns the background render thread.
///
/// Each request cancels whatever is in flight. The worker always skips ahead
/// to the newest queued request, and responses for superseded ids are
/// dropped on the receiving side.
pub struct RenderBridge {
    tx_request: Option<mpsc::Sender<RenderRequest>>,
    rx_response: mpsc::Receiver<RenderResponse>,
    cancel: Arc<RenderCancel>,
    render_id: u64,
    worker: Option<JoinHandle<()>>,
}

impl RenderBridge {
    pub fn spawn() -> std::io::Result<Self> {
        let (tx_request, rx_request) = mpsc::channel::<RenderRequest>();
        let (tx_response, rx_response) = mpsc::channel::<RenderResponse>();
        let cancel = Arc::new(RenderCancel::new());

        let worker_cancel = Arc::clone(&cancel);
        let worker = std::thread::Builder::new()
            .name("render-worker".into())
            .spawn(move || render_worker(rx_request, tx_response, worker_cancel))?;

        Ok(Self {
            tx_request: Some(tx_request),
            rx_response,
            cancel,
            render_id: 0,
            worker: Some(worker),
        })
    }

    /// Queue a render of `viewport`, superseding any earlier request.
    pub fn request(&mut self, viewport: Viewport, painter: Painter) -> u64 {
        self.cancel.cancel();
        self.render_id += 1;
        debug!(id = self.render_id, "Requesting render");

        let req = RenderRequest {
            id: self.render_id,
            viewport,
            painter,
        };
        if let Some(tx) = &self.tx_request {
            if tx.send(req).is_err() {
                warn!("Render worker is gone; request dropped");
            }
        }
        self.render_id
    }

    pub fn latest_id(&self) -> u64 {
        self.render_id
    }

    /// Tile progress of the render in flight as `(done, total)`.
    pub fn progress(&self) -> (usize, usize) {
        self.cancel.progress()
    }

    /// Abandon the render in flight.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Non-blocking: the response for the latest request, if it has arrived.
    pub fn poll(&mut self) -> Option<RenderResponse> {
        let mut latest = None;
        while let Ok(resp) = self.rx_response.try_recv() {
            if resp.id == self.render_id {
                latest = Some(resp);
            }
        }
        latest
    }

    /// Block until the latest request finishes or `timeout` passes.
    pub fn wait(&mut self, timeout: Duration) -> Option<RenderResponse> {
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.checked_duration_since(Instant::now())?;
            match self.rx_response.recv_timeout(remaining) {
                Ok(resp) if resp.id == self.render_id => return Some(resp),
                Ok(stale) => debug!(id = stale.id, "Discarding stale render"),
                Err(_) => return None,
            }
        }
    }
}

impl Drop for RenderBridge {
    fn drop(&mut self) {
        self.cancel.cancel();
        // Closing the channel ends the worker loop.
        self.tx_request.take();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

// ---------------------------------------------------------------------------
// Worker
// ---------------------------------------------------------------------------

fn drain_latest(initial: RenderRequest, rx: &mpsc::Receiver<RenderRequest>) -> RenderRequest {
    let mut req = initial;
    while let Ok(newer) = rx.try_recv() {
        req = newer;
    }
    req
}

fn render_worker(
    rx: mpsc::Receiver<RenderRequest>,
    tx: mpsc::Sender<RenderResponse>,
    cancel: Arc<RenderCancel>,
) {
    debug!("Render worker started");
    while let Ok(initial) = rx.recv() {
        let req = drain_latest(initial, &rx);
        match req.painter.paint(&req.viewport, &cancel) {
            Ok(frame) => {
                let resp = RenderResponse {
                    id: req.id,
                    viewport: req.viewport,
                    frame,
                };
                if tx.send(resp).is_err() {
                    return;
                }
            }
            Err(RenderError::Cancelled) => debug!(id = req.id, "Render superseded"),
            Err(e) => warn!(id = req.id, "Render failed: {e}"),
        }
    }
    info!("Render worker exiting");
}
