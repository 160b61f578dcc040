use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::JoinHandle;
use std::time::Duration;

use tracing::{debug, info, warn};

use fractour_core::{frames_per_segment, Bounds, Keyframe, KeyframeStore, TourPlan, TOUR_FPS};
use fractour_render::{prerender_frames, Painter, RenderBuffer, RenderCancel, RenderError};

use crate::error::Result;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Where the tour engine is in its lifecycle.
///
/// `Idle → Rendering → Playing → Idle`, or `Rendering → Idle` when stopped
/// before playback. `Stopped` is only visible while a stop request waits for
/// the worker to wind down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TourState {
    #[default]
    Idle,
    Rendering,
    Playing,
    Stopped,
}

impl TourState {
    pub fn label(self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Rendering => "Rendering\u{2026}",
            Self::Playing => "Playing",
            Self::Stopped => "Stopping",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TourSettings {
    pub fps: u32,
    pub seconds_per_segment: f64,
    /// Time each frame stays on screen during playback.
    pub playback_delay: Duration,
}

impl Default for TourSettings {
    fn default() -> Self {
        Self {
            fps: TOUR_FPS,
            seconds_per_segment: 2.0,
            playback_delay: Duration::from_millis(60),
        }
    }
}

/// Everything a cached set of frames depends on.
#[derive(Debug, Clone, PartialEq)]
struct CacheKey {
    stops: Vec<Bounds>,
    frames_per_segment: u32,
    painter: Painter,
    width: f32,
    height: f32,
}

#[derive(Debug)]
struct FrameCache {
    key: CacheKey,
    frames: Arc<Vec<RenderBuffer>>,
    final_bounds: Bounds,
}

/// State shared with the worker thread.
#[derive(Debug, Default)]
struct TourShared {
    cancel: RenderCancel,
    state: Mutex<TourState>,
    current_frame: AtomicUsize,
    total_frames: AtomicUsize,
    cache: Mutex<Option<FrameCache>>,
    /// Bumped on every keyframe or settings edit. A render only lands in
    /// the cache if the epoch it started under is still current.
    epoch: AtomicU64,
    /// Set when playback runs to the end; taken by [`TourEngine::poll`].
    finished: Mutex<Option<Bounds>>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl TourShared {
    fn state(&self) -> TourState {
        *lock(&self.state)
    }

    fn set_state(&self, state: TourState) {
        let mut current = lock(&self.state);
        if *current != state {
            debug!(from = ?*current, to = ?state, "Tour state");
            *current = state;
        }
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Keyframe list plus the render-then-play tour state machine.
///
/// The engine never touches the session viewport. It reports the bounds to
/// restore through [`stop_tour`](Self::stop_tour) and [`poll`](Self::poll).
#[derive(Debug, Default)]
pub struct TourEngine {
    keyframes: KeyframeStore,
    settings: TourSettings,
    shared: Arc<TourShared>,
    worker: Option<JoinHandle<()>>,
}

impl TourEngine {
    pub fn new(settings: TourSettings) -> Self {
        Self {
            keyframes: KeyframeStore::new(),
            settings,
            shared: Arc::default(),
            worker: None,
        }
    }

    pub fn settings(&self) -> TourSettings {
        self.settings
    }

    pub fn set_settings(&mut self, settings: TourSettings) {
        if settings != self.settings {
            self.settings = settings;
            self.invalidate_cache();
        }
    }

    // -- Keyframes --

    pub fn keyframes(&self) -> &KeyframeStore {
        &self.keyframes
    }

    /// Replace the whole list, e.g. after loading it from disk.
    pub fn set_keyframes(&mut self, keyframes: Vec<Keyframe>) {
        self.keyframes = KeyframeStore::from_keyframes(keyframes);
        self.invalidate_cache();
    }

    pub fn add_keyframe(&mut self, name: Option<&str>, bounds: Bounds) -> u64 {
        let id = self.keyframes.add(name, bounds);
        self.invalidate_cache();
        info!(id, count = self.keyframes.len(), "Keyframe added");
        id
    }

    pub fn remove_keyframe(&mut self, id: u64) -> Result<Keyframe> {
        let removed = self.keyframes.remove(id)?;
        self.invalidate_cache();
        info!(id, count = self.keyframes.len(), "Keyframe removed");
        Ok(removed)
    }

    pub fn rename_keyframe(&mut self, id: u64, name: &str) -> Result<()> {
        self.keyframes.rename(id, name)?;
        self.invalidate_cache();
        Ok(())
    }

    fn invalidate_cache(&self) {
        let mut cache = lock(&self.shared.cache);
        self.shared.epoch.fetch_add(1, Ordering::SeqCst);
        cache.take();
    }

    // -- Status --

    pub fn state(&self) -> TourState {
        self.shared.state()
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state(), TourState::Rendering | TourState::Playing)
    }

    /// Index of the frame on screen during playback.
    pub fn current_frame(&self) -> usize {
        self.shared.current_frame.load(Ordering::Relaxed)
    }

    pub fn total_frames(&self) -> usize {
        self.shared.total_frames.load(Ordering::Relaxed)
    }

    /// Fraction in `[0, 1]`: frames rendered while rendering, frames shown
    /// while playing.
    pub fn progress(&self) -> f32 {
        match self.state() {
            TourState::Rendering => {
                let (done, total) = self.shared.cancel.progress();
                if total == 0 {
                    0.0
                } else {
                    done as f32 / total as f32
                }
            }
            TourState::Playing => {
                let total = self.total_frames();
                if total <= 1 {
                    1.0
                } else {
                    self.current_frame() as f32 / (total - 1) as f32
                }
            }
            TourState::Idle | TourState::Stopped => 0.0,
        }
    }

    /// `true` when a finished render for the current keyframes is cached.
    pub fn has_cached_frames(&self) -> bool {
        lock(&self.shared.cache).is_some()
    }

    /// All frames of the last completed render, in playback order.
    pub fn frames(&self) -> Option<Arc<Vec<RenderBuffer>>> {
        lock(&self.shared.cache).as_ref().map(|c| Arc::clone(&c.frames))
    }

    /// The frame currently on screen during playback.
    pub fn current_image(&self) -> Option<RenderBuffer> {
        let frames = self.frames()?;
        frames.get(self.current_frame()).cloned()
    }

    // -- Lifecycle --

    /// Render every tour frame for a `width × height` canvas, then play them.
    ///
    /// Returns `false` (and does nothing) with fewer than two keyframes or
    /// while a tour is already running. A cached render with the same inputs
    /// is played without rendering again.
    pub fn start_tour(&mut self, painter: Painter, width: f32, height: f32) -> bool {
        if self.keyframes.len() < 2 {
            warn!(
                count = self.keyframes.len(),
                "A tour needs at least two keyframes"
            );
            return false;
        }
        if self.is_running() {
            warn!("Tour already running");
            return false;
        }
        self.join_worker();

        let per_segment = frames_per_segment(self.settings.fps, self.settings.seconds_per_segment);
        let Some(plan) = TourPlan::build(self.keyframes.as_slice(), per_segment) else {
            return false;
        };
        let key = CacheKey {
            stops: self.keyframes.iter().map(|k| k.bounds).collect(),
            frames_per_segment: per_segment,
            painter,
            width,
            height,
        };

        let cached = {
            let mut cache = lock(&self.shared.cache);
            if cache.as_ref().is_some_and(|c| c.key != key) {
                cache.take();
            }
            cache.as_ref().map(|c| Arc::clone(&c.frames))
        };

        let shared = &self.shared;
        shared.current_frame.store(0, Ordering::Relaxed);
        shared.total_frames.store(plan.len(), Ordering::Relaxed);
        lock(&shared.finished).take();

        let gen = shared.cancel.generation();
        let epoch = shared.epoch.load(Ordering::SeqCst);
        let delay = self.settings.playback_delay;
        let worker_shared = Arc::clone(shared);

        info!(
            keyframes = self.keyframes.len(),
            frames = plan.len(),
            cached = cached.is_some(),
            "Starting tour"
        );
        shared.set_state(if cached.is_some() {
            TourState::Playing
        } else {
            TourState::Rendering
        });

        let spawned = std::thread::Builder::new()
            .name("tour-worker".into())
            .spawn(move || {
                let frames = match cached {
                    Some(frames) => frames,
                    None => match render_tour(&worker_shared, &plan, key, gen, epoch) {
                        Some(frames) => frames,
                        None => return,
                    },
                };
                play(&worker_shared, &frames, &plan, gen, delay);
            });

        match spawned {
            Ok(handle) => {
                self.worker = Some(handle);
                true
            }
            Err(e) => {
                warn!("Failed to spawn tour worker: {e}");
                self.shared.set_state(TourState::Idle);
                false
            }
        }
    }

    /// Cancel rendering or playback and return to `Idle`.
    ///
    /// Returns the last keyframe's bounds for the caller to restore if a tour
    /// was running and a render for the current keyframes has completed.
    /// Stopping an idle engine returns `None`.
    pub fn stop_tour(&mut self) -> Option<Bounds> {
        let was = self.state();
        if was != TourState::Idle {
            self.shared.set_state(TourState::Stopped);
        }
        self.shared.cancel.cancel();
        self.join_worker();
        self.shared.set_state(TourState::Idle);
        lock(&self.shared.finished).take();

        if was == TourState::Idle {
            return None;
        }
        info!(from = ?was, "Tour stopped");
        lock(&self.shared.cache).as_ref().map(|c| c.final_bounds)
    }

    /// Bounds to restore once playback has reached its last frame, reported once.
    pub fn poll(&mut self) -> Option<Bounds> {
        let finished = lock(&self.shared.finished).take()?;
        self.join_worker();
        Some(finished)
    }

    /// Block until the engine leaves `Rendering`, or `timeout` passes.
    /// Returns the state it ended in.
    pub fn wait_while_rendering(&self, timeout: Duration) -> TourState {
        let step = Duration::from_millis(10);
        let mut waited = Duration::ZERO;
        while self.state() == TourState::Rendering && waited < timeout {
            std::thread::sleep(step);
            waited += step;
        }
        self.state()
    }

    fn join_worker(&mut self) {
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("Tour worker panicked");
            }
        }
    }
}

impl Drop for TourEngine {
    fn drop(&mut self) {
        self.shared.cancel.cancel();
        self.join_worker();
    }
}

// ---------------------------------------------------------------------------
// Worker
// ---------------------------------------------------------------------------

/// Pre-render all frames. `None` if cancelled or failed; the partial
/// result is discarded.
fn render_tour(
    shared: &TourShared,
    plan: &TourPlan,
    key: CacheKey,
    gen: u64,
    epoch: u64,
) -> Option<Arc<Vec<RenderBuffer>>> {
    // Stopped before the worker got going.
    if shared.cancel.is_stale(gen) {
        return None;
    }
    let final_bounds = *key.stops.last()?;
    let viewports = plan.viewports(key.width, key.height);
    let result = prerender_frames(&key.painter, &viewports, &shared.cancel, |done, total| {
        debug!(done, total, "Tour pre-render progress");
    });

    match result {
        Ok(frames) => {
            let frames = Arc::new(frames);
            let mut cache = lock(&shared.cache);
            if shared.epoch.load(Ordering::SeqCst) == epoch {
                *cache = Some(FrameCache {
                    key,
                    frames: Arc::clone(&frames),
                    final_bounds,
                });
            } else {
                debug!("Keyframes changed during pre-render; frames not cached");
            }
            drop(cache);
            shared.set_state(TourState::Playing);
            Some(frames)
        }
        Err(RenderError::Cancelled) => {
            debug!("Tour pre-render cancelled");
            None
        }
        Err(e) => {
            warn!("Tour pre-render failed: {e}");
            shared.set_state(TourState::Idle);
            None
        }
    }
}

/// Step through the frames with a fixed delay, stopping at any frame
/// boundary once the generation changes.
fn play(shared: &TourShared, frames: &[RenderBuffer], plan: &TourPlan, gen: u64, delay: Duration) {
    for index in 0..frames.len() {
        if shared.cancel.is_stale(gen) {
            return;
        }
        shared.current_frame.store(index, Ordering::Relaxed);
        std::thread::sleep(delay);
    }
    if shared.cancel.is_stale(gen) {
        return;
    }
    *lock(&shared.finished) = plan.final_bounds();
    shared.set_state(TourState::Idle);
    info!(frames = frames.len(), "Tour finished");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    const K1: Bounds = Bounds::new(-2.0, 1.0, -1.0, 1.0);
    const K2: Bounds = Bounds::new(-1.0, 0.0, -0.5, 0.5);

    fn quick_settings() -> TourSettings {
        TourSettings {
            fps: 10,
            seconds_per_segment: 0.5,
            playback_delay: Duration::ZERO,
        }
    }

    fn engine_with_two_keyframes(settings: TourSettings) -> TourEngine {
        let mut engine = TourEngine::new(settings);
        engine.add_keyframe(Some("Overview"), K1);
        engine.add_keyframe(None, K2);
        engine
    }

    fn wait_for_finish(engine: &mut TourEngine) -> Option<Bounds> {
        let deadline = Instant::now() + Duration::from_secs(30);
        while Instant::now() < deadline {
            if let Some(b) = engine.poll() {
                return Some(b);
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        None
    }

    #[test]
    fn needs_two_keyframes() {
        let mut engine = TourEngine::new(quick_settings());
        assert!(!engine.start_tour(Painter::default(), 32.0, 24.0));
        engine.add_keyframe(None, K1);
        assert!(!engine.start_tour(Painter::default(), 32.0, 24.0));
        assert_eq!(engine.state(), TourState::Idle);
    }

    #[test]
    fn renders_plays_and_reports_final_bounds() {
        let mut engine = engine_with_two_keyframes(quick_settings());
        assert!(engine.start_tour(Painter::default(), 32.0, 24.0));

        assert_eq!(wait_for_finish(&mut engine), Some(K2));
        assert_eq!(engine.state(), TourState::Idle);
        assert_eq!(engine.total_frames(), 5);
        assert_eq!(engine.current_frame(), 4);
        let frames = engine.frames().unwrap();
        assert_eq!(frames.len(), 5);
        assert_eq!(frames[0].width, 32);
        // Reported once.
        assert_eq!(engine.poll(), None);
    }

    #[test]
    fn matching_cache_is_reused() {
        let mut engine = engine_with_two_keyframes(quick_settings());
        let painter = Painter::default();
        assert!(engine.start_tour(painter, 32.0, 24.0));
        wait_for_finish(&mut engine);
        let first = engine.frames().unwrap();

        assert!(engine.start_tour(painter, 32.0, 24.0));
        wait_for_finish(&mut engine);
        assert!(Arc::ptr_eq(&first, &engine.frames().unwrap()));

        // A different canvas renders afresh.
        assert!(engine.start_tour(painter, 16.0, 12.0));
        wait_for_finish(&mut engine);
        assert_eq!(engine.frames().unwrap()[0].width, 16);
    }

    #[test]
    fn keyframe_edits_invalidate_cache() {
        let mut engine = engine_with_two_keyframes(quick_settings());
        assert!(engine.start_tour(Painter::default(), 32.0, 24.0));
        wait_for_finish(&mut engine);
        assert!(engine.has_cached_frames());

        let id = engine.keyframes().first().unwrap().id;
        engine.rename_keyframe(id, "Start").unwrap();
        assert!(!engine.has_cached_frames());
        assert_eq!(engine.stop_tour(), None);
    }

    #[test]
    fn stop_during_playback_returns_final_bounds() {
        let settings = TourSettings {
            playback_delay: Duration::from_millis(50),
            ..quick_settings()
        };
        let mut engine = engine_with_two_keyframes(settings);
        assert!(engine.start_tour(Painter::default(), 32.0, 24.0));
        assert_eq!(
            engine.wait_while_rendering(Duration::from_secs(30)),
            TourState::Playing
        );
        assert!(engine.progress() < 1.0);

        assert_eq!(engine.stop_tour(), Some(K2));
        assert_eq!(engine.state(), TourState::Idle);
        assert_eq!(engine.poll(), None);
        assert!(!engine.is_running());
    }

    #[test]
    fn edit_during_render_is_not_cached() {
        let settings = TourSettings {
            fps: 60,
            seconds_per_segment: 1.0,
            playback_delay: Duration::ZERO,
        };
        let mut engine = engine_with_two_keyframes(settings);
        assert!(engine.start_tour(Painter::default(), 160.0, 120.0));
        assert_eq!(engine.state(), TourState::Rendering);
        engine.add_keyframe(Some("Late"), Bounds::new(-0.8, -0.7, 0.0, 0.075));

        // The tour still plays the frames it started with.
        assert_eq!(wait_for_finish(&mut engine), Some(K2));
        assert_eq!(engine.keyframes().len(), 3);
        assert!(!engine.has_cached_frames());
        assert!(engine.frames().is_none());
        assert_eq!(engine.stop_tour(), None);
    }

    #[test]
    fn stop_after_natural_end_restores_nothing() {
        let mut engine = engine_with_two_keyframes(quick_settings());
        assert!(engine.start_tour(Painter::default(), 32.0, 24.0));
        assert_eq!(wait_for_finish(&mut engine), Some(K2));
        assert!(engine.has_cached_frames());

        assert_eq!(engine.stop_tour(), None);
        assert!(engine.has_cached_frames());
    }

    #[test]
    fn stop_while_idle_is_harmless() {
        let mut engine = TourEngine::default();
        assert_eq!(engine.stop_tour(), None);
        assert_eq!(engine.state(), TourState::Idle);
    }

    #[test]
    fn remove_renumbers_and_invalidates() {
        let mut engine = engine_with_two_keyframes(quick_settings());
        let third = engine.add_keyframe(Some("Deep"), Bounds::new(-0.8, -0.7, 0.0, 0.075));
        let first = engine.keyframes().first().unwrap().id;
        engine.remove_keyframe(first).unwrap();
        let numbers: Vec<u32> = engine.keyframes().iter().map(|k| k.frame_number).collect();
        assert_eq!(numbers, vec![1, 2]);
        assert_eq!(engine.keyframes().last().unwrap().id, third);
        assert!(engine.remove_keyframe(first).is_err());
    }
}
