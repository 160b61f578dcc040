use crate::easing::ease_in_out_cubic;
use crate::keyframe::Keyframe;
use crate::viewport::{Bounds, Viewport};

/// Playback rate tours are planned for.
pub const TOUR_FPS: u32 = 60;

/// Frames rendered between two consecutive keyframes, never fewer than two.
pub fn frames_per_segment(fps: u32, seconds_per_segment: f64) -> u32 {
    let frames = (fps as f64 * seconds_per_segment.max(0.0)).round();
    if frames.is_finite() {
        (frames as u32).max(2)
    } else {
        2
    }
}

/// One synthetic viewpoint of a tour.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlannedFrame {
    /// Position in the whole tour.
    pub index: usize,
    /// Index of the segment's starting keyframe.
    pub segment: usize,
    pub bounds: Bounds,
}

/// Every interpolated viewpoint of a tour, in playback order.
///
/// Frame `i` of each segment uses `t = i / (n − 1)` eased with
/// [`ease_in_out_cubic`], so the first and last frame of a segment are its
/// keyframes exactly.
#[derive(Debug, Clone, PartialEq)]
pub struct TourPlan {
    frames: Vec<PlannedFrame>,
    frames_per_segment: u32,
}

impl TourPlan {
    /// `None` unless at least two keyframes are given.
    pub fn build(keyframes: &[Keyframe], frames_per_segment: u32) -> Option<Self> {
        let bounds: Vec<Bounds> = keyframes.iter().map(|k| k.bounds).collect();
        Self::from_bounds(&bounds, frames_per_segment)
    }

    pub fn from_bounds(stops: &[Bounds], frames_per_segment: u32) -> Option<Self> {
        if stops.len() < 2 {
            return None;
        }
        let n = frames_per_segment.max(2);
        let last = (n - 1) as f64;

        let frames = stops
            .windows(2)
            .enumerate()
            .flat_map(|(segment, pair)| {
                let (from, to) = (pair[0], pair[1]);
                (0..n).map(move |i| {
                    let t = ease_in_out_cubic(i as f64 / last);
                    (segment, from.lerp(&to, t))
                })
            })
            .enumerate()
            .map(|(index, (segment, bounds))| PlannedFrame {
                index,
                segment,
                bounds,
            })
            .collect();

        Some(Self {
            frames,
            frames_per_segment: n,
        })
    }

    pub fn frames(&self) -> &[PlannedFrame] {
        &self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn frames_per_segment(&self) -> u32 {
        self.frames_per_segment
    }

    /// The frames as viewports on a `width × height` canvas.
    ///
    /// Bounds are used as interpolated, with no aspect correction.
    pub fn viewports(&self, width: f32, height: f32) -> Vec<Viewport> {
        let canvas = Viewport {
            width,
            height,
            ..Viewport::default()
        };
        self.frames
            .iter()
            .map(|f| canvas.with_bounds(f.bounds))
            .collect()
    }

    /// Bounds of the final frame, which equal the last keyframe.
    pub fn final_bounds(&self) -> Option<Bounds> {
        self.frames.last().map(|f| f.bounds)
    }
}
