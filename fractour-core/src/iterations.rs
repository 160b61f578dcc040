use serde::{Deserialize, Serialize};

use crate::viewport::Viewport;

/// Real-axis width of the reference view (`[-2, 1]`), i.e. zoom `1×`.
const REFERENCE_WIDTH: f64 = 3.0;

/// Chooses an iteration budget from how deep a viewport is zoomed.
///
/// `base + log2(zoom) × per_doubling`, clamped to `[base, cap]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IterationPolicy {
    pub base: u32,
    pub per_doubling: u32,
    pub cap: u32,
}

impl IterationPolicy {
    /// Always return `iterations`, regardless of zoom.
    pub fn fixed(iterations: u32) -> Self {
        Self {
            base: iterations,
            per_doubling: 0,
            cap: iterations,
        }
    }

    pub fn for_viewport(&self, viewport: &Viewport) -> u32 {
        let width = viewport.x_max - viewport.x_min;
        let floor = self.base.min(self.cap);
        if width <= 0.0 || !width.is_finite() {
            return floor;
        }
        let zoom = REFERENCE_WIDTH / width;
        if zoom <= 1.0 {
            return floor;
        }
        let bonus = (zoom.log2() * self.per_doubling as f64) as u64;
        (self.base as u64 + bonus).min(self.cap as u64) as u32
    }
}

impl Default for IterationPolicy {
    fn default() -> Self {
        Self {
            base: 200,
            per_doubling: 30,
            cap: 5000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::viewport::Bounds;

    fn vp(width: f64) -> Viewport {
        Viewport::new(Bounds::new(-width / 2.0, width / 2.0, -1.0, 1.0), 100.0, 100.0).unwrap()
    }

    #[test]
    fn overview_uses_base() {
        assert_eq!(IterationPolicy::default().for_viewport(&vp(3.0)), 200);
        assert_eq!(IterationPolicy::default().for_viewport(&vp(10.0)), 200);
    }

    #[test]
    fn each_doubling_adds_iterations() {
        let p = IterationPolicy::default();
        assert_eq!(p.for_viewport(&vp(1.5)), 230);
        assert_eq!(p.for_viewport(&vp(0.375)), 290);
    }

    #[test]
    fn deep_zoom_hits_cap() {
        assert_eq!(IterationPolicy::default().for_viewport(&vp(1e-300)), 5000);
    }

    #[test]
    fn fixed_policy_ignores_zoom() {
        let p = IterationPolicy::fixed(64);
        assert_eq!(p.for_viewport(&vp(3.0)), 64);
        assert_eq!(p.for_viewport(&vp(1e-9)), 64);
    }
}
