//! Interpolation helpers for tour animation.

/// Cubic ease-in-out: slow start, fast middle, slow end.
///
/// Maps `0 → 0`, `0.5 → 0.5`, `1 → 1` exactly.
#[inline]
pub fn ease_in_out_cubic(t: f64) -> f64 {
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}

/// Linear interpolation that reproduces both endpoints exactly.
#[inline]
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a * (1.0 - t) + b * t
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cubic_fixed_points() {
        assert_eq!(ease_in_out_cubic(0.0), 0.0);
        assert_eq!(ease_in_out_cubic(0.5), 0.5);
        assert_eq!(ease_in_out_cubic(1.0), 1.0);
    }

    #[test]
    fn cubic_is_monotonic() {
        let mut prev = 0.0;
        for i in 1..=100 {
            let v = ease_in_out_cubic(i as f64 / 100.0);
            assert!(v >= prev);
            prev = v;
        }
    }

    #[test]
    fn cubic_is_symmetric() {
        for i in 0..=20 {
            let t = i as f64 / 20.0;
            let sum = ease_in_out_cubic(t) + ease_in_out_cubic(1.0 - t);
            assert!((sum - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn lerp_endpoints() {
        assert_eq!(lerp(-2.0, -1.0, 0.0), -2.0);
        assert_eq!(lerp(-2.0, -1.0, 1.0), -1.0);
        assert_eq!(lerp(0.1, 0.7, 1.0), 0.7);
        assert_eq!(lerp(0.0, 10.0, 0.25), 2.5);
    }
}
