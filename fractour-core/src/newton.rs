use crate::complex::Complex;
use crate::error::CoreError;
use crate::fractal::{normalized, Fractal, INTERIOR};

/// Newton's method on `f(z) = z³ − 1`: `z ← z − (z³ − 1) / (3z²)`.
///
/// The escape value measures how quickly the starting point settles on one
/// of the three cube roots of unity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Newton {
    /// Squared step length below which the iteration counts as converged.
    tolerance: f64,
}

impl Newton {
    pub const DEFAULT_TOLERANCE: f64 = 1e-6;

    pub fn new(tolerance: f64) -> crate::Result<Self> {
        if tolerance <= 0.0 || !tolerance.is_finite() {
            return Err(CoreError::InvalidTolerance(tolerance));
        }
        Ok(Self { tolerance })
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }
}

impl Default for Newton {
    fn default() -> Self {
        Self {
            tolerance: Self::DEFAULT_TOLERANCE,
        }
    }
}

impl Fractal for Newton {
    fn evaluate(&self, point: Complex, max_iterations: u32) -> f64 {
        let mut z = point;

        for n in 0..max_iterations {
            let z2 = z.square();
            let derivative = z2 * 3.0;
            // f'(z) = 0 only at the origin; the method has nowhere to go.
            if derivative.norm_sq() == 0.0 {
                return INTERIOR;
            }

            let step = (z2 * z - Complex::ONE) / derivative;
            z -= step;

            if step.norm_sq() < self.tolerance {
                return normalized(n, max_iterations);
            }
        }

        INTERIOR
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_converges_on_first_step() {
        assert_eq!(Newton::default().evaluate(Complex::ONE, 50), 0.0);
    }

    #[test]
    fn origin_never_converges() {
        assert_eq!(Newton::default().evaluate(Complex::ZERO, 50), INTERIOR);
    }

    #[test]
    fn nearby_points_converge_quickly() {
        let v = Newton::default().evaluate(Complex::new(1.2, 0.1), 50);
        assert!(v > 0.0 && v < 0.3, "got {v}");
    }

    #[test]
    fn farther_points_take_longer() {
        let n = Newton::default();
        let near = n.evaluate(Complex::new(1.05, 0.0), 100);
        let far = n.evaluate(Complex::new(40.0, 0.0), 100);
        assert!(far > near);
        assert!(far < INTERIOR);
    }

    #[test]
    fn tiny_budget_saturates() {
        assert_eq!(Newton::default().evaluate(Complex::new(40.0, 3.0), 2), INTERIOR);
    }

    #[test]
    fn tolerance_must_be_positive() {
        assert!(Newton::new(0.0).is_err());
        assert_eq!(Newton::new(1e-9).unwrap().tolerance(), 1e-9);
    }
}
