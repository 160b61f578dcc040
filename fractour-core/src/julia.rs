use crate::complex::Complex;
use crate::fractal::{normalized, Fractal, INTERIOR};
use crate::mandelbrot::{validate_radius, DEFAULT_ESCAPE_RADIUS};

/// A Julia set: `z_{n+1} = z_n² + c`, where `c` is a fixed constant
/// and `z₀` is the point on the complex plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Julia {
    /// The fixed constant `c` that defines this Julia set.
    c: Complex,
    escape_radius_sq: f64,
}

impl Julia {
    pub fn new(c: Complex, escape_radius: f64) -> crate::Result<Self> {
        validate_radius(escape_radius)?;
        Ok(Self {
            c,
            escape_radius_sq: escape_radius * escape_radius,
        })
    }

    /// Julia set for `c` with the default bailout radius.
    pub fn with_c(c: Complex) -> Self {
        Self {
            c,
            escape_radius_sq: DEFAULT_ESCAPE_RADIUS * DEFAULT_ESCAPE_RADIUS,
        }
    }

    /// A visually interesting default: `c = -0.7 + 0.27015i`.
    pub fn default_c() -> Complex {
        Complex::new(-0.7, 0.27015)
    }

    pub fn c(&self) -> Complex {
        self.c
    }
}

impl Default for Julia {
    fn default() -> Self {
        Self::with_c(Self::default_c())
    }
}

impl Fractal for Julia {
    fn evaluate(&self, point: Complex, max_iterations: u32) -> f64 {
        let mut z = point;

        let mut old_z = z;
        let mut period: u32 = 0;
        let mut check: u32 = 3;

        for n in 0..max_iterations {
            z = z.square() + self.c;

            if z.norm_sq() >= self.escape_radius_sq {
                return normalized(n, max_iterations);
            }

            // Brent's cycle detection.
            if (z.re - old_z.re).abs() < 1e-13 && (z.im - old_z.im).abs() < 1e-13 {
                return INTERIOR;
            }
            period += 1;
            if period > check {
                old_z = z;
                period = 0;
                check = check.saturating_mul(2);
            }
        }

        INTERIOR
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn far_point_escapes_immediately() {
        assert_eq!(Julia::default().evaluate(Complex::new(10.0, 0.0), 100), 0.0);
    }

    #[test]
    fn c_zero_keeps_the_unit_disk() {
        // z ↦ z² with |z₀| < 1 shrinks toward the origin forever.
        let j = Julia::with_c(Complex::ZERO);
        assert_eq!(j.evaluate(Complex::new(0.5, 0.2), 300), INTERIOR);
        assert!(j.evaluate(Complex::new(1.5, 0.0), 300) < 1.0);
    }

    #[test]
    fn matches_mandelbrot_recurrence_from_origin() {
        // Julia(c) started at 0 walks the same orbit as Mandelbrot at c.
        let c = Complex::new(0.5, 0.5);
        let julia = Julia::with_c(c).evaluate(Complex::ZERO, 100);
        let mandel = crate::Mandelbrot::default().evaluate(c, 100);
        assert_eq!(julia, mandel);
    }

    #[test]
    fn values_stay_normalized() {
        let j = Julia::default();
        for i in 0..40 {
            let p = Complex::new(-1.6 + i as f64 * 0.08, 0.3);
            let v = j.evaluate(p, 120);
            assert!((0.0..=1.0).contains(&v));
        }
    }

    #[test]
    fn rejects_bad_radius() {
        assert!(Julia::new(Complex::ZERO, -1.0).is_err());
        assert_eq!(Julia::new(Complex::ONE, 3.0).unwrap().c(), Complex::ONE);
    }
}
