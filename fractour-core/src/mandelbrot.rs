use crate::complex::Complex;
use crate::error::CoreError;
use crate::fractal::{normalized, Fractal, INTERIOR};

/// Bailout radius used unless a caller asks for another one.
pub const DEFAULT_ESCAPE_RADIUS: f64 = 2.0;

/// The Mandelbrot set: `z_{n+1} = z_n² + c`, starting from `z₀ = 0`.
///
/// The point `c` is the coordinate on the complex plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mandelbrot {
    escape_radius: f64,
    escape_radius_sq: f64,
}

impl Mandelbrot {
    pub fn new(escape_radius: f64) -> crate::Result<Self> {
        validate_radius(escape_radius)?;
        Ok(Self {
            escape_radius,
            escape_radius_sq: escape_radius * escape_radius,
        })
    }

    pub fn escape_radius(&self) -> f64 {
        self.escape_radius
    }
}

impl Default for Mandelbrot {
    fn default() -> Self {
        Self {
            escape_radius: DEFAULT_ESCAPE_RADIUS,
            escape_radius_sq: DEFAULT_ESCAPE_RADIUS * DEFAULT_ESCAPE_RADIUS,
        }
    }
}

pub(crate) fn validate_radius(r: f64) -> crate::Result<()> {
    if r <= 0.0 || !r.is_finite() {
        return Err(CoreError::InvalidEscapeRadius(r));
    }
    Ok(())
}

/// Returns `true` if `c` lies inside the main cardioid.
///
/// Closed-form check that skips iterating a large share of the default view.
#[inline]
fn in_cardioid(re: f64, im: f64) -> bool {
    let im2 = im * im;
    let q = (re - 0.25) * (re - 0.25) + im2;
    q * (q + (re - 0.25)) <= 0.25 * im2
}

/// Returns `true` if `c` lies inside the period-2 bulb.
#[inline]
fn in_period2_bulb(re: f64, im: f64) -> bool {
    (re + 1.0) * (re + 1.0) + im * im <= 0.0625
}

impl Fractal for Mandelbrot {
    fn evaluate(&self, c: Complex, max_iterations: u32) -> f64 {
        // Both regions are bounded forever, so any budget reports them as interior.
        if in_cardioid(c.re, c.im) || in_period2_bulb(c.re, c.im) {
            return INTERIOR;
        }

        let mut z = Complex::ZERO;

        // Brent's cycle detection state.
        let mut old_z = z;
        let mut period: u32 = 0;
        let mut check: u32 = 3;

        for n in 0..max_iterations {
            z = z.square() + c;

            if z.norm_sq() >= self.escape_radius_sq {
                return normalized(n, max_iterations);
            }

            // Skip the first 32 steps and only look every 4th step.
            if n >= 32 && n & 3 == 0 {
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
        }

        INTERIOR
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mb() -> Mandelbrot {
        Mandelbrot::default()
    }

    #[test]
    fn origin_is_exactly_interior() {
        assert_eq!(mb().evaluate(Complex::ZERO, 200), 1.0);
    }

    #[test]
    fn far_point_escapes_on_first_step() {
        assert_eq!(mb().evaluate(Complex::new(10.0, 0.0), 200), 0.0);
    }

    #[test]
    fn points_outside_radius_two_are_below_one() {
        for k in 0..64 {
            let angle = k as f64 * std::f64::consts::TAU / 64.0;
            for r in [2.0001, 2.5, 4.0, 100.0] {
                let c = Complex::new(r * angle.cos(), r * angle.sin());
                let v = mb().evaluate(c, 50);
                assert!(v < 1.0, "{c} gave {v}");
            }
        }
    }

    #[test]
    fn known_escape_step() {
        // c = 1: z₁ = 1, z₂ = 2 (|z|² = 4 reaches the bound) → n = 1.
        assert_eq!(mb().evaluate(Complex::new(1.0, 0.0), 10), 0.1);
    }

    #[test]
    fn period_two_center_is_interior() {
        assert_eq!(mb().evaluate(Complex::new(-1.0, 0.0), 500), INTERIOR);
    }

    #[test]
    fn zero_budget_reports_interior() {
        assert_eq!(mb().evaluate(Complex::new(0.5, 0.5), 0), INTERIOR);
    }

    #[test]
    fn larger_budget_never_reports_an_earlier_escape() {
        let points = [
            Complex::new(-0.75, 0.1),
            Complex::new(0.3, 0.5),
            Complex::new(-0.1011, 0.9563),
            Complex::new(0.26, 0.0),
        ];
        for c in points {
            let small = 50;
            let large = 400;
            let v_small = mb().evaluate(c, small);
            if v_small == INTERIOR {
                let v_large = mb().evaluate(c, large);
                assert!(v_large >= small as f64 / large as f64);
            }
        }
    }

    #[test]
    fn invalid_radius_is_rejected() {
        assert!(Mandelbrot::new(0.0).is_err());
        assert!(Mandelbrot::new(f64::NAN).is_err());
        assert_eq!(Mandelbrot::new(4.0).unwrap().escape_radius(), 4.0);
    }
}
