use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::complex::Complex;
use crate::error::CoreError;
use crate::julia::Julia;
use crate::mandelbrot::Mandelbrot;
use crate::newton::Newton;

/// Normalized escape value reported for points that never leave the bound
/// within the iteration budget.
///
/// Every evaluator returns exactly this value for interior points and every
/// palette maps it to the same interior color, so consumers never re-derive
/// the sentinel on their own.
pub const INTERIOR: f64 = 1.0;

/// `true` when `value` is the interior sentinel (or not a number at all).
#[inline]
pub fn is_interior(value: f64) -> bool {
    value.is_nan() || value >= INTERIOR
}

/// Normalize a step count against the iteration budget.
#[inline]
pub(crate) fn normalized(steps: u32, max_iterations: u32) -> f64 {
    steps as f64 / max_iterations as f64
}

/// Escape-time evaluator.
///
/// Maps a complex point and an iteration budget to a value in `[0, 1]`:
/// `n / max_iterations` for the step at which the orbit left the bound, or
/// [`INTERIOR`] if it never did.
///
/// Implementors are plain values with no interior mutability, so a shared
/// reference can be evaluated from any number of threads at once. Renderers
/// should be generic over `F: Fractal` so the loop can be inlined.
pub trait Fractal {
    fn evaluate(&self, point: Complex, max_iterations: u32) -> f64;
}

impl<F: Fractal + ?Sized> Fractal for &F {
    #[inline]
    fn evaluate(&self, point: Complex, max_iterations: u32) -> f64 {
        (**self).evaluate(point, max_iterations)
    }
}

// ---------------------------------------------------------------------------
// Kinds
// ---------------------------------------------------------------------------

/// The fractal families the explorer knows about.
///
/// Serialized with the lowercase names used in saved views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FractalKind {
    #[default]
    Mandelbrot,
    Julia,
    Newton,
}

impl FractalKind {
    pub const ALL: [FractalKind; 3] = [Self::Mandelbrot, Self::Julia, Self::Newton];

    /// Stable identifier used in saved views and on the command line.
    pub fn name(self) -> &'static str {
        match self {
            Self::Mandelbrot => "mandelbrot",
            Self::Julia => "julia",
            Self::Newton => "newton",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Mandelbrot => "Mandelbrot",
            Self::Julia => "Julia",
            Self::Newton => "Newton",
        }
    }
}

impl fmt::Display for FractalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FractalKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| CoreError::UnknownFractal(s.to_string()))
    }
}

/// A configured evaluator of any known kind.
///
/// This is what the session hands to renderers: a closed set of variants
/// with no captured state beyond their own parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AnyFractal {
    Mandelbrot(Mandelbrot),
    Julia(Julia),
    Newton(Newton),
}

impl AnyFractal {
    /// Build the default evaluator for `kind`. `julia_c` is only used for Julia.
    pub fn from_kind(kind: FractalKind, julia_c: Complex) -> Self {
        match kind {
            FractalKind::Mandelbrot => Self::Mandelbrot(Mandelbrot::default()),
            FractalKind::Julia => Self::Julia(Julia::with_c(julia_c)),
            FractalKind::Newton => Self::Newton(Newton::default()),
        }
    }

    pub fn kind(&self) -> FractalKind {
        match self {
            Self::Mandelbrot(_) => FractalKind::Mandelbrot,
            Self::Julia(_) => FractalKind::Julia,
            Self::Newton(_) => FractalKind::Newton,
        }
    }
}

impl Default for AnyFractal {
    fn default() -> Self {
        Self::Mandelbrot(Mandelbrot::default())
    }
}

impl Fractal for AnyFractal {
    #[inline]
    fn evaluate(&self, point: Complex, max_iterations: u32) -> f64 {
        match self {
            Self::Mandelbrot(m) => m.evaluate(point, max_iterations),
            Self::Julia(j) => j.evaluate(point, max_iterations),
            Self::Newton(n) => n.evaluate(point, max_iterations),
        }
    }
}
