use std::fmt;
use std::str::FromStr;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use fractour_core::is_interior;

use crate::buffer::RenderBuffer;
use crate::error::RenderError;
use crate::escape_buffer::EscapeBuffer;

/// Opaque black, shared by every palette for interior points.
pub const INTERIOR_COLOR: [u8; 4] = [0, 0, 0, 255];

/// Maps a normalized escape value to an RGBA color.
pub trait ColorMap {
    fn color(&self, value: f64) -> [u8; 4];
}

/// Colorize an entire escape buffer into an RGBA pixel buffer.
pub fn colorize<M: ColorMap + Sync>(map: &M, values: &EscapeBuffer) -> RenderBuffer {
    let mut pixels = vec![0u8; values.data.len() * 4];
    pixels
        .par_chunks_mut(4)
        .zip(values.data.par_iter())
        .for_each(|(pixel, &v)| pixel.copy_from_slice(&map.color(v)));
    RenderBuffer {
        width: values.width,
        height: values.height,
        pixels,
    }
}

#[inline]
fn rgb(r: f64, g: f64, b: f64) -> [u8; 4] {
    let to_u8 = |c: f64| (c.clamp(0.0, 1.0) * 255.0) as u8;
    [to_u8(r), to_u8(g), to_u8(b), 255]
}

// ---------------------------------------------------------------------------
// Palette
// ---------------------------------------------------------------------------

/// The built-in color schemes.
///
/// Every variant clamps its input to `[0, 1]`, treats NaN as interior and
/// paints interior points [`INTERIOR_COLOR`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Palette {
    /// Linear luminance.
    Grayscale,
    /// Trigonometric channel mix that cycles through hues.
    #[default]
    Rainbow,
    /// Blue-white ramp with a highlight near the boundary.
    Ice,
    /// Black through red to orange.
    Fire,
    /// Nonlinear blend tuned for Newton convergence counts.
    NewtonColor,
}

impl Palette {
    pub const ALL: [Palette; 5] = [
        Self::Grayscale,
        Self::Rainbow,
        Self::Ice,
        Self::Fire,
        Self::NewtonColor,
    ];

    /// Stable identifier used in saved views and on the command line.
    pub fn name(self) -> &'static str {
        match self {
            Self::Grayscale => "grayscale",
            Self::Rainbow => "rainbow",
            Self::Ice => "ice",
            Self::Fire => "fire",
            Self::NewtonColor => "newtonColor",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Grayscale => "Grayscale",
            Self::Rainbow => "Rainbow",
            Self::Ice => "Ice",
            Self::Fire => "Fire",
            Self::NewtonColor => "Newton",
        }
    }

    /// Colorize a whole buffer with this palette.
    pub fn colorize(&self, values: &EscapeBuffer) -> RenderBuffer {
        colorize(self, values)
    }

    /// `n` evenly spaced samples across the escaped range, for swatches.
    pub fn preview_colors(&self, n: usize) -> Vec<[u8; 4]> {
        let n = n.max(1);
        (0..n)
            .map(|i| self.color(i as f64 / n as f64))
            .collect()
    }
}

impl ColorMap for Palette {
    fn color(&self, value: f64) -> [u8; 4] {
        if is_interior(value) {
            return INTERIOR_COLOR;
        }
        let p = value.clamp(0.0, 1.0);
        match self {
            Self::Grayscale => rgb(p, p, p),
            Self::Rainbow => rgb(
                (7.0 * p).cos().abs(),
                (12.0 * (1.0 - p)).sin().abs(),
                ((4.0 * p).sin() * (4.0 * (1.0 - p)).cos()).abs(),
            ),
            Self::Ice => {
                let (r, g) = (0.5 * p, p);
                // Slow-escaping points near the set fade toward white.
                if p > 0.9 {
                    let boost = (p - 0.9) / 0.1;
                    rgb(r + (1.0 - r) * boost, g + (1.0 - g) * boost, 1.0)
                } else {
                    rgb(r, g, 1.0)
                }
            }
            Self::Fire => rgb(p, 0.5 * p, 0.0),
            Self::NewtonColor => {
                let s = p.sqrt();
                let mut color = (
                    0.5 + 0.5 * (std::f64::consts::TAU * s).cos(),
                    s * (1.0 - p),
                    (1.0 - s).powi(2),
                );
                if p > 0.75 {
                    color.0 = (color.0 + 0.3).min(1.0);
                    color.1 = (color.1 + 0.2).min(1.0);
                }
                if p > 0.95 {
                    color = (1.0, 0.95, 0.6);
                }
                rgb(color.0, color.1, color.2)
            }
        }
    }
}

impl fmt::Display for Palette {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Palette {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(wanted) || p.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| RenderError::UnknownPalette(s.to_string()))
    }
}
