use std::sync::Arc;

use fractour_core::{AnyFractal, FractalKind, IterationPolicy, Viewport};

use crate::buffer::RenderBuffer;
use crate::error::RenderError;
use crate::escape_buffer::EscapeBuffer;
use crate::export::ExportMetadata;
use crate::palette::Palette;
use crate::renderer::{render, render_generation, RenderCancel};

/// A colored image together with the escape values it was made from.
#[derive(Debug, Clone)]
pub struct PaintedFrame {
    pub image: RenderBuffer,
    pub values: EscapeBuffer,
    pub max_iterations: u32,
}

/// Everything needed to turn a viewport into pixels.
///
/// Plain `Copy` data, so each render task can own its own painter.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Painter {
    pub fractal: AnyFractal,
    pub palette: Palette,
    pub policy: IterationPolicy,
}

impl Painter {
    pub fn new(fractal: AnyFractal, palette: Palette, policy: IterationPolicy) -> Self {
        Self {
            fractal,
            palette,
            policy,
        }
    }

    pub fn max_iterations(&self, viewport: &Viewport) -> u32 {
        self.policy.for_viewport(viewport)
    }

    /// Whether tiles with a uniform border are filled without evaluating
    /// their interior.
    ///
    /// This is a speed shortcut, not an exact method: a tile whose border
    /// is uniform but which holds a small island of different values inside
    /// comes out flat. Uniform regions (deep interior, far exterior) are
    /// unaffected, while detailed views can differ from per-pixel evaluation
    /// in a small fraction of pixels. Newton basins are not enclosed by their
    /// level sets, so Newton always evaluates every pixel.
    pub fn border_tracing(&self) -> bool {
        self.fractal.kind() != FractalKind::Newton
    }

    /// Render and colorize one viewport.
    pub fn paint(
        &self,
        viewport: &Viewport,
        cancel: &Arc<RenderCancel>,
    ) -> crate::Result<PaintedFrame> {
        check_dimensions(viewport)?;
        let max_iterations = self.max_iterations(viewport);
        let result = render(
            &self.fractal,
            viewport,
            max_iterations,
            cancel,
            self.border_tracing(),
        );
        if result.cancelled {
            return Err(RenderError::Cancelled);
        }
        Ok(PaintedFrame {
            image: self.palette.colorize(&result.values),
            values: result.values,
            max_iterations,
        })
    }

    /// Render one tour frame against a shared generation. `None` if the
    /// generation moved on while rendering.
    pub(crate) fn paint_generation(
        &self,
        viewport: &Viewport,
        cancel: &RenderCancel,
        gen: u64,
    ) -> Option<RenderBuffer> {
        let result = render_generation(
            &self.fractal,
            viewport,
            self.max_iterations(viewport),
            cancel,
            gen,
            self.border_tracing(),
            false,
        );
        if result.cancelled {
            return None;
        }
        Some(self.palette.colorize(&result.values))
    }

    pub fn metadata(&self, viewport: &Viewport) -> ExportMetadata {
        let julia_c = match self.fractal {
            AnyFractal::Julia(j) => Some((j.c().re, j.c().im)),
            _ => None,
        };
        ExportMetadata {
            fractal: self.fractal.kind(),
            bounds: viewport.bounds(),
            palette: self.palette,
            max_iterations: self.max_iterations(viewport),
            julia_c,
        }
    }
}

pub(crate) fn check_dimensions(viewport: &Viewport) -> crate::Result<()> {
    let (width, height) = viewport.pixel_size();
    if width == 0 || height == 0 {
        return Err(RenderError::InvalidDimensions { width, height });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use fractour_core::{Complex, INTERIOR};

    #[test]
    fn paint_produces_colored_frame() {
        let painter = Painter::default();
        let vp = Viewport::default_mandelbrot(96.0, 64.0);
        let frame = painter.paint(&vp, &Arc::new(RenderCancel::new())).unwrap();
        assert_eq!(frame.image.pixels.len(), 96 * 64 * 4);
        assert_eq!(frame.max_iterations, 200);
        let center = frame.values.get(64, 32).unwrap();
        assert_eq!(center, INTERIOR);
        assert_eq!(frame.image.pixel(64, 32), Some([0, 0, 0, 255]));
    }

    #[test]
    fn unsized_viewport_is_rejected() {
        let err = Painter::default()
            .paint(&Viewport::default(), &Arc::new(RenderCancel::new()))
            .unwrap_err();
        assert!(matches!(err, RenderError::InvalidDimensions { width: 0, height: 0 }));
    }

    #[test]
    fn border_tracing_off_for_newton() {
        let mut p = Painter::default();
        assert!(p.border_tracing());
        p.fractal = AnyFractal::from_kind(FractalKind::Newton, Complex::ZERO);
        assert!(!p.border_tracing());
    }

    #[test]
    fn metadata_carries_julia_constant() {
        let c = Complex::new(0.285, 0.01);
        let p = Painter::new(
            AnyFractal::from_kind(FractalKind::Julia, c),
            Palette::Fire,
            IterationPolicy::fixed(77),
        );
        let meta = p.metadata(&Viewport::default_centered(10.0, 10.0));
        assert_eq!(meta.julia_c, Some((0.285, 0.01)));
        assert_eq!(meta.max_iterations, 77);
        assert_eq!(meta.palette, Palette::Fire);
    }
}
