use serde::{Deserialize, Serialize};

use crate::complex::Complex;
use crate::error::CoreError;

/// Selections narrower or shorter than this many pixels are ignored.
pub const MIN_SELECTION_PX: f32 = 10.0;

// ---------------------------------------------------------------------------
// Bounds
// ---------------------------------------------------------------------------

/// The four edges of a rectangle on the complex plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bounds {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl Bounds {
    /// The classic Mandelbrot overview `[-2, 1] × [-1, 1]`.
    pub const DEFAULT: Self = Self {
        x_min: -2.0,
        x_max: 1.0,
        y_min: -1.0,
        y_max: 1.0,
    };

    pub const fn new(x_min: f64, x_max: f64, y_min: f64, y_max: f64) -> Self {
        Self {
            x_min,
            x_max,
            y_min,
            y_max,
        }
    }

    /// Square region of half-side `half_extent` around `center`.
    pub fn around(center: Complex, half_extent: f64) -> Self {
        Self::new(
            center.re - half_extent,
            center.re + half_extent,
            center.im - half_extent,
            center.im + half_extent,
        )
    }

    pub fn width(&self) -> f64 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> f64 {
        self.y_max - self.y_min
    }

    pub fn center(&self) -> Complex {
        Complex::new(
            (self.x_min + self.x_max) / 2.0,
            (self.y_min + self.y_max) / 2.0,
        )
    }

    /// Both extents positive and every edge finite.
    pub fn is_valid(&self) -> bool {
        [self.x_min, self.x_max, self.y_min, self.y_max]
            .iter()
            .all(|v| v.is_finite())
            && self.x_max > self.x_min
            && self.y_max > self.y_min
    }

    /// Edge-wise linear interpolation.
    ///
    /// Written as `a·(1−t) + b·t` so `t = 0` and `t = 1` reproduce the
    /// endpoints exactly.
    pub fn lerp(&self, to: &Bounds, t: f64) -> Bounds {
        Bounds {
            x_min: crate::easing::lerp(self.x_min, to.x_min, t),
            x_max: crate::easing::lerp(self.x_max, to.x_max, t),
            y_min: crate::easing::lerp(self.y_min, to.y_min, t),
            y_max: crate::easing::lerp(self.y_max, to.y_max, t),
        }
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self::DEFAULT
    }
}

// ---------------------------------------------------------------------------
// Selection
// ---------------------------------------------------------------------------

/// A rubber-band rectangle in canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Selection {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Selection {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Flip negative extents so the anchor is the top-left corner.
    pub fn normalized(self) -> Self {
        let (x, width) = if self.width < 0.0 {
            (self.x + self.width, -self.width)
        } else {
            (self.x, self.width)
        };
        let (y, height) = if self.height < 0.0 {
            (self.y + self.height, -self.height)
        } else {
            (self.y, self.height)
        };
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Large enough on both axes to be treated as a zoom request.
    pub fn is_significant(&self) -> bool {
        let s = self.normalized();
        s.width >= MIN_SELECTION_PX && s.height >= MIN_SELECTION_PX
    }

    /// Grow the narrower side about the top-left anchor until
    /// `width / height == aspect`.
    pub fn fit_aspect(self, aspect: f64) -> Self {
        let s = self.normalized();
        if s.height == 0.0 || aspect <= 0.0 || !aspect.is_finite() {
            return s;
        }
        let sel_aspect = s.width as f64 / s.height as f64;
        if sel_aspect > aspect {
            Self {
                height: (s.width as f64 / aspect) as f32,
                ..s
            }
        } else {
            Self {
                width: (s.height as f64 * aspect) as f32,
                ..s
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Viewport
// ---------------------------------------------------------------------------

/// The visible rectangle of the complex plane and the canvas it is drawn on.
///
/// Screen `y` grows downward while the imaginary axis grows upward, so the
/// top canvas row maps to `y_max`. The canvas size is `0×0` until the first
/// [`resize`](Self::resize); conversions degenerate to the top-left corner
/// in that state instead of dividing by zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Viewport {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
    /// Canvas width in pixels.
    pub width: f32,
    /// Canvas height in pixels.
    pub height: f32,
}

impl Viewport {
    /// Create a viewport with explicit bounds and canvas size.
    pub fn new(bounds: Bounds, width: f32, height: f32) -> crate::Result<Self> {
        if !bounds.is_valid() {
            return Err(CoreError::InvalidViewport {
                reason: format!(
                    "bounds must be finite with positive extents, got re [{}, {}] im [{}, {}]",
                    bounds.x_min, bounds.x_max, bounds.y_min, bounds.y_max
                ),
            });
        }
        if !(width >= 0.0 && height >= 0.0 && width.is_finite() && height.is_finite()) {
            return Err(CoreError::InvalidViewport {
                reason: format!("canvas size must be non-negative, got {width}×{height}"),
            });
        }
        Ok(Self::from_parts(bounds, width, height))
    }

    fn from_parts(bounds: Bounds, width: f32, height: f32) -> Self {
        Self {
            x_min: bounds.x_min,
            x_max: bounds.x_max,
            y_min: bounds.y_min,
            y_max: bounds.y_max,
            width,
            height,
        }
    }

    /// Default bounds fitted to a `width × height` canvas.
    pub fn default_mandelbrot(width: f32, height: f32) -> Self {
        let mut vp = Self::default();
        vp.resize(width, height);
        vp
    }

    /// `[-2, 2]²` fitted to the canvas; suits Julia and Newton overviews.
    pub fn default_centered(width: f32, height: f32) -> Self {
        let mut vp = Self::from_parts(Bounds::around(Complex::ZERO, 2.0), 0.0, 0.0);
        vp.resize(width, height);
        vp
    }

    pub fn bounds(&self) -> Bounds {
        Bounds::new(self.x_min, self.x_max, self.y_min, self.y_max)
    }

    /// Replace the four edges, keeping the canvas size.
    pub fn set_bounds(&mut self, bounds: Bounds) {
        self.x_min = bounds.x_min;
        self.x_max = bounds.x_max;
        self.y_min = bounds.y_min;
        self.y_max = bounds.y_max;
    }

    /// Copy of this viewport showing `bounds` on the same canvas.
    pub fn with_bounds(&self, bounds: Bounds) -> Self {
        Self::from_parts(bounds, self.width, self.height)
    }

    /// Canvas size in whole pixels.
    pub fn pixel_size(&self) -> (u32, u32) {
        (self.width.max(0.0) as u32, self.height.max(0.0) as u32)
    }

    // -- Derived quantities --

    /// Pixels per unit of the real axis.
    pub fn x_density(&self) -> f64 {
        let span = self.x_max - self.x_min;
        if span != 0.0 {
            self.width as f64 / span
        } else {
            1.0
        }
    }

    /// Pixels per unit of the imaginary axis.
    pub fn y_density(&self) -> f64 {
        let span = self.y_max - self.y_min;
        if span != 0.0 {
            self.height as f64 / span
        } else {
            1.0
        }
    }

    /// Real extent over imaginary extent.
    pub fn aspect_ratio(&self) -> f64 {
        let span = self.y_max - self.y_min;
        if span != 0.0 {
            (self.x_max - self.x_min) / span
        } else {
            1.0
        }
    }

    // -- Coordinate conversion --

    #[inline]
    pub fn pixel_to_complex_x(&self, x: f32) -> f64 {
        if self.width == 0.0 {
            return self.x_min;
        }
        self.x_min + (x as f64 / self.width as f64) * (self.x_max - self.x_min)
    }

    #[inline]
    pub fn pixel_to_complex_y(&self, y: f32) -> f64 {
        if self.height == 0.0 {
            return self.y_max;
        }
        self.y_max - (y as f64 / self.height as f64) * (self.y_max - self.y_min)
    }

    /// Map a canvas position to a point on the complex plane.
    #[inline]
    pub fn pixel_to_complex(&self, x: f32, y: f32) -> Complex {
        Complex::new(self.pixel_to_complex_x(x), self.pixel_to_complex_y(y))
    }

    pub fn complex_to_pixel_x(&self, re: f64) -> f32 {
        let span = self.x_max - self.x_min;
        if self.width == 0.0 || span == 0.0 {
            return 0.0;
        }
        ((re - self.x_min) / span * self.width as f64) as f32
    }

    pub fn complex_to_pixel_y(&self, im: f64) -> f32 {
        let span = self.y_max - self.y_min;
        if self.height == 0.0 || span == 0.0 {
            return 0.0;
        }
        ((self.y_max - im) / span * self.height as f64) as f32
    }

    /// Map a point on the complex plane back to canvas coordinates.
    pub fn complex_to_pixel(&self, c: Complex) -> (f32, f32) {
        (self.complex_to_pixel_x(c.re), self.complex_to_pixel_y(c.im))
    }

    // -- Mutation --

    /// Record a new canvas size and widen the short axis so the bound aspect
    /// ratio matches the pixel aspect ratio. The center stays fixed.
    pub fn resize(&mut self, width: f32, height: f32) {
        self.width = width;
        self.height = height;
        if width <= 0.0 || height <= 0.0 {
            return;
        }

        let aspect = self.aspect_ratio();
        let new_aspect = width as f64 / height as f64;

        if new_aspect > aspect {
            let center = (self.x_min + self.x_max) / 2.0;
            let half = (self.y_max - self.y_min) * new_aspect / 2.0;
            self.x_min = center - half;
            self.x_max = center + half;
        } else {
            let center = (self.y_min + self.y_max) / 2.0;
            let half = (self.x_max - self.x_min) / new_aspect / 2.0;
            self.y_min = center - half;
            self.y_max = center + half;
        }
    }

    /// Shift all four edges by a complex-plane offset.
    pub fn translate(&mut self, d_re: f64, d_im: f64) {
        self.x_min += d_re;
        self.x_max += d_re;
        self.y_min += d_im;
        self.y_max += d_im;
    }

    /// Translate by a drag of `(dx, dy)` canvas pixels; content follows the pointer.
    pub fn pan_pixels(&mut self, dx: f32, dy: f32) {
        let d_re = -(dx as f64) / self.x_density();
        let d_im = dy as f64 / self.y_density();
        self.translate(d_re, d_im);
    }

    /// The bounds a selection rectangle zooms into, or `None` if the
    /// selection is too small to act on.
    pub fn selection_bounds(&self, selection: Selection) -> Option<Bounds> {
        if !selection.is_significant() {
            return None;
        }
        let s = selection.fit_aspect(self.aspect_ratio());
        let bounds = Bounds::new(
            self.pixel_to_complex_x(s.x),
            self.pixel_to_complex_x(s.x + s.width),
            self.pixel_to_complex_y(s.y + s.height),
            self.pixel_to_complex_y(s.y),
        );
        bounds.is_valid().then_some(bounds)
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::from_parts(Bounds::DEFAULT, 0.0, 0.0)
    }
}
