pub mod complex;
pub mod easing;
pub mod error;
pub mod fractal;
pub mod history;
pub mod iterations;
pub mod julia;
pub mod keyframe;
pub mod mandelbrot;
pub mod newton;
pub mod tour_plan;
pub mod viewport;

// Re-export primary types for convenience.
pub use complex::Complex;
pub use easing::{ease_in_out_cubic, lerp};
pub use error::CoreError;
pub use fractal::{is_interior, AnyFractal, Fractal, FractalKind, INTERIOR};
pub use history::UndoStack;
pub use iterations::IterationPolicy;
pub use julia::Julia;
pub use keyframe::{Keyframe, KeyframeStore};
pub use mandelbrot::Mandelbrot;
pub use newton::Newton;
pub use tour_plan::{frames_per_segment, PlannedFrame, TourPlan, TOUR_FPS};
pub use viewport::{Bounds, Selection, Viewport, MIN_SELECTION_PX};

/// Convenience result type for the core crate.
pub type Result<T> = std::result::Result<T, CoreError>;
