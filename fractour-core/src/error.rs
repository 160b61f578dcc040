use thiserror::Error;

/// Errors originating from the core fractal engine.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid escape radius: {0} (must be > 0.0)")]
    InvalidEscapeRadius(f64),

    #[error("invalid convergence tolerance: {0} (must be > 0.0)")]
    InvalidTolerance(f64),

    #[error("invalid viewport: {reason}")]
    InvalidViewport { reason: String },

    #[error("unknown fractal type: {0:?}")]
    UnknownFractal(String),

    #[error("no keyframe with id {0}")]
    UnknownKeyframe(u64),
}
