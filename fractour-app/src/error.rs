use thiserror::Error;

/// Errors from the session, persistence and export layers.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("unsupported image format {0:?} (expected .png, .jpg or .jpeg)")]
    UnsupportedFormat(String),

    #[error("the canvas has no size yet")]
    EmptyCanvas,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("image encoding failed: {0}")]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    Render(#[from] fractour_render::RenderError),

    #[error(transparent)]
    Core(#[from] fractour_core::CoreError),
}

pub type Result<T> = std::result::Result<T, AppError>;
