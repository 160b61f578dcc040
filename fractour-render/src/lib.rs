pub mod buffer;
pub mod error;
pub mod escape_buffer;
pub mod export;
pub mod paint;
pub mod palette;
pub mod prerender;
pub mod renderer;
pub mod tile;

pub use buffer::RenderBuffer;
pub use error::RenderError;
pub use escape_buffer::EscapeBuffer;
pub use export::{export_png, ExportMetadata};
pub use paint::{PaintedFrame, Painter};
pub use palette::{colorize, ColorMap, Palette, INTERIOR_COLOR};
pub use prerender::{prerender_frames, reassemble};
pub use renderer::{render, RenderCancel, RenderResult};
pub use tile::TILE_SIZE;

/// Convenience result type for the render crate.
pub type Result<T> = std::result::Result<T, RenderError>;
