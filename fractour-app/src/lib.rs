pub mod app_dir;
pub mod detail_views;
pub mod error;
pub mod export;
pub mod persistence;
pub mod preferences;
pub mod render_bridge;
pub mod session;
pub mod tour;

pub use detail_views::{DetailView, DetailViews};
pub use error::{AppError, Result};
pub use export::{draw_caption, export_image, write_image, ImageFormat};
pub use persistence::{load_keyframes, load_view, save_keyframes, save_view, SavedView};
pub use preferences::AppPreferences;
pub use render_bridge::{RenderBridge, RenderResponse};
pub use session::Session;
pub use tour::{TourEngine, TourSettings, TourState};
