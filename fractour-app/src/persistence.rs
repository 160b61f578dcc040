//! JSON files for saved views and keyframe lists.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use fractour_core::{FractalKind, Keyframe, Viewport};
use fractour_render::Palette;

use crate::error::{AppError, Result};

/// A snapshot of what is on screen, as written by "save view".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedView {
    #[serde(flatten)]
    pub viewport: Viewport,
    #[serde(default)]
    pub fractal_type: FractalKind,
    pub color_type: Palette,
}

impl SavedView {
    pub fn new(viewport: Viewport, fractal_type: FractalKind, color_type: Palette) -> Self {
        Self {
            viewport,
            fractal_type,
            color_type,
        }
    }

    /// The stored viewport, rejected if its bounds are inverted or not finite.
    pub fn checked_viewport(&self) -> Result<Viewport> {
        let vp = &self.viewport;
        Ok(Viewport::new(vp.bounds(), vp.width.max(0.0), vp.height.max(0.0))?)
    }
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serde_json::to_string_pretty(value)?)?;
    Ok(())
}

pub fn save_view(path: &Path, view: &SavedView) -> Result<()> {
    write_json(path, view)?;
    info!(path = %path.display(), "Saved view");
    Ok(())
}

pub fn load_view(path: &Path) -> Result<SavedView> {
    let view: SavedView = serde_json::from_str(&fs::read_to_string(path)?)?;
    view.checked_viewport()?;
    info!(path = %path.display(), fractal = %view.fractal_type, "Loaded view");
    Ok(view)
}

pub fn save_keyframes(path: &Path, keyframes: &[Keyframe]) -> Result<()> {
    write_json(path, keyframes)?;
    info!(path = %path.display(), count = keyframes.len(), "Saved keyframes");
    Ok(())
}

/// Load a keyframe list; every keyframe must have valid bounds.
pub fn load_keyframes(path: &Path) -> Result<Vec<Keyframe>> {
    let keyframes: Vec<Keyframe> = serde_json::from_str(&fs::read_to_string(path)?)?;
    if let Some(bad) = keyframes.iter().find(|k| !k.bounds.is_valid()) {
        return Err(AppError::Core(fractour_core::CoreError::InvalidViewport {
            reason: format!("keyframe {:?} has empty or non-finite bounds", bad.name),
        }));
    }
    info!(path = %path.display(), count = keyframes.len(), "Loaded keyframes");
    Ok(keyframes)
}
