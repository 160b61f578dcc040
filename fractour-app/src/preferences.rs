use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use fractour_core::{AnyFractal, Complex, FractalKind, IterationPolicy, Julia};
use fractour_render::{Painter, Palette};

// ---------------------------------------------------------------------------
// Application preferences
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppPreferences {
    #[serde(default = "default_canvas_width")]
    pub canvas_width: f32,
    #[serde(default = "default_canvas_height")]
    pub canvas_height: f32,
    /// Iteration budget at the overview zoom level.
    #[serde(default = "default_base_iterations")]
    pub base_iterations: u32,
    /// Iterations added each time the view is zoomed in 2×.
    #[serde(default = "default_iterations_per_doubling")]
    pub iterations_per_doubling: u32,
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,
    #[serde(default = "default_undo_capacity")]
    pub undo_capacity: usize,
    #[serde(default = "default_seconds_per_segment")]
    pub seconds_per_segment: f64,
    #[serde(default = "default_playback_delay_ms")]
    pub playback_delay_ms: u64,
    #[serde(default)]
    pub fractal: FractalKind,
    #[serde(default)]
    pub palette: Palette,
    #[serde(default = "default_julia_c_re")]
    pub julia_c_re: f64,
    #[serde(default = "default_julia_c_im")]
    pub julia_c_im: f64,
    /// Where exports go. Empty means `fractour-output/` in the working directory.
    #[serde(default)]
    pub output_dir: String,
}

fn default_canvas_width() -> f32 {
    800.0
}
fn default_canvas_height() -> f32 {
    600.0
}
fn default_base_iterations() -> u32 {
    IterationPolicy::default().base
}
fn default_iterations_per_doubling() -> u32 {
    IterationPolicy::default().per_doubling
}
fn default_max_iterations() -> u32 {
    IterationPolicy::default().cap
}
fn default_undo_capacity() -> usize {
    fractour_core::history::DEFAULT_CAPACITY
}
fn default_seconds_per_segment() -> f64 {
    2.0
}
fn default_playback_delay_ms() -> u64 {
    60
}
fn default_julia_c_re() -> f64 {
    Julia::default_c().re
}
fn default_julia_c_im() -> f64 {
    Julia::default_c().im
}

impl Default for AppPreferences {
    fn default() -> Self {
        Self {
            canvas_width: default_canvas_width(),
            canvas_height: default_canvas_height(),
            base_iterations: default_base_iterations(),
            iterations_per_doubling: default_iterations_per_doubling(),
            max_iterations: default_max_iterations(),
            undo_capacity: default_undo_capacity(),
            seconds_per_segment: default_seconds_per_segment(),
            playback_delay_ms: default_playback_delay_ms(),
            fractal: FractalKind::default(),
            palette: Palette::default(),
            julia_c_re: default_julia_c_re(),
            julia_c_im: default_julia_c_im(),
            output_dir: String::new(),
        }
    }
}

impl AppPreferences {
    pub fn iteration_policy(&self) -> IterationPolicy {
        IterationPolicy {
            base: self.base_iterations,
            per_doubling: self.iterations_per_doubling,
            cap: self.max_iterations,
        }
    }

    pub fn julia_c(&self) -> Complex {
        Complex::new(self.julia_c_re, self.julia_c_im)
    }

    /// Painter for the configured fractal, palette and iteration policy.
    pub fn painter(&self) -> Painter {
        Painter::new(
            AnyFractal::from_kind(self.fractal, self.julia_c()),
            self.palette,
            self.iteration_policy(),
        )
    }

    pub fn output_directory(&self) -> PathBuf {
        if self.output_dir.trim().is_empty() {
            crate::app_dir::default_output_directory()
        } else {
            PathBuf::from(self.output_dir.trim())
        }
    }

    /// Load preferences from the OS config directory, falling back to defaults.
    pub fn load() -> Self {
        Self::load_from(&crate::app_dir::preferences_path())
    }

    /// Load from `path`; missing or unreadable files give the defaults.
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            debug!("No preferences file at {}", path.display());
            return Self::default();
        }
        match fs::read_to_string(path) {
            Ok(json) => match serde_json::from_str::<AppPreferences>(&json) {
                Ok(prefs) => {
                    info!("Loaded preferences from {}", path.display());
                    return prefs;
                }
                Err(e) => error!("Failed to parse preferences: {e}"),
            },
            Err(e) => error!("Failed to read preferences file: {e}"),
        }
        Self::default()
    }

    /// Persist preferences to the OS config directory.
    pub fn save(&self) {
        if let Err(e) = self.save_to(&crate::app_dir::preferences_path()) {
            error!("Failed to write preferences: {e}");
        }
    }

    pub fn save_to(&self, path: &Path) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        debug!("Saved preferences to {}", path.display());
        Ok(())
    }
}
