//! Where preferences live and where generated images go by default.

use std::path::PathBuf;

/// Platform config directory for Fractour. Falls back to the current directory.
pub fn config_dir() -> PathBuf {
    directories::ProjectDirs::from("", "", "Fractour")
        .map(|d| d.config_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

pub fn preferences_path() -> PathBuf {
    config_dir().join("preferences.json")
}

/// `fractour-output/` under the working directory.
pub fn default_output_directory() -> PathBuf {
    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join("fractour-output")
}
