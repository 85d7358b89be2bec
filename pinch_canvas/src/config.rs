//! Settings file: `~/.config/pinch-canvas/config.json`.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use pinch_ink::{DEFAULT_WIDTH, PALETTE, PINCH_THRESHOLD};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config I/O on {path}")]
    Io {
        path:   PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config {path} is not valid JSON")]
    Json {
        path:   PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Persisted settings.  Every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Initial brush color, `#rrggbb`.
    pub brush_color: String,
    pub brush_width: f32,
    /// Swatches bound to keys 1–0.
    pub palette: Vec<String>,
    /// Thumb-to-index distance (normalized) that counts as a pinch.
    pub pinch_threshold: f32,
    /// Hands reported below this score are ignored.
    pub min_detection_confidence: f32,
    /// Assumed frame resolution until the detector reports one.
    pub frame_width:  u32,
    pub frame_height: u32,
    /// Where exported PNGs go; the current directory if unset.
    pub export_dir: Option<PathBuf>,
    pub show_hand_overlay: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            brush_color: PALETTE[0].into(),
            brush_width: DEFAULT_WIDTH,
            palette: PALETTE.iter().map(|s| s.to_string()).collect(),
            pinch_threshold: PINCH_THRESHOLD,
            min_detection_confidence: 0.7,
            frame_width: 1280,
            frame_height: 720,
            export_dir: None,
            show_hand_overlay: true,
        }
    }
}

impl Config {
    /// Directory: ~/.config/pinch-canvas/
    fn dir() -> PathBuf {
        let mut p = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        p.push("pinch-canvas");
        p
    }

    pub fn path() -> PathBuf {
        Self::dir().join("config.json")
    }

    /// Load from the default location, returning defaults if the file is
    /// missing or invalid.
    pub fn load() -> Self {
        let path = Self::path();
        if !path.exists() {
            return Self::default();
        }
        match Self::load_from(&path) {
            Ok(cfg) => {
                log::info!("loaded settings from {}", path.display());
                cfg
            }
            Err(e) => {
                log::warn!("{}; using defaults", e);
                Self::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let data = fs::read_to_string(path)
            .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        serde_json::from_str(&data)
            .map_err(|source| ConfigError::Json { path: path.to_path_buf(), source })
    }

    /// Persist to the default location.
    pub fn save(&self) -> Result<PathBuf, ConfigError> {
        let path = Self::path();
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let io_err = |source| ConfigError::Io { path: path.to_path_buf(), source };
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(io_err)?;
        }
        let data = serde_json::to_string_pretty(self)
            .map_err(|source| ConfigError::Json { path: path.to_path_buf(), source })?;
        fs::write(path, data).map_err(io_err)
    }
}
