//! Errors surfaced by the ink core.
//!
//! Malformed landmark frames are deliberately absent: a detection gap is
//! classified as "no hand", never reported.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum InkError {
    #[error("invalid brush color {0:?}")]
    InvalidColor(String),

    #[error("brush width {0} outside 1–20")]
    WidthOutOfRange(f32),

    #[error("canvas {width}×{height} has no pixels")]
    EmptyCanvas { width: u32, height: u32 },

    #[error("failed to export {path}")]
    Export {
        path:   PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
