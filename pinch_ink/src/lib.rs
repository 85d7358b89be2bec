//! # pinch_ink
//!
//! The gesture-to-ink core of the pinch canvas: everything between "the
//! detector reported some landmarks" and "these pixels are ink".
//!
//! ## Pipeline (one call each per video frame)
//!
//! ```text
//!  21 landmarks ──▶ Classifier::classify ──▶ GestureSample ──▶ StrokeAccumulator::observe
//!                                                                     │
//!                                          Raster::render ◀── render_model()
//! ```
//!
//! | Hand pose | Sample | Effect |
//! |---|---|---|
//! | no hand / malformed frame | `position: None` | ends any active stroke |
//! | index raised, fingers apart | `Tracking` | moves the cursor, ends any active stroke |
//! | index raised, thumb touching index tip | `Drawing` | begins or extends the active stroke |
//!
//! A stroke is committed when drawing stops, but only if it has at least
//! two points; a one-frame pinch leaves no mark.
//!
//! Nothing here blocks, spawns threads or keeps time.  Frames must be fed
//! in order and never concurrently.

pub mod landmark;
pub mod classifier;
pub mod brush;
pub mod stroke;
pub mod raster;
pub mod error;

pub use landmark::{CanvasSize, Landmark, Point2D, HAND_CONNECTIONS, LANDMARK_COUNT};
pub use classifier::{classify, Classifier, GestureSample, GestureState, PINCH_THRESHOLD};
pub use brush::{Brush, Color, PALETTE, MIN_WIDTH, MAX_WIDTH, DEFAULT_WIDTH};
pub use stroke::{Observation, Session, Stroke, StrokeAccumulator, MIN_COMMIT_POINTS};
pub use raster::{export_png, Raster, TRANSPARENT};
pub use error::InkError;
