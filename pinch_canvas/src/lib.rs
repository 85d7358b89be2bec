//! # pinch_canvas
//!
//! Draw in the air with one hand.  A landmark source (an external camera +
//! hand-detector process, or a mouse-driven simulated hand) delivers 21
//! landmarks per frame; [`pinch_ink`] turns them into gestures and strokes;
//! a `minifb` window shows the ink over the feed with an optional skeleton
//! overlay.
//!
//! ## Gesture → Action mapping
//!
//! | Gesture | Cursor | Action |
//! |---|---|---|
//! | No hand | hidden | End the current stroke (if any) |
//! | Index finger up, thumb apart | blue ring | Move cursor, no ink |
//! | Thumb + index pinched | red disc | Lay ink along the fingertip path |
//! | Release the pinch | blue ring | Commit the stroke (2+ points) |
//!
//! ## Keyboard
//!
//! | Key | Action |
//! |---|---|
//! | `1`–`0` | Select palette color |
//! | `[` / `]` | Narrower / wider brush (1–20 px) |
//! | `C` | Clear canvas |
//! | `H` | Toggle hand overlay |
//! | `Tab` | Toggle controls panel |
//! | `S` | Save PNG (`gesture-drawing-<millis>.png`) |
//! | `Q` / `Esc` | Quit |
//!
//! ### Simulation mode
//!
//! Without `--pipe`, the mouse is the index fingertip and holding the left
//! button pinches.  `R` cycles the simulated camera resolution.

pub mod source;
pub mod config;
pub mod visualizer;
pub mod app;
