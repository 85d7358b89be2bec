//! Gesture classification: one frame of landmarks in, one [`GestureSample`] out.
//!
//! The classifier keeps no memory between frames: identical input always
//! yields identical output.
//!
//! # Heuristics
//!
//! * **Cursor**: index fingertip (landmark 8), mirrored into canvas pixels.
//! * **Index extended**: `index_tip.y < index_mcp.y`.  Smaller `y` is higher
//!   in the frame.  This is a coordinate-space test, not an anatomical one:
//!   it fails for a rotated hand or an unusually mounted camera.  It is kept
//!   as-is for behavioral parity.
//! * **Pinch**: planar distance between index tip and thumb tip (landmark 4)
//!   below [`PINCH_THRESHOLD`].  `z` is ignored.
//!
//! Drawing requires both.

use crate::landmark::{CanvasSize, Landmark, Point2D, INDEX_MCP, INDEX_TIP, LANDMARK_COUNT, THUMB_TIP};

/// Calibrated pinch distance in normalized frame units.
pub const PINCH_THRESHOLD: f32 = 0.05;

// ════════════════════════════════════════════════════════════════════════════
// GestureSample
// ════════════════════════════════════════════════════════════════════════════

/// The per-frame result of classification.  Transient; never stored.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GestureSample {
    /// Fingertip in canvas pixels, or `None` when no hand was seen.
    pub position:   Option<Point2D>,
    pub is_drawing: bool,
}

impl GestureSample {
    /// No hand this frame.
    pub const EMPTY: GestureSample = GestureSample { position: None, is_drawing: false };

    /// Hand present, pointing or pinching at `(x, y)`.
    pub const fn at(x: f32, y: f32, is_drawing: bool) -> Self {
        GestureSample { position: Some(Point2D::new(x, y)), is_drawing }
    }

    pub fn state(&self) -> GestureState {
        match (self.position, self.is_drawing) {
            (None, _)        => GestureState::NoHand,
            (Some(_), false) => GestureState::Tracking,
            (Some(_), true)  => GestureState::Drawing,
        }
    }
}

impl Default for GestureSample {
    fn default() -> Self { GestureSample::EMPTY }
}

/// Coarse state shown to the user.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GestureState {
    NoHand,
    Tracking,
    Drawing,
}

impl GestureState {
    pub fn label(&self) -> &'static str {
        match self {
            GestureState::NoHand   => "No Hand",
            GestureState::Tracking => "Tracking",
            GestureState::Drawing  => "Drawing",
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Classifier
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Classifier {
    pinch_threshold: f32,
}

impl Default for Classifier {
    fn default() -> Self {
        Classifier { pinch_threshold: PINCH_THRESHOLD }
    }
}

impl Classifier {
    /// A classifier with a non-default pinch threshold.  Non-finite or
    /// non-positive values fall back to [`PINCH_THRESHOLD`].
    pub fn with_threshold(pinch_threshold: f32) -> Self {
        if pinch_threshold.is_finite() && pinch_threshold > 0.0 {
            Classifier { pinch_threshold }
        } else {
            log::warn!("pinch threshold {} rejected, using {}", pinch_threshold, PINCH_THRESHOLD);
            Classifier::default()
        }
    }

    pub fn pinch_threshold(&self) -> f32 { self.pinch_threshold }

    /// Classify the best-tracked hand of one frame.
    ///
    /// `None` and malformed landmark sets both yield [`GestureSample::EMPTY`];
    /// a detection gap is the normal case, not a failure.
    pub fn classify(&self, hand: Option<&[Landmark]>, canvas: CanvasSize) -> GestureSample {
        let Some(landmarks) = hand else { return GestureSample::EMPTY };

        if landmarks.len() != LANDMARK_COUNT {
            log::trace!("expected {} landmarks, got {}", LANDMARK_COUNT, landmarks.len());
            return GestureSample::EMPTY;
        }

        let index_tip = &landmarks[INDEX_TIP];
        let thumb_tip = &landmarks[THUMB_TIP];
        let index_mcp = &landmarks[INDEX_MCP];

        if !(index_tip.is_finite() && thumb_tip.is_finite() && index_mcp.is_finite()) {
            log::trace!("non-finite landmark coordinates");
            return GestureSample::EMPTY;
        }

        let index_extended = index_tip.y < index_mcp.y;
        let pinched = index_tip.planar_distance(thumb_tip) < self.pinch_threshold;

        GestureSample {
            position:   Some(canvas.project(index_tip)),
            is_drawing: index_extended && pinched,
        }
    }
}

/// Classify with the default threshold.
pub fn classify(hand: Option<&[Landmark]>, canvas: CanvasSize) -> GestureSample {
    Classifier::default().classify(hand, canvas)
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const CANVAS: CanvasSize = CanvasSize::new(1280, 720);

    /// A hand with every landmark at the wrist except the three we set.
    fn hand(index_tip: (f32, f32), thumb_tip: (f32, f32), index_mcp: (f32, f32)) -> Vec<Landmark> {
        let mut lms = vec![Landmark::new(0.5, 0.9, 0.0); LANDMARK_COUNT];
        lms[INDEX_TIP] = Landmark::new(index_tip.0, index_tip.1, -0.1);
        lms[THUMB_TIP] = Landmark::new(thumb_tip.0, thumb_tip.1, 0.3);
        lms[INDEX_MCP] = Landmark::new(index_mcp.0, index_mcp.1, 0.0);
        lms
    }

    #[test]
    fn no_hand_is_empty() {
        assert_eq!(classify(None, CANVAS), GestureSample::EMPTY);
        assert_eq!(GestureSample::EMPTY.state(), GestureState::NoHand);
    }

    #[test]
    fn pinch_with_raised_index_draws() {
        let h = hand((0.4, 0.3), (0.42, 0.32), (0.4, 0.5));
        let s = classify(Some(&h), CANVAS);
        assert!(s.is_drawing);
        assert_eq!(s.state(), GestureState::Drawing);
    }

    #[test]
    fn position_is_mirrored_fingertip() {
        let h = hand((0.25, 0.5), (0.9, 0.9), (0.25, 0.7));
        let p = classify(Some(&h), CANVAS).position.unwrap();
        assert_relative_eq!(p.x, 960.0);
        assert_relative_eq!(p.y, 360.0);
    }

    #[test]
    fn open_hand_only_tracks() {
        let h = hand((0.4, 0.3), (0.6, 0.4), (0.4, 0.5));
        let s = classify(Some(&h), CANVAS);
        assert!(!s.is_drawing);
        assert!(s.position.is_some());
        assert_eq!(s.state(), GestureState::Tracking);
    }

    #[test]
    fn lowered_index_never_draws() {
        // Pinched, but the tip sits below the MCP joint.
        let h = hand((0.4, 0.6), (0.41, 0.6), (0.4, 0.5));
        assert!(!classify(Some(&h), CANVAS).is_drawing);
        // Tip level with the joint is not "extended" either.
        let h = hand((0.4, 0.5), (0.41, 0.5), (0.4, 0.5));
        assert!(!classify(Some(&h), CANVAS).is_drawing);
    }

    #[test]
    fn threshold_is_strict() {
        // Distance of exactly 0.0625 sits above the threshold.
        let h = hand((0.5, 0.25), (0.5, 0.3125), (0.5, 0.5));
        assert!(!classify(Some(&h), CANVAS).is_drawing);
        let h = hand((0.5, 0.25), (0.5, 0.28125), (0.5, 0.5));
        assert!(classify(Some(&h), CANVAS).is_drawing);
    }

    #[test]
    fn depth_is_ignored() {
        let mut h = hand((0.4, 0.3), (0.41, 0.3), (0.4, 0.5));
        h[THUMB_TIP].z = 5.0;
        assert!(classify(Some(&h), CANVAS).is_drawing);
    }

    #[test]
    fn short_landmark_set_is_no_hand() {
        let h = hand((0.4, 0.3), (0.41, 0.3), (0.4, 0.5));
        assert_eq!(classify(Some(&h[..9]), CANVAS), GestureSample::EMPTY);
        assert_eq!(classify(Some(&[]), CANVAS), GestureSample::EMPTY);
    }

    #[test]
    fn nan_landmark_is_no_hand() {
        let mut h = hand((0.4, 0.3), (0.41, 0.3), (0.4, 0.5));
        h[INDEX_TIP].x = f32::NAN;
        assert_eq!(classify(Some(&h), CANVAS), GestureSample::EMPTY);
    }

    #[test]
    fn classification_is_pure() {
        let h = hand((0.4, 0.3), (0.41, 0.31), (0.4, 0.5));
        let c = Classifier::default();
        let first = c.classify(Some(&h), CANVAS);
        for _ in 0..10 {
            assert_eq!(c.classify(Some(&h), CANVAS), first);
        }
    }

    #[test]
    fn custom_threshold_widens_pinch() {
        let h = hand((0.4, 0.3), (0.4, 0.38), (0.4, 0.5));
        assert!(!Classifier::default().classify(Some(&h), CANVAS).is_drawing);
        assert!(Classifier::with_threshold(0.1).classify(Some(&h), CANVAS).is_drawing);
    }

    #[test]
    fn bad_threshold_falls_back() {
        assert_eq!(Classifier::with_threshold(-1.0).pinch_threshold(), PINCH_THRESHOLD);
        assert_eq!(Classifier::with_threshold(f32::NAN).pinch_threshold(), PINCH_THRESHOLD);
    }
}
