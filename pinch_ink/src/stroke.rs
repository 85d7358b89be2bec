//! Stroke accumulation: turns the per-frame sample stream into ink.
//!
//! A drawing session is a two-state machine:
//!
//! ```text
//!            drawing sample                  drawing sample
//!   Idle ───────────────────▶ Active ◀──────────────────────┐
//!    ▲                          │  └────── append point ─────┘
//!    │   idle / no-hand sample  │
//!    └──────────────────────────┘  commit if ≥ 2 points, else discard
//! ```
//!
//! The brush is snapshotted when a stroke begins, so later color or width
//! changes never reach an active or committed stroke.  Samples must arrive
//! in frame order; the accumulator makes no assumption about the time
//! between them, so dropped frames only make polylines coarser.

use serde::Serialize;

use crate::brush::{Brush, Color};
use crate::classifier::GestureSample;
use crate::error::InkError;
use crate::landmark::Point2D;

/// Fewest points a stroke needs to be kept.
pub const MIN_COMMIT_POINTS: usize = 2;

// ════════════════════════════════════════════════════════════════════════════
// Stroke
// ════════════════════════════════════════════════════════════════════════════

/// One continuous polyline.  Points are in temporal order.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Stroke {
    pub points: Vec<Point2D>,
    pub color:  Color,
    pub width:  f32,
}

impl Stroke {
    fn begin(brush: &Brush) -> Self {
        Stroke { points: Vec::new(), color: brush.color, width: brush.width() }
    }

    pub fn len(&self) -> usize { self.points.len() }

    pub fn is_empty(&self) -> bool { self.points.is_empty() }

    /// Whether the stroke is long enough to commit.
    pub fn is_visible(&self) -> bool { self.points.len() >= MIN_COMMIT_POINTS }
}

// ════════════════════════════════════════════════════════════════════════════
// Session / Observation
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug, PartialEq)]
pub enum Session {
    Idle,
    Active(Stroke),
}

/// What a single [`StrokeAccumulator::observe`] call did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Observation {
    /// Not drawing and nothing was active.
    Idle,
    /// A new stroke started with its first point.
    Began,
    /// A point was appended to the active stroke.
    Extended,
    /// The active stroke was moved into the committed list.
    Committed,
    /// The active stroke was too short and was dropped.
    Discarded,
}

// ════════════════════════════════════════════════════════════════════════════
// StrokeAccumulator
// ════════════════════════════════════════════════════════════════════════════

/// Owns the committed strokes, the active session and the brush.
#[derive(Debug, Default)]
pub struct StrokeAccumulator {
    committed: Vec<Stroke>,
    session:   Session,
    brush:     Brush,
}

impl Default for Session {
    fn default() -> Self { Session::Idle }
}

impl StrokeAccumulator {
    pub fn new(brush: Brush) -> Self {
        StrokeAccumulator { committed: Vec::new(), session: Session::Idle, brush }
    }

    /// Feed one frame's sample.  Must not be called reentrantly.
    pub fn observe(&mut self, sample: &GestureSample) -> Observation {
        let point = match (sample.is_drawing, sample.position) {
            (true, Some(point)) => point,
            _ => return self.end(),
        };
        if let Session::Active(stroke) = &mut self.session {
            stroke.points.push(point);
            return Observation::Extended;
        }
        self.begin(point);
        Observation::Began
    }

    /// Close any active stroke as if the hand had left the frame.
    /// Call this when the detector stops so the stroke is not lost.
    pub fn finish(&mut self) -> Observation {
        self.observe(&GestureSample::EMPTY)
    }

    /// Drop every committed stroke and any active one.
    /// The caller is responsible for wiping whatever surface it rendered to.
    pub fn clear(&mut self) {
        self.committed.clear();
        self.session = Session::Idle;
    }

    // ── brush ─────────────────────────────────────────────────────────────

    /// Color for the next stroke.
    pub fn set_color(&mut self, color: Color) {
        self.brush.color = color;
    }

    /// Width for the next stroke.  Out-of-range widths leave the brush as-is.
    pub fn set_width(&mut self, width: f32) -> Result<(), InkError> {
        self.brush.set_width(width)
    }

    pub fn brush(&self) -> &Brush { &self.brush }

    // ── views ─────────────────────────────────────────────────────────────

    /// Committed strokes followed by the active one, in paint order.
    pub fn render_model(&self) -> Vec<&Stroke> {
        self.committed.iter().chain(self.active()).collect()
    }

    pub fn committed(&self) -> &[Stroke] { &self.committed }

    pub fn active(&self) -> Option<&Stroke> {
        match &self.session {
            Session::Active(stroke) => Some(stroke),
            Session::Idle           => None,
        }
    }

    pub fn session(&self) -> &Session { &self.session }

    pub fn is_active(&self) -> bool { matches!(self.session, Session::Active(_)) }

    // ── transitions ───────────────────────────────────────────────────────

    fn begin(&mut self, first: Point2D) {
        debug_assert!(!self.is_active(), "stroke begun while another is active");
        let mut stroke = Stroke::begin(&self.brush);
        stroke.points.push(first);
        self.session = Session::Active(stroke);
    }

    fn end(&mut self) -> Observation {
        match std::mem::replace(&mut self.session, Session::Idle) {
            Session::Idle => Observation::Idle,
            Session::Active(stroke) if stroke.is_visible() => {
                log::debug!(
                    "stroke committed: {} points, {} @ {}px",
                    stroke.len(), stroke.color, stroke.width
                );
                self.committed.push(stroke);
                Observation::Committed
            }
            Session::Active(stroke) => {
                log::debug!("stroke discarded: {} point(s)", stroke.len());
                Observation::Discarded
            }
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    fn draw(x: f32, y: f32) -> GestureSample { GestureSample::at(x, y, true) }
    fn point(x: f32, y: f32) -> GestureSample { GestureSample::at(x, y, false) }
    const IDLE: GestureSample = GestureSample::EMPTY;

    fn red5() -> StrokeAccumulator {
        let brush = Brush::new(Color::from_hex("#ff0000").unwrap(), 5.0).unwrap();
        StrokeAccumulator::new(brush)
    }

    fn feed(acc: &mut StrokeAccumulator, samples: &[GestureSample]) -> Vec<Observation> {
        samples.iter().map(|s| acc.observe(s)).collect()
    }

    #[test]
    fn three_point_stroke_commits() {
        let mut acc = red5();
        let obs = feed(&mut acc, &[draw(10.0, 10.0), draw(20.0, 20.0), draw(30.0, 30.0), IDLE]);
        assert_eq!(obs, [Observation::Began, Observation::Extended, Observation::Extended, Observation::Committed]);

        assert_eq!(acc.committed().len(), 1);
        let s = &acc.committed()[0];
        assert_eq!(s.points, [Point2D::new(10.0, 10.0), Point2D::new(20.0, 20.0), Point2D::new(30.0, 30.0)]);
        assert_eq!(s.color.to_hex(), "#ff0000");
        assert_eq!(s.width, 5.0);
        assert!(!acc.is_active());
    }

    #[test]
    fn single_point_burst_is_discarded() {
        let mut acc = red5();
        let obs = feed(&mut acc, &[draw(5.0, 5.0), IDLE, draw(6.0, 6.0), draw(7.0, 7.0), IDLE]);
        assert_eq!(obs[1], Observation::Discarded);
        assert_eq!(acc.committed().len(), 1);
        assert_eq!(acc.committed()[0].points, [Point2D::new(6.0, 6.0), Point2D::new(7.0, 7.0)]);
    }

    #[test]
    fn one_point_then_idle_leaves_nothing() {
        let mut acc = red5();
        feed(&mut acc, &[draw(1.0, 1.0), IDLE]);
        assert!(acc.committed().is_empty());
        assert!(acc.active().is_none());
        assert!(acc.render_model().is_empty());
    }

    #[test]
    fn n_points_in_order() {
        let mut acc = red5();
        let n = 50;
        for i in 0..n {
            acc.observe(&draw(i as f32, (i * 2) as f32));
        }
        acc.observe(&IDLE);
        assert_eq!(acc.committed().len(), 1);
        let pts = &acc.committed()[0].points;
        assert_eq!(pts.len(), n);
        for (i, p) in pts.iter().enumerate() {
            assert_eq!(*p, Point2D::new(i as f32, (i * 2) as f32));
        }
    }

    #[test]
    fn pointing_never_creates_strokes() {
        let mut acc = red5();
        for i in 0..20 {
            let s = if i % 3 == 0 { IDLE } else { point(i as f32, 0.0) };
            assert_eq!(acc.observe(&s), Observation::Idle);
        }
        assert!(acc.render_model().is_empty());
    }

    #[test]
    fn drawing_flag_without_position_ends_stroke() {
        let mut acc = red5();
        feed(&mut acc, &[draw(1.0, 1.0), draw(2.0, 2.0)]);
        let odd = GestureSample { position: None, is_drawing: true };
        assert_eq!(acc.observe(&odd), Observation::Committed);
    }

    #[test]
    fn pointing_sample_ends_stroke() {
        let mut acc = red5();
        feed(&mut acc, &[draw(1.0, 1.0), draw(2.0, 2.0)]);
        assert_eq!(acc.observe(&point(3.0, 3.0)), Observation::Committed);
        assert_eq!(acc.committed()[0].len(), 2);
    }

    #[test]
    fn consecutive_idles_do_not_double_commit() {
        let mut acc = red5();
        feed(&mut acc, &[draw(1.0, 1.0), draw(2.0, 2.0), IDLE, IDLE, IDLE]);
        assert_eq!(acc.committed().len(), 1);
    }

    #[test]
    fn clear_resets_everything() {
        let mut acc = red5();
        feed(&mut acc, &[draw(1.0, 1.0), draw(2.0, 2.0), IDLE, draw(3.0, 3.0), draw(4.0, 4.0)]);
        assert!(acc.is_active());
        acc.clear();
        assert!(acc.committed().is_empty());
        assert!(acc.active().is_none());
        assert_eq!(acc.observe(&IDLE), Observation::Idle);
    }

    #[test]
    fn brush_change_applies_to_next_stroke_only() {
        let mut acc = red5();
        feed(&mut acc, &[draw(1.0, 1.0), draw(2.0, 2.0)]);
        // Mid-stroke change must not touch the active stroke.
        acc.set_color(Color::from_hex("#00ff00").unwrap());
        acc.set_width(12.0).unwrap();
        feed(&mut acc, &[draw(3.0, 3.0), IDLE, draw(4.0, 4.0), draw(5.0, 5.0), IDLE]);

        let strokes = acc.committed();
        assert_eq!(strokes.len(), 2);
        assert_eq!(strokes[0].color.to_hex(), "#ff0000");
        assert_eq!(strokes[0].width, 5.0);
        assert_eq!(strokes[1].color.to_hex(), "#00ff00");
        assert_eq!(strokes[1].width, 12.0);

        acc.set_color(Color::from_hex("#0000ff").unwrap());
        assert_eq!(acc.committed()[1].color.to_hex(), "#00ff00");
    }

    #[test]
    fn rejected_width_keeps_brush() {
        let mut acc = red5();
        assert!(acc.set_width(0.0).is_err());
        assert_eq!(acc.brush().width(), 5.0);
    }

    #[test]
    fn render_model_puts_active_last() {
        let mut acc = red5();
        feed(&mut acc, &[draw(1.0, 1.0), draw(2.0, 2.0), IDLE, draw(9.0, 9.0)]);
        let model = acc.render_model();
        assert_eq!(model.len(), 2);
        assert_eq!(model[0].points[0], Point2D::new(1.0, 1.0));
        assert_eq!(model[1].points, [Point2D::new(9.0, 9.0)]);
    }

    #[test]
    fn finish_commits_pending_stroke() {
        let mut acc = red5();
        feed(&mut acc, &[draw(1.0, 1.0), draw(2.0, 2.0)]);
        assert_eq!(acc.finish(), Observation::Committed);
        assert_eq!(acc.finish(), Observation::Idle);
        assert_eq!(acc.committed().len(), 1);
    }

    #[test]
    fn stroke_serializes_for_render_boundary() {
        let mut acc = red5();
        feed(&mut acc, &[draw(1.0, 2.0), draw(3.0, 4.0), IDLE]);
        let json = serde_json::to_value(&acc.committed()[0]).unwrap();
        assert_eq!(json["color"], "#ff0000");
        assert_eq!(json["width"], 5.0);
        assert_eq!(json["points"][1]["x"], 3.0);
    }
}
