//! Landmark sources: from an external hand detector or from the mouse.
//!
//! The public interface is [`FrameEvent`] delivered over a `mpsc` channel, one
//! event per video frame.  Consumers don't need to know whether landmarks
//! came from a real camera + detector or from the pointer simulator.

use std::io::{self, BufRead, BufReader};
use std::process::{Child, ChildStdout, Command, Stdio};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use serde::Deserialize;
use thiserror::Error;

use pinch_ink::landmark::{LANDMARK_COUNT, THUMB_CMC, THUMB_IP, THUMB_MCP, THUMB_TIP};
use pinch_ink::{CanvasSize, Landmark};

// ════════════════════════════════════════════════════════════════════════════
// FrameEvent
// ════════════════════════════════════════════════════════════════════════════

/// One detected hand.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Hand {
    pub landmarks: Vec<Landmark>,
    /// Detection confidence, if the detector reports one.
    #[serde(default)]
    pub score:     Option<f32>,
}

/// What a source delivers, in frame order.
#[derive(Clone, Debug, PartialEq)]
pub enum FrameEvent {
    /// Landmarks for one video frame of native resolution `size`.
    /// An empty `hands` list is a frame with no hand in view.
    Frame { size: CanvasSize, hands: Vec<Hand> },

    /// The camera/detector went away.  No more frames will follow.
    Stopped,

    /// The user asked to quit.
    Quit,
}

/// The hand to classify: the first one at or above `min_confidence`.
/// Hands without a score count as fully confident.
pub fn best_hand(hands: &[Hand], min_confidence: f32) -> Option<&Hand> {
    hands.iter().find(|h| h.score.unwrap_or(1.0) >= min_confidence)
}

// ════════════════════════════════════════════════════════════════════════════
// LandmarkSource trait
// ════════════════════════════════════════════════════════════════════════════

/// Anything that can deliver [`FrameEvent`]s over a channel.
pub trait LandmarkSource: Send + 'static {
    fn run(self: Box<Self>, tx: Sender<FrameEvent>);
}

/// Spawn a landmark source on its own thread and return the receiving end.
pub fn spawn_landmark_source<S: LandmarkSource>(source: S) -> Receiver<FrameEvent> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || Box::new(source).run(tx));
    rx
}

// ════════════════════════════════════════════════════════════════════════════
// PipeLandmarkSource: external detector process
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to start detector `{command}`")]
    Spawn {
        command: String,
        #[source]
        source:  std::io::Error,
    },

    #[error("detector `{0}` has no stdout")]
    NoStdout(String),
}

/// One line of detector output.
#[derive(Debug, Deserialize)]
struct DetectorLine {
    #[serde(default)]
    width:  Option<u32>,
    #[serde(default)]
    height: Option<u32>,
    #[serde(default)]
    hands:  Vec<Hand>,
    #[serde(default)]
    error:  Option<String>,
}

/// Parse one JSON line into a frame.  Missing dimensions reuse `last_size`;
/// a detector-reported error becomes a frame with no hands.
pub fn parse_detector_line(line: &str, last_size: CanvasSize) -> Result<FrameEvent, serde_json::Error> {
    let parsed: DetectorLine = serde_json::from_str(line)?;

    let size = match (parsed.width, parsed.height) {
        (Some(w), Some(h)) if w > 0 && h > 0 => CanvasSize::new(w, h),
        _ => last_size,
    };

    if let Some(err) = parsed.error {
        log::warn!("detector error: {}", err);
        return Ok(FrameEvent::Frame { size, hands: Vec::new() });
    }

    Ok(FrameEvent::Frame { size, hands: parsed.hands })
}

/// Landmark source backed by an external camera + hand-landmark process.
///
/// The process writes one JSON object per frame to stdout:
///
/// ```text
/// {"width":1280,"height":720,"hands":[{"score":0.93,"landmarks":[{"x":0.51,"y":0.42,"z":-0.02}, …21…]}]}
/// ```
///
/// `width`/`height` are the native frame resolution and may change between
/// frames.  An `"error"` field marks a frame the detector could not process.
/// Lines that are not UTF-8 or not JSON are logged and skipped.
pub struct PipeLandmarkSource {
    command: String,
    stdout:  BufReader<ChildStdout>,
    size:    CanvasSize,
}

/// Handle on the detector process.  The reader thread only owns its stdout,
/// so whoever holds this decides when the process dies.
pub struct DetectorProcess {
    command: String,
    child:   Child,
}

impl DetectorProcess {
    pub fn id(&self) -> u32 { self.child.id() }

    pub fn is_running(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(None))
    }

    /// Kill and reap the process.  Its stdout closes, so the reader thread
    /// sees EOF and finishes with `Stopped`.  Safe to call more than once.
    pub fn stop(&mut self) {
        if self.is_running() {
            log::info!("stopping detector `{}`", self.command);
            let _ = self.child.kill();
        }
        let _ = self.child.wait();
    }
}

impl Drop for DetectorProcess {
    fn drop(&mut self) {
        self.stop();
    }
}

impl PipeLandmarkSource {
    /// Start `command args…`.  `size` is assumed until the first frame
    /// reports its own resolution.
    pub fn spawn(
        command: &str,
        args:    &[String],
        size:    CanvasSize,
    ) -> Result<(Self, DetectorProcess), SourceError> {
        log::info!("starting detector: {} {}", command, args.join(" "));

        let mut child = Command::new(command)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|source| SourceError::Spawn { command: command.to_string(), source })?;

        let stdout = match child.stdout.take() {
            Some(out) => out,
            None => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(SourceError::NoStdout(command.to_string()));
            }
        };

        let source = PipeLandmarkSource {
            command: command.to_string(),
            stdout:  BufReader::new(stdout),
            size,
        };
        Ok((source, DetectorProcess { command: command.to_string(), child }))
    }
}

impl LandmarkSource for PipeLandmarkSource {
    fn run(mut self: Box<Self>, tx: Sender<FrameEvent>) {
        let mut raw = Vec::new();
        loop {
            raw.clear();
            match self.stdout.read_until(b'\n', &mut raw) {
                Ok(0) => {
                    log::info!("detector `{}` closed its output", self.command);
                    break;
                }
                Ok(_) => {}
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    log::error!("reading detector output: {}", e);
                    break;
                }
            }

            let text = match std::str::from_utf8(&raw) {
                Ok(text) => text.trim(),
                Err(e) => {
                    log::warn!("skipping non-UTF-8 detector line: {}", e);
                    continue;
                }
            };
            if text.is_empty() { continue; }

            let event = match parse_detector_line(text, self.size) {
                Ok(ev) => ev,
                Err(e) => {
                    log::warn!("skipping unparsable detector line: {}", e);
                    continue;
                }
            };
            if let FrameEvent::Frame { size, .. } = &event {
                self.size = *size;
            }
            if tx.send(event).is_err() { break; }
        }

        let _ = tx.send(FrameEvent::Stopped);
    }
}

// ════════════════════════════════════════════════════════════════════════════
// SimLandmarkSource: pointer simulation (always available)
// ════════════════════════════════════════════════════════════════════════════

/// Raw input from the visualizer window.
#[derive(Clone, Debug, PartialEq)]
pub enum SimInput {
    /// Pointer over the canvas at `(x, y)` canvas pixels; `pinched` while the
    /// left button is held.
    Pointer { x: f32, y: f32, pinched: bool },
    /// Pointer outside the canvas: no hand in view.
    NoHand,
    /// Simulate the camera switching resolution.
    Resolution(CanvasSize),
    Quit,
}

/// Landmark source driven by [`SimInput`] events from the visualizer.
///
/// Each pointer event is turned into a synthetic 21-point hand whose index
/// fingertip sits under the pointer, so the frames go through exactly the
/// same classify → accumulate path as detector output.
pub struct SimLandmarkSource {
    pub rx:   Receiver<SimInput>,
    pub size: CanvasSize,
}

impl LandmarkSource for SimLandmarkSource {
    fn run(mut self: Box<Self>, tx: Sender<FrameEvent>) {
        for input in &self.rx {
            let hands = match input {
                SimInput::Pointer { x, y, pinched } => vec![Hand {
                    landmarks: sim_hand(x, y, self.size, pinched),
                    score:     None,
                }],
                SimInput::NoHand => Vec::new(),
                SimInput::Resolution(size) => {
                    log::info!("simulated camera now {}×{}", size.width, size.height);
                    self.size = size;
                    Vec::new()
                }
                SimInput::Quit => {
                    let _ = tx.send(FrameEvent::Quit);
                    return;
                }
            };
            if tx.send(FrameEvent::Frame { size: self.size, hands }).is_err() { return; }
        }
        let _ = tx.send(FrameEvent::Stopped);
    }
}

/// Landmark offsets from the index fingertip, in normalized frame units
/// (camera view, `y` down).  Index straight up, other fingers curled.
const SIM_HAND: [(f32, f32); LANDMARK_COUNT] = [
    ( 0.020, 0.300), // wrist
    ( 0.070, 0.260), // thumb cmc
    ( 0.000, 0.000), // thumb mcp  (interpolated)
    ( 0.000, 0.000), // thumb ip   (interpolated)
    ( 0.000, 0.000), // thumb tip  (pinch dependent)
    ( 0.000, 0.160), // index mcp
    ( 0.000, 0.105), // index pip
    ( 0.000, 0.050), // index dip
    ( 0.000, 0.000), // index tip
    (-0.030, 0.170), // middle
    (-0.035, 0.130),
    (-0.030, 0.160),
    (-0.025, 0.190),
    (-0.055, 0.180), // ring
    (-0.060, 0.145),
    (-0.055, 0.170),
    (-0.050, 0.200),
    (-0.075, 0.200), // pinky
    (-0.080, 0.170),
    (-0.075, 0.190),
    (-0.070, 0.210),
];

const SIM_THUMB_PINCHED: (f32, f32) = (0.010, 0.010);
const SIM_THUMB_OPEN:    (f32, f32) = (0.090, 0.080);

/// A synthetic hand whose index tip projects to canvas pixel `(x, y)`.
pub fn sim_hand(x: f32, y: f32, size: CanvasSize, pinched: bool) -> Vec<Landmark> {
    // Undo the mirrored projection.
    let tip_x = 1.0 - x / size.width.max(1) as f32;
    let tip_y = y / size.height.max(1) as f32;

    let mut offsets = SIM_HAND;
    let thumb = if pinched { SIM_THUMB_PINCHED } else { SIM_THUMB_OPEN };
    let cmc = offsets[THUMB_CMC];
    let lerp = |t: f32| (cmc.0 + (thumb.0 - cmc.0) * t, cmc.1 + (thumb.1 - cmc.1) * t);
    offsets[THUMB_MCP] = lerp(0.4);
    offsets[THUMB_IP]  = lerp(0.7);
    offsets[THUMB_TIP] = thumb;

    offsets.iter()
        .map(|&(dx, dy)| Landmark::new(tip_x + dx, tip_y + dy, 0.0))
        .collect()
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use pinch_ink::{classify, GestureState};

    const SIZE: CanvasSize = CanvasSize::new(1280, 720);

    #[test]
    fn sim_pinch_draws_under_pointer() {
        let hand = sim_hand(400.0, 300.0, SIZE, true);
        let s = classify(Some(&hand), SIZE);
        assert_eq!(s.state(), GestureState::Drawing);
        let p = s.position.unwrap();
        assert_relative_eq!(p.x, 400.0, epsilon = 1e-2);
        assert_relative_eq!(p.y, 300.0, epsilon = 1e-2);
    }

    #[test]
    fn sim_open_hand_tracks() {
        let hand = sim_hand(400.0, 300.0, SIZE, false);
        assert_eq!(classify(Some(&hand), SIZE).state(), GestureState::Tracking);
    }

    #[test]
    fn best_hand_skips_low_confidence() {
        let lm = vec![Landmark::default(); LANDMARK_COUNT];
        let hands = vec![
            Hand { landmarks: lm.clone(), score: Some(0.4) },
            Hand { landmarks: lm.clone(), score: Some(0.8) },
        ];
        assert_eq!(best_hand(&hands, 0.7).unwrap().score, Some(0.8));
        assert!(best_hand(&hands, 0.9).is_none());
        assert!(best_hand(&[Hand { landmarks: lm, score: None }], 0.99).is_some());
        assert!(best_hand(&[], 0.0).is_none());
    }

    #[test]
    fn detector_line_parses_frame() {
        let pts: Vec<String> = (0..LANDMARK_COUNT)
            .map(|i| format!(r#"{{"x":{},"y":0.5,"z":0.0}}"#, i as f32 / 100.0))
            .collect();
        let line = format!(r#"{{"width":640,"height":480,"hands":[{{"score":0.9,"landmarks":[{}]}}]}}"#, pts.join(","));
        match parse_detector_line(&line, SIZE).unwrap() {
            FrameEvent::Frame { size, hands } => {
                assert_eq!(size, CanvasSize::new(640, 480));
                assert_eq!(hands.len(), 1);
                assert_eq!(hands[0].landmarks.len(), LANDMARK_COUNT);
                assert_eq!(hands[0].score, Some(0.9));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn detector_line_without_size_keeps_last() {
        let ev = parse_detector_line(r#"{"hands":[]}"#, SIZE).unwrap();
        assert_eq!(ev, FrameEvent::Frame { size: SIZE, hands: vec![] });
    }

    #[test]
    fn detector_error_is_empty_frame() {
        let ev = parse_detector_line(r#"{"width":640,"height":480,"error":"camera busy"}"#, SIZE).unwrap();
        assert_eq!(ev, FrameEvent::Frame { size: CanvasSize::new(640, 480), hands: vec![] });
    }

    #[test]
    fn garbage_line_is_an_error() {
        assert!(parse_detector_line("READY", SIZE).is_err());
    }

    #[test]
    fn sim_source_forwards_frames_then_stops() {
        let (sim_tx, sim_rx) = mpsc::channel();
        let rx = spawn_landmark_source(SimLandmarkSource { rx: sim_rx, size: SIZE });

        sim_tx.send(SimInput::Pointer { x: 10.0, y: 20.0, pinched: true }).unwrap();
        sim_tx.send(SimInput::NoHand).unwrap();
        sim_tx.send(SimInput::Resolution(CanvasSize::new(640, 480))).unwrap();
        drop(sim_tx);

        let events: Vec<FrameEvent> = rx.iter().collect();
        assert_eq!(events.len(), 4);
        assert!(matches!(&events[0], FrameEvent::Frame { hands, .. } if hands.len() == 1));
        assert!(matches!(&events[1], FrameEvent::Frame { hands, .. } if hands.is_empty()));
        assert!(matches!(&events[2], FrameEvent::Frame { size, .. } if *size == CanvasSize::new(640, 480)));
        assert_eq!(events[3], FrameEvent::Stopped);
    }

    #[test]
    fn sim_quit_ends_stream() {
        let (sim_tx, sim_rx) = mpsc::channel();
        let rx = spawn_landmark_source(SimLandmarkSource { rx: sim_rx, size: SIZE });
        sim_tx.send(SimInput::Quit).unwrap();
        let events: Vec<FrameEvent> = rx.iter().collect();
        assert_eq!(events, [FrameEvent::Quit]);
    }

    // ── detector pipe ─────────────────────────────────────────────────────

    /// Run `script` under `sh` as the detector and collect everything it yields.
    #[cfg(unix)]
    fn detector_events(script: &str) -> Vec<FrameEvent> {
        let args = vec!["-c".to_string(), script.to_string()];
        let (pipe, _process) = PipeLandmarkSource::spawn("sh", &args, SIZE).unwrap();
        spawn_landmark_source(pipe).iter().collect()
    }

    #[cfg(unix)]
    #[test]
    fn pipe_skips_bad_lines_and_carries_resolution() {
        let script = concat!(
            r#"printf '%s\n' '{"width":64,"height":48,"hands":[]}';"#,
            r#"printf 'READY\n';"#,
            r#"printf '\377\376\n';"#,
            r#"printf '\n';"#,
            r#"printf '%s\n' '{"hands":[]}';"#,
            r#"printf '%s\n' '{"width":32,"height":24,"error":"camera busy"}'"#,
        );
        let small = CanvasSize::new(64, 48);
        assert_eq!(detector_events(script), [
            FrameEvent::Frame { size: small, hands: vec![] },
            FrameEvent::Frame { size: small, hands: vec![] },
            FrameEvent::Frame { size: CanvasSize::new(32, 24), hands: vec![] },
            FrameEvent::Stopped,
        ]);
    }

    #[cfg(unix)]
    #[test]
    fn pipe_invalid_utf8_does_not_end_session() {
        let script = r#"printf '\377\376\n{"width":64,"height":48,"hands":[]}\n'"#;
        assert_eq!(detector_events(script), [
            FrameEvent::Frame { size: CanvasSize::new(64, 48), hands: vec![] },
            FrameEvent::Stopped,
        ]);
    }

    #[cfg(unix)]
    #[test]
    fn pipe_delivers_hands_in_order() {
        let hand = |x: f32| {
            let pts: Vec<String> = (0..LANDMARK_COUNT)
                .map(|_| format!(r#"{{"x":{},"y":0.5}}"#, x))
                .collect();
            format!(r#"{{"width":640,"height":480,"hands":[{{"landmarks":[{}]}}]}}"#, pts.join(","))
        };
        let script = format!("printf '%s\\n' '{}' '{}'", hand(0.25), hand(0.75));
        let events = detector_events(&script);
        assert_eq!(events.len(), 3);
        let first_x = |ev: &FrameEvent| match ev {
            FrameEvent::Frame { hands, .. } => hands[0].landmarks[0].x,
            other => panic!("unexpected {:?}", other),
        };
        assert_relative_eq!(first_x(&events[0]), 0.25);
        assert_relative_eq!(first_x(&events[1]), 0.75);
        assert_eq!(events[2], FrameEvent::Stopped);
    }

    #[cfg(unix)]
    #[test]
    fn stopping_detector_kills_child_and_ends_stream() {
        let args = vec!["30".to_string()];
        let (pipe, mut process) = PipeLandmarkSource::spawn("sleep", &args, SIZE).unwrap();
        let rx = spawn_landmark_source(pipe);
        assert!(process.is_running());

        process.stop();
        assert!(!process.is_running());
        assert_eq!(
            rx.recv_timeout(std::time::Duration::from_secs(5)),
            Ok(FrameEvent::Stopped),
        );
        process.stop();
    }

    #[test]
    fn missing_detector_is_spawn_error() {
        let res = PipeLandmarkSource::spawn("pinch-canvas-no-such-detector", &[], SIZE);
        assert!(matches!(res, Err(SourceError::Spawn { .. })));
    }
}
