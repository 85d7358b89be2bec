//! Top-level application state.
//!
//! `AppState` owns the classifier, the stroke accumulator and the brush
//! palette.  It classifies each `FrameEvent` into one sample, feeds that to
//! the accumulator, and hands the visualizer a [`Scene`] to draw each frame.

use std::path::PathBuf;
use std::sync::mpsc::{self, TryRecvError};

use thiserror::Error;

use pinch_ink::{
    Brush, CanvasSize, Classifier, Color, GestureSample, InkError, Landmark,
    Observation, StrokeAccumulator, MAX_WIDTH, MIN_WIDTH, PALETTE,
};

use crate::config::Config;
use crate::source::{
    best_hand, spawn_landmark_source, FrameEvent, Hand, PipeLandmarkSource,
    SimInput, SimLandmarkSource, SourceError,
};
use crate::visualizer::{Scene, Visualizer};

// ════════════════════════════════════════════════════════════════════════════
// AppConfig
// ════════════════════════════════════════════════════════════════════════════

/// Validated runtime configuration.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub brush:           Brush,
    pub palette:         Vec<Color>,
    pub pinch_threshold: f32,
    pub min_confidence:  f32,
    /// Canvas size until the first frame reports the real resolution.
    pub frame_size:      CanvasSize,
    pub export_dir:      PathBuf,
    pub show_overlay:    bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig::from(&Config::default())
    }
}

impl From<&Config> for AppConfig {
    /// Invalid entries fall back to defaults with a warning.
    fn from(cfg: &Config) -> Self {
        let mut palette: Vec<Color> = cfg.palette.iter()
            .filter_map(|hex| match Color::from_hex(hex) {
                Ok(c)  => Some(c),
                Err(e) => { log::warn!("palette: {}", e); None }
            })
            .take(PALETTE.len())
            .collect();
        if palette.is_empty() {
            palette = (0..PALETTE.len()).map(Color::palette).collect();
        }

        let color = Color::from_hex(&cfg.brush_color).unwrap_or_else(|e| {
            log::warn!("brush_color: {}", e);
            palette[0]
        });
        let brush = Brush::new(color, cfg.brush_width).unwrap_or_else(|e| {
            log::warn!("brush_width: {}", e);
            let mut b = Brush::default();
            b.color = color;
            b
        });

        let frame_size = if cfg.frame_width > 0 && cfg.frame_height > 0 {
            CanvasSize::new(cfg.frame_width, cfg.frame_height)
        } else {
            CanvasSize::default()
        };

        AppConfig {
            brush,
            palette,
            pinch_threshold: cfg.pinch_threshold,
            min_confidence:  cfg.min_detection_confidence.clamp(0.0, 1.0),
            frame_size,
            export_dir:      cfg.export_dir.clone().unwrap_or_else(|| PathBuf::from(".")),
            show_overlay:    cfg.show_hand_overlay,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Commands / source selection / errors
// ════════════════════════════════════════════════════════════════════════════

/// User commands from the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Palette slot 0–9.
    SelectColor(usize),
    WidenBrush,
    NarrowBrush,
    Clear,
    ToggleOverlay,
    ToggleControls,
    Export,
    Quit,
}

/// Where landmarks come from.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceKind {
    /// Mouse-driven simulated hand.
    Simulated,
    /// External camera + detector process writing JSON lines.
    Pipe { command: String, args: Vec<String> },
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("window: {0}")]
    Window(String),

    #[error(transparent)]
    Source(#[from] SourceError),
}

// ════════════════════════════════════════════════════════════════════════════
// AppState
// ════════════════════════════════════════════════════════════════════════════

pub struct AppState {
    // ── gesture → ink ─────────────────────────────────────────────────────
    classifier:     Classifier,
    strokes:        StrokeAccumulator,
    min_confidence: f32,

    // ── last frame ────────────────────────────────────────────────────────
    sample:  GestureSample,
    hand:    Option<Vec<Landmark>>,
    canvas:  CanvasSize,
    /// False once the source has stopped and the final sample was observed.
    live:    bool,

    // ── UI ────────────────────────────────────────────────────────────────
    palette:       Vec<Color>,
    show_overlay:  bool,
    show_controls: bool,
    export_dir:    PathBuf,

    pub status: String,
}

impl AppState {
    pub fn new(cfg: AppConfig) -> Self {
        AppState {
            classifier:     Classifier::with_threshold(cfg.pinch_threshold),
            strokes:        StrokeAccumulator::new(cfg.brush),
            min_confidence: cfg.min_confidence,
            sample:         GestureSample::EMPTY,
            hand:           None,
            canvas:         cfg.frame_size,
            live:           true,
            palette:        cfg.palette,
            show_overlay:   cfg.show_overlay,
            show_controls:  true,
            export_dir:     cfg.export_dir,
            status: format!(
                "Ready - brush {} {}px", cfg.brush.color, cfg.brush.width()
            ),
        }
    }

    // ── frames ────────────────────────────────────────────────────────────

    /// Process one video frame: one classification, one observation.
    pub fn handle_frame(&mut self, size: CanvasSize, hands: &[Hand]) -> Observation {
        if size != self.canvas && !size.is_empty() {
            // Stored strokes keep their coordinates; new points use the new space.
            log::info!(
                "frame resolution {}x{} -> {}x{}",
                self.canvas.width, self.canvas.height, size.width, size.height
            );
            self.canvas = size;
        }
        self.live = true;

        let hand = best_hand(hands, self.min_confidence);
        self.sample = self.classifier.classify(hand.map(|h| h.landmarks.as_slice()), self.canvas);
        self.hand = hand.map(|h| h.landmarks.clone());

        let obs = self.strokes.observe(&self.sample);
        match obs {
            Observation::Committed => {
                let n = self.strokes.committed().len();
                self.status = format!("Stroke {} committed", n);
            }
            Observation::Discarded => {
                self.status = "Pinch too short - nothing drawn".to_string();
            }
            _ => {}
        }
        obs
    }

    /// The source stopped: observe one empty sample so an active stroke is
    /// committed or discarded instead of lost.
    pub fn shutdown(&mut self) -> Observation {
        self.sample = GestureSample::EMPTY;
        self.hand = None;
        if !self.live {
            return Observation::Idle;
        }
        self.live = false;
        let obs = self.strokes.finish();
        log::info!("landmark source stopped ({:?})", obs);
        obs
    }

    // ── commands ──────────────────────────────────────────────────────────

    pub fn handle_command(&mut self, cmd: Command) {
        match cmd {
            Command::SelectColor(i) => {
                if let Some(&color) = self.palette.get(i) {
                    self.strokes.set_color(color);
                    self.status = format!("Color {}", color);
                }
            }

            Command::WidenBrush | Command::NarrowBrush => {
                let step = if cmd == Command::WidenBrush { 1.0 } else { -1.0 };
                let width = (self.strokes.brush().width() + step).clamp(MIN_WIDTH, MAX_WIDTH);
                if self.strokes.set_width(width).is_ok() {
                    self.status = format!("Brush size {}px", width);
                }
            }

            Command::Clear => {
                self.strokes.clear();
                log::info!("canvas cleared");
                self.status = "Cleared".to_string();
            }

            Command::ToggleOverlay => {
                self.show_overlay = !self.show_overlay;
                self.status = format!("Hand overlay {}", if self.show_overlay { "on" } else { "off" });
            }

            Command::ToggleControls => {
                self.show_controls = !self.show_controls;
            }

            Command::Export => {
                self.status = match self.export() {
                    Ok(path) => format!("Saved {}", path.display()),
                    Err(e) => {
                        log::error!("export failed: {}", e);
                        format!("Save failed: {}", e)
                    }
                };
            }

            Command::Quit => {
                self.shutdown();
            }
        }
    }

    /// Rasterize the current render model to `gesture-drawing-<millis>.png`.
    pub fn export(&self) -> Result<PathBuf, InkError> {
        std::fs::create_dir_all(&self.export_dir)?;
        let name = format!("gesture-drawing-{}.png", chrono::Utc::now().timestamp_millis());
        let path = self.export_dir.join(name);
        pinch_ink::export_png(&self.strokes.render_model(), self.canvas, &path)?;
        Ok(path)
    }

    // ── accessors for the render loop ─────────────────────────────────────

    pub fn scene(&self) -> Scene<'_> {
        Scene {
            canvas:        self.canvas,
            strokes:       self.strokes.render_model(),
            sample:        self.sample,
            hand:          if self.show_overlay { self.hand.as_deref() } else { None },
            brush:         *self.strokes.brush(),
            palette:       &self.palette,
            show_controls: self.show_controls,
            status:        &self.status,
        }
    }

    pub fn strokes(&self) -> &StrokeAccumulator { &self.strokes }
    pub fn sample(&self) -> GestureSample        { self.sample }
    pub fn canvas(&self) -> CanvasSize           { self.canvas }
    pub fn show_overlay(&self) -> bool           { self.show_overlay }
}

// ════════════════════════════════════════════════════════════════════════════
// run(): the main application loop
// ════════════════════════════════════════════════════════════════════════════

/// Run the full application.
///
/// Creates the landmark source (pointer simulation or external detector),
/// the visualizer window, and drives the frame/render loop at ~60 fps.
pub fn run(cfg: AppConfig, source: SourceKind) -> Result<(), AppError> {
    // ── Landmark source ───────────────────────────────────────────────────
    let (sim_tx, sim_rx) = mpsc::channel::<SimInput>();
    let simulated = source == SourceKind::Simulated;
    let (frame_rx, mut detector) = match source {
        SourceKind::Simulated => {
            let sim = SimLandmarkSource { rx: sim_rx, size: cfg.frame_size };
            (spawn_landmark_source(sim), None)
        }
        SourceKind::Pipe { command, args } => {
            let (pipe, process) = PipeLandmarkSource::spawn(&command, &args, cfg.frame_size)?;
            (spawn_landmark_source(pipe), Some(process))
        }
    };

    // ── Visualizer (owns the window and the sim input sender) ────────────
    let mut vis = Visualizer::new(cfg.frame_size, simulated.then_some(sim_tx))
        .map_err(AppError::Window)?;

    // ── App state ─────────────────────────────────────────────────────────
    let mut app = AppState::new(cfg);
    log::info!("window open, {} source", if simulated { "simulated" } else { "detector" });

    // ── Main loop ─────────────────────────────────────────────────────────
    'frames: while vis.is_open() {
        // 1. Window input → commands (and SimInput in simulation mode)
        for cmd in vis.poll_input(app.canvas()) {
            if cmd == Command::Quit { break 'frames; }
            app.handle_command(cmd);
        }

        // 2. Drain landmark frames in arrival order
        loop {
            match frame_rx.try_recv() {
                Ok(FrameEvent::Frame { size, hands }) => { app.handle_frame(size, &hands); }
                Ok(FrameEvent::Quit) => break 'frames,
                Ok(FrameEvent::Stopped) => {
                    app.shutdown();
                    app.status = "Detector stopped - S to save, Q to quit".to_string();
                }
                Err(TryRecvError::Empty)        => break,
                Err(TryRecvError::Disconnected) => { app.shutdown(); break; }
            }
        }

        // 3. Render
        vis.render(&app.scene());
    }

    app.shutdown();
    // The reader thread may be blocked on the detector; killing it unblocks it.
    if let Some(process) = detector.as_mut() {
        process.stop();
    }
    Ok(())
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
