//! Software-rendered visualizer using `minifb`.
//!
//! The frame buffer has the canvas's native resolution and `minifb`
//! stretches it to the (resizable) window.  Layers, back to front:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┬─────────────┐
//! │ [status badge]                                       │ CONTROLS    │
//! │                                                      │ ● ● ● ● ●   │
//! │        backdrop (camera feed stand-in)               │ ● ● ● ● ●   │
//! │        ink layer (committed + active strokes)        │ size 5px    │
//! │        hand overlay (skeleton) + fingertip cursor    │ ▬▬▬         │
//! │                                                      └─────────────┤
//! │ key legend                                                         │
//! └────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Skeleton and cursor are mirrored exactly like the stroke points, so the
//! cursor always sits on the index fingertip of the drawn skeleton.

use std::sync::mpsc::Sender;
use std::time::Duration;

use minifb::{Key, KeyRepeat, MouseButton, MouseMode, ScaleMode, Window, WindowOptions};

use pinch_ink::{
    Brush, CanvasSize, Color, GestureSample, GestureState, Landmark, Raster, Stroke,
    HAND_CONNECTIONS,
};

use crate::app::Command;
use crate::source::SimInput;

// ════════════════════════════════════════════════════════════════════════════
// Colors
// ════════════════════════════════════════════════════════════════════════════

const BG_COLOR:       u32 = 0xFF111827;
const GRID_COLOR:     u32 = 0xFF1F2937;
const PANEL_BG:       u32 = 0xFF000000;
const TEXT_COLOR:     u32 = 0xFFEEEEEE;
const DIM_TEXT:       u32 = 0xFF888888;
const BONE_COLOR:     u32 = 0xFF00FF00;
const JOINT_COLOR:    u32 = 0xFFFF0000;
const TRACK_COLOR:    u32 = 0xFF60A5FA;  // blue ring
const DRAW_COLOR:     u32 = 0xFFF87171;  // red disc
const DRAW_CORE:      u32 = 0xFF944444;
const SELECTED_RING:  u32 = 0xFFFFFFFF;
const SWATCH_RING:    u32 = 0xFF4B5563;

/// Resolutions the simulator cycles through with `R`.
const SIM_RESOLUTIONS: [CanvasSize; 3] = [
    CanvasSize::new(1280, 720),
    CanvasSize::new(960, 540),
    CanvasSize::new(640, 480),
];

// ════════════════════════════════════════════════════════════════════════════
// Scene: what one frame shows
// ════════════════════════════════════════════════════════════════════════════

/// Snapshot of application state for one frame.
pub struct Scene<'a> {
    pub canvas:        CanvasSize,
    /// Paint order: committed strokes, then the active one.
    pub strokes:       Vec<&'a Stroke>,
    pub sample:        GestureSample,
    /// Landmarks of the tracked hand, when the overlay is on.
    pub hand:          Option<&'a [Landmark]>,
    pub brush:         Brush,
    pub palette:       &'a [Color],
    pub show_controls: bool,
    pub status:        &'a str,
}

// ════════════════════════════════════════════════════════════════════════════
// Painter: window-independent frame composition
// ════════════════════════════════════════════════════════════════════════════

const LEGEND:     &str = "1-0=color  [ ]=size  C=clear  H=hand  TAB=controls  S=save  Q=quit";
const LEGEND_SIM: &str = "1-0=color  [ ]=size  C=clear  H=hand  TAB=controls  S=save  R=res  Q=quit";

pub struct Painter {
    size:     CanvasSize,
    buf:      Vec<u32>,
    ink:      Raster,
    /// Hand skeleton.
    overlay:  Raster,
    /// Fingertip cursor, above the skeleton.
    cursor:   Raster,
    sim_keys: bool,
}

impl Painter {
    pub fn new(size: CanvasSize) -> Self {
        Painter {
            size,
            buf:     vec![BG_COLOR; size.pixel_count()],
            ink:      Raster::new(size),
            overlay:  Raster::new(size),
            cursor:   Raster::new(size),
            sim_keys: false,
        }
    }

    /// List the simulation-only keys in the legend.
    pub fn show_sim_keys(&mut self, on: bool) { self.sim_keys = on; }

    pub fn legend(&self) -> &'static str {
        if self.sim_keys { LEGEND_SIM } else { LEGEND }
    }

    pub fn size(&self) -> CanvasSize { self.size }
    pub fn buffer(&self) -> &[u32]   { &self.buf }

    pub fn pixel(&self, x: usize, y: usize) -> Option<u32> {
        let w = self.size.width as usize;
        if x < w && y < self.size.height as usize { Some(self.buf[y * w + x]) } else { None }
    }

    /// UI scale so labels stay legible at any resolution.
    fn ui(&self) -> usize {
        (self.size.height as usize / 240).max(1)
    }

    /// Compose one frame.
    pub fn paint(&mut self, scene: &Scene) {
        if scene.canvas != self.size && !scene.canvas.is_empty() {
            self.size = scene.canvas;
            self.buf = vec![BG_COLOR; self.size.pixel_count()];
            self.ink.resize(self.size);
            self.overlay.resize(self.size);
            self.cursor.resize(self.size);
        }

        // ── Backdrop ──────────────────────────────────────────────────────
        self.draw_backdrop();

        // ── Ink ───────────────────────────────────────────────────────────
        self.ink.render(&scene.strokes);
        self.ink.composite_onto(&mut self.buf);

        // ── Hand overlay + cursor ─────────────────────────────────────────
        self.overlay.clear();
        if let Some(hand) = scene.hand {
            self.draw_skeleton(hand);
        }
        self.overlay.composite_onto(&mut self.buf);

        self.cursor.clear();
        self.draw_cursor(&scene.sample);
        self.cursor.composite_onto(&mut self.buf);

        // ── Status badge ──────────────────────────────────────────────────
        let ui = self.ui();
        let state = scene.sample.state();
        let badge = match state {
            GestureState::NoHand   => DIM_TEXT,
            GestureState::Tracking => TRACK_COLOR,
            GestureState::Drawing  => DRAW_COLOR,
        };
        self.fill_rect(4 * ui, 4 * ui, 40 * ui, 11 * ui, PANEL_BG);
        self.fill_rect(7 * ui, 7 * ui, 5 * ui, 5 * ui, badge);
        self.draw_label(state.label(), 15 * ui, 7 * ui, ui, TEXT_COLOR);

        // ── Controls panel ────────────────────────────────────────────────
        if scene.show_controls {
            self.draw_controls(&scene.brush, scene.palette);
        }

        // ── Status line + key legend ──────────────────────────────────────
        let h = self.size.height as usize;
        self.draw_label(scene.status, 4 * ui, h.saturating_sub(20 * ui), ui, TEXT_COLOR);
        self.draw_label(self.legend(), 4 * ui, h.saturating_sub(10 * ui), ui, DIM_TEXT);
    }

    // ── Backdrop ──────────────────────────────────────────────────────────

    fn draw_backdrop(&mut self) {
        self.buf.fill(BG_COLOR);
        let w = self.size.width as usize;
        let h = self.size.height as usize;
        let step = 40 * self.ui();
        for x in (0..w).step_by(step) {
            for y in 0..h { self.buf[y * w + x] = GRID_COLOR; }
        }
        for y in (0..h).step_by(step) {
            self.buf[y * w..(y + 1) * w].fill(GRID_COLOR);
        }
    }

    // ── Hand skeleton ─────────────────────────────────────────────────────

    fn draw_skeleton(&mut self, hand: &[Landmark]) {
        let size = self.size;
        let pts: Vec<_> = hand.iter().map(|lm| size.project(lm)).collect();
        for &(a, b) in HAND_CONNECTIONS.iter() {
            if let (Some(&pa), Some(&pb)) = (pts.get(a), pts.get(b)) {
                self.overlay.draw_segment(pa, pb, 2.0, BONE_COLOR);
            }
        }
        for &p in &pts {
            self.overlay.fill_disc(p, 3.0, JOINT_COLOR);
        }
    }

    // ── Fingertip cursor ──────────────────────────────────────────────────

    fn draw_cursor(&mut self, sample: &GestureSample) {
        let Some(p) = sample.position else { return };
        let r = 4.0 * self.ui() as f32;
        if sample.is_drawing {
            self.cursor.fill_disc(p, r * 1.5, DRAW_COLOR);
            self.cursor.fill_disc(p, r * 0.5, DRAW_CORE);
        } else {
            self.cursor.fill_disc(p, r, TRACK_COLOR);
            // Hollow ring: the skeleton's fingertip joint shows through.
            self.cursor.fill_disc(p, r * 0.6, pinch_ink::TRANSPARENT);
        }
    }

    // ── Controls panel ────────────────────────────────────────────────────

    fn draw_controls(&mut self, brush: &Brush, palette: &[Color]) {
        let ui = self.ui();
        let w = self.size.width as usize;
        let swatch = 10 * ui;
        let gap = 3 * ui;
        let panel_w = 5 * (swatch + gap) + gap;
        let x0 = w.saturating_sub(panel_w + 4 * ui);
        let y0 = 4 * ui;

        self.fill_rect(x0, y0, panel_w, 62 * ui, PANEL_BG);
        self.draw_label("BRUSH COLOR", x0 + gap, y0 + gap, ui, TEXT_COLOR);

        for (i, color) in palette.iter().enumerate() {
            let sx = x0 + gap + (i % 5) * (swatch + gap);
            let sy = y0 + 10 * ui + (i / 5) * (swatch + gap);
            self.fill_rect(sx, sy, swatch, swatch, color.to_argb());
            let ring = if *color == brush.color { SELECTED_RING } else { SWATCH_RING };
            self.draw_border(sx, sy, swatch, swatch, ring);
        }

        let ly = y0 + 10 * ui + 2 * (swatch + gap) + gap;
        let label = format!("SIZE {}PX", brush.width());
        self.draw_label(&label, x0 + gap, ly, ui, TEXT_COLOR);

        // Width preview in the current color.
        let bar_h = (brush.width() as usize).max(1);
        self.fill_rect(x0 + gap, ly + 8 * ui, panel_w - 2 * gap, bar_h, brush.color.to_argb());
    }

    // ── Primitive drawing helpers ─────────────────────────────────────────

    fn fill_rect(&mut self, x: usize, y: usize, w: usize, h: usize, color: u32) {
        let (cw, ch) = (self.size.width as usize, self.size.height as usize);
        for row in y..(y + h).min(ch) {
            for col in x..(x + w).min(cw) {
                self.buf[row * cw + col] = color;
            }
        }
    }

    fn draw_border(&mut self, x: usize, y: usize, w: usize, h: usize, color: u32) {
        if w == 0 || h == 0 { return; }
        for col in x..x + w {
            self.set_pixel(col, y, color);
            self.set_pixel(col, y + h - 1, color);
        }
        for row in y..y + h {
            self.set_pixel(x, row, color);
            self.set_pixel(x + w - 1, row, color);
        }
    }

    fn set_pixel(&mut self, x: usize, y: usize, color: u32) {
        let w = self.size.width as usize;
        if x < w && y < self.size.height as usize {
            self.buf[y * w + x] = color;
        }
    }

    /// 3×5 bitmap font, each cell magnified `scale` times.
    fn draw_label(&mut self, text: &str, x: usize, y: usize, scale: usize, color: u32) {
        let w = self.size.width as usize;
        let mut cx = x;
        for ch in text.chars() {
            let glyph = char_glyph(ch);
            for (row, &bits) in glyph.iter().enumerate() {
                for col in 0..3usize {
                    if bits & (1 << (2 - col)) != 0 {
                        self.fill_rect(cx + col * scale, y + row * scale, scale, scale, color);
                    }
                }
            }
            cx += 4 * scale; // 3 wide + 1 gap
            if cx + 4 * scale > w { break; }
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Visualizer: the window
// ════════════════════════════════════════════════════════════════════════════

pub struct Visualizer {
    window:  Window,
    painter: Painter,
    /// Present only in simulation mode.
    sim_tx:  Option<Sender<SimInput>>,
    sim_res: usize,
}

impl Visualizer {
    pub fn new(size: CanvasSize, sim_tx: Option<Sender<SimInput>>) -> Result<Self, String> {
        let mut window = Window::new(
            "Pinch Canvas - draw with your hand",
            size.width as usize, size.height as usize,
            WindowOptions {
                resize: true,
                scale_mode: ScaleMode::Stretch,
                ..WindowOptions::default()
            },
        ).map_err(|e| e.to_string())?;

        window.limit_update_rate(Some(Duration::from_millis(16))); // ~60fps

        let mut painter = Painter::new(size);
        painter.show_sim_keys(sim_tx.is_some());

        Ok(Visualizer {
            window,
            painter,
            sim_tx,
            sim_res: 0,
        })
    }

    /// Returns false when the window should close.
    pub fn is_open(&self) -> bool { self.window.is_open() }

    /// Poll keyboard and mouse.  Keys become [`Command`]s; in simulation mode
    /// the pointer also becomes one [`SimInput`] per call, i.e. per frame.
    pub fn poll_input(&mut self, canvas: CanvasSize) -> Vec<Command> {
        let mut cmds = Vec::new();
        if !self.window.is_open() {
            cmds.push(Command::Quit);
            return cmds;
        }

        // Keys that trigger on first press only
        let one_shot = |k: Key| self.window.is_key_pressed(k, KeyRepeat::No);
        // Keys that repeat while held
        let held     = |k: Key| self.window.is_key_pressed(k, KeyRepeat::Yes);

        const DIGITS: [Key; 10] = [
            Key::Key1, Key::Key2, Key::Key3, Key::Key4, Key::Key5,
            Key::Key6, Key::Key7, Key::Key8, Key::Key9, Key::Key0,
        ];
        for (i, &k) in DIGITS.iter().enumerate() {
            if one_shot(k) { cmds.push(Command::SelectColor(i)); }
        }

        if held(Key::RightBracket) || held(Key::Equal) { cmds.push(Command::WidenBrush); }
        if held(Key::LeftBracket)  || held(Key::Minus) { cmds.push(Command::NarrowBrush); }
        if one_shot(Key::C)   { cmds.push(Command::Clear); }
        if one_shot(Key::H)   { cmds.push(Command::ToggleOverlay); }
        if one_shot(Key::Tab) { cmds.push(Command::ToggleControls); }
        if one_shot(Key::S)   { cmds.push(Command::Export); }
        let quit = one_shot(Key::Q) || one_shot(Key::Escape);
        let cycle_res = one_shot(Key::R);

        if let Some(tx) = &self.sim_tx {
            let input = if quit {
                SimInput::Quit
            } else if cycle_res {
                self.sim_res = (self.sim_res + 1) % SIM_RESOLUTIONS.len();
                SimInput::Resolution(SIM_RESOLUTIONS[self.sim_res])
            } else {
                self.pointer_input(canvas)
            };
            let _ = tx.send(input);
        }

        if quit { cmds.push(Command::Quit); }
        cmds
    }

    /// Map the mouse from window pixels into canvas pixels.
    fn pointer_input(&self, canvas: CanvasSize) -> SimInput {
        let (ww, wh) = self.window.get_size();
        match self.window.get_mouse_pos(MouseMode::Discard) {
            Some((mx, my)) if ww > 0 && wh > 0 => SimInput::Pointer {
                x: mx * canvas.width as f32 / ww as f32,
                y: my * canvas.height as f32 / wh as f32,
                pinched: self.window.get_mouse_down(MouseButton::Left),
            },
            _ => SimInput::NoHand,
        }
    }

    /// Render one frame.
    pub fn render(&mut self, scene: &Scene) {
        self.painter.paint(scene);
        let size = self.painter.size();
        self.window
            .update_with_buffer(self.painter.buffer(), size.width as usize, size.height as usize)
            .ok();
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Minimal 3×5 bitmap font
// ────────────────────────────────────────────────────────────────────────────

fn char_glyph(c: char) -> [u8; 5] {
    match c {
        '0' => [0b111, 0b101, 0b101, 0b101, 0b111],
        '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => [0b111, 0b001, 0b111, 0b100, 0b111],
        '3' => [0b111, 0b001, 0b111, 0b001, 0b111],
        '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
        '5' => [0b111, 0b100, 0b111, 0b001, 0b111],
        '6' => [0b111, 0b100, 0b111, 0b101, 0b111],
        '7' => [0b111, 0b001, 0b001, 0b001, 0b001],
        '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => [0b111, 0b101, 0b111, 0b001, 0b111],
        'a' | 'A' => [0b111, 0b101, 0b111, 0b101, 0b101],
        'b' | 'B' => [0b110, 0b101, 0b110, 0b101, 0b110],
        'c' | 'C' => [0b111, 0b100, 0b100, 0b100, 0b111],
        'd' | 'D' => [0b110, 0b101, 0b101, 0b101, 0b110],
        'e' | 'E' => [0b111, 0b100, 0b111, 0b100, 0b111],
        'f' | 'F' => [0b111, 0b100, 0b111, 0b100, 0b100],
        'g' | 'G' => [0b111, 0b100, 0b101, 0b101, 0b111],
        'h' | 'H' => [0b101, 0b101, 0b111, 0b101, 0b101],
        'i' | 'I' => [0b111, 0b010, 0b010, 0b010, 0b111],
        'j' | 'J' => [0b001, 0b001, 0b001, 0b101, 0b111],
        'k' | 'K' => [0b101, 0b101, 0b110, 0b101, 0b101],
        'l' | 'L' => [0b100, 0b100, 0b100, 0b100, 0b111],
        'm' | 'M' => [0b101, 0b111, 0b101, 0b101, 0b101],
        'n' | 'N' => [0b111, 0b101, 0b101, 0b101, 0b101],
        'o' | 'O' => [0b111, 0b101, 0b101, 0b101, 0b111],
        'p' | 'P' => [0b111, 0b101, 0b111, 0b100, 0b100],
        'q' | 'Q' => [0b111, 0b101, 0b101, 0b111, 0b001],
        'r' | 'R' => [0b110, 0b101, 0b110, 0b101, 0b101],
        's' | 'S' => [0b111, 0b100, 0b111, 0b001, 0b111],
        't' | 'T' => [0b111, 0b010, 0b010, 0b010, 0b010],
        'u' | 'U' => [0b101, 0b101, 0b101, 0b101, 0b111],
        'v' | 'V' => [0b101, 0b101, 0b101, 0b010, 0b010],
        'w' | 'W' => [0b101, 0b101, 0b101, 0b111, 0b101],
        'x' | 'X' => [0b101, 0b101, 0b010, 0b101, 0b101],
        'y' | 'Y' => [0b101, 0b101, 0b111, 0b010, 0b010],
        'z' | 'Z' => [0b111, 0b001, 0b010, 0b100, 0b111],
        '#' => [0b101, 0b111, 0b101, 0b111, 0b101],
        '[' => [0b110, 0b100, 0b100, 0b100, 0b110],
        ']' => [0b011, 0b001, 0b001, 0b001, 0b011],
        '(' => [0b010, 0b100, 0b100, 0b100, 0b010],
        ')' => [0b010, 0b001, 0b001, 0b001, 0b010],
        '_' => [0b000, 0b000, 0b000, 0b000, 0b111],
        '/' => [0b001, 0b001, 0b010, 0b100, 0b100],
        '-' => [0b000, 0b000, 0b111, 0b000, 0b000],
        '.' => [0b000, 0b000, 0b000, 0b000, 0b010],
        ',' => [0b000, 0b000, 0b000, 0b010, 0b100],
        ':' => [0b000, 0b010, 0b000, 0b010, 0b000],
        '=' => [0b000, 0b111, 0b000, 0b111, 0b000],
        '+' => [0b000, 0b010, 0b111, 0b010, 0b000],
        ' ' => [0b000, 0b000, 0b000, 0b000, 0b000],
        _   => [0b000, 0b000, 0b010, 0b000, 0b000], // fallback dot
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
