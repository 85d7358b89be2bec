//! Brush state: color and width.

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

use crate::error::InkError;

pub const MIN_WIDTH:     f32 = 1.0;
pub const MAX_WIDTH:     f32 = 20.0;
pub const DEFAULT_WIDTH: f32 = 5.0;

/// Default swatches, in display order.
pub const PALETTE: [&str; 10] = [
    "#ff6b6b", "#4ecdc4", "#45b7d1", "#96ceb4", "#feca57",
    "#ff9ff3", "#54a0ff", "#5f27cd", "#00d2d3", "#ff9f43",
];

// ════════════════════════════════════════════════════════════════════════════
// Color
// ════════════════════════════════════════════════════════════════════════════

/// Opaque RGB color.  Serializes as `#rrggbb`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Color { r, g, b }
    }

    /// Parse `#rgb`, `#rrggbb` or any other opaque CSS color.
    pub fn from_hex(s: &str) -> Result<Self, InkError> {
        let parsed = csscolorparser::parse(s.trim())
            .map_err(|_| InkError::InvalidColor(s.to_string()))?;
        let [r, g, b, a] = parsed.to_rgba8();
        if a != 0xFF {
            return Err(InkError::InvalidColor(s.to_string()));
        }
        Ok(Color { r, g, b })
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Packed `0xAARRGGBB` with full alpha.
    pub fn to_argb(&self) -> u32 {
        0xFF00_0000 | (self.r as u32) << 16 | (self.g as u32) << 8 | self.b as u32
    }

    /// Palette entry `i`, wrapping.
    pub fn palette(i: usize) -> Color {
        // PALETTE entries are fixed hex literals.
        let hex = PALETTE[i % PALETTE.len()];
        Color::from_hex(hex).unwrap_or(Color::rgb(0xff, 0x6b, 0x6b))
    }
}

impl Default for Color {
    fn default() -> Self { Color::rgb(0xff, 0x6b, 0x6b) }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Color {
    type Err = InkError;
    fn from_str(s: &str) -> Result<Self, Self::Err> { Color::from_hex(s) }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Brush
// ════════════════════════════════════════════════════════════════════════════

/// The settings a new stroke snapshots when it begins.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Brush {
    pub color: Color,
    width:     f32,
}

impl Brush {
    pub fn new(color: Color, width: f32) -> Result<Self, InkError> {
        Ok(Brush { color, width: check_width(width)? })
    }

    pub fn width(&self) -> f32 { self.width }

    pub fn set_width(&mut self, width: f32) -> Result<(), InkError> {
        self.width = check_width(width)?;
        Ok(())
    }
}

impl Default for Brush {
    fn default() -> Self {
        Brush { color: Color::default(), width: DEFAULT_WIDTH }
    }
}

fn check_width(width: f32) -> Result<f32, InkError> {
    if width.is_finite() && (MIN_WIDTH..=MAX_WIDTH).contains(&width) {
        Ok(width)
    } else {
        Err(InkError::WidthOutOfRange(width))
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_round_trips_lowercase() {
        let c = Color::from_hex("#FF0000").unwrap();
        assert_eq!(c, Color::rgb(255, 0, 0));
        assert_eq!(c.to_string(), "#ff0000");
    }

    #[test]
    fn short_hex_expands() {
        assert_eq!(Color::from_hex("#0f0").unwrap(), Color::rgb(0, 255, 0));
    }

    #[test]
    fn garbage_color_rejected() {
        assert!(matches!(Color::from_hex("not-a-color"), Err(InkError::InvalidColor(_))));
    }

    #[test]
    fn translucent_color_rejected() {
        assert!(Color::from_hex("#ff000080").is_err());
    }

    #[test]
    fn palette_parses_and_wraps() {
        for (i, hex) in PALETTE.iter().enumerate() {
            assert_eq!(Color::palette(i).to_hex(), *hex);
        }
        assert_eq!(Color::palette(PALETTE.len()), Color::palette(0));
    }

    #[test]
    fn argb_has_full_alpha() {
        assert_eq!(Color::rgb(0x12, 0x34, 0x56).to_argb(), 0xFF123456);
    }

    #[test]
    fn width_range_enforced() {
        assert!(Brush::new(Color::default(), 1.0).is_ok());
        assert!(Brush::new(Color::default(), 20.0).is_ok());
        assert!(Brush::new(Color::default(), 0.5).is_err());
        assert!(Brush::new(Color::default(), 21.0).is_err());
        assert!(Brush::new(Color::default(), f32::NAN).is_err());
    }

    #[test]
    fn failed_set_width_keeps_old_width() {
        let mut b = Brush::default();
        assert!(b.set_width(100.0).is_err());
        assert_eq!(b.width(), DEFAULT_WIDTH);
    }

    #[test]
    fn color_serializes_as_hex_string() {
        let json = serde_json::to_string(&Color::rgb(1, 2, 3)).unwrap();
        assert_eq!(json, "\"#010203\"");
    }
}
