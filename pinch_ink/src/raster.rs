//! Software rasterizer for the ink layer, plus PNG export.
//!
//! Pixels are packed `0xAARRGGBB`.  The ink layer starts fully transparent;
//! each stroke is painted as a chain of round-capped capsules, one per
//! segment, which gives round joins for free.

use std::path::Path;

use image::{ImageFormat, Rgba, RgbaImage};

use crate::error::InkError;
use crate::landmark::{CanvasSize, Point2D};
use crate::stroke::{Stroke, MIN_COMMIT_POINTS};

pub const TRANSPARENT: u32 = 0x0000_0000;

#[derive(Clone, Debug)]
pub struct Raster {
    size:   CanvasSize,
    pixels: Vec<u32>,
}

impl Raster {
    pub fn new(size: CanvasSize) -> Self {
        Raster { size, pixels: vec![TRANSPARENT; size.pixel_count()] }
    }

    pub fn size(&self) -> CanvasSize { self.size }

    pub fn pixels(&self) -> &[u32] { &self.pixels }

    /// Resize the layer, wiping it.  Existing stroke coordinates are not
    /// rescaled; they are simply redrawn in the new pixel space.
    pub fn resize(&mut self, size: CanvasSize) {
        if size != self.size {
            self.size = size;
            self.pixels = vec![TRANSPARENT; size.pixel_count()];
        }
    }

    pub fn clear(&mut self) {
        self.pixels.fill(TRANSPARENT);
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<u32> {
        if x < self.size.width && y < self.size.height {
            Some(self.pixels[y as usize * self.size.width as usize + x as usize])
        } else {
            None
        }
    }

    /// Wipe and paint `strokes` in order.
    pub fn render(&mut self, strokes: &[&Stroke]) {
        self.clear();
        for stroke in strokes {
            self.draw_stroke(stroke);
        }
    }

    /// Paint one stroke.  Strokes shorter than two points are not drawn.
    pub fn draw_stroke(&mut self, stroke: &Stroke) {
        if stroke.points.len() < MIN_COMMIT_POINTS { return; }
        let argb = stroke.color.to_argb();
        for pair in stroke.points.windows(2) {
            self.draw_segment(pair[0], pair[1], stroke.width, argb);
        }
    }

    /// Capsule of diameter `width` from `a` to `b`.
    pub fn draw_segment(&mut self, a: Point2D, b: Point2D, width: f32, argb: u32) {
        if self.size.is_empty() { return; }
        let r  = (width * 0.5).max(0.5);
        let r2 = r * r;

        let w = self.size.width as i64;
        let h = self.size.height as i64;
        let x0 = ((a.x.min(b.x) - r).floor() as i64).max(0);
        let x1 = ((a.x.max(b.x) + r).ceil()  as i64).min(w - 1);
        let y0 = ((a.y.min(b.y) - r).floor() as i64).max(0);
        let y1 = ((a.y.max(b.y) + r).ceil()  as i64).min(h - 1);

        let dx = b.x - a.x;
        let dy = b.y - a.y;
        let len2 = dx * dx + dy * dy;

        for y in y0..=y1 {
            let py = y as f32 + 0.5;
            for x in x0..=x1 {
                let px = x as f32 + 0.5;
                // Closest point on the segment to the pixel centre.
                let t = if len2 > 0.0 {
                    (((px - a.x) * dx + (py - a.y) * dy) / len2).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                let ex = px - (a.x + t * dx);
                let ey = py - (a.y + t * dy);
                if ex * ex + ey * ey <= r2 {
                    self.pixels[(y * w + x) as usize] = argb;
                }
            }
        }
    }

    /// Filled disc, used for joints and the cursor.
    pub fn fill_disc(&mut self, centre: Point2D, radius: f32, argb: u32) {
        self.draw_segment(centre, centre, radius * 2.0, argb);
    }

    /// Copy every non-transparent pixel onto `dst`, which must be the same size.
    pub fn composite_onto(&self, dst: &mut [u32]) {
        for (d, &s) in dst.iter_mut().zip(self.pixels.iter()) {
            if s >> 24 != 0 { *d = s; }
        }
    }

    pub fn to_image(&self) -> RgbaImage {
        let w = self.size.width;
        RgbaImage::from_fn(self.size.width, self.size.height, |x, y| {
            let p = self.pixels[y as usize * w as usize + x as usize];
            Rgba([(p >> 16) as u8, (p >> 8) as u8, p as u8, (p >> 24) as u8])
        })
    }

    pub fn save_png(&self, path: &Path) -> Result<(), InkError> {
        if self.size.is_empty() {
            return Err(InkError::EmptyCanvas { width: self.size.width, height: self.size.height });
        }
        self.to_image()
            .save_with_format(path, ImageFormat::Png)
            .map_err(|source| InkError::Export { path: path.to_path_buf(), source })
    }
}

/// Render `strokes` onto a fresh transparent layer of `size` and write a PNG.
pub fn export_png(strokes: &[&Stroke], size: CanvasSize, path: &Path) -> Result<(), InkError> {
    let mut raster = Raster::new(size);
    raster.render(strokes);
    raster.save_png(path)?;
    log::info!("exported {} stroke(s) to {}", strokes.len(), path.display());
    Ok(())
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
