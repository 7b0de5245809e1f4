// src/text/blitter.rs

//! Turns shaped glyph runs into canvas pixels.
//!
//! Two passes over the run: with a background color, every glyph's padded
//! halo bitmap is copied onto the canvas first; then the glyph coverage
//! itself is drawn, as an opaque copy when there is a background, or
//! pixel by pixel with straight-alpha "over" when there is none.

use super::{FontProvider, GlyphColors, GlyphRun};
use crate::canvas::{Canvas, Point};
use crate::color::Rgba;
use log::trace;

/// Picks the glyph and halo colors for a text draw.
///
/// An exact white/black pair (in either order) is swapped, so coverage
/// antialiases against the opposite polarity. Without a background the halo
/// is fully transparent.
pub fn resolve_text_colors(fg: Rgba, bg: Option<Rgba>) -> (Rgba, Rgba) {
    match bg {
        None => (fg, Rgba::TRANSPARENT),
        Some(bg) if fg.is_white() && bg.is_black() => (Rgba::BLACK, Rgba::WHITE),
        Some(bg) if fg.is_black() && bg.is_white() => (Rgba::WHITE, Rgba::BLACK),
        Some(bg) => (fg, bg),
    }
}

/// Glyph renderer owning a reusable scratch bitmap.
///
/// The scratch allocation only ever grows, so steady-state text drawing
/// does not allocate per glyph.
#[derive(Debug, Default)]
pub struct GlyphBlitter {
    scratch: Vec<u8>,
}

impl GlyphBlitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current size of the scratch allocation in bytes.
    pub fn scratch_capacity(&self) -> usize {
        self.scratch.len()
    }

    /// Zeroed scratch region of `len` bytes, growing the arena if needed.
    fn scratch(&mut self, len: usize) -> &mut [u8] {
        if len > self.scratch.len() {
            trace!(
                "GlyphBlitter: growing scratch {} -> {} bytes",
                self.scratch.len(),
                len
            );
            self.scratch.resize(len, 0);
        }
        let region = &mut self.scratch[..len];
        region.fill(0);
        region
    }

    /// Draws `run` with its pen starting at `origin`.
    pub fn draw_run<F: FontProvider>(
        &mut self,
        canvas: &mut Canvas,
        fonts: &F,
        run: &GlyphRun<F::GlyphId>,
        fg: Rgba,
        bg: Option<Rgba>,
        origin: Point,
    ) {
        let (fg, halo) = resolve_text_colors(fg, bg);
        let colors = GlyphColors {
            foreground: fg,
            background: halo,
            transparent: Rgba::TRANSPARENT,
        };
        let pen_x = origin.x << 6;
        let pen_y = origin.y << 6;

        if bg.is_some() {
            let (mut x, mut y) = (pen_x, pen_y);
            for g in &run.glyphs {
                if !g.is_blank() {
                    let (w, h) = (g.width + 2, g.height + 2);
                    let stride = w as usize * 4;
                    let buf = self.scratch(stride * h as usize);
                    fonts.render_shadow(g, buf, stride, halo, Rgba::TRANSPARENT);
                    canvas.blit_rgba(buf, w, h, stride, (x + g.x) >> 6, (y + g.y) >> 6);
                }
                x += g.dx;
                y += g.dy;
            }
        }

        let (mut x, mut y) = (pen_x, pen_y);
        for g in &run.glyphs {
            if !g.is_blank() {
                let stride = g.width as usize * 4;
                let buf = self.scratch(stride * g.height as usize);
                fonts.render_glyph(g, buf, stride, &colors);
                let (gx, gy) = ((x + g.x) >> 6, (y + g.y) >> 6);
                if bg.is_some() {
                    canvas.blit_rgba(buf, g.width, g.height, stride, gx, gy);
                } else {
                    canvas.composite_rgba(buf, g.width, g.height, stride, gx, gy);
                }
            }
            x += g.dx;
            y += g.dy;
        }
    }
}
