// src/text/headless.rs

//! Headless mock font provider.
//!
//! Every visible character becomes an outlined box `size / 2` pixels wide
//! and `size` pixels tall sitting on the baseline. Whitespace shapes to a
//! blank glyph that only advances the pen. Directions other than
//! left-to-right are ignored.

use super::{FontFlags, FontProvider, GlyphColors, GlyphRun, ShapedGlyph};
use crate::canvas::Point;
use crate::color::Rgba;
use anyhow::{bail, Result};
use log::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeadlessFont {
    pub size: u32,
    pub flags: FontFlags,
}

impl HeadlessFont {
    fn cell(&self) -> (u32, u32) {
        ((self.size / 2).max(1), self.size.max(1))
    }

    fn advance(&self) -> i32 {
        (self.cell().0 as i32 + 1) << 6
    }
}

#[derive(Debug, Clone, Default)]
pub struct HeadlessFontProvider;

impl HeadlessFontProvider {
    pub fn new() -> Self {
        Self
    }
}

fn write_px(buffer: &mut [u8], stride: usize, x: usize, y: usize, c: Rgba) {
    let off = y * stride + x * 4;
    if let Some(px) = buffer.get_mut(off..off + 4) {
        px.copy_from_slice(&c.to_bytes());
    }
}

impl FontProvider for HeadlessFontProvider {
    type Font = HeadlessFont;
    type GlyphId = char;

    fn new_font(&mut self, name: &str, size: u32, flags: FontFlags) -> Result<HeadlessFont> {
        if size == 0 {
            bail!("font '{}' requested with zero size", name);
        }
        debug!(
            "HeadlessFontProvider: new_font '{}' size={} flags={:?}",
            name, size, flags
        );
        Ok(HeadlessFont { size, flags })
    }

    fn shape_text(&self, font: &HeadlessFont, text: &str, _dx: i32, _dy: i32) -> GlyphRun<char> {
        let (w, h) = font.cell();
        let glyphs = text
            .chars()
            .map(|id| {
                let (width, height) = if id.is_whitespace() { (0, 0) } else { (w, h) };
                ShapedGlyph {
                    id,
                    x: 0,
                    y: -((h as i32) << 6),
                    width,
                    height,
                    dx: font.advance(),
                    dy: 0,
                }
            })
            .collect();
        GlyphRun { glyphs }
    }

    fn render_glyph(
        &self,
        glyph: &ShapedGlyph<char>,
        buffer: &mut [u8],
        stride: usize,
        colors: &GlyphColors,
    ) {
        let (w, h) = (glyph.width as usize, glyph.height as usize);
        let fg = colors.foreground;
        let bg = colors.background;
        for y in 0..h {
            for x in 0..w {
                let edge = x == 0 || y == 0 || x + 1 == w || y + 1 == h;
                let c = match (edge, bg.a) {
                    (true, _) => fg,
                    (false, 0) => colors.transparent,
                    (false, _) => bg,
                };
                write_px(buffer, stride, x, y, c);
            }
        }
    }

    fn render_shadow(
        &self,
        glyph: &ShapedGlyph<char>,
        buffer: &mut [u8],
        stride: usize,
        shadow: Rgba,
        transparent: Rgba,
    ) {
        // The outline dilated by one pixel covers the whole padded box
        // except the interior two pixels in from the outline.
        let (w, h) = (glyph.width as usize + 2, glyph.height as usize + 2);
        for y in 0..h {
            for x in 0..w {
                let inner = x >= 3 && y >= 3 && x + 3 < w && y + 3 < h;
                write_px(buffer, stride, x, y, if inner { transparent } else { shadow });
            }
        }
    }

    fn text_bbox(&self, font: &HeadlessFont, text: &str, _dx: i32, _dy: i32) -> [Point; 4] {
        let advance = font.advance() >> 6;
        let width = advance * text.chars().count() as i32;
        let height = font.cell().1 as i32;
        [
            Point::new(0, 0),
            Point::new(0, -height),
            Point::new(width, -height),
            Point::new(width, 0),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test_log::test]
    fn test_zero_size_font_is_rejected() {
        let mut p = HeadlessFontProvider::new();
        assert!(p.new_font("sans", 0, FontFlags::empty()).is_err());
        assert!(p.new_font("sans", 12, FontFlags::BOLD).is_ok());
    }

    #[test_log::test]
    fn test_shape_places_glyphs_above_baseline() {
        let mut p = HeadlessFontProvider::new();
        let font = p.new_font("sans", 10, FontFlags::empty()).unwrap();
        let run = p.shape_text(&font, "a b", 0x10000, 0);
        assert_eq!(run.glyphs.len(), 3);
        assert_eq!((run.glyphs[0].width, run.glyphs[0].height), (5, 10));
        assert_eq!(run.glyphs[0].y, -10 << 6);
        assert!(run.glyphs[1].is_blank());
        assert_eq!(run.glyphs[2].dx, 6 << 6);
    }

    #[test_log::test]
    fn test_bbox_spans_all_advances() {
        let mut p = HeadlessFontProvider::new();
        let font = p.new_font("sans", 10, FontFlags::empty()).unwrap();
        let bbox = p.text_bbox(&font, "abcd", 0x10000, 0);
        assert_eq!(bbox[1], Point::new(0, -10));
        assert_eq!(bbox[2], Point::new(24, -10));
    }

    #[test_log::test]
    fn test_rendered_outline_uses_foreground() {
        let p = HeadlessFontProvider::new();
        let glyph = ShapedGlyph {
            id: 'x',
            x: 0,
            y: 0,
            width: 4,
            height: 4,
            dx: 0,
            dy: 0,
        };
        let mut buf = vec![0u8; 4 * 4 * 4];
        let colors = GlyphColors {
            foreground: Rgba::WHITE,
            background: Rgba::TRANSPARENT,
            transparent: Rgba::TRANSPARENT,
        };
        p.render_glyph(&glyph, &mut buf, 16, &colors);
        assert_eq!(&buf[0..4], &Rgba::WHITE.to_bytes());
        // (1, 1) is interior
        assert_eq!(&buf[16 + 4..16 + 8], &[0, 0, 0, 0]);
    }
}
