// src/text/mod.rs

//! Text rendering: the font provider capability and the glyph blitter.
//!
//! Shaping and glyph rasterization are delegated to a `FontProvider`; this
//! module only turns the provider's RGBA glyph bitmaps into canvas pixels.

pub mod blitter;
pub mod headless;

pub use blitter::{resolve_text_colors, GlyphBlitter};
pub use headless::HeadlessFontProvider;

use crate::canvas::Point;
use crate::color::Rgba;
use anyhow::Result;
use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Style requested when loading a font.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct FontFlags: u8 {
        const BOLD = 1 << 0;
    }
}

/// One positioned glyph of a shaped run.
///
/// Offsets and advances are 26.6 fixed point (1/64 pixel).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShapedGlyph<G> {
    pub id: G,
    /// Bitmap left edge relative to the pen position.
    pub x: i32,
    /// Bitmap top edge relative to the pen position.
    pub y: i32,
    pub width: u32,
    pub height: u32,
    /// Pen advance after this glyph.
    pub dx: i32,
    pub dy: i32,
}

impl<G> ShapedGlyph<G> {
    pub fn is_blank(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// A shaped string. Dropping it releases the shaping result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlyphRun<G> {
    pub glyphs: Vec<ShapedGlyph<G>>,
}

/// Colors a glyph bitmap is rendered with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlyphColors {
    pub foreground: Rgba,
    pub background: Rgba,
    pub transparent: Rgba,
}

/// Platform font capability: font loading, shaping and glyph rasterization.
///
/// Rendered bitmaps are row-major RGBA (4 bytes per pixel) with **straight
/// (non-premultiplied) alpha**; `stride` is the row length in bytes.
pub trait FontProvider {
    /// Provider-specific font handle.
    type Font;

    /// Provider-specific glyph identifier.
    type GlyphId: Copy;

    /// Loads a font by name at `size` (host units).
    fn new_font(&mut self, name: &str, size: u32, flags: FontFlags) -> Result<Self::Font>;

    /// Shapes `text` along the direction `(dx, dy)` (0x10000 = unit length).
    fn shape_text(
        &self,
        font: &Self::Font,
        text: &str,
        dx: i32,
        dy: i32,
    ) -> GlyphRun<Self::GlyphId>;

    /// Renders glyph coverage into a `width`×`height` bitmap.
    fn render_glyph(
        &self,
        glyph: &ShapedGlyph<Self::GlyphId>,
        buffer: &mut [u8],
        stride: usize,
        colors: &GlyphColors,
    );

    /// Renders the glyph's halo into a `(width + 2)`×`(height + 2)` bitmap.
    fn render_shadow(
        &self,
        glyph: &ShapedGlyph<Self::GlyphId>,
        buffer: &mut [u8],
        stride: usize,
        shadow: Rgba,
        transparent: Rgba,
    );

    /// Corners of the text's bounding box relative to the pen origin:
    /// bottom-left, top-left, top-right, bottom-right.
    fn text_bbox(&self, font: &Self::Font, text: &str, dx: i32, dy: i32) -> [Point; 4];
}
