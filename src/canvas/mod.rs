// src/canvas/mod.rs

//! In-memory pixel buffer every drawing operation targets.
//!
//! A `Canvas` is a row-major packed pixel buffer plus the state the
//! rasterizer needs to pick a primitive variant (pixel format and
//! antialiasing mode). All writes are clipped to the buffer bounds.

pub mod format;
pub mod gc;

pub use format::PixelFormat;
pub use gc::GraphicsContext;

use crate::color::Rgba;
use crate::error::CanvasError;
use log::{debug, error, trace};
use serde::{Deserialize, Serialize};

/// Integer pixel coordinate. May lie outside the canvas; writes are clipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Owned pixel buffer with its format and antialiasing mode.
pub struct Canvas {
    width: u32,
    height: u32,
    format: PixelFormat,
    antialias: bool,
    pixels: Vec<u8>,
}

fn allocate(width: u32, height: u32, format: PixelFormat) -> Result<Vec<u8>, CanvasError> {
    let failed = CanvasError::AllocationFailed { width, height };
    let len = (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(format.bytes_per_pixel()))
        .filter(|&n| n > 0)
        .ok_or_else(|| failed.clone())?;

    let mut pixels = Vec::new();
    if let Err(e) = pixels.try_reserve_exact(len) {
        error!("Canvas: allocation of {} bytes for {}x{} failed: {}", len, width, height, e);
        return Err(failed);
    }
    pixels.resize(len, 0);
    Ok(pixels)
}

impl Canvas {
    /// Allocates a zeroed (transparent black) canvas.
    pub fn new(
        width: u32,
        height: u32,
        format: PixelFormat,
        antialias: bool,
    ) -> Result<Self, CanvasError> {
        let pixels = allocate(width, height, format)?;
        debug!(
            "Canvas: created {}x{} @ {} bpp (antialias={})",
            width,
            height,
            format.bits_per_pixel(),
            antialias
        );
        Ok(Self {
            width,
            height,
            format,
            antialias,
            pixels,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn antialias(&self) -> bool {
        self.antialias
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn stride(&self) -> usize {
        self.width as usize * self.format.bytes_per_pixel()
    }

    /// Replaces the buffer with a fresh zeroed one of the new size.
    ///
    /// On failure the old buffer and dimensions are left untouched.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), CanvasError> {
        let pixels = allocate(width, height, self.format)?;
        debug!(
            "Canvas: resized {}x{} -> {}x{}",
            self.width, self.height, width, height
        );
        self.pixels = pixels;
        self.width = width;
        self.height = height;
        Ok(())
    }

    /// Packs a color into this canvas' pixel format.
    pub fn map_rgba(&self, c: Rgba) -> u32 {
        self.format.map_rgba(c)
    }

    fn offset(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x as u32 >= self.width || y as u32 >= self.height {
            return None;
        }
        Some(y as usize * self.stride() + x as usize * self.format.bytes_per_pixel())
    }

    /// Packed pixel value at (x, y), or `None` outside the canvas.
    pub fn pixel(&self, x: i32, y: i32) -> Option<u32> {
        let off = self.offset(x, y)?;
        Some(self.format.read(&self.pixels[off..]))
    }

    pub fn rgba_at(&self, x: i32, y: i32) -> Option<Rgba> {
        self.pixel(x, y).map(|v| self.format.get_rgba(v))
    }

    /// Overwrites one pixel with a packed value.
    pub fn put_pixel(&mut self, x: i32, y: i32, value: u32) {
        if let Some(off) = self.offset(x, y) {
            self.format.write(&mut self.pixels[off..], value);
        }
    }

    /// Composites `src` over the pixel at (x, y) with straight alpha.
    pub fn blend_pixel(&mut self, x: i32, y: i32, src: Rgba) {
        if src.a == 0 {
            return;
        }
        let Some(off) = self.offset(x, y) else {
            return;
        };
        let dst = self.format.get_rgba(self.format.read(&self.pixels[off..]));
        let out = self.format.map_rgba(src.over(dst));
        self.format.write(&mut self.pixels[off..], out);
    }

    /// Overwrites the horizontal span `[x1, x2]` (inclusive, any order) on row `y`.
    pub fn hline(&mut self, x1: i32, x2: i32, y: i32, value: u32) {
        if y < 0 || y as u32 >= self.height {
            return;
        }
        let (lo, hi) = if x1 <= x2 { (x1, x2) } else { (x2, x1) };
        let lo = lo.max(0);
        let hi = hi.min(self.width as i32 - 1);
        if lo > hi {
            return;
        }
        let bpp = self.format.bytes_per_pixel();
        let row = y as usize * self.stride();
        for x in lo..=hi {
            let off = row + x as usize * bpp;
            self.format.write(&mut self.pixels[off..], value);
        }
    }

    /// Overwrites a `w`×`h` rectangle with its top-left at (x, y), clipped.
    pub fn fill_rect(&mut self, x: i32, y: i32, w: u32, h: u32, value: u32) {
        if w == 0 || h == 0 {
            return;
        }
        let w = w.min(i32::MAX as u32) as i32;
        let h = h.min(i32::MAX as u32) as i32;
        let x2 = x.saturating_add(w - 1);
        for row in y..y.saturating_add(h) {
            self.hline(x, x2, row, value);
        }
    }

    /// Opaque copy of a packed RGBA8888 byte image with its top-left at (dx, dy).
    ///
    /// `stride` is the source row length in bytes.
    pub fn blit_rgba(
        &mut self,
        src: &[u8],
        src_width: u32,
        src_height: u32,
        stride: usize,
        dx: i32,
        dy: i32,
    ) {
        trace!(
            "Canvas: blit_rgba {}x{} at ({}, {})",
            src_width,
            src_height,
            dx,
            dy
        );
        for row in 0..src_height as usize {
            let src_row = row * stride;
            for col in 0..src_width as usize {
                let idx = src_row + col * 4;
                let Some(px) = src.get(idx..idx + 4) else {
                    return;
                };
                let c = Rgba::new(px[0], px[1], px[2], px[3]);
                let value = self.format.map_rgba(c);
                self.put_pixel(dx + col as i32, dy + row as i32, value);
            }
        }
    }

    /// Straight-alpha "over" of a packed RGBA8888 byte image, pixel by pixel.
    pub fn composite_rgba(
        &mut self,
        src: &[u8],
        src_width: u32,
        src_height: u32,
        stride: usize,
        dx: i32,
        dy: i32,
    ) {
        for row in 0..src_height as usize {
            let src_row = row * stride;
            for col in 0..src_width as usize {
                let idx = src_row + col * 4;
                let Some(px) = src.get(idx..idx + 4) else {
                    return;
                };
                self.blend_pixel(
                    dx + col as i32,
                    dy + row as i32,
                    Rgba::new(px[0], px[1], px[2], px[3]),
                );
            }
        }
    }

    /// Opaque copy of another canvas with its top-left at (dx, dy), clipped.
    pub fn blit_canvas(&mut self, src: &Canvas, dx: i32, dy: i32) {
        let same_format = src.format == self.format;
        let bpp = self.format.bytes_per_pixel();

        for sy in 0..src.height as i32 {
            let ty = dy + sy;
            if ty < 0 || ty as u32 >= self.height {
                continue;
            }
            let sx_start = (-dx).max(0);
            let sx_end = (src.width as i32).min(self.width as i32 - dx);
            if sx_start >= sx_end {
                continue;
            }

            if same_format {
                let src_off = sy as usize * src.stride() + sx_start as usize * bpp;
                let dst_off = ty as usize * self.stride() + (dx + sx_start) as usize * bpp;
                let len = (sx_end - sx_start) as usize * bpp;
                self.pixels[dst_off..dst_off + len]
                    .copy_from_slice(&src.pixels[src_off..src_off + len]);
            } else {
                for sx in sx_start..sx_end {
                    if let Some(c) = src.rgba_at(sx, sy) {
                        let value = self.format.map_rgba(c);
                        self.put_pixel(dx + sx, ty, value);
                    }
                }
            }
        }
    }

    /// Writes the whole buffer as packed RGBA8888 bytes into `out`, reusing its allocation.
    pub fn write_rgba8888(&self, out: &mut Vec<u8>) {
        out.clear();
        if self.format == PixelFormat::Rgba8888 {
            out.extend_from_slice(&self.pixels);
            return;
        }
        out.reserve(self.width as usize * self.height as usize * 4);
        let bpp = self.format.bytes_per_pixel();
        for px in self.pixels.chunks_exact(bpp) {
            out.extend_from_slice(&self.format.get_rgba(self.format.read(px)).to_bytes());
        }
    }
}

impl std::fmt::Debug for Canvas {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Canvas")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("format", &self.format)
            .field("antialias", &self.antialias)
            .finish()
    }
}
