// src/color.rs

//! Defines the host-facing 16-bit color (`Color16`) and the 8-bit channel
//! color (`Rgba`) every drawing path works in.

use serde::{Deserialize, Serialize};

/// Color as delivered by the host: four channels of 16 bits each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Color16 {
    pub r: u16,
    pub g: u16,
    pub b: u16,
    pub a: u16,
}

impl Color16 {
    pub const fn new(r: u16, g: u16, b: u16, a: u16) -> Self {
        Self { r, g, b, a }
    }

    /// Truncates every channel to 8 bits (`channel / 256`).
    pub const fn to_rgba(self) -> Rgba {
        Rgba {
            r: (self.r / 256) as u8,
            g: (self.g / 256) as u8,
            b: (self.b / 256) as u8,
            a: (self.a / 256) as u8,
        }
    }
}

/// RGBA color in 32-bit format (8 bits per channel), straight alpha.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const TRANSPARENT: Rgba = Rgba::new(0, 0, 0, 0);
    pub const BLACK: Rgba = Rgba::opaque(0, 0, 0);
    pub const WHITE: Rgba = Rgba::opaque(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub fn from_bytes(bytes: [u8; 4]) -> Self {
        Self::new(bytes[0], bytes[1], bytes[2], bytes[3])
    }

    /// Convert to RGBA byte array
    pub fn to_bytes(&self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Same color with alpha scaled by `coverage` in `[0, 1]`.
    pub fn with_coverage(self, coverage: f32) -> Self {
        let coverage = coverage.clamp(0.0, 1.0);
        Self {
            a: (self.a as f32 * coverage).round() as u8,
            ..self
        }
    }

    pub fn is_white(&self) -> bool {
        self.r == 255 && self.g == 255 && self.b == 255
    }

    pub fn is_black(&self) -> bool {
        self.r == 0 && self.g == 0 && self.b == 0
    }

    /// Straight (non-premultiplied) "over": `self` painted on top of `dst`.
    ///
    /// `out_c = dst_c*(255-a)/255 + src_c*a/255`, `out_a = a + dst_a*(255-a)/255`,
    /// in integer arithmetic per channel.
    pub fn over(self, dst: Rgba) -> Rgba {
        let a = self.a as u32;
        let inv = 255 - a;
        let mix = |d: u8, s: u8| ((d as u32 * inv) / 255 + (s as u32 * a) / 255) as u8;
        Rgba {
            r: mix(dst.r, self.r),
            g: mix(dst.g, self.g),
            b: mix(dst.b, self.b),
            a: (a + (dst.a as u32 * inv) / 255).min(255) as u8,
        }
    }
}

impl From<Color16> for Rgba {
    fn from(color: Color16) -> Self {
        color.to_rgba()
    }
}
