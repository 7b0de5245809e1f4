// src/canvas/format.rs

//! Packed pixel layouts a `Canvas` can be backed by.

use crate::color::Rgba;
use crate::error::CanvasError;

/// Packed RGBA layout of a pixel buffer.
///
/// Every format keeps all four channels; narrower formats quantize them.
/// Pixels are stored in native byte order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// 8 bpp, masks r=0xc0 g=0x30 b=0x0c a=0x03.
    Rgba2222,
    /// 16 bpp, masks r=0xf000 g=0x0f00 b=0x00f0 a=0x000f.
    Rgba4444,
    /// 32 bpp, bytes R,G,B,A in memory.
    Rgba8888,
}

impl PixelFormat {
    pub fn from_bits_per_pixel(bpp: u32) -> Result<Self, CanvasError> {
        match bpp {
            8 => Ok(PixelFormat::Rgba2222),
            16 => Ok(PixelFormat::Rgba4444),
            32 => Ok(PixelFormat::Rgba8888),
            other => Err(CanvasError::UnsupportedDepth(other)),
        }
    }

    pub fn bits_per_pixel(self) -> u32 {
        self.bytes_per_pixel() as u32 * 8
    }

    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Rgba2222 => 1,
            PixelFormat::Rgba4444 => 2,
            PixelFormat::Rgba8888 => 4,
        }
    }

    /// Packs a color into this format's pixel value.
    pub fn map_rgba(self, c: Rgba) -> u32 {
        match self {
            PixelFormat::Rgba2222 => {
                ((c.r as u32 >> 6) << 6)
                    | ((c.g as u32 >> 6) << 4)
                    | ((c.b as u32 >> 6) << 2)
                    | (c.a as u32 >> 6)
            }
            PixelFormat::Rgba4444 => {
                ((c.r as u32 >> 4) << 12)
                    | ((c.g as u32 >> 4) << 8)
                    | ((c.b as u32 >> 4) << 4)
                    | (c.a as u32 >> 4)
            }
            PixelFormat::Rgba8888 => u32::from_ne_bytes(c.to_bytes()),
        }
    }

    /// Unpacks a pixel value, expanding quantized channels to the full 0..=255 range.
    pub fn get_rgba(self, value: u32) -> Rgba {
        match self {
            PixelFormat::Rgba2222 => {
                let q = |shift: u32| (((value >> shift) & 0x3) * 85) as u8;
                Rgba::new(q(6), q(4), q(2), q(0))
            }
            PixelFormat::Rgba4444 => {
                let q = |shift: u32| (((value >> shift) & 0xf) * 17) as u8;
                Rgba::new(q(12), q(8), q(4), q(0))
            }
            PixelFormat::Rgba8888 => Rgba::from_bytes(value.to_ne_bytes()),
        }
    }

    pub(crate) fn read(self, bytes: &[u8]) -> u32 {
        match self {
            PixelFormat::Rgba2222 => bytes[0] as u32,
            PixelFormat::Rgba4444 => u16::from_ne_bytes([bytes[0], bytes[1]]) as u32,
            PixelFormat::Rgba8888 => u32::from_ne_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
        }
    }

    pub(crate) fn write(self, bytes: &mut [u8], value: u32) {
        match self {
            PixelFormat::Rgba2222 => bytes[0] = value as u8,
            PixelFormat::Rgba4444 => bytes[..2].copy_from_slice(&(value as u16).to_ne_bytes()),
            PixelFormat::Rgba8888 => bytes[..4].copy_from_slice(&value.to_ne_bytes()),
        }
    }
}
