// src/transport/frame.rs

//! Wire format of the outbound frame stream.
//!
//! Each frame is a 16-byte header of four native-endian `i32`s
//! (`magic`, `width`, `height`, `size`) followed by `size` bytes of
//! row-major RGBA8888 pixels.

use anyhow::{bail, Context, Result};
use std::io::{Read, Write};

pub const FRAME_MAGIC: u32 = 0xDEAD_BEEF;
pub const HEADER_LEN: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub magic: i32,
    pub width: i32,
    pub height: i32,
    pub size: i32,
}

impl FrameHeader {
    pub fn for_dimensions(width: u32, height: u32) -> Self {
        let size = (width as u64 * height as u64 * 4).min(i32::MAX as u64) as i32;
        Self {
            magic: FRAME_MAGIC as i32,
            width: width as i32,
            height: height as i32,
            size,
        }
    }

    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut out = [0u8; HEADER_LEN];
        for (chunk, v) in out
            .chunks_exact_mut(4)
            .zip([self.magic, self.width, self.height, self.size])
        {
            chunk.copy_from_slice(&v.to_ne_bytes());
        }
        out
    }

    pub fn from_bytes(bytes: &[u8; HEADER_LEN]) -> Self {
        let field = |i: usize| {
            let mut b = [0u8; 4];
            b.copy_from_slice(&bytes[i * 4..i * 4 + 4]);
            i32::from_ne_bytes(b)
        };
        Self {
            magic: field(0),
            width: field(1),
            height: field(2),
            size: field(3),
        }
    }
}

/// One staged frame: dimensions plus RGBA8888 payload.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl Frame {
    pub fn header(&self) -> FrameHeader {
        FrameHeader::for_dimensions(self.width, self.height)
    }
}

/// Writes header and payload in two writes.
pub fn write_frame<W: Write>(writer: &mut W, frame: &Frame) -> std::io::Result<()> {
    writer.write_all(&frame.header().to_bytes())?;
    writer.write_all(&frame.pixels)?;
    writer.flush()
}

/// Reads one frame, validating the magic and the payload size.
pub fn read_frame<R: Read>(reader: &mut R) -> Result<Frame> {
    let mut raw = [0u8; HEADER_LEN];
    reader
        .read_exact(&mut raw)
        .context("failed to read frame header")?;
    let header = FrameHeader::from_bytes(&raw);

    if header.magic as u32 != FRAME_MAGIC {
        bail!("bad frame magic {:#010x}", header.magic as u32);
    }
    if header.width < 0 || header.height < 0 {
        bail!("negative frame size {}x{}", header.width, header.height);
    }
    let expected = header.width as u64 * header.height as u64 * 4;
    if header.size < 0 || header.size as u64 != expected {
        bail!(
            "frame payload size {} does not match {}x{}",
            header.size,
            header.width,
            header.height
        );
    }

    let mut pixels = vec![0u8; header.size as usize];
    reader
        .read_exact(&mut pixels)
        .context("failed to read frame payload")?;
    Ok(Frame {
        width: header.width as u32,
        height: header.height as u32,
        pixels,
    })
}
