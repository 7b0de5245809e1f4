// src/image.rs

//! Raster images loaded from files and drawn with straight-alpha "over".

use anyhow::{bail, Context, Result};
use log::{debug, error};
use png::{ColorType, Transformations};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use crate::canvas::Point;

/// Decoded RGBA8888 image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    width: u32,
    height: u32,
    hot: Point,
    pixels: Vec<u8>,
}

impl Image {
    /// Wraps tightly packed RGBA8888 rows. The hotspot is the image center.
    pub fn from_rgba(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * 4;
        if pixels.len() != expected {
            bail!(
                "image data is {} bytes, expected {} for {}x{}",
                pixels.len(),
                expected,
                width,
                height
            );
        }
        Ok(Self {
            width,
            height,
            hot: Point::new(width as i32 / 2, height as i32 / 2),
            pixels,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn hot(&self) -> Point {
        self.hot
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn stride(&self) -> usize {
        self.width as usize * 4
    }
}

/// Turns an encoded byte stream into an [`Image`].
pub trait ImageDecoder {
    fn decode(&self, reader: &mut dyn Read) -> Result<Image>;

    fn load(&self, path: &Path) -> Result<Image> {
        let file =
            File::open(path).with_context(|| format!("failed to open image {}", path.display()))?;
        let image = self
            .decode(&mut BufReader::new(file))
            .with_context(|| format!("failed to decode image {}", path.display()));
        match &image {
            Ok(img) => debug!(
                "Image: loaded {} ({}x{})",
                path.display(),
                img.width(),
                img.height()
            ),
            Err(e) => error!("Image: {:#}", e),
        }
        image
    }
}

/// PNG decoder normalizing every color type and depth to RGBA8888.
#[derive(Debug, Clone, Copy, Default)]
pub struct PngDecoder;

impl ImageDecoder for PngDecoder {
    fn decode(&self, reader: &mut dyn Read) -> Result<Image> {
        let mut decoder = png::Decoder::new(reader);
        decoder.set_transformations(Transformations::EXPAND | Transformations::STRIP_16);
        let mut reader = decoder.read_info().context("invalid PNG header")?;
        let mut buf = vec![0u8; reader.output_buffer_size()];
        let info = reader.next_frame(&mut buf).context("invalid PNG data")?;
        buf.truncate(info.buffer_size());

        let rgba = match info.color_type {
            ColorType::Rgba => buf,
            ColorType::Rgb => buf
                .chunks_exact(3)
                .flat_map(|p| [p[0], p[1], p[2], 255])
                .collect(),
            ColorType::GrayscaleAlpha => buf
                .chunks_exact(2)
                .flat_map(|p| [p[0], p[0], p[0], p[1]])
                .collect(),
            ColorType::Grayscale => buf.iter().flat_map(|&v| [v, v, v, 255]).collect(),
            ColorType::Indexed => bail!("indexed PNG was not expanded"),
        };
        Image::from_rgba(info.width, info.height, rgba)
    }
}
