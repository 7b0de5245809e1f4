// src/lib.rs

//! Headless 2D software-rendering backend.
//!
//! Draw calls rasterize into an in-memory root canvas and its overlays.
//! Each finished frame is streamed as a header plus raw RGBA over a named
//! pipe, and pointer, key, resize and quit commands arrive as text lines on
//! a second pipe.

/// Host-facing surface: drawing, overlays, frames, input.
pub mod backend;
/// Pixel buffers, formats and graphics contexts.
pub mod canvas;
/// Color types.
pub mod color;
/// Configuration loading.
pub mod config;
pub mod error;
/// Events and handles reported to the host.
pub mod host;
pub mod image;
/// Inbound control stream.
pub mod input;
/// Root and overlay canvases, draw-mode state machine.
pub mod overlay;
/// Vector primitive rasterization.
pub mod rasterizer;
/// Font provider capability and glyph blitting.
pub mod text;
/// Outbound frame stream.
pub mod transport;

pub use backend::Backend;
pub use canvas::{Canvas, GraphicsContext, PixelFormat, Point};
pub use color::{Color16, Rgba};
pub use config::Config;
pub use error::CanvasError;
pub use host::{HostEvent, NavKey};
pub use overlay::{DrawMode, OverlayId, SurfaceId};
