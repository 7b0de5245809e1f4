// src/overlay.rs

//! Root canvas plus up to [`OVERLAY_MAX`] overlay canvases, and the
//! draw-mode state machine that composites them.
//!
//! Overlays hang directly off the root. Slot order is z-order: on a root
//! `End` following a `Begin`, every enabled overlay is copied opaquely onto
//! the root in slot order. Negative overlay positions count from the root's
//! right or bottom edge and are resolved at composite time.

use crate::canvas::{Canvas, Point};
use crate::error::CanvasError;
use log::{debug, error, info, trace};

/// Fixed number of overlay slots under the root.
pub const OVERLAY_MAX: usize = 32;

/// Handle to a live overlay.
///
/// The generation makes a handle to a destroyed overlay stale, even after
/// its slot has been reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OverlayId {
    slot: u8,
    generation: u32,
}

impl OverlayId {
    pub fn slot(&self) -> usize {
        self.slot as usize
    }
}

/// Target of a drawing call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SurfaceId {
    Root,
    Overlay(OverlayId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DrawMode {
    #[default]
    Idle,
    Begin,
    End,
}

#[derive(Debug)]
pub struct Overlay {
    canvas: Canvas,
    position: Point,
    enabled: bool,
    generation: u32,
}

impl Overlay {
    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    /// Position as set by the host, possibly negative.
    pub fn position(&self) -> Point {
        self.position
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }
}

fn resolve_against(p: Point, width: u32, height: u32) -> Point {
    let x = if p.x < 0 { p.x + width as i32 } else { p.x };
    let y = if p.y < 0 { p.y + height as i32 } else { p.y };
    Point::new(x, y)
}

#[derive(Debug)]
pub struct OverlayTree {
    root: Canvas,
    overlays_enabled: bool,
    draw_mode: DrawMode,
    slots: [Option<Overlay>; OVERLAY_MAX],
    generations: [u32; OVERLAY_MAX],
}

impl OverlayTree {
    pub fn new(root: Canvas) -> Self {
        Self {
            root,
            overlays_enabled: true,
            draw_mode: DrawMode::Idle,
            slots: std::array::from_fn(|_| None),
            generations: [0; OVERLAY_MAX],
        }
    }

    pub fn root(&self) -> &Canvas {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut Canvas {
        &mut self.root
    }

    pub fn draw_mode(&self) -> DrawMode {
        self.draw_mode
    }

    pub fn overlays_enabled(&self) -> bool {
        self.overlays_enabled
    }

    pub fn overlay_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn overlay(&self, id: OverlayId) -> Option<&Overlay> {
        self.slots
            .get(id.slot())?
            .as_ref()
            .filter(|ov| ov.generation == id.generation)
    }

    fn overlay_mut(&mut self, id: OverlayId) -> Result<&mut Overlay, CanvasError> {
        self.slots
            .get_mut(id.slot())
            .and_then(|s| s.as_mut())
            .filter(|ov| ov.generation == id.generation)
            .ok_or(CanvasError::NoSuchSurface)
    }

    pub fn canvas(&self, surface: SurfaceId) -> Result<&Canvas, CanvasError> {
        match surface {
            SurfaceId::Root => Ok(&self.root),
            SurfaceId::Overlay(id) => self
                .overlay(id)
                .map(Overlay::canvas)
                .ok_or(CanvasError::NoSuchSurface),
        }
    }

    pub fn canvas_mut(&mut self, surface: SurfaceId) -> Result<&mut Canvas, CanvasError> {
        match surface {
            SurfaceId::Root => Ok(&mut self.root),
            SurfaceId::Overlay(id) => self.overlay_mut(id).map(|ov| &mut ov.canvas),
        }
    }

    /// Whether drawing on `surface` can affect what is displayed.
    ///
    /// The root is always visible; an overlay needs both the global overlay
    /// switch and its own flag. Stale handles are never visible.
    pub fn is_visible(&self, surface: SurfaceId) -> bool {
        match surface {
            SurfaceId::Root => true,
            SurfaceId::Overlay(id) => {
                self.overlays_enabled && self.overlay(id).is_some_and(|ov| ov.enabled)
            }
        }
    }

    /// Allocates a transparent overlay in the first free slot.
    ///
    /// Returns `Ok(None)` when all slots are taken.
    pub fn create(
        &mut self,
        parent: SurfaceId,
        position: Point,
        width: u32,
        height: u32,
    ) -> Result<Option<OverlayId>, CanvasError> {
        if let SurfaceId::Overlay(id) = parent {
            return Err(match self.overlay(id) {
                Some(_) => CanvasError::ParentNotRoot,
                None => CanvasError::NoSuchSurface,
            });
        }

        let Some(slot) = self.slots.iter().position(Option::is_none) else {
            error!(
                "OverlayTree: all {} overlay slots in use, refusing {}x{} overlay",
                OVERLAY_MAX, width, height
            );
            return Ok(None);
        };

        let canvas = Canvas::new(width, height, self.root.format(), self.root.antialias())?;
        let generation = self.generations[slot];
        self.slots[slot] = Some(Overlay {
            canvas,
            position,
            enabled: true,
            generation,
        });
        debug!(
            "OverlayTree: overlay {} created {}x{} at ({}, {})",
            slot, width, height, position.x, position.y
        );
        Ok(Some(OverlayId {
            slot: slot as u8,
            generation,
        }))
    }

    /// Releases an overlay's buffer and frees its slot.
    pub fn destroy(&mut self, id: OverlayId) -> Result<(), CanvasError> {
        self.overlay_mut(id)?;
        self.slots[id.slot()] = None;
        self.generations[id.slot()] = self.generations[id.slot()].wrapping_add(1);
        debug!("OverlayTree: overlay {} destroyed", id.slot());
        Ok(())
    }

    /// Destroys every overlay; returns how many there were.
    pub fn destroy_all(&mut self) -> usize {
        let mut destroyed = 0;
        for (slot, entry) in self.slots.iter_mut().enumerate() {
            if entry.take().is_some() {
                self.generations[slot] = self.generations[slot].wrapping_add(1);
                destroyed += 1;
            }
        }
        if destroyed > 0 {
            info!("OverlayTree: destroyed {} overlays", destroyed);
        }
        destroyed
    }

    /// On the root this is the global overlay switch; on an overlay, its own flag.
    pub fn set_enabled(&mut self, surface: SurfaceId, enabled: bool) -> Result<(), CanvasError> {
        match surface {
            SurfaceId::Root => self.overlays_enabled = enabled,
            SurfaceId::Overlay(id) => self.overlay_mut(id)?.enabled = enabled,
        }
        debug!("OverlayTree: {:?} enabled={}", surface, enabled);
        Ok(())
    }

    pub fn set_position(&mut self, id: OverlayId, position: Point) -> Result<(), CanvasError> {
        self.overlay_mut(id)?.position = position;
        Ok(())
    }

    /// Top-left corner on the root with negative offsets counted from the far edge.
    pub fn resolve_position(&self, id: OverlayId) -> Result<Point, CanvasError> {
        let ov = self.overlay(id).ok_or(CanvasError::NoSuchSurface)?;
        Ok(self.resolve(ov.position))
    }

    fn resolve(&self, p: Point) -> Point {
        resolve_against(p, self.root.width(), self.root.height())
    }

    /// Copies every enabled overlay onto the root in slot order.
    pub fn composite(&mut self) {
        let (w, h) = (self.root.width(), self.root.height());
        for (slot, entry) in self.slots.iter().enumerate() {
            let Some(ov) = entry else { continue };
            if !ov.enabled {
                continue;
            }
            let p = resolve_against(ov.position, w, h);
            trace!("OverlayTree: compositing overlay {} at ({}, {})", slot, p.x, p.y);
            self.root.blit_canvas(&ov.canvas, p.x, p.y);
        }
    }

    /// Advances the draw-mode state machine.
    ///
    /// Returns `true` when a finished root frame is ready to publish. Modes
    /// set on an overlay are accepted and ignored.
    pub fn set_draw_mode(&mut self, surface: SurfaceId, mode: DrawMode) -> Result<bool, CanvasError> {
        if let SurfaceId::Overlay(id) = surface {
            self.overlay(id).ok_or(CanvasError::NoSuchSurface)?;
            return Ok(false);
        }

        let frame_ready = mode == DrawMode::End;
        if frame_ready && self.draw_mode == DrawMode::Begin && self.overlays_enabled {
            self.composite();
        }
        self.draw_mode = mode;
        Ok(frame_ready)
    }

    /// Reallocates the root buffer. Overlays keep their buffers and positions.
    pub fn resize_root(&mut self, width: u32, height: u32) -> Result<(), CanvasError> {
        self.root.resize(width, height)
    }
}
