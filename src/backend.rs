// src/backend.rs

//! The surface the host drives: canvas and overlay lifecycle, graphics
//! contexts, drawing, the frame handoff and input polling.
//!
//! Everything here runs on the host's single cooperative loop. The only
//! other thread is the frame transport, reached through the mailbox.

use crate::canvas::{Canvas, GraphicsContext, Point};
use crate::config::Config;
use crate::error::CanvasError;
use crate::host::{HostEvent, WindowHandle, PRIMARY_BUTTON};
use crate::image::{Image, ImageDecoder, PngDecoder};
use crate::input::{CommandSource, ControlCommand, FifoCommandSource};
use crate::overlay::{DrawMode, OverlayId, OverlayTree, SurfaceId};
use crate::rasterizer::{self, stroke::StrokeOp};
use crate::text::{FontFlags, FontProvider, GlyphBlitter};
use crate::transport::{FifoFrameSink, FrameMailbox, FrameSink, FrameStreamer};
use anyhow::{Context, Result};
use log::*;
use std::path::Path;
use std::sync::Arc;

pub struct Backend<F: FontProvider> {
    tree: OverlayTree,
    fonts: F,
    blitter: GlyphBlitter,
    images: Box<dyn ImageDecoder>,
    mailbox: Arc<FrameMailbox>,
    streamer: Option<FrameStreamer>,
    commands: Option<Box<dyn CommandSource>>,
    initial_resize_pending: bool,
    window: WindowHandle,
}

impl<F: FontProvider> Backend<F> {
    /// Creates the root canvas and both named pipes from `config`.
    pub fn new(config: &Config, fonts: F) -> Result<Self> {
        let sink = FifoFrameSink::create(
            &config.pipes.image_fifo,
            config.timing.frame_poll_interval(),
        )?;
        let source = FifoCommandSource::new(&config.pipes.command_fifo);
        Self::with_transport(config, fonts, sink, source)
    }

    /// Like [`new`](Self::new) with caller-supplied frame sink and command source.
    pub fn with_transport<S, C>(config: &Config, fonts: F, sink: S, source: C) -> Result<Self>
    where
        S: FrameSink + 'static,
        C: CommandSource + 'static,
    {
        let display = &config.display;
        let format = display.pixel_format()?;
        let root = Canvas::new(display.width, display.height, format, display.antialias)
            .context("failed to create root canvas")?;

        let mailbox = Arc::new(FrameMailbox::new());
        let streamer = FrameStreamer::spawn(
            sink,
            Arc::clone(&mailbox),
            config.timing.frame_poll_interval(),
        )?;

        info!(
            "Backend: rendering {}x{}@{} (antialias={})",
            display.width,
            display.height,
            format.bits_per_pixel(),
            display.antialias
        );
        Ok(Self {
            tree: OverlayTree::new(root),
            fonts,
            blitter: GlyphBlitter::new(),
            images: Box::new(PngDecoder),
            mailbox,
            streamer: Some(streamer),
            commands: Some(Box::new(source)),
            initial_resize_pending: true,
            window: WindowHandle::default(),
        })
    }

    pub fn set_image_decoder(&mut self, decoder: Box<dyn ImageDecoder>) {
        self.images = decoder;
    }

    pub fn tree(&self) -> &OverlayTree {
        &self.tree
    }

    pub fn canvas(&self, surface: SurfaceId) -> Result<&Canvas, CanvasError> {
        self.tree.canvas(surface)
    }

    pub fn root_size(&self) -> (u32, u32) {
        (self.tree.root().width(), self.tree.root().height())
    }

    pub fn frames_published(&self) -> u64 {
        self.mailbox.published()
    }

    pub fn platform_window_handle(&mut self) -> &mut WindowHandle {
        &mut self.window
    }

    // --- Graphics contexts ---

    pub fn new_gc(&self) -> GraphicsContext {
        GraphicsContext::new()
    }

    /// Accepted and ignored.
    pub fn background_gc(&mut self, gc: &GraphicsContext) {
        debug!("Backend: background_gc {:?} ignored", gc.background());
    }

    // --- Overlays ---

    /// Returns `Ok(None)` when every overlay slot is taken.
    pub fn create_overlay(
        &mut self,
        parent: SurfaceId,
        position: Point,
        width: u32,
        height: u32,
    ) -> Result<Option<OverlayId>, CanvasError> {
        self.tree.create(parent, position, width, height)
    }

    pub fn destroy_overlay(&mut self, id: OverlayId) -> Result<(), CanvasError> {
        self.tree.destroy(id)
    }

    pub fn set_overlay_enabled(
        &mut self,
        surface: SurfaceId,
        enabled: bool,
    ) -> Result<(), CanvasError> {
        self.tree.set_enabled(surface, enabled)
    }

    /// Toggles `surface`'s enabled flag and ends a root frame right away.
    pub fn overlay_disable(&mut self, surface: SurfaceId, disable: bool) -> Result<(), CanvasError> {
        self.tree.set_enabled(surface, !disable)?;
        self.draw_mode(SurfaceId::Root, DrawMode::End)
    }

    /// Moves an overlay. The root has no position and ignores this.
    pub fn drag(&mut self, surface: SurfaceId, position: Point) -> Result<(), CanvasError> {
        match surface {
            SurfaceId::Root => Ok(()),
            SurfaceId::Overlay(id) => self.tree.set_position(id, position),
        }
    }

    // --- Frame handoff ---

    /// Advances the draw-mode state machine.
    ///
    /// On the root this first waits until the transport has consumed the
    /// previous frame; `End` then composites and publishes a new one.
    pub fn draw_mode(&mut self, surface: SurfaceId, mode: DrawMode) -> Result<(), CanvasError> {
        if surface == SurfaceId::Root {
            self.mailbox.wait_consumed();
        }
        trace!("Backend: draw_mode {:?} on {:?}", mode, surface);
        if self.tree.set_draw_mode(surface, mode)? && !self.mailbox.publish(self.tree.root()) {
            debug!("Backend: transport stopped, frame dropped");
        }
        Ok(())
    }

    // --- Drawing ---

    /// Canvas to draw on, or `None` when drawing there would be invisible.
    fn drawable(&mut self, surface: SurfaceId) -> Result<Option<&mut Canvas>, CanvasError> {
        let visible = self.tree.is_visible(surface);
        let canvas = self.tree.canvas_mut(surface)?;
        Ok(visible.then_some(canvas))
    }

    /// Fills a rectangle; `w` and `h` are clamped to the canvas size.
    pub fn draw_rectangle(
        &mut self,
        surface: SurfaceId,
        gc: &GraphicsContext,
        origin: Point,
        w: u32,
        h: u32,
    ) -> Result<(), CanvasError> {
        let Some(canvas) = self.drawable(surface)? else {
            return Ok(());
        };
        let w = w.min(canvas.width());
        let h = h.min(canvas.height());
        rasterizer::fill_rect(canvas, origin, w, h, gc.foreground());
        Ok(())
    }

    /// Filled circle. On overlays the radius is halved.
    pub fn draw_circle(
        &mut self,
        surface: SurfaceId,
        gc: &GraphicsContext,
        center: Point,
        radius: i32,
    ) -> Result<(), CanvasError> {
        let Some(canvas) = self.drawable(surface)? else {
            return Ok(());
        };
        circle(canvas, surface, center, radius, gc);
        Ok(())
    }

    pub fn draw_polygon(
        &mut self,
        surface: SurfaceId,
        gc: &GraphicsContext,
        points: &[Point],
    ) -> Result<(), CanvasError> {
        let Some(canvas) = self.drawable(surface)? else {
            return Ok(());
        };
        polygon(canvas, points, gc);
        Ok(())
    }

    /// Strokes the polyline through `points` at the context's line width.
    pub fn draw_lines(
        &mut self,
        surface: SurfaceId,
        gc: &GraphicsContext,
        points: &[Point],
    ) -> Result<(), CanvasError> {
        let Some(canvas) = self.drawable(surface)? else {
            return Ok(());
        };
        for op in rasterizer::stroke::plan_polyline(points, gc.line_width()) {
            match op {
                StrokeOp::Line(a, b) if canvas.antialias() => {
                    rasterizer::line_aa(canvas, a, b, gc.foreground())
                }
                StrokeOp::Line(a, b) => rasterizer::line(canvas, a, b, gc.foreground()),
                StrokeOp::Quad(quad) => polygon(canvas, &quad, gc),
                // Caps share the circle path, overlay halving included.
                StrokeOp::Cap { center, radius } => circle(canvas, surface, center, radius, gc),
            }
        }
        Ok(())
    }

    /// Draws `text` with its pen origin at `origin` along direction `(dx, dy)`.
    ///
    /// With `bg`, each glyph sits on an opaque box painted in `bg`'s
    /// foreground color.
    #[allow(clippy::too_many_arguments)]
    pub fn draw_text(
        &mut self,
        surface: SurfaceId,
        fg: &GraphicsContext,
        bg: Option<&GraphicsContext>,
        font: &F::Font,
        text: &str,
        origin: Point,
        dx: i32,
        dy: i32,
    ) -> Result<(), CanvasError> {
        let visible = self.tree.is_visible(surface);
        let canvas = self.tree.canvas_mut(surface)?;
        if !visible {
            return Ok(());
        }
        let run = self.fonts.shape_text(font, text, dx, dy);
        trace!("Backend: draw_text {:?} ({} glyphs)", text, run.glyphs.len());
        self.blitter.draw_run(
            canvas,
            &self.fonts,
            &run,
            fg.foreground(),
            bg.map(GraphicsContext::foreground),
            origin,
        );
        Ok(())
    }

    /// Composites `image` with its top-left corner at `origin`.
    pub fn draw_image(
        &mut self,
        surface: SurfaceId,
        origin: Point,
        image: &Image,
    ) -> Result<(), CanvasError> {
        let Some(canvas) = self.drawable(surface)? else {
            return Ok(());
        };
        canvas.composite_rgba(
            image.pixels(),
            image.width(),
            image.height(),
            image.stride(),
            origin.x,
            origin.y,
        );
        Ok(())
    }

    // --- Fonts and images ---

    pub fn new_font(&mut self, name: &str, size: u32, flags: FontFlags) -> Result<F::Font> {
        self.fonts.new_font(name, size, flags)
    }

    pub fn text_bbox(&self, font: &F::Font, text: &str, dx: i32, dy: i32) -> [Point; 4] {
        self.fonts.text_bbox(font, text, dx, dy)
    }

    pub fn load_image(&self, path: &Path) -> Result<Image> {
        self.images.load(path)
    }

    // --- Input ---

    /// Drains the control stream and returns what the host must react to.
    ///
    /// The first call also reports the initial root size.
    pub fn poll_input(&mut self) -> Vec<HostEvent> {
        let mut events = Vec::new();
        if self.initial_resize_pending {
            self.initial_resize_pending = false;
            let (width, height) = self.root_size();
            events.push(HostEvent::Resized { width, height });
        }

        let lines = match self.commands.as_mut() {
            Some(source) => source.poll_lines(),
            None => return events,
        };
        for line in lines {
            let Some(command) = ControlCommand::parse(&line) else {
                continue;
            };
            debug!("Backend: control command {:?}", command);
            if let Some(event) = self.apply(command) {
                events.push(event);
            }
            if matches!(events.last(), Some(HostEvent::Quit)) {
                break;
            }
        }
        events
    }

    fn apply(&mut self, command: ControlCommand) -> Option<HostEvent> {
        match command {
            ControlCommand::Resize { width, height } => {
                match self.tree.resize_root(width, height) {
                    Ok(()) => Some(HostEvent::Resized { width, height }),
                    Err(e) => {
                        error!("Backend: {}", e);
                        Some(HostEvent::ResizeFailed { width, height })
                    }
                }
            }
            ControlCommand::Quit => {
                info!("Backend: quit requested");
                Some(HostEvent::Quit)
            }
            ControlCommand::Press(point) => Some(HostEvent::PointerButton {
                pressed: true,
                button: PRIMARY_BUTTON,
                point,
            }),
            ControlCommand::Release(point) => Some(HostEvent::PointerButton {
                pressed: false,
                button: PRIMARY_BUTTON,
                point,
            }),
            ControlCommand::Move(point) => Some(HostEvent::PointerMoved(point)),
            ControlCommand::Key(key) => Some(HostEvent::KeyPressed(key)),
        }
    }

    // --- Teardown ---

    /// Destroys overlays, stops the transport thread and removes both pipes.
    ///
    /// Blocks for at most one transport poll interval unless a frame write
    /// is in progress. Safe to call more than once.
    pub fn teardown(&mut self) {
        if self.streamer.is_none() && self.commands.is_none() {
            return;
        }
        self.tree.destroy_all();
        if let Some(mut streamer) = self.streamer.take() {
            streamer.shutdown();
        }
        self.commands = None;
        info!("Backend: torn down");
    }
}

impl<F: FontProvider> Drop for Backend<F> {
    fn drop(&mut self) {
        self.teardown();
    }
}

fn circle(canvas: &mut Canvas, surface: SurfaceId, center: Point, radius: i32, gc: &GraphicsContext) {
    let radius = match surface {
        SurfaceId::Root => radius,
        SurfaceId::Overlay(_) => radius / 2,
    };
    if canvas.antialias() {
        rasterizer::fill_circle_aa(canvas, center, radius, gc.foreground());
    } else {
        rasterizer::fill_circle(canvas, center, radius, gc.foreground());
    }
}

fn polygon(canvas: &mut Canvas, points: &[Point], gc: &GraphicsContext) {
    if canvas.antialias() {
        rasterizer::fill_polygon_aa(canvas, points, gc.foreground());
    } else {
        rasterizer::fill_polygon(canvas, points, gc.foreground());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::{Color16, Rgba};
    use crate::host::NavKey;
    use crate::text::HeadlessFontProvider;
    use crate::transport::Frame;
    use std::collections::VecDeque;
    use std::sync::atomic::AtomicBool;
    use std::sync::Mutex;

    #[derive(Clone, Default)]
    struct RecordingSink {
        frames: Arc<Mutex<Vec<Frame>>>,
    }

    impl FrameSink for RecordingSink {
        fn send_frame(&mut self, frame: &Frame, _shutdown: &AtomicBool) {
            self.frames.lock().unwrap().push(frame.clone());
        }
    }

    #[derive(Clone, Default)]
    struct ScriptedSource {
        lines: Arc<Mutex<VecDeque<String>>>,
    }

    impl ScriptedSource {
        fn push(&self, line: &str) {
            self.lines.lock().unwrap().push_back(line.to_string());
        }
    }

    impl CommandSource for ScriptedSource {
        fn poll_lines(&mut self) -> Vec<String> {
            self.lines.lock().unwrap().drain(..).collect()
        }
    }

    struct Harness {
        backend: Backend<HeadlessFontProvider>,
        sink: RecordingSink,
        source: ScriptedSource,
    }

    fn harness(width: u32, height: u32, antialias: bool) -> Harness {
        let mut config = Config::default();
        config.display.width = width;
        config.display.height = height;
        config.display.antialias = antialias;
        config.timing.frame_poll_interval_ms = 1;
        let sink = RecordingSink::default();
        let source = ScriptedSource::default();
        let backend = Backend::with_transport(
            &config,
            HeadlessFontProvider::new(),
            sink.clone(),
            source.clone(),
        )
        .unwrap();
        Harness {
            backend,
            sink,
            source,
        }
    }

    fn gc(r: u16, g: u16, b: u16) -> GraphicsContext {
        let mut gc = GraphicsContext::new();
        gc.set_foreground(Color16::new(r, g, b, 0xffff));
        gc
    }

    fn frame(b: &mut Backend<HeadlessFontProvider>) {
        b.draw_mode(SurfaceId::Root, DrawMode::Begin).unwrap();
        b.draw_mode(SurfaceId::Root, DrawMode::End).unwrap();
    }

    #[test_log::test]
    fn test_each_root_end_publishes_one_frame() {
        let mut h = harness(8, 8, false);
        for _ in 0..4 {
            frame(&mut h.backend);
        }
        assert_eq!(h.backend.frames_published(), 4);
        // Begin waits for the last frame to be consumed.
        h.backend
            .draw_mode(SurfaceId::Root, DrawMode::Begin)
            .unwrap();
        h.backend.teardown();
        let frames = h.sink.frames.lock().unwrap();
        assert_eq!(frames.len(), 4);
        assert!(frames.iter().all(|f| f.pixels.len() == 8 * 8 * 4));
    }

    #[test_log::test]
    fn test_overlay_end_publishes_nothing() {
        let mut h = harness(8, 8, false);
        let ov = h
            .backend
            .create_overlay(SurfaceId::Root, Point::default(), 2, 2)
            .unwrap()
            .unwrap();
        h.backend
            .draw_mode(SurfaceId::Overlay(ov), DrawMode::End)
            .unwrap();
        assert_eq!(h.backend.frames_published(), 0);
    }

    #[test_log::test]
    fn test_disabled_overlay_never_touches_root() {
        let mut h = harness(8, 8, false);
        let ov = h
            .backend
            .create_overlay(SurfaceId::Root, Point::default(), 8, 8)
            .unwrap()
            .unwrap();
        let white = gc(0xffff, 0xffff, 0xffff);
        h.backend
            .set_overlay_enabled(SurfaceId::Overlay(ov), false)
            .unwrap();
        h.backend
            .draw_rectangle(SurfaceId::Overlay(ov), &white, Point::default(), 8, 8)
            .unwrap();

        // Nothing was rasterized into the hidden overlay either.
        let overlay = h.backend.canvas(SurfaceId::Overlay(ov)).unwrap();
        assert!(overlay.pixels().iter().all(|&b| b == 0));

        frame(&mut h.backend);
        let root = h.backend.canvas(SurfaceId::Root).unwrap();
        assert!(root.pixels().iter().all(|&b| b == 0));
    }

    #[test_log::test]
    fn test_global_disable_blocks_overlay_drawing() {
        let mut h = harness(8, 8, false);
        let ov = h
            .backend
            .create_overlay(SurfaceId::Root, Point::default(), 8, 8)
            .unwrap()
            .unwrap();
        h.backend.set_overlay_enabled(SurfaceId::Root, false).unwrap();
        h.backend
            .draw_rectangle(
                SurfaceId::Overlay(ov),
                &gc(0xffff, 0, 0),
                Point::default(),
                4,
                4,
            )
            .unwrap();
        let overlay = h.backend.canvas(SurfaceId::Overlay(ov)).unwrap();
        assert!(overlay.pixels().iter().all(|&b| b == 0));
    }

    #[test_log::test]
    fn test_enabled_overlay_is_composited_at_resolved_position() {
        let mut h = harness(16, 16, false);
        let ov = h
            .backend
            .create_overlay(SurfaceId::Root, Point::new(-4, -4), 4, 4)
            .unwrap()
            .unwrap();
        let red = gc(0xffff, 0, 0);
        h.backend
            .draw_rectangle(SurfaceId::Overlay(ov), &red, Point::default(), 4, 4)
            .unwrap();
        frame(&mut h.backend);
        let root = h.backend.canvas(SurfaceId::Root).unwrap();
        assert_eq!(root.rgba_at(12, 12), Some(Rgba::opaque(255, 0, 0)));
        assert_eq!(root.rgba_at(11, 11), Some(Rgba::TRANSPARENT));
    }

    #[test_log::test]
    fn test_overlay_disable_forces_a_frame() {
        let mut h = harness(8, 8, false);
        let ov = h
            .backend
            .create_overlay(SurfaceId::Root, Point::default(), 2, 2)
            .unwrap()
            .unwrap();
        h.backend
            .overlay_disable(SurfaceId::Overlay(ov), true)
            .unwrap();
        assert_eq!(h.backend.frames_published(), 1);
        assert!(!h.backend.tree().is_visible(SurfaceId::Overlay(ov)));
    }

    #[test_log::test]
    fn test_drag_moves_overlay() {
        let mut h = harness(8, 8, false);
        let ov = h
            .backend
            .create_overlay(SurfaceId::Root, Point::default(), 2, 2)
            .unwrap()
            .unwrap();
        h.backend
            .drag(SurfaceId::Overlay(ov), Point::new(-3, 1))
            .unwrap();
        assert_eq!(
            h.backend.tree().resolve_position(ov).unwrap(),
            Point::new(5, 1)
        );
    }

    #[test_log::test]
    fn test_rectangle_size_is_clamped_to_canvas() {
        let mut h = harness(4, 4, false);
        let white = gc(0xffff, 0xffff, 0xffff);
        h.backend
            .draw_rectangle(SurfaceId::Root, &white, Point::new(2, 0), 100, 1)
            .unwrap();
        let root = h.backend.canvas(SurfaceId::Root).unwrap();
        assert_eq!(root.rgba_at(3, 0), Some(Rgba::WHITE));
        assert_eq!(root.rgba_at(1, 0), Some(Rgba::TRANSPARENT));
    }

    #[test_log::test]
    fn test_overlay_circle_radius_is_halved() {
        let mut h = harness(32, 32, false);
        let ov = h
            .backend
            .create_overlay(SurfaceId::Root, Point::default(), 32, 32)
            .unwrap()
            .unwrap();
        let white = gc(0xffff, 0xffff, 0xffff);
        h.backend
            .draw_circle(SurfaceId::Root, &white, Point::new(16, 16), 8)
            .unwrap();
        h.backend
            .draw_circle(SurfaceId::Overlay(ov), &white, Point::new(16, 16), 8)
            .unwrap();

        let root = h.backend.canvas(SurfaceId::Root).unwrap();
        assert_eq!(root.rgba_at(23, 16), Some(Rgba::WHITE));
        let overlay = h.backend.canvas(SurfaceId::Overlay(ov)).unwrap();
        assert_eq!(overlay.rgba_at(20, 16), Some(Rgba::WHITE));
        assert_eq!(overlay.rgba_at(21, 16), Some(Rgba::TRANSPARENT));
    }

    #[test_log::test]
    fn test_wide_vertical_line_is_stroked() {
        let mut h = harness(40, 60, false);
        let mut pen = gc(0, 0xffff, 0);
        pen.set_line_width(6);
        h.backend
            .draw_lines(
                SurfaceId::Root,
                &pen,
                &[Point::new(20, 10), Point::new(20, 50)],
            )
            .unwrap();
        let root = h.backend.canvas(SurfaceId::Root).unwrap();
        let green = Some(Rgba::opaque(0, 255, 0));
        assert_eq!(root.rgba_at(17, 30), green);
        assert_eq!(root.rgba_at(22, 30), green);
        assert_eq!(root.rgba_at(14, 30), Some(Rgba::TRANSPARENT));
        // Round cap extends past the end point.
        assert_eq!(root.rgba_at(20, 52), green);
    }

    #[test_log::test]
    fn test_text_draws_glyph_boxes() {
        let mut h = harness(64, 32, false);
        let font = h
            .backend
            .new_font("sans", 10, FontFlags::empty())
            .unwrap();
        let white = gc(0xffff, 0xffff, 0xffff);
        h.backend
            .draw_text(
                SurfaceId::Root,
                &white,
                None,
                &font,
                "ab",
                Point::new(2, 20),
                0x10000,
                0,
            )
            .unwrap();
        let root = h.backend.canvas(SurfaceId::Root).unwrap();
        // First glyph spans rows 10..20 from x=2; its top-left is outline.
        assert_eq!(root.rgba_at(2, 10), Some(Rgba::WHITE));
        assert_eq!(root.rgba_at(2, 20), Some(Rgba::TRANSPARENT));
        let bbox = h.backend.text_bbox(&font, "ab", 0x10000, 0);
        assert_eq!(bbox[2], Point::new(12, -10));
    }

    #[test_log::test]
    fn test_wide_antialiased_line_has_soft_caps() {
        let mut h = harness(40, 60, true);
        let mut pen = gc(0, 0xffff, 0);
        pen.set_line_width(6);
        h.backend
            .draw_lines(
                SurfaceId::Root,
                &pen,
                &[Point::new(20, 10), Point::new(20, 50)],
            )
            .unwrap();
        let root = h.backend.canvas(SurfaceId::Root).unwrap();
        let green = Some(Rgba::opaque(0, 255, 0));
        assert_eq!(root.rgba_at(17, 30), green);
        // The antialiased outline includes the quad's closing column.
        assert_eq!(root.rgba_at(23, 30), green);
        assert_eq!(root.rgba_at(24, 30), Some(Rgba::TRANSPARENT));
        assert_eq!(root.rgba_at(14, 30), Some(Rgba::TRANSPARENT));
        let rim = root.rgba_at(20, 53).unwrap();
        assert!(rim.a > 0 && rim.a < 255, "cap rim alpha was {}", rim.a);
    }

    #[test_log::test]
    fn test_text_box_uses_background_context_foreground() {
        let mut h = harness(32, 32, false);
        let blue = gc(0, 0, 0xffff);
        h.backend
            .draw_rectangle(SurfaceId::Root, &blue, Point::default(), 32, 32)
            .unwrap();
        let font = h
            .backend
            .new_font("sans", 10, FontFlags::empty())
            .unwrap();
        let red = gc(0xffff, 0, 0);
        // Only the foreground is set, as hosts do for background contexts.
        let green = gc(0, 0xffff, 0);
        h.backend
            .draw_text(
                SurfaceId::Root,
                &red,
                Some(&green),
                &font,
                "a",
                Point::new(2, 20),
                0x10000,
                0,
            )
            .unwrap();

        let root = h.backend.canvas(SurfaceId::Root).unwrap();
        // Halo right of the 5x10 glyph at (2,10), and the glyph's interior.
        assert_eq!(root.rgba_at(8, 15), Some(Rgba::opaque(0, 255, 0)));
        assert_eq!(root.rgba_at(4, 15), Some(Rgba::opaque(0, 255, 0)));
        assert_eq!(root.rgba_at(2, 15), Some(Rgba::opaque(255, 0, 0)));
        assert_eq!(root.rgba_at(20, 5), Some(Rgba::opaque(0, 0, 255)));
        assert!(root.pixels().chunks_exact(4).all(|px| px[3] == 255));
    }

    #[test_log::test]
    fn test_white_text_on_black_box_is_swapped() {
        let mut h = harness(32, 32, false);
        let font = h
            .backend
            .new_font("sans", 10, FontFlags::empty())
            .unwrap();
        let white = gc(0xffff, 0xffff, 0xffff);
        let black = gc(0, 0, 0);
        h.backend
            .draw_text(
                SurfaceId::Root,
                &white,
                Some(&black),
                &font,
                "a",
                Point::new(2, 20),
                0x10000,
                0,
            )
            .unwrap();
        let root = h.backend.canvas(SurfaceId::Root).unwrap();
        assert_eq!(root.rgba_at(2, 15), Some(Rgba::BLACK));
        assert_eq!(root.rgba_at(8, 15), Some(Rgba::WHITE));
    }

    #[test_log::test]
    fn test_draw_image_blends_over_canvas() {
        let mut h = harness(4, 4, false);
        let img = Image::from_rgba(1, 1, vec![255, 0, 0, 128]).unwrap();
        let black = gc(0, 0, 0);
        h.backend
            .draw_rectangle(SurfaceId::Root, &black, Point::default(), 4, 4)
            .unwrap();
        h.backend
            .draw_image(SurfaceId::Root, Point::new(1, 1), &img)
            .unwrap();
        let root = h.backend.canvas(SurfaceId::Root).unwrap();
        assert_eq!(root.rgba_at(1, 1), Some(Rgba::new(128, 0, 0, 255)));
    }

    #[test_log::test]
    fn test_first_poll_reports_initial_size() {
        let mut h = harness(400, 400, true);
        assert_eq!(
            h.backend.poll_input(),
            vec![HostEvent::Resized {
                width: 400,
                height: 400
            }]
        );
        assert!(h.backend.poll_input().is_empty());
    }

    #[test_log::test]
    fn test_resize_command_reallocates_root() {
        let mut h = harness(400, 400, true);
        h.backend.poll_input();
        h.source.push("resize=200x300");
        assert_eq!(
            h.backend.poll_input(),
            vec![HostEvent::Resized {
                width: 200,
                height: 300
            }]
        );
        assert_eq!(h.backend.root_size(), (200, 300));
    }

    #[test_log::test]
    fn test_failed_resize_is_reported() {
        let mut h = harness(8, 8, true);
        h.backend.poll_input();
        h.source.push("resize=0x10");
        assert_eq!(
            h.backend.poll_input(),
            vec![HostEvent::ResizeFailed {
                width: 0,
                height: 10
            }]
        );
        assert_eq!(h.backend.root_size(), (8, 8));
    }

    #[test_log::test]
    fn test_pointer_and_key_events_keep_order() {
        let mut h = harness(8, 8, true);
        h.backend.poll_input();
        for line in ["press=10-20", "bogus", "move=11-21", "release=10-20", "left"] {
            h.source.push(line);
        }
        assert_eq!(
            h.backend.poll_input(),
            vec![
                HostEvent::PointerButton {
                    pressed: true,
                    button: 1,
                    point: Point::new(10, 20)
                },
                HostEvent::PointerMoved(Point::new(11, 21)),
                HostEvent::PointerButton {
                    pressed: false,
                    button: 1,
                    point: Point::new(10, 20)
                },
                HostEvent::KeyPressed(NavKey::Left),
            ]
        );
    }

    #[test_log::test]
    fn test_quit_stops_processing_the_batch() {
        let mut h = harness(8, 8, true);
        h.backend.poll_input();
        h.source.push("quit");
        h.source.push("up");
        assert_eq!(h.backend.poll_input(), vec![HostEvent::Quit]);
    }

    #[test_log::test]
    fn test_stale_overlay_handle_is_an_error() {
        let mut h = harness(8, 8, true);
        let ov = h
            .backend
            .create_overlay(SurfaceId::Root, Point::default(), 2, 2)
            .unwrap()
            .unwrap();
        h.backend.destroy_overlay(ov).unwrap();
        assert_eq!(
            h.backend
                .draw_polygon(SurfaceId::Overlay(ov), &gc(0, 0, 0), &[Point::default(); 3]),
            Err(CanvasError::NoSuchSurface)
        );
    }

    #[test_log::test]
    fn test_teardown_destroys_overlays_and_is_idempotent() {
        let mut h = harness(8, 8, true);
        h.backend
            .create_overlay(SurfaceId::Root, Point::default(), 2, 2)
            .unwrap();
        h.backend.teardown();
        assert_eq!(h.backend.tree().overlay_count(), 0);
        h.backend.teardown();
        // Publishing after teardown is dropped without blocking.
        frame(&mut h.backend);
        assert_eq!(h.backend.frames_published(), 0);
    }

    #[test_log::test]
    fn test_window_handle_accepts_fullscreen() {
        let mut h = harness(8, 8, true);
        let window = h.backend.platform_window_handle();
        assert!(window.set_fullscreen(true));
        assert!(window.is_fullscreen());
    }
}
