// src/main.rs

//! Demo host for the `fifo-canvas` backend.
//!
//! Paints a simple scene (background, a crosshair following the pointer, a
//! compass overlay and a status line), publishes a frame per tick and obeys
//! the control pipe until it receives `quit`.

use anyhow::Context;
use fifo_canvas::color::Color16;
use fifo_canvas::config::CONFIG;
use fifo_canvas::text::headless::HeadlessFont;
use fifo_canvas::text::{FontFlags, HeadlessFontProvider};
use fifo_canvas::{
    Backend, DrawMode, GraphicsContext, HostEvent, NavKey, OverlayId, Point, SurfaceId,
};
use log::{error, info, warn};

struct Scene {
    size: (u32, u32),
    pointer: Point,
    zoom: i32,
    compass: Option<OverlayId>,
    dirty: bool,
}

fn gc(r: u16, g: u16, b: u16) -> GraphicsContext {
    let mut gc = GraphicsContext::new();
    gc.set_foreground(Color16::new(r, g, b, 0xffff));
    gc
}

fn render(
    backend: &mut Backend<HeadlessFontProvider>,
    scene: &Scene,
    font: &HeadlessFont,
) -> anyhow::Result<()> {
    let root = SurfaceId::Root;
    let (w, h) = scene.size;
    let sky = gc(0x2000, 0x4000, 0x8000);
    let mut road = gc(0xffff, 0xc000, 0x0000);
    road.set_line_width(3 + scene.zoom.clamp(0, 8) as u32);
    let white = gc(0xffff, 0xffff, 0xffff);
    let shade = gc(0x1000, 0x1000, 0x1000);

    backend.draw_mode(root, DrawMode::Begin)?;
    backend.draw_rectangle(root, &sky, Point::new(0, 0), w, h)?;
    backend.draw_lines(
        root,
        &road,
        &[
            Point::new(0, h as i32 / 2),
            Point::new(w as i32 / 3, h as i32 / 3),
            Point::new(w as i32, h as i32 / 2),
        ],
    )?;
    let p = scene.pointer;
    backend.draw_lines(root, &white, &[Point::new(p.x - 5, p.y), Point::new(p.x + 5, p.y)])?;
    backend.draw_lines(root, &white, &[Point::new(p.x, p.y - 5), Point::new(p.x, p.y + 5)])?;
    backend.draw_text(
        root,
        &white,
        Some(&shade),
        font,
        &format!("zoom {}", scene.zoom),
        Point::new(4, h as i32 - 4),
        0x10000,
        0,
    )?;

    if let Some(compass) = scene.compass {
        let surface = SurfaceId::Overlay(compass);
        let needle = gc(0xffff, 0, 0);
        backend.draw_circle(surface, &white, Point::new(20, 20), 36)?;
        backend.draw_polygon(
            surface,
            &needle,
            &[Point::new(20, 4), Point::new(25, 20), Point::new(15, 20)],
        )?;
    }
    backend.draw_mode(root, DrawMode::End)?;
    Ok(())
}

fn main() -> anyhow::Result<()> {
    // Default filter is "info" if RUST_LOG is not set.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_micros()
        .init();

    info!("Starting fifo-canvas...");
    let config = &*CONFIG;

    let mut backend = Backend::new(config, HeadlessFontProvider::new())
        .context("Failed to initialize backend")?;
    let font = backend
        .new_font("sans", 12, FontFlags::empty())
        .context("Failed to load font")?;

    let compass = backend
        .create_overlay(SurfaceId::Root, Point::new(-50, 10), 40, 40)
        .context("Failed to create compass overlay")?;
    if compass.is_none() {
        warn!("No overlay slot for the compass");
    }

    let mut scene = Scene {
        size: backend.root_size(),
        pointer: Point::new(0, 0),
        zoom: 0,
        compass,
        dirty: true,
    };

    info!("Starting main loop...");
    'running: loop {
        for event in backend.poll_input() {
            match event {
                HostEvent::Resized { width, height } => {
                    info!("Host: resized to {}x{}", width, height);
                    scene.size = (width, height);
                }
                HostEvent::PointerMoved(p) | HostEvent::PointerButton { point: p, .. } => {
                    scene.pointer = p;
                }
                HostEvent::KeyPressed(key) => {
                    info!("Host: key {:?} (code {:#04x})", key, key.code());
                    match key {
                        NavKey::ZoomIn => scene.zoom += 1,
                        NavKey::ZoomOut => scene.zoom -= 1,
                        _ => {}
                    }
                }
                HostEvent::ResizeFailed { width, height } => {
                    error!("Host: cannot continue after failed resize to {}x{}", width, height);
                    break 'running;
                }
                HostEvent::Quit => {
                    info!("Host: quit requested");
                    break 'running;
                }
            }
            scene.dirty = true;
        }

        if scene.dirty {
            render(&mut backend, &scene, &font)?;
            scene.dirty = false;
        }
        std::thread::sleep(config.timing.input_poll_interval());
    }

    backend.teardown();
    info!("fifo-canvas exited cleanly.");
    Ok(())
}
