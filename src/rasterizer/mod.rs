// src/rasterizer/mod.rs

//! Software rasterization of vector primitives into a `Canvas`.
//!
//! Every primitive comes in an aliased and an antialiased flavour. Interior
//! pixels are always an opaque overwrite with the packed foreground value;
//! only the antialiased edge fringe is blended with coverage-scaled alpha.
//!
//! ```text
//! fill_rect / fill_polygon / line / fill_circle          (aliased)
//! fill_polygon_aa / line_aa / fill_circle_aa             (edge-blended)
//! stroke::plan_polyline -> [Line | Quad | Cap]           (width-aware lines)
//! ```

pub mod stroke;

use crate::canvas::{Canvas, Point};
use crate::color::Rgba;
use log::trace;

/// Fills a `w`×`h` rectangle with its top-left at `origin`.
pub fn fill_rect(canvas: &mut Canvas, origin: Point, w: u32, h: u32, color: Rgba) {
    let value = canvas.map_rgba(color);
    canvas.fill_rect(origin.x, origin.y, w, h, value);
}

/// Scan-fills the closed polygon through `points` (last point joins the first).
///
/// A pixel is inside when its center lies inside the polygon (even-odd rule),
/// so a polygon spanning `[x0, x1)` covers exactly `x1 - x0` columns.
pub fn fill_polygon(canvas: &mut Canvas, points: &[Point], color: Rgba) {
    if points.len() < 3 {
        return;
    }
    let value = canvas.map_rgba(color);

    let min_y = points.iter().map(|p| p.y).min().unwrap_or(0).max(0);
    let max_y = points
        .iter()
        .map(|p| p.y)
        .max()
        .unwrap_or(0)
        .min(canvas.height() as i32 - 1);

    // Reused across scanlines
    let mut crossings: Vec<f32> = Vec::with_capacity(points.len());
    let n = points.len();

    for y in min_y..=max_y {
        crossings.clear();
        let yc = y as f32 + 0.5;

        for i in 0..n {
            let a = points[i];
            let b = points[(i + 1) % n];
            let (ay, by) = (a.y as f32, b.y as f32);
            if (ay <= yc && by > yc) || (by <= yc && ay > yc) {
                let t = (yc - ay) / (by - ay);
                crossings.push(a.x as f32 + t * (b.x - a.x) as f32);
            }
        }

        crossings.sort_unstable_by(|a, b| a.total_cmp(b));
        for pair in crossings.chunks_exact(2) {
            let start = (pair[0] - 0.5).ceil() as i32;
            let end = (pair[1] - 0.5).ceil() as i32 - 1;
            if start <= end {
                canvas.hline(start, end, y, value);
            }
        }
    }
}

/// `fill_polygon` plus an antialiased outline through the vertices.
///
/// The outline includes its end pixels, so the result reaches one pixel
/// further right and down than `fill_polygon`: the square `(2,2)..(6,6)`
/// covers columns and rows 2 through 6.
pub fn fill_polygon_aa(canvas: &mut Canvas, points: &[Point], color: Rgba) {
    fill_polygon(canvas, points, color);
    if points.len() < 2 {
        return;
    }
    for i in 0..points.len() {
        let a = points[i];
        let b = points[(i + 1) % points.len()];
        line_aa(canvas, a, b, color);
    }
}

/// True when the segment lies entirely to one side of the canvas.
fn trivially_outside(canvas: &Canvas, a: Point, b: Point) -> bool {
    let (w, h) = (canvas.width() as i32, canvas.height() as i32);
    (a.x < 0 && b.x < 0) || (a.y < 0 && b.y < 0) || (a.x >= w && b.x >= w) || (a.y >= h && b.y >= h)
}

/// One-pixel Bresenham line, both endpoints inclusive.
pub fn line(canvas: &mut Canvas, from: Point, to: Point, color: Rgba) {
    if trivially_outside(canvas, from, to) {
        return;
    }
    let value = canvas.map_rgba(color);
    let (w, h) = (canvas.width() as i32, canvas.height() as i32);

    // Deltas of far-apart endpoints overflow i32.
    let dx = (to.x as i64 - from.x as i64).abs();
    let dy = -(to.y as i64 - from.y as i64).abs();
    let sx = if from.x < to.x { 1 } else { -1 };
    let sy = if from.y < to.y { 1 } else { -1 };
    let mut err = dx + dy;
    let (mut x, mut y) = (from.x, from.y);

    loop {
        canvas.put_pixel(x, y, value);
        if x == to.x && y == to.y {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
        // The walk is monotone; once past the far side nothing more is visible.
        if (sx > 0 && x >= w) || (sx < 0 && x < 0) || (sy > 0 && y >= h) || (sy < 0 && y < 0) {
            break;
        }
    }
}

/// Xiaolin Wu antialiased line; every pixel is blended with its coverage.
pub fn line_aa(canvas: &mut Canvas, from: Point, to: Point, color: Rgba) {
    if trivially_outside(canvas, from, to) {
        return;
    }
    if from == to {
        canvas.blend_pixel(from.x, from.y, color);
        return;
    }

    let (mut x0, mut y0) = (from.x as f32, from.y as f32);
    let (mut x1, mut y1) = (to.x as f32, to.y as f32);
    let steep = (y1 - y0).abs() > (x1 - x0).abs();
    if steep {
        std::mem::swap(&mut x0, &mut y0);
        std::mem::swap(&mut x1, &mut y1);
    }
    if x0 > x1 {
        std::mem::swap(&mut x0, &mut x1);
        std::mem::swap(&mut y0, &mut y1);
    }

    let gradient = (y1 - y0) / (x1 - x0);
    let limit = (if steep { canvas.height() } else { canvas.width() }) as i32;
    let mut plot = |major: i32, minor: i32, coverage: f32| {
        let c = color.with_coverage(coverage);
        if steep {
            canvas.blend_pixel(minor, major, c);
        } else {
            canvas.blend_pixel(major, minor, c);
        }
    };

    // Integer endpoints: the endpoint pixels sit exactly on the line.
    let first = (x0 as i32).max(0);
    let last = (x1 as i32).min(limit - 1);
    let mut intery = y0 + gradient * (first as f32 - x0);
    for x in first..=last {
        let ipart = intery.floor();
        let fpart = intery - ipart;
        plot(x, ipart as i32, 1.0 - fpart);
        if fpart > 0.0 {
            plot(x, ipart as i32 + 1, fpart);
        }
        intery += gradient;
    }
}

/// Solid filled circle built from horizontal spans (midpoint algorithm).
pub fn fill_circle(canvas: &mut Canvas, center: Point, radius: i32, color: Rgba) {
    if radius < 0 {
        return;
    }
    let value = canvas.map_rgba(color);
    if radius == 0 {
        canvas.put_pixel(center.x, center.y, value);
        return;
    }

    let (cx, cy) = (center.x, center.y);
    let mut x = radius;
    let mut y = 0;
    let mut err = 1 - radius;

    while x >= y {
        canvas.hline(cx - x, cx + x, cy + y, value);
        if y != 0 {
            canvas.hline(cx - x, cx + x, cy - y, value);
        }
        if x != y {
            canvas.hline(cx - y, cx + y, cy + x, value);
            if y != 0 {
                canvas.hline(cx - y, cx + y, cy - x, value);
            }
        }

        y += 1;
        if err < 0 {
            err += 2 * y + 1;
        } else {
            x -= 1;
            err += 2 * (y - x) + 1;
        }
    }
}

/// Filled circle whose rim pixels are blended by their distance to the edge.
pub fn fill_circle_aa(canvas: &mut Canvas, center: Point, radius: i32, color: Rgba) {
    if radius < 0 {
        return;
    }
    let value = canvas.map_rgba(color);
    let r = radius as f32;
    let reach = radius + 1;

    let y_lo = (center.y - reach).max(0);
    let y_hi = (center.y + reach).min(canvas.height() as i32 - 1);
    let x_lo = (center.x - reach).max(0);
    let x_hi = (center.x + reach).min(canvas.width() as i32 - 1);

    trace!(
        "rasterizer: fill_circle_aa at ({}, {}) r={}",
        center.x,
        center.y,
        radius
    );

    for y in y_lo..=y_hi {
        let dy = (y - center.y) as f32;
        for x in x_lo..=x_hi {
            let dx = (x - center.x) as f32;
            let coverage = r + 0.5 - (dx * dx + dy * dy).sqrt();
            if coverage >= 1.0 {
                canvas.put_pixel(x, y, value);
            } else if coverage > 0.0 {
                canvas.blend_pixel(x, y, color.with_coverage(coverage));
            }
        }
    }
}
