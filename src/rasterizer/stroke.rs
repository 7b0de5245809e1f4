// src/rasterizer/stroke.rs

//! Width-aware stroking of polylines.
//!
//! A segment wider than one pixel becomes a quadrilateral straddling the
//! segment, offset perpendicular to it by half the line width. Lines wider
//! than two pixels also get round caps: a filled circle at every segment's
//! end point and, for the first segment only, at its start point.

use crate::canvas::Point;
use std::f64::consts::FRAC_PI_2;

/// One primitive produced by stroking a polyline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrokeOp {
    /// One-pixel line between two points.
    Line(Point, Point),
    /// Quadrilateral to scan-fill.
    Quad([Point; 4]),
    /// Filled circle used as a round cap or join.
    Cap { center: Point, radius: i32 },
}

/// Half-width offset perpendicular to the segment `from -> to`, sign-adjusted
/// for the segment's direction of travel.
fn perpendicular_offset(from: Point, to: Point, line_width: u32) -> (i32, i32) {
    let dx = (to.x - from.x) as f64;
    let dy = (to.y - from.y) as f64;
    let half = line_width as f64 / 2.0;

    let (mut x_adj, mut y_adj) = if dy == 0.0 {
        (0, half.round() as i32)
    } else if dx == 0.0 {
        (half.round() as i32, 0)
    } else {
        let angle = FRAC_PI_2 - (dx.abs() / dy.abs()).atan();
        (
            (angle.sin() * half).round() as i32,
            (angle.cos() * half).round() as i32,
        )
    };

    if to.x > from.x {
        x_adj = -x_adj;
    }
    if to.y > from.y {
        y_adj = -y_adj;
    }
    (x_adj, y_adj)
}

/// Quadrilateral covering the segment stroked at `line_width`.
pub fn segment_quad(from: Point, to: Point, line_width: u32) -> [Point; 4] {
    let (xa, ya) = perpendicular_offset(from, to, line_width);
    [
        Point::new(from.x + xa, from.y - ya),
        Point::new(from.x - xa, from.y + ya),
        Point::new(to.x - xa, to.y + ya),
        Point::new(to.x + xa, to.y - ya),
    ]
}

/// Expands a polyline into the primitives that draw it at `line_width`.
pub fn plan_polyline(points: &[Point], line_width: u32) -> Vec<StrokeOp> {
    let mut ops = Vec::with_capacity(points.len().saturating_sub(1) * 3);

    for (i, pair) in points.windows(2).enumerate() {
        let (from, to) = (pair[0], pair[1]);

        if line_width <= 1 {
            ops.push(StrokeOp::Line(from, to));
            continue;
        }

        ops.push(StrokeOp::Quad(segment_quad(from, to, line_width)));

        if line_width > 2 {
            // Truncating division keeps the cap inside the stroke.
            let radius = (line_width / 2) as i32;
            if i == 0 {
                ops.push(StrokeOp::Cap {
                    center: from,
                    radius,
                });
            }
            ops.push(StrokeOp::Cap { center: to, radius });
        }
    }

    ops
}
