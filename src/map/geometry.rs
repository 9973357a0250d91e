use crate::braille::BrailleCanvas;
use std::ops::RangeInclusive;

/// Draw a line using Bresenham's algorithm
pub fn draw_line(canvas: &mut BrailleCanvas, from: (i32, i32), to: (i32, i32)) {
    let (x1, y1) = to;
    let dx = (x1 - from.0).abs();
    let dy = -(y1 - from.1).abs();
    let sx = if from.0 < x1 { 1 } else { -1 };
    let sy = if from.1 < y1 { 1 } else { -1 };
    let mut err = dx + dy;
    let (mut x, mut y) = from;

    loop {
        canvas.set_dot(x, y);
        if x == x1 && y == y1 {
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
    }
}

/// Fill a disc of fractional radius centered on (cx, cy).
/// Sub-dot radii still raise the center dot so tiny symbols stay visible.
/// Only rows and columns inside the canvas are visited, so the cost is
/// bounded by the canvas size whatever the radius.
pub fn fill_disc(canvas: &mut BrailleCanvas, cx: f64, cy: f64, radius: f64) {
    if !radius.is_finite() || radius < 0.0 || !cx.is_finite() || !cy.is_finite() {
        return;
    }
    canvas.set_dot(cx.round() as i32, cy.round() as i32);

    let r2 = radius * radius;
    let (width, height) = (canvas.dot_width() as f64, canvas.dot_height() as f64);
    for y in clipped_span(cy, radius, height) {
        let fy = y as f64 - cy;
        let half = (r2 - fy * fy).max(0.0).sqrt();
        for x in clipped_span(cx, half, width) {
            canvas.set_dot(x, y);
        }
    }
}

/// Outline a circle with one dot per visible column and row
pub fn stroke_ring(canvas: &mut BrailleCanvas, cx: f64, cy: f64, radius: f64) {
    if !radius.is_finite() || radius < 1.0 || !cx.is_finite() || !cy.is_finite() {
        return;
    }
    let r = radius.round();
    let r2 = r * r;
    let (width, height) = (canvas.dot_width() as f64, canvas.dot_height() as f64);

    for x in clipped_span(cx, r, width) {
        let fx = x as f64 - cx;
        let half = (r2 - fx * fx).max(0.0).sqrt();
        canvas.set_dot(x, (cy - half).round() as i32);
        canvas.set_dot(x, (cy + half).round() as i32);
    }
    for y in clipped_span(cy, r, height) {
        let fy = y as f64 - cy;
        let half = (r2 - fy * fy).max(0.0).sqrt();
        canvas.set_dot((cx - half).round() as i32, y);
        canvas.set_dot((cx + half).round() as i32, y);
    }
}

/// Whole dot coordinates within `reach` of `center`, limited to `0..limit`.
/// Bounds are clamped in f64 before the cast, so huge values cannot overflow.
fn clipped_span(center: f64, reach: f64, limit: f64) -> RangeInclusive<i32> {
    let lo = (center - reach).ceil().max(0.0);
    let hi = (center + reach).floor().min(limit - 1.0);
    if lo > hi {
        return 1..=0;
    }
    lo as i32..=hi as i32
}
