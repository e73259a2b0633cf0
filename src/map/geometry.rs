use crate::braille::BrailleCanvas;

/// Draw a line using Bresenham's algorithm
pub fn draw_line(canvas: &mut BrailleCanvas, x0: i32, y0: i32, x1: i32, y1: i32) {
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    let mut x = x0;
    let mut y = y0;

    loop {
        canvas.set_pixel_signed(x, y);

        if x == x1 && y == y1 {
            break;
        }

        let e2 = 2 * err;

        if e2 >= dy {
            if x == x1 {
                break;
            }
            err += dy;
            x += sx;
        }

        if e2 <= dx {
            if y == y1 {
                break;
            }
            err += dx;
            y += sy;
        }
    }
}

/// Draw a dashed line, `on` pixels drawn then `off` skipped
pub fn draw_dashed_line(canvas: &mut BrailleCanvas, from: (i32, i32), to: (i32, i32), on: u32, off: u32) {
    let (dx, dy) = ((to.0 - from.0) as f64, (to.1 - from.1) as f64);
    let steps = dx.abs().max(dy.abs()).ceil() as u32;
    let period = (on + off).max(1);
    for i in 0..=steps {
        if i % period >= on {
            continue;
        }
        let t = if steps == 0 { 0.0 } else { i as f64 / steps as f64 };
        canvas.set_pixel_signed(
            (from.0 as f64 + dx * t).round() as i32,
            (from.1 as f64 + dy * t).round() as i32,
        );
    }
}

/// Draw a filled circle
pub fn draw_circle(canvas: &mut BrailleCanvas, cx: i32, cy: i32, radius: i32) {
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy <= radius * radius {
                canvas.set_pixel_signed(cx + dx, cy + dy);
            }
        }
    }
}

/// Draw a diamond outline (threat marker)
pub fn draw_diamond(canvas: &mut BrailleCanvas, cx: i32, cy: i32, radius: i32) {
    draw_line(canvas, cx, cy - radius, cx + radius, cy);
    draw_line(canvas, cx + radius, cy, cx, cy + radius);
    draw_line(canvas, cx, cy + radius, cx - radius, cy);
    draw_line(canvas, cx - radius, cy, cx, cy - radius);
}
