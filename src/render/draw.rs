//! Raster primitives for panel drawing

use image::{Rgb, RgbImage};

/// Alpha-blend a color onto one pixel, ignoring out-of-bounds coordinates
pub fn blend_pixel(img: &mut RgbImage, x: i32, y: i32, color: Rgb<u8>, alpha: f32) {
    if x < 0 || y < 0 || x >= img.width() as i32 || y >= img.height() as i32 {
        return;
    }
    let alpha = alpha.clamp(0.0, 1.0);
    let dst = img.get_pixel_mut(x as u32, y as u32);
    for i in 0..3 {
        let mixed = dst.0[i] as f32 * (1.0 - alpha) + color.0[i] as f32 * alpha;
        dst.0[i] = mixed.round() as u8;
    }
}

/// Draw a blended line using Bresenham's algorithm
pub fn draw_line(
    img: &mut RgbImage,
    x0: i32,
    y0: i32,
    x1: i32,
    y1: i32,
    color: Rgb<u8>,
    alpha: f32,
) {
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;
    let mut x = x0;
    let mut y = y0;

    loop {
        blend_pixel(img, x, y, color, alpha);

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

/// Draw an arrow from `(x0, y0)` to `(x1, y1)` in pixel space with a two-stroke
/// head at the tip. Zero-length arrows draw nothing.
pub fn draw_arrow(
    img: &mut RgbImage,
    x0: f64,
    y0: f64,
    x1: f64,
    y1: f64,
    color: Rgb<u8>,
    alpha: f32,
) {
    let (dx, dy) = (x1 - x0, y1 - y0);
    let len = dx.hypot(dy);
    if len < 0.5 || !len.is_finite() {
        return;
    }

    let (tip_x, tip_y) = (x1.round() as i32, y1.round() as i32);
    draw_line(img, x0.round() as i32, y0.round() as i32, tip_x, tip_y, color, alpha);

    let head = (len * 0.3).min(6.0);
    let back = dy.atan2(dx) + std::f64::consts::PI;
    for spread in [-0.45_f64, 0.45] {
        let a = back + spread;
        let hx = (x1 + a.cos() * head).round() as i32;
        let hy = (y1 + a.sin() * head).round() as i32;
        draw_line(img, tip_x, tip_y, hx, hy, color, alpha);
    }
}

/// Blended filled circle
pub fn draw_disk(img: &mut RgbImage, cx: f64, cy: f64, radius: f64, color: Rgb<u8>, alpha: f32) {
    if radius <= 0.0 || !radius.is_finite() {
        return;
    }
    let r2 = radius * radius;
    let x_lo = (cx - radius).floor() as i32;
    let x_hi = (cx + radius).ceil() as i32;
    let y_lo = (cy - radius).floor() as i32;
    let y_hi = (cy + radius).ceil() as i32;

    for py in y_lo..=y_hi {
        for px in x_lo..=x_hi {
            let ddx = px as f64 + 0.5 - cx;
            let ddy = py as f64 + 0.5 - cy;
            if ddx * ddx + ddy * ddy <= r2 {
                blend_pixel(img, px, py, color, alpha);
            }
        }
    }
}
