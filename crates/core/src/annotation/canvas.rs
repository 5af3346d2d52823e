use crate::shared::detection::BoundingBox;
use crate::shared::frame::Frame;

use super::glyphs::{self, GLYPH_HEIGHT, GLYPH_WIDTH};

pub type Rgb = [u8; 3];

pub const BLACK: Rgb = [0, 0, 0];
pub const WHITE: Rgb = [255, 255, 255];
pub const GREEN: Rgb = [0, 255, 0];
pub const RED: Rgb = [255, 0, 0];
pub const YELLOW: Rgb = [255, 255, 0];

/// Writes `color` to pixel `(x, y)`; points outside the frame are ignored.
///
/// Only the first three channels are written, so alpha survives. On
/// single-channel frames the color is reduced to its mean.
pub fn put_pixel(frame: &mut Frame, x: i32, y: i32, color: Rgb) {
    let channels = frame.channels() as usize;
    let Some(offset) = frame.offset(x, y) else {
        return;
    };
    let data = frame.data_mut();
    if channels < 3 {
        let mean = (color.iter().map(|&c| c as u16).sum::<u16>() / 3) as u8;
        data[offset] = mean;
    } else {
        data[offset..offset + 3].copy_from_slice(&color);
    }
}

/// Solid rectangle covering `x..x + w` by `y..y + h`, clipped to the frame.
pub fn fill_rectangle(frame: &mut Frame, x: i32, y: i32, w: i32, h: i32, color: Rgb) {
    let x0 = x.max(0);
    let y0 = y.max(0);
    let x1 = (x + w).min(frame.width() as i32);
    let y1 = (y + h).min(frame.height() as i32);
    for py in y0..y1 {
        for px in x0..x1 {
            put_pixel(frame, px, py, color);
        }
    }
}

/// Rectangle outline whose strokes lie inside `rect`.
pub fn draw_rectangle(frame: &mut Frame, rect: &BoundingBox, color: Rgb, thickness: i32) {
    if rect.width <= 0 || rect.height <= 0 {
        return;
    }
    let t = thickness.max(1).min(rect.width).min(rect.height);
    let (x, y, w, h) = (rect.x, rect.y, rect.width, rect.height);
    fill_rectangle(frame, x, y, w, t, color);
    fill_rectangle(frame, x, y + h - t, w, t, color);
    fill_rectangle(frame, x, y, t, h, color);
    fill_rectangle(frame, x + w - t, y, t, h, color);
}

pub fn fill_circle(frame: &mut Frame, cx: i32, cy: i32, radius: i32, color: Rgb) {
    let r2 = radius * radius;
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy <= r2 {
                put_pixel(frame, cx + dx, cy + dy, color);
            }
        }
    }
}

/// Pixel size of `text` drawn at `scale`: one blank column between glyphs.
pub fn text_size(text: &str, scale: i32) -> (i32, i32) {
    let n = text.chars().count() as i32;
    if n == 0 {
        return (0, 0);
    }
    let advance = (GLYPH_WIDTH + 1) * scale;
    (n * advance - scale, GLYPH_HEIGHT * scale)
}

/// Draws `text` with its top-left corner at `(x, y)`, each font pixel
/// becoming a `scale x scale` block.
pub fn draw_text(frame: &mut Frame, text: &str, x: i32, y: i32, scale: i32, color: Rgb) {
    let scale = scale.max(1);
    let advance = (GLYPH_WIDTH + 1) * scale;
    for (i, c) in text.chars().enumerate() {
        let glyph = glyphs::glyph(c);
        let gx = x + i as i32 * advance;
        for row in 0..GLYPH_HEIGHT {
            for col in 0..GLYPH_WIDTH {
                if glyphs::is_set(&glyph, col, row) {
                    fill_rectangle(frame, gx + col * scale, y + row * scale, scale, scale, color);
                }
            }
        }
    }
}
