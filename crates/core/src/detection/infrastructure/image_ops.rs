use ndarray::{Array2, Zip};

use crate::shared::frame::Frame;

/// Single-channel intensity using BT.601 luma weights in 14-bit fixed point.
///
/// Expects RGB(A) channel order; single-channel frames are copied as is.
pub fn to_grayscale(frame: &Frame) -> Result<Array2<u8>, Box<dyn std::error::Error>> {
    let view = frame.as_ndarray();
    let shape = (frame.height() as usize, frame.width() as usize);
    match frame.channels() {
        1 => Ok(view.index_axis(ndarray::Axis(2), 0).to_owned()),
        3 | 4 => Ok(Array2::from_shape_fn(shape, |(y, x)| {
            let r = view[[y, x, 0]] as u32;
            let g = view[[y, x, 1]] as u32;
            let b = view[[y, x, 2]] as u32;
            ((r * 4899 + g * 9617 + b * 1868 + (1 << 13)) >> 14) as u8
        })),
        n => Err(format!("Unsupported channel count for grayscale conversion: {n}").into()),
    }
}

/// Per-pixel `|a - b|`. Both images must have the same shape.
pub fn abs_diff(a: &Array2<u8>, b: &Array2<u8>) -> Array2<u8> {
    Zip::from(a).and(b).map_collect(|&p, &q| p.abs_diff(q))
}

/// Pixels strictly above `threshold` become `max_value`, everything else 0.
pub fn threshold_binary(src: &Array2<u8>, threshold: u8, max_value: u8) -> Array2<u8> {
    src.mapv(|v| if v > threshold { max_value } else { 0 })
}

/// Grey-level dilation with a 3x3 rectangular structuring element.
///
/// Pixels outside the image do not contribute, so foreground never grows
/// in from the border.
pub fn dilate(src: &Array2<u8>, iterations: usize) -> Array2<u8> {
    let mut current = src.clone();
    for _ in 0..iterations {
        current = dilate_once(&current);
    }
    current
}

fn dilate_once(src: &Array2<u8>) -> Array2<u8> {
    let (h, w) = src.dim();
    if h == 0 || w == 0 {
        return src.clone();
    }

    // The rectangle is separable: horizontal max, then vertical max.
    let horizontal = Array2::from_shape_fn((h, w), |(y, x)| {
        let lo = x.saturating_sub(1);
        let hi = (x + 1).min(w - 1);
        (lo..=hi).map(|sx| src[[y, sx]]).max().unwrap_or(0)
    });
    Array2::from_shape_fn((h, w), |(y, x)| {
        let lo = y.saturating_sub(1);
        let hi = (y + 1).min(h - 1);
        (lo..=hi).map(|sy| horizontal[[sy, x]]).max().unwrap_or(0)
    })
}
