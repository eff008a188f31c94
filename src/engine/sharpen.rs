// src/engine/sharpen.rs
//
// 3x3 edge-enhancement convolution.

use crate::engine::buffer::{PixelBuffer, CHANNELS};

/// Base kernel, scaled element-wise by the strength before use.
const SHARPEN_KERNEL: [[f64; 3]; 3] = [[0.0, -1.0, 0.0], [-1.0, 5.0, -1.0], [0.0, -1.0, 0.0]];

/// Apply the sharpen kernel at `strength` (expected in (0, 1]) to the RGB
/// channels of `src`.
///
/// Only pixels with a full 3x3 neighborhood are convolved; the outermost
/// ring is copied unchanged, as is alpha everywhere. Because the kernel is
/// scaled as a whole, strengths below 1 also darken flat regions
/// proportionally (the kernel sums to `strength`).
pub fn sharpen(src: &PixelBuffer, strength: f64) -> PixelBuffer {
    let mut out = src.clone();
    let (width, height) = src.dimensions();
    if width < 3 || height < 3 {
        return out;
    }

    let kernel = SHARPEN_KERNEL.map(|row| row.map(|k| k * strength));
    let data = src.as_bytes();
    let stride = width as usize * CHANNELS;
    let dst = out.as_bytes_mut();

    for y in 1..height as usize - 1 {
        for x in 1..width as usize - 1 {
            let mut rgb = [0.0f64; 3];
            for (ky, kernel_row) in kernel.iter().enumerate() {
                let row = (y + ky - 1) * stride;
                for (kx, &k) in kernel_row.iter().enumerate() {
                    let i = row + (x + kx - 1) * CHANNELS;
                    for (c, acc) in rgb.iter_mut().enumerate() {
                        *acc += data[i + c] as f64 * k;
                    }
                }
            }
            let o = y * stride + x * CHANNELS;
            for (c, v) in rgb.into_iter().enumerate() {
                dst[o + c] = store_clamped(v);
            }
        }
    }
    out
}

// Clamp then round half to even, the conversion used by clamped byte arrays.
#[inline]
fn store_clamped(v: f64) -> u8 {
    v.clamp(0.0, 255.0).round_ties_even() as u8
}
