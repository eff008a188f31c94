// src/engine/resample.rs
//
// Resampling kernels: nearest, bilinear, bicubic (Catmull-Rom), Lanczos.
//
// All four share one coordinate mapping: output pixel (x, y) samples the
// source at (x * src_w / dst_w, y * src_h / dst_h), with each axis mapped
// independently. Every derived source index is clamped to the image, so
// edge pixels are replicated and nothing is read out of bounds.
//
// Per-axis tap tables are computed once per call and shared by every row or
// column, since the mapping is separable.

use crate::engine::buffer::{PixelBuffer, CHANNELS};
use crate::error::UpscaleError;
use crate::ops::Algorithm;
use std::f64::consts::PI;

type ResampleResult<T> = std::result::Result<T, UpscaleError>;

/// Resample `src` to exactly `new_width` x `new_height` using `algorithm`.
///
/// Fails on a degenerate source or a zero target dimension, and with
/// `PixelCountExceedsLimit` when the output byte length overflows `usize`.
pub fn resample(
    src: &PixelBuffer,
    new_width: u32,
    new_height: u32,
    algorithm: Algorithm,
) -> ResampleResult<PixelBuffer> {
    if src.is_empty() {
        return Err(UpscaleError::empty_source(src.width(), src.height()));
    }
    if new_width == 0 || new_height == 0 {
        return Err(UpscaleError::invalid_target_dimensions(
            new_width, new_height,
        ));
    }

    // Allocated before any tap table so an overflowing size fails first
    let out = PixelBuffer::zeroed(new_width, new_height)?;
    let out = match algorithm {
        Algorithm::NearestNeighbor => nearest_neighbor(src, out),
        Algorithm::Bilinear => bilinear(src, out),
        Algorithm::Bicubic => bicubic(src, out),
        Algorithm::Lanczos { lobes } => lanczos(src, out, lobes),
    };
    Ok(out)
}

/// Source coordinate for output index `dst` along one axis.
#[inline]
fn map_coordinate(dst: u32, src_len: u32, dst_len: u32) -> f64 {
    dst as f64 * (src_len as f64 / dst_len as f64)
}

#[inline]
fn clamp_index(i: i64, src_len: u32) -> u32 {
    i.clamp(0, src_len as i64 - 1) as u32
}

#[inline]
fn to_channel(v: f64) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

// =============================================================================
// NEAREST NEIGHBOR
// =============================================================================

fn nearest_neighbor(src: &PixelBuffer, mut out: PixelBuffer) -> PixelBuffer {
    let (new_width, new_height) = out.dimensions();
    let (src_w, src_h) = src.dimensions();
    let xs: Vec<u32> = (0..new_width)
        .map(|x| clamp_index(map_coordinate(x, src_w, new_width).floor() as i64, src_w))
        .collect();

    let data = src.as_bytes();
    let row_stride = new_width as usize * CHANNELS;
    let dst = out.as_bytes_mut();

    for y in 0..new_height {
        let sy = clamp_index(map_coordinate(y, src_h, new_height).floor() as i64, src_h);
        let row = &mut dst[y as usize * row_stride..(y as usize + 1) * row_stride];
        for (px, &sx) in row.chunks_exact_mut(CHANNELS).zip(&xs) {
            let i = src.index(sx, sy);
            px.copy_from_slice(&data[i..i + CHANNELS]);
        }
    }
    out
}

// =============================================================================
// BILINEAR
// =============================================================================

/// Two neighbors along one axis and the fractional distance from the first.
#[derive(Clone, Copy)]
struct LinearTap {
    i0: u32,
    i1: u32,
    frac: f64,
}

fn linear_taps(src_len: u32, dst_len: u32) -> Vec<LinearTap> {
    (0..dst_len)
        .map(|d| {
            let c = map_coordinate(d, src_len, dst_len);
            let base = c.floor();
            let i0 = clamp_index(base as i64, src_len);
            LinearTap {
                i0,
                i1: clamp_index(base as i64 + 1, src_len),
                frac: c - base,
            }
        })
        .collect()
}

fn bilinear(src: &PixelBuffer, mut out: PixelBuffer) -> PixelBuffer {
    let (new_width, new_height) = out.dimensions();
    let xs = linear_taps(src.width(), new_width);
    let ys = linear_taps(src.height(), new_height);
    let data = src.as_bytes();

    let dst = out.as_bytes_mut();
    let mut o = 0;

    for ty in &ys {
        let fy = ty.frac;
        for tx in &xs {
            let fx = tx.frac;
            let tl = src.index(tx.i0, ty.i0);
            let tr = src.index(tx.i1, ty.i0);
            let bl = src.index(tx.i0, ty.i1);
            let br = src.index(tx.i1, ty.i1);
            for c in 0..CHANNELS {
                let top = data[tl + c] as f64 * (1.0 - fx) + data[tr + c] as f64 * fx;
                let bottom = data[bl + c] as f64 * (1.0 - fx) + data[br + c] as f64 * fx;
                dst[o + c] = to_channel(top * (1.0 - fy) + bottom * fy);
            }
            o += CHANNELS;
        }
    }
    out
}

// =============================================================================
// BICUBIC (Catmull-Rom)
// =============================================================================

/// Four neighbors (base-1 ..= base+2) along one axis, clamped.
#[derive(Clone, Copy)]
struct CubicTap {
    idx: [u32; 4],
    frac: f64,
}

fn cubic_taps(src_len: u32, dst_len: u32) -> Vec<CubicTap> {
    (0..dst_len)
        .map(|d| {
            let c = map_coordinate(d, src_len, dst_len);
            let base = c.floor();
            let b = base as i64;
            CubicTap {
                idx: [
                    clamp_index(b - 1, src_len),
                    clamp_index(b, src_len),
                    clamp_index(b + 1, src_len),
                    clamp_index(b + 2, src_len),
                ],
                frac: c - base,
            }
        })
        .collect()
}

/// Catmull-Rom cubic convolution between p1 and p2 at `t` in [0, 1).
#[inline]
fn catmull_rom(p0: f64, p1: f64, p2: f64, p3: f64, t: f64) -> f64 {
    let t2 = t * t;
    let t3 = t2 * t;
    0.5 * ((2.0 * p1)
        + (-p0 + p2) * t
        + (2.0 * p0 - 5.0 * p1 + 4.0 * p2 - p3) * t2
        + (-p0 + 3.0 * p1 - 3.0 * p2 + p3) * t3)
}

fn bicubic(src: &PixelBuffer, mut out: PixelBuffer) -> PixelBuffer {
    let (new_width, new_height) = out.dimensions();
    let xs = cubic_taps(src.width(), new_width);
    let ys = cubic_taps(src.height(), new_height);
    let data = src.as_bytes();

    let dst = out.as_bytes_mut();
    let mut o = 0;

    for ty in &ys {
        for tx in &xs {
            for c in 0..CHANNELS {
                // Interpolate each of the four columns along Y, then the
                // four column results along X.
                let mut columns = [0.0f64; 4];
                for (col, &sx) in columns.iter_mut().zip(&tx.idx) {
                    let p = |k: usize| data[src.index(sx, ty.idx[k]) + c] as f64;
                    *col = catmull_rom(p(0), p(1), p(2), p(3), ty.frac);
                }
                let v = catmull_rom(columns[0], columns[1], columns[2], columns[3], tx.frac);
                dst[o + c] = to_channel(v);
            }
            o += CHANNELS;
        }
    }
    out
}

// =============================================================================
// LANCZOS
// =============================================================================

/// Windowed-sinc weight for signed distance `d` with `a` lobes.
#[inline]
pub(crate) fn lanczos_weight(d: f64, a: f64) -> f64 {
    if d == 0.0 {
        return 1.0;
    }
    if d.abs() > a {
        return 0.0;
    }
    let pix = PI * d;
    let pia = PI * d / a;
    (a * pix.sin() * pia.sin()) / (pix * pia)
}

/// One axis of the (2*lobes)-wide window: clamped index plus 1-D weight.
fn lanczos_taps(src_len: u32, dst_len: u32, lobes: u32) -> Vec<Vec<(u32, f64)>> {
    let a = lobes as i64;
    (0..dst_len)
        .map(|d| {
            let c = map_coordinate(d, src_len, dst_len);
            let base = c.floor() as i64;
            (-a + 1..=a)
                .map(|k| {
                    let pos = base + k;
                    (clamp_index(pos, src_len), lanczos_weight(c - pos as f64, a as f64))
                })
                .collect()
        })
        .collect()
}

fn lanczos(src: &PixelBuffer, mut out: PixelBuffer, lobes: u32) -> PixelBuffer {
    let (new_width, new_height) = out.dimensions();
    let lobes = lobes.max(1);
    let xs = lanczos_taps(src.width(), new_width, lobes);
    let ys = lanczos_taps(src.height(), new_height, lobes);
    let data = src.as_bytes();

    let dst = out.as_bytes_mut();
    let mut o = 0;

    for row_taps in &ys {
        for col_taps in &xs {
            let mut sum = [0.0f64; CHANNELS];
            let mut weight_sum = 0.0f64;
            for &(sy, wy) in row_taps {
                for &(sx, wx) in col_taps {
                    let weight = wx * wy;
                    let i = src.index(sx, sy);
                    for (c, acc) in sum.iter_mut().enumerate() {
                        *acc += data[i + c] as f64 * weight;
                    }
                    weight_sum += weight;
                }
            }
            for (c, acc) in sum.iter().enumerate() {
                let v = if weight_sum != 0.0 {
                    acc / weight_sum
                } else {
                    0.0
                };
                dst[o + c] = to_channel(v);
            }
            o += CHANNELS;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Algorithm; 4] = [
        Algorithm::NearestNeighbor,
        Algorithm::Bilinear,
        Algorithm::Bicubic,
        Algorithm::Lanczos { lobes: 3 },
    ];

    fn gradient(width: u32, height: u32) -> PixelBuffer {
        PixelBuffer::from_fn(width, height, |x, y| {
            [(x * 37 % 256) as u8, (y * 53 % 256) as u8, 128, 255]
        })
    }

    mod dimension_tests {
        use super::*;

        #[test]
        fn output_has_requested_dimensions() {
            let src = gradient(7, 5);
            for algo in ALL {
                for (w, h) in [(14, 10), (3, 2), (1, 1), (20, 3), (7, 5)] {
                    let out = resample(&src, w, h, algo).unwrap();
                    assert_eq!(out.dimensions(), (w, h), "{algo}");
                    assert_eq!(out.as_bytes().len(), (w * h * 4) as usize, "{algo}");
                }
            }
        }

        #[test]
        fn rejects_empty_source() {
            let src = PixelBuffer::new(0, 4, Vec::new()).unwrap();
            for algo in ALL {
                let err = resample(&src, 4, 4, algo).unwrap_err();
                assert!(matches!(err, UpscaleError::EmptySource { .. }));
            }
        }

        #[test]
        fn overflowing_target_is_a_limit_error() {
            let src = gradient(2, 2);
            for algo in ALL {
                let err = resample(&src, u32::MAX, u32::MAX, algo).unwrap_err();
                assert!(matches!(err, UpscaleError::PixelCountExceedsLimit { .. }), "{algo}");
            }
        }

        #[test]
        fn rejects_zero_target() {
            let src = gradient(4, 4);
            let err = resample(&src, 0, 8, Algorithm::Bilinear).unwrap_err();
            assert!(matches!(err, UpscaleError::InvalidTargetDimensions { .. }));
        }
    }

    mod nearest_tests {
        use super::*;

        #[test]
        fn identity_at_scale_one() {
            let src = gradient(9, 6);
            let out = resample(&src, 9, 6, Algorithm::NearestNeighbor).unwrap();
            assert_eq!(out, src);
        }

        #[test]
        fn doubles_each_pixel() {
            let src = gradient(3, 2);
            let out = resample(&src, 6, 4, Algorithm::NearestNeighbor).unwrap();
            for y in 0..4 {
                for x in 0..6 {
                    assert_eq!(out.pixel(x, y), src.pixel(x / 2, y / 2));
                }
            }
        }

        #[test]
        fn downscale_picks_floor_index() {
            let src = gradient(8, 8);
            let out = resample(&src, 3, 3, Algorithm::NearestNeighbor).unwrap();
            // ratio 8/3: x=1 -> 2.67 -> 2, x=2 -> 5.33 -> 5
            assert_eq!(out.pixel(1, 2), src.pixel(2, 5));
            assert_eq!(out.pixel(2, 1), src.pixel(5, 2));
        }
    }

    mod bilinear_tests {
        use super::*;

        #[test]
        fn corners_match_source_on_2x2_to_4x4() {
            let src = PixelBuffer::from_fn(2, 2, |x, y| match (x, y) {
                (0, 0) => [255, 0, 0, 255],
                (1, 0) => [0, 255, 0, 255],
                (0, 1) => [0, 0, 255, 255],
                _ => [255, 255, 255, 0],
            });
            let out = resample(&src, 4, 4, Algorithm::Bilinear).unwrap();
            assert_eq!(out.pixel(0, 0), src.pixel(0, 0));
            assert_eq!(out.pixel(3, 0), src.pixel(1, 0));
            assert_eq!(out.pixel(0, 3), src.pixel(0, 1));
            assert_eq!(out.pixel(3, 3), src.pixel(1, 1));
        }

        #[test]
        fn midpoint_is_average_rounded() {
            let src = PixelBuffer::from_fn(2, 1, |x, _| if x == 0 { [0; 4] } else { [255; 4] });
            let out = resample(&src, 4, 1, Algorithm::Bilinear).unwrap();
            // x=1 maps to 0.5: 127.5 rounds up
            assert_eq!(out.pixel(1, 0), [128, 128, 128, 128]);
        }

        #[test]
        fn alpha_is_interpolated_like_color() {
            let src = PixelBuffer::from_fn(2, 1, |x, _| [10, 10, 10, if x == 0 { 0 } else { 200 }]);
            let out = resample(&src, 4, 1, Algorithm::Bilinear).unwrap();
            assert_eq!(out.pixel(1, 0)[3], 100);
        }
    }

    mod bicubic_tests {
        use super::*;

        #[test]
        fn catmull_rom_interpolates_endpoints() {
            assert_eq!(catmull_rom(1.0, 2.0, 3.0, 4.0, 0.0), 2.0);
            assert!((catmull_rom(1.0, 2.0, 3.0, 4.0, 0.5) - 2.5).abs() < 1e-12);
        }

        #[test]
        fn flat_image_stays_flat() {
            let src = PixelBuffer::filled(5, 4, [90, 180, 30, 255]);
            let out = resample(&src, 13, 9, Algorithm::Bicubic).unwrap();
            assert!(out.as_bytes().chunks(4).all(|p| p == [90, 180, 30, 255]));
        }

        #[test]
        fn overshoot_is_clamped() {
            // A hard 0/255 edge makes Catmull-Rom ring past the range.
            let src = PixelBuffer::from_fn(4, 1, |x, _| if x < 2 { [0, 0, 0, 255] } else { [255, 255, 255, 255] });
            let out = resample(&src, 16, 1, Algorithm::Bicubic).unwrap();
            assert_eq!(out.pixel(0, 0), [0, 0, 0, 255]);
            assert_eq!(out.pixel(12, 0), [255, 255, 255, 255]);
        }
    }

    mod lanczos_tests {
        use super::*;

        #[test]
        fn kernel_shape() {
            assert_eq!(lanczos_weight(0.0, 3.0), 1.0);
            assert_eq!(lanczos_weight(3.5, 3.0), 0.0);
            assert!(lanczos_weight(1.0, 3.0).abs() < 1e-12);
            assert!(lanczos_weight(0.5, 3.0) > 0.5);
            assert!(lanczos_weight(1.5, 3.0) < 0.0);
            assert_eq!(lanczos_weight(0.7, 2.0), lanczos_weight(-0.7, 2.0));
        }

        #[test]
        fn window_width_is_twice_lobes() {
            let taps = lanczos_taps(10, 20, 3);
            assert!(taps.iter().all(|t| t.len() == 6));
            let taps = lanczos_taps(10, 20, 2);
            assert!(taps.iter().all(|t| t.len() == 4));
        }

        #[test]
        fn flat_image_stays_flat() {
            let src = PixelBuffer::filled(6, 6, [12, 34, 56, 78]);
            for lobes in [1, 2, 3, 4] {
                let out = resample(&src, 15, 11, Algorithm::Lanczos { lobes }).unwrap();
                assert!(out.as_bytes().chunks(4).all(|p| p == [12, 34, 56, 78]));
            }
        }

        #[test]
        fn integer_positions_reproduce_source() {
            // Whole-number source coordinates have weight 1 at distance 0 and
            // 0 at every other integer distance.
            let src = gradient(6, 6);
            let out = resample(&src, 12, 12, Algorithm::lanczos()).unwrap();
            for y in 0..6 {
                for x in 0..6 {
                    assert_eq!(out.pixel(x * 2, y * 2), src.pixel(x, y));
                }
            }
        }

        #[test]
        fn zero_lobes_is_treated_as_one() {
            let src = gradient(4, 4);
            let a = resample(&src, 8, 8, Algorithm::Lanczos { lobes: 0 }).unwrap();
            let b = resample(&src, 8, 8, Algorithm::Lanczos { lobes: 1 }).unwrap();
            assert_eq!(a, b);
        }
    }

    mod clamping_tests {
        use super::*;

        #[test]
        fn single_pixel_source_replicates() {
            let src = PixelBuffer::filled(1, 1, [200, 100, 50, 25]);
            for algo in ALL {
                let out = resample(&src, 5, 7, algo).unwrap();
                assert!(
                    out.as_bytes().chunks(4).all(|p| p == [200, 100, 50, 25]),
                    "{algo}"
                );
            }
        }

        /// Source taps read around `floor(c)`, as offsets.
        fn support(algo: Algorithm) -> (i64, i64) {
            match algo {
                Algorithm::NearestNeighbor => (0, 0),
                Algorithm::Bilinear => (0, 1),
                Algorithm::Bicubic => (-1, 2),
                Algorithm::Lanczos { lobes } => {
                    let a = lobes.max(1) as i64;
                    (1 - a, a)
                }
            }
        }

        #[test]
        fn border_sentinel_does_not_leak_into_interior() {
            const SENTINEL: [u8; 4] = [255, 0, 255, 255];
            const GRAY: [u8; 4] = [100, 100, 100, 255];
            let n = 12;
            let src = PixelBuffer::from_fn(n, n, |x, y| {
                if x == 0 || y == 0 || x == n - 1 || y == n - 1 {
                    SENTINEL
                } else {
                    GRAY
                }
            });
            let algos = [
                Algorithm::NearestNeighbor,
                Algorithm::Bilinear,
                Algorithm::Bicubic,
                Algorithm::Lanczos { lobes: 2 },
                Algorithm::Lanczos { lobes: 3 },
            ];
            for algo in algos {
                let (lo, hi) = support(algo);
                let interior = |c: f64| {
                    let base = c.floor() as i64;
                    base + lo >= 1 && base + hi <= n as i64 - 2
                };
                let out = resample(&src, n * 3, n * 3, algo).unwrap();
                let mut checked = 0;
                for y in 0..n * 3 {
                    for x in 0..n * 3 {
                        let cx = map_coordinate(x, n, n * 3);
                        let cy = map_coordinate(y, n, n * 3);
                        if interior(cx) && interior(cy) {
                            assert_eq!(out.pixel(x, y), GRAY, "{algo} at ({x},{y})");
                            checked += 1;
                        }
                    }
                }
                assert!(checked > 0, "{algo}: empty interior");
                // the border itself is reached
                assert_eq!(out.pixel(0, 0), SENTINEL, "{algo}");
            }
        }
    }

    mod golden_tests {
        use super::*;

        // Non-separable 3x3 source: R is irregular, G a diagonal ramp, B a
        // checkerboard.
        const R: [[u8; 3]; 3] = [[10, 200, 40], [90, 30, 250], [160, 70, 120]];
        const G: [[u8; 3]; 3] = [[0, 60, 120], [60, 120, 180], [120, 180, 240]];
        const B: [[u8; 3]; 3] = [[255, 0, 255], [0, 255, 0], [255, 0, 255]];

        fn source() -> PixelBuffer {
            PixelBuffer::from_fn(3, 3, |x, y| {
                let (x, y) = (x as usize, y as usize);
                [R[y][x], G[y][x], B[y][x], 255]
            })
        }

        fn check(algo: Algorithm, size: u32, expected: &[((u32, u32), [u8; 4])]) {
            let out = resample(&source(), size, size, algo).unwrap();
            for &((x, y), pixel) in expected {
                assert_eq!(out.pixel(x, y), pixel, "{algo} {size}x{size} at ({x},{y})");
            }
        }

        #[test]
        fn bicubic_at_2x() {
            check(
                Algorithm::Bicubic,
                6,
                &[
                    // integer positions reproduce the source
                    ((2, 2), [30, 120, 255, 255]),
                    ((4, 4), [120, 240, 255, 255]),
                    // 30.0, 123.75, 270.94 (clamped)
                    ((5, 0), [30, 124, 255, 255]),
                    // 263.75 (clamped), 183.75, -15.94 (clamped)
                    ((5, 2), [255, 184, 0, 255]),
                    // 123.125, 243.75, 270.94
                    ((5, 4), [123, 244, 255, 255]),
                    // 164.375, 123.75, 270.94
                    ((0, 5), [164, 124, 255, 255]),
                ],
            );
        }

        #[test]
        fn bicubic_at_1_5x() {
            check(
                Algorithm::Bicubic,
                5,
                &[
                    // 71.01, 66.24, 147.09
                    ((1, 1), [71, 66, 147, 255]),
                    // 106.94, 106.08, 168.68
                    ((2, 1), [107, 106, 169, 255]),
                    // 209.18, 184.80, 57.74
                    ((3, 2), [209, 185, 58, 255]),
                    // 67.93, 184.80, 57.74
                    ((2, 3), [68, 185, 58, 255]),
                    // 129.24, 223.68, 183.71
                    ((3, 3), [129, 224, 184, 255]),
                ],
            );
        }

        #[test]
        fn lanczos2_at_1_5x() {
            check(
                Algorithm::Lanczos { lobes: 2 },
                5,
                &[
                    // 109.29, 106.93, 168.84
                    ((2, 1), [109, 107, 169, 255]),
                    // 165.84, 143.18, 95.09
                    ((3, 1), [166, 143, 95, 255]),
                    // 88.67, 143.18, 95.09
                    ((1, 3), [89, 143, 95, 255]),
                    // 68.17, 185.36, 59.10
                    ((2, 3), [68, 185, 59, 255]),
                    // 129.23, 221.62, 181.12
                    ((3, 3), [129, 222, 181, 255]),
                ],
            );
        }

        #[test]
        fn lanczos3_at_2x() {
            check(
                Algorithm::Lanczos { lobes: 3 },
                6,
                &[
                    ((2, 2), [30, 120, 255, 255]),
                    // 70.92, 46.63, 133.83
                    ((1, 1), [71, 47, 134, 255]),
                    // 108.27, 193.37, 133.83
                    ((3, 3), [108, 193, 134, 255]),
                    // 230.67, 221.90, 91.37
                    ((5, 3), [231, 222, 91, 255]),
                    // 78.61, 185.22, -34.65 (clamped)
                    ((2, 5), [79, 185, 0, 255]),
                ],
            );
        }

        #[test]
        fn lanczos3_at_1_5x() {
            check(
                Algorithm::Lanczos { lobes: 3 },
                5,
                &[
                    // 146.83, 30.19, 66.62
                    ((1, 0), [147, 30, 67, 255]),
                    // 74.70, 113.26, 201.98
                    ((3, 0), [75, 113, 202, 255]),
                    // 207.68, 188.31, 63.34
                    ((3, 2), [208, 188, 63, 255]),
                    // 61.92, 188.31, 63.34
                    ((2, 3), [62, 188, 63, 255]),
                ],
            );
        }
    }
}
