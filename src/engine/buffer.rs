// src/engine/buffer.rs
//
// RGBA8 raster used by every algorithm in the engine.

use crate::error::UpscaleError;
use image::RgbaImage;
use std::fmt;

/// Bytes per RGBA8 pixel
pub const CHANNELS: usize = 4;

/// In-memory RGBA8 image.
///
/// Invariant: `pixels.len() == width * height * 4`. Transforms always
/// allocate a new buffer and never mutate their source.
#[derive(Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl PixelBuffer {
    /// Wrap raw RGBA8 bytes, validating the length against the dimensions.
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, UpscaleError> {
        let expected = checked_byte_len(width, height)?;
        if pixels.len() != expected {
            return Err(UpscaleError::buffer_size_mismatch(
                width,
                height,
                expected,
                pixels.len(),
            ));
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Buffer with every pixel set to `rgba`.
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let mut pixels = Vec::with_capacity(checked_byte_len(width, height).unwrap_or(0));
        for _ in 0..height {
            for _ in 0..width {
                pixels.extend_from_slice(&rgba);
            }
        }
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> [u8; 4]) -> Self {
        let mut pixels = Vec::with_capacity(checked_byte_len(width, height).unwrap_or(0));
        for y in 0..height {
            for x in 0..width {
                pixels.extend_from_slice(&f(x, y));
            }
        }
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Zero-filled buffer. Kernels write every byte of it.
    pub(crate) fn zeroed(width: u32, height: u32) -> Result<Self, UpscaleError> {
        Ok(Self {
            width,
            height,
            pixels: vec![0; checked_byte_len(width, height)?],
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// True when either dimension is zero. Such buffers cannot be resampled.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Channel values at `(x, y)`. Panics when out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = self.index(x, y);
        [
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ]
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.pixels
    }

    pub(crate) fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.pixels
    }

    pub fn into_raw(self) -> Vec<u8> {
        self.pixels
    }

    /// Byte offset of the first channel of `(x, y)`.
    #[inline]
    pub(crate) fn index(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * CHANNELS
    }

    pub fn resolution(&self) -> Resolution {
        Resolution::new(self.width as f64, self.height as f64)
    }
}

impl fmt::Debug for PixelBuffer {
    // Pixel dumps are useless in assertion output; print the shape only.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PixelBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.pixels.len())
            .finish()
    }
}

impl From<RgbaImage> for PixelBuffer {
    fn from(img: RgbaImage) -> Self {
        let (width, height) = img.dimensions();
        Self {
            width,
            height,
            pixels: img.into_raw(),
        }
    }
}

impl TryFrom<PixelBuffer> for RgbaImage {
    type Error = UpscaleError;

    fn try_from(buf: PixelBuffer) -> Result<Self, Self::Error> {
        let (width, height) = buf.dimensions();
        let len = buf.pixels.len();
        RgbaImage::from_raw(width, height, buf.pixels).ok_or_else(|| {
            let expected = checked_byte_len(width, height).unwrap_or(usize::MAX);
            UpscaleError::buffer_size_mismatch(width, height, expected, len)
        })
    }
}

/// `width * height * 4`, or `PixelCountExceedsLimit` when that does not fit
/// in `usize`.
pub(crate) fn checked_byte_len(width: u32, height: u32) -> Result<usize, UpscaleError> {
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(CHANNELS))
        .ok_or_else(|| {
            UpscaleError::pixel_count_exceeds_limit(
                width as u64 * height as u64,
                (usize::MAX / CHANNELS) as u64,
            )
        })
}

/// Display-only resolution. Scaled resolutions may be fractional.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Resolution {
    pub width: f64,
    pub height: f64,
}

impl Resolution {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn scaled(&self, factor: f64) -> Self {
        Self::new(self.width * factor, self.height * factor)
    }
}

impl fmt::Display for Resolution {
    // f64's Display prints 200.0 as "200" and 150.5 as "150.5"
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}
