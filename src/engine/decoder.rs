// src/engine/decoder.rs
//
// Encoded bytes (PNG, JPEG, WebP) -> PixelBuffer, via the image crate.

use crate::engine::buffer::PixelBuffer;
use crate::engine::pipeline::Limits;
use crate::error::UpscaleError;
use image::{ImageFormat, ImageReader};
use std::io::Cursor;

// Type alias for Result - always use UpscaleError to preserve error taxonomy
type DecoderResult<T> = std::result::Result<T, UpscaleError>;

/// Sniff the container format from magic bytes.
pub fn detect_format(bytes: &[u8]) -> Option<ImageFormat> {
    image::guess_format(bytes).ok()
}

/// Reject images over the default limits before any pixel is decoded.
pub fn check_dimensions(width: u32, height: u32) -> DecoderResult<()> {
    Limits::default().check(width, height)
}

/// Decode `bytes` into RGBA8.
///
/// The header is read first so oversized images fail with a limit error
/// rather than an allocation.
pub fn decode(bytes: &[u8]) -> DecoderResult<PixelBuffer> {
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| UpscaleError::decode_failed(format!("failed to read image header: {e}")))?;
    let Some(format) = reader.format() else {
        return Err(UpscaleError::unsupported_format("unknown"));
    };
    if !matches!(
        format,
        ImageFormat::Png | ImageFormat::Jpeg | ImageFormat::WebP
    ) {
        return Err(UpscaleError::unsupported_format(
            format!("{format:?}").to_lowercase(),
        ));
    }

    let (width, height) = ImageReader::with_format(Cursor::new(bytes), format)
        .into_dimensions()
        .map_err(|e| UpscaleError::decode_failed(format!("failed to read dimensions: {e}")))?;
    check_dimensions(width, height)?;

    let img = reader
        .decode()
        .map_err(|e| UpscaleError::decode_failed(format!("decode failed: {e}")))?;
    Ok(PixelBuffer::from(img.to_rgba8()))
}
