// src/engine/encoder.rs
//
// PixelBuffer -> PNG / JPEG bytes.

use crate::engine::buffer::PixelBuffer;
use crate::error::UpscaleError;
use crate::ops::OutputFormat;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat, RgbaImage};
use std::io::Cursor;

// Type alias for Result - always use UpscaleError to preserve error taxonomy
type EncoderResult<T> = std::result::Result<T, UpscaleError>;

/// Encode `buf` in `format`. JPEG drops alpha.
pub fn encode(buf: &PixelBuffer, format: OutputFormat) -> EncoderResult<Vec<u8>> {
    let rgba = RgbaImage::try_from(buf.clone())?;
    let img = DynamicImage::ImageRgba8(rgba);
    match format {
        OutputFormat::Png => encode_png(&img),
        OutputFormat::Jpeg { quality } => encode_jpeg(&img, quality),
    }
}

pub fn encode_png(img: &DynamicImage) -> EncoderResult<Vec<u8>> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .map_err(|e| UpscaleError::encode_failed("png", format!("PNG encode failed: {e}")))?;
    Ok(buf)
}

pub fn encode_jpeg(img: &DynamicImage, quality: u8) -> EncoderResult<Vec<u8>> {
    let quality = quality.clamp(1, 100);
    let rgb = img.to_rgb8();
    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, quality)
        .encode_image(&rgb)
        .map_err(|e| UpscaleError::encode_failed("jpeg", format!("JPEG encode failed: {e}")))?;
    Ok(buf)
}
