// src/engine/pipeline.rs
//
// Single-image pipeline: validate -> resample -> optional sharpen, with
// stage timings recorded onto the result.

use crate::engine::buffer::PixelBuffer;
use crate::engine::resample::resample;
use crate::engine::sharpen::sharpen;
use crate::engine::{MAX_DIMENSION, MAX_PIXELS};
use crate::error::UpscaleError;
use crate::ops::{Algorithm, UpscaleOptions};
use std::time::Instant;
use tracing::debug;

// Type alias for Result - always use UpscaleError to preserve error taxonomy
type PipelineResult<T> = std::result::Result<T, UpscaleError>;

/// Edge of the square box hosts typically fit previews into.
pub const PREVIEW_MAX_EDGE: u32 = 400;

/// Output size guard, checked before the output buffer is allocated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Limits {
    pub max_dimension: u32,
    pub max_pixels: u64,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_dimension: MAX_DIMENSION,
            max_pixels: MAX_PIXELS,
        }
    }
}

impl Limits {
    pub fn unlimited() -> Self {
        Self {
            max_dimension: u32::MAX,
            max_pixels: u64::MAX,
        }
    }

    pub fn check(&self, width: u32, height: u32) -> PipelineResult<()> {
        let largest = width.max(height);
        if largest > self.max_dimension {
            return Err(UpscaleError::dimension_exceeds_limit(
                largest,
                self.max_dimension,
            ));
        }
        let pixels = width as u64 * height as u64;
        if pixels > self.max_pixels {
            return Err(UpscaleError::pixel_count_exceeds_limit(
                pixels,
                self.max_pixels,
            ));
        }
        Ok(())
    }
}

/// Wall-clock time spent in each stage, in milliseconds.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StageMetrics {
    pub resample_ms: f64,
    /// Zero when sharpening was skipped
    pub sharpen_ms: f64,
}

/// Outcome of one upscale. Immutable once built.
#[derive(Clone, Debug)]
pub struct ProcessingResult {
    output: PixelBuffer,
    original_width: u32,
    original_height: u32,
    scale_factor: f64,
    algorithm: Algorithm,
    processing_time_ms: f64,
    metrics: StageMetrics,
}

impl ProcessingResult {
    pub fn output(&self) -> &PixelBuffer {
        &self.output
    }

    pub fn into_output(self) -> PixelBuffer {
        self.output
    }

    pub fn original_width(&self) -> u32 {
        self.original_width
    }

    pub fn original_height(&self) -> u32 {
        self.original_height
    }

    pub fn output_dimensions(&self) -> (u32, u32) {
        self.output.dimensions()
    }

    pub fn scale_factor(&self) -> f64 {
        self.scale_factor
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Duration of the whole operation, validation included
    pub fn processing_time_ms(&self) -> f64 {
        self.processing_time_ms
    }

    pub fn metrics(&self) -> StageMetrics {
        self.metrics
    }
}

/// Times the pipeline stages; one place to read the clock.
struct StageTimer {
    start_total: Instant,
    stage_start: Instant,
    metrics: StageMetrics,
}

impl StageTimer {
    fn start() -> Self {
        let now = Instant::now();
        Self {
            start_total: now,
            stage_start: now,
            metrics: StageMetrics::default(),
        }
    }

    fn lap_ms(&mut self) -> f64 {
        let ms = self.stage_start.elapsed().as_secs_f64() * 1000.0;
        self.stage_start = Instant::now();
        ms
    }

    fn mark_resample_done(&mut self) {
        self.metrics.resample_ms = self.lap_ms();
    }

    fn mark_sharpen_done(&mut self) {
        self.metrics.sharpen_ms = self.lap_ms();
    }

    fn finish(self) -> (f64, StageMetrics) {
        (
            self.start_total.elapsed().as_secs_f64() * 1000.0,
            self.metrics,
        )
    }
}

/// Output dimensions for a uniform scale: `round(w * scale) x round(h * scale)`.
pub fn target_dimensions(width: u32, height: u32, scale_factor: f64) -> PipelineResult<(u32, u32)> {
    if !scale_factor.is_finite() || scale_factor <= 0.0 {
        return Err(UpscaleError::invalid_scale_factor(scale_factor));
    }
    let scaled = |v: u32| (v as f64 * scale_factor).round();
    let (w, h) = (scaled(width), scaled(height));
    if w < 1.0 || h < 1.0 {
        return Err(UpscaleError::invalid_target_dimensions(
            w as u32, h as u32,
        ));
    }
    if w > u32::MAX as f64 || h > u32::MAX as f64 {
        return Err(UpscaleError::dimension_exceeds_limit(u32::MAX, u32::MAX));
    }
    Ok((w as u32, h as u32))
}

/// Aspect-preserving size that fits inside `max_w` x `max_h`.
///
/// Scales up as well as down; the result may be fractional.
pub fn fit_within(src_w: u32, src_h: u32, max_w: u32, max_h: u32) -> (f64, f64) {
    if src_w == 0 || src_h == 0 {
        return (0.0, 0.0);
    }
    let ratio = (max_w as f64 / src_w as f64).min(max_h as f64 / src_h as f64);
    (src_w as f64 * ratio, src_h as f64 * ratio)
}

/// Upscale `source` by `options.scale_factor`, then sharpen when
/// `options.sharpness > 0`.
///
/// Fails with an `InvalidInput` error for a degenerate source or bad
/// parameters, and with a `ResourceLimit` error when the output would
/// exceed `options.limits`.
pub fn process(source: &PixelBuffer, options: &UpscaleOptions) -> PipelineResult<ProcessingResult> {
    let mut timer = StageTimer::start();

    if source.is_empty() {
        return Err(UpscaleError::empty_source(source.width(), source.height()));
    }
    options.validate()?;
    let (new_width, new_height) =
        target_dimensions(source.width(), source.height(), options.scale_factor)?;
    options.limits.check(new_width, new_height)?;

    let mut output = resample(source, new_width, new_height, options.algorithm)?;
    timer.mark_resample_done();

    if let Some(strength) = options.sharpen_strength() {
        output = sharpen(&output, strength);
        timer.mark_sharpen_done();
    }

    let (processing_time_ms, metrics) = timer.finish();
    debug!(
        target: "pixel_upscale::pipeline",
        src_width = source.width(),
        src_height = source.height(),
        width = new_width,
        height = new_height,
        algorithm = %options.algorithm,
        sharpness = options.sharpness,
        elapsed_ms = processing_time_ms,
        "upscaled image"
    );

    Ok(ProcessingResult {
        output,
        original_width: source.width(),
        original_height: source.height(),
        scale_factor: options.scale_factor,
        algorithm: options.algorithm,
        processing_time_ms,
        metrics,
    })
}
