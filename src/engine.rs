// src/engine.rs
//
// The core of pixel-upscale:
// 1. Resampling kernels and the sharpen filter over RGBA8 buffers
// 2. A single-image pipeline with size guards and stage timings
// 3. A task queue and a sequential batch processor with notifications
//
// This file is a facade over the modules in engine/

// =============================================================================
// SECURITY LIMITS
// =============================================================================

/// Maximum allowed image dimension (width or height), for decoded sources
/// and for pipeline output.
pub const MAX_DIMENSION: u32 = 32768;

/// Maximum allowed total pixels (width * height).
/// 100 megapixels = 400MB uncompressed RGBA.
pub const MAX_PIXELS: u64 = 100_000_000;

// =============================================================================
// MODULE DECOMPOSITION
// =============================================================================

mod batch;
mod buffer;
mod decoder;
mod encoder;
pub mod export;
mod notify;
mod pipeline;
mod resample;
mod sharpen;
mod tasks;

pub use batch::{BatchProcessor, BatchSummary, CancelHandle};
pub use buffer::{PixelBuffer, Resolution, CHANNELS};
pub use decoder::{check_dimensions, decode, detect_format};
pub use encoder::encode;
pub use notify::{Notification, NotificationSink, NullSink, Progress, QueueChanged, RecordingSink};
pub use pipeline::{
    fit_within, process, target_dimensions, Limits, ProcessingResult, StageMetrics,
    PREVIEW_MAX_EDGE,
};
pub use resample::resample;
pub use sharpen::sharpen;
pub use tasks::{
    status_label, BatchQueue, TaskId, TaskSnapshot, TaskStatus, UpscaleTask,
    DEFAULT_DISPLAY_SCALE,
};
