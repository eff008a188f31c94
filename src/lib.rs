// lib.rs
//
// pixel-upscale: image upscaling with classic resampling kernels and a
// sequential batch queue.
//
// Design goals:
// - Deterministic, dependency-light kernels over RGBA8 buffers
// - Per-task failure isolation in batches
// - Host-agnostic notifications (UI, log, channel)

pub mod engine;
pub mod error;
pub mod ops;

pub use engine::{
    process, resample, sharpen, BatchProcessor, BatchQueue, NotificationSink, PixelBuffer,
    ProcessingResult, TaskId, TaskStatus,
};
pub use error::{ErrorCategory, UpscaleError};
pub use ops::{Algorithm, OutputFormat, UpscaleOptions};

/// Get library version
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Get supported input formats
pub fn supported_input_formats() -> Vec<String> {
    vec![
        "jpeg".to_string(),
        "jpg".to_string(),
        "png".to_string(),
        "webp".to_string(),
    ]
}

/// Get supported output formats
pub fn supported_output_formats() -> Vec<String> {
    vec!["png".to_string(), "jpeg".to_string(), "jpg".to_string()]
}
