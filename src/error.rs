// src/error.rs
//
// Unified error handling for pixel-upscale
// Uses thiserror for simple, type-safe error handling
//
// Error Taxonomy:
// - UserError: Invalid input, recoverable
// - StateError: Queue/processor state does not allow the operation right now
// - CodecError: Decode/encode issues in the external collaborators
// - ResourceLimit: Dimension/pixel-count limits

use crate::engine::TaskId;
use std::borrow::Cow;
use thiserror::Error;

/// Error taxonomy used by hosts to decide how to surface a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorCategory {
    /// Invalid input, recoverable by user
    UserError,
    /// Operation conflicts with the current queue or processor state
    StateError,
    /// Format/encoding issues
    CodecError,
    /// Dimension/pixel limits
    ResourceLimit,
}

/// pixel-upscale error types
#[derive(Debug, Error)]
pub enum UpscaleError {
    // Input Errors
    #[error("Source image has degenerate dimensions {width}x{height}")]
    EmptySource { width: u32, height: u32 },

    #[error("Invalid scale factor: {value}. Must be a finite number greater than 0")]
    InvalidScaleFactor { value: f64 },

    #[error("Invalid target dimensions: width={width}, height={height}")]
    InvalidTargetDimensions { width: u32, height: u32 },

    #[error("Pixel data length {actual} does not match {width}x{height} RGBA (expected {expected})")]
    BufferSizeMismatch {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid value for {name}: {value}. {reason}")]
    InvalidArgument {
        name: Cow<'static, str>,
        value: Cow<'static, str>,
        reason: Cow<'static, str>,
    },

    // State Errors
    #[error("Task {id} is currently being processed and cannot be removed")]
    TaskBusy { id: TaskId },

    #[error("Task {id} is not in the queue")]
    TaskNotFound { id: TaskId },

    #[error("A batch run is already in progress")]
    AlreadyRunning,

    // Size Limit Errors
    #[error("Image dimension {dimension} exceeds maximum {max}")]
    DimensionExceedsLimit { dimension: u32, max: u32 },

    #[error("Image pixel count {pixels} exceeds maximum {max}")]
    PixelCountExceedsLimit { pixels: u64, max: u64 },

    // Codec Errors
    #[error("Unsupported image format: {format}")]
    UnsupportedFormat { format: Cow<'static, str> },

    #[error("Failed to decode image: {message}")]
    DecodeFailed { message: Cow<'static, str> },

    #[error("Failed to encode as {format}: {message}")]
    EncodeFailed {
        format: Cow<'static, str>,
        message: Cow<'static, str>,
    },

    // Export Errors
    #[error("Failed to write file '{path}': {source}")]
    FileWriteFailed {
        path: Cow<'static, str>,
        #[source]
        source: std::io::Error,
    },

    #[error("No completed images to export")]
    NothingToExport,
}

// Constructor Helpers
impl UpscaleError {
    pub fn empty_source(width: u32, height: u32) -> Self {
        Self::EmptySource { width, height }
    }

    pub fn invalid_scale_factor(value: f64) -> Self {
        Self::InvalidScaleFactor { value }
    }

    pub fn invalid_target_dimensions(width: u32, height: u32) -> Self {
        Self::InvalidTargetDimensions { width, height }
    }

    pub fn buffer_size_mismatch(width: u32, height: u32, expected: usize, actual: usize) -> Self {
        Self::BufferSizeMismatch {
            width,
            height,
            expected,
            actual,
        }
    }

    pub fn invalid_argument(
        name: impl Into<Cow<'static, str>>,
        value: impl Into<Cow<'static, str>>,
        reason: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self::InvalidArgument {
            name: name.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    pub fn task_busy(id: TaskId) -> Self {
        Self::TaskBusy { id }
    }

    pub fn task_not_found(id: TaskId) -> Self {
        Self::TaskNotFound { id }
    }

    pub fn already_running() -> Self {
        Self::AlreadyRunning
    }

    pub fn dimension_exceeds_limit(dimension: u32, max: u32) -> Self {
        Self::DimensionExceedsLimit { dimension, max }
    }

    pub fn pixel_count_exceeds_limit(pixels: u64, max: u64) -> Self {
        Self::PixelCountExceedsLimit { pixels, max }
    }

    pub fn unsupported_format(format: impl Into<Cow<'static, str>>) -> Self {
        Self::UnsupportedFormat {
            format: format.into(),
        }
    }

    pub fn decode_failed(message: impl Into<Cow<'static, str>>) -> Self {
        Self::DecodeFailed {
            message: message.into(),
        }
    }

    pub fn encode_failed(
        format: impl Into<Cow<'static, str>>,
        message: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self::EncodeFailed {
            format: format.into(),
            message: message.into(),
        }
    }

    pub fn file_write_failed(path: impl Into<Cow<'static, str>>, source: std::io::Error) -> Self {
        Self::FileWriteFailed {
            path: path.into(),
            source,
        }
    }

    pub fn nothing_to_export() -> Self {
        Self::NothingToExport
    }

    /// Check if this error is recoverable (user can fix it)
    ///
    /// Consistent with category(): only codec failures are treated as final,
    /// state errors clear once the current run finishes.
    pub fn is_recoverable(&self) -> bool {
        match self.category() {
            ErrorCategory::UserError | ErrorCategory::StateError | ErrorCategory::ResourceLimit => {
                true
            }
            ErrorCategory::CodecError => false,
        }
    }

    /// Get the error category for this error
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::EmptySource { .. }
            | Self::InvalidScaleFactor { .. }
            | Self::InvalidTargetDimensions { .. }
            | Self::BufferSizeMismatch { .. }
            | Self::InvalidArgument { .. }
            | Self::FileWriteFailed { .. }
            | Self::NothingToExport => ErrorCategory::UserError,

            Self::TaskBusy { .. } | Self::TaskNotFound { .. } | Self::AlreadyRunning => {
                ErrorCategory::StateError
            }

            Self::UnsupportedFormat { .. }
            | Self::DecodeFailed { .. }
            | Self::EncodeFailed { .. } => ErrorCategory::CodecError,

            Self::DimensionExceedsLimit { .. } | Self::PixelCountExceedsLimit { .. } => {
                ErrorCategory::ResourceLimit
            }
        }
    }

    /// True for the `InvalidInput` family: degenerate buffers and bad parameters.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            Self::EmptySource { .. }
                | Self::InvalidScaleFactor { .. }
                | Self::InvalidTargetDimensions { .. }
                | Self::BufferSizeMismatch { .. }
                | Self::InvalidArgument { .. }
        )
    }
}

impl ErrorCategory {
    /// Get string representation of error category
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::UserError => "UserError",
            ErrorCategory::StateError => "StateError",
            ErrorCategory::CodecError => "CodecError",
            ErrorCategory::ResourceLimit => "ResourceLimit",
        }
    }

    /// Get the PIXEL_UPSCALE_* error code string for this category
    pub fn code(&self) -> &'static str {
        match self {
            ErrorCategory::UserError => "PIXEL_UPSCALE_USER_ERROR",
            ErrorCategory::StateError => "PIXEL_UPSCALE_STATE_ERROR",
            ErrorCategory::CodecError => "PIXEL_UPSCALE_CODEC_ERROR",
            ErrorCategory::ResourceLimit => "PIXEL_UPSCALE_RESOURCE_LIMIT",
        }
    }
}

// Result type alias
pub type Result<T> = std::result::Result<T, UpscaleError>;
