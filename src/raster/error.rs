//! Raster error types
//!
//! Low-level failures from decoding, resizing, compositing and encoding.
//! Callers that know which file was involved convert these into
//! `PosterError` with the path attached.

use std::fmt;

/// Errors that can occur during raster operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RasterError {
    /// Failed to decode image data
    DecodeFailed { message: String },
    /// Image decoded but has a zero width or height
    EmptyImage { width: u32, height: u32 },
    /// Resize operation failed
    ResizeFailed { message: String },
    /// Compositing operands differ in size
    DimensionMismatch {
        base: (u32, u32),
        overlay: (u32, u32),
    },
    /// Encoding to output format failed
    EncodeFailed { format: String, message: String },
    /// Colour string could not be parsed
    InvalidColor { message: String },
}

impl fmt::Display for RasterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RasterError::DecodeFailed { message } => {
                write!(f, "Failed to decode image: {}", message)
            }
            RasterError::EmptyImage { width, height } => {
                write!(f, "Image has a zero dimension: {}x{}", width, height)
            }
            RasterError::ResizeFailed { message } => {
                write!(f, "Resize failed: {}", message)
            }
            RasterError::DimensionMismatch { base, overlay } => {
                write!(
                    f,
                    "Cannot composite {}x{} overlay onto {}x{} base",
                    overlay.0, overlay.1, base.0, base.1
                )
            }
            RasterError::EncodeFailed { format, message } => {
                write!(f, "Failed to encode to {}: {}", format, message)
            }
            RasterError::InvalidColor { message } => {
                write!(f, "Invalid color: {}", message)
            }
        }
    }
}

impl std::error::Error for RasterError {}

impl RasterError {
    pub fn decode_failed(message: impl Into<String>) -> Self {
        RasterError::DecodeFailed {
            message: message.into(),
        }
    }

    pub fn resize_failed(message: impl Into<String>) -> Self {
        RasterError::ResizeFailed {
            message: message.into(),
        }
    }

    pub fn encode_failed(format: impl Into<String>, message: impl Into<String>) -> Self {
        RasterError::EncodeFailed {
            format: format.into(),
            message: message.into(),
        }
    }

    pub fn invalid_color(message: impl Into<String>) -> Self {
        RasterError::InvalidColor {
            message: message.into(),
        }
    }
}
