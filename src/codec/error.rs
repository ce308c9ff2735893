//! Image codec error types
//!
//! Covers decoding, size limits, encoding and the compositing step that
//! sits between them in the export pipeline.

use std::fmt;

use crate::compositor::CompositeError;

/// Errors that can occur while decoding, processing or encoding an image
#[derive(Debug, Clone)]
pub enum ImageError {
    // === Decoding Errors ===
    /// Input buffer is empty
    EmptyInput,
    /// Image format is not supported
    UnsupportedFormat { format: String },
    /// Failed to decode image data
    DecodeFailed { message: String },

    // === Limit Errors ===
    /// Image dimensions exceed safety limits (image bomb protection)
    ImageBombDetected {
        width: u32,
        height: u32,
        pixels: u64,
        max_pixels: u64,
    },
    /// Input file size exceeds limit
    FileTooLarge { size: usize, max_size: usize },

    // === Processing Errors ===
    /// Crop or overlay step failed
    CompositeFailed(CompositeError),
    /// Encoding to output format failed
    EncodeFailed { format: String, message: String },
}

impl fmt::Display for ImageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Decoding errors
            ImageError::EmptyInput => write!(f, "Image data is empty"),
            ImageError::UnsupportedFormat { format } => {
                write!(f, "Unsupported image format: {}", format)
            }
            ImageError::DecodeFailed { message } => {
                write!(f, "Failed to decode image: {}", message)
            }

            // Limit errors
            ImageError::ImageBombDetected {
                width,
                height,
                pixels,
                max_pixels,
            } => {
                write!(
                    f,
                    "Image dimensions {}x{} ({} pixels) exceed limit of {} pixels",
                    width, height, pixels, max_pixels
                )
            }
            ImageError::FileTooLarge { size, max_size } => {
                write!(
                    f,
                    "File size {} bytes exceeds maximum {} bytes",
                    size, max_size
                )
            }

            // Processing errors
            ImageError::CompositeFailed(err) => write!(f, "Compositing failed: {}", err),
            ImageError::EncodeFailed { format, message } => {
                write!(f, "Failed to encode to {}: {}", format, message)
            }
        }
    }
}

impl std::error::Error for ImageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ImageError::CompositeFailed(err) => Some(err),
            _ => None,
        }
    }
}

impl From<CompositeError> for ImageError {
    fn from(err: CompositeError) -> Self {
        ImageError::CompositeFailed(err)
    }
}

impl ImageError {
    /// Whether the failure was caused by the input itself rather than by
    /// the processing that followed.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            ImageError::EmptyInput
                | ImageError::UnsupportedFormat { .. }
                | ImageError::DecodeFailed { .. }
                | ImageError::ImageBombDetected { .. }
                | ImageError::FileTooLarge { .. }
        )
    }

    /// Helper constructors for common error patterns
    pub fn unsupported_format(format: impl Into<String>) -> Self {
        ImageError::UnsupportedFormat {
            format: format.into(),
        }
    }

    pub fn decode_failed(message: impl Into<String>) -> Self {
        ImageError::DecodeFailed {
            message: message.into(),
        }
    }

    pub fn encode_failed(format: impl Into<String>, message: impl Into<String>) -> Self {
        ImageError::EncodeFailed {
            format: format.into(),
            message: message.into(),
        }
    }

    pub fn image_bomb(width: u32, height: u32, max_pixels: u64) -> Self {
        ImageError::ImageBombDetected {
            width,
            height,
            pixels: width as u64 * height as u64,
            max_pixels,
        }
    }
}
