//! Source image decoding with size limits
//!
//! Dimensions are read from the container header and checked BEFORE the
//! full decode so that a small file claiming huge dimensions is rejected
//! without allocating its pixel buffer.

use std::io::Cursor;

use image::io::Reader as ImageReader;
use image::{DynamicImage, ImageFormat};
use serde::{Deserialize, Serialize};

use super::error::ImageError;

/// Limits applied to every decoded input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodeLimits {
    /// Maximum allowed source image width
    pub max_width: u32,
    /// Maximum allowed source image height
    pub max_height: u32,
    /// Maximum allowed total pixels (width * height)
    pub max_pixels: u64,
    /// Maximum source file size in bytes
    pub max_file_size: usize,
}

impl Default for DecodeLimits {
    fn default() -> Self {
        Self {
            max_width: 10000,
            max_height: 10000,
            max_pixels: 100_000_000,         // 100 megapixels
            max_file_size: 50 * 1024 * 1024, // 50MB
        }
    }
}

/// Formats accepted as export sources and overlay assets
pub const SUPPORTED_FORMATS: [ImageFormat; 7] = [
    ImageFormat::Png,
    ImageFormat::Jpeg,
    ImageFormat::WebP,
    ImageFormat::Gif,
    ImageFormat::Tiff,
    ImageFormat::Bmp,
    ImageFormat::Ico,
];

/// Identify the container from magic bytes.
///
/// Formats the decoder stack cannot read (HEIC, JPEG 2000, AVIF without a
/// decoder) come back as `UnsupportedFormat` with a recognizable name.
pub fn detect_format(data: &[u8]) -> Result<ImageFormat, ImageError> {
    if data.is_empty() {
        return Err(ImageError::EmptyInput);
    }

    match image::guess_format(data) {
        Ok(format) if SUPPORTED_FORMATS.contains(&format) => Ok(format),
        Ok(format) => Err(ImageError::unsupported_format(format_name(format))),
        Err(_) => Err(ImageError::unsupported_format(sniff_unsupported(data))),
    }
}

fn format_name(format: ImageFormat) -> String {
    format
        .extensions_str()
        .first()
        .map(|ext| ext.to_string())
        .unwrap_or_else(|| format!("{:?}", format).to_lowercase())
}

fn sniff_unsupported(data: &[u8]) -> &'static str {
    const JP2_SIGNATURE: &[u8] = b"\x00\x00\x00\x0CjP  \r\n\x87\n";
    const J2K_CODESTREAM: &[u8] = b"\xFF\x4F\xFF\x51";

    if data.starts_with(JP2_SIGNATURE) || data.starts_with(J2K_CODESTREAM) {
        return "jpeg2000";
    }
    if data.len() >= 12 && &data[4..8] == b"ftyp" {
        return match &data[8..12] {
            b"heic" | b"heix" | b"hevc" | b"hevx" => "heic",
            b"mif1" | b"msf1" | b"heif" => "heif",
            _ => "unknown",
        };
    }
    "unknown"
}

/// Validate image dimensions against the limits
pub fn validate_dimensions(width: u32, height: u32, limits: &DecodeLimits) -> Result<(), ImageError> {
    let pixels = width as u64 * height as u64;
    if width > limits.max_width || height > limits.max_height || pixels > limits.max_pixels {
        return Err(ImageError::image_bomb(width, height, limits.max_pixels));
    }
    Ok(())
}

/// Validate input size against the limits
pub fn validate_file_size(size: usize, limits: &DecodeLimits) -> Result<(), ImageError> {
    if size == 0 {
        return Err(ImageError::EmptyInput);
    }
    if size > limits.max_file_size {
        return Err(ImageError::FileTooLarge {
            size,
            max_size: limits.max_file_size,
        });
    }
    Ok(())
}

/// Decode raw bytes into an image after checking size and header dimensions.
pub fn decode(data: &[u8], limits: &DecodeLimits) -> Result<DynamicImage, ImageError> {
    validate_file_size(data.len(), limits)?;
    let format = detect_format(data)?;

    let (width, height) = ImageReader::with_format(Cursor::new(data), format)
        .into_dimensions()
        .map_err(|e| ImageError::decode_failed(e.to_string()))?;
    validate_dimensions(width, height, limits)?;

    let image = ImageReader::with_format(Cursor::new(data), format)
        .decode()
        .map_err(|e| ImageError::decode_failed(e.to_string()))?;

    tracing::debug!(
        format = ?format,
        width = image.width(),
        height = image.height(),
        "Decoded image"
    );

    Ok(image)
}
