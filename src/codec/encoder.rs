//! Image encoder abstraction
//!
//! Exports are always WebP; the trait keeps the pipeline independent of the
//! concrete codec and lets lossy and lossless output share one call site.

use super::error::ImageError;

/// Largest width or height a WebP bitstream can describe
pub const WEBP_MAX_DIMENSION: u32 = 16383;

/// Quality settings for image encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncoderQuality {
    /// Quality value (0-100, where 100 is best quality)
    pub quality: u8,
    /// Ignore `quality` and encode losslessly
    pub lossless: bool,
}

impl Default for EncoderQuality {
    fn default() -> Self {
        Self {
            quality: 80,
            lossless: false,
        }
    }
}

impl EncoderQuality {
    /// Create quality settings with specified quality level
    pub fn with_quality(quality: u8) -> Self {
        Self {
            quality: quality.min(100),
            lossless: false,
        }
    }

    pub fn lossless() -> Self {
        Self {
            lossless: true,
            ..Default::default()
        }
    }
}

/// Result of encoding an image
#[derive(Debug)]
pub struct EncodedImage {
    /// The encoded image data
    pub data: Vec<u8>,
    /// MIME type of `data`
    pub content_type: &'static str,
    /// File extension without the dot
    pub extension: &'static str,
}

/// Trait for image encoders
///
/// The trait is object-safe to allow dynamic dispatch when needed.
pub trait ImageEncoder: Send + Sync {
    /// Encode raw RGBA image data
    ///
    /// # Arguments
    /// * `data` - Raw pixel data in RGBA format (4 bytes per pixel)
    /// * `width` - Image width in pixels
    /// * `height` - Image height in pixels
    /// * `quality` - Quality settings
    fn encode(
        &self,
        data: &[u8],
        width: u32,
        height: u32,
        quality: EncoderQuality,
    ) -> Result<EncodedImage, ImageError>;

    /// Check if this encoder supports transparency
    fn supports_transparency(&self) -> bool;
}

/// WebP encoder
///
/// Lossy output goes through libwebp (`webp` crate) so the quality setting
/// is honored; lossless output uses the `image` crate's encoder.
#[derive(Debug, Default, Clone, Copy)]
pub struct WebPEncoder;

impl WebPEncoder {
    fn encode_lossy(data: &[u8], width: u32, height: u32, quality: u8) -> Vec<u8> {
        let encoder = webp::Encoder::from_rgba(data, width, height);
        encoder.encode(quality as f32).to_vec()
    }

    fn encode_lossless(data: &[u8], width: u32, height: u32) -> Result<Vec<u8>, ImageError> {
        use image::codecs::webp::WebPEncoder as ImageWebPEncoder;
        use image::ImageEncoder as _;
        use std::io::Cursor;

        let mut output = Cursor::new(Vec::new());
        let encoder = ImageWebPEncoder::new_lossless(&mut output);

        encoder
            .write_image(data, width, height, image::ColorType::Rgba8)
            .map_err(|e| ImageError::encode_failed("webp", e.to_string()))?;

        Ok(output.into_inner())
    }
}

impl ImageEncoder for WebPEncoder {
    fn encode(
        &self,
        data: &[u8],
        width: u32,
        height: u32,
        quality: EncoderQuality,
    ) -> Result<EncodedImage, ImageError> {
        if width == 0 || height == 0 {
            return Err(ImageError::encode_failed("webp", "image has no pixels"));
        }
        if width > WEBP_MAX_DIMENSION || height > WEBP_MAX_DIMENSION {
            return Err(ImageError::encode_failed(
                "webp",
                format!(
                    "{}x{} exceeds the WebP limit of {} pixels per side",
                    width, height, WEBP_MAX_DIMENSION
                ),
            ));
        }
        if data.len() != width as usize * height as usize * 4 {
            return Err(ImageError::encode_failed(
                "webp",
                format!(
                    "buffer of {} bytes does not match {}x{} RGBA",
                    data.len(),
                    width,
                    height
                ),
            ));
        }

        let bytes = if quality.lossless {
            Self::encode_lossless(data, width, height)?
        } else {
            Self::encode_lossy(data, width, height, quality.quality.min(100))
        };

        if bytes.is_empty() {
            return Err(ImageError::encode_failed("webp", "encoder produced no data"));
        }

        Ok(EncodedImage {
            data: bytes,
            content_type: "image/webp",
            extension: "webp",
        })
    }

    fn supports_transparency(&self) -> bool {
        true
    }
}

/// Encode an RGBA image to WebP.
pub fn encode(image: &image::RgbaImage, quality: EncoderQuality) -> Result<EncodedImage, ImageError> {
    WebPEncoder.encode(image.as_raw(), image.width(), image.height(), quality)
}
