//! Decoding source images and encoding results to WebP.
//!
//! Decoding enforces [`DecodeLimits`] (file size, per-axis and total pixel
//! counts) before any pixel buffer is allocated. Encoding always produces
//! WebP, lossy by default.

pub mod decoder;
pub mod encoder;
pub mod error;

pub use decoder::{decode, detect_format, validate_dimensions, validate_file_size, DecodeLimits};
pub use encoder::{encode, EncodedImage, EncoderQuality, ImageEncoder, WebPEncoder};
pub use error::ImageError;
