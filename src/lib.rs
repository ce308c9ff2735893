// Cropmark: aspect-ratio cropping, pattern and watermark overlays, WebP export

pub mod codec;
pub mod compositor;
pub mod config;
pub mod error;
pub mod export;
pub mod logging;
pub mod preset;

pub use error::{Error, Result};
