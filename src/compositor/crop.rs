//! Center crop to a target aspect ratio.
//!
//! The crop keeps the full source width whenever the ratio allows it and
//! only narrows the image when the ratio-derived height would not fit.
//! The result is never larger than the source.

use image::DynamicImage;

use super::AspectRatio;

/// Crop rectangle in source pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Compute the largest centered box of `ratio` that fits in `width` x `height`.
pub fn crop_box(width: u32, height: u32, ratio: AspectRatio) -> CropBox {
    let rw = ratio.width() as u64;
    let rh = ratio.height() as u64;

    let mut target_width = width as u64;
    let mut target_height = width as u64 * rh / rw;

    if target_height > height as u64 {
        target_height = height as u64;
        target_width = height as u64 * rw / rh;
    }

    // Extreme ratios on tiny sources can truncate to zero.
    let target_width = (target_width as u32).clamp(1u32.min(width), width);
    let target_height = (target_height as u32).clamp(1u32.min(height), height);

    CropBox {
        x: (width - target_width) / 2,
        y: (height - target_height) / 2,
        width: target_width,
        height: target_height,
    }
}

/// Crop `image` to `ratio`, returning a new image.
pub fn crop(image: &DynamicImage, ratio: AspectRatio) -> DynamicImage {
    let b = crop_box(image.width(), image.height(), ratio);

    if b.width == image.width() && b.height == image.height() {
        return image.clone();
    }

    tracing::debug!(
        source_width = image.width(),
        source_height = image.height(),
        x = b.x,
        y = b.y,
        width = b.width,
        height = b.height,
        ratio = %ratio,
        "Cropping image"
    );

    image.crop_imm(b.x, b.y, b.width, b.height)
}
