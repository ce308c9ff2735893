//! Overlay specification, sizing and transparency.
//!
//! An overlay is a logo or pattern image plus the settings that decide how
//! large it is drawn, how transparent it is and where it sits.
//!
//! # Sizing
//!
//! The overlay is scaled to a bounding box of `size_ratio` times the base
//! dimensions. In normal mode it fits inside the box (watermarks); in fill
//! mode it covers the box and may overflow on one axis (background
//! patterns). Only the part of an overflowing overlay that lands on the
//! base is resampled; see [`resize_overlay_region`].

use fast_image_resize::{FilterType, Image, MulDiv, PixelType, ResizeAlg, Resizer};
use image::{imageops, RgbaImage};
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;

use super::crop::CropBox;
use super::position::{scaled_floor, Anchor, Dimensions};
use super::CompositeError;

fn default_opacity() -> f32 {
    0.5
}

fn default_size_ratio() -> f32 {
    0.20
}

fn default_padding() -> f32 {
    0.05
}

/// Overlay settings without the image itself.
///
/// Serde defaults match the watermark defaults; see [`OverlaySettings::pattern`]
/// for the background pattern defaults.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OverlaySettings {
    /// Multiplier applied to the overlay's alpha channel (0.0 to 1.0)
    #[serde(default = "default_opacity")]
    pub opacity: f32,

    /// Bounding box size as a fraction of the base image (0.0 to 1.0)
    #[serde(default = "default_size_ratio")]
    pub size_ratio: f32,

    #[serde(default)]
    pub anchor: Anchor,

    /// Inset from the anchored edges as a fraction of the base image (0.0 to 0.5)
    #[serde(default = "default_padding")]
    pub padding: f32,

    /// Cover the bounding box instead of fitting inside it
    #[serde(default)]
    pub fill_mode: bool,
}

impl Default for OverlaySettings {
    fn default() -> Self {
        Self::watermark()
    }
}

impl OverlaySettings {
    /// Defaults for a corner watermark.
    pub fn watermark() -> Self {
        Self {
            opacity: default_opacity(),
            size_ratio: default_size_ratio(),
            anchor: Anchor::BottomRight,
            padding: default_padding(),
            fill_mode: false,
        }
    }

    /// Defaults for a full-bleed background pattern.
    pub fn pattern() -> Self {
        Self {
            opacity: default_opacity(),
            size_ratio: 1.0,
            anchor: Anchor::TopLeft,
            padding: 0.0,
            fill_mode: true,
        }
    }

    /// Padding actually used for placement; always zero for the center anchor.
    pub fn effective_padding(&self) -> f32 {
        if self.anchor.uses_padding() {
            self.padding
        } else {
            0.0
        }
    }

    pub fn validate(&self) -> Result<(), CompositeError> {
        check_range("opacity", self.opacity, 0.0, 1.0)?;
        check_range("size_ratio", self.size_ratio, 0.0, 1.0)?;
        check_range("padding", self.padding, 0.0, 0.5)?;
        Ok(())
    }

    /// Bind an overlay image to these settings.
    pub fn into_spec(self, image: RgbaImage) -> Result<OverlaySpec, CompositeError> {
        OverlaySpec::new(image, self)
    }
}

fn check_range(param: &'static str, value: f32, min: f32, max: f32) -> Result<(), CompositeError> {
    // Check for NaN/Infinity and valid range
    if !value.is_finite() || !(min..=max).contains(&value) {
        return Err(CompositeError::invalid_param(
            param,
            format!(
                "must be a finite value between {} and {}, got {}",
                min, max, value
            ),
        ));
    }
    Ok(())
}

/// An overlay image with validated settings.
#[derive(Clone)]
pub struct OverlaySpec {
    image: RgbaImage,
    settings: OverlaySettings,
}

impl std::fmt::Debug for OverlaySpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OverlaySpec")
            .field("dimensions", &(self.image.width(), self.image.height()))
            .field("settings", &self.settings)
            .finish()
    }
}

impl OverlaySpec {
    pub fn new(image: RgbaImage, settings: OverlaySettings) -> Result<Self, CompositeError> {
        settings.validate()?;
        Ok(Self { image, settings })
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn settings(&self) -> &OverlaySettings {
        &self.settings
    }
}

/// Target size of an overlay drawn onto `base`.
///
/// Returns a zero dimension when the bounding box collapses; callers skip
/// such overlays.
pub fn overlay_size(
    base: &Dimensions,
    overlay: &Dimensions,
    size_ratio: f32,
    fill_mode: bool,
) -> Dimensions {
    if overlay.width == 0 || overlay.height == 0 {
        return Dimensions::new(0, 0);
    }

    let max_width = scaled_floor(base.width, size_ratio) as f64;
    let max_height = scaled_floor(base.height, size_ratio) as f64;

    let scale_x = max_width / overlay.width as f64;
    let scale_y = max_height / overlay.height as f64;
    let scale = if fill_mode {
        scale_x.max(scale_y)
    } else {
        scale_x.min(scale_y)
    };

    Dimensions::new(
        (overlay.width as f64 * scale).round() as u32,
        (overlay.height as f64 * scale).round() as u32,
    )
}

/// Resize an RGBA overlay with a Lanczos3 convolution.
///
/// Color channels are premultiplied by alpha for the duration of the
/// resize so transparent pixels do not bleed into visible edges.
pub fn resize_overlay(image: &RgbaImage, target: Dimensions) -> Result<RgbaImage, CompositeError> {
    if image.width() == target.width && image.height() == target.height {
        return Ok(image.clone());
    }

    let src_width = NonZeroU32::new(image.width())
        .ok_or_else(|| CompositeError::ResizeError("Source width is 0".to_string()))?;
    let src_height = NonZeroU32::new(image.height())
        .ok_or_else(|| CompositeError::ResizeError("Source height is 0".to_string()))?;
    let dst_width = NonZeroU32::new(target.width)
        .ok_or_else(|| CompositeError::ResizeError("Target width is 0".to_string()))?;
    let dst_height = NonZeroU32::new(target.height)
        .ok_or_else(|| CompositeError::ResizeError("Target height is 0".to_string()))?;

    let mut src_image = Image::from_vec_u8(
        src_width,
        src_height,
        image.as_raw().clone(),
        PixelType::U8x4,
    )
    .map_err(|e| CompositeError::ResizeError(format!("Failed to create source image: {:?}", e)))?;

    let alpha_mul_div = MulDiv::default();
    alpha_mul_div
        .multiply_alpha_inplace(&mut src_image.view_mut())
        .map_err(|e| CompositeError::ResizeError(format!("Alpha premultiply failed: {:?}", e)))?;

    let mut dst_image = Image::new(dst_width, dst_height, PixelType::U8x4);
    let mut dst_view = dst_image.view_mut();

    let mut resizer = Resizer::new(ResizeAlg::Convolution(FilterType::Lanczos3));
    resizer
        .resize(&src_image.view(), &mut dst_view)
        .map_err(|e| CompositeError::ResizeError(format!("Resize operation failed: {:?}", e)))?;

    alpha_mul_div
        .divide_alpha_inplace(&mut dst_view)
        .map_err(|e| CompositeError::ResizeError(format!("Alpha unpremultiply failed: {:?}", e)))?;

    RgbaImage::from_raw(target.width, target.height, dst_image.into_vec())
        .ok_or_else(|| CompositeError::ResizeError("Failed to create output image buffer".into()))
}

/// Resize the `visible` window of an overlay scaled to `target`.
///
/// `visible` is given in target pixels. The source is cut down to the pixels
/// that cover the window, rounded outward, and only that part is resampled.
/// Returns the resampled part and its offset inside `target`; the part
/// always covers the window and may extend slightly past it.
pub fn resize_overlay_region(
    image: &RgbaImage,
    target: Dimensions,
    visible: CropBox,
) -> Result<(RgbaImage, u32, u32), CompositeError> {
    let full = visible.x == 0
        && visible.y == 0
        && visible.width == target.width
        && visible.height == target.height;
    if full {
        return Ok((resize_overlay(image, target)?, 0, 0));
    }

    if image.width() == 0 || image.height() == 0 || target.width == 0 || target.height == 0 {
        return Err(CompositeError::ResizeError("Overlay has no pixels".to_string()));
    }
    if visible.width == 0
        || visible.height == 0
        || visible.x + visible.width > target.width
        || visible.y + visible.height > target.height
    {
        return Err(CompositeError::ResizeError(format!(
            "Visible window {:?} is outside the {}x{} overlay",
            visible, target.width, target.height
        )));
    }

    let (src_x, src_width, dst_x, dst_width) = map_span(
        visible.x,
        visible.x + visible.width,
        image.width(),
        target.width,
    );
    let (src_y, src_height, dst_y, dst_height) = map_span(
        visible.y,
        visible.y + visible.height,
        image.height(),
        target.height,
    );

    tracing::debug!(
        target_width = target.width,
        target_height = target.height,
        src_x,
        src_y,
        src_width,
        src_height,
        width = dst_width,
        height = dst_height,
        "Resampling visible part of overlay"
    );

    let source = imageops::crop_imm(image, src_x, src_y, src_width, src_height).to_image();
    let resized = resize_overlay(&source, Dimensions::new(dst_width, dst_height))?;
    Ok((resized, dst_x, dst_y))
}

/// Map the window `[start, end)` of a `target`-long axis onto the `source`
/// pixels covering it.
///
/// Returns `(source_start, source_len, target_start, target_len)`. Both
/// lengths are at least 1; `source` and `target` must be non-zero.
fn map_span(start: u32, end: u32, source: u32, target: u32) -> (u32, u32, u32, u32) {
    let (source_f, target_f) = (source as f64, target as f64);
    let src_start = ((start as f64 * source_f / target_f).floor() as u32).min(source - 1);
    let src_end = ((end as f64 * source_f / target_f).ceil() as u32).clamp(src_start + 1, source);

    let dst_start = ((src_start as f64 * target_f / source_f).round() as u32).min(target - 1);
    let dst_end = ((src_end as f64 * target_f / source_f).round() as u32).clamp(dst_start + 1, target);

    (src_start, src_end - src_start, dst_start, dst_end - dst_start)
}

/// Scale the alpha channel by `opacity` in place.
///
/// Fully transparent pixels stay transparent; color channels are untouched.
pub fn apply_opacity(image: &mut RgbaImage, opacity: f32) {
    let opacity = opacity.clamp(0.0, 1.0);
    if opacity >= 1.0 {
        return;
    }

    for pixel in image.pixels_mut() {
        pixel[3] = (pixel[3] as f32 * opacity).round().clamp(0.0, 255.0) as u8;
    }
}
