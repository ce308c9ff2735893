//! Overlay compositor for blending patterns and watermarks onto images.
//!
//! # Pipeline
//!
//! For each overlay: size it to its bounding box, place it at its anchor,
//! resample the part that lands on the base, scale its alpha by the opacity,
//! then alpha-blend it onto a copy of the base. The base image passed in is
//! never modified.
//!
//! # Example
//!
//! ```ignore
//! use cropmark::compositor::{AspectRatio, Compositor, OverlaySettings};
//!
//! let compositor = Compositor::new()
//!     .with_pattern(OverlaySettings::pattern().into_spec(pattern)?)
//!     .with_watermark(OverlaySettings::watermark().into_spec(logo)?);
//!
//! let result = compositor.render(&source, AspectRatio::new(4, 3)?)?;
//! ```

use image::{DynamicImage, Rgba, RgbaImage};

use super::crop::{crop, CropBox};
use super::overlay::{apply_opacity, overlay_size, resize_overlay_region, OverlaySpec};
use super::position::{calculate_position, Dimensions, PlacementPosition};
use super::{AspectRatio, CompositeError};

/// A prepared overlay ready to be blended: already resized and with its
/// opacity baked into the alpha channel.
#[derive(Clone)]
pub struct OverlayLayer {
    pub image: RgbaImage,
    pub position: PlacementPosition,
}

impl std::fmt::Debug for OverlayLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OverlayLayer")
            .field("dimensions", &(self.image.width(), self.image.height()))
            .field("position", &self.position)
            .finish()
    }
}

/// Crop plus optional pattern and watermark, applied in that order.
#[derive(Debug, Clone, Default)]
pub struct Compositor {
    pattern: Option<OverlaySpec>,
    watermark: Option<OverlaySpec>,
}

impl Compositor {
    /// Create a compositor with no overlays.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pattern(mut self, pattern: OverlaySpec) -> Self {
        self.pattern = Some(pattern);
        self
    }

    pub fn with_watermark(mut self, watermark: OverlaySpec) -> Self {
        self.watermark = Some(watermark);
        self
    }

    pub fn set_pattern(&mut self, pattern: Option<OverlaySpec>) {
        self.pattern = pattern;
    }

    pub fn set_watermark(&mut self, watermark: Option<OverlaySpec>) {
        self.watermark = watermark;
    }

    /// Number of overlays that will be applied.
    pub fn layer_count(&self) -> usize {
        self.pattern.is_some() as usize + self.watermark.is_some() as usize
    }

    /// Apply the overlays to an already cropped image.
    ///
    /// The pattern always goes first so the watermark ends up on top.
    pub fn apply(&self, base: &RgbaImage) -> Result<RgbaImage, CompositeError> {
        let mut result = base.clone();
        for spec in [&self.pattern, &self.watermark].into_iter().flatten() {
            result = composite(&result, spec)?;
        }
        Ok(result)
    }

    /// Crop `source` to `ratio` and apply the overlays.
    pub fn render(
        &self,
        source: &DynamicImage,
        ratio: AspectRatio,
    ) -> Result<RgbaImage, CompositeError> {
        let cropped = crop(source, ratio).to_rgba8();
        self.apply(&cropped)
    }
}

/// Resize, fade and position an overlay for a given base size.
///
/// Returns `None` when the overlay would be invisible: zero opacity or a
/// bounding box that collapses to nothing.
pub fn prepare_layer(
    base: &Dimensions,
    spec: &OverlaySpec,
) -> Result<Option<OverlayLayer>, CompositeError> {
    let settings = spec.settings();
    if settings.opacity <= 0.0 {
        return Ok(None);
    }

    let target = overlay_size(
        base,
        &Dimensions::of(spec.image()),
        settings.size_ratio,
        settings.fill_mode,
    );
    if target.width == 0 || target.height == 0 {
        tracing::debug!(
            base_width = base.width,
            base_height = base.height,
            size_ratio = settings.size_ratio,
            "Overlay collapses to an empty box, skipping"
        );
        return Ok(None);
    }

    let position = calculate_position(
        settings.anchor,
        base,
        &target,
        settings.effective_padding(),
    );
    let Some(visible) = visible_window(base, &target, position) else {
        tracing::debug!(
            x = position.x,
            y = position.y,
            "Overlay falls outside the base, skipping"
        );
        return Ok(None);
    };

    let (mut image, offset_x, offset_y) = resize_overlay_region(spec.image(), target, visible)?;
    apply_opacity(&mut image, settings.opacity);

    let position = PlacementPosition::new(
        position.x.saturating_add_unsigned(offset_x),
        position.y.saturating_add_unsigned(offset_y),
    );

    Ok(Some(OverlayLayer { image, position }))
}

/// Window of an overlay of `size` at `position` that falls inside `base`,
/// in overlay pixels. `None` when the two do not overlap.
fn visible_window(
    base: &Dimensions,
    size: &Dimensions,
    position: PlacementPosition,
) -> Option<CropBox> {
    let x = position.x as i64;
    let y = position.y as i64;

    let x_start = (-x).max(0);
    let y_start = (-y).max(0);
    let x_end = (base.width as i64 - x).min(size.width as i64);
    let y_end = (base.height as i64 - y).min(size.height as i64);

    if x_end <= x_start || y_end <= y_start {
        return None;
    }

    Some(CropBox {
        x: x_start as u32,
        y: y_start as u32,
        width: (x_end - x_start) as u32,
        height: (y_end - y_start) as u32,
    })
}

/// Composite a single overlay onto a copy of `base`.
pub fn composite(base: &RgbaImage, spec: &OverlaySpec) -> Result<RgbaImage, CompositeError> {
    let mut result = base.clone();

    if let Some(layer) = prepare_layer(&Dimensions::of(base), spec)? {
        tracing::debug!(
            anchor = %spec.settings().anchor,
            x = layer.position.x,
            y = layer.position.y,
            width = layer.image.width(),
            height = layer.image.height(),
            opacity = spec.settings().opacity,
            "Compositing overlay"
        );
        blend_layer(&mut result, &layer);
    }

    Ok(result)
}

/// Blend a prepared layer onto the target image, clipping to its bounds.
pub fn blend_layer(target: &mut RgbaImage, layer: &OverlayLayer) {
    let target_width = target.width() as i64;
    let target_height = target.height() as i64;

    let x = layer.position.x as i64;
    let y = layer.position.y as i64;

    // Calculate the visible region (clamp to target bounds)
    let x_start = x.max(0);
    let y_start = y.max(0);
    let x_end = (x + layer.image.width() as i64).min(target_width);
    let y_end = (y + layer.image.height() as i64).min(target_height);

    for ty in y_start..y_end {
        for tx in x_start..x_end {
            let overlay_pixel = layer.image.get_pixel((tx - x) as u32, (ty - y) as u32);
            let target_pixel = target.get_pixel_mut(tx as u32, ty as u32);
            *target_pixel = blend_pixels(*target_pixel, *overlay_pixel);
        }
    }
}

/// Blend two pixels using the Porter-Duff "over" operator.
fn blend_pixels(background: Rgba<u8>, foreground: Rgba<u8>) -> Rgba<u8> {
    match foreground[3] {
        0 => return background,
        255 => return foreground,
        _ => {}
    }

    let fg_alpha = foreground[3] as f32 / 255.0;
    let bg_alpha = background[3] as f32 / 255.0;

    let out_alpha = fg_alpha + bg_alpha * (1.0 - fg_alpha);

    let blend_channel = |fg: u8, bg: u8| -> u8 {
        let fg_f = fg as f32 / 255.0;
        let bg_f = bg as f32 / 255.0;
        let result = (fg_f * fg_alpha + bg_f * bg_alpha * (1.0 - fg_alpha)) / out_alpha;
        (result * 255.0).round().clamp(0.0, 255.0) as u8
    };

    Rgba([
        blend_channel(foreground[0], background[0]),
        blend_channel(foreground[1], background[1]),
        blend_channel(foreground[2], background[2]),
        (out_alpha * 255.0).round() as u8,
    ])
}
