//! Anchor-based placement of overlays.
//!
//! Positions use a top-left origin with x growing right and y growing down.
//! Corner anchors are inset by a padding measured as a fraction of the base
//! image size; the center anchor ignores padding.
//!
//! # Example
//!
//! ```
//! use cropmark::compositor::{calculate_position, Anchor, Dimensions, PlacementPosition};
//!
//! let base = Dimensions::new(800, 600);
//! let overlay = Dimensions::new(100, 50);
//!
//! let pos = calculate_position(Anchor::BottomRight, &base, &overlay, 0.05);
//! assert_eq!(pos, PlacementPosition::new(660, 520)); // 800 - 100 - 40, 600 - 50 - 30
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::CompositeError;

/// Named position used to place an overlay on a base image.
///
/// Defaults to `BottomRight`, the placement watermarks used before anchors
/// were configurable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Anchor {
    #[default]
    BottomRight,
    BottomLeft,
    TopRight,
    TopLeft,
    Center,
}

impl Anchor {
    pub const ALL: [Anchor; 5] = [
        Anchor::BottomRight,
        Anchor::BottomLeft,
        Anchor::TopRight,
        Anchor::TopLeft,
        Anchor::Center,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BottomRight => "bottom-right",
            Self::BottomLeft => "bottom-left",
            Self::TopRight => "top-right",
            Self::TopLeft => "top-left",
            Self::Center => "center",
        }
    }

    /// Whether padding has any effect for this anchor.
    pub fn uses_padding(&self) -> bool {
        !matches!(self, Self::Center)
    }
}

impl fmt::Display for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Anchor {
    type Err = CompositeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(|c: char| c == '_' || c == ' ', "-");
        Self::ALL
            .iter()
            .copied()
            .find(|a| a.as_str() == normalized)
            .ok_or_else(|| CompositeError::UnknownAnchor(s.to_string()))
    }
}

/// Width and height of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn of(image: &image::RgbaImage) -> Self {
        Self::new(image.width(), image.height())
    }
}

/// Top-left corner where an overlay is placed. May be negative when the
/// overlay is larger than the base.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacementPosition {
    pub x: i32,
    pub y: i32,
}

impl PlacementPosition {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

// Relative slack for f32 fractions that widen to just under their decimal value
const FLOOR_TOLERANCE: f64 = 1e-6;

/// `floor(dim * fraction)` in `f64`; negative fractions give 0.
///
/// ```
/// use cropmark::compositor::scaled_floor;
///
/// assert_eq!(scaled_floor(100, 0.35), 35);
/// assert_eq!(scaled_floor(333, 0.05), 16);
/// ```
pub fn scaled_floor(dim: u32, fraction: f32) -> u32 {
    let product = dim as f64 * fraction as f64;
    (product * (1.0 + FLOOR_TOLERANCE)).floor().max(0.0) as u32
}

/// Padding in pixels for a base image: `floor(dim * fraction)` per axis.
pub fn padding_pixels(base: &Dimensions, padding_fraction: f32) -> (i32, i32) {
    (
        scaled_floor(base.width, padding_fraction) as i32,
        scaled_floor(base.height, padding_fraction) as i32,
    )
}

/// Calculate where an overlay of `overlay` size goes on `base`.
pub fn calculate_position(
    anchor: Anchor,
    base: &Dimensions,
    overlay: &Dimensions,
    padding_fraction: f32,
) -> PlacementPosition {
    // Fill-mode overlays can be far larger than the base; work in i64
    let base_w = base.width as i64;
    let base_h = base.height as i64;
    let ov_w = overlay.width as i64;
    let ov_h = overlay.height as i64;
    let (pad_x, pad_y) = padding_pixels(base, padding_fraction);
    let (pad_x, pad_y) = (pad_x as i64, pad_y as i64);

    let (x, y) = match anchor {
        Anchor::BottomRight => (base_w - ov_w - pad_x, base_h - ov_h - pad_y),
        Anchor::BottomLeft => (pad_x, base_h - ov_h - pad_y),
        Anchor::TopRight => (base_w - ov_w - pad_x, pad_y),
        Anchor::TopLeft => (pad_x, pad_y),
        Anchor::Center => ((base_w - ov_w) / 2, (base_h - ov_h) / 2),
    };

    PlacementPosition::new(clamp_i32(x), clamp_i32(y))
}

fn clamp_i32(value: i64) -> i32 {
    value.clamp(i32::MIN as i64, i32::MAX as i64) as i32
}
