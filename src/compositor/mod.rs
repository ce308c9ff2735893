//! Image compositing: center crop, overlay placement and alpha blending.
//!
//! # Overview
//!
//! A source image is cropped to an [`AspectRatio`], then up to two overlays
//! are blended onto it: a background pattern first, a watermark second.
//! Every step returns a new image; inputs are never modified.
//!
//! # Anchors
//!
//! Overlays are placed with one of five [`Anchor`]s:
//! `bottom-right` (default), `bottom-left`, `top-right`, `top-left`, `center`.
//! Corner anchors are inset by a padding fraction of the base size; `center`
//! ignores padding.
//!
//! # Configuration Example
//!
//! ```yaml
//! watermark:
//!   opacity: 0.5
//!   size_ratio: 0.2
//!   anchor: bottom-right
//!   padding: 0.05
//! pattern:
//!   opacity: 0.5
//!   size_ratio: 1.0
//!   anchor: top-left
//!   padding: 0.0
//!   fill_mode: true
//! ```

pub mod compose;
pub mod crop;
pub mod error;
pub mod overlay;
pub mod position;
pub mod ratio;

// Re-export main types for convenience
pub use compose::{blend_layer, composite, prepare_layer, Compositor, OverlayLayer};
pub use crop::{crop, crop_box, CropBox};
pub use error::CompositeError;
pub use overlay::{
    apply_opacity, overlay_size, resize_overlay, resize_overlay_region, OverlaySettings, OverlaySpec,
};
pub use position::{
    calculate_position, padding_pixels, scaled_floor, Anchor, Dimensions, PlacementPosition,
};
pub use ratio::AspectRatio;
