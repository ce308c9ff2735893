//! Preset-driven exports: resolve a preset's images and configured defaults
//! into overlays, then run the batch.

use crate::compositor::{AspectRatio, OverlaySpec};
use crate::config::{Config, OverlayOverrides};
use crate::preset::PresetStore;
use crate::{Error, Result};

use super::pipeline::{export_batch, BatchOutcome, ExportInput, ExportOptions};

/// Overlays of one preset, bound to their resolved settings.
#[derive(Debug, Clone, Default)]
pub struct PresetOverlays {
    pub watermark: Option<OverlaySpec>,
    pub pattern: Option<OverlaySpec>,
}

/// Load preset `name` and bind its logo and pattern to their settings.
///
/// Settings layer the built-in defaults, the global config sections, the
/// preset's config overrides and finally `watermark` / `pattern`. A slot
/// the preset has no image for stays `None`.
pub fn preset_overlays(
    config: &Config,
    store: &PresetStore,
    name: &str,
    watermark: &OverlayOverrides,
    pattern: &OverlayOverrides,
) -> Result<PresetOverlays> {
    let preset = store.load(name)?;
    let defaults = config.preset_defaults(name);

    let overlays = PresetOverlays {
        watermark: preset.watermark_spec(watermark.apply(defaults.watermark))?,
        pattern: preset.pattern_spec(pattern.apply(defaults.pattern))?,
    };

    tracing::debug!(
        preset = %name,
        watermark = overlays.watermark.is_some(),
        pattern = overlays.pattern.is_some(),
        "Resolved preset overlays"
    );

    Ok(overlays)
}

/// Export `inputs` with preset `name` and the configured export settings.
pub fn export_with_preset(
    config: &Config,
    store: &PresetStore,
    name: &str,
    ratio: AspectRatio,
    inputs: &[ExportInput],
) -> Result<BatchOutcome> {
    config.validate().map_err(Error::Config)?;

    let overlays = preset_overlays(
        config,
        store,
        name,
        &OverlayOverrides::default(),
        &OverlayOverrides::default(),
    )?;

    let options = ExportOptions::new(ratio)
        .with_quality(config.export.quality)
        .with_lossless(config.export.lossless)
        .with_pattern(overlays.pattern)
        .with_watermark(overlays.watermark)
        .with_limits(config.limits);

    Ok(export_batch(inputs, &options)?)
}
