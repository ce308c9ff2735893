//! Export pipeline: decode → crop → pattern → watermark → encode → collate.
//!
//! Each input is processed independently. A failing input is logged and
//! reported in [`BatchOutcome::failures`]; the remaining inputs still make
//! it into the collated output.

use std::path::Path;
use std::time::Instant;

use crate::codec::{decode, encode, DecodeLimits, EncoderQuality, ImageError};
use crate::compositor::{AspectRatio, Compositor, OverlaySpec};

use super::collate::{collate, CollateError, Collated, ExportItem, FALLBACK_NAME};

/// One uploaded source image
#[derive(Debug, Clone)]
pub struct ExportInput {
    /// Original file name, including any extension
    pub file_name: String,
    pub data: Vec<u8>,
}

impl ExportInput {
    pub fn new(file_name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            data,
        }
    }

    /// Read an input from disk, keeping only the file name.
    pub fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(FALLBACK_NAME)
            .to_string();
        Ok(Self { file_name, data })
    }

    /// Output name: the file name without its extension.
    pub fn stem(&self) -> String {
        let normalized = self.file_name.replace('\\', "/");
        Path::new(&normalized)
            .file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(FALLBACK_NAME)
            .to_string()
    }
}

/// Parameters shared by every item of an export
#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub ratio: AspectRatio,
    /// WebP quality (0-100)
    pub quality: u8,
    pub lossless: bool,
    pub pattern: Option<OverlaySpec>,
    pub watermark: Option<OverlaySpec>,
    pub limits: DecodeLimits,
}

impl Default for ExportOptions {
    fn default() -> Self {
        let quality = EncoderQuality::default();
        Self {
            ratio: AspectRatio::default(),
            quality: quality.quality,
            lossless: quality.lossless,
            pattern: None,
            watermark: None,
            limits: DecodeLimits::default(),
        }
    }
}

impl ExportOptions {
    pub fn new(ratio: AspectRatio) -> Self {
        Self {
            ratio,
            ..Default::default()
        }
    }

    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality = quality;
        self
    }

    pub fn with_lossless(mut self, lossless: bool) -> Self {
        self.lossless = lossless;
        self
    }

    pub fn with_pattern(mut self, pattern: Option<OverlaySpec>) -> Self {
        self.pattern = pattern;
        self
    }

    pub fn with_watermark(mut self, watermark: Option<OverlaySpec>) -> Self {
        self.watermark = watermark;
        self
    }

    pub fn with_limits(mut self, limits: DecodeLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn encoder_quality(&self) -> EncoderQuality {
        EncoderQuality {
            quality: self.quality.min(100),
            lossless: self.lossless,
        }
    }

    fn compositor(&self) -> Compositor {
        let mut compositor = Compositor::new();
        compositor.set_pattern(self.pattern.clone());
        compositor.set_watermark(self.watermark.clone());
        compositor
    }
}

/// An input that could not be exported
#[derive(Debug, Clone)]
pub struct ItemFailure {
    pub file_name: String,
    pub error: ImageError,
}

/// Result of a batch export
#[derive(Debug)]
pub struct BatchOutcome {
    /// `None` when nothing was exported
    pub output: Option<Collated>,
    pub failures: Vec<ItemFailure>,
    /// Number of inputs that made it into `output`
    pub exported: usize,
}

impl BatchOutcome {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Export a single image.
pub fn export_one(input: &ExportInput, options: &ExportOptions) -> Result<ExportItem, ImageError> {
    render_item(input, &options.compositor(), options)
}

fn render_item(
    input: &ExportInput,
    compositor: &Compositor,
    options: &ExportOptions,
) -> Result<ExportItem, ImageError> {
    let start = Instant::now();

    let source = decode(&input.data, &options.limits)?;
    let rendered = compositor.render(&source, options.ratio)?;
    let encoded = encode(&rendered, options.encoder_quality())?;

    tracing::debug!(
        source_width = source.width(),
        source_height = source.height(),
        width = rendered.width(),
        height = rendered.height(),
        size = encoded.data.len(),
        duration_ms = start.elapsed().as_millis() as u64,
        "Exported image"
    );

    Ok(ExportItem::new(input.stem(), encoded.data, encoded.extension))
}

/// Export every input and collate the successes.
///
/// Only a collation failure aborts the batch; per-item failures are
/// collected in the outcome.
pub fn export_batch(
    inputs: &[ExportInput],
    options: &ExportOptions,
) -> Result<BatchOutcome, CollateError> {
    let compositor = options.compositor();
    let mut items = Vec::with_capacity(inputs.len());
    let mut failures = Vec::new();

    tracing::info!(
        inputs = inputs.len(),
        ratio = %options.ratio,
        layers = compositor.layer_count(),
        quality = options.quality,
        lossless = options.lossless,
        "Starting export"
    );

    for input in inputs {
        let span = tracing::info_span!("export_item", file = %input.file_name);
        let _enter = span.enter();

        match render_item(input, &compositor, options) {
            Ok(item) => items.push(item),
            Err(error) => {
                tracing::warn!(error = %error, "Skipping image");
                failures.push(ItemFailure {
                    file_name: input.file_name.clone(),
                    error,
                });
            }
        }
    }

    let exported = items.len();
    let output = collate(items)?;

    tracing::info!(
        exported,
        failed = failures.len(),
        archive = output.as_ref().map(Collated::is_archive).unwrap_or(false),
        "Export finished"
    );

    Ok(BatchOutcome {
        output,
        failures,
        exported,
    })
}
