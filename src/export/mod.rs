//! Batch export of composited images.
//!
//! [`export_batch`] runs every input through the pipeline and hands the
//! successes to [`collate`]: one result comes back as a single WebP buffer,
//! several come back as a ZIP archive. [`export_with_preset`] does the same
//! with the overlays of a stored preset.

pub mod collate;
pub mod pipeline;
pub mod resolve;

pub use collate::{collate, dedupe_names, sanitize_entry_name, CollateError, Collated, ExportItem};
pub use pipeline::{
    export_batch, export_one, BatchOutcome, ExportInput, ExportOptions, ItemFailure,
};
pub use resolve::{export_with_preset, preset_overlays, PresetOverlays};
