//! Collation of encoded results into one downloadable buffer.
//!
//! One item is returned as-is. Several items are packed into a DEFLATE ZIP
//! archive, one entry per item, with duplicate names disambiguated in input
//! order.

use std::collections::HashSet;
use std::io::{Cursor, Write};
use std::path::Path;

use thiserror::Error;
use zip::write::{FileOptions, ZipWriter};
use zip::CompressionMethod;

/// Name used when an item name reduces to nothing
pub const FALLBACK_NAME: &str = "image";

/// File name suggested for multi-item archives
pub const ARCHIVE_FILE_NAME: &str = "export.zip";

#[derive(Error, Debug)]
pub enum CollateError {
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// One encoded output awaiting collation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportItem {
    /// Name without extension
    pub name: String,
    pub data: Vec<u8>,
    /// Extension without the dot
    pub extension: String,
}

impl ExportItem {
    pub fn new(name: impl Into<String>, data: Vec<u8>, extension: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data,
            extension: extension.into(),
        }
    }

    pub fn file_name(&self) -> String {
        format!("{}.{}", self.name, self.extension)
    }
}

/// Collation result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Collated {
    /// Exactly one input; its buffer is untouched
    Single(ExportItem),
    /// ZIP archive bytes
    Archive(Vec<u8>),
}

impl Collated {
    pub fn bytes(&self) -> &[u8] {
        match self {
            Collated::Single(item) => &item.data,
            Collated::Archive(data) => data,
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            Collated::Single(item) => item.data,
            Collated::Archive(data) => data,
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            Collated::Single(item) if item.extension == "webp" => "image/webp",
            Collated::Single(_) => "application/octet-stream",
            Collated::Archive(_) => "application/zip",
        }
    }

    pub fn suggested_file_name(&self) -> String {
        match self {
            Collated::Single(item) => item.file_name(),
            Collated::Archive(_) => ARCHIVE_FILE_NAME.to_string(),
        }
    }

    pub fn is_archive(&self) -> bool {
        matches!(self, Collated::Archive(_))
    }
}

/// Strip any directory components from an entry name.
///
/// Both `/` and `\` count as separators so uploads from any platform end up
/// flat inside the archive.
pub fn sanitize_entry_name(name: &str) -> String {
    let normalized = name.replace('\\', "/");
    Path::new(&normalized)
        .file_name()
        .and_then(|n| n.to_str())
        .map(str::trim)
        .filter(|s| !s.is_empty() && *s != "." && *s != "..")
        .unwrap_or(FALLBACK_NAME)
        .to_string()
}

/// Make names unique, keeping the first occurrence as-is.
///
/// A repeated name gets ` (n)` appended with the smallest `n >= 1` not
/// already in use, so `["a", "a", "b"]` becomes `["a", "a (1)", "b"]`.
pub fn dedupe_names<S: AsRef<str>>(names: &[S]) -> Vec<String> {
    let mut used: HashSet<String> = HashSet::with_capacity(names.len());
    let mut result = Vec::with_capacity(names.len());

    for name in names {
        let name = name.as_ref();
        let unique = if used.contains(name) {
            (1..)
                .map(|n| format!("{} ({})", name, n))
                .find(|candidate| !used.contains(candidate))
                .unwrap_or_else(|| name.to_string())
        } else {
            name.to_string()
        };
        used.insert(unique.clone());
        result.push(unique);
    }

    result
}

/// Collate encoded items.
///
/// Returns `Ok(None)` for an empty input.
pub fn collate(items: Vec<ExportItem>) -> Result<Option<Collated>, CollateError> {
    match items.len() {
        0 => Ok(None),
        1 => Ok(items.into_iter().next().map(Collated::Single)),
        _ => build_archive(items).map(|data| Some(Collated::Archive(data))),
    }
}

fn build_archive(items: Vec<ExportItem>) -> Result<Vec<u8>, CollateError> {
    let names: Vec<String> = items
        .iter()
        .map(|item| sanitize_entry_name(&item.name))
        .collect();
    let names = dedupe_names(&names[..]);

    let mut buffer = Vec::new();
    {
        let mut zip = ZipWriter::new(Cursor::new(&mut buffer));
        let options = FileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .unix_permissions(0o644);

        for (item, name) in items.iter().zip(names) {
            let entry = format!("{}.{}", name, item.extension);
            tracing::debug!(entry = %entry, size = item.data.len(), "Adding archive entry");
            zip.start_file(entry, options)?;
            zip.write_all(&item.data)?;
        }

        zip.finish()?;
    }

    tracing::info!(
        entries = items.len(),
        size = buffer.len(),
        "Built export archive"
    );

    Ok(buffer)
}
