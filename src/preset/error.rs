//! Error types for preset store operations

use thiserror::Error;

use super::store::AssetKind;
use crate::codec::ImageError;

#[derive(Error, Debug)]
pub enum PresetError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Preset '{0}' does not exist")]
    NotFound(String),

    #[error("Preset '{0}' already exists")]
    AlreadyExists(String),

    #[error("Invalid preset name '{name}': {reason}")]
    InvalidName { name: String, reason: &'static str },

    #[error("Unknown asset kind '{0}' (expected 'logo' or 'pattern')")]
    UnknownAssetKind(String),

    #[error("{kind} asset must be a PNG image")]
    NotPng { kind: AssetKind },

    #[error("Invalid {kind} asset: {source}")]
    InvalidAsset {
        kind: AssetKind,
        #[source]
        source: ImageError,
    },
}

impl PresetError {
    pub fn invalid_name(name: &str, reason: &'static str) -> Self {
        PresetError::InvalidName {
            name: name.to_string(),
            reason,
        }
    }
}
