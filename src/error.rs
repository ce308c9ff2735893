// Error types module

use thiserror::Error;

use crate::codec::ImageError;
use crate::compositor::CompositeError;
use crate::export::CollateError;
use crate::preset::PresetError;

/// Crate-wide error type
///
/// Wraps the error of each subsystem so callers driving a whole export
/// can use `?` across module boundaries.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration errors (invalid YAML, missing env vars, out-of-range values)
    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Image(#[from] ImageError),

    #[error(transparent)]
    Composite(#[from] CompositeError),

    #[error(transparent)]
    Preset(#[from] PresetError),

    #[error("Collation error: {0}")]
    Collate(#[from] CollateError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether the caller supplied bad input, as opposed to an environment
    /// or internal failure.
    pub fn is_user_error(&self) -> bool {
        match self {
            Error::Config(_) | Error::Composite(_) => true,
            Error::Image(err) => err.is_input_error(),
            Error::Preset(err) => !matches!(err, PresetError::Io(_)),
            Error::Collate(_) | Error::Io(_) => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
