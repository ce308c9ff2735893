//! Compositor error types.
//!
//! Defines errors raised while validating crop and overlay parameters or
//! while blending an overlay onto a base image.

use std::fmt;

/// Errors that can occur while cropping or compositing.
#[derive(Debug, Clone, PartialEq)]
pub enum CompositeError {
    /// Aspect ratio with a zero component or unparseable text
    InvalidRatio(String),

    /// Overlay parameter outside its allowed range
    InvalidParameter { param: &'static str, message: String },

    /// Unknown anchor name
    UnknownAnchor(String),

    /// Failed to resize the overlay image
    ResizeError(String),
}

impl CompositeError {
    pub fn invalid_param(param: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            param,
            message: message.into(),
        }
    }
}

impl fmt::Display for CompositeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidRatio(msg) => write!(f, "Invalid aspect ratio: {}", msg),
            Self::InvalidParameter { param, message } => {
                write!(f, "Invalid overlay parameter '{}': {}", param, message)
            }
            Self::UnknownAnchor(name) => write!(f, "Unknown anchor: '{}'", name),
            Self::ResizeError(msg) => write!(f, "Failed to resize overlay: {}", msg),
        }
    }
}

impl std::error::Error for CompositeError {}
