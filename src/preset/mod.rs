//! Named presets: a logo and a background pattern stored on disk.
//!
//! Default overlay settings for a preset live in the configuration file
//! (see [`crate::config::Config::preset_defaults`]); the store only holds
//! the images.

pub mod error;
pub mod store;

pub use error::PresetError;
pub use store::{validate_name, AssetKind, Preset, PresetStore};
