//! Directory-backed preset store.
//!
//! Layout under the assets root:
//!
//! ```text
//! {root}/{preset}/logo/logo.png
//! {root}/{preset}/pattern/pattern.png
//! ```
//!
//! A preset is just its directory; either asset may be missing.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use image::{ImageFormat, RgbaImage};

use super::error::PresetError;
use crate::codec::{decode, detect_format, DecodeLimits};
use crate::compositor::{CompositeError, OverlaySettings, OverlaySpec};

/// The two image slots of a preset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    Logo,
    Pattern,
}

impl AssetKind {
    pub const ALL: [AssetKind; 2] = [AssetKind::Logo, AssetKind::Pattern];

    pub fn as_str(&self) -> &'static str {
        match self {
            AssetKind::Logo => "logo",
            AssetKind::Pattern => "pattern",
        }
    }

    /// File name inside the asset's directory
    pub fn file_name(&self) -> String {
        format!("{}.png", self.as_str())
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssetKind {
    type Err = PresetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "logo" | "watermark" => Ok(AssetKind::Logo),
            "pattern" => Ok(AssetKind::Pattern),
            _ => Err(PresetError::UnknownAssetKind(s.to_string())),
        }
    }
}

/// A loaded preset
#[derive(Clone)]
pub struct Preset {
    pub name: String,
    pub logo: Option<RgbaImage>,
    pub pattern: Option<RgbaImage>,
}

impl fmt::Debug for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dims = |img: &Option<RgbaImage>| img.as_ref().map(|i| (i.width(), i.height()));
        f.debug_struct("Preset")
            .field("name", &self.name)
            .field("logo", &dims(&self.logo))
            .field("pattern", &dims(&self.pattern))
            .finish()
    }
}

impl Preset {
    /// Bind the logo to watermark settings. `None` when the preset has no logo.
    pub fn watermark_spec(
        &self,
        settings: OverlaySettings,
    ) -> Result<Option<OverlaySpec>, CompositeError> {
        self.logo
            .clone()
            .map(|logo| settings.into_spec(logo))
            .transpose()
    }

    /// Bind the pattern to pattern settings. `None` when the preset has no pattern.
    pub fn pattern_spec(
        &self,
        settings: OverlaySettings,
    ) -> Result<Option<OverlaySpec>, CompositeError> {
        self.pattern
            .clone()
            .map(|pattern| settings.into_spec(pattern))
            .transpose()
    }
}

/// Check a preset name before it is joined onto the assets root.
pub fn validate_name(name: &str) -> Result<(), PresetError> {
    if name.trim().is_empty() {
        return Err(PresetError::invalid_name(name, "name is empty"));
    }
    if name == "." || name == ".." {
        return Err(PresetError::invalid_name(name, "name is reserved"));
    }
    if name.contains(|c: char| c == '/' || c == '\\') {
        return Err(PresetError::invalid_name(name, "name contains a path separator"));
    }
    if name.contains('\0') {
        return Err(PresetError::invalid_name(name, "name contains a NUL byte"));
    }
    Ok(())
}

/// Preset CRUD over an assets directory
#[derive(Debug, Clone)]
pub struct PresetStore {
    root: PathBuf,
    limits: DecodeLimits,
}

impl PresetStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            limits: DecodeLimits::default(),
        }
    }

    /// Limits used when decoding stored assets
    pub fn with_limits(mut self, limits: DecodeLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn preset_dir(&self, name: &str) -> Result<PathBuf, PresetError> {
        validate_name(name)?;
        Ok(self.root.join(name))
    }

    fn existing_preset_dir(&self, name: &str) -> Result<PathBuf, PresetError> {
        let dir = self.preset_dir(name)?;
        if !dir.is_dir() {
            return Err(PresetError::NotFound(name.to_string()));
        }
        Ok(dir)
    }

    /// Path of an asset file, whether or not it exists.
    pub fn asset_path(&self, name: &str, kind: AssetKind) -> Result<PathBuf, PresetError> {
        Ok(self
            .preset_dir(name)?
            .join(kind.as_str())
            .join(kind.file_name()))
    }

    pub fn exists(&self, name: &str) -> bool {
        self.preset_dir(name).map(|dir| dir.is_dir()).unwrap_or(false)
    }

    /// Sorted preset names. A missing assets root means no presets.
    pub fn list(&self) -> Result<Vec<String>, PresetError> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    /// Create an empty preset with both asset directories.
    pub fn create(&self, name: &str) -> Result<(), PresetError> {
        let dir = self.preset_dir(name)?;
        if dir.exists() {
            return Err(PresetError::AlreadyExists(name.to_string()));
        }

        for kind in AssetKind::ALL {
            fs::create_dir_all(dir.join(kind.as_str()))?;
        }

        tracing::info!(preset = %name, path = %dir.display(), "Created preset");
        Ok(())
    }

    pub fn rename(&self, old: &str, new: &str) -> Result<(), PresetError> {
        let from = self.existing_preset_dir(old)?;
        let to = self.preset_dir(new)?;
        if to.exists() {
            return Err(PresetError::AlreadyExists(new.to_string()));
        }

        fs::rename(&from, &to)?;

        tracing::info!(from = %old, to = %new, "Renamed preset");
        Ok(())
    }

    /// Remove a preset and everything in it.
    pub fn delete(&self, name: &str) -> Result<(), PresetError> {
        let dir = self.existing_preset_dir(name)?;
        fs::remove_dir_all(&dir)?;

        tracing::info!(preset = %name, "Deleted preset");
        Ok(())
    }

    /// Replace one asset of an existing preset. Only PNG data is accepted.
    pub fn store_asset(&self, name: &str, kind: AssetKind, data: &[u8]) -> Result<PathBuf, PresetError> {
        let dir = self.existing_preset_dir(name)?;

        match detect_format(data) {
            Ok(ImageFormat::Png) => {}
            Ok(_) => return Err(PresetError::NotPng { kind }),
            Err(source) => return Err(PresetError::InvalidAsset { kind, source }),
        }
        decode(data, &self.limits).map_err(|source| PresetError::InvalidAsset { kind, source })?;

        let kind_dir = dir.join(kind.as_str());
        fs::create_dir_all(&kind_dir)?;
        let path = kind_dir.join(kind.file_name());
        fs::write(&path, data)?;

        tracing::info!(
            preset = %name,
            asset = %kind,
            size = data.len(),
            "Stored preset asset"
        );
        Ok(path)
    }

    /// Raw bytes of an asset, or `None` if it was never uploaded.
    pub fn read_asset(&self, name: &str, kind: AssetKind) -> Result<Option<Vec<u8>>, PresetError> {
        self.existing_preset_dir(name)?;
        let path = self.asset_path(name, kind)?;
        match fs::read(&path) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Load and decode both assets of a preset.
    ///
    /// A missing asset file leaves its slot empty; a file that exists but
    /// cannot be decoded is an error.
    pub fn load(&self, name: &str) -> Result<Preset, PresetError> {
        let mut preset = Preset {
            name: name.to_string(),
            logo: None,
            pattern: None,
        };

        for kind in AssetKind::ALL {
            let image = match self.read_asset(name, kind)? {
                Some(data) => Some(
                    decode(&data, &self.limits)
                        .map_err(|source| PresetError::InvalidAsset { kind, source })?
                        .to_rgba8(),
                ),
                None => {
                    tracing::debug!(preset = %name, asset = %kind, "Preset asset missing");
                    None
                }
            };
            match kind {
                AssetKind::Logo => preset.logo = image,
                AssetKind::Pattern => preset.pattern = image,
            }
        }

        Ok(preset)
    }
}
