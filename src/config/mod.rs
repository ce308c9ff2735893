// Configuration module

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use crate::codec::DecodeLimits;
use crate::compositor::{Anchor, OverlaySettings};
use crate::logging::LoggingConfig;
use crate::preset::validate_name;

/// Top-level configuration, loaded once at startup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Root directory of the preset store
    #[serde(default = "default_assets_dir")]
    pub assets_dir: PathBuf,
    #[serde(default)]
    pub export: ExportConfig,
    /// Overrides of the built-in watermark defaults
    #[serde(default)]
    pub watermark: OverlayOverrides,
    /// Overrides of the built-in pattern defaults
    #[serde(default)]
    pub pattern: OverlayOverrides,
    #[serde(default)]
    pub limits: DecodeLimits,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Per-preset overrides, applied on top of the global defaults
    #[serde(default)]
    pub presets: BTreeMap<String, PresetOverrides>,
}

fn default_assets_dir() -> PathBuf {
    PathBuf::from("./assets")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            assets_dir: default_assets_dir(),
            export: ExportConfig::default(),
            watermark: OverlayOverrides::default(),
            pattern: OverlayOverrides::default(),
            limits: DecodeLimits::default(),
            logging: LoggingConfig::default(),
            presets: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportConfig {
    /// WebP quality (0-100)
    #[serde(default = "default_quality")]
    pub quality: u8,
    #[serde(default)]
    pub lossless: bool,
}

fn default_quality() -> u8 {
    80
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            quality: default_quality(),
            lossless: false,
        }
    }
}

/// Partial overlay settings; unset fields inherit from the layer below.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct OverlayOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_ratio: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchor: Option<Anchor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub padding: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill_mode: Option<bool>,
}

impl OverlayOverrides {
    pub fn apply(&self, base: OverlaySettings) -> OverlaySettings {
        OverlaySettings {
            opacity: self.opacity.unwrap_or(base.opacity),
            size_ratio: self.size_ratio.unwrap_or(base.size_ratio),
            anchor: self.anchor.unwrap_or(base.anchor),
            padding: self.padding.unwrap_or(base.padding),
            fill_mode: self.fill_mode.unwrap_or(base.fill_mode),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PresetOverrides {
    #[serde(default)]
    pub watermark: OverlayOverrides,
    #[serde(default)]
    pub pattern: OverlayOverrides,
}

/// Resolved overlay settings for one preset
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PresetDefaults {
    pub watermark: OverlaySettings,
    pub pattern: OverlaySettings,
}

impl Config {
    pub fn from_yaml_with_env(yaml: &str) -> Result<Self, String> {
        // Replace ${VAR_NAME} with environment variable values
        let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").map_err(|e| e.to_string())?;

        let mut values = HashMap::new();
        for caps in re.captures_iter(yaml) {
            let var_name = &caps[1];
            let value = std::env::var(var_name).map_err(|_| {
                format!(
                    "Environment variable '{}' is referenced but not set",
                    var_name
                )
            })?;
            values.insert(var_name.to_string(), value);
        }

        let substituted = re.replace_all(yaml, |caps: &regex::Captures| {
            values.get(&caps[1]).cloned().unwrap_or_default()
        });

        // An empty document means "all defaults"
        if substituted.trim().is_empty() {
            return Ok(Config::default());
        }

        serde_yaml::from_str(&substituted).map_err(|e| e.to_string())
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {}", e))?;
        Self::from_yaml_with_env(&yaml)
    }

    /// Load from `path` when given, otherwise fall back to defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, String> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn watermark_defaults(&self) -> OverlaySettings {
        self.watermark.apply(OverlaySettings::watermark())
    }

    pub fn pattern_defaults(&self) -> OverlaySettings {
        self.pattern.apply(OverlaySettings::pattern())
    }

    /// Overlay settings for a preset: built-in defaults, then the global
    /// sections, then the preset's own overrides.
    pub fn preset_defaults(&self, name: &str) -> PresetDefaults {
        let overrides = self.presets.get(name).copied().unwrap_or_default();
        PresetDefaults {
            watermark: overrides.watermark.apply(self.watermark_defaults()),
            pattern: overrides.pattern.apply(self.pattern_defaults()),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.assets_dir.as_os_str().is_empty() {
            return Err("assets_dir cannot be empty".to_string());
        }

        if self.export.quality > 100 {
            return Err(format!(
                "export.quality must be between 0 and 100, got {}",
                self.export.quality
            ));
        }

        let limits = &self.limits;
        if limits.max_width == 0 || limits.max_height == 0 {
            return Err("limits.max_width and limits.max_height must be greater than 0".to_string());
        }
        if limits.max_pixels == 0 {
            return Err("limits.max_pixels must be greater than 0".to_string());
        }
        if limits.max_file_size == 0 {
            return Err("limits.max_file_size must be greater than 0".to_string());
        }

        self.watermark_defaults()
            .validate()
            .map_err(|e| format!("watermark: {}", e))?;
        self.pattern_defaults()
            .validate()
            .map_err(|e| format!("pattern: {}", e))?;

        for name in self.presets.keys() {
            validate_name(name).map_err(|e| format!("presets: {}", e))?;

            let defaults = self.preset_defaults(name);
            defaults
                .watermark
                .validate()
                .map_err(|e| format!("presets.{}.watermark: {}", name, e))?;
            defaults
                .pattern
                .validate()
                .map_err(|e| format!("presets.{}.pattern: {}", name, e))?;
        }

        Ok(())
    }
}
