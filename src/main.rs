use anyhow::{bail, Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use image::RgbaImage;
use std::path::{Path, PathBuf};

use cropmark::codec::{decode, DecodeLimits};
use cropmark::compositor::{Anchor, AspectRatio, OverlaySettings};
use cropmark::config::{Config, OverlayOverrides, PresetDefaults};
use cropmark::export::{export_batch, preset_overlays, ExportInput, ExportOptions};
use cropmark::logging::{init_subscriber, LogFormat};
use cropmark::preset::{AssetKind, Preset, PresetStore};

/// Crop images to an aspect ratio, overlay a pattern and a watermark, export as WebP
#[derive(Parser, Debug)]
#[command(name = "cropmark")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log output format (text or json)
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Crop, composite and encode images
    Export(ExportArgs),

    /// Manage presets
    #[command(subcommand)]
    Preset(PresetCommand),
}

#[derive(ClapArgs, Debug)]
struct ExportArgs {
    /// Target aspect ratio, e.g. 4:3
    #[arg(short, long, default_value = "1:1")]
    ratio: AspectRatio,

    /// Watermark image
    #[arg(long, conflicts_with = "preset")]
    watermark: Option<PathBuf>,

    /// Take the watermark, pattern and their defaults from a preset
    #[arg(long)]
    preset: Option<String>,

    /// Background pattern image (replaces the preset's pattern)
    #[arg(long)]
    pattern: Option<PathBuf>,

    /// Skip the pattern even if the preset has one
    #[arg(long, conflicts_with = "pattern")]
    no_pattern: bool,

    #[arg(long)]
    watermark_opacity: Option<f32>,

    /// Watermark bounding box as a fraction of the image
    #[arg(long)]
    watermark_size: Option<f32>,

    /// Watermark anchor: bottom-right, bottom-left, top-right, top-left, center
    #[arg(long)]
    anchor: Option<Anchor>,

    /// Watermark inset as a fraction of the image
    #[arg(long)]
    padding: Option<f32>,

    #[arg(long)]
    pattern_opacity: Option<f32>,

    /// WebP quality (0-100)
    #[arg(short, long, value_parser = clap::value_parser!(u8).range(0..=100))]
    quality: Option<u8>,

    /// Encode losslessly
    #[arg(long)]
    lossless: bool,

    /// Output file, or a directory to write into
    #[arg(short, long)]
    output: PathBuf,

    /// Source images
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum PresetCommand {
    /// List presets
    List,
    /// Create an empty preset
    Create { name: String },
    /// Rename a preset
    Rename { old: String, new: String },
    /// Delete a preset and its images
    Delete {
        name: String,
        /// Confirm deletion
        #[arg(long)]
        yes: bool,
    },
    /// Show a preset's images and resolved overlay settings
    Show { name: String },
    /// Replace a preset's logo or pattern with a PNG file
    Upload {
        name: String,
        /// logo or pattern
        kind: AssetKind,
        file: PathBuf,
    },
}

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse();

    let config = Config::load(args.config.as_deref())
        .map_err(anyhow::Error::msg)
        .context("Failed to load configuration")?;

    // Initialize logging subsystem
    let mut logging = config.logging.clone();
    if let Some(format) = args.log_format {
        logging.format = format;
    }
    init_subscriber(&logging)
        .map_err(|e| anyhow::anyhow!(e))
        .context("Failed to initialize logging subsystem")?;

    tracing::debug!(
        config_file = ?args.config,
        assets_dir = %config.assets_dir.display(),
        presets = config.presets.len(),
        "Configuration loaded"
    );

    let store = PresetStore::new(&config.assets_dir).with_limits(config.limits);

    match args.command {
        Command::Export(export) => run_export(&config, &store, export),
        Command::Preset(command) => run_preset(&config, &store, command),
    }
}

/// Read an overlay image. A missing file means no overlay.
fn load_overlay(path: &Path, limits: &DecodeLimits) -> Result<Option<RgbaImage>> {
    let data = match std::fs::read(path) {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::warn!(path = %path.display(), "Overlay file not found, skipping overlay");
            return Ok(None);
        }
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to read overlay: {}", path.display()))
        }
    };
    let image = decode(&data, limits)
        .with_context(|| format!("Failed to decode overlay: {}", path.display()))?;
    Ok(Some(image.to_rgba8()))
}

fn run_export(config: &Config, store: &PresetStore, args: ExportArgs) -> Result<()> {
    let defaults = match &args.preset {
        Some(name) => config.preset_defaults(name),
        None => PresetDefaults {
            watermark: config.watermark_defaults(),
            pattern: config.pattern_defaults(),
        },
    };

    let watermark_flags = OverlayOverrides {
        opacity: args.watermark_opacity,
        size_ratio: args.watermark_size,
        anchor: args.anchor,
        padding: args.padding,
        fill_mode: None,
    };
    let pattern_flags = OverlayOverrides {
        opacity: args.pattern_opacity,
        ..Default::default()
    };

    let (mut watermark, mut pattern) = match &args.preset {
        Some(name) => {
            let overlays = preset_overlays(config, store, name, &watermark_flags, &pattern_flags)
                .with_context(|| format!("Failed to load preset '{}'", name))?;
            (overlays.watermark, overlays.pattern)
        }
        None => (None, None),
    };

    if let Some(path) = &args.watermark {
        let settings = watermark_flags.apply(defaults.watermark);
        watermark = load_overlay(path, &config.limits)?
            .map(|image| settings.into_spec(image))
            .transpose()?;
    }
    if let Some(path) = &args.pattern {
        let settings = pattern_flags.apply(defaults.pattern);
        pattern = load_overlay(path, &config.limits)?
            .map(|image| settings.into_spec(image))
            .transpose()?;
    }
    if args.no_pattern {
        pattern = None;
    }

    let mut inputs = Vec::with_capacity(args.inputs.len());
    for path in &args.inputs {
        match ExportInput::from_path(path) {
            Ok(input) => inputs.push(input),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Skipping unreadable input");
                eprintln!("skipped {}: {}", path.display(), e);
            }
        }
    }

    let options = ExportOptions::new(args.ratio)
        .with_quality(args.quality.unwrap_or(config.export.quality))
        .with_lossless(args.lossless || config.export.lossless)
        .with_pattern(pattern)
        .with_watermark(watermark)
        .with_limits(config.limits);

    let outcome = export_batch(&inputs, &options).context("Failed to build export")?;

    for failure in &outcome.failures {
        eprintln!("failed {}: {}", failure.file_name, failure.error);
    }

    let Some(output) = outcome.output else {
        bail!("No images were exported");
    };

    let target = if args.output.is_dir() {
        args.output.join(output.suggested_file_name())
    } else {
        args.output.clone()
    };
    std::fs::write(&target, output.bytes())
        .with_context(|| format!("Failed to write output: {}", target.display()))?;

    tracing::info!(
        output = %target.display(),
        size = output.bytes().len(),
        exported = outcome.exported,
        failed = outcome.failures.len(),
        "Wrote export"
    );
    println!("{}", target.display());

    Ok(())
}

fn describe_asset(preset: &Preset, kind: AssetKind) -> String {
    let image = match kind {
        AssetKind::Logo => &preset.logo,
        AssetKind::Pattern => &preset.pattern,
    };
    match image {
        Some(image) => format!("{}x{}", image.width(), image.height()),
        None => "none".to_string(),
    }
}

fn describe_settings(settings: &OverlaySettings) -> String {
    format!(
        "opacity={} size_ratio={} anchor={} padding={} fill_mode={}",
        settings.opacity, settings.size_ratio, settings.anchor, settings.padding, settings.fill_mode
    )
}

fn run_preset(config: &Config, store: &PresetStore, command: PresetCommand) -> Result<()> {
    match command {
        PresetCommand::List => {
            let names = store.list().context("Failed to list presets")?;
            if names.is_empty() {
                eprintln!("No presets in {}", store.root().display());
            }
            for name in names {
                println!("{}", name);
            }
        }
        PresetCommand::Create { name } => {
            store.create(&name)?;
            println!("Created preset '{}'", name);
        }
        PresetCommand::Rename { old, new } => {
            store.rename(&old, &new)?;
            println!("Renamed preset '{}' to '{}'", old, new);
        }
        PresetCommand::Delete { name, yes } => {
            if !yes {
                bail!(
                    "Refusing to delete preset '{}' and all its data without --yes",
                    name
                );
            }
            store.delete(&name)?;
            println!("Deleted preset '{}'", name);
        }
        PresetCommand::Show { name } => {
            let preset = store.load(&name)?;
            let defaults = config.preset_defaults(&name);
            println!("preset:    {}", preset.name);
            println!("logo:      {}", describe_asset(&preset, AssetKind::Logo));
            println!("pattern:   {}", describe_asset(&preset, AssetKind::Pattern));
            println!("watermark: {}", describe_settings(&defaults.watermark));
            println!("pattern:   {}", describe_settings(&defaults.pattern));
        }
        PresetCommand::Upload { name, kind, file } => {
            let data = std::fs::read(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let path = store.store_asset(&name, kind, &data)?;
            println!("Updated {}", path.display());
        }
    }
    Ok(())
}
