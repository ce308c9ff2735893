//! Export End-to-End Integration Tests
//!
//! Tests the complete export flow:
//!   source bytes → decode → crop → pattern → watermark → WebP → collate
//!
//! Presets are read from a temporary assets directory.

use cropmark::codec::ImageError;
use cropmark::compositor::{Anchor, AspectRatio, OverlaySettings};
use cropmark::config::Config;
use cropmark::export::{
    export_batch, export_one, export_with_preset, Collated, ExportInput, ExportOptions,
};
use cropmark::preset::{AssetKind, PresetError, PresetStore};
use cropmark::Error;
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use std::io::{Cursor, Read};
use tempfile::TempDir;

/// Create a test JPEG image (solid red)
fn create_test_jpeg(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb([255, 0, 0]));
    let mut buffer = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut buffer, ImageFormat::Jpeg)
        .unwrap();
    buffer.into_inner()
}

/// Create a test PNG image with alpha
fn create_test_png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbaImage::from_fn(width, height, |x, y| {
        let alpha = if (x + y) % 2 == 0 { 255 } else { 128 };
        Rgba([0, 128, 255, alpha])
    });
    let mut buffer = Cursor::new(Vec::new());
    img.write_to(&mut buffer, ImageFormat::Png).unwrap();
    buffer.into_inner()
}

fn decode_webp(data: &[u8]) -> DynamicImage {
    assert_eq!(&data[0..4], b"RIFF");
    assert_eq!(&data[8..12], b"WEBP");
    image::load_from_memory_with_format(data, ImageFormat::WebP).expect("valid WebP")
}

#[test]
fn test_single_export_returns_webp_not_archive() {
    let options = ExportOptions::new(AspectRatio::new(16, 9).unwrap());
    let inputs = vec![ExportInput::new("holiday.jpg", create_test_jpeg(1600, 1200))];

    let outcome = export_batch(&inputs, &options).unwrap();
    assert!(outcome.is_complete());

    let item = match outcome.output {
        Some(Collated::Single(item)) => item,
        other => panic!("expected a single item, got {:?}", other),
    };
    assert_eq!(item.file_name(), "holiday.webp");

    let decoded = decode_webp(&item.data);
    assert_eq!((decoded.width(), decoded.height()), (1600, 900));
}

#[test]
fn test_batch_with_corrupt_input_exports_the_rest() {
    let options = ExportOptions::new(AspectRatio::new(4, 3).unwrap()).with_quality(60);
    let inputs = vec![
        ExportInput::new("a.jpg", create_test_jpeg(400, 400)),
        ExportInput::new("broken.png", b"\x89PNG\r\n\x1a\nthis is not a png".to_vec()),
        ExportInput::new("a.png", create_test_png(300, 500)),
        ExportInput::new("b.jpg", create_test_jpeg(90, 30)),
    ];

    let outcome = export_batch(&inputs, &options).unwrap();
    assert_eq!(outcome.exported, 3);
    assert_eq!(outcome.failures.len(), 1);
    assert_eq!(outcome.failures[0].file_name, "broken.png");
    assert!(matches!(
        outcome.failures[0].error,
        ImageError::DecodeFailed { .. }
    ));

    let output = outcome.output.expect("archive");
    assert!(output.is_archive());
    assert_eq!(output.suggested_file_name(), "export.zip");

    let mut archive = zip::ZipArchive::new(Cursor::new(output.into_bytes())).unwrap();
    let names: Vec<String> = (0..archive.len())
        .map(|i| archive.by_index(i).unwrap().name().to_string())
        .collect();
    assert_eq!(names, vec!["a.webp", "a (1).webp", "b.webp"]);

    let expected = [(400, 300), (300, 225), (40, 30)];
    for (name, (w, h)) in names.iter().zip(expected) {
        let mut data = Vec::new();
        archive.by_name(name).unwrap().read_to_end(&mut data).unwrap();
        let decoded = decode_webp(&data);
        assert_eq!((decoded.width(), decoded.height()), (w, h), "{}", name);
    }
}

#[test]
fn test_all_inputs_failing_yields_no_output() {
    let options = ExportOptions::default();
    let inputs = vec![ExportInput::new("x.bin", b"garbage".to_vec())];

    let outcome = export_batch(&inputs, &options).unwrap();
    assert!(outcome.output.is_none());
    assert_eq!(outcome.failures.len(), 1);
}

#[test]
fn test_export_with_preset_overlays() {
    let assets = TempDir::new().unwrap();
    let store = PresetStore::new(assets.path());
    store.create("brand").unwrap();

    let logo = RgbaImage::from_pixel(20, 20, Rgba([0, 255, 0, 255]));
    let mut logo_png = Cursor::new(Vec::new());
    logo.write_to(&mut logo_png, ImageFormat::Png).unwrap();
    store
        .store_asset("brand", AssetKind::Logo, logo_png.get_ref())
        .unwrap();

    let yaml = r#"
presets:
  brand:
    watermark:
      opacity: 1.0
      size_ratio: 0.25
      anchor: top-left
      padding: 0.0
"#;
    let config = Config::from_yaml_with_env(yaml).unwrap();
    config.validate().unwrap();

    let defaults = config.preset_defaults("brand");
    assert_eq!(defaults.watermark.anchor, Anchor::TopLeft);

    let preset = store.load("brand").unwrap();
    let options = ExportOptions::new(AspectRatio::SQUARE)
        .with_lossless(true)
        .with_watermark(preset.watermark_spec(defaults.watermark).unwrap())
        .with_pattern(preset.pattern_spec(defaults.pattern).unwrap());
    assert!(options.pattern.is_none());

    let item = export_one(
        &ExportInput::new("shot.jpg", create_test_jpeg(160, 80)),
        &options,
    )
    .unwrap();

    let decoded = decode_webp(&item.data).to_rgba8();
    assert_eq!(decoded.dimensions(), (80, 80));

    // 20x20 logo at the top-left corner, lossless output
    assert_eq!(*decoded.get_pixel(5, 5), Rgba([0, 255, 0, 255]));
    let far = decoded.get_pixel(60, 60);
    assert!(far[0] > 200 && far[1] < 60, "expected red, got {:?}", far);
}

#[test]
fn test_watermark_opacity_zero_matches_plain_export() {
    let source = create_test_jpeg(64, 64);
    let plain = ExportOptions::new(AspectRatio::SQUARE).with_lossless(true);
    let faded = plain.clone().with_watermark(Some(
        OverlaySettings {
            opacity: 0.0,
            ..OverlaySettings::watermark()
        }
        .into_spec(RgbaImage::from_pixel(8, 8, Rgba([0, 0, 0, 255])))
        .unwrap(),
    ));

    let input = ExportInput::new("same.jpg", source);
    let a = export_one(&input, &plain).unwrap();
    let b = export_one(&input, &faded).unwrap();
    assert_eq!(a.data, b.data);
}

#[test]
fn test_decode_limits_apply_per_item() {
    let config = Config::from_yaml_with_env("limits:\n  max_width: 100\n").unwrap();
    let options = ExportOptions::new(AspectRatio::SQUARE).with_limits(config.limits);

    let inputs = vec![
        ExportInput::new("small.png", create_test_png(50, 50)),
        ExportInput::new("wide.png", create_test_png(200, 50)),
    ];
    let outcome = export_batch(&inputs, &options).unwrap();

    assert_eq!(outcome.exported, 1);
    assert!(matches!(
        outcome.failures[0].error,
        ImageError::ImageBombDetected { width: 200, .. }
    ));
}

#[test]
fn test_export_with_preset_uses_stored_pattern() {
    let assets = TempDir::new().unwrap();
    let store = PresetStore::new(assets.path());
    store.create("tiles").unwrap();

    let pattern = RgbaImage::from_pixel(4, 4, Rgba([0, 0, 255, 255]));
    let mut pattern_png = Cursor::new(Vec::new());
    pattern.write_to(&mut pattern_png, ImageFormat::Png).unwrap();
    store
        .store_asset("tiles", AssetKind::Pattern, pattern_png.get_ref())
        .unwrap();

    let yaml = r#"
export:
  lossless: true
presets:
  tiles:
    pattern:
      opacity: 1.0
"#;
    let config = Config::from_yaml_with_env(yaml).unwrap();
    let inputs = vec![
        ExportInput::new("one.jpg", create_test_jpeg(60, 40)),
        ExportInput::new("two.jpg", create_test_jpeg(30, 30)),
    ];

    let outcome = export_with_preset(&config, &store, "tiles", AspectRatio::SQUARE, &inputs).unwrap();
    assert!(outcome.is_complete());

    let output = outcome.output.expect("archive");
    let mut archive = zip::ZipArchive::new(Cursor::new(output.into_bytes())).unwrap();
    let mut data = Vec::new();
    archive.by_name("one.webp").unwrap().read_to_end(&mut data).unwrap();

    let decoded = decode_webp(&data).to_rgba8();
    assert_eq!(decoded.dimensions(), (40, 40));
    let p = decoded.get_pixel(20, 20);
    assert!(p[2] > 250 && p[0] < 5, "expected the blue pattern, got {:?}", p);
}

#[test]
fn test_export_with_unknown_preset_is_user_error() {
    let assets = TempDir::new().unwrap();
    let store = PresetStore::new(assets.path());
    let inputs = vec![ExportInput::new("one.jpg", create_test_jpeg(10, 10))];

    let err = export_with_preset(&Config::default(), &store, "ghost", AspectRatio::SQUARE, &inputs)
        .unwrap_err();
    assert!(matches!(err, Error::Preset(PresetError::NotFound(ref name)) if name == "ghost"));
    assert!(err.is_user_error());
}

#[test]
fn test_export_with_invalid_config_is_config_error() {
    let assets = TempDir::new().unwrap();
    let store = PresetStore::new(assets.path());
    let mut config = Config::default();
    config.export.quality = 150;

    let err = export_with_preset(&config, &store, "any", AspectRatio::SQUARE, &[]).unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}

#[test]
fn test_thin_preset_pattern_exports() {
    let assets = TempDir::new().unwrap();
    let store = PresetStore::new(assets.path());
    store.create("stripe").unwrap();

    // 1px wide strip: fill mode stretches it far past the image
    let strip = RgbaImage::from_pixel(1, 1500, Rgba([255, 255, 255, 255]));
    let mut strip_png = Cursor::new(Vec::new());
    strip.write_to(&mut strip_png, ImageFormat::Png).unwrap();
    store
        .store_asset("stripe", AssetKind::Pattern, strip_png.get_ref())
        .unwrap();

    let inputs = vec![ExportInput::new("wide.jpg", create_test_jpeg(1500, 1500))];
    let outcome =
        export_with_preset(&Config::default(), &store, "stripe", AspectRatio::SQUARE, &inputs)
            .unwrap();
    assert!(outcome.is_complete());

    let item = match outcome.output {
        Some(Collated::Single(item)) => item,
        other => panic!("expected a single item, got {:?}", other),
    };
    let decoded = decode_webp(&item.data);
    assert_eq!((decoded.width(), decoded.height()), (1500, 1500));
}
