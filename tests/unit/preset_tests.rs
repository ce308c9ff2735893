// Preset store unit tests

use cropmark::compositor::OverlaySettings;
use cropmark::preset::{AssetKind, PresetError, PresetStore};
use image::{ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;
use tempfile::TempDir;

fn png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbaImage::from_pixel(width, height, Rgba([10, 200, 30, 180]));
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png).unwrap();
    buf.into_inner()
}

fn setup() -> (TempDir, PresetStore) {
    let dir = TempDir::new().unwrap();
    let store = PresetStore::new(dir.path());
    (dir, store)
}

#[test]
fn test_list_is_sorted_and_ignores_files() {
    let (dir, store) = setup();
    store.create("zeta").unwrap();
    store.create("alpha").unwrap();
    store.create("Mid").unwrap();
    std::fs::write(dir.path().join("notes.txt"), b"not a preset").unwrap();

    assert_eq!(store.list().unwrap(), vec!["Mid", "alpha", "zeta"]);
}

#[test]
fn test_create_rename_delete_cycle() {
    let (dir, store) = setup();

    store.create("old").unwrap();
    assert!(store.exists("old"));

    store.rename("old", "new").unwrap();
    assert!(!store.exists("old"));
    assert!(dir.path().join("new/logo").is_dir());

    store.delete("new").unwrap();
    assert!(store.list().unwrap().is_empty());
}

#[test]
fn test_rename_errors() {
    let (_dir, store) = setup();
    store.create("a").unwrap();
    store.create("b").unwrap();

    assert!(matches!(
        store.rename("a", "b"),
        Err(PresetError::AlreadyExists(name)) if name == "b"
    ));
    assert!(matches!(
        store.rename("missing", "c"),
        Err(PresetError::NotFound(_))
    ));
    assert!(matches!(
        store.rename("a", "../c"),
        Err(PresetError::InvalidName { .. })
    ));
}

#[test]
fn test_delete_missing_fails() {
    let (_dir, store) = setup();
    assert!(matches!(store.delete("ghost"), Err(PresetError::NotFound(_))));
}

#[test]
fn test_upload_then_load_round_trip() {
    let (dir, store) = setup();
    store.create("brand").unwrap();

    let logo_path = store.store_asset("brand", AssetKind::Logo, &png(30, 10)).unwrap();
    store.store_asset("brand", AssetKind::Pattern, &png(64, 64)).unwrap();
    assert_eq!(logo_path, dir.path().join("brand/logo/logo.png"));

    let preset = store.load("brand").unwrap();
    assert_eq!(preset.logo.as_ref().unwrap().dimensions(), (30, 10));
    assert_eq!(preset.pattern.as_ref().unwrap().dimensions(), (64, 64));
    assert_eq!(*preset.logo.as_ref().unwrap().get_pixel(0, 0), Rgba([10, 200, 30, 180]));

    let spec = preset
        .pattern_spec(OverlaySettings::pattern())
        .unwrap()
        .expect("pattern present");
    assert!(spec.settings().fill_mode);
}

#[test]
fn test_empty_preset_loads_without_overlays() {
    let (_dir, store) = setup();
    store.create("blank").unwrap();

    let preset = store.load("blank").unwrap();
    assert!(preset.logo.is_none());
    assert!(preset.pattern.is_none());
    assert!(preset
        .watermark_spec(OverlaySettings::watermark())
        .unwrap()
        .is_none());
}

#[test]
fn test_upload_to_missing_preset_fails() {
    let (_dir, store) = setup();
    let err = store
        .store_asset("ghost", AssetKind::Logo, &png(2, 2))
        .unwrap_err();
    assert!(matches!(err, PresetError::NotFound(_)));
}

#[test]
fn test_upload_garbage_rejected() {
    let (_dir, store) = setup();
    store.create("brand").unwrap();
    let err = store
        .store_asset("brand", AssetKind::Pattern, b"plain text")
        .unwrap_err();
    assert!(matches!(err, PresetError::InvalidAsset { .. }));
    assert!(store.read_asset("brand", AssetKind::Pattern).unwrap().is_none());
}

#[test]
fn test_read_asset_returns_stored_bytes() {
    let (_dir, store) = setup();
    store.create("brand").unwrap();
    let data = png(5, 5);
    store.store_asset("brand", AssetKind::Logo, &data).unwrap();

    assert_eq!(store.read_asset("brand", AssetKind::Logo).unwrap(), Some(data));
}
