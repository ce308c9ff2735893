// Error module unit tests

use cropmark::codec::ImageError;
use cropmark::compositor::CompositeError;
use cropmark::preset::PresetError;
use cropmark::Error;

#[test]
fn test_config_error_display() {
    let err = Error::Config("assets_dir cannot be empty".to_string());
    assert_eq!(
        err.to_string(),
        "Configuration error: assets_dir cannot be empty"
    );
    assert!(err.is_user_error());
}

#[test]
fn test_image_error_is_transparent() {
    let err: Error = ImageError::unsupported_format("heic").into();
    assert_eq!(err.to_string(), "Unsupported image format: heic");
    assert!(err.is_user_error());

    let err: Error = ImageError::encode_failed("webp", "boom").into();
    assert!(!err.is_user_error());
}

#[test]
fn test_composite_error_converts() {
    let err: Error = CompositeError::UnknownAnchor("middle".to_string()).into();
    assert!(matches!(err, Error::Composite(_)));
    assert!(err.is_user_error());
}

#[test]
fn test_preset_errors() {
    let err: Error = PresetError::NotFound("brand".to_string()).into();
    assert_eq!(err.to_string(), "Preset 'brand' does not exist");
    assert!(err.is_user_error());

    let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
    let err: Error = PresetError::from(io).into();
    assert!(!err.is_user_error());
}

#[test]
fn test_io_error_converts() {
    let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
    let err: Error = io.into();
    assert!(err.to_string().contains("gone"));
}
