// Overlay placement and blending unit tests

use cropmark::compositor::{
    calculate_position, composite, overlay_size, prepare_layer, Anchor, AspectRatio,
    CompositeError, Compositor, Dimensions, OverlaySettings, OverlaySpec, PlacementPosition,
};
use image::{DynamicImage, Rgba, RgbaImage};
use rstest::rstest;

const GRAY: Rgba<u8> = Rgba([128, 128, 128, 255]);
const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);

fn solid(width: u32, height: u32, color: Rgba<u8>) -> RgbaImage {
    RgbaImage::from_pixel(width, height, color)
}

fn settings(opacity: f32, size_ratio: f32, anchor: Anchor, padding: f32) -> OverlaySettings {
    OverlaySettings {
        opacity,
        size_ratio,
        anchor,
        padding,
        fill_mode: false,
    }
}

#[rstest]
#[case(Anchor::BottomRight, 0.05, PlacementPosition::new(660, 520))]
#[case(Anchor::BottomLeft, 0.05, PlacementPosition::new(40, 520))]
#[case(Anchor::TopRight, 0.05, PlacementPosition::new(660, 30))]
#[case(Anchor::TopLeft, 0.05, PlacementPosition::new(40, 30))]
#[case(Anchor::Center, 0.05, PlacementPosition::new(350, 275))]
#[case(Anchor::Center, 0.0, PlacementPosition::new(350, 275))]
fn test_anchor_positions(
    #[case] anchor: Anchor,
    #[case] padding: f32,
    #[case] expected: PlacementPosition,
) {
    let base = Dimensions::new(800, 600);
    let overlay = Dimensions::new(100, 50);
    assert_eq!(calculate_position(anchor, &base, &overlay, padding), expected);
}

#[test]
fn test_positions_may_be_negative() {
    let pos = calculate_position(
        Anchor::BottomRight,
        &Dimensions::new(100, 100),
        &Dimensions::new(150, 150),
        0.0,
    );
    assert_eq!(pos, PlacementPosition::new(-50, -50));
}

#[test]
fn test_overlay_size_fit_and_fill() {
    let base = Dimensions::new(1000, 500);
    let overlay = Dimensions::new(200, 100);

    // Fit: limited by the tighter axis
    let fit = overlay_size(&base, &overlay, 0.2, false);
    assert_eq!((fit.width, fit.height), (200, 100));

    // Fill: covers at least one axis of the box
    let fill = overlay_size(&base, &Dimensions::new(100, 100), 1.0, true);
    assert_eq!((fill.width, fill.height), (1000, 1000));
}

#[test]
fn test_anchor_names() {
    for anchor in Anchor::ALL {
        assert_eq!(anchor.as_str().parse::<Anchor>().unwrap(), anchor);
    }
    assert_eq!("Top Left".parse::<Anchor>().unwrap(), Anchor::TopLeft);
    assert!(matches!(
        "middle".parse::<Anchor>(),
        Err(CompositeError::UnknownAnchor(_))
    ));
    assert_eq!(Anchor::default(), Anchor::BottomRight);
}

#[test]
fn test_zero_opacity_is_identity() {
    let base = RgbaImage::from_fn(64, 48, |x, y| Rgba([x as u8, y as u8, 7, 255]));
    let spec = OverlaySpec::new(solid(16, 16, RED), settings(0.0, 0.5, Anchor::Center, 0.0)).unwrap();

    let result = composite(&base, &spec).unwrap();
    assert_eq!(result, base);
}

#[test]
fn test_transparent_overlay_pixels_leave_base_untouched() {
    let base = RgbaImage::from_fn(40, 40, |x, y| Rgba([x as u8 * 3, y as u8 * 5, 99, 255]));
    let spec = OverlaySpec::new(
        solid(40, 40, Rgba([255, 255, 255, 0])),
        settings(1.0, 1.0, Anchor::TopLeft, 0.0),
    )
    .unwrap();

    assert_eq!(composite(&base, &spec).unwrap(), base);
}

#[test]
fn test_opaque_overlay_replaces_covered_pixels_only() {
    let base = solid(100, 100, GRAY);
    let spec = OverlaySpec::new(solid(20, 20, RED), settings(1.0, 0.2, Anchor::TopLeft, 0.1)).unwrap();

    let result = composite(&base, &spec).unwrap();
    // 20x20 overlay at (10, 10)
    assert_eq!(*result.get_pixel(15, 15), RED);
    assert_eq!(*result.get_pixel(29, 29), RED);
    assert_eq!(*result.get_pixel(5, 5), GRAY);
    assert_eq!(*result.get_pixel(31, 31), GRAY);
    // Input untouched
    assert_eq!(*base.get_pixel(15, 15), GRAY);
}

#[test]
fn test_half_opacity_blends() {
    let base = solid(10, 10, Rgba([0, 0, 0, 255]));
    let spec = OverlaySpec::new(
        solid(10, 10, Rgba([200, 200, 200, 255])),
        settings(0.5, 1.0, Anchor::TopLeft, 0.0),
    )
    .unwrap();

    let pixel = *composite(&base, &spec).unwrap().get_pixel(5, 5);
    assert_eq!(pixel[3], 255);
    assert!((pixel[0] as i32 - 100).abs() <= 1, "got {:?}", pixel);
}

#[test]
fn test_pattern_goes_under_watermark() {
    let base = solid(100, 100, GRAY);
    let pattern = OverlaySpec::new(
        solid(100, 100, BLUE),
        OverlaySettings {
            opacity: 1.0,
            ..OverlaySettings::pattern()
        },
    )
    .unwrap();
    let watermark =
        OverlaySpec::new(solid(20, 20, RED), settings(1.0, 0.2, Anchor::BottomRight, 0.0)).unwrap();

    let compositor = Compositor::new()
        .with_watermark(watermark)
        .with_pattern(pattern);
    assert_eq!(compositor.layer_count(), 2);

    let result = compositor.apply(&base).unwrap();
    assert_eq!(*result.get_pixel(10, 10), BLUE);
    assert_eq!(*result.get_pixel(90, 90), RED);
}

#[test]
fn test_render_crops_then_composites() {
    let source = DynamicImage::ImageRgba8(solid(200, 100, GRAY));
    let watermark =
        OverlaySpec::new(solid(10, 10, RED), settings(1.0, 0.1, Anchor::TopLeft, 0.0)).unwrap();

    let result = Compositor::new()
        .with_watermark(watermark)
        .render(&source, AspectRatio::SQUARE)
        .unwrap();

    assert_eq!(result.dimensions(), (100, 100));
    assert_eq!(*result.get_pixel(0, 0), RED);
    assert_eq!(*result.get_pixel(50, 50), GRAY);
}

#[test]
fn test_invalid_settings_rejected() {
    let image = solid(4, 4, RED);
    for bad in [
        settings(1.5, 0.2, Anchor::Center, 0.0),
        settings(f32::NAN, 0.2, Anchor::Center, 0.0),
        settings(0.5, -0.1, Anchor::Center, 0.0),
        settings(0.5, 0.2, Anchor::Center, 0.6),
    ] {
        assert!(OverlaySpec::new(image.clone(), bad).is_err());
    }
}

#[test]
fn test_extreme_aspect_fill_pattern_stays_within_base() {
    // A 3000x1 strip filled over 3000x3000 scales to 9_000_000x3000
    let base = solid(3000, 3000, GRAY);
    let spec = OverlaySettings {
        opacity: 1.0,
        ..OverlaySettings::pattern()
    }
    .into_spec(solid(3000, 1, BLUE))
    .unwrap();

    let layer = prepare_layer(&Dimensions::of(&base), &spec).unwrap().unwrap();
    assert_eq!(layer.image.dimensions(), (3000, 3000));

    let result = composite(&base, &spec).unwrap();
    assert_eq!(result.dimensions(), (3000, 3000));
    for (x, y) in [(0, 0), (2999, 0), (1500, 1500), (2999, 2999)] {
        let p = result.get_pixel(x, y);
        assert!(p[2] >= 253 && p[0] <= 2, "({}, {}) -> {:?}", x, y, p);
    }
}
