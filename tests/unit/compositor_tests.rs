// Logo, profile overlay and watermark behaviour through the public API

use image::{DynamicImage, GenericImageView, Rgb, RgbImage, Rgba, RgbaImage};
use postasy::compositor::{
    add_logo_to_poster, calculate_anchor, compose_profile_overlay, composite_logo, Dimensions,
    LogoPosition, LogoSpec, ProfileData, ProfileField, WatermarkCompositor, WatermarkKind,
    WatermarkOptions,
};
use postasy::error::{InputError, PosterError};
use postasy::fonts::FontResolver;
use postasy::raster::resize_preserving_aspect;
use rstest::rstest;
use std::path::{Path, PathBuf};

fn no_logos(_: &str) -> Option<PathBuf> {
    None
}

fn save_rgb(path: &Path, width: u32, height: u32, color: [u8; 3]) {
    RgbImage::from_pixel(width, height, Rgb(color))
        .save(path)
        .unwrap();
}

#[rstest]
#[case(LogoPosition::TopLeft)]
#[case(LogoPosition::TopRight)]
#[case(LogoPosition::TopCenter)]
#[case(LogoPosition::BottomLeft)]
#[case(LogoPosition::BottomRight)]
#[case(LogoPosition::BottomCenter)]
fn test_anchor_keeps_logo_inside_margins(#[case] position: LogoPosition) {
    for margin in [0u32, 5, 20, 40] {
        let canvas = Dimensions::new(800, 600);
        let logo = Dimensions::new(120, 80);
        let anchor = calculate_anchor(position, canvas, logo, margin);
        let m = margin as i64;

        assert!(anchor.x >= m, "{position} x={} margin={margin}", anchor.x);
        assert!(anchor.y >= m, "{position} y={} margin={margin}", anchor.y);
        assert!(anchor.x + 120 <= 800 - m);
        assert!(anchor.y + 80 <= 600 - m);
    }
}

#[rstest]
#[case(40, 100, 40)]
#[case(100, 100, 100)]
#[case(250, 100, 100)]
#[case(1000, 80, 80)]
fn test_resize_never_exceeds_max_height(
    #[case] source_height: u32,
    #[case] max_height: u32,
    #[case] expected: u32,
) {
    let logo = RgbaImage::from_pixel(60, source_height, Rgba([0, 0, 255, 255]));
    let resized = resize_preserving_aspect(&logo, max_height).unwrap();
    assert_eq!(resized.height(), expected);
    assert!(resized.height() <= max_height);
}

#[test]
fn test_missing_logo_file_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let poster = dir.path().join("poster.png");
    let output = dir.path().join("out.png");
    save_rgb(&poster, 300, 200, [200, 200, 200]);

    let err = add_logo_to_poster(
        &poster,
        &dir.path().join("missing-logo.png"),
        &output,
        &LogoSpec::default(),
        &FontResolver::bitmap_only(),
    )
    .unwrap_err();

    assert!(matches!(err, PosterError::Input(InputError::NotFound { .. })));
    assert!(!output.exists());
}

#[test]
fn test_corrupt_logo_is_an_input_error() {
    let dir = tempfile::tempdir().unwrap();
    let poster = dir.path().join("poster.png");
    let logo = dir.path().join("logo.png");
    let output = dir.path().join("out.jpg");
    save_rgb(&poster, 300, 200, [200, 200, 200]);
    std::fs::write(&logo, b"definitely not a png").unwrap();

    let err = add_logo_to_poster(
        &poster,
        &logo,
        &output,
        &LogoSpec::default(),
        &FontResolver::bitmap_only(),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        PosterError::Input(InputError::InvalidImage { .. })
    ));
    assert!(!output.exists());
}

#[test]
fn test_logo_lands_at_bottom_left() {
    let base = DynamicImage::ImageRgb8(RgbImage::from_pixel(400, 300, Rgb([255, 255, 255])));
    let logo = DynamicImage::ImageRgba8(RgbaImage::from_pixel(50, 50, Rgba([255, 0, 0, 255])));
    let spec = LogoSpec {
        position: LogoPosition::BottomLeft,
        margin: 10,
        ..LogoSpec::default()
    };

    let out = composite_logo(&base, &logo, &spec, &FontResolver::bitmap_only()).unwrap();
    assert_eq!(out.get_pixel(30, 265), &Rgba([255, 0, 0, 255]));
    assert_eq!(out.get_pixel(370, 30), &Rgba([255, 255, 255, 255]));
}

#[rstest]
#[case(120)]
#[case(301)]
#[case(600)]
#[case(1024)]
fn test_profile_overlay_height_without_fields(#[case] height: u32) {
    let base = DynamicImage::ImageRgb8(RgbImage::from_pixel(200, height, Rgb([30, 60, 90])));
    let overlay = compose_profile_overlay(
        &base,
        &ProfileData::default(),
        &[],
        &no_logos,
        &FontResolver::bitmap_only(),
    )
    .unwrap();

    assert_eq!(overlay.image.height(), height + 2 * (height / 6));
    assert_eq!(overlay.image.width(), 200);
    assert!(overlay.degradations.is_empty());
    // Empty bands stay white
    assert_eq!(overlay.image.get_pixel(0, 0), &Rgb([255, 255, 255]));
}

#[test]
fn test_profile_overlay_height_with_every_field() {
    let profile = ProfileData {
        full_name: Some("Jane Doe".to_string()),
        business_name: Some("Doe Designs".to_string()),
        phone: Some("555-0199".to_string()),
        address: Some("1 Main St".to_string()),
        website: Some("doe.example".to_string()),
        facebook: Some("doedesigns".to_string()),
        instagram: Some("@doedesigns".to_string()),
        twitter: Some("@doe".to_string()),
        linkedin: Some("jane-doe".to_string()),
        logo_filename: Some("missing.png".to_string()),
    };
    let mut selected = ProfileField::RENDER_ORDER.to_vec();
    selected.push(ProfileField::Logo);

    let base = DynamicImage::ImageRgb8(RgbImage::from_pixel(600, 600, Rgb([10, 10, 10])));
    let overlay = compose_profile_overlay(
        &base,
        &profile,
        &selected,
        &no_logos,
        &FontResolver::bitmap_only(),
    )
    .unwrap();

    assert_eq!(overlay.image.height(), 600 + 2 * 100);
    // The unresolvable logo degrades instead of failing
    assert_eq!(overlay.degradations.len(), 1);
}

#[test]
fn test_premium_watermark_is_byte_identical() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("source.png");
    let destination = dir.path().join("final.jpg");
    save_rgb(&source, 320, 240, [12, 34, 56]);

    let outcome = WatermarkCompositor::new(WatermarkOptions::default())
        .apply(&source, &destination, true, &FontResolver::bitmap_only())
        .unwrap();

    assert_eq!(outcome.kind, WatermarkKind::Unwatermarked);
    assert_eq!(
        std::fs::read(&source).unwrap(),
        std::fs::read(&destination).unwrap()
    );
}

#[test]
fn test_standard_watermark_marks_bottom_right() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("source.png");
    let destination = dir.path().join("final.jpg");
    save_rgb(&source, 800, 400, [128, 128, 128]);

    let outcome = WatermarkCompositor::new(WatermarkOptions::default())
        .apply(&source, &destination, false, &FontResolver::bitmap_only())
        .unwrap();

    assert_eq!(outcome.kind, WatermarkKind::Lossy);
    assert!(outcome.failures.is_empty());
    let marked = image::open(&outcome.path).unwrap();
    assert_eq!(marked.dimensions(), (800, 400));

    // Inside the plate padding, below and right of the text
    let corner = marked.get_pixel(800 - 8, 400 - 8);
    assert!(corner[0] < 100, "plate should darken the corner, got {:?}", corner);
    // Top-left is untouched apart from compression noise
    let untouched = marked.get_pixel(10, 10);
    assert!((untouched[0] as i32 - 128).abs() <= 4);
}

#[test]
fn test_watermark_of_missing_source_is_input_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = WatermarkCompositor::new(WatermarkOptions::default())
        .apply(
            &dir.path().join("nope.png"),
            &dir.path().join("out.jpg"),
            false,
            &FontResolver::bitmap_only(),
        )
        .unwrap_err();
    assert!(err.is_input());
}
