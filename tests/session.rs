use image::{ColorType, Rgba, RgbaImage};
use std::fs;
use watermark_rs::codec::{export_image, import_image};
use watermark_rs::font::FontCatalog;
use watermark_rs::script::SessionScript;
use watermark_rs::session::{SessionConfig, WatermarkSession};
use watermark_rs::{Color, WatermarkError};

fn checkerboard(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        if (x / 4 + y / 4) % 2 == 0 {
            Rgba([30, 60, 90, 255])
        } else {
            Rgba([200, 180, 160, 255])
        }
    })
}

fn session(max_width: u32, max_height: u32) -> WatermarkSession {
    WatermarkSession::new(
        SessionConfig {
            max_width,
            max_height,
        },
        FontCatalog::new(),
    )
}

#[test]
fn import_keeps_images_that_already_fit() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("small.png");
    let original = checkerboard(64, 48);
    original.save(&path).unwrap();

    let imported = import_image(&path, 640, 480).unwrap();
    assert_eq!(imported, original);
}

#[test]
fn import_shrinks_oversized_images_uniformly() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("wide.bmp");
    checkerboard(400, 200).save(&path).unwrap();

    let mut session = session(100, 100);
    session.import_image(&path).unwrap();
    assert_eq!(session.canvas_size(), (100, 50));
}

#[test]
fn import_of_missing_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = import_image(&dir.path().join("nope.png"), 10, 10).unwrap_err();
    assert!(matches!(err, WatermarkError::Image(_) | WatermarkError::Io(_)));
}

#[test]
fn export_without_image_is_a_no_op() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("out.png");

    let mut session = session(200, 100);
    session.set_text("Nothing yet");
    assert!(!session.export(&output).unwrap());
    assert!(!output.exists());
}

#[test]
fn empty_text_leaves_base_untouched() {
    let base = checkerboard(80, 40);
    let mut session = session(200, 100);
    session.set_base_image(base.clone());
    session.set_text("   ");

    assert!(session.layer().is_empty());
    assert!(session.merge().is_none());
    assert_eq!(session.base_image(), Some(&base));
}

#[test]
fn jpeg_export_is_flattened_to_rgb() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("marked.jpg");

    let mut session = session(200, 100);
    session.set_base_image(RgbaImage::from_pixel(120, 60, Rgba([0, 0, 0, 0])));
    session.set_color(Color::rgba(255, 0, 0, 255));
    session.set_alpha(128);
    session.set_font_size(24);
    session.set_text("JPG");
    assert!(session.export(&output).unwrap());

    let decoded = image::open(&output).unwrap();
    assert_eq!(decoded.color(), ColorType::Rgb8);

    // The transparent base flattens to white, not black.
    let corner = decoded.to_rgb8().get_pixel(0, 0).0;
    assert!(corner.iter().all(|&c| c > 240), "corner = {:?}", corner);
}

#[test]
fn png_export_keeps_alpha() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("marked.png");

    let mut session = session(200, 100);
    session.set_base_image(RgbaImage::from_pixel(120, 60, Rgba([0, 0, 0, 0])));
    session.set_text("PNG");
    assert!(session.export(&output).unwrap());

    let decoded = image::open(&output).unwrap();
    assert_eq!(decoded.color(), ColorType::Rgba8);
    assert_eq!(decoded.to_rgba8(), session.merge().unwrap());
}

#[test]
fn export_rejects_unknown_extension() {
    let dir = tempfile::tempdir().unwrap();
    let err = export_image(&checkerboard(8, 8), &dir.path().join("out.tga")).unwrap_err();
    assert!(matches!(err, WatermarkError::UnsupportedFormat(_)));
}

#[test]
fn dragged_watermark_lands_where_it_was_dropped() {
    let mut session = session(200, 100);
    session.set_base_image(RgbaImage::from_pixel(160, 80, Rgba([0, 0, 0, 255])));
    session.set_color(Color::rgba(255, 255, 255, 255));
    session.set_text("X");
    let (w, h) = session.layer().dimensions();

    let start = session.placement();
    session.begin_drag(start.x, start.y);
    assert!(session.drag_to(0, 0));
    session.end_drag();
    assert_eq!((session.placement().x, session.placement().y), (0, 0));

    let merged = session.merge().unwrap();
    let painted = merged
        .enumerate_pixels()
        .filter(|(_, _, p)| p.0[0] > 0)
        .all(|(x, y, _)| x < w && y < h);
    assert!(painted);
    assert_eq!(merged.get_pixel(159, 79).0, [0, 0, 0, 255]);
}

#[test]
fn script_replays_a_full_session() {
    let dir = tempfile::tempdir().unwrap();
    checkerboard(300, 150).save(dir.path().join("photo.png")).unwrap();
    fs::create_dir(dir.path().join("Fonts")).unwrap();
    fs::write(dir.path().join("Fonts").join("broken.ttf"), b"not a font").unwrap();

    let script_path = dir.path().join("session.json");
    fs::write(
        &script_path,
        r##"{
            "image": "photo.png",
            "output": "out/../marked.gif",
            "fonts_dir": "Fonts",
            "max_width": 150,
            "max_height": 150,
            "style": {
                "text": "Sample",
                "font": "Broken",
                "size": 16,
                "color": "#00FF00",
                "alpha": 200,
                "rotation": 10
            },
            "drags": [{ "from": [75, 37], "path": [[70, 37], [-500, 37]] }]
        }"##,
    )
    .unwrap();
    fs::create_dir(dir.path().join("out")).unwrap();

    let script = SessionScript::from_file(&script_path).unwrap();
    let written = script.run().unwrap().expect("an image was exported");
    assert!(written.exists());

    let exported = image::open(&written).unwrap();
    assert_eq!((exported.width(), exported.height()), (150, 75));
}

#[test]
fn script_with_empty_text_exports_nothing() {
    let dir = tempfile::tempdir().unwrap();
    checkerboard(20, 20).save(dir.path().join("photo.png")).unwrap();
    let script_path = dir.path().join("session.json");
    fs::write(&script_path, r#"{ "image": "photo.png", "output": "out.png" }"#).unwrap();

    let script = SessionScript::from_file(&script_path).unwrap();
    assert_eq!(script.run().unwrap(), None);
    assert!(!dir.path().join("out.png").exists());
}
