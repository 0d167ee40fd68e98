//! End-to-end edit sessions with the real codec: upload bytes in, encoded
//! snapshots out.

use image::{ImageEncoder, Rgba, RgbaImage};
use smart_photo::filter::FilterPatch;
use smart_photo::imaging::{ImageCodec, OutputFormat, RustCodec};
use smart_photo::session::{Editor, RenderEvent, View};
use smart_photo::upload::{UploadLimits, ValidatedUpload, validate_upload};
use std::cell::RefCell;
use std::rc::Rc;

// ===========================================================================
// Helpers
// ===========================================================================

fn png_upload(image: &RgbaImage) -> ValidatedUpload {
    let mut bytes = Vec::new();
    image::codecs::png::PngEncoder::new(&mut bytes)
        .write_image(
            image.as_raw(),
            image.width(),
            image.height(),
            image::ExtendedColorType::Rgba8,
        )
        .unwrap();
    validate_upload(bytes, Some("image/png"), &UploadLimits::default()).unwrap()
}

fn luminance(px: &Rgba<u8>) -> f32 {
    0.2126 * px[0] as f32 + 0.7152 * px[1] as f32 + 0.0722 * px[2] as f32
}

fn average_luminance(image: &RgbaImage) -> f32 {
    image.pixels().map(luminance).sum::<f32>() / (image.width() * image.height()) as f32
}

fn two_tone() -> RgbaImage {
    RgbaImage::from_fn(40, 20, |x, _| {
        if x < 20 {
            Rgba([180, 120, 60, 255])
        } else {
            Rgba([60, 90, 150, 255])
        }
    })
}

// ===========================================================================
// Tests
// ===========================================================================

#[test]
fn red_square_darkened_and_saved() {
    let source = RgbaImage::from_pixel(100, 100, Rgba([255, 0, 0, 255]));
    let mut editor = Editor::default();
    editor.load_image(png_upload(&source)).unwrap();

    editor
        .update_filter(&FilterPatch::new().brightness(50.0))
        .unwrap();
    let rendered = editor.surface().unwrap().pixels().clone();
    assert!(average_luminance(&rendered) < average_luminance(&source));

    let snapshot = editor.save().unwrap();
    assert_eq!(snapshot.format(), OutputFormat::Jpeg);
    assert!(snapshot.download_name().starts_with("edited-image-"));
    let saved = RustCodec::new().decode(snapshot.bytes()).unwrap();
    assert_eq!(saved.dimensions(), (100, 100));
    assert!(average_luminance(&saved) < average_luminance(&source));

    assert!(editor.is_idle());
    assert_eq!(editor.gallery().len(), 1);
}

#[test]
fn newest_save_comes_first() {
    let mut editor = Editor::default();
    editor
        .load_image(png_upload(&RgbaImage::from_pixel(8, 8, Rgba([0, 0, 255, 255]))))
        .unwrap();
    let first_id = editor.save().unwrap().id().to_string();

    editor
        .load_image(png_upload(&RgbaImage::from_pixel(16, 4, Rgba([0, 255, 0, 255]))))
        .unwrap();
    editor.rotate_clockwise().unwrap();
    editor.save().unwrap();

    let ids: Vec<&str> = editor.gallery().iter().map(|s| s.id()).collect();
    assert_eq!(ids.len(), 2);
    assert_eq!(ids[1], first_id);
    assert_eq!(editor.gallery().latest().unwrap().dimensions().width, 16);
}

#[test]
fn noir_at_full_intensity_is_gray_with_more_contrast() {
    let source = two_tone();
    let mut editor = Editor::default();
    editor.switch_view(View::Effects).unwrap();
    editor.load_image(png_upload(&source)).unwrap();
    editor.select_effect("Noir").unwrap();

    let out = editor.surface().unwrap().pixels();
    for px in out.pixels() {
        assert_eq!(px[0], px[1]);
        assert_eq!(px[1], px[2]);
    }
    let spread = |img: &RgbaImage| (luminance(img.get_pixel(0, 0)) - luminance(img.get_pixel(39, 0))).abs();
    assert!(spread(out) > spread(&source));
}

#[test]
fn reset_renders_once_and_restores_source() {
    let source = two_tone();
    let renders: Rc<RefCell<Vec<RenderEvent>>> = Rc::default();
    let sink = Rc::clone(&renders);

    let mut editor = Editor::default();
    editor.on_render(move |e| sink.borrow_mut().push(e.clone()));
    editor.load_image(png_upload(&source)).unwrap();
    editor
        .update_filter(&FilterPatch::new().saturation(0.0).blur(3.0).invert(true))
        .unwrap();
    editor.rotate_clockwise().unwrap();
    let before = renders.borrow().len();

    editor.reset().unwrap();
    assert_eq!(renders.borrow().len(), before + 1);
    assert_eq!(editor.surface().unwrap().pixels(), &source);
}

#[test]
fn download_is_a_decodable_jpeg() {
    let mut editor = Editor::default();
    editor.load_image(png_upload(&two_tone())).unwrap();
    let download = editor.download().unwrap();
    assert!(download.file_name.ends_with(".jpg"));
    let decoded = RustCodec::new().decode(&download.bytes).unwrap();
    assert_eq!(decoded.dimensions(), (40, 20));
    assert!(editor.has_session());
}
