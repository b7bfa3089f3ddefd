//! # Compositor Scenarios
//!
//! End-to-end behavior of the canvas through its public API: seeding,
//! relayout, dragging, load ordering and export.

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use meme_canvas::interact::{Point, PointerKind, Viewport, hit_test};
use meme_canvas::render::{TextBlock, Typeface, line_centers};
use meme_canvas::{
    CanvasError, Compositor, CompositorConfig, LabelPatch, LoadOutcome, RasterInfo,
};
use pretty_assertions::assert_eq;
use std::io::Cursor;

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

fn canvas() -> Compositor {
    Compositor::new(CompositorConfig::default()).unwrap()
}

fn solid(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([200, 60, 60])))
}

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    solid(width, height).write_to(&mut out, ImageFormat::Png).unwrap();
    out.into_inner()
}

fn positions(canvas: &Compositor) -> Vec<(f32, f32)> {
    canvas.labels().iter().map(|l| (l.x, l.y)).collect()
}

fn assert_close(actual: (f32, f32), expected: (f32, f32)) {
    assert!(
        (actual.0 - expected.0).abs() < 1e-3 && (actual.1 - expected.1).abs() < 1e-3,
        "{:?} != {:?}",
        actual,
        expected
    );
}

// ============================================================================
// LABEL STORE
// ============================================================================

#[test]
fn test_seed_add_delete_scenario() {
    let mut c = canvas();
    let texts: Vec<&str> = c.labels().iter().map(|l| l.text.as_str()).collect();
    assert_eq!(texts, vec!["TOP TEXT", "BOTTOM TEXT"]);
    let seeded = positions(&c);
    assert_close(seeded[0], (400.0, 48.0));
    assert_close(seeded[1], (400.0, 552.0));

    let third = c.add_label("THIRD", 0.5, 0.5);
    assert_close((third.x, third.y), (400.0, 300.0));
    assert_eq!(c.labels().len(), 3);

    let ids: Vec<_> = c.labels().iter().map(|l| l.id).collect();
    assert!(c.delete_label(ids[0]));
    assert!(c.delete_label(ids[1]));
    assert_eq!(c.labels().len(), 1);

    assert!(!c.delete_label(ids[2]));
    assert!(!c.delete_active());
    assert_eq!(c.labels().len(), 1);
}

#[test]
fn test_resize_snaps_labels_to_slots() {
    let mut c = canvas();
    c.add_label("A", 0.1, 0.1);
    c.add_label("B", 0.9, 0.2);
    let first = c.labels().labels()[0].id;
    c.update_label(first, &LabelPatch::default().position(5.0, 5.0));

    let ticket = c.begin_load();
    c.complete_load(ticket, Ok(solid(400, 1000))).unwrap();

    assert_eq!(c.size(), (400, 1000));
    let moved = positions(&c);
    assert_close(moved[0], (200.0, 80.0));
    assert_close(moved[1], (200.0, 920.0));
    assert_close(moved[2], (200.0, 500.0));
    assert_close(moved[3], (200.0, 500.0));
}

#[test]
fn test_line_centers_symmetric() {
    for lines in 1..6 {
        let centers = line_centers(250.0, lines, 48.0);
        let offset: f32 = centers.iter().map(|c| c - 250.0).sum();
        assert!(offset.abs() < 1e-3, "{} lines: offset {}", lines, offset);
    }
}

// ============================================================================
// HIT-TESTING AND DRAGGING
// ============================================================================

#[test]
fn test_hit_testing_matches_layout() {
    let c = canvas();
    let face = Typeface::embedded();
    let padding = c.config().hit_padding;

    for label in c.labels().iter() {
        let block = TextBlock::layout(label, &face).unwrap();
        let inside = (block.left + 1.0, block.top + 1.0);
        assert!(hit_test(label, &face, padding, inside.0, inside.1));

        let outside = (block.left - padding - 1.0, block.top - padding - 1.0);
        assert!(!hit_test(label, &face, padding, outside.0, outside.1));
    }
}

#[test]
fn test_topmost_label_wins() {
    let mut c = canvas();
    let under = c.add_label("SAME PLACE", 0.5, 0.5);
    let over = c.add_label("SAME PLACE", 0.5, 0.5);
    c.select(under.id);

    let view = Viewport::identity(800, 600);
    assert!(c.pointer_down(Point::new(400.0, 300.0), &view));
    assert_eq!(c.labels().active_id(), Some(over.id));
    assert_eq!(c.drag_session().map(|s| s.label_id), Some(over.id));
}

#[test]
fn test_pointer_down_on_nothing_is_noop() {
    let mut c = canvas();
    let before = c.labels().active_id();
    let view = Viewport::identity(800, 600);

    assert!(!c.pointer_down(Point::new(10.0, 300.0), &view));
    assert_eq!(c.labels().active_id(), before);
    assert!(c.drag_session().is_none());
}

#[test]
fn test_drag_moves_label_and_repaints() {
    let mut c = canvas();
    let view = Viewport::identity(800, 600);
    let before = c.render().data().to_vec();

    assert!(c.pointer_down(Point::new(400.0, 552.0), &view));
    assert!(c.pointer_move(Point::new(400.0, 300.0), &view, PointerKind::Touch));
    c.pointer_up();

    assert_close(positions(&c)[1], (400.0, 300.0));
    assert_ne!(c.render().data(), before.as_slice());
}

// ============================================================================
// LOADING
// ============================================================================

#[tokio::test]
async fn test_load_from_bytes_applies_scaled_image() {
    let mut c = canvas();
    let outcome = c.load_from_bytes(png_bytes(1200, 900)).await.unwrap();
    assert_eq!(
        outcome,
        LoadOutcome::Applied(RasterInfo {
            width: 800,
            height: 600,
            source_width: 1200,
            source_height: 900,
        })
    );
    assert!(c.has_image());
}

#[tokio::test]
async fn test_corrupt_upload_keeps_previous_image() {
    let mut c = canvas();
    c.load_from_bytes(png_bytes(300, 200)).await.unwrap();
    let frame = c.render().data().to_vec();

    let err = c.load_from_bytes(b"not an image".to_vec()).await.unwrap_err();
    assert!(matches!(err, CanvasError::Decode(_)));
    assert_eq!(c.size(), (300, 200));
    assert_eq!(c.render().data(), frame.as_slice());
}

#[test]
fn test_out_of_order_completion() {
    let mut c = canvas();
    let slow_template = c.begin_load();
    let quick_upload = c.begin_load();

    c.complete_load(quick_upload, Ok(solid(320, 240))).unwrap();
    let late = c.complete_load(slow_template, Ok(solid(640, 100))).unwrap();

    assert_eq!(late, LoadOutcome::Stale);
    assert_eq!(c.size(), (320, 240));
}

// ============================================================================
// EXPORT
// ============================================================================

#[test]
fn test_export_without_image_is_none() {
    let mut c = canvas();
    assert_eq!(c.to_encoded_blob().unwrap(), None);
    assert_eq!(c.to_downloadable_data_uri().unwrap(), None);
}

#[tokio::test]
async fn test_export_round_trip_dimensions() {
    let mut c = canvas();
    c.load_from_bytes(png_bytes(1000, 750)).await.unwrap();
    c.update_active(&LabelPatch::default().text("ROUND\nTRIP"));

    let jpeg = c.to_encoded_blob().unwrap().unwrap();
    let decoded = image::load_from_memory(&jpeg).unwrap();
    assert_eq!((decoded.width(), decoded.height()), c.size());

    let png = c.to_png().unwrap().unwrap();
    let decoded = image::load_from_memory(&png).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (800, 600));
}

#[test]
fn test_repeated_renders_are_identical() {
    let mut c = canvas();
    let ticket = c.begin_load();
    c.complete_load(ticket, Ok(solid(500, 400))).unwrap();

    let first = c.to_png().unwrap().unwrap();
    let second = c.to_png().unwrap().unwrap();
    assert_eq!(first, second);
}
