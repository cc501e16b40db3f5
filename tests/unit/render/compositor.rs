use super::*;
use crate::assets::decode::PreparedImage;
use crate::scene::config::PipelineConfig;
use std::sync::Arc;

const SYSTEM_FONT: &str = "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf";

fn compositor(width: u32, height: u32) -> Option<Compositor> {
    let bytes = std::fs::read(SYSTEM_FONT).ok()?;
    let font = CaptionFont::from_bytes(bytes, SYSTEM_FONT).unwrap();
    let style = CompositorStyle::from_config(&PipelineConfig::default());
    Some(
        Compositor::new(
            Canvas { width, height },
            style,
            font.clone(),
            font,
        )
        .unwrap(),
    )
}

fn solid_image(w: u32, h: u32, rgba: [u8; 4]) -> SlotImage {
    let mut bytes = Vec::with_capacity((w * h * 4) as usize);
    for _ in 0..w * h {
        bytes.extend_from_slice(&rgba);
    }
    SlotImage::new(Arc::new(PreparedImage::from_straight_rgba8(w, h, bytes).unwrap())).unwrap()
}

fn left_right_image() -> SlotImage {
    let (w, h) = (64u32, 64u32);
    let mut bytes = Vec::with_capacity((w * h * 4) as usize);
    for _y in 0..h {
        for x in 0..w {
            let v = (x * 4) as u8;
            bytes.extend_from_slice(&[v, 255 - v, 0, 255]);
        }
    }
    SlotImage::new(Arc::new(PreparedImage::from_straight_rgba8(w, h, bytes).unwrap())).unwrap()
}

fn empty_caption() -> PreparedCaption {
    PreparedCaption {
        lines: Vec::new(),
        key: 0,
    }
}

fn has_pixel(frame: &FrameRGBA, rgba: [u8; 4]) -> bool {
    frame.data.chunks_exact(4).any(|px| px == rgba)
}

#[test]
fn zoom_grows_linearly_and_clamps() {
    assert_eq!(ken_burns_zoom(0.0, 0.08), 1.0);
    assert!((ken_burns_zoom(0.5, 0.08) - 1.04).abs() < 1e-12);
    assert!((ken_burns_zoom(7.0, 0.08) - 1.08).abs() < 1e-12);
    assert_eq!(ken_burns_zoom(-1.0, 0.08), 1.0);
}

#[test]
fn cover_transform_fills_canvas_and_centers() {
    let canvas = Canvas {
        width: 720,
        height: 1280,
    };
    let tr = cover_transform(canvas, 1000, 1000, 1.0);
    let [a, b, c, d, e, f] = tr.as_coeffs();
    assert!((a - 1.28).abs() < 1e-12 && (d - 1.28).abs() < 1e-12);
    assert_eq!((b, c), (0.0, 0.0));
    assert!((e + 280.0).abs() < 1e-9);
    assert!(f.abs() < 1e-9);

    let zoomed = cover_transform(canvas, 1000, 1000, 1.08);
    let [za, _, _, _, ze, zf] = zoomed.as_coeffs();
    assert!((za - 1.28 * 1.08).abs() < 1e-12);
    assert!(ze < e && zf < 0.0);
}

#[test]
fn placeholder_frame_shows_tile_and_vignette() {
    let Some(mut comp) = compositor(360, 640) else {
        return;
    };
    let frame = comp
        .render(FrameView {
            slot: &FrameSlot::Placeholder,
            local_progress: 0.0,
            caption: &empty_caption(),
        })
        .unwrap();
    assert_eq!((frame.width, frame.height), (360, 640));
    assert_eq!(frame.pixel(5, 5), Some([0x1e, 0x29, 0x3b, 255]));

    let bottom = frame.pixel(5, 639).unwrap();
    assert_eq!(bottom[3], 255);
    assert!(bottom[2] < 10, "vignette should darken the bottom edge: {bottom:?}");

    let label_region_lit = (300..340).any(|y| {
        (100..260).any(|x| {
            let px = frame.pixel(x, y).unwrap();
            px[2] > 0x3b + 40
        })
    });
    assert!(label_region_lit, "placeholder label should be drawn near the center");
}

#[test]
fn image_frame_covers_canvas() {
    let Some(mut comp) = compositor(360, 640) else {
        return;
    };
    let slot = FrameSlot::Loaded(solid_image(50, 20, [255, 0, 0, 255]));
    let frame = comp
        .render(FrameView {
            slot: &slot,
            local_progress: 0.3,
            caption: &empty_caption(),
        })
        .unwrap();
    assert_eq!(frame.pixel(0, 0), Some([255, 0, 0, 255]));
    assert_eq!(frame.pixel(359, 100), Some([255, 0, 0, 255]));
}

#[test]
fn ken_burns_changes_pixels_over_a_slot() {
    let Some(mut comp) = compositor(360, 640) else {
        return;
    };
    let slot = FrameSlot::Loaded(left_right_image());
    let caption = empty_caption();
    let mut at = |p: f64| {
        comp.render(FrameView {
            slot: &slot,
            local_progress: p,
            caption: &caption,
        })
        .unwrap()
    };
    let start = at(0.0);
    let again = at(0.0);
    let end = at(0.95);
    assert_eq!(start, again);
    assert_ne!(start, end);
}

#[test]
fn captions_alternate_fill_colors() {
    let Some(mut comp) = compositor(360, 640) else {
        return;
    };
    let caption = comp
        .prepare_caption("Ancient caravans crossed endless dunes carrying silk spices and stories")
        .unwrap();
    assert!(caption.lines.len() >= 2);
    for line in &caption.lines {
        assert!(f64::from(line.width) <= 0.85 * 360.0 + 0.5);
    }

    let frame = comp
        .render(FrameView {
            slot: &FrameSlot::Placeholder,
            local_progress: 0.0,
            caption: &caption,
        })
        .unwrap();
    assert!(has_pixel(&frame, [255, 0, 122, 255]));
    assert!(has_pixel(&frame, [255, 255, 255, 255]));
}

#[test]
fn caption_keys_track_text() {
    let Some(mut comp) = compositor(360, 640) else {
        return;
    };
    let a = comp.prepare_caption("one two").unwrap();
    let b = comp.prepare_caption("one two").unwrap();
    let c = comp.prepare_caption("one three").unwrap();
    assert_eq!(a.key, b.key);
    assert_ne!(a.key, c.key);
    assert!(comp.prepare_caption("   ").unwrap().lines.is_empty());
}

#[test]
fn rejects_oversized_canvas() {
    let Ok(bytes) = std::fs::read(SYSTEM_FONT) else {
        return;
    };
    let font = CaptionFont::from_bytes(bytes, SYSTEM_FONT).unwrap();
    let style = CompositorStyle::from_config(&PipelineConfig::default());
    assert!(
        Compositor::new(
            Canvas {
                width: 70_000,
                height: 10
            },
            style,
            font.clone(),
            font
        )
        .is_err()
    );
}
