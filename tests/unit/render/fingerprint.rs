use super::*;

#[test]
fn identical_inputs_match() {
    let a = fingerprint_frame(Some(7), 1.02, caption_key("hi", 1));
    let b = fingerprint_frame(Some(7), 1.02, caption_key("hi", 1));
    assert_eq!(a, b);
}

#[test]
fn zoom_changes_image_frames_only() {
    assert_ne!(
        fingerprint_frame(Some(7), 1.0, 3),
        fingerprint_frame(Some(7), 1.01, 3)
    );
    assert_eq!(
        fingerprint_frame(None, 1.0, 3),
        fingerprint_frame(None, 1.07, 3)
    );
}

#[test]
fn caption_and_font_feed_the_key() {
    assert_ne!(caption_key("a", 1), caption_key("b", 1));
    assert_ne!(caption_key("a", 1), caption_key("a", 2));
    assert_ne!(
        fingerprint_frame(None, 1.0, caption_key("a", 1)),
        fingerprint_frame(None, 1.0, caption_key("b", 1))
    );
}
