use super::*;
use crate::foundation::error::ErrorKind;

#[test]
fn zero_frames_is_empty_timeline() {
    let err = Timeline::new(0, 10.0).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::EmptyTimeline);
}

#[test]
fn non_positive_duration_is_invalid_audio() {
    for d in [0.0, -1.0, f64::NAN, f64::INFINITY] {
        let err = Timeline::new(3, d).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidAudioInput);
    }
}

#[test]
fn three_frames_over_nine_seconds() {
    let tl = Timeline::new(3, 9.0).unwrap();
    assert_eq!(tl.slice_secs(), 3.0);

    let p = tl.locate(0.0);
    assert_eq!(p.frame_index, 0);
    assert_eq!(p.local_progress, 0.0);

    let p = tl.locate(4.5);
    assert_eq!(p.frame_index, 1);
    assert!((p.local_progress - 0.5).abs() < 1e-12);

    assert_eq!(tl.frame_index(6.0), 2);
    assert_eq!(tl.frame_index(8.999), 2);
}

#[test]
fn times_past_the_end_stay_on_last_slot() {
    let tl = Timeline::new(4, 2.0).unwrap();
    assert_eq!(tl.frame_index(2.0), 3);
    assert_eq!(tl.frame_index(100.0), 3);
    assert!(tl.local_progress(100.0) < 1.0);
}

#[test]
fn negative_time_clamps_to_start() {
    let tl = Timeline::new(2, 1.0).unwrap();
    assert_eq!(tl.locate(-0.25).frame_index, 0);
    assert_eq!(tl.locate(-0.25).local_progress, 0.0);
    assert_eq!(tl.locate(f64::NAN).frame_index, 0);
}

#[test]
fn index_is_monotone_and_progress_bounded() {
    let tl = Timeline::new(7, 13.37).unwrap();
    let mut last = 0usize;
    for k in 0..=2_000 {
        let t = k as f64 * 13.37 / 2_000.0;
        let p = tl.locate(t);
        assert!(p.frame_index >= last);
        assert!(p.frame_index < 7);
        assert!((0.0..1.0).contains(&p.local_progress));
        last = p.frame_index;
    }
    assert_eq!(last, 6);
}

#[test]
fn slice_ranges_tile_the_duration() {
    let tl = Timeline::new(3, 10.0).unwrap();
    let (s0, e0) = tl.slice_range(0).unwrap();
    let (s1, e1) = tl.slice_range(1).unwrap();
    let (s2, e2) = tl.slice_range(2).unwrap();
    assert_eq!(s0, 0.0);
    assert_eq!(e0, s1);
    assert_eq!(e1, s2);
    assert_eq!(e2, 10.0);
    assert!(tl.slice_range(3).is_none());
}
