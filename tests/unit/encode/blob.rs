use super::*;

#[test]
fn file_names_follow_mime() {
    let wav = MediaBlob::new(MIME_WAV, vec![1, 2, 3]);
    assert_eq!(wav.suggested_file_name("voiceover"), "voiceover.wav");
    let mp4 = MediaBlob::new(MIME_MP4, vec![]);
    assert_eq!(mp4.extension(), "mp4");
    assert!(mp4.is_empty());
}

#[test]
fn data_url_is_base64_tagged() {
    let blob = MediaBlob::new(MIME_MP3, b"abc".to_vec());
    assert_eq!(blob.to_data_url(), "data:audio/mpeg;base64,YWJj");
}

#[test]
fn digest_tracks_content() {
    let a = MediaBlob::new(MIME_WAV, vec![0, 1, 2]);
    let b = MediaBlob::new(MIME_WAV, vec![0, 1, 2]);
    let c = MediaBlob::new(MIME_WAV, vec![0, 1, 3]);
    assert_eq!(a.digest(), b.digest());
    assert_ne!(a.digest(), c.digest());
}
