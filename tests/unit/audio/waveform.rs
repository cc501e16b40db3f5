use super::*;
use crate::foundation::error::ErrorKind;

#[test]
fn rejects_malformed_waveforms() {
    let empty = WaveformBuffer::mono(24_000, Vec::<i16>::new()).unwrap_err();
    assert_eq!(empty.kind(), ErrorKind::InvalidAudioInput);

    let stereo = WaveformBuffer::new(24_000, 2, vec![0i16; 4]).unwrap_err();
    assert_eq!(stereo.kind(), ErrorKind::InvalidAudioInput);

    let no_rate = WaveformBuffer::mono(0, vec![1i16]).unwrap_err();
    assert_eq!(no_rate.kind(), ErrorKind::InvalidAudioInput);
}

#[test]
fn duration_is_samples_over_rate() {
    let w = WaveformBuffer::mono(24_000, vec![0i16; 48_000]).unwrap();
    assert!((w.duration_secs() - 2.0).abs() < 1e-12);
    assert_eq!(w.len(), 48_000);
}

#[test]
fn base64_payload_decodes_little_endian() {
    // [1, -2] as s16le => 01 00 fe ff
    let w = WaveformBuffer::from_base64_pcm("AQD+/w==", NARRATION_SAMPLE_RATE).unwrap();
    assert_eq!(w.samples(), &[1, -2]);
    assert_eq!(w.sample_rate(), NARRATION_SAMPLE_RATE);
}

#[test]
fn odd_pcm_byte_count_is_invalid() {
    let err = WaveformBuffer::from_pcm_le_bytes(&[1, 2, 3], 24_000).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidAudioInput);

    let err = WaveformBuffer::from_base64_pcm("not base64!", 24_000).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidAudioInput);
}

#[test]
fn to_f32_normalizes_extremes() {
    let w = WaveformBuffer::mono(8_000, vec![i16::MIN, 0, 16_384]).unwrap();
    assert_eq!(w.to_f32(), vec![-1.0, 0.0, 0.5]);
}
