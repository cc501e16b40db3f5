use super::*;
use crate::encode::blob::MIME_WAV;

fn ramp(n: usize) -> Vec<i16> {
    (0..n)
        .map(|i| ((i as i64 * 7919) % 65_536 - 32_768) as i16)
        .collect()
}

fn le_u16(b: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([b[at], b[at + 1]])
}

fn le_u32(b: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([b[at], b[at + 1], b[at + 2], b[at + 3]])
}

#[test]
fn header_fields_are_canonical_pcm() {
    let w = WaveformBuffer::mono(24_000, ramp(10)).unwrap();
    let blob = encode_wav(&w).unwrap();
    let b = blob.bytes();

    assert_eq!(blob.mime(), MIME_WAV);
    assert_eq!(b.len(), WAV_HEADER_LEN + 20);
    assert_eq!(&b[0..4], b"RIFF");
    assert_eq!(le_u32(b, 4) as usize, b.len() - 8);
    assert_eq!(&b[8..12], b"WAVE");
    assert_eq!(&b[12..16], b"fmt ");
    assert_eq!(le_u16(b, 20), 1);
    assert_eq!(le_u16(b, 22), 1);
    assert_eq!(le_u32(b, 24), 24_000);
    assert_eq!(le_u32(b, 28), 48_000);
    assert_eq!(le_u16(b, 32), 2);
    assert_eq!(le_u16(b, 34), 16);
    assert_eq!(&b[36..40], b"data");
    assert_eq!(le_u32(b, 40), 20);
}

#[test]
fn samples_follow_header_little_endian() {
    let w = WaveformBuffer::mono(8_000, vec![1i16, -2, i16::MAX]).unwrap();
    let blob = encode_wav(&w).unwrap();
    assert_eq!(
        &blob.bytes()[WAV_HEADER_LEN..],
        &[0x01, 0x00, 0xfe, 0xff, 0xff, 0x7f]
    );
}

#[test]
fn roundtrip_is_bit_exact_for_various_lengths() {
    for n in [1usize, 2, 577, 24_001] {
        let w = WaveformBuffer::mono(24_000, ramp(n)).unwrap();
        let decoded = decode_wav(encode_wav(&w).unwrap().bytes()).unwrap();
        assert_eq!(decoded.len(), n);
        assert_eq!(decoded, w);
    }
}

#[test]
fn encoding_is_idempotent() {
    let w = WaveformBuffer::mono(24_000, ramp(1000)).unwrap();
    let a = encode_wav(&w).unwrap();
    let b = encode_wav(&w).unwrap();
    assert_eq!(a.bytes(), b.bytes());
}

#[test]
fn decode_rejects_garbage() {
    assert!(decode_wav(b"definitely not riff").is_err());
}
