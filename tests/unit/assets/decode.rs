use super::*;
use base64::Engine as _;
use crate::foundation::error::ErrorKind;
use std::io::Cursor;

fn png_bytes(w: u32, h: u32, rgba: Vec<u8>) -> Vec<u8> {
    let img = image::RgbaImage::from_raw(w, h, rgba).unwrap();
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

#[test]
fn decode_image_png_dimensions_and_premul() {
    let buf = png_bytes(1, 1, vec![100, 50, 200, 128]);
    let prepared = decode_image(&buf).unwrap();
    assert_eq!(prepared.width, 1);
    assert_eq!(prepared.height, 1);
    assert_eq!(
        prepared.rgba8_premul.as_slice(),
        &[
            ((100u16 * 128 + 127) / 255) as u8,
            ((50u16 * 128 + 127) / 255) as u8,
            ((200u16 * 128 + 127) / 255) as u8,
            128u8
        ]
    );
}

#[test]
fn undecodable_bytes_are_asset_failures() {
    let err = decode_image(b"not an image").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AssetLoadFailure);
    assert!(!err.is_fatal());
}

#[test]
fn data_url_roundtrips_png() {
    let buf = png_bytes(2, 1, vec![255, 0, 0, 255, 0, 255, 0, 255]);
    let url = format!(
        "data:image/png;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(&buf)
    );
    let bytes = decode_data_url(&url).unwrap();
    assert_eq!(bytes, buf);
    let img = decode_image(&bytes).unwrap();
    assert_eq!((img.width, img.height), (2, 1));
}

#[test]
fn data_url_rejects_non_base64_forms() {
    assert!(decode_data_url("https://example.com/a.png").is_err());
    assert!(decode_data_url("data:image/png,rawbytes").is_err());
    assert!(decode_data_url("data:image/png;base64").is_err());
    assert!(decode_data_url("data:image/png;base64,@@@").is_err());
}

#[test]
fn digest_tracks_pixels_and_size() {
    let a = PreparedImage::from_straight_rgba8(1, 2, vec![9; 8]).unwrap();
    let b = PreparedImage::from_straight_rgba8(2, 1, vec![9; 8]).unwrap();
    let c = PreparedImage::from_straight_rgba8(1, 2, vec![9; 8]).unwrap();
    assert_ne!(a.digest(), b.digest());
    assert_eq!(a.digest(), c.digest());
}

#[test]
fn rejects_mismatched_buffer() {
    assert!(PreparedImage::from_straight_rgba8(2, 2, vec![0; 4]).is_err());
    assert!(PreparedImage::from_straight_rgba8(0, 2, vec![]).is_err());
}

#[test]
fn paint_rejects_images_wider_than_the_surface() {
    let wide = PreparedImage::from_straight_rgba8(70_000, 1, vec![255; 70_000 * 4]).unwrap();
    let err = wide.to_paint().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AssetLoadFailure);
    assert!(err.to_string().contains("width"));

    let ok = PreparedImage::from_straight_rgba8(2, 2, vec![255; 16]).unwrap();
    assert!(ok.to_paint().is_ok());
}
