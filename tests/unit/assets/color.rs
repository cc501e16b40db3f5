use super::*;

#[test]
fn parses_hex_forms() {
    assert_eq!(
        RgbaColor::from_hex("#FF007A").unwrap(),
        RgbaColor::rgb(255, 0, 122)
    );
    assert_eq!(
        RgbaColor::from_hex("1e293b").unwrap(),
        RgbaColor::rgb(0x1e, 0x29, 0x3b)
    );
    assert_eq!(
        RgbaColor::from_hex("#000000F2").unwrap(),
        RgbaColor::rgba(0, 0, 0, 242)
    );
    assert!(RgbaColor::from_hex("#12345").is_err());
    assert!(RgbaColor::from_hex("#GG0000").is_err());
}

#[test]
fn deserializes_objects_and_arrays() {
    let c: RgbaColor = serde_json::from_str(r#"{"r":1,"g":2,"b":3}"#).unwrap();
    assert_eq!(c, RgbaColor::rgba(1, 2, 3, 255));
    let c: RgbaColor = serde_json::from_str("[4,5,6,7]").unwrap();
    assert_eq!(c, RgbaColor::rgba(4, 5, 6, 7));
    assert!(serde_json::from_str::<RgbaColor>("[1,2]").is_err());
}

#[test]
fn serializes_as_hex_and_reads_back() {
    let c = RgbaColor::rgba(0x94, 0xa3, 0xb8, 0x80);
    let s = serde_json::to_string(&c).unwrap();
    assert_eq!(s, "\"#94A3B880\"");
    assert_eq!(serde_json::from_str::<RgbaColor>(&s).unwrap(), c);
}

#[test]
fn premul_scales_channels_by_alpha() {
    let p = RgbaColor::rgba(0, 0, 0, 242).to_premul();
    assert_eq!(p.to_array(), [0, 0, 0, 242]);
    let p = RgbaColor::rgba(255, 255, 255, 128).to_premul();
    assert_eq!(p.to_array(), [128, 128, 128, 128]);
}
