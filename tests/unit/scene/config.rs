use super::*;
use crate::foundation::error::ErrorKind;

#[test]
fn empty_json_is_the_default_config() {
    let cfg = PipelineConfig::from_json_str("{}").unwrap();
    assert_eq!(cfg, PipelineConfig::default());
    cfg.validate().unwrap();
}

#[test]
fn defaults_match_house_style() {
    let cfg = PipelineConfig::default();
    assert_eq!(cfg.fps, Fps { num: 30, den: 1 });
    assert_eq!(cfg.mp3_bitrate_kbps, 128);
    assert_eq!(cfg.motion.zoom_per_slot, 0.08);
    assert_eq!(cfg.caption.fill_for_line(0), RgbaColor::rgb(0xFF, 0x00, 0x7A));
    assert_eq!(cfg.caption.fill_for_line(1), RgbaColor::WHITE);
    assert_eq!(cfg.caption.fill_for_line(2), RgbaColor::rgb(0xFF, 0x00, 0x7A));
    assert_eq!(cfg.placeholder.label, "[Asset Processing]");
    assert_eq!(cfg.vignette.end_color.a, 242);
}

#[test]
fn partial_overrides_keep_other_defaults() {
    let cfg = PipelineConfig::from_json_str(
        r##"{
            "fps": { "num": 24, "den": 1 },
            "quality": { "720p": { "width": 360, "height": 640, "bitrate_bps": 1000000 } },
            "caption": { "fill_colors": ["#00FF00"], "shadow": null },
            "encoder": { "static_frame_elision": false }
        }"##,
    )
    .unwrap();
    cfg.validate().unwrap();
    assert_eq!(cfg.fps.num, 24);
    assert_eq!(cfg.quality.get(QualityTier::P720).width, 360);
    assert_eq!(cfg.quality.get(QualityTier::P1080).width, 1080);
    assert_eq!(cfg.caption.font_size, 48.0);
    assert!(cfg.caption.shadow.is_none());
    assert_eq!(cfg.caption.fill_for_line(5), RgbaColor::rgb(0, 255, 0));
    assert!(!cfg.encoder.static_frame_elision);
    assert_eq!(cfg.encoder.channel_capacity, 4);
}

#[test]
fn serialized_config_reads_back() {
    let cfg = PipelineConfig::default();
    let json = cfg.to_json_string().unwrap();
    assert_eq!(PipelineConfig::from_json_str(&json).unwrap(), cfg);
}

#[test]
fn malformed_json_is_serde_error() {
    let err = PipelineConfig::from_json_str("{ \"fps\": 30 }").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Serde);
}

#[test]
fn validate_catches_bad_values() {
    let mut cfg = PipelineConfig::default();
    cfg.quality.p1080.width = 1081;
    assert!(cfg.validate().is_err());

    let mut cfg = PipelineConfig::default();
    cfg.caption.max_width_frac = 1.5;
    assert!(cfg.validate().is_err());

    let mut cfg = PipelineConfig::default();
    cfg.mp3_bitrate_kbps = 100;
    assert!(cfg.validate().is_err());

    let mut cfg = PipelineConfig::default();
    cfg.encoder.channel_capacity = 0;
    assert!(cfg.validate().is_err());

    let mut cfg = PipelineConfig::default();
    cfg.fps.den = 0;
    assert_eq!(cfg.validate().unwrap_err().kind(), ErrorKind::InvalidConfig);
}

#[test]
fn from_path_reads_json_file() {
    let path = std::env::temp_dir().join(format!(
        "storyreel_config_test_{}.json",
        std::process::id()
    ));
    std::fs::write(&path, r#"{ "mp3_bitrate_kbps": 192 }"#).unwrap();
    let cfg = PipelineConfig::from_path(&path).unwrap();
    let _ = std::fs::remove_file(&path);
    assert_eq!(cfg.mp3_bitrate_kbps, 192);
    assert!(PipelineConfig::from_path("/nonexistent/storyreel.json").is_err());
}
