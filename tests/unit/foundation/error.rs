use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        StoryreelError::invalid_audio("x")
            .to_string()
            .contains("invalid audio input:")
    );
    assert!(
        StoryreelError::empty_timeline("x")
            .to_string()
            .contains("empty timeline:")
    );
    assert!(
        StoryreelError::encoder_setup("x")
            .to_string()
            .contains("encoder setup failure:")
    );
    assert!(
        StoryreelError::encoder_runtime("x")
            .to_string()
            .contains("encoder runtime failure:")
    );
    assert!(
        StoryreelError::serde("x")
            .to_string()
            .contains("serialization error:")
    );
}

#[test]
fn kinds_match_variants() {
    assert_eq!(
        StoryreelError::invalid_audio("x").kind(),
        ErrorKind::InvalidAudioInput
    );
    assert_eq!(
        StoryreelError::empty_timeline("x").kind(),
        ErrorKind::EmptyTimeline
    );
    assert_eq!(StoryreelError::config("x").kind(), ErrorKind::InvalidConfig);
    assert_eq!(
        StoryreelError::Other(anyhow::anyhow!("x")).kind(),
        ErrorKind::Other
    );
}

#[test]
fn only_asset_failures_are_non_fatal() {
    assert!(!StoryreelError::asset_load("x").is_fatal());
    assert!(StoryreelError::encoder_runtime("x").is_fatal());
    assert!(StoryreelError::empty_timeline("x").is_fatal());
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = StoryreelError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
