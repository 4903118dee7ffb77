use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        PlayerError::manifest("x")
            .to_string()
            .contains("manifest error:")
    );
    assert!(PlayerError::asset("x").to_string().contains("asset error:"));
    assert!(PlayerError::audio("x").to_string().contains("audio error:"));
    assert!(
        PlayerError::validation("x")
            .to_string()
            .contains("validation error:")
    );
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = PlayerError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
    assert!(!err.is_cancelled());
}

#[test]
fn cancelled_is_distinguishable() {
    assert!(PlayerError::Cancelled.is_cancelled());
    assert!(!PlayerError::asset("x").is_cancelled());
}
