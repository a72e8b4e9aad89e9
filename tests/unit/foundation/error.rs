use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        TesseraError::degenerate("x")
            .to_string()
            .contains("degenerate geometry:")
    );
    assert!(
        TesseraError::invalid_filter("x")
            .to_string()
            .contains("invalid filter parameters:")
    );
    assert!(
        TesseraError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(
        TesseraError::serde("x")
            .to_string()
            .contains("serialization error:")
    );
}

#[test]
fn source_unavailable_names_path() {
    let err = TesseraError::source_unavailable("textures/brick.png", "no such file");
    let msg = err.to_string();
    assert!(msg.contains("textures/brick.png"));
    assert!(msg.contains("no such file"));
}

#[test]
fn skippable_errors_are_geometry_and_source() {
    assert!(TesseraError::degenerate("x").is_skippable());
    assert!(TesseraError::source_unavailable("a.png", "x").is_skippable());
    assert!(!TesseraError::invalid_filter("x").is_skippable());
    assert!(!TesseraError::validation("x").is_skippable());
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = TesseraError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
