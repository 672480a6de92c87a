use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        RollvarError::request("x")
            .to_string()
            .contains("request error:")
    );
    assert!(RollvarError::data("x").to_string().contains("data error:"));
    assert!(
        RollvarError::EmptyChannelSet
            .to_string()
            .contains("no scalar channels")
    );
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = RollvarError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
