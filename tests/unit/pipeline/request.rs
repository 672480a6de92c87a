use super::*;

#[test]
fn parse_and_encode_round_trip() {
    let encoded = "VARIABLE=u;MEMBER=12;INIT_TIME=2024-05-01T00:00:00Z";
    let request = DataRequest::parse(encoded).unwrap();
    assert_eq!(request.value("VARIABLE"), Some("u"));
    assert_eq!(request.value("MEMBER"), Some("12"));
    assert_eq!(request.to_request_string(), encoded);
}

#[test]
fn insert_replaces_existing_value_in_place() {
    let mut request = DataRequest::new();
    request.insert("A", "1");
    request.insert("B", "2");
    request.insert("A", "3");
    assert_eq!(request.value("A"), Some("3"));
    // Key order is preserved, so the encoding stays deterministic.
    assert_eq!(request.to_request_string(), "A=3;B=2");
}

#[test]
fn remove_returns_value_and_drops_key() {
    let mut request = DataRequest::parse("A=1;B=2").unwrap();
    assert_eq!(request.remove("A"), Some("1".to_string()));
    assert_eq!(request.remove("A"), None);
    assert!(!request.contains("A"));
    assert!(request.contains("B"));
}

#[test]
fn malformed_entry_is_a_request_error() {
    let err = DataRequest::parse("A=1;nonsense").unwrap_err();
    assert!(matches!(err, RollvarError::Request(_)));
}

#[test]
fn logp_mapping_parses_both_scalars() {
    let mapping = parse_logp_mapping(" 6.956545 / -12.0 ").unwrap();
    assert!((mapping.log_p_bottom_hpa - 6.956545).abs() < 1e-9);
    assert!((mapping.delta_z_per_log_p - -12.0).abs() < 1e-9);
}

#[test]
fn logp_mapping_rejects_bad_values() {
    assert!(matches!(
        parse_logp_mapping("6.9").unwrap_err(),
        RollvarError::Request(_)
    ));
    assert!(matches!(
        parse_logp_mapping("abc/-12.0").unwrap_err(),
        RollvarError::Request(_)
    ));
    assert!(matches!(
        parse_logp_mapping("6.9/").unwrap_err(),
        RollvarError::Request(_)
    ));
}

#[test]
fn split_strips_the_mapping_key_and_keeps_the_rest() {
    let mut request = DataRequest::parse("VARIABLE=u;MEMBER=3").unwrap();
    request.insert(LOGP_SCALED_KEY, "6.956545/-12.0");
    let (mapping, forward) = split_request(&request).unwrap();
    assert!((mapping.log_p_bottom_hpa - 6.956545).abs() < 1e-9);
    assert!(!forward.contains(LOGP_SCALED_KEY));
    assert_eq!(forward.to_request_string(), "VARIABLE=u;MEMBER=3");
}

#[test]
fn split_requires_the_mapping_key() {
    let request = DataRequest::parse("VARIABLE=u").unwrap();
    assert!(matches!(
        split_request(&request).unwrap_err(),
        RollvarError::Request(_)
    ));
}
