#![allow(clippy::float_cmp)]

use super::*;

#[test]
fn empty_object_yields_defaults() {
    let config = EngineConfig::from_json("{}").unwrap();
    assert_eq!(config, EngineConfig::default());
    assert_eq!(config.snap_sensitivity, DEFAULT_SNAP_SENSITIVITY);
    assert_eq!(config.guide_max_points, DEFAULT_GUIDE_MAX_POINTS);
    assert!(config.merge_ignore_hidden);
    assert_eq!(config.level().unwrap(), Level::INFO);
}

#[test]
fn fields_are_camel_case() {
    let config = EngineConfig::from_json(
        r#"{"snapSensitivity":0.5,"guideMaxPoints":0,"simplifyTolerance":0.0,"mergeIgnoreHidden":false,"logLevel":"debug"}"#,
    )
    .unwrap();
    assert_eq!(config.snap_sensitivity, 0.5);
    assert_eq!(config.guide_max_points, 0);
    assert_eq!(config.simplify_tolerance, 0.0);
    assert!(!config.merge_ignore_hidden);
    assert_eq!(config.level().unwrap(), Level::DEBUG);
}

#[test]
fn sensitivity_must_be_in_unit_range() {
    for bad in ["0", "-0.1", "1.5"] {
        let err = EngineConfig::from_json(&format!(r#"{{"snapSensitivity":{bad}}}"#)).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "snapSensitivity", .. }), "{bad}");
    }
    assert!(EngineConfig::from_json(r#"{"snapSensitivity":1.0}"#).is_ok());
}

#[test]
fn non_finite_sensitivity_is_rejected() {
    let config = EngineConfig { snap_sensitivity: f64::NAN, ..EngineConfig::default() };
    assert!(config.validate().is_err());
}

#[test]
fn negative_tolerance_is_rejected() {
    let err = EngineConfig::from_json(r#"{"simplifyTolerance":-1}"#).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { field: "simplifyTolerance", .. }));
    assert_eq!(err.error_code(), "E_CONFIG_INVALID");
}

#[test]
fn unknown_log_level_is_rejected() {
    let err = EngineConfig::from_json(r#"{"logLevel":"verbose"}"#).unwrap_err();
    assert!(err.to_string().contains("verbose"));
}

#[test]
fn mistyped_field_is_parse_error() {
    let err = EngineConfig::from_json(r#"{"guideMaxPoints":"many"}"#).unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
    assert_eq!(err.error_code(), "E_CONFIG_PARSE");
}
