use nova_config::{ConfigWarning, NovaConfig};
use pretty_assertions::assert_eq;

#[test]
fn unknown_keys_are_reported_with_full_paths() {
    let text = r#"
[cdi]
remove_unused = false

[logging]
colour = true

[extensions]
enabled = true
"#;
    let (_config, diagnostics) = NovaConfig::load_from_str_with_diagnostics(text).expect("parse");
    assert_eq!(
        diagnostics.unknown_keys,
        vec![
            "cdi.remove_unused".to_owned(),
            "extensions".to_owned(),
            "logging.colour".to_owned(),
        ]
    );
}

#[test]
fn invalid_values_become_warnings() {
    let text = r#"
[cdi]
unremovable = ["com.example.[", "com.example.ok.*"]
additional_bean_defining_annotations = ["com..Broken"]

[logging]
level = "nova.cdi=loud"
"#;
    let (_config, diagnostics) = NovaConfig::load_from_str_with_diagnostics(text).expect("parse");
    assert_eq!(diagnostics.warnings.len(), 3);
    assert!(matches!(
        &diagnostics.warnings[0],
        ConfigWarning::InvalidGlob { pattern, .. } if pattern == "com.example.["
    ));
    assert!(matches!(
        &diagnostics.warnings[1],
        ConfigWarning::InvalidValue { toml_path, .. }
            if toml_path == "cdi.additional_bean_defining_annotations[0]"
    ));
    assert!(matches!(
        &diagnostics.warnings[2],
        ConfigWarning::LoggingLevelInvalid { .. }
    ));
}
