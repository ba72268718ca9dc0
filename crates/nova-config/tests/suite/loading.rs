use std::io::Write;

use nova_config::{ConfigError, NovaConfig};
use pretty_assertions::assert_eq;

#[test]
fn defaults_apply_to_missing_tables() {
    let (config, diagnostics) = NovaConfig::load_from_str_with_diagnostics("").expect("parse");
    assert_eq!(config, NovaConfig::default());
    assert!(diagnostics.is_empty());
    assert!(config.cdi.remove_unused_beans);
    assert!(config.cdi.transform_unproxyable_classes);
    assert_eq!(config.cdi.generation_threads, 0);
    assert_eq!(config.logging.level, "info");
}

#[test]
fn loads_full_file() {
    let mut file = tempfile::NamedTempFile::new().expect("tempfile");
    write!(
        file,
        r#"
[cdi]
remove_unused_beans = false
unremovable = ["com.example.keep.*"]
selected_alternatives = ["com.example.MockService"]
transform_unproxyable_classes = false
fail_on_intercepted_private_method = true
additional_bean_defining_annotations = ["com.example.Service"]
generation_threads = 4

[logging]
level = "debug"
json = true
stderr = false
"#
    )
    .expect("write");

    let config = NovaConfig::load_from_path(file.path()).expect("load");
    assert!(!config.cdi.remove_unused_beans);
    assert_eq!(config.cdi.unremovable, vec!["com.example.keep.*".to_owned()]);
    assert!(config.cdi.fail_on_intercepted_private_method);
    assert!(!config.cdi.transform_unproxyable_classes);
    assert_eq!(config.cdi.generation_threads, 4);
    assert!(config.logging.json);
    assert!(!config.logging.stderr);
}

#[test]
fn missing_file_reports_path() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("nova-cdi.toml");
    let err = NovaConfig::load_from_path(&path).unwrap_err();
    match err {
        ConfigError::Io { path: reported, .. } => assert!(reported.ends_with("nova-cdi.toml")),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn type_errors_are_toml_errors() {
    let err = NovaConfig::load_from_str_with_diagnostics("[cdi]\ngeneration_threads = \"four\"\n")
        .unwrap_err();
    assert!(matches!(err, ConfigError::Toml(_)));
}
