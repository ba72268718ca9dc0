use crate::diagnostics::ConfigWarning;
use crate::{build_glob_set, ConfigError, LoggingConfig, NovaConfig};

impl NovaConfig {
    /// Validate semantic invariants for a configuration.
    ///
    /// Validation is best-effort: it reports as many problems as possible in one pass.
    #[must_use]
    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut out = Vec::new();
        validate_globs("cdi.unremovable", &self.cdi.unremovable, &mut out);
        validate_globs(
            "cdi.selected_alternatives",
            &self.cdi.selected_alternatives,
            &mut out,
        );
        validate_annotation_names(self, &mut out);
        validate_logging(self, &mut out);
        out
    }
}

fn validate_globs(toml_path: &str, patterns: &[String], out: &mut Vec<ConfigWarning>) {
    for pattern in patterns {
        if let Err(ConfigError::Glob { source, .. }) =
            build_glob_set(toml_path, std::slice::from_ref(pattern))
        {
            out.push(ConfigWarning::InvalidGlob {
                toml_path: toml_path.to_owned(),
                pattern: pattern.clone(),
                message: source.to_string(),
            });
        }
    }
}

fn validate_annotation_names(config: &NovaConfig, out: &mut Vec<ConfigWarning>) {
    for (idx, name) in config
        .cdi
        .additional_bean_defining_annotations
        .iter()
        .enumerate()
    {
        let valid = !name.is_empty()
            && name.split('.').all(|segment| {
                !segment.is_empty()
                    && segment
                        .chars()
                        .all(|c| c.is_alphanumeric() || c == '_' || c == '$')
            });
        if !valid {
            out.push(ConfigWarning::InvalidValue {
                toml_path: format!("cdi.additional_bean_defining_annotations[{idx}]"),
                message: format!("`{name}` is not a binary class name"),
            });
        }
    }
}

fn validate_logging(config: &NovaConfig, out: &mut Vec<ConfigWarning>) {
    let normalized = LoggingConfig::normalize_level_directives(&config.logging.level);
    if !config.logging.level.trim().is_empty()
        && tracing_subscriber::EnvFilter::try_new(normalized.clone()).is_err()
    {
        out.push(ConfigWarning::LoggingLevelInvalid {
            value: config.logging.level.clone(),
            normalized,
        });
    }
}
