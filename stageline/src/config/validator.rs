//! Validation of a merged configuration against a metadata schema.

use super::{ConfigMap, FieldType, MetaConfig};
use crate::errors::ConfigError;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// Checks a configuration against a metadata schema.
///
/// Fields are checked in schema order and validation stops at the first
/// problem. Per field the order is: required, type, range, path exists.
/// Fields present in the configuration but absent from the schema are ignored.
#[derive(Debug, Clone, Default)]
pub struct ConfigValidator {
    config: ConfigMap,
    meta: MetaConfig,
}

impl ConfigValidator {
    /// Creates a validator for an already loaded configuration.
    #[must_use]
    pub fn new(config: ConfigMap, meta: MetaConfig) -> Self {
        Self { config, meta }
    }

    /// Merges `config_paths` (later wins) and loads the schema at `meta_path`.
    ///
    /// # Errors
    ///
    /// Returns the first load failure.
    pub fn from_files<P: AsRef<Path>>(
        config_paths: &[P],
        meta_path: impl AsRef<Path>,
    ) -> Result<Self, ConfigError> {
        let config = super::merge_configs(config_paths)?;
        let meta = super::load_meta(meta_path)?;
        Ok(Self::new(config, meta))
    }

    /// Returns the configuration being validated.
    #[must_use]
    pub fn config(&self) -> &ConfigMap {
        &self.config
    }

    /// Returns the schema.
    #[must_use]
    pub fn meta(&self) -> &MetaConfig {
        &self.meta
    }

    /// Consumes the validator and returns the configuration.
    #[must_use]
    pub fn into_config(self) -> ConfigMap {
        self.config
    }

    /// Runs every check.
    ///
    /// # Errors
    ///
    /// Returns the first violated rule.
    pub fn validate(&self) -> Result<(), ConfigError> {
        info!(fields = self.meta.len(), "Starting validation process");

        for (field, spec) in &self.meta {
            let Some(value) = self.config.get(field) else {
                if spec.required {
                    return Err(fail(ConfigError::MissingField {
                        field: field.clone(),
                    }));
                }
                continue;
            };

            if let Some(expected) = spec.field_type {
                if !expected.matches(value) {
                    return Err(fail(ConfigError::TypeMismatch {
                        field: field.clone(),
                        expected: expected.to_string(),
                    }));
                }
            }

            if let Some([min, max]) = spec.range {
                check_range(field, value, min, max)?;
            }

            if spec.field_type == Some(FieldType::Path) {
                check_path_exists(field, value)?;
            }
        }

        info!("Validation completed successfully");
        Ok(())
    }
}

fn check_range(field: &str, value: &Value, min: f64, max: f64) -> Result<(), ConfigError> {
    match value.as_f64() {
        Some(n) if (min..=max).contains(&n) => Ok(()),
        _ => Err(fail(ConfigError::OutOfRange {
            field: field.to_string(),
            min,
            max,
        })),
    }
}

fn check_path_exists(field: &str, value: &Value) -> Result<(), ConfigError> {
    let path = PathBuf::from(value.as_str().unwrap_or_default());
    if path.exists() {
        Ok(())
    } else {
        Err(fail(ConfigError::PathNotFound {
            field: field.to_string(),
            path,
        }))
    }
}

fn fail(err: ConfigError) -> ConfigError {
    error!(field = err.field().unwrap_or_default(), "{}", err);
    err
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FieldSpec;
    use serde_json::json;
    use std::io::Write;

    fn config(pairs: &[(&str, Value)]) -> ConfigMap {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect()
    }

    fn meta(pairs: Vec<(&str, FieldSpec)>) -> MetaConfig {
        pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
    }

    #[test]
    fn test_valid_config_passes() {
        let dir = tempfile::tempdir().unwrap();
        let validator = ConfigValidator::new(
            config(&[
                ("name", json!("demo")),
                ("workers", json!(4)),
                ("data_dir", json!(dir.path().to_str().unwrap())),
            ]),
            meta(vec![
                ("name", FieldSpec::required().with_type(FieldType::Str)),
                (
                    "workers",
                    FieldSpec::required()
                        .with_type(FieldType::Int)
                        .with_range(1.0, 16.0),
                ),
                ("data_dir", FieldSpec::default().with_type(FieldType::Path)),
                ("optional", FieldSpec::default().with_type(FieldType::Int)),
            ]),
        );
        assert!(validator.validate().is_ok());
    }

    #[test]
    fn test_missing_required_field() {
        let validator = ConfigValidator::new(
            ConfigMap::new(),
            meta(vec![("workers", FieldSpec::required())]),
        );
        let err = validator.validate().unwrap_err();
        assert_eq!(err.to_string(), "Missing required field: workers");
    }

    #[test]
    fn test_type_mismatch() {
        let validator = ConfigValidator::new(
            config(&[("workers", json!("four"))]),
            meta(vec![("workers", FieldSpec::default().with_type(FieldType::Int))]),
        );
        let err = validator.validate().unwrap_err();
        assert_eq!(err.to_string(), "Field 'workers' should be of type int");
    }

    #[test]
    fn test_out_of_range() {
        let validator = ConfigValidator::new(
            config(&[("workers", json!(32))]),
            meta(vec![("workers", FieldSpec::default().with_range(1.0, 16.0))]),
        );
        let err = validator.validate().unwrap_err();
        assert_eq!(err.to_string(), "Field 'workers' must be between 1 and 16");
    }

    #[test]
    fn test_range_bounds_are_inclusive() {
        let spec = FieldSpec::default().with_range(1.0, 16.0);
        for value in [1, 16] {
            let validator = ConfigValidator::new(
                config(&[("workers", json!(value))]),
                meta(vec![("workers", spec.clone())]),
            );
            assert!(validator.validate().is_ok());
        }
    }

    #[test]
    fn test_range_on_non_number_fails() {
        let validator = ConfigValidator::new(
            config(&[("workers", json!("many"))]),
            meta(vec![("workers", FieldSpec::default().with_range(1.0, 16.0))]),
        );
        assert!(matches!(
            validator.validate().unwrap_err(),
            ConfigError::OutOfRange { .. }
        ));
    }

    #[test]
    fn test_path_must_exist() {
        let validator = ConfigValidator::new(
            config(&[("data_dir", json!("/no/such/dir"))]),
            meta(vec![("data_dir", FieldSpec::default().with_type(FieldType::Path))]),
        );
        let err = validator.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Specified path for 'data_dir' does not exist: /no/such/dir"
        );
    }

    #[test]
    fn test_first_error_in_schema_order() {
        let validator = ConfigValidator::new(
            config(&[("b", json!("x"))]),
            meta(vec![
                ("b", FieldSpec::default().with_type(FieldType::Int)),
                ("a", FieldSpec::required()),
            ]),
        );
        assert_eq!(validator.validate().unwrap_err().field(), Some("b"));
    }

    #[test]
    fn test_from_files() {
        let mut base = tempfile::NamedTempFile::new().unwrap();
        writeln!(base, "workers: 2\nname: base").unwrap();
        let mut overlay = tempfile::NamedTempFile::new().unwrap();
        writeln!(overlay, "workers: 20").unwrap();
        let mut schema = tempfile::NamedTempFile::new().unwrap();
        writeln!(schema, "workers:\n  required: true\n  type: int\n  range: [1, 8]").unwrap();

        let validator =
            ConfigValidator::from_files(&[base.path(), overlay.path()], schema.path()).unwrap();

        assert_eq!(validator.config()["workers"], json!(20));
        assert!(matches!(
            validator.validate().unwrap_err(),
            ConfigError::OutOfRange { .. }
        ));
    }
}
