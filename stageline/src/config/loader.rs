//! YAML loading and merge-by-precedence.

use super::ConfigMap;
use crate::errors::ConfigError;
use std::path::Path;
use tracing::{error, info};

/// Loads a YAML file whose top level is a mapping.
///
/// An empty document loads as an empty mapping.
///
/// # Errors
///
/// Returns [`ConfigError::Load`] if the file cannot be read or parsed, and
/// [`ConfigError::NotAMapping`] if the document is a scalar or a sequence.
pub fn load_yaml(path: impl AsRef<Path>) -> Result<ConfigMap, ConfigError> {
    let path = path.as_ref();
    info!(path = %path.display(), "Loading configuration from {}", path.display());

    let content = std::fs::read_to_string(path).map_err(|e| load_error(path, &e))?;
    let document: serde_yaml::Value =
        serde_yaml::from_str(&content).map_err(|e| load_error(path, &e))?;

    match document {
        serde_yaml::Value::Null => Ok(ConfigMap::new()),
        serde_yaml::Value::Mapping(_) => {
            serde_yaml::from_value(document).map_err(|e| load_error(path, &e))
        }
        _ => {
            error!(path = %path.display(), "Configuration is not a mapping");
            Err(ConfigError::NotAMapping {
                path: path.to_path_buf(),
            })
        }
    }
}

/// Loads every file in order and merges them; later files win per key.
///
/// The merge is shallow: a key present in a later file replaces the whole
/// value from earlier files.
///
/// # Errors
///
/// Returns the first load failure.
pub fn merge_configs<P: AsRef<Path>>(paths: &[P]) -> Result<ConfigMap, ConfigError> {
    let mut merged = ConfigMap::new();
    for path in paths {
        merged.extend(load_yaml(path)?);
    }
    Ok(merged)
}

fn load_error(path: &Path, err: &dyn std::fmt::Display) -> ConfigError {
    error!(path = %path.display(), error = %err, "Failed to load YAML file");
    ConfigError::Load {
        path: path.to_path_buf(),
        reason: err.to_string(),
    }
}
