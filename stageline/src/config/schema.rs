//! Metadata schema describing what a configuration must contain.

use super::ConfigMap;
use crate::errors::ConfigError;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Field name to field rules, checked in file order.
pub type MetaConfig = IndexMap<String, FieldSpec>;

/// The value type a field must have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// A string.
    Str,
    /// An integer.
    ///
    /// Booleans do not pass, even though some validators accept `true` and
    /// `false` as 1 and 0 here. Declare such fields as [`FieldType::Bool`].
    Int,
    /// Any number.
    Float,
    /// A boolean.
    Bool,
    /// A string naming a filesystem path that must exist.
    Path,
}

impl FieldType {
    /// Returns true if `value` has this type.
    #[must_use]
    pub fn matches(self, value: &serde_json::Value) -> bool {
        match self {
            Self::Str | Self::Path => value.is_string(),
            Self::Int => value.is_i64() || value.is_u64(),
            Self::Float => value.is_number(),
            Self::Bool => value.is_boolean(),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Str => "str",
            Self::Int => "int",
            Self::Float => "float",
            Self::Bool => "bool",
            Self::Path => "path",
        };
        f.write_str(name)
    }
}

/// Rules for a single field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldSpec {
    /// Whether the field must be present.
    #[serde(default)]
    pub required: bool,
    /// Expected type.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub field_type: Option<FieldType>,
    /// Inclusive `[min, max]` bounds for numeric fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<[f64; 2]>,
}

impl FieldSpec {
    /// A required field with no further rules.
    #[must_use]
    pub fn required() -> Self {
        Self {
            required: true,
            ..Self::default()
        }
    }

    /// Sets the expected type.
    #[must_use]
    pub fn with_type(mut self, field_type: FieldType) -> Self {
        self.field_type = Some(field_type);
        self
    }

    /// Sets inclusive numeric bounds.
    #[must_use]
    pub fn with_range(mut self, min: f64, max: f64) -> Self {
        self.range = Some([min, max]);
        self
    }
}

/// Loads a metadata schema from a YAML file.
///
/// # Errors
///
/// Returns [`ConfigError::Load`] if the file cannot be read or an entry is
/// not a valid field spec.
pub fn load_meta(path: impl AsRef<Path>) -> Result<MetaConfig, ConfigError> {
    let path = path.as_ref();
    let raw: ConfigMap = super::load_yaml(path)?;
    raw.into_iter()
        .map(|(field, spec)| {
            serde_json::from_value(spec)
                .map(|spec| (field.clone(), spec))
                .map_err(|e| ConfigError::Load {
                    path: path.to_path_buf(),
                    reason: format!("invalid spec for '{field}': {e}"),
                })
        })
        .collect()
}
