//! Configuration files: loading, merging and schema validation.
//!
//! Configurations are YAML mappings. Several files can be merged, with later
//! files taking precedence per top-level key, and the result checked against a
//! metadata schema that lists each field's rules.

mod loader;
mod schema;
mod validator;

pub use loader::{load_yaml, merge_configs};
pub use schema::{load_meta, FieldSpec, FieldType, MetaConfig};
pub use validator::ConfigValidator;

/// A loaded configuration: top-level keys in file order.
pub type ConfigMap = indexmap::IndexMap<String, serde_json::Value>;
