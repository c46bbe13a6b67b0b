//! Per-stage deltas.

use super::State;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The fields a stage added or changed, relative to its input state.
///
/// Removed fields are never reported.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Delta {
    changes: IndexMap<String, Value>,
}

impl Delta {
    /// Computes the delta between two state snapshots.
    ///
    /// Every key of `next` that is absent from `prior`, or whose value is not
    /// structurally equal to the one in `prior`, is included. Keys follow the
    /// order of `next`.
    #[must_use]
    pub fn extract(prior: &State, next: &State) -> Self {
        next.iter()
            .filter(|(key, value)| prior.get(key) != Some(*value))
            .map(|(key, value)| (key.to_string(), value.clone()))
            .collect()
    }

    /// Gets the new value of a changed field.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.changes.get(key)
    }

    /// Returns the number of changed fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    /// Returns true if the stage changed nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Iterates over changed field names.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.changes.keys().map(String::as_str)
    }

    /// Iterates over changed fields.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.changes.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Converts the delta into a JSON object.
    #[must_use]
    pub fn into_value(self) -> Value {
        Value::Object(self.changes.into_iter().collect())
    }
}

impl FromIterator<(String, Value)> for Delta {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            changes: iter.into_iter().collect(),
        }
    }
}

/// Computes the delta between `prior` and `next`.
#[must_use]
pub fn extract_delta(prior: &State, next: &State) -> Delta {
    Delta::extract(prior, next)
}
