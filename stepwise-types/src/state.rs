use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};

use crate::FieldPath;

/// Error type for state access operations.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("The state root cannot be addressed as a field")]
    RootPath,

    #[error("Cannot write '{0}': a parent field holds a value that is not an object")]
    NotAnObject(FieldPath),

    #[error("Wizard state must be an object, got {0}")]
    InvalidRoot(&'static str),

    #[error("Could not encode the value for '{path}': {source}")]
    Encode {
        path: FieldPath,
        #[source]
        source: serde_json::Error,
    },

    #[error("Could not decode '{path}': {source}")]
    Decode {
        path: FieldPath,
        #[source]
        source: serde_json::Error,
    },
}

/// A partially-filled instance of the wizard's target type.
///
/// Fields are addressed by `FieldPath`; nested paths create intermediate
/// objects on write. A field is absent until something writes it. `null`
/// is treated as absent, so `Option` fields of a partial value that are
/// `None` stay unanswered.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WizardState {
    root: Map<String, Value>,
}

impl WizardState {
    /// Create a new empty state.
    pub fn new() -> Self {
        Self { root: Map::new() }
    }

    /// Build a state from any serializable partial value.
    pub fn from_serialize<T: Serialize>(partial: &T) -> Result<Self, StateError> {
        let value = serde_json::to_value(partial).map_err(|source| StateError::Encode {
            path: FieldPath::root(),
            source,
        })?;
        Self::from_value(value)
    }

    /// Build a state from a JSON object. Nulls are dropped.
    pub fn from_value(value: Value) -> Result<Self, StateError> {
        match strip_nulls(value) {
            Some(Value::Object(root)) => Ok(Self { root }),
            None => Ok(Self::new()),
            Some(other) => Err(StateError::InvalidRoot(type_name(&other))),
        }
    }

    /// Get the raw value at the given path.
    pub fn get_value(&self, path: &FieldPath) -> Option<&Value> {
        let mut segments = path.segments();
        let first = segments.next()?;
        let mut current = self.root.get(first)?;
        for segment in segments {
            current = current.as_object()?.get(segment)?;
        }
        Some(current).filter(|v| !v.is_null())
    }

    /// Decode the value at the given path.
    pub fn get<T: DeserializeOwned>(&self, path: &FieldPath) -> Result<Option<T>, StateError> {
        self.get_value(path)
            .map(|value| {
                serde_json::from_value(value.clone()).map_err(|source| StateError::Decode {
                    path: path.clone(),
                    source,
                })
            })
            .transpose()
    }

    /// Get a string value at the given path.
    pub fn get_str(&self, path: impl Into<FieldPath>) -> Option<&str> {
        self.get_value(&path.into()).and_then(Value::as_str)
    }

    /// Check if a value exists at the given path.
    pub fn contains(&self, path: &FieldPath) -> bool {
        self.get_value(path).is_some()
    }

    /// Encode and store a value at the given path.
    pub fn set<T: Serialize>(
        &mut self,
        path: impl Into<FieldPath>,
        value: T,
    ) -> Result<(), StateError> {
        let path = path.into();
        let value = serde_json::to_value(value).map_err(|source| StateError::Encode {
            path: path.clone(),
            source,
        })?;
        self.set_value(&path, value)
    }

    /// Store a raw value at the given path, creating parent objects as needed.
    pub fn set_value(&mut self, path: &FieldPath, value: Value) -> Result<(), StateError> {
        let Some(last) = path.last() else {
            return Err(StateError::RootPath);
        };
        let parent = path.parent();
        let mut current = &mut self.root;
        for segment in parent.segments() {
            let entry = current
                .entry(segment.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if entry.is_null() {
                *entry = Value::Object(Map::new());
            }
            current = entry
                .as_object_mut()
                .ok_or_else(|| StateError::NotAnObject(path.clone()))?;
        }
        current.insert(last.to_string(), value);
        Ok(())
    }

    /// Remove the value at the given path.
    ///
    /// Parent objects left empty by the removal are removed as well.
    pub fn remove(&mut self, path: &FieldPath) -> Option<Value> {
        let segments: Vec<&str> = path.segments().collect();
        remove_in(&mut self.root, &segments).filter(|v| !v.is_null())
    }

    /// Top-level field names that currently hold a value.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.root.keys().map(String::as_str)
    }

    /// Get the number of top-level fields.
    pub fn len(&self) -> usize {
        self.root.len()
    }

    /// Check if nothing has been answered yet.
    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    /// The state as a JSON object.
    pub fn to_value(&self) -> Value {
        Value::Object(self.root.clone())
    }

    /// Consume the state, returning the JSON object.
    pub fn into_value(self) -> Value {
        Value::Object(self.root)
    }

    /// Reconstruct the target type from the collected answers.
    pub fn into_response<T: DeserializeOwned>(self) -> Result<T, StateError> {
        serde_json::from_value(self.into_value()).map_err(|source| StateError::Decode {
            path: FieldPath::root(),
            source,
        })
    }
}

fn remove_in(map: &mut Map<String, Value>, segments: &[&str]) -> Option<Value> {
    match segments {
        [] => None,
        [last] => map.remove(*last),
        [first, rest @ ..] => {
            let child = map.get_mut(*first)?.as_object_mut()?;
            let removed = remove_in(child, rest);
            if removed.is_some() && child.is_empty() {
                map.remove(*first);
            }
            removed
        }
    }
}

fn strip_nulls(value: Value) -> Option<Value> {
    match value {
        Value::Null => None,
        Value::Object(map) => Some(Value::Object(
            map.into_iter()
                .filter_map(|(k, v)| strip_nulls(v).map(|v| (k, v)))
                .collect(),
        )),
        other => Some(other),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
