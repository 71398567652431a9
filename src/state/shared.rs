use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{FlowError, Result};

/// Flow 共享状态
///
/// One mutable key/value map threaded through every node of a run. Keys are
/// agreed on by convention between nodes; writes are last-writer-wins.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SharedState {
    values: Map<String, Value>,
}

impl SharedState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a state from a JSON object. Any other JSON value is rejected.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(values) => Ok(Self { values }),
            other => Err(FlowError::InvalidState {
                key: "<root>".to_string(),
                reason: format!("expected an object, found {}", type_name(&other)),
            }),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.values.get_mut(key)
    }

    /// Reads `key` as `T`. A missing key or JSON `null` yields `Ok(None)`.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.values.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => T::deserialize(value)
                .map(Some)
                .map_err(|e| FlowError::InvalidState {
                    key: key.to_string(),
                    reason: e.to_string(),
                }),
        }
    }

    /// Reads `key` as `T`, failing when it is absent.
    pub fn require<T: DeserializeOwned>(&self, key: &str) -> Result<T> {
        self.get_as(key)?
            .ok_or_else(|| FlowError::MissingState(key.to_string()))
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(Value::as_str)
    }

    pub fn set<T: Serialize>(&mut self, key: impl Into<String>, value: T) -> Result<()> {
        let value = serde_json::to_value(value)?;
        self.values.insert(key.into(), value);
        Ok(())
    }

    /// Stores a raw JSON value and returns the previous one.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.values.insert(key.into(), value)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Appends `value` to the array stored at `key`, creating the array when
    /// the key is missing or `null`.
    pub fn push<T: Serialize>(&mut self, key: &str, value: T) -> Result<()> {
        let value = serde_json::to_value(value)?;
        let slot = self
            .values
            .entry(key.to_string())
            .or_insert_with(|| Value::Array(Vec::new()));
        if slot.is_null() {
            *slot = Value::Array(Vec::new());
        }
        match slot {
            Value::Array(items) => {
                items.push(value);
                Ok(())
            }
            other => Err(FlowError::InvalidState {
                key: key.to_string(),
                reason: format!("expected an array, found {}", type_name(other)),
            }),
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl From<Map<String, Value>> for SharedState {
    fn from(values: Map<String, Value>) -> Self {
        Self { values }
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
