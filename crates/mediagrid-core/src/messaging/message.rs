//! Notification messages.
//!
//! A message travels as an id plus two field maps: single-valued fields and
//! list-valued fields. Callers fetch an empty template keyed by message id,
//! populate it from their arguments, and send it synchronously. Which map a
//! field lands in is decided by the shape of the supplied value, and a field
//! name lives in exactly one of the two maps.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

/// One argument supplied to [`crate::messaging::MessageDispatcher::notify`].
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Scalar(Value),
    List(Vec<Value>),
}

impl From<Value> for FieldValue {
    /// JSON arrays become list fields; everything else is a scalar.
    fn from(value: Value) -> Self {
        match value {
            Value::Array(items) => FieldValue::List(items),
            other => FieldValue::Scalar(other),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Scalar(Value::String(value.to_string()))
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Scalar(Value::String(value))
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Scalar(value.into())
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Scalar(value.into())
    }
}

impl<T: Into<Value>> From<Vec<T>> for FieldValue {
    fn from(values: Vec<T>) -> Self {
        FieldValue::List(values.into_iter().map(Into::into).collect())
    }
}

/// Arguments for a notification, keyed by field name.
pub type MessageArgs = HashMap<String, FieldValue>;

/// A notification message: an opaque id plus scalar and list field maps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    #[serde(default)]
    pub values: BTreeMap<String, Value>,
    #[serde(default)]
    pub lists: BTreeMap<String, Vec<Value>>,
}

impl Message {
    /// An empty template for the given message id.
    pub fn template(id: Uuid) -> Self {
        Self {
            id,
            values: BTreeMap::new(),
            lists: BTreeMap::new(),
        }
    }

    /// Set one field, routed by the shape of the value. Re-setting a field
    /// with a differently-shaped value moves it to the other map, so a name
    /// never appears in both.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        let name = name.into();
        match value.into() {
            FieldValue::Scalar(v) => {
                self.lists.remove(&name);
                self.values.insert(name, v);
            }
            FieldValue::List(v) => {
                self.values.remove(&name);
                self.lists.insert(name, v);
            }
        }
    }

    /// Populate this template from a caller's argument map.
    pub fn apply_args(&mut self, args: MessageArgs) {
        for (name, value) in args {
            self.set(name, value);
        }
    }

    pub fn value(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn list(&self, name: &str) -> Option<&[Value]> {
        self.lists.get(name).map(Vec::as_slice)
    }
}
