use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Key/value setting
///
/// Values are arbitrary JSON documents, stored as text. Settings carry
/// feature flags (e.g. the seeded flag) and metadata (e.g. seeding date).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Setting {
    pub key: String,
    pub value: Value,
}

impl Setting {
    pub fn new(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Interpret the value as a flag: `true` or the string `"true"`.
    ///
    /// Anything else, including `"false"` and `null`, reads as `false`.
    pub fn is_truthy(&self) -> bool {
        is_truthy(&self.value)
    }
}

pub(crate) fn is_truthy(value: &Value) -> bool {
    matches!(value, Value::Bool(true)) || matches!(value, Value::String(s) if s == "true")
}
