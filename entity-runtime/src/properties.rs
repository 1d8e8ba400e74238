// Copyright 2025 John Brosnihan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//! Property bags
//!
//! Level editors describe objects as loose key/value maps. [`Properties`]
//! wraps such a map and reads typed values out of it, falling back to a
//! caller-supplied default when a key is absent. A key that is present
//! but holds the wrong type also falls back, with a warning, so a typo in
//! a level file never aborts loading.
//!
//! Numbers and booleans written as strings (`"24"`, `"true"`) are accepted
//! because several editors export every custom property as text.

use crate::error::json_type_name;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// Typed view over a JSON object of object properties
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Properties {
    values: Map<String, Value>,
}

impl Properties {
    /// Create an empty property bag
    pub fn new() -> Self {
        Properties { values: Map::new() }
    }

    /// Wrap a JSON value; anything other than an object yields an empty bag
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(values) => Properties { values },
            Value::Null => Properties::new(),
            other => {
                log::warn!(
                    "property bag must be an object, found {}; using no properties",
                    json_type_name(&other)
                );
                Properties::new()
            }
        }
    }

    /// Builder-style insert
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    /// Insert or replace a value
    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.values.insert(key.to_string(), value.into());
    }

    /// Raw access to a value
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Check whether a key is present
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check whether the bag is empty
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Read a floating point value
    pub fn get_f64(&self, key: &str, default: f64) -> f64 {
        match self.values.get(key) {
            None | Some(Value::Null) => default,
            Some(Value::Number(n)) => n.as_f64().unwrap_or(default),
            Some(Value::String(s)) => match s.trim().parse::<f64>() {
                Ok(v) if v.is_finite() => v,
                _ => mismatch(key, "number", s, default),
            },
            Some(other) => mismatch(key, "number", json_type_name(other), default),
        }
    }

    /// Read a signed integer, truncating fractional values
    pub fn get_i32(&self, key: &str, default: i32) -> i32 {
        if !self.has_value(key) {
            return default;
        }
        let value = self.get_f64(key, f64::NAN);
        if value.is_nan() {
            return default;
        }
        if value < i32::MIN as f64 || value > i32::MAX as f64 {
            return mismatch(key, "32-bit integer", &value.to_string(), default);
        }
        value as i32
    }

    /// Read a non-negative integer
    ///
    /// Negative values fall back to the default with a warning.
    pub fn get_u32(&self, key: &str, default: u32) -> u32 {
        if !self.has_value(key) {
            return default;
        }
        let value = self.get_f64(key, f64::NAN);
        if value.is_nan() {
            return default;
        }
        if value < 0.0 || value > u32::MAX as f64 {
            return mismatch(key, "non-negative integer", &value.to_string(), default);
        }
        value as u32
    }

    /// Read a boolean
    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        match self.values.get(key) {
            None | Some(Value::Null) => default,
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
                "true" => true,
                "false" => false,
                _ => mismatch(key, "boolean", s, default),
            },
            Some(other) => mismatch(key, "boolean", json_type_name(other), default),
        }
    }

    /// Read a string
    pub fn get_str<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        match self.values.get(key) {
            None | Some(Value::Null) => default,
            Some(Value::String(s)) => s,
            Some(other) => mismatch(key, "string", json_type_name(other), default),
        }
    }

    /// Read an optional, non-empty string
    pub fn get_opt_str(&self, key: &str) -> Option<&str> {
        let value = self.get_str(key, "");
        if value.is_empty() {
            None
        } else {
            Some(value)
        }
    }

    /// Decode a value with serde, warning and returning `None` on failure
    pub fn get_parsed<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.values.get(key)?;
        if value.is_null() {
            return None;
        }
        match serde_json::from_value(value.clone()) {
            Ok(parsed) => Some(parsed),
            Err(err) => {
                log::warn!("property '{}' could not be decoded: {}", key, err);
                None
            }
        }
    }

    /// The editor object type, used to pick an archetype
    pub fn object_type(&self) -> Option<&str> {
        self.get_opt_str("type")
    }

    /// Iterate over all entries
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    fn has_value(&self, key: &str) -> bool {
        !matches!(self.values.get(key), None | Some(Value::Null))
    }
}

impl From<Value> for Properties {
    fn from(value: Value) -> Self {
        Properties::from_value(value)
    }
}

fn mismatch<T>(key: &str, expected: &str, found: &str, default: T) -> T {
    log::warn!(
        "property '{}' should be a {} but was '{}'; using default",
        key,
        expected,
        found
    );
    default
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_keys_use_defaults() {
        let props = Properties::new();
        assert_eq!(props.get_f64("x", 0.0), 0.0);
        assert_eq!(props.get_u32("width", 16), 16);
        assert_eq!(props.get_str("name", ""), "");
        assert!(!props.get_bool("protectedFromCleanup", false));
    }

    #[test]
    fn test_typed_reads() {
        let props = Properties::from_value(json!({
            "x": 12.5,
            "width": 32,
            "name": "door",
            "startsOpen": true,
            "offset": -4
        }));
        assert_eq!(props.get_f64("x", 0.0), 12.5);
        assert_eq!(props.get_u32("width", 16), 32);
        assert_eq!(props.get_str("name", ""), "door");
        assert!(props.get_bool("startsOpen", false));
        assert_eq!(props.get_i32("offset", 0), -4);
    }

    #[test]
    fn test_wrong_types_fall_back() {
        let props = Properties::from_value(json!({
            "x": "left",
            "width": -5,
            "name": 7,
            "startsOpen": "perhaps"
        }));
        assert_eq!(props.get_f64("x", 3.0), 3.0);
        assert_eq!(props.get_u32("width", 16), 16);
        assert_eq!(props.get_str("name", "unnamed"), "unnamed");
        assert!(!props.get_bool("startsOpen", false));
    }

    #[test]
    fn test_string_encoded_values() {
        let props = Properties::new()
            .with("radius", "24")
            .with("autoPickup", "TRUE");
        assert_eq!(props.get_f64("radius", 0.0), 24.0);
        assert_eq!(props.get_u32("radius", 0), 24);
        assert!(props.get_bool("autoPickup", false));
    }

    #[test]
    fn test_non_object_value_is_empty() {
        assert!(Properties::from_value(json!([1, 2, 3])).is_empty());
        assert!(Properties::from_value(Value::Null).is_empty());
    }

    #[test]
    fn test_get_parsed_and_object_type() {
        let props = Properties::from_value(json!({"type": "door", "tags": ["a", "b"]}));
        assert_eq!(props.object_type(), Some("door"));
        assert_eq!(
            props.get_parsed::<Vec<String>>("tags"),
            Some(vec!["a".to_string(), "b".to_string()])
        );
        assert_eq!(props.get_parsed::<u32>("type"), None);
        assert_eq!(props.get_opt_str("missing"), None);
    }
}
