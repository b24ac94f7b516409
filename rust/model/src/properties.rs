// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Extension-attribute registry.
//!
//! Installed extensions (energy, radiance, ...) attach their own property
//! bundles to model entities. The core model treats each bundle as an
//! opaque JSON value keyed by extension name: bundles survive duplication
//! and serialization round-trips, transforms leave them untouched, and
//! resetting an entity clears them back to defaults.

use rustc_hash::FxHashMap;
use serde_json::Value;

/// Registry mapping extension name to an opaque property bundle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtensionProperties {
    extensions: FxHashMap<String, Value>,
}

impl ExtensionProperties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, extension: &str) -> Option<&Value> {
        self.extensions.get(extension)
    }

    pub fn set(&mut self, extension: impl Into<String>, bundle: Value) {
        self.extensions.insert(extension.into(), bundle);
    }

    pub fn remove(&mut self, extension: &str) -> Option<Value> {
        self.extensions.remove(extension)
    }

    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.extensions.iter()
    }

    /// Clears every extension bundle back to defaults. Called when an
    /// entity changes in a way that invalidates extension data (e.g. a
    /// face type switch).
    pub fn reset_to_default(&mut self) {
        self.extensions.clear();
    }

    /// Loads bundles from a serialized properties object, skipping the
    /// `type` tag.
    pub fn load_from_value(&mut self, value: &Value) {
        if let Value::Object(map) = value {
            for (key, bundle) in map {
                if key != "type" {
                    self.extensions.insert(key.clone(), bundle.clone());
                }
            }
        }
    }

    /// Serializes the registry as a properties object with the given
    /// `type` tag.
    pub fn to_value(&self, type_tag: &str) -> Value {
        let mut map = serde_json::Map::new();
        map.insert("type".to_string(), Value::String(type_tag.to_string()));
        let mut keys: Vec<&String> = self.extensions.keys().collect();
        keys.sort();
        for key in keys {
            if let Some(bundle) = self.extensions.get(key) {
                map.insert(key.clone(), bundle.clone());
            }
        }
        Value::Object(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn bundles_roundtrip_through_values() {
        let mut props = ExtensionProperties::new();
        props.set("energy", json!({"construction": "Generic Wall"}));
        props.set("radiance", json!({"modifier": "white"}));

        let value = props.to_value("FaceProperties");
        assert_eq!(value["type"], "FaceProperties");

        let mut restored = ExtensionProperties::new();
        restored.load_from_value(&value);
        assert_eq!(restored, props);
    }

    #[test]
    fn reset_clears_bundles() {
        let mut props = ExtensionProperties::new();
        props.set("energy", json!({"x": 1}));
        props.reset_to_default();
        assert!(props.is_empty());
    }

    #[test]
    fn duplicate_preserves_bundles() {
        let mut props = ExtensionProperties::new();
        props.set("energy", json!([1, 2, 3]));
        let copy = props.clone();
        assert_eq!(copy.get("energy"), props.get("energy"));
    }
}
