//! JSON overlay merge
//!
//! Used for configuration layers and for singleton (Object-shaped) sections.
//! Objects merge key by key; any other overlay value, `null` included,
//! replaces what was there.

use serde_json::Value;

/// Apply `overlay` on top of `target` in place
pub fn merge_into(target: &mut Value, overlay: Value) {
    match (target, overlay) {
        (Value::Object(target_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                match target_map.get_mut(&key) {
                    Some(existing) => merge_into(existing, value),
                    None => {
                        target_map.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

/// Owned form of [`merge_into`]
pub fn deep_merge(mut base: Value, overlay: Value) -> Value {
    merge_into(&mut base, overlay);
    base
}

/// Fold layers lowest precedence first
pub fn merge_layers(layers: Vec<Value>) -> Value {
    layers.into_iter().fold(Value::Null, deep_merge)
}
