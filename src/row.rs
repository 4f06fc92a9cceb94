//! Rows and dotted-path access
//!
//! A row is a loosely typed JSON object. Field keys such as
//! `damageTrack.stun` address nested objects; writes are copy-on-write so a
//! row held in undo history is never mutated behind its back.

use serde_json::{Map, Value};
use shipyard_schema::{SectionSchema, Shape, ID_FIELD};

use crate::config::deep_merge;

/// One record of a section
pub type Row = Map<String, Value>;

/// Read the value at a dotted path
pub fn get_path<'a>(row: &'a Row, path: &str) -> Option<&'a Value> {
    let mut parts = path.split('.');
    let mut current = row.get(parts.next()?)?;
    for part in parts {
        current = current.as_object()?.get(part)?;
    }
    Some(current)
}

/// Return a copy of `row` with `value` written at `path`.
///
/// Intermediate objects are created as needed and sibling keys at every
/// level are preserved. A non-object sitting on the path is replaced.
pub fn set_path(row: &Row, path: &str, value: Value) -> Row {
    let base = remove_path(row, path);
    let fragment = path
        .rsplit('.')
        .fold(value, |inner, key| {
            let mut map = Map::new();
            map.insert(key.to_string(), inner);
            Value::Object(map)
        });
    match deep_merge(Value::Object(base), fragment) {
        Value::Object(map) => map,
        _ => row.clone(),
    }
}

/// Return a copy of `row` without the leaf at `path`.
///
/// Parent objects are kept even when they become empty.
pub fn remove_path(row: &Row, path: &str) -> Row {
    let mut out = row.clone();
    remove_in(&mut out, &path.split('.').collect::<Vec<_>>());
    out
}

fn remove_in(map: &mut Row, parts: &[&str]) {
    match parts {
        [] => {}
        [leaf] => {
            map.remove(*leaf);
        }
        [head, rest @ ..] => {
            if let Some(Value::Object(child)) = map.get_mut(*head) {
                remove_in(child, rest);
            }
        }
    }
}

/// The row identifier, if present.
///
/// Ids are compared as text: a numeric id is rendered with its JSON number
/// formatting, so `1` and `"1"` name the same row in merges, duplicate
/// checks and imports. Grid edits always store ids as strings.
pub fn row_id(row: &Row) -> Option<String> {
    match row.get(ID_FIELD)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Convert a section's root value into rows.
///
/// Returns `None` when the value does not have the section's shape.
/// Non-object entries inside an Array or Record are dropped.
pub fn rows_from_value(shape: Shape, value: &Value) -> Option<Vec<Row>> {
    match (shape, value) {
        (Shape::Array, Value::Array(items)) => Some(
            items
                .iter()
                .filter_map(|item| item.as_object().cloned())
                .collect(),
        ),
        (Shape::Object, Value::Object(map)) => Some(vec![map.clone()]),
        (Shape::Record, Value::Object(map)) => Some(
            map.iter()
                .filter_map(|(key, item)| {
                    let mut row = item.as_object()?.clone();
                    row.insert(ID_FIELD.to_string(), Value::String(key.clone()));
                    Some(row)
                })
                .collect(),
        ),
        _ => None,
    }
}

/// Convert rows back into a section's root value.
///
/// Record rows lose their synthetic `id`; rows without one are skipped.
/// An Object section keeps only its first row.
pub fn rows_to_value(shape: Shape, rows: &[Row]) -> Value {
    match shape {
        Shape::Array => Value::Array(rows.iter().cloned().map(Value::Object).collect()),
        Shape::Object => Value::Object(rows.first().cloned().unwrap_or_default()),
        Shape::Record => {
            let mut map = Map::new();
            for row in rows {
                if let Some(id) = row_id(row) {
                    let mut body = row.clone();
                    body.remove(ID_FIELD);
                    map.insert(id, Value::Object(body));
                }
            }
            Value::Object(map)
        }
    }
}

/// Rows for a section inside a data-file object, `None` when absent
pub fn section_rows(schema: &SectionSchema, file: &Map<String, Value>) -> Option<Vec<Row>> {
    let value = file.get(schema.root_key)?;
    let rows = rows_from_value(schema.shape, value);
    if rows.is_none() {
        tracing::warn!(
            section = schema.id,
            file = schema.file_id,
            "root key holds a value of the wrong shape; ignoring"
        );
    }
    rows
}

/// Parse the section's new-item template
pub fn template_row(schema: &SectionSchema) -> Row {
    match serde_json::from_str::<Value>(schema.new_item_template) {
        Ok(Value::Object(map)) => map,
        _ => Row::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(v: Value) -> Row {
        v.as_object().unwrap().clone()
    }

    #[test]
    fn test_get_path_nested() {
        let r = row(json!({"id": "scout", "damageTrack": {"stun": 4}}));
        assert_eq!(get_path(&r, "damageTrack.stun"), Some(&json!(4)));
        assert_eq!(get_path(&r, "damageTrack.wound"), None);
        assert_eq!(get_path(&r, "id.deeper"), None);
    }

    #[test]
    fn test_set_path_preserves_siblings() {
        let r = row(json!({"id": "scout", "damageTrack": {"stun": 4, "wound": 4}}));
        let updated = set_path(&r, "damageTrack.stun", json!(6));

        assert_eq!(updated["damageTrack"]["stun"], 6);
        assert_eq!(updated["damageTrack"]["wound"], 4);
        // original untouched
        assert_eq!(r["damageTrack"]["stun"], 4);
    }

    #[test]
    fn test_set_path_creates_parents() {
        let r = row(json!({"id": "x"}));
        let updated = set_path(&r, "range.short", json!(2));
        assert_eq!(updated["range"], json!({"short": 2}));
    }

    #[test]
    fn test_set_path_replaces_object_leaf() {
        let r = row(json!({"accelerationTable": {"5": 1, "10": 2}}));
        let updated = set_path(&r, "accelerationTable", json!({"20": 4}));
        assert_eq!(updated["accelerationTable"], json!({"20": 4}));
    }

    #[test]
    fn test_remove_path_keeps_parent() {
        let r = row(json!({"damage": {"good": "d6w"}}));
        let updated = remove_path(&r, "damage.good");
        assert_eq!(updated["damage"], json!({}));
    }

    #[test]
    fn test_row_id() {
        assert_eq!(row_id(&row(json!({"id": "a"}))), Some("a".to_string()));
        assert_eq!(row_id(&row(json!({"id": 7}))), Some("7".to_string()));
        assert_eq!(row_id(&row(json!({"id": 1}))), row_id(&row(json!({"id": "1"}))));
        assert_eq!(row_id(&row(json!({"name": "no id"}))), None);
    }

    #[test]
    fn test_record_round_trip_strips_id() {
        let value = json!({"turret": {"costMultiplier": 1.5}, "fixed": {"costMultiplier": 0.75}});
        let rows = rows_from_value(Shape::Record, &value).unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.contains_key("id")));

        let back = rows_to_value(Shape::Record, &rows);
        assert_eq!(back, value);
    }

    #[test]
    fn test_object_shape_is_single_row() {
        let value = json!({"currencySymbol": "Cr"});
        let rows = rows_from_value(Shape::Object, &value).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows_to_value(Shape::Object, &rows), value);
        assert_eq!(rows_to_value(Shape::Object, &[]), json!({}));
    }

    #[test]
    fn test_wrong_shape_is_none() {
        assert!(rows_from_value(Shape::Array, &json!({"a": 1})).is_none());
        assert!(rows_from_value(Shape::Record, &json!([1, 2])).is_none());
    }

    #[test]
    fn test_templates_parse() {
        for schema in shipyard_schema::sections() {
            let t = template_row(schema);
            assert!(!t.is_empty(), "template for {} did not parse", schema.id);
        }
    }
}
