//! Row validation
//!
//! Field checks are advisory while editing and authoritative at save time:
//! a section with any error is not written.
//!
//! Checks, per field:
//! - required fields must be present and non-empty
//! - the value must be coercible to the declared type (numbers may be
//!   numeric strings)
//! - numbers must sit inside their bounds
//! - select values must be among the allowed values
//!
//! Per section, rows sharing an `id` are all flagged.

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

use shipyard_schema::{FieldDef, ScaleLevel, SectionSchema, ValueType};

use crate::row::{get_path, row_id, Row};

/// A single field problem
#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum FieldError {
    #[error("{field} is required")]
    Required { field: &'static str },

    #[error("{field} must be a {expected} value")]
    WrongType {
        field: &'static str,
        expected: ValueType,
    },

    #[error("{field} must be at least {min}")]
    BelowMin { field: &'static str, min: f64 },

    #[error("{field} must be at most {max}")]
    AboveMax { field: &'static str, max: f64 },

    #[error("{field}: '{value}' is not an allowed value")]
    NotAllowed { field: &'static str, value: String },

    #[error("{field}: entry {index} needs a non-empty string 'type'")]
    MissingTag { field: &'static str, index: usize },
}

impl FieldError {
    pub fn field(&self) -> &'static str {
        match self {
            Self::Required { field }
            | Self::WrongType { field, .. }
            | Self::BelowMin { field, .. }
            | Self::AboveMax { field, .. }
            | Self::NotAllowed { field, .. }
            | Self::MissingTag { field, .. } => field,
        }
    }
}

/// A problem attributed to one row
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum RowError {
    Field { row: usize, error: FieldError },
    DuplicateId { row: usize, id: String },
}

impl RowError {
    pub fn row(&self) -> usize {
        match self {
            Self::Field { row, .. } | Self::DuplicateId { row, .. } => *row,
        }
    }

    /// Offending field key; `id` for duplicates
    pub fn field(&self) -> &'static str {
        match self {
            Self::Field { error, .. } => error.field(),
            Self::DuplicateId { .. } => shipyard_schema::ID_FIELD,
        }
    }

    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::DuplicateId { .. })
    }
}

impl fmt::Display for RowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field { row, error } => write!(f, "row {}: {}", row + 1, error),
            Self::DuplicateId { row, id } => write!(f, "row {}: duplicate id '{}'", row + 1, id),
        }
    }
}

fn is_empty(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(Value::Array(items)) => items.is_empty(),
        Some(_) => false,
    }
}

/// Parse a number that may be stored as a numeric string
pub fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        _ => None,
    }
}

fn check_allowed(field: &FieldDef, value: &str) -> Option<FieldError> {
    if field.allowed_values.is_empty() || field.allowed_values.contains(&value) {
        None
    } else {
        Some(FieldError::NotAllowed {
            field: field.key,
            value: value.to_string(),
        })
    }
}

/// Check one value against its field definition.
///
/// `value` is `None` when the row does not carry the field at all.
pub fn validate_field(value: Option<&Value>, field: &FieldDef) -> Option<FieldError> {
    if is_empty(value) {
        return field
            .required
            .then_some(FieldError::Required { field: field.key });
    }
    let value = value?;
    let wrong_type = || {
        Some(FieldError::WrongType {
            field: field.key,
            expected: field.value_type,
        })
    };

    match field.value_type {
        ValueType::Raw => None,
        ValueType::Text => match value {
            Value::String(_) | Value::Number(_) => None,
            _ => wrong_type(),
        },
        ValueType::Number => {
            let Some(n) = as_number(value) else {
                return wrong_type();
            };
            let bounds = field.bounds?;
            if let Some(min) = bounds.min.filter(|&min| n < min) {
                return Some(FieldError::BelowMin { field: field.key, min });
            }
            if let Some(max) = bounds.max.filter(|&max| n > max) {
                return Some(FieldError::AboveMax { field: field.key, max });
            }
            None
        }
        ValueType::Boolean => match value {
            Value::Bool(_) => None,
            Value::String(s) if matches!(s.as_str(), "true" | "false") => None,
            _ => wrong_type(),
        },
        ValueType::SingleSelect => match value {
            Value::String(s) => check_allowed(field, s),
            _ => wrong_type(),
        },
        ValueType::MultiSelect => match value {
            Value::Array(items) => items.iter().find_map(|item| match item {
                Value::String(s) => check_allowed(field, s),
                _ => wrong_type(),
            }),
            _ => wrong_type(),
        },
        ValueType::ScaleLevel => match value {
            Value::String(s) => s.parse::<ScaleLevel>().err().map(|_| FieldError::NotAllowed {
                field: field.key,
                value: s.clone(),
            }),
            _ => wrong_type(),
        },
        ValueType::TaggedList => match value {
            Value::Array(items) => items.iter().enumerate().find_map(|(index, item)| {
                let tagged = item
                    .get("type")
                    .and_then(Value::as_str)
                    .is_some_and(|t| !t.trim().is_empty());
                (!tagged).then_some(FieldError::MissingTag {
                    field: field.key,
                    index,
                })
            }),
            _ => wrong_type(),
        },
    }
}

/// Row indices grouped by every `id` used more than once
pub fn duplicate_ids(rows: &[Row]) -> BTreeMap<String, Vec<usize>> {
    let mut seen: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for (idx, row) in rows.iter().enumerate() {
        if let Some(id) = row_id(row) {
            seen.entry(id).or_default().push(idx);
        }
    }
    seen.retain(|_, rows| rows.len() > 1);
    seen
}

/// Validate every field of every row, then flag duplicate ids.
///
/// Errors come out in row order.
pub fn validate_rows(rows: &[Row], fields: &[FieldDef]) -> Vec<RowError> {
    let mut errors: Vec<RowError> = rows
        .iter()
        .enumerate()
        .flat_map(|(row, data)| {
            fields.iter().filter_map(move |field| {
                validate_field(get_path(data, field.key), field)
                    .map(|error| RowError::Field { row, error })
            })
        })
        .collect();

    for (id, indices) in duplicate_ids(rows) {
        for row in indices {
            errors.push(RowError::DuplicateId { row, id: id.clone() });
        }
    }

    errors.sort_by_key(RowError::row);
    errors
}

pub fn validate_section(schema: &SectionSchema, rows: &[Row]) -> Vec<RowError> {
    validate_rows(rows, schema.fields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(v: Value) -> Row {
        v.as_object().unwrap().clone()
    }

    const HULL_POINTS: FieldDef = FieldDef::number("hullPoints", "Hull points")
        .required()
        .range(1.0, 400.0);

    #[test]
    fn test_number_accepts_numeric_strings() {
        assert_eq!(validate_field(Some(&json!(20)), &HULL_POINTS), None);
        assert_eq!(validate_field(Some(&json!(" 12.5 ")), &HULL_POINTS), None);
        assert!(matches!(
            validate_field(Some(&json!("lots")), &HULL_POINTS),
            Some(FieldError::WrongType { .. })
        ));
    }

    #[test]
    fn test_bounds() {
        assert_eq!(
            validate_field(Some(&json!(0)), &HULL_POINTS),
            Some(FieldError::BelowMin { field: "hullPoints", min: 1.0 })
        );
        assert_eq!(
            validate_field(Some(&json!("401")), &HULL_POINTS),
            Some(FieldError::AboveMax { field: "hullPoints", max: 400.0 })
        );
    }

    #[test]
    fn test_required_means_non_empty() {
        assert!(matches!(validate_field(None, &HULL_POINTS), Some(FieldError::Required { .. })));
        let name = FieldDef::text("name", "Name").required();
        assert!(validate_field(Some(&json!("  ")), &name).is_some());
        assert!(validate_field(None, &FieldDef::text("notes", "Notes")).is_none());
    }

    #[test]
    fn test_selects() {
        let single = FieldDef::single_select("category", "Category", &["beam", "missile"]);
        assert_eq!(validate_field(Some(&json!("beam")), &single), None);
        assert!(matches!(
            validate_field(Some(&json!("rock")), &single),
            Some(FieldError::NotAllowed { .. })
        ));

        let multi = FieldDef::multi_select("mountTypes", "Mounts", &["standard", "turret"]);
        assert_eq!(validate_field(Some(&json!(["turret"])), &multi), None);
        assert!(validate_field(Some(&json!(["turret", "spinal"])), &multi).is_some());
        assert!(validate_field(Some(&json!("turret")), &multi).is_some());
    }

    #[test]
    fn test_scale_level_and_tagged_list() {
        let scale = FieldDef::scale_level("firepower", "Firepower");
        assert_eq!(validate_field(Some(&json!("super_heavy")), &scale), None);
        assert!(validate_field(Some(&json!("huge")), &scale).is_some());

        let tagged = FieldDef::tagged_list("traits", "Traits");
        assert_eq!(validate_field(Some(&json!([{"type": "ap", "value": 2}])), &tagged), None);
        assert_eq!(
            validate_field(Some(&json!([{"type": "ap"}, {"value": 1}])), &tagged),
            Some(FieldError::MissingTag { field: "traits", index: 1 })
        );
    }

    #[test]
    fn test_raw_accepts_anything() {
        let raw = FieldDef::raw("accelerationTable", "Acceleration");
        assert_eq!(validate_field(Some(&json!({"5": 1})), &raw), None);
        assert_eq!(validate_field(Some(&json!(false)), &raw), None);
    }

    #[test]
    fn test_duplicate_ids_flag_every_row() {
        let rows = vec![
            row(json!({"id": "a"})),
            row(json!({"id": "b"})),
            row(json!({"id": "a"})),
        ];
        let fields = [FieldDef::text("id", "ID").required()];
        let errors = validate_rows(&rows, &fields);
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().all(RowError::is_duplicate));
        assert_eq!(errors.iter().map(RowError::row).collect::<Vec<_>>(), vec![0, 2]);

        // Renaming one clears both
        let mut fixed = rows.clone();
        fixed[2].insert("id".into(), json!("c"));
        assert!(validate_rows(&fixed, &fields).is_empty());
    }

    #[test]
    fn test_nested_field_paths() {
        let hulls = shipyard_schema::section("hulls").unwrap();
        let mut r = crate::row::template_row(hulls);
        assert!(validate_section(hulls, std::slice::from_ref(&r)).is_empty());

        r = crate::row::remove_path(&r, "damageTrack.stun");
        let errors = validate_section(hulls, &[r]);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field(), "damageTrack.stun");
        assert_eq!(errors[0].to_string(), "row 1: damageTrack.stun is required");
    }
}
