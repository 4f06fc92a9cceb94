//! Cell text to typed JSON
//!
//! `Ok(None)` means "unset": the leaf is removed from the row.

use serde_json::{Number, Value};

use shipyard_schema::{FieldDef, ValueType};

use super::GridError;

/// Parse raw cell text for `field`.
///
/// Blank input unsets the field. A number that fails to parse also unsets it.
pub fn coerce_input(text: &str, field: &FieldDef) -> Result<Option<Value>, GridError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let value = match field.value_type {
        ValueType::Text | ValueType::SingleSelect | ValueType::ScaleLevel => {
            Value::String(trimmed.to_string())
        }
        ValueType::Number => match parse_number(trimmed) {
            Some(n) => n,
            None => return Ok(None),
        },
        ValueType::Boolean => match trimmed.to_ascii_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Value::Bool(true),
            "false" | "no" | "off" | "0" => Value::Bool(false),
            _ => {
                return Err(GridError::InvalidBoolean {
                    field: field.key,
                    input: trimmed.to_string(),
                })
            }
        },
        ValueType::MultiSelect => Value::Array(
            trimmed
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| Value::String(s.to_string()))
                .collect(),
        ),
        ValueType::TaggedList | ValueType::Raw => {
            serde_json::from_str(trimmed).map_err(|e| GridError::InvalidJson {
                field: field.key,
                message: e.to_string(),
            })?
        }
    };
    Ok(Some(value))
}

/// Integers stay integers; anything else becomes a float
fn parse_number(text: &str) -> Option<Value> {
    if let Ok(i) = text.parse::<i64>() {
        return Some(Value::Number(i.into()));
    }
    let f = text.parse::<f64>().ok()?;
    Number::from_f64(f).map(Value::Number)
}

/// Render a stored value as editable cell text
pub fn display_value(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Array(items)) if items.iter().all(Value::is_string) => items
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join(", "),
        Some(other) => other.to_string(),
    }
}
