//! Field definitions for section rows.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Declared value type of a row field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ValueType {
    /// Free text
    Text,
    /// Integer or decimal number
    Number,
    /// true / false
    Boolean,
    /// One string out of `allowed_values`
    SingleSelect,
    /// Array of strings, each out of `allowed_values`
    MultiSelect,
    /// One of the [`ScaleLevel`] names
    ScaleLevel,
    /// Array of objects each tagged by a string `type`
    TaggedList,
    /// Any JSON value, edited as JSON text
    Raw,
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Text => "text",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::SingleSelect => "singleSelect",
            Self::MultiSelect => "multiSelect",
            Self::ScaleLevel => "scaleLevel",
            Self::TaggedList => "taggedList",
            Self::Raw => "raw",
        };
        f.write_str(name)
    }
}

/// Size/toughness scale used by hulls and weapon firepower.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScaleLevel {
    Small,
    Light,
    Medium,
    Heavy,
    SuperHeavy,
}

impl ScaleLevel {
    pub const ALL: [ScaleLevel; 5] = [
        ScaleLevel::Small,
        ScaleLevel::Light,
        ScaleLevel::Medium,
        ScaleLevel::Heavy,
        ScaleLevel::SuperHeavy,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Small => "small",
            Self::Light => "light",
            Self::Medium => "medium",
            Self::Heavy => "heavy",
            Self::SuperHeavy => "super_heavy",
        }
    }
}

impl FromStr for ScaleLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|level| level.as_str() == s)
            .ok_or_else(|| format!("unknown scale level '{}'", s))
    }
}

/// Inclusive numeric limits for a `number` field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NumericBounds {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

/// One column of a section.
///
/// `key` may be a dotted path (`damageTrack.stun`); the value then lives in
/// a nested object inside the row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDef {
    pub key: &'static str,
    pub label: &'static str,
    pub value_type: ValueType,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bounds: Option<NumericBounds>,
    #[serde(skip_serializing_if = "no_values")]
    pub allowed_values: &'static [&'static str],
}

fn no_values(values: &&'static [&'static str]) -> bool {
    values.is_empty()
}

impl FieldDef {
    const fn new(key: &'static str, label: &'static str, value_type: ValueType) -> Self {
        Self {
            key,
            label,
            value_type,
            required: false,
            bounds: None,
            allowed_values: &[],
        }
    }

    pub const fn text(key: &'static str, label: &'static str) -> Self {
        Self::new(key, label, ValueType::Text)
    }

    pub const fn number(key: &'static str, label: &'static str) -> Self {
        Self::new(key, label, ValueType::Number)
    }

    pub const fn boolean(key: &'static str, label: &'static str) -> Self {
        Self::new(key, label, ValueType::Boolean)
    }

    pub const fn single_select(
        key: &'static str,
        label: &'static str,
        allowed: &'static [&'static str],
    ) -> Self {
        Self {
            allowed_values: allowed,
            ..Self::new(key, label, ValueType::SingleSelect)
        }
    }

    pub const fn multi_select(
        key: &'static str,
        label: &'static str,
        allowed: &'static [&'static str],
    ) -> Self {
        Self {
            allowed_values: allowed,
            ..Self::new(key, label, ValueType::MultiSelect)
        }
    }

    pub const fn scale_level(key: &'static str, label: &'static str) -> Self {
        Self::new(key, label, ValueType::ScaleLevel)
    }

    pub const fn tagged_list(key: &'static str, label: &'static str) -> Self {
        Self::new(key, label, ValueType::TaggedList)
    }

    pub const fn raw(key: &'static str, label: &'static str) -> Self {
        Self::new(key, label, ValueType::Raw)
    }

    pub const fn required(self) -> Self {
        Self {
            required: true,
            ..self
        }
    }

    pub const fn min(self, min: f64) -> Self {
        let max = match self.bounds {
            Some(b) => b.max,
            None => None,
        };
        Self {
            bounds: Some(NumericBounds {
                min: Some(min),
                max,
            }),
            ..self
        }
    }

    pub const fn max(self, max: f64) -> Self {
        let min = match self.bounds {
            Some(b) => b.min,
            None => None,
        };
        Self {
            bounds: Some(NumericBounds {
                min,
                max: Some(max),
            }),
            ..self
        }
    }

    pub const fn range(self, min: f64, max: f64) -> Self {
        self.min(min).max(max)
    }

    /// Path segments of the key (`damageTrack.stun` -> `["damageTrack", "stun"]`)
    pub fn path(&self) -> impl Iterator<Item = &'static str> {
        self.key.split('.')
    }

    /// Whether the field lives inside a nested object
    pub fn is_nested(&self) -> bool {
        self.key.contains('.')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builders_compose() {
        const F: FieldDef = FieldDef::number("hullPoints", "Hull points").required().range(1.0, 400.0);
        assert!(F.required);
        assert_eq!(F.value_type, ValueType::Number);
        let bounds = F.bounds.unwrap();
        assert_eq!(bounds.min, Some(1.0));
        assert_eq!(bounds.max, Some(400.0));
    }

    #[test]
    fn test_min_then_max_keeps_both() {
        let f = FieldDef::number("x", "X").min(0.0).max(5.0);
        assert_eq!(f.bounds.unwrap().min, Some(0.0));
        assert_eq!(f.bounds.unwrap().max, Some(5.0));
    }

    #[test]
    fn test_nested_path() {
        let f = FieldDef::number("damageTrack.stun", "Stun");
        assert!(f.is_nested());
        assert_eq!(f.path().collect::<Vec<_>>(), vec!["damageTrack", "stun"]);
    }

    #[test]
    fn test_scale_level_parse() {
        assert_eq!("super_heavy".parse::<ScaleLevel>(), Ok(ScaleLevel::SuperHeavy));
        assert!("huge".parse::<ScaleLevel>().is_err());
        assert!(ScaleLevel::Small < ScaleLevel::Heavy);
    }

    #[test]
    fn test_value_type_display() {
        assert_eq!(ValueType::SingleSelect.to_string(), "singleSelect");
        assert_eq!(ValueType::TaggedList.to_string(), "taggedList");
    }
}
