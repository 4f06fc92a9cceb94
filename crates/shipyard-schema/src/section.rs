//! Section and house-rule descriptors.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::field::FieldDef;

/// How a section's rows are stored under its root key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Shape {
    /// JSON array of row objects, each carrying an `id`
    Array,
    /// A single JSON object, edited as one row
    Object,
    /// JSON object keyed by id; the key becomes the row's `id`
    Record,
}

impl Shape {
    /// Whether rows of this shape are identified by `id`
    pub fn is_keyed(&self) -> bool {
        matches!(self, Shape::Array | Shape::Record)
    }
}

/// Per-mod, per-section merge behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeMode {
    /// Keyed merge into whatever lower-priority layers produced
    #[default]
    Add,
    /// Discard lower-priority contributions for the section
    Replace,
}

impl MergeMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            MergeMode::Add => "add",
            MergeMode::Replace => "replace",
        }
    }
}

impl fmt::Display for MergeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MergeMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "add" => Ok(MergeMode::Add),
            "replace" => Ok(MergeMode::Replace),
            other => Err(format!("invalid merge mode '{}' (expected add or replace)", other)),
        }
    }
}

/// One editable data section.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionSchema {
    pub id: &'static str,
    pub label: &'static str,
    /// Data file the section lives in, without the `.json` extension
    pub file_id: &'static str,
    /// Top-level key inside the data file
    pub root_key: &'static str,
    pub shape: Shape,
    pub fields: &'static [FieldDef],
    /// JSON text of the row inserted by "add row"
    pub new_item_template: &'static str,
    pub default_merge_mode: MergeMode,
}

impl SectionSchema {
    /// Look up a field by key
    pub fn field(&self, key: &str) -> Option<&'static FieldDef> {
        self.fields.iter().find(|f| f.key == key)
    }

    /// Field keys in column order
    pub fn column_keys(&self) -> Vec<&'static str> {
        self.fields.iter().map(|f| f.key).collect()
    }
}

/// A boolean toggle stored at the top level of a data file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HouseRule {
    pub id: &'static str,
    pub label: &'static str,
    pub file_id: &'static str,
    pub json_key: &'static str,
    pub default_value: bool,
}
