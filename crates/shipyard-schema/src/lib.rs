//! Shipyard section schemas
//!
//! Describes every editable data section: which file it lives in, the key it
//! occupies inside that file, how rows round-trip to JSON, and the fields a
//! row carries. Also lists the house rules stored beside those sections.
//!
//! Everything here is static data; the merge, validation and editing logic
//! lives in the `shipyard` crate.

pub mod field;
pub mod registry;
pub mod section;

pub use field::{FieldDef, NumericBounds, ScaleLevel, ValueType};
pub use registry::{
    data_file_ids, house_rule, house_rules, house_rules_for_file, section, section_by_root_key,
    sections, sections_for_file,
};
pub use section::{HouseRule, MergeMode, SectionSchema, Shape};

/// Name of the manifest file inside every mod folder.
pub const MANIFEST_FILE: &str = "mod.json";

/// Key under which Array and Record rows carry their identifier.
pub const ID_FIELD: &str = "id";

/// File name for a data file id (`hulls` -> `hulls.json`).
pub fn data_file_name(file_id: &str) -> String {
    format!("{}.json", file_id)
}
