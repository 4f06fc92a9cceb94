//! Import candidates: rows a mod author can pull into the grid
//!
//! Sources are the base rows of the section, or rows that other active mods
//! contribute to the effective data.

use serde::Serialize;
use std::collections::HashSet;

use crate::merge::{EffectiveSection, Provenance};
use crate::row::{row_id, Row};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ImportSource {
    Base,
    Mod { folder_id: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportCandidate {
    pub id: Option<String>,
    pub row: Row,
    pub source: ImportSource,
    /// The grid already has a row with this id; importing overwrites it
    pub overrides_existing: bool,
}

fn existing_ids(current: &[Row]) -> HashSet<String> {
    current.iter().filter_map(row_id).collect()
}

fn candidate(row: &Row, source: ImportSource, existing: &HashSet<String>) -> ImportCandidate {
    let id = row_id(row);
    ImportCandidate {
        overrides_existing: id.as_ref().is_some_and(|id| existing.contains(id)),
        id,
        row: row.clone(),
        source,
    }
}

pub fn base_candidates(base_rows: &[Row], current: &[Row]) -> Vec<ImportCandidate> {
    let existing = existing_ids(current);
    base_rows
        .iter()
        .map(|row| candidate(row, ImportSource::Base, &existing))
        .collect()
}

/// Rows of `effective` that some mod added or altered
pub fn mod_candidates(effective: &EffectiveSection, current: &[Row]) -> Vec<ImportCandidate> {
    let existing = existing_ids(current);
    effective
        .rows
        .iter()
        .filter_map(|resolved| match &resolved.provenance {
            Provenance::Mod { folder_id } => Some(candidate(
                &resolved.row,
                ImportSource::Mod {
                    folder_id: folder_id.clone(),
                },
                &existing,
            )),
            Provenance::Base => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merge::ResolvedRow;
    use serde_json::json;
    use shipyard_schema::Shape;

    fn row(v: serde_json::Value) -> Row {
        v.as_object().unwrap().clone()
    }

    #[test]
    fn test_base_candidates_flag_overrides() {
        let base = vec![row(json!({"id": "laser"})), row(json!({"id": "railgun"}))];
        let current = vec![row(json!({"id": "laser", "cost": 9}))];
        let candidates = base_candidates(&base, &current);
        assert!(candidates[0].overrides_existing);
        assert!(!candidates[1].overrides_existing);
    }

    #[test]
    fn test_mod_candidates_skip_base_rows() {
        let effective = EffectiveSection {
            section_id: "weapons",
            shape: Shape::Array,
            rows: vec![
                ResolvedRow {
                    row: row(json!({"id": "laser"})),
                    provenance: Provenance::Base,
                },
                ResolvedRow {
                    row: row(json!({"id": "plasma"})),
                    provenance: Provenance::Mod {
                        folder_id: "overhaul".into(),
                    },
                },
            ],
        };
        let candidates = mod_candidates(&effective, &[]);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].id.as_deref(), Some("plasma"));
        assert_eq!(
            candidates[0].source,
            ImportSource::Mod { folder_id: "overhaul".into() }
        );
    }
}
