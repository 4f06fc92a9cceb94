//! Diff of a mod's own rows against the base dataset

use serde::Serialize;
use std::collections::{BTreeSet, HashMap};

use shipyard_schema::{SectionSchema, Shape};

use crate::row::{get_path, row_id, Row};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum DiffStatus {
    /// No base row shares the id
    Added,
    /// Base row exists; lists the field paths that differ
    Modified { fields: Vec<String> },
    Unchanged,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowDiff {
    pub index: usize,
    pub id: Option<String>,
    #[serde(flatten)]
    pub status: DiffStatus,
}

/// Counts per status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DiffSummary {
    pub added: usize,
    pub modified: usize,
    pub unchanged: usize,
}

impl DiffSummary {
    pub fn of(diffs: &[RowDiff]) -> Self {
        diffs.iter().fold(Self::default(), |mut acc, d| {
            match d.status {
                DiffStatus::Added => acc.added += 1,
                DiffStatus::Modified { .. } => acc.modified += 1,
                DiffStatus::Unchanged => acc.unchanged += 1,
            }
            acc
        })
    }
}

/// Field paths whose values differ between two rows.
///
/// Schema fields are compared by path in declaration order; any other
/// top-level key follows, sorted.
pub fn changed_fields(schema: &SectionSchema, row: &Row, base: &Row) -> Vec<String> {
    let mut changed: Vec<String> = schema
        .fields
        .iter()
        .filter(|f| get_path(row, f.key) != get_path(base, f.key))
        .map(|f| f.key.to_string())
        .collect();

    let covered: BTreeSet<&str> = schema
        .fields
        .iter()
        .filter_map(|f| f.path().next())
        .collect();
    let extra: BTreeSet<&String> = row
        .keys()
        .chain(base.keys())
        .filter(|k| !covered.contains(k.as_str()))
        .collect();
    changed.extend(
        extra
            .into_iter()
            .filter(|k| row.get(k.as_str()) != base.get(k.as_str()))
            .cloned(),
    );
    changed
}

/// One entry per mod row, in row order
pub fn diff_against_base(schema: &SectionSchema, rows: &[Row], base_rows: &[Row]) -> Vec<RowDiff> {
    let base_index: HashMap<String, &Row> = base_rows
        .iter()
        .filter_map(|r| row_id(r).map(|id| (id, r)))
        .collect();

    rows.iter()
        .enumerate()
        .map(|(index, row)| {
            let id = row_id(row);
            let base = match schema.shape {
                Shape::Object => base_rows.first(),
                _ => id.as_ref().and_then(|id| base_index.get(id).copied()),
            };
            let status = match base {
                None => DiffStatus::Added,
                Some(base) => {
                    let fields = changed_fields(schema, row, base);
                    if fields.is_empty() {
                        DiffStatus::Unchanged
                    } else {
                        DiffStatus::Modified { fields }
                    }
                }
            };
            RowDiff { index, id, status }
        })
        .collect()
}
