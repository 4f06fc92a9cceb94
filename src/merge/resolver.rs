//! Layer resolver
//!
//! Computes the effective rows of a section:
//! 1. Start from the base rows
//! 2. Apply every enabled mod in ascending priority (ties by folder id)
//!    - no data for the section: skip
//!    - `replace`: the accumulator becomes exactly the mod's rows
//!    - `add`: keyed merge by `id`; a matching id overwrites in place,
//!      a new id (or a row without one) appends
//! 3. Tag each row with its provenance
//!
//! Object-shaped sections have a single row; under `add` it is deep-merged.
//! Resolution is a pure function of its inputs.

use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

use shipyard_schema::{MergeMode, SectionSchema, Shape};

use super::layer::{ordered_layers, ModLayer};
use crate::base::BaseDataset;
use crate::config::deep_merge;
use crate::row::{row_id, rows_to_value, Row};

/// Where a resolved row came from
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Provenance {
    /// Identical to the base row with the same id
    Base,
    /// Added or altered by a mod; names the last mod that wrote it
    Mod { folder_id: String },
}

impl Provenance {
    pub fn is_mod(&self) -> bool {
        matches!(self, Provenance::Mod { .. })
    }
}

/// A row of the effective data plus its provenance
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedRow {
    pub row: Row,
    pub provenance: Provenance,
}

impl ResolvedRow {
    pub fn id(&self) -> Option<String> {
        row_id(&self.row)
    }
}

/// Resolver output for one section
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EffectiveSection {
    pub section_id: &'static str,
    pub shape: Shape,
    pub rows: Vec<ResolvedRow>,
}

impl EffectiveSection {
    /// Plain rows without provenance
    pub fn plain_rows(&self) -> Vec<Row> {
        self.rows.iter().map(|r| r.row.clone()).collect()
    }

    /// Rows in the section's on-disk JSON shape
    pub fn to_value(&self) -> Value {
        rows_to_value(self.shape, &self.plain_rows())
    }

    pub fn get(&self, id: &str) -> Option<&ResolvedRow> {
        self.rows.iter().find(|r| r.id().as_deref() == Some(id))
    }

    /// Rows some mod added or altered
    pub fn mod_rows(&self) -> impl Iterator<Item = &ResolvedRow> {
        self.rows.iter().filter(|r| r.provenance.is_mod())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

struct Accumulator {
    shape: Shape,
    rows: Vec<(Row, Option<String>)>,
    index: HashMap<String, usize>,
}

impl Accumulator {
    fn new(shape: Shape, rows: Vec<Row>, writer: Option<&str>) -> Self {
        let mut acc = Self {
            shape,
            rows: Vec::with_capacity(rows.len()),
            index: HashMap::new(),
        };
        for row in rows {
            acc.push(row, writer.map(str::to_string));
        }
        acc
    }

    fn push(&mut self, row: Row, writer: Option<String>) {
        if let Some(id) = row_id(&row) {
            self.index.entry(id).or_insert(self.rows.len());
        }
        self.rows.push((row, writer));
    }

    fn add(&mut self, incoming: Vec<Row>, writer: &str) {
        if self.shape == Shape::Object {
            let current = self.rows.first().map(|(r, _)| r.clone()).unwrap_or_default();
            let merged = incoming
                .into_iter()
                .fold(Value::Object(current), |acc, row| {
                    deep_merge(acc, Value::Object(row))
                });
            let row = match merged {
                Value::Object(map) => map,
                _ => Row::new(),
            };
            self.rows = vec![(row, Some(writer.to_string()))];
            return;
        }

        for row in incoming {
            let existing = row_id(&row).and_then(|id| self.index.get(&id).copied());
            match existing {
                Some(pos) => self.rows[pos] = (row, Some(writer.to_string())),
                None => self.push(row, Some(writer.to_string())),
            }
        }
    }
}

/// Resolve one section over the base dataset and a set of mod layers.
///
/// `layers` may be in any order and may include disabled mods; only enabled
/// layers are applied, in ascending priority.
pub fn resolve_section(
    schema: &'static SectionSchema,
    base: &BaseDataset,
    layers: &[ModLayer],
) -> EffectiveSection {
    let base_rows = base.rows(schema);
    let mut acc = Accumulator::new(schema.shape, base_rows.clone(), None);

    for layer in ordered_layers(layers) {
        let Some(rows) = layer.section_rows(schema) else {
            continue;
        };
        let mode = layer.merge_mode(schema);
        tracing::debug!(
            section = schema.id,
            folder = %layer.folder_id,
            priority = layer.priority,
            mode = %mode,
            rows = rows.len(),
            "applying mod layer"
        );
        match mode {
            MergeMode::Replace => {
                acc = Accumulator::new(schema.shape, rows, Some(&layer.folder_id));
            }
            MergeMode::Add => acc.add(rows, &layer.folder_id),
        }
    }

    let base_index: HashMap<String, &Row> = base_rows
        .iter()
        .filter_map(|r| row_id(r).map(|id| (id, r)))
        .collect();

    let rows = acc
        .rows
        .into_iter()
        .map(|(row, writer)| {
            let provenance = match writer {
                None => Provenance::Base,
                Some(folder_id) => {
                    let base_row = match schema.shape {
                        Shape::Object => base_rows.first(),
                        _ => row_id(&row).and_then(|id| base_index.get(&id).copied()),
                    };
                    if base_row == Some(&row) {
                        Provenance::Base
                    } else {
                        Provenance::Mod { folder_id }
                    }
                }
            };
            ResolvedRow { row, provenance }
        })
        .collect();

    EffectiveSection {
        section_id: schema.id,
        shape: schema.shape,
        rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::ModManifest;
    use serde_json::{json, Map};

    fn obj(v: Value) -> Map<String, Value> {
        v.as_object().unwrap().clone()
    }

    fn weapons() -> &'static SectionSchema {
        shipyard_schema::section("weapons").unwrap()
    }

    fn base_with(file_id: &str, file: Value) -> BaseDataset {
        let mut base = BaseDataset::new();
        base.insert_file(file_id, obj(file));
        base
    }

    fn layer(folder: &str, priority: i64, mode: MergeMode, file_id: &str, file: Value) -> ModLayer {
        let schema = shipyard_schema::sections()
            .iter()
            .find(|s| s.file_id == file_id)
            .unwrap();
        ModLayer::new(
            folder,
            priority,
            ModManifest::new(folder).with_mode(schema.root_key, mode),
        )
        .with_file(file_id, obj(file))
    }

    fn cost_of(section: &EffectiveSection, id: &str) -> Value {
        section.get(id).unwrap().row["cost"].clone()
    }

    #[test]
    fn test_no_mods_returns_base() {
        let base = base_with("weapons", json!({"weapons": [{"id": "laser", "cost": 5}]}));
        let resolved = resolve_section(weapons(), &base, &[]);
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved.rows[0].provenance, Provenance::Base);
    }

    #[test]
    fn test_add_overwrites_in_place_and_appends() {
        let base = base_with(
            "weapons",
            json!({"weapons": [{"id": "laser", "cost": 5}, {"id": "railgun", "cost": 8}]}),
        );
        let m = layer(
            "balance",
            1,
            MergeMode::Add,
            "weapons",
            json!({"weapons": [{"id": "laser", "cost": 7}, {"id": "plasma", "cost": 12}]}),
        );
        let resolved = resolve_section(weapons(), &base, &[m]);

        let ids: Vec<_> = resolved.rows.iter().map(|r| r.id().unwrap()).collect();
        assert_eq!(ids, vec!["laser", "railgun", "plasma"]);
        assert_eq!(cost_of(&resolved, "laser"), 7);
        assert_eq!(resolved.get("railgun").unwrap().provenance, Provenance::Base);
        assert_eq!(
            resolved.get("plasma").unwrap().provenance,
            Provenance::Mod { folder_id: "balance".into() }
        );
    }

    #[test]
    fn test_numeric_id_matches_text_id() {
        let base = base_with("weapons", json!({"weapons": [{"id": "1", "cost": 5}]}));
        let m = layer("m", 1, MergeMode::Add, "weapons", json!({"weapons": [{"id": 1, "cost": 6}]}));
        let resolved = resolve_section(weapons(), &base, &[m]);
        assert_eq!(resolved.len(), 1);
        assert_eq!(cost_of(&resolved, "1"), 6);
    }

    #[test]
    fn test_priority_monotonicity() {
        let a = |p| layer("a", p, MergeMode::Add, "weapons", json!({"weapons": [{"id": "x", "cost": 10}]}));
        let b = |p| layer("b", p, MergeMode::Add, "weapons", json!({"weapons": [{"id": "x", "cost": 20}]}));
        let base = BaseDataset::new();

        let resolved = resolve_section(weapons(), &base, &[a(1), b(2)]);
        assert_eq!(cost_of(&resolved, "x"), 20);

        let swapped = resolve_section(weapons(), &base, &[a(2), b(1)]);
        assert_eq!(cost_of(&swapped, "x"), 10);
    }

    #[test]
    fn test_replace_discards_accumulated_rows() {
        let base = BaseDataset::new();
        let a = layer(
            "a",
            1,
            MergeMode::Add,
            "weapons",
            json!({"weapons": [{"id": "p"}, {"id": "q"}]}),
        );
        let b = layer("b", 2, MergeMode::Replace, "weapons", json!({"weapons": [{"id": "r"}]}));
        let resolved = resolve_section(weapons(), &base, &[a, b]);

        let ids: Vec<_> = resolved.rows.iter().map(|r| r.id().unwrap()).collect();
        assert_eq!(ids, vec!["r"]);
    }

    #[test]
    fn test_add_after_replace_builds_on_replacement() {
        let base = base_with("weapons", json!({"weapons": [{"id": "old"}]}));
        let a = layer("a", 1, MergeMode::Replace, "weapons", json!({"weapons": [{"id": "r"}]}));
        let b = layer("b", 2, MergeMode::Add, "weapons", json!({"weapons": [{"id": "s"}]}));
        let resolved = resolve_section(weapons(), &base, &[a, b]);

        let ids: Vec<_> = resolved.rows.iter().map(|r| r.id().unwrap()).collect();
        assert_eq!(ids, vec!["r", "s"]);
    }

    #[test]
    fn test_mod_without_section_is_skipped() {
        let base = base_with("weapons", json!({"weapons": [{"id": "laser"}]}));
        // Replace declared, but the file carries a different section only.
        let m = ModLayer::new(
            "stub",
            1,
            ModManifest::new("stub").with_mode("weapons", MergeMode::Replace),
        )
        .with_file("weapons", obj(json!({"mountModifiers": {}})));
        let no_file = ModLayer::new(
            "empty",
            2,
            ModManifest::new("empty").with_mode("weapons", MergeMode::Replace),
        );
        let resolved = resolve_section(weapons(), &base, &[m, no_file]);
        assert_eq!(resolved.len(), 1);
    }

    #[test]
    fn test_disabled_mod_ignored() {
        let base = BaseDataset::new();
        let m = layer("a", 1, MergeMode::Add, "weapons", json!({"weapons": [{"id": "x"}]}))
            .with_enabled(false);
        assert!(resolve_section(weapons(), &base, &[m]).is_empty());
    }

    #[test]
    fn test_unchanged_overwrite_keeps_base_provenance() {
        let base = base_with("weapons", json!({"weapons": [{"id": "laser", "cost": 5}]}));
        let m = layer("echo", 1, MergeMode::Add, "weapons", json!({"weapons": [{"id": "laser", "cost": 5}]}));
        let resolved = resolve_section(weapons(), &base, &[m]);
        assert_eq!(resolved.rows[0].provenance, Provenance::Base);
        assert_eq!(resolved.mod_rows().count(), 0);
    }

    #[test]
    fn test_record_merges_by_key() {
        let mounts = shipyard_schema::section("mountModifiers").unwrap();
        let base = base_with(
            "weapons",
            json!({"mountModifiers": {"fixed": {"costMultiplier": 0.75}, "turret": {"costMultiplier": 1.5}}}),
        );
        let add = layer(
            "a",
            1,
            MergeMode::Add,
            "weapons",
            json!({"mountModifiers": {"turret": {"costMultiplier": 2.0}, "bank": {"costMultiplier": 3.0}}}),
        );
        let resolved = resolve_section(mounts, &base, &[add.clone()]);
        let value = resolved.to_value();
        assert_eq!(value["fixed"]["costMultiplier"], 0.75);
        assert_eq!(value["turret"]["costMultiplier"], 2.0);
        assert_eq!(value["bank"]["costMultiplier"], 3.0);
        assert!(value["turret"].get("id").is_none());

        let replace = ModLayer::new(
            "b",
            2,
            ModManifest::new("b").with_mode("mountModifiers", MergeMode::Replace),
        )
        .with_file("weapons", obj(json!({"mountModifiers": {"sponson": {"costMultiplier": 1.1}}})));
        let resolved = resolve_section(mounts, &base, &[add, replace]);
        assert_eq!(resolved.to_value(), json!({"sponson": {"costMultiplier": 1.1}}));
    }

    #[test]
    fn test_object_section_deep_merges_under_add() {
        let rules = shipyard_schema::section("designRules").unwrap();
        let base = base_with(
            "settings",
            json!({"designRules": {"currencySymbol": "Cr", "powerMargin": {"minimumPercent": 0, "warnPercent": 10}}}),
        );
        let m = layer(
            "tweak",
            1,
            MergeMode::Add,
            "settings",
            json!({"designRules": {"powerMargin": {"warnPercent": 20}}}),
        );
        let resolved = resolve_section(rules, &base, &[m]);
        let value = resolved.to_value();
        assert_eq!(value["currencySymbol"], "Cr");
        assert_eq!(value["powerMargin"]["minimumPercent"], 0);
        assert_eq!(value["powerMargin"]["warnPercent"], 20);
        assert!(resolved.rows[0].provenance.is_mod());
    }

    #[test]
    fn test_deterministic_regardless_of_input_order() {
        let base = base_with("weapons", json!({"weapons": [{"id": "a", "cost": 5}]}));
        let l1 = layer("one", 1, MergeMode::Add, "weapons", json!({"weapons": [{"id": "a", "cost": 7}, {"id": "b", "cost": 1}]}));
        let l2 = layer("two", 2, MergeMode::Add, "weapons", json!({"weapons": [{"id": "b", "cost": 3}]}));

        let first = resolve_section(weapons(), &base, &[l1.clone(), l2.clone()]);
        let second = resolve_section(weapons(), &base, &[l2, l1]);
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_vec(&first.to_value()).unwrap(),
            serde_json::to_vec(&second.to_value()).unwrap()
        );
    }
}
