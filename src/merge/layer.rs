//! A loaded mod, ready to be layered

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

use shipyard_schema::{HouseRule, MergeMode, SectionSchema};

use crate::row::{section_rows, Row};
use crate::store::ModManifest;

/// One mod's manifest, load-order record and every data file it ships.
///
/// `revision` is a digest of the manifest and files; it changes whenever
/// any of the mod's data changes and keys the resolve cache.
#[derive(Debug, Clone, PartialEq)]
pub struct ModLayer {
    pub folder_id: String,
    pub priority: i64,
    pub enabled: bool,
    manifest: ModManifest,
    files: BTreeMap<String, Map<String, Value>>,
    revision: String,
}

impl ModLayer {
    pub fn new(folder_id: impl Into<String>, priority: i64, manifest: ModManifest) -> Self {
        let mut layer = Self {
            folder_id: folder_id.into(),
            priority,
            enabled: true,
            manifest,
            files: BTreeMap::new(),
            revision: String::new(),
        };
        layer.revision = layer.compute_revision();
        layer
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_file(mut self, file_id: impl Into<String>, file: Map<String, Value>) -> Self {
        self.files.insert(file_id.into(), file);
        self.revision = self.compute_revision();
        self
    }

    pub fn manifest(&self) -> &ModManifest {
        &self.manifest
    }

    pub fn files(&self) -> &BTreeMap<String, Map<String, Value>> {
        &self.files
    }

    pub fn file(&self, file_id: &str) -> Option<&Map<String, Value>> {
        self.files.get(file_id)
    }

    pub fn revision(&self) -> &str {
        &self.revision
    }

    /// This mod's own rows for a section; `None` means no contribution
    pub fn section_rows(&self, schema: &SectionSchema) -> Option<Vec<Row>> {
        section_rows(schema, self.file(schema.file_id)?)
    }

    pub fn merge_mode(&self, schema: &SectionSchema) -> MergeMode {
        self.manifest.merge_mode(schema)
    }

    /// Explicit house-rule value; anything but a boolean counts as unset
    pub fn house_rule(&self, rule: &HouseRule) -> Option<bool> {
        self.file(rule.file_id)?.get(rule.json_key)?.as_bool()
    }

    fn compute_revision(&self) -> String {
        let content = serde_json::json!({
            "manifest": self.manifest,
            "files": self.files,
        });
        match serde_json_canonicalizer::to_vec(&content) {
            Ok(bytes) => {
                let mut hasher = Sha256::new();
                hasher.update(&bytes);
                hex::encode(hasher.finalize())
            }
            Err(e) => {
                // Unique revision; the layer simply never hits the cache.
                tracing::warn!(folder = %self.folder_id, error = %e, "could not canonicalize mod data");
                ulid::Ulid::new().to_string().to_lowercase()
            }
        }
    }
}

/// Enabled layers in application order: ascending priority, ties by folder id
pub fn ordered_layers(layers: &[ModLayer]) -> Vec<&ModLayer> {
    let mut ordered: Vec<&ModLayer> = layers.iter().filter(|l| l.enabled).collect();
    ordered.sort_by(|a, b| {
        a.priority
            .cmp(&b.priority)
            .then_with(|| a.folder_id.cmp(&b.folder_id))
    });
    ordered
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(v: Value) -> Map<String, Value> {
        v.as_object().unwrap().clone()
    }

    #[test]
    fn test_revision_tracks_content() {
        let a = ModLayer::new("a", 1, ModManifest::new("A"))
            .with_file("weapons", obj(json!({"weapons": [{"id": "x", "cost": 1}]})));
        let same = ModLayer::new("a", 1, ModManifest::new("A"))
            .with_file("weapons", obj(json!({"weapons": [{"cost": 1, "id": "x"}]})));
        let changed = ModLayer::new("a", 1, ModManifest::new("A"))
            .with_file("weapons", obj(json!({"weapons": [{"id": "x", "cost": 2}]})));

        assert_eq!(a.revision(), same.revision());
        assert_ne!(a.revision(), changed.revision());
        assert_eq!(a.revision().len(), 64);
    }

    #[test]
    fn test_revision_tracks_merge_mode() {
        let add = ModLayer::new("a", 1, ModManifest::new("A"));
        let replace = ModLayer::new(
            "a",
            1,
            ModManifest::new("A").with_mode("weapons", MergeMode::Replace),
        );
        assert_ne!(add.revision(), replace.revision());
    }

    #[test]
    fn test_ordered_layers_skips_disabled_and_breaks_ties() {
        let layers = vec![
            ModLayer::new("zeta", 2, ModManifest::new("Z")),
            ModLayer::new("alpha", 2, ModManifest::new("A")),
            ModLayer::new("off", 0, ModManifest::new("O")).with_enabled(false),
            ModLayer::new("first", -1, ModManifest::new("F")),
        ];
        let order: Vec<_> = ordered_layers(&layers)
            .iter()
            .map(|l| l.folder_id.as_str())
            .collect();
        assert_eq!(order, vec!["first", "alpha", "zeta"]);
    }

    #[test]
    fn test_house_rule_requires_boolean() {
        let rule = shipyard_schema::house_rule("trackFtlFuel").unwrap();
        let set = ModLayer::new("a", 1, ModManifest::new("A"))
            .with_file("ftlDrives", obj(json!({"trackFtlFuel": true})));
        let junk = ModLayer::new("b", 1, ModManifest::new("B"))
            .with_file("ftlDrives", obj(json!({"trackFtlFuel": "yes"})));
        assert_eq!(set.house_rule(rule), Some(true));
        assert_eq!(junk.house_rule(rule), None);
    }
}
