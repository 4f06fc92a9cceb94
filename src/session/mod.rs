//! Editing sessions
//!
//! A [`ModEditor`] edits one mod. Its [`MergeContext`] holds the *other*
//! active mods so the author can preview and import what they contribute.
//! The context lives exactly as long as the editor.

pub mod editor;

pub use editor::{BlockedSection, EditorError, ImportFrom, ModEditor, SaveReport};

use shipyard_schema::SectionSchema;

use crate::base::BaseDataset;
use crate::merge::{EffectiveSection, ModLayer, ResolveCache};
use crate::store::{ModStore, StoreError};

/// Resolved view of a chosen set of mods, excluding the one being edited
#[derive(Debug)]
pub struct MergeContext {
    editing: String,
    layers: Vec<ModLayer>,
    cache: ResolveCache,
}

impl MergeContext {
    /// Every enabled mod except `editing`
    pub fn active(store: &ModStore, editing: &str) -> Result<Self, StoreError> {
        let layers = store
            .load_layers()?
            .into_iter()
            .filter(|l| l.enabled && l.folder_id != editing)
            .collect();
        Ok(Self::from_layers(editing, layers))
    }

    /// Exactly the named mods (enabled or not), still excluding `editing`
    pub fn with_mods(store: &ModStore, editing: &str, folder_ids: &[&str]) -> Result<Self, StoreError> {
        let mut layers = Vec::with_capacity(folder_ids.len());
        for folder_id in folder_ids.iter().filter(|f| **f != editing) {
            let entry = store.get(folder_id)?;
            layers.push(store.load_layer(&entry).with_enabled(true));
        }
        Ok(Self::from_layers(editing, layers))
    }

    pub fn from_layers(editing: &str, layers: Vec<ModLayer>) -> Self {
        tracing::debug!(editing = %editing, mods = layers.len(), "built merge context");
        Self {
            editing: editing.to_string(),
            layers,
            cache: ResolveCache::new(),
        }
    }

    pub fn editing(&self) -> &str {
        &self.editing
    }

    pub fn layers(&self) -> &[ModLayer] {
        &self.layers
    }

    /// Folder ids in the context, in application order
    pub fn folder_ids(&self) -> Vec<&str> {
        crate::merge::ordered_layers(&self.layers)
            .into_iter()
            .map(|l| l.folder_id.as_str())
            .collect()
    }

    pub fn effective(&mut self, schema: &'static SectionSchema, base: &BaseDataset) -> EffectiveSection {
        self.cache.resolve(schema, base, &self.layers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::ModManifest;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_active_context_excludes_editing_and_disabled() {
        let dir = TempDir::new().unwrap();
        let mut store = ModStore::open(dir.path()).unwrap();
        for name in ["mine", "other", "off"] {
            store.create_mod(&ModManifest::new(name)).unwrap();
        }
        store.set_enabled("off", false).unwrap();

        let ctx = MergeContext::active(&store, "mine").unwrap();
        assert_eq!(ctx.folder_ids(), vec!["other"]);

        let ctx = MergeContext::with_mods(&store, "mine", &["off", "mine"]).unwrap();
        assert_eq!(ctx.folder_ids(), vec!["off"]);
    }

    #[test]
    fn test_effective_reflects_context_mods() {
        let dir = TempDir::new().unwrap();
        let mut store = ModStore::open(dir.path()).unwrap();
        store.create_mod(&ModManifest::new("other")).unwrap();
        store
            .write_section(
                "other",
                "weapons",
                json!({"weapons": [{"id": "plasma"}]}).as_object().unwrap(),
            )
            .unwrap();

        let mut ctx = MergeContext::active(&store, "mine").unwrap();
        let weapons = shipyard_schema::section("weapons").unwrap();
        let effective = ctx.effective(weapons, &BaseDataset::new());
        assert_eq!(effective.mod_rows().count(), 1);
    }
}
