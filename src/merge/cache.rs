//! Resolve cache
//!
//! Effective sections are memoized per (section, ordered mod revisions).
//! Any change to a mod's data, merge modes, enablement or load order yields a
//! different key, so stale entries are never served. [`ResolveCache::retain_layers`]
//! drops entries built from any other layer set. A cache is bound to the
//! base dataset of its owner and is never shared across owners.

use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::HashMap;

use shipyard_schema::SectionSchema;

use super::layer::{ordered_layers, ModLayer};
use super::resolver::{resolve_section, EffectiveSection};
use crate::base::BaseDataset;

/// The inputs that decide a section's effective rows
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolveKey {
    pub section_id: String,
    /// `(folder_id, revision)` of every enabled layer in application order
    pub layers: Vec<(String, String)>,
}

impl ResolveKey {
    pub fn new(schema: &SectionSchema, layers: &[ModLayer]) -> Self {
        Self {
            section_id: schema.id.to_string(),
            layers: layer_signature(layers),
        }
    }

    /// SHA-256 hex digest of the JCS form of the key
    pub fn digest(&self) -> Result<String, String> {
        let bytes = serde_json_canonicalizer::to_vec(self).map_err(|e| e.to_string())?;
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        Ok(hex::encode(hasher.finalize()))
    }
}

fn layer_signature(layers: &[ModLayer]) -> Vec<(String, String)> {
    ordered_layers(layers)
        .into_iter()
        .map(|l| (l.folder_id.clone(), l.revision().to_string()))
        .collect()
}

#[derive(Debug)]
struct CacheEntry {
    layers: Vec<(String, String)>,
    section: EffectiveSection,
}

/// Memoized resolver output
#[derive(Debug, Default)]
pub struct ResolveCache {
    entries: HashMap<String, CacheEntry>,
    hits: u64,
    misses: u64,
}

impl ResolveCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve through the cache
    pub fn resolve(
        &mut self,
        schema: &'static SectionSchema,
        base: &BaseDataset,
        layers: &[ModLayer],
    ) -> EffectiveSection {
        let resolve_key = ResolveKey::new(schema, layers);
        let key = match resolve_key.digest() {
            Ok(key) => key,
            Err(e) => {
                tracing::warn!(section = schema.id, error = %e, "resolve key failed; bypassing cache");
                self.misses += 1;
                return resolve_section(schema, base, layers);
            }
        };

        if let Some(hit) = self.entries.get(&key) {
            self.hits += 1;
            tracing::trace!(section = schema.id, "resolve cache hit");
            return hit.section.clone();
        }

        self.misses += 1;
        let resolved = resolve_section(schema, base, layers);
        self.entries.insert(
            key,
            CacheEntry {
                layers: resolve_key.layers,
                section: resolved.clone(),
            },
        );
        resolved
    }

    /// Drop entries that were not resolved from `layers`
    pub fn retain_layers(&mut self, layers: &[ModLayer]) {
        let current = layer_signature(layers);
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.layers == current);
        let evicted = before - self.entries.len();
        if evicted > 0 {
            tracing::debug!(evicted, kept = self.entries.len(), "evicted stale resolve cache entries");
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::ModManifest;
    use serde_json::json;

    fn weapons() -> &'static SectionSchema {
        shipyard_schema::section("weapons").unwrap()
    }

    fn layer(folder: &str, priority: i64, cost: i64) -> ModLayer {
        ModLayer::new(folder, priority, ModManifest::new(folder)).with_file(
            "weapons",
            json!({"weapons": [{"id": "x", "cost": cost}]})
                .as_object()
                .unwrap()
                .clone(),
        )
    }

    #[test]
    fn test_key_ignores_disabled_and_input_order() {
        let a = layer("a", 1, 1);
        let b = layer("b", 2, 2);
        let off = layer("off", 3, 3).with_enabled(false);

        let k1 = ResolveKey::new(weapons(), &[a.clone(), b.clone(), off]);
        let k2 = ResolveKey::new(weapons(), &[b, a]);
        assert_eq!(k1, k2);
        assert_eq!(k1.digest().unwrap(), k2.digest().unwrap());
    }

    #[test]
    fn test_key_tracks_order_and_content() {
        let base = ResolveKey::new(weapons(), &[layer("a", 1, 1), layer("b", 2, 2)]);
        let reordered = ResolveKey::new(weapons(), &[layer("a", 3, 1), layer("b", 2, 2)]);
        let edited = ResolveKey::new(weapons(), &[layer("a", 1, 5), layer("b", 2, 2)]);
        assert_ne!(base.digest().unwrap(), reordered.digest().unwrap());
        assert_ne!(base.digest().unwrap(), edited.digest().unwrap());
    }

    #[test]
    fn test_cache_hits_and_invalidates() {
        let base = BaseDataset::new();
        let mut cache = ResolveCache::new();

        let layers = vec![layer("a", 1, 10)];
        let first = cache.resolve(weapons(), &base, &layers);
        let second = cache.resolve(weapons(), &base, &layers);
        assert_eq!(first, second);
        assert_eq!((cache.hits(), cache.misses()), (1, 1));

        let edited = vec![layer("a", 1, 11)];
        let third = cache.resolve(weapons(), &base, &edited);
        assert_eq!(third.get("x").unwrap().row["cost"], 11);
        assert_eq!(cache.misses(), 2);
        assert_eq!(cache.len(), 2);

        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_retain_layers_evicts_stale_entries() {
        let base = BaseDataset::new();
        let mut cache = ResolveCache::new();
        let sensors = shipyard_schema::section("sensors").unwrap();

        let old = vec![layer("a", 1, 10)];
        cache.resolve(weapons(), &base, &old);
        cache.resolve(sensors, &base, &old);
        let current = vec![layer("a", 1, 11), layer("b", 2, 2)];
        cache.resolve(weapons(), &base, &current);
        assert_eq!(cache.len(), 3);

        cache.retain_layers(&current);
        assert_eq!(cache.len(), 1);
        cache.resolve(weapons(), &base, &current);
        assert_eq!(cache.hits(), 1);
    }
}
