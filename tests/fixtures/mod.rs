//! Shared fixtures for integration tests
//!
//! Builds a throwaway install: a base data directory and a mods directory
//! under one temp dir.

#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;

use serde_json::{json, Map, Value};
use tempfile::TempDir;

use shipyard_mods::base::BaseDataset;
use shipyard_mods::store::{ModManifest, ModStore};

pub struct Install {
    dir: TempDir,
}

impl Install {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("base")).unwrap();
        fs::create_dir_all(dir.path().join("mods")).unwrap();
        Self { dir }
    }

    /// Install with the stock weapons and hulls files
    pub fn with_base() -> Self {
        let install = Self::new();
        install.write_base(
            "weapons",
            json!({
                "weapons": [weapon("laser", 5), weapon("railgun", 8)],
                "mountModifiers": {
                    "standard": {"costMultiplier": 1, "hullPointMultiplier": 1},
                    "turret": {"costMultiplier": 1.5, "hullPointMultiplier": 1.25}
                },
                "enforceFiringArcs": false
            }),
        );
        install.write_base("hulls", json!({"hulls": [hull("cutter", 20)]}));
        install
    }

    pub fn base_dir(&self) -> PathBuf {
        self.dir.path().join("base")
    }

    pub fn mods_dir(&self) -> PathBuf {
        self.dir.path().join("mods")
    }

    pub fn write_base(&self, file_id: &str, file: Value) {
        let path = self.base_dir().join(format!("{}.json", file_id));
        fs::write(path, serde_json::to_string_pretty(&file).unwrap()).unwrap();
    }

    pub fn base(&self) -> BaseDataset {
        BaseDataset::load(&self.base_dir()).unwrap()
    }

    pub fn store(&self) -> ModStore {
        ModStore::open(self.mods_dir()).unwrap()
    }
}

pub fn obj(value: Value) -> Map<String, Value> {
    value.as_object().unwrap().clone()
}

/// A weapon row that passes validation
pub fn weapon(id: &str, cost: u64) -> Value {
    json!({
        "id": id,
        "name": id.to_uppercase(),
        "progressLevel": 6,
        "category": "beam",
        "firepower": "light",
        "hullPoints": 1,
        "powerRequired": 1,
        "cost": cost
    })
}

/// A hull row that passes validation
pub fn hull(id: &str, hull_points: u64) -> Value {
    json!({
        "id": id,
        "name": id.to_uppercase(),
        "shipClass": "light",
        "hullPoints": hull_points,
        "toughness": "light",
        "damageTrack": {"stun": 10, "wound": 10, "mortal": 5, "critical": 3}
    })
}

/// Create a mod and write its data files; returns the folder id
pub fn create_mod(store: &mut ModStore, manifest: ModManifest, files: &[(&str, Value)]) -> String {
    let folder = store.create_mod(&manifest).unwrap();
    for (file_id, file) in files {
        store.write_section(&folder, file_id, &obj(file.clone())).unwrap();
    }
    folder
}
