//! Mod store
//!
//! Owns the mods directory: one folder per mod holding `mod.json` plus any
//! `<file_id>.json` data files, and a `settings.json` recording enablement
//! and priority. Folder name is the mod's identity.
//!
//! ```text
//! mods/
//!   settings.json
//!   Balance_Pass/
//!     mod.json
//!     weapons.json
//! ```

pub mod manifest;
pub mod settings;

pub use manifest::{ManifestError, ModManifest};
pub use settings::{ModSetting, ModSettings, SCHEMA_VERSION, SETTINGS_FILE};

use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use shipyard_schema::{data_file_name, HouseRule, MergeMode, MANIFEST_FILE};

use crate::merge::ModLayer;

/// Errors from mod store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("{path} is not valid JSON: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("{0} must contain a JSON object at the top level")]
    NotAnObject(PathBuf),

    #[error("Invalid manifest: {0}")]
    Manifest(#[from] ManifestError),

    #[error("A mod folder named '{0}' already exists")]
    Conflict(String),

    #[error("Mod not found: {0}")]
    NotFound(String),

    #[error("Invalid folder id: '{0}'")]
    InvalidFolderId(String),

    #[error("Unknown data file: '{0}'")]
    UnknownFile(String),
}

/// Load-order move. `Up` raises priority so the mod wins more conflicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

/// A mod as listed by the store
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModEntry {
    pub folder_id: String,
    pub manifest: ModManifest,
    pub enabled: bool,
    pub priority: i64,
    pub files_present: BTreeSet<String>,
}

impl ModEntry {
    pub fn has_file(&self, file_id: &str) -> bool {
        self.files_present.contains(file_id)
    }
}

/// Folder ids are single path components drawn from `[A-Za-z0-9_-]`
pub fn is_valid_folder_id(folder_id: &str) -> bool {
    !folder_id.is_empty()
        && folder_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

struct ScannedMod {
    folder_id: String,
    manifest: ModManifest,
    files_present: BTreeSet<String>,
}

/// Filesystem-backed mod store
#[derive(Debug)]
pub struct ModStore {
    root: PathBuf,
    settings: ModSettings,
}

impl ModStore {
    /// Open (creating if needed) the mods directory at `root`
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        let settings = ModSettings::load(&root.join(SETTINGS_FILE))?;
        tracing::debug!(root = %root.display(), known = settings.mods.len(), "opened mod store");
        Ok(Self { root, settings })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn settings(&self) -> &ModSettings {
        &self.settings
    }

    /// Folder path for a mod id
    pub fn mod_dir(&self, folder_id: &str) -> Result<PathBuf, StoreError> {
        if !is_valid_folder_id(folder_id) {
            return Err(StoreError::InvalidFolderId(folder_id.to_string()));
        }
        Ok(self.root.join(folder_id))
    }

    /// Every readable mod, ascending priority, ties by folder id.
    ///
    /// Folders unknown to the settings are listed disabled after all known
    /// mods.
    pub fn list_mods(&self) -> Result<Vec<ModEntry>, StoreError> {
        let mut next = self.settings.max_priority().unwrap_or(0);
        let mut entries: Vec<ModEntry> = self
            .scan()?
            .into_iter()
            .map(|found| {
                let (enabled, priority) = match self.settings.get(&found.folder_id) {
                    Some(s) => (s.enabled, s.priority),
                    None => {
                        next += 1;
                        (false, next)
                    }
                };
                ModEntry {
                    folder_id: found.folder_id,
                    manifest: found.manifest,
                    enabled,
                    priority,
                    files_present: found.files_present,
                }
            })
            .collect();
        entries.sort_by(|a, b| {
            a.priority
                .cmp(&b.priority)
                .then_with(|| a.folder_id.cmp(&b.folder_id))
        });
        Ok(entries)
    }

    pub fn get(&self, folder_id: &str) -> Result<ModEntry, StoreError> {
        self.require(folder_id)?;
        self.list_mods()?
            .into_iter()
            .find(|e| e.folder_id == folder_id)
            .ok_or_else(|| StoreError::NotFound(folder_id.to_string()))
    }

    /// Create a mod folder from a manifest; returns the folder id.
    ///
    /// Nothing is written when the folder already exists.
    pub fn create_mod(&mut self, manifest: &ModManifest) -> Result<String, StoreError> {
        manifest.validate()?;
        let folder_id = manifest.folder_id();
        let dir = self.mod_dir(&folder_id)?;
        if dir.exists() {
            return Err(StoreError::Conflict(folder_id));
        }

        fs::create_dir_all(&dir)?;
        manifest.write_to_file(&dir.join(MANIFEST_FILE))?;
        self.register(&folder_id)?;

        tracing::info!(folder = %folder_id, name = %manifest.name, "created mod");
        Ok(folder_id)
    }

    /// Remove a mod folder and its settings entry. Irreversible.
    pub fn delete_mod(&mut self, folder_id: &str) -> Result<(), StoreError> {
        let dir = self.require(folder_id)?;
        fs::remove_dir_all(&dir)?;
        self.settings.remove(folder_id);
        self.persist()?;
        tracing::info!(folder = %folder_id, "deleted mod");
        Ok(())
    }

    pub fn set_enabled(&mut self, folder_id: &str, enabled: bool) -> Result<(), StoreError> {
        self.require(folder_id)?;
        self.sync()?;
        let setting = self
            .settings
            .get_mut(folder_id)
            .ok_or_else(|| StoreError::NotFound(folder_id.to_string()))?;
        setting.enabled = enabled;
        self.persist()?;
        tracing::info!(folder = %folder_id, enabled, "set mod enablement");
        Ok(())
    }

    /// Swap priority with the adjacent mod in load order.
    ///
    /// Returns `false` and leaves the order alone at either boundary.
    pub fn reorder(&mut self, folder_id: &str, direction: Direction) -> Result<bool, StoreError> {
        self.require(folder_id)?;
        self.sync()?;
        self.settings.normalize();

        let idx = self
            .settings
            .mods
            .iter()
            .position(|m| m.folder_id == folder_id)
            .ok_or_else(|| StoreError::NotFound(folder_id.to_string()))?;
        let neighbour = match direction {
            Direction::Up => Some(idx + 1).filter(|&n| n < self.settings.mods.len()),
            Direction::Down => idx.checked_sub(1),
        };

        let moved = match neighbour {
            Some(n) => {
                let mine = self.settings.mods[idx].priority;
                self.settings.mods[idx].priority = self.settings.mods[n].priority;
                self.settings.mods[n].priority = mine;
                self.settings.sort();
                true
            }
            None => false,
        };

        self.persist()?;
        tracing::info!(folder = %folder_id, ?direction, moved, "reordered mod");
        Ok(moved)
    }

    pub fn read_manifest(&self, folder_id: &str) -> Result<ModManifest, StoreError> {
        let dir = self.require(folder_id)?;
        read_manifest_at(&dir.join(MANIFEST_FILE))
    }

    pub fn write_manifest(&mut self, folder_id: &str, manifest: &ModManifest) -> Result<(), StoreError> {
        let dir = self.require(folder_id)?;
        manifest.validate()?;
        manifest.write_to_file(&dir.join(MANIFEST_FILE))?;
        tracing::info!(folder = %folder_id, "updated manifest");
        Ok(())
    }

    /// Set or clear a merge-mode override in a mod's manifest
    pub fn set_merge_mode(
        &mut self,
        folder_id: &str,
        root_key: &str,
        mode: Option<MergeMode>,
    ) -> Result<(), StoreError> {
        let mut manifest = self.read_manifest(folder_id)?;
        manifest.set_merge_mode(root_key, mode);
        self.write_manifest(folder_id, &manifest)
    }

    /// A mod's data file, or `None` when the mod does not ship it
    pub fn read_section(
        &self,
        folder_id: &str,
        file_id: &str,
    ) -> Result<Option<Map<String, Value>>, StoreError> {
        let path = self.data_path(folder_id, file_id)?;
        if !path.exists() {
            return Ok(None);
        }
        read_object(&path).map(Some)
    }

    pub fn write_section(
        &mut self,
        folder_id: &str,
        file_id: &str,
        file: &Map<String, Value>,
    ) -> Result<(), StoreError> {
        let path = self.data_path(folder_id, file_id)?;
        let mut json = serde_json::to_string_pretty(file).map_err(|source| StoreError::Json {
            path: path.clone(),
            source,
        })?;
        json.push('\n');
        fs::write(&path, json)?;
        tracing::debug!(folder = %folder_id, file = %file_id, "wrote data file");
        Ok(())
    }

    /// Set (`Some`) or clear (`None`) a mod's explicit house-rule value
    pub fn set_house_rule(
        &mut self,
        folder_id: &str,
        rule: &HouseRule,
        value: Option<bool>,
    ) -> Result<(), StoreError> {
        let mut file = self.read_section(folder_id, rule.file_id)?.unwrap_or_default();
        match value {
            Some(v) => {
                file.insert(rule.json_key.to_string(), Value::Bool(v));
            }
            None => {
                file.remove(rule.json_key);
            }
        }
        self.write_section(folder_id, rule.file_id, &file)?;
        tracing::info!(folder = %folder_id, rule = rule.id, ?value, "set house rule");
        Ok(())
    }

    /// Load every data file of a mod into a layer.
    ///
    /// An unreadable file is logged and left out; the rest still load.
    pub fn load_layer(&self, entry: &ModEntry) -> ModLayer {
        let mut layer = ModLayer::new(&entry.folder_id, entry.priority, entry.manifest.clone())
            .with_enabled(entry.enabled);
        for file_id in &entry.files_present {
            match self.read_section(&entry.folder_id, file_id) {
                Ok(Some(file)) => layer = layer.with_file(file_id.as_str(), file),
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(folder = %entry.folder_id, file = %file_id, error = %e, "skipping unreadable data file");
                }
            }
        }
        layer
    }

    /// Layers for every listed mod, enabled or not
    pub fn load_layers(&self) -> Result<Vec<ModLayer>, StoreError> {
        Ok(self
            .list_mods()?
            .iter()
            .map(|entry| self.load_layer(entry))
            .collect())
    }

    /// `wanted`, or `wanted_2`, `wanted_3`, ... whichever is free
    pub fn unique_folder_id(&self, wanted: &str) -> String {
        if !self.root.join(wanted).exists() {
            return wanted.to_string();
        }
        (2u32..)
            .map(|n| format!("{}_{}", wanted, n))
            .find(|candidate| !self.root.join(candidate).exists())
            .unwrap_or_else(|| format!("{}_{}", wanted, ulid::Ulid::new()))
    }

    /// Record a freshly installed folder: enabled, at the highest priority
    pub fn register(&mut self, folder_id: &str) -> Result<(), StoreError> {
        self.sync()?;
        self.settings.remove(folder_id);
        self.settings.push_top(folder_id, true);
        self.persist()
    }

    fn require(&self, folder_id: &str) -> Result<PathBuf, StoreError> {
        let dir = self.mod_dir(folder_id)?;
        if !dir.join(MANIFEST_FILE).is_file() {
            return Err(StoreError::NotFound(folder_id.to_string()));
        }
        Ok(dir)
    }

    fn data_path(&self, folder_id: &str, file_id: &str) -> Result<PathBuf, StoreError> {
        if !shipyard_schema::data_file_ids().contains(file_id) {
            return Err(StoreError::UnknownFile(file_id.to_string()));
        }
        Ok(self.require(folder_id)?.join(data_file_name(file_id)))
    }

    fn scan(&self) -> Result<Vec<ScannedMod>, StoreError> {
        let mut found = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let Some(folder_id) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if !is_valid_folder_id(&folder_id) {
                tracing::debug!(folder = %folder_id, "ignoring folder with unsupported name");
                continue;
            }

            let dir = entry.path();
            let manifest = match read_manifest_at(&dir.join(MANIFEST_FILE)) {
                Ok(m) => m,
                Err(e) => {
                    tracing::warn!(folder = %folder_id, error = %e, "skipping folder without a readable manifest");
                    continue;
                }
            };
            let files_present = shipyard_schema::data_file_ids()
                .into_iter()
                .filter(|file_id| dir.join(data_file_name(file_id)).is_file())
                .map(str::to_string)
                .collect();

            found.push(ScannedMod {
                folder_id,
                manifest,
                files_present,
            });
        }
        found.sort_by(|a, b| a.folder_id.cmp(&b.folder_id));
        Ok(found)
    }

    /// Align settings with the folders on disk: stale entries go, newly
    /// discovered folders join disabled at the top.
    fn sync(&mut self) -> Result<(), StoreError> {
        let found = self.scan()?;
        let present: HashSet<&str> = found.iter().map(|f| f.folder_id.as_str()).collect();

        let before = self.settings.mods.len();
        self.settings
            .mods
            .retain(|m| present.contains(m.folder_id.as_str()));
        if self.settings.mods.len() != before {
            tracing::debug!(dropped = before - self.settings.mods.len(), "dropped settings for missing folders");
        }

        for f in &found {
            if self.settings.get(&f.folder_id).is_none() {
                self.settings.push_top(&f.folder_id, false);
            }
        }
        Ok(())
    }

    fn persist(&mut self) -> Result<(), StoreError> {
        self.sync()?;
        self.settings.save(&self.root.join(SETTINGS_FILE))?;
        Ok(())
    }
}

fn read_object(path: &Path) -> Result<Map<String, Value>, StoreError> {
    let text = fs::read_to_string(path)?;
    match serde_json::from_str(&text) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(StoreError::NotAnObject(path.to_path_buf())),
        Err(source) => Err(StoreError::Json {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn read_manifest_at(path: &Path) -> Result<ModManifest, StoreError> {
    let text = fs::read_to_string(path)?;
    ModManifest::from_json(&text).map_err(|source| StoreError::Json {
        path: path.to_path_buf(),
        source,
    })
}
