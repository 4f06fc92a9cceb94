//! Mod load-order settings (`settings.json`)
//!
//! User choices about enablement and priority, kept apart from the manifests
//! so that adding or removing a mod never requires a manifest edit.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;

/// Settings file name inside the mods directory
pub const SETTINGS_FILE: &str = "settings.json";

/// Schema version for settings.json
pub const SCHEMA_VERSION: u32 = 1;

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// One mod's load-order record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModSetting {
    pub folder_id: String,
    pub enabled: bool,
    /// Ascending priority is applied in order; the highest wins conflicts
    pub priority: i64,
}

/// Persisted load order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModSettings {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    #[serde(default)]
    pub mods: Vec<ModSetting>,
}

impl Default for ModSettings {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            mods: Vec::new(),
        }
    }
}

impl ModSettings {
    /// Load from `path`; a missing file yields empty settings
    pub fn load(path: &Path) -> io::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let json = fs::read_to_string(path)?;
        serde_json::from_str(&json)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, format!("JSON error: {}", e)))
    }

    pub fn save(&self, path: &Path) -> io::Result<()> {
        let json = serde_json::to_string_pretty(self).map_err(|e| {
            io::Error::new(io::ErrorKind::InvalidData, format!("JSON error: {}", e))
        })?;
        fs::write(path, json)
    }

    pub fn get(&self, folder_id: &str) -> Option<&ModSetting> {
        self.mods.iter().find(|m| m.folder_id == folder_id)
    }

    pub fn get_mut(&mut self, folder_id: &str) -> Option<&mut ModSetting> {
        self.mods.iter_mut().find(|m| m.folder_id == folder_id)
    }

    /// Highest priority in use, if any
    pub fn max_priority(&self) -> Option<i64> {
        self.mods.iter().map(|m| m.priority).max()
    }

    /// Append a mod above every existing one
    pub fn push_top(&mut self, folder_id: &str, enabled: bool) {
        let priority = self.max_priority().map_or(1, |p| p + 1);
        self.mods.push(ModSetting {
            folder_id: folder_id.to_string(),
            enabled,
            priority,
        });
    }

    pub fn remove(&mut self, folder_id: &str) -> Option<ModSetting> {
        let idx = self.mods.iter().position(|m| m.folder_id == folder_id)?;
        Some(self.mods.remove(idx))
    }

    /// Sort by priority, then folder id for ties
    pub fn sort(&mut self) {
        self.mods.sort_by(|a, b| {
            a.priority
                .cmp(&b.priority)
                .then_with(|| a.folder_id.cmp(&b.folder_id))
        });
    }

    /// Sort and renumber priorities densely from 1
    pub fn normalize(&mut self) {
        self.sort();
        for (i, m) in self.mods.iter_mut().enumerate() {
            m.priority = i as i64 + 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let settings = ModSettings::load(&dir.path().join(SETTINGS_FILE)).unwrap();
        assert!(settings.mods.is_empty());
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(SETTINGS_FILE);

        let mut settings = ModSettings::default();
        settings.push_top("balance", true);
        settings.push_top("overhaul", false);
        settings.save(&path).unwrap();

        let loaded = ModSettings::load(&path).unwrap();
        assert_eq!(loaded, settings);
        assert_eq!(loaded.get("overhaul").unwrap().priority, 2);
        assert!(!loaded.get("overhaul").unwrap().enabled);

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["mods"][0]["folderId"], "balance");
    }

    #[test]
    fn test_normalize_handles_sparse_and_ties() {
        let mut settings = ModSettings::default();
        settings.mods = vec![
            ModSetting { folder_id: "b".into(), enabled: true, priority: 40 },
            ModSetting { folder_id: "a".into(), enabled: true, priority: 40 },
            ModSetting { folder_id: "c".into(), enabled: true, priority: -3 },
        ];
        settings.normalize();

        let order: Vec<_> = settings.mods.iter().map(|m| (m.folder_id.as_str(), m.priority)).collect();
        assert_eq!(order, vec![("c", 1), ("a", 2), ("b", 3)]);
    }

    #[test]
    fn test_remove() {
        let mut settings = ModSettings::default();
        settings.push_top("x", true);
        assert!(settings.remove("x").is_some());
        assert!(settings.remove("x").is_none());
    }
}
