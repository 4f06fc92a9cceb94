//! Mod manifest (`mod.json`)

use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;

use shipyard_schema::{MergeMode, SectionSchema};

const VERSION_PATTERN: &str = r"^\d+\.\d+(\.\d+)?$";

fn default_version() -> String {
    "1.0.0".to_string()
}

/// Manifest stored at the root of every mod folder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModManifest {
    pub name: String,

    #[serde(default)]
    pub author: String,

    #[serde(default = "default_version")]
    pub version: String,

    #[serde(default)]
    pub description: String,

    /// Per-section merge mode overrides keyed by root key
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub file_modes: BTreeMap<String, MergeMode>,
}

/// Manifest validation errors
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ManifestError {
    #[error("mod name must not be empty")]
    EmptyName,

    #[error("invalid version '{0}' (expected MAJOR.MINOR or MAJOR.MINOR.PATCH)")]
    InvalidVersion(String),
}

impl ModManifest {
    /// Manifest with defaults for everything but the name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            author: String::new(),
            version: default_version(),
            description: String::new(),
            file_modes: BTreeMap::new(),
        }
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_mode(mut self, root_key: impl Into<String>, mode: MergeMode) -> Self {
        self.file_modes.insert(root_key.into(), mode);
        self
    }

    pub fn validate(&self) -> Result<(), ManifestError> {
        if self.name.trim().is_empty() {
            return Err(ManifestError::EmptyName);
        }
        let version_ok = Regex::new(VERSION_PATTERN)
            .map(|re| re.is_match(&self.version))
            .unwrap_or(false);
        if !version_ok {
            return Err(ManifestError::InvalidVersion(self.version.clone()));
        }
        Ok(())
    }

    /// Effective merge mode for a section: explicit override, else the
    /// section's default
    pub fn merge_mode(&self, schema: &SectionSchema) -> MergeMode {
        self.file_modes
            .get(schema.root_key)
            .copied()
            .unwrap_or(schema.default_merge_mode)
    }

    /// Set or clear (`None`) the override for a root key
    pub fn set_merge_mode(&mut self, root_key: &str, mode: Option<MergeMode>) {
        match mode {
            Some(mode) => {
                self.file_modes.insert(root_key.to_string(), mode);
            }
            None => {
                self.file_modes.remove(root_key);
            }
        }
    }

    /// Folder name derived from the mod name.
    ///
    /// Characters outside `[A-Za-z0-9_-]` become `_`, runs of `_` collapse,
    /// and an empty result becomes `mod`.
    pub fn folder_id(&self) -> String {
        let mut out = String::with_capacity(self.name.len());
        for c in self.name.trim().chars() {
            let c = if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            };
            if c == '_' && out.ends_with('_') {
                continue;
            }
            out.push(c);
        }
        let trimmed = out.trim_matches('_');
        if trimmed.is_empty() {
            "mod".to_string()
        } else {
            trimmed.to_string()
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn write_to_file(&self, path: &Path) -> io::Result<()> {
        let json = self.to_json().map_err(|e| {
            io::Error::new(io::ErrorKind::InvalidData, format!("JSON error: {}", e))
        })?;
        fs::write(path, json)
    }

    pub fn from_file(path: &Path) -> io::Result<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, format!("JSON error: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_minimal_json() {
        let manifest = ModManifest::from_json(r#"{"name": "Balance"}"#).unwrap();
        assert_eq!(manifest.version, "1.0.0");
        assert!(manifest.author.is_empty());
        assert!(manifest.file_modes.is_empty());
    }

    #[test]
    fn test_file_modes_wire_format() {
        let manifest = ModManifest::new("Overhaul").with_mode("weapons", MergeMode::Replace);
        let json: serde_json::Value = serde_json::from_str(&manifest.to_json().unwrap()).unwrap();
        assert_eq!(json["fileModes"]["weapons"], "replace");

        let plain = ModManifest::new("Plain");
        let json: serde_json::Value = serde_json::from_str(&plain.to_json().unwrap()).unwrap();
        assert!(json.get("fileModes").is_none());
    }

    #[test]
    fn test_version_pattern() {
        assert!(ModManifest::new("a").with_version("1.2").validate().is_ok());
        assert!(ModManifest::new("a").with_version("10.0.3").validate().is_ok());
        assert_eq!(
            ModManifest::new("a").with_version("v1").validate(),
            Err(ManifestError::InvalidVersion("v1".to_string()))
        );
        assert!(ModManifest::new("a").with_version("1.2.3.4").validate().is_err());
    }

    #[test]
    fn test_empty_name_rejected() {
        assert_eq!(ModManifest::new("  ").validate(), Err(ManifestError::EmptyName));
    }

    #[test]
    fn test_merge_mode_falls_back_to_section_default() {
        let weapons = shipyard_schema::section("weapons").unwrap();
        let hulls = shipyard_schema::section("hulls").unwrap();
        let manifest = ModManifest::new("m").with_mode("weapons", MergeMode::Replace);
        assert_eq!(manifest.merge_mode(weapons), MergeMode::Replace);
        assert_eq!(manifest.merge_mode(hulls), MergeMode::Add);
    }

    #[test]
    fn test_clear_merge_mode() {
        let mut manifest = ModManifest::new("m").with_mode("hulls", MergeMode::Replace);
        manifest.set_merge_mode("hulls", None);
        assert!(manifest.file_modes.is_empty());
    }

    #[test]
    fn test_folder_id() {
        assert_eq!(ModManifest::new("Balance Pass").folder_id(), "Balance_Pass");
        assert_eq!(ModManifest::new("  Weird / name!! ").folder_id(), "Weird_name");
        assert_eq!(ModManifest::new("???").folder_id(), "mod");
        assert_eq!(ModManifest::new("pl-7_extras").folder_id(), "pl-7_extras");
    }
}
