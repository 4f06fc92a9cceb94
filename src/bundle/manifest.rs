//! Bundle manifest (`bundle.json`)
//!
//! Lists every mod file shipped in a bundle with its size and digest.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::store::ModManifest;

/// Schema version for bundle.json
pub const SCHEMA_VERSION: u32 = 1;

/// Schema identifier
pub const SCHEMA_ID: &str = "shipyard/mod_bundle@1";

/// Name of the manifest entry inside the archive
pub const BUNDLE_MANIFEST_FILE: &str = "bundle.json";

/// File extension of exported bundles
pub const BUNDLE_EXTENSION: &str = "shipmod";

/// One file in the bundle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleEntry {
    /// File name inside the mod folder
    pub path: String,

    pub size: u64,

    /// SHA-256 of the file contents
    pub sha256: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundleManifest {
    pub schema_version: u32,

    pub schema_id: String,

    pub created_at: DateTime<Utc>,

    /// Folder the mod was exported from
    pub folder_id: String,

    pub manifest: ModManifest,

    pub entries: Vec<BundleEntry>,
}

impl BundleManifest {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Total size of all files
    pub fn total_size(&self) -> u64 {
        self.entries.iter().map(|e| e.size).sum()
    }

    pub fn find_entry(&self, path: &str) -> Option<&BundleEntry> {
        self.entries.iter().find(|e| e.path == path)
    }
}
