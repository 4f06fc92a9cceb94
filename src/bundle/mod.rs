//! Mod export and import
//!
//! A bundle is an uncompressed tar archive: `bundle.json` first, then the
//! mod's files in name order, all with normalized headers so the same mod
//! always exports the same bytes apart from `created_at`. Import checks every
//! digest before anything is written.

mod manifest;

pub use manifest::{
    BundleEntry, BundleManifest, BUNDLE_EXTENSION, BUNDLE_MANIFEST_FILE, SCHEMA_ID, SCHEMA_VERSION,
};

use chrono::Utc;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tar::{Archive, Builder, Header};
use walkdir::WalkDir;

use shipyard_schema::{data_file_name, MANIFEST_FILE};

use crate::store::{is_valid_folder_id, ManifestError, ModManifest, ModStore, StoreError};

/// Errors for export and import
#[derive(Debug, thiserror::Error)]
pub enum BundleError {
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Walk error: {0}")]
    WalkError(#[from] walkdir::Error),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Invalid mod manifest: {0}")]
    Manifest(#[from] ManifestError),

    #[error("Bundle has no bundle.json")]
    MissingBundleManifest,

    #[error("Unsupported bundle schema: {0}")]
    UnsupportedSchema(String),

    #[error("Bundle lists {0} but does not contain it")]
    MissingEntry(String),

    #[error("Digest mismatch for {path}: expected {expected}, got {actual}")]
    DigestMismatch {
        path: String,
        expected: String,
        actual: String,
    },

    #[error("Refusing unexpected bundle path: {0}")]
    UnsafePath(String),
}

/// What an import installed
#[derive(Debug, Clone, PartialEq)]
pub struct ImportedMod {
    pub folder_id: String,
    pub manifest: ModManifest,
    pub files: usize,
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Names a mod folder may carry into a bundle
fn is_bundled_name(name: &str) -> bool {
    name == MANIFEST_FILE
        || shipyard_schema::data_file_ids()
            .into_iter()
            .any(|id| data_file_name(id) == name)
}

fn append_file(builder: &mut Builder<&mut Vec<u8>>, path: &str, contents: &[u8]) -> io::Result<()> {
    let mut header = Header::new_gnu();
    header.set_path(path)?;
    header.set_size(contents.len() as u64);
    header.set_mtime(0);
    header.set_uid(0);
    header.set_gid(0);
    header.set_mode(0o644);
    header.set_cksum();
    builder.append(&header, contents)
}

/// Package a mod folder; returns the archive bytes and its manifest
pub fn export_mod(store: &ModStore, folder_id: &str) -> Result<(Vec<u8>, BundleManifest), BundleError> {
    let manifest = store.read_manifest(folder_id)?;
    let dir = store.mod_dir(folder_id)?;

    let mut files: BTreeMap<String, Vec<u8>> = BTreeMap::new();
    for entry in WalkDir::new(&dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by(|a, b| a.file_name().cmp(b.file_name()))
    {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(name) = entry.file_name().to_str() else {
            continue;
        };
        if !is_bundled_name(name) {
            tracing::debug!(folder = %folder_id, file = %name, "not bundling unrelated file");
            continue;
        }
        files.insert(name.to_string(), fs::read(entry.path())?);
    }

    let entries = files
        .iter()
        .map(|(path, contents)| BundleEntry {
            path: path.clone(),
            size: contents.len() as u64,
            sha256: sha256_hex(contents),
        })
        .collect();
    let bundle = BundleManifest {
        schema_version: SCHEMA_VERSION,
        schema_id: SCHEMA_ID.to_string(),
        created_at: Utc::now(),
        folder_id: folder_id.to_string(),
        manifest,
        entries,
    };

    let mut tar_bytes = Vec::new();
    {
        let mut builder = Builder::new(&mut tar_bytes);
        append_file(&mut builder, BUNDLE_MANIFEST_FILE, bundle.to_json()?.as_bytes())?;
        for (path, contents) in &files {
            append_file(&mut builder, path, contents)?;
        }
        builder.finish()?;
    }

    tracing::info!(folder = %folder_id, files = files.len(), bytes = tar_bytes.len(), "exported mod");
    Ok((tar_bytes, bundle))
}

/// Export straight to `<dest_dir>/<folder_id>.shipmod`
pub fn export_to_dir(store: &ModStore, folder_id: &str, dest_dir: &Path) -> Result<PathBuf, BundleError> {
    let (bytes, _) = export_mod(store, folder_id)?;
    fs::create_dir_all(dest_dir)?;
    let path = dest_dir.join(format!("{}.{}", folder_id, BUNDLE_EXTENSION));
    fs::write(&path, bytes)?;
    Ok(path)
}

/// Read and verify a bundle without installing it
pub fn read_bundle(bytes: &[u8]) -> Result<(BundleManifest, BTreeMap<String, Vec<u8>>), BundleError> {
    let mut contents: BTreeMap<String, Vec<u8>> = BTreeMap::new();
    let mut archive = Archive::new(bytes);
    for entry in archive.entries()? {
        let mut entry = entry?;
        if !entry.header().entry_type().is_file() {
            continue;
        }
        let path = entry.path()?.to_string_lossy().to_string();
        let mut data = Vec::new();
        entry.read_to_end(&mut data)?;
        contents.insert(path, data);
    }

    let raw = contents
        .remove(BUNDLE_MANIFEST_FILE)
        .ok_or(BundleError::MissingBundleManifest)?;
    let bundle = BundleManifest::from_json(&String::from_utf8_lossy(&raw))?;
    if bundle.schema_id != SCHEMA_ID {
        return Err(BundleError::UnsupportedSchema(bundle.schema_id));
    }

    let mut files = BTreeMap::new();
    for entry in &bundle.entries {
        if !is_bundled_name(&entry.path) {
            return Err(BundleError::UnsafePath(entry.path.clone()));
        }
        let data = contents
            .remove(&entry.path)
            .ok_or_else(|| BundleError::MissingEntry(entry.path.clone()))?;
        let actual = sha256_hex(&data);
        if actual != entry.sha256 {
            return Err(BundleError::DigestMismatch {
                path: entry.path.clone(),
                expected: entry.sha256.clone(),
                actual,
            });
        }
        files.insert(entry.path.clone(), data);
    }
    for stray in contents.keys() {
        tracing::warn!(path = %stray, "ignoring file not listed in bundle manifest");
    }

    if !files.contains_key(MANIFEST_FILE) {
        return Err(BundleError::MissingEntry(MANIFEST_FILE.to_string()));
    }
    Ok((bundle, files))
}

/// Install a bundle as a new mod.
///
/// The folder keeps its exported name unless taken, in which case `_2`,
/// `_3`, ... is appended. The mod is enabled at the highest priority.
pub fn import_bundle(store: &mut ModStore, bytes: &[u8]) -> Result<ImportedMod, BundleError> {
    let (bundle, files) = read_bundle(bytes)?;

    let manifest = files
        .get(MANIFEST_FILE)
        .map(|raw| ModManifest::from_json(&String::from_utf8_lossy(raw)))
        .ok_or_else(|| BundleError::MissingEntry(MANIFEST_FILE.to_string()))??;
    manifest.validate()?;

    let wanted = if is_valid_folder_id(&bundle.folder_id) {
        bundle.folder_id.clone()
    } else {
        manifest.folder_id()
    };
    let folder_id = store.unique_folder_id(&wanted);
    let dir = store.mod_dir(&folder_id)?;

    fs::create_dir_all(&dir)?;
    for (path, data) in &files {
        fs::write(dir.join(path), data)?;
    }
    store.register(&folder_id)?;

    tracing::info!(folder = %folder_id, files = files.len(), "imported mod bundle");
    Ok(ImportedMod {
        folder_id,
        manifest,
        files: files.len(),
    })
}

pub fn import_file(store: &mut ModStore, path: &Path) -> Result<ImportedMod, BundleError> {
    let bytes = fs::read(path)?;
    import_bundle(store, &bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn store_with_mod() -> (TempDir, ModStore) {
        let dir = TempDir::new().unwrap();
        let mut store = ModStore::open(dir.path()).unwrap();
        store.create_mod(&ModManifest::new("Balance")).unwrap();
        store
            .write_section(
                "Balance",
                "weapons",
                json!({"weapons": [{"id": "laser", "cost": 3}]}).as_object().unwrap(),
            )
            .unwrap();
        fs::write(dir.path().join("Balance").join("notes.txt"), "scratch").unwrap();
        (dir, store)
    }

    #[test]
    fn test_export_lists_mod_files_only() {
        let (_dir, store) = store_with_mod();
        let (bytes, bundle) = export_mod(&store, "Balance").unwrap();
        let paths: Vec<_> = bundle.entries.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["mod.json", "weapons.json"]);

        let (read_back, files) = read_bundle(&bytes).unwrap();
        assert_eq!(read_back.folder_id, "Balance");
        assert_eq!(files.len(), 2);
    }

    #[test]
    fn test_import_suffixes_on_collision() {
        let (_dir, mut store) = store_with_mod();
        let (bytes, _) = export_mod(&store, "Balance").unwrap();

        let first = import_bundle(&mut store, &bytes).unwrap();
        assert_eq!(first.folder_id, "Balance_2");
        let second = import_bundle(&mut store, &bytes).unwrap();
        assert_eq!(second.folder_id, "Balance_3");

        let mods = store.list_mods().unwrap();
        let top = mods.last().unwrap();
        assert_eq!(top.folder_id, "Balance_3");
        assert!(top.enabled);
        assert_eq!(
            store.read_section("Balance_2", "weapons").unwrap(),
            store.read_section("Balance", "weapons").unwrap()
        );
    }

    #[test]
    fn test_tampered_bundle_rejected() {
        let (_dir, mut store) = store_with_mod();
        let (_, bundle) = export_mod(&store, "Balance").unwrap();

        // Rebuild the archive with altered weapons data but the old digests.
        let mut tar_bytes = Vec::new();
        {
            let mut builder = Builder::new(&mut tar_bytes);
            append_file(&mut builder, BUNDLE_MANIFEST_FILE, bundle.to_json().unwrap().as_bytes()).unwrap();
            append_file(&mut builder, "mod.json", &fs::read(store.root().join("Balance/mod.json")).unwrap()).unwrap();
            append_file(&mut builder, "weapons.json", br#"{"weapons": []}"#).unwrap();
            builder.finish().unwrap();
        }

        let err = import_bundle(&mut store, &tar_bytes).unwrap_err();
        assert!(matches!(err, BundleError::DigestMismatch { ref path, .. } if path == "weapons.json"));
        assert!(!store.root().join("Balance_2").exists());
    }

    #[test]
    fn test_missing_bundle_manifest() {
        let mut tar_bytes = Vec::new();
        {
            let mut builder = Builder::new(&mut tar_bytes);
            append_file(&mut builder, "mod.json", br#"{"name": "x"}"#).unwrap();
            builder.finish().unwrap();
        }
        assert!(matches!(
            read_bundle(&tar_bytes),
            Err(BundleError::MissingBundleManifest)
        ));
    }

    #[test]
    fn test_export_to_dir() {
        let (dir, mut store) = store_with_mod();
        let out = dir.path().join("exports");
        let path = export_to_dir(&store, "Balance", &out).unwrap();
        assert_eq!(path.file_name().unwrap(), "Balance.shipmod");

        let imported = import_file(&mut store, &path).unwrap();
        assert_eq!(imported.files, 2);
        assert_eq!(imported.manifest.name, "Balance");
    }
}
