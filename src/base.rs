//! The immutable base dataset
//!
//! Same on-disk layout as a mod folder without the manifest: one
//! `<file_id>.json` object per data file.

use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;

use shipyard_schema::{data_file_name, SectionSchema};

use crate::row::{section_rows, Row};

/// Errors loading the base dataset
#[derive(Debug, thiserror::Error)]
pub enum BaseDataError {
    #[error("IO error reading {file}: {source}")]
    Io { file: String, source: io::Error },

    #[error("{file} is not valid JSON: {source}")]
    Json {
        file: String,
        source: serde_json::Error,
    },

    #[error("{0} must contain a JSON object at the top level")]
    NotAnObject(String),
}

/// Base data files keyed by file id
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BaseDataset {
    files: BTreeMap<String, Map<String, Value>>,
}

impl BaseDataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from in-memory file objects
    pub fn from_files(files: BTreeMap<String, Map<String, Value>>) -> Self {
        Self { files }
    }

    /// Load every known data file from `dir`. Missing files are empty.
    pub fn load(dir: &Path) -> Result<Self, BaseDataError> {
        let mut files = BTreeMap::new();
        for file_id in shipyard_schema::data_file_ids() {
            let name = data_file_name(file_id);
            let path = dir.join(&name);
            if !path.exists() {
                tracing::debug!(file = %name, "base data file missing; treating as empty");
                continue;
            }
            let text = fs::read_to_string(&path).map_err(|source| BaseDataError::Io {
                file: name.clone(),
                source,
            })?;
            let value: Value = serde_json::from_str(&text).map_err(|source| BaseDataError::Json {
                file: name.clone(),
                source,
            })?;
            match value {
                Value::Object(map) => {
                    files.insert(file_id.to_string(), map);
                }
                _ => return Err(BaseDataError::NotAnObject(name)),
            }
        }
        tracing::info!(files = files.len(), dir = %dir.display(), "loaded base dataset");
        Ok(Self { files })
    }

    /// Raw file object
    pub fn file(&self, file_id: &str) -> Option<&Map<String, Value>> {
        self.files.get(file_id)
    }

    /// Base rows of a section (empty when the base does not define it)
    pub fn rows(&self, schema: &SectionSchema) -> Vec<Row> {
        self.file(schema.file_id)
            .and_then(|file| section_rows(schema, file))
            .unwrap_or_default()
    }

    /// Replace a file object
    pub fn insert_file(&mut self, file_id: impl Into<String>, file: Map<String, Value>) {
        self.files.insert(file_id.into(), file);
    }
}
