//! Mod editor: one mod, one section at a time
//!
//! Edits stay in memory until [`ModEditor::save`]. Saving validates each
//! edited section on its own: a section with errors stays unsaved while the
//! valid ones are written. Files are written one by one and failures are
//! collected rather than aborting.

use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};

use shipyard_schema::{MergeMode, SectionSchema};

use super::MergeContext;
use crate::base::BaseDataset;
use crate::grid::{
    base_candidates, diff_against_base, mod_candidates, GridCore, GridError, ImportCandidate,
    ImportOutcome, RowDiff,
};
use crate::row::{rows_to_value, section_rows, Row};
use crate::store::{ModManifest, ModStore, StoreError};

/// Errors from an editing session
#[derive(Debug, thiserror::Error)]
pub enum EditorError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Grid error: {0}")]
    Grid(#[from] GridError),

    #[error("Unknown section: {0}")]
    UnknownSection(String),

    #[error("Unknown house rule: {0}")]
    UnknownRule(String),
}

/// Where import candidates come from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportFrom {
    Base,
    ActiveMods,
}

/// A section held back by validation, with its first problem
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockedSection {
    pub section: &'static str,
    pub field: &'static str,
    pub message: String,
    /// Problems found in the section
    pub count: usize,
}

impl std::fmt::Display for BlockedSection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}.{}: {} ({} problem(s))",
            self.section, self.field, self.message, self.count
        )
    }
}

/// Outcome of a save
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SaveReport {
    /// File ids written successfully
    pub written: Vec<String>,
    /// `(file_id, error message)` for every file that failed
    pub failed: Vec<(String, String)>,
    /// Sections not saved because they failed validation
    pub blocked: Vec<BlockedSection>,
}

impl SaveReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty() && self.blocked.is_empty()
    }

    pub fn summary(&self) -> String {
        if !self.failed.is_empty() {
            return format!("{} file(s) failed to save", self.failed.len());
        }
        match self.blocked.first() {
            Some(first) => format!(
                "Saved {} file(s); {} section(s) blocked, first: {}",
                self.written.len(),
                self.blocked.len(),
                first
            ),
            None => format!("Saved {} file(s)", self.written.len()),
        }
    }
}

/// Editing session for a single mod
pub struct ModEditor<'a> {
    store: &'a mut ModStore,
    base: &'a BaseDataset,
    folder_id: String,
    manifest: ModManifest,
    /// On-disk content of the mod's data files
    files: BTreeMap<String, Map<String, Value>>,
    /// Unsaved rows of sections edited this session, keyed by section id
    edited: BTreeMap<&'static str, Vec<Row>>,
    grid: GridCore,
    context: MergeContext,
}

impl<'a> ModEditor<'a> {
    /// Open `folder_id` with its first section selected
    pub fn open(
        store: &'a mut ModStore,
        base: &'a BaseDataset,
        folder_id: &str,
        undo_limit: usize,
    ) -> Result<Self, EditorError> {
        let entry = store.get(folder_id)?;
        let mut files = BTreeMap::new();
        for file_id in &entry.files_present {
            if let Some(file) = store.read_section(folder_id, file_id)? {
                files.insert(file_id.clone(), file);
            }
        }
        let context = MergeContext::active(store, folder_id)?;

        let first = shipyard_schema::sections()
            .first()
            .ok_or_else(|| EditorError::UnknownSection(String::new()))?;
        let rows = own_rows(&files, first);

        tracing::info!(folder = %folder_id, context = context.layers().len(), "opened mod editor");
        Ok(Self {
            store,
            base,
            folder_id: folder_id.to_string(),
            manifest: entry.manifest,
            files,
            edited: BTreeMap::new(),
            grid: GridCore::new(first, rows, undo_limit),
            context,
        })
    }

    pub fn folder_id(&self) -> &str {
        &self.folder_id
    }

    pub fn manifest(&self) -> &ModManifest {
        &self.manifest
    }

    pub fn section(&self) -> &'static SectionSchema {
        self.grid.schema()
    }

    pub fn grid(&self) -> &GridCore {
        &self.grid
    }

    pub fn grid_mut(&mut self) -> &mut GridCore {
        &mut self.grid
    }

    pub fn context(&self) -> &MergeContext {
        &self.context
    }

    /// Unsaved edits exist in any section
    pub fn has_unsaved_changes(&self) -> bool {
        self.grid.is_dirty() || !self.edited.is_empty()
    }

    fn stash_current(&mut self) {
        if self.grid.is_dirty() {
            self.edited
                .insert(self.grid.schema().id, self.grid.rows().to_vec());
        }
    }

    /// Switch the grid to another section; undo history resets
    pub fn select_section(&mut self, section_id: &str) -> Result<(), EditorError> {
        let schema = shipyard_schema::section(section_id)
            .ok_or_else(|| EditorError::UnknownSection(section_id.to_string()))?;
        if schema.id == self.grid.schema().id {
            return Ok(());
        }
        self.stash_current();
        let rows = match self.edited.get(schema.id) {
            Some(rows) => rows.clone(),
            None => own_rows(&self.files, schema),
        };
        self.grid.load_section(schema, rows);
        tracing::debug!(folder = %self.folder_id, section = schema.id, "selected section");
        Ok(())
    }

    /// Merge mode this mod applies to the current section
    pub fn merge_mode(&self) -> MergeMode {
        self.manifest.merge_mode(self.grid.schema())
    }

    /// Set or clear the merge-mode override of the current section
    pub fn set_merge_mode(&mut self, mode: Option<MergeMode>) -> Result<(), EditorError> {
        let root_key = self.grid.schema().root_key;
        let mut manifest = self.manifest.clone();
        manifest.set_merge_mode(root_key, mode);
        self.store.write_manifest(&self.folder_id, &manifest)?;
        self.manifest = manifest;
        Ok(())
    }

    /// This mod's explicit value for a house rule
    pub fn house_rule(&self, rule_id: &str) -> Result<Option<bool>, EditorError> {
        let rule = shipyard_schema::house_rule(rule_id)
            .ok_or_else(|| EditorError::UnknownRule(rule_id.to_string()))?;
        Ok(self
            .files
            .get(rule.file_id)
            .and_then(|f| f.get(rule.json_key))
            .and_then(Value::as_bool))
    }

    /// Set (`Some`) or clear (`None`) a house rule; written immediately
    pub fn set_house_rule(&mut self, rule_id: &str, value: Option<bool>) -> Result<(), EditorError> {
        let rule = shipyard_schema::house_rule(rule_id)
            .ok_or_else(|| EditorError::UnknownRule(rule_id.to_string()))?;
        self.store.set_house_rule(&self.folder_id, rule, value)?;
        if let Some(file) = self.store.read_section(&self.folder_id, rule.file_id)? {
            self.files.insert(rule.file_id.to_string(), file);
        }
        Ok(())
    }

    /// Current grid rows against the base rows of the section
    pub fn diff_against_base(&self) -> Vec<RowDiff> {
        let schema = self.grid.schema();
        diff_against_base(schema, self.grid.rows(), &self.base.rows(schema))
    }

    pub fn import_candidates(&mut self, from: ImportFrom) -> Vec<ImportCandidate> {
        let schema = self.grid.schema();
        match from {
            ImportFrom::Base => base_candidates(&self.base.rows(schema), self.grid.rows()),
            ImportFrom::ActiveMods => {
                let effective = self.context.effective(schema, self.base);
                mod_candidates(&effective, self.grid.rows())
            }
        }
    }

    /// Import the given candidates as one undo step
    pub fn apply_import(&mut self, candidates: &[ImportCandidate]) -> ImportOutcome {
        let rows = candidates.iter().map(|c| c.row.clone()).collect();
        self.grid.apply_import(rows)
    }

    /// Re-seed the preview context with exactly these mods
    pub fn reload_with_specific_mods(&mut self, folder_ids: &[&str]) -> Result<(), EditorError> {
        self.context = MergeContext::with_mods(self.store, &self.folder_id, folder_ids)?;
        Ok(())
    }

    /// Validate and write every edited section.
    ///
    /// Sections with validation errors are reported in
    /// [`SaveReport::blocked`] and stay unsaved; their root keys keep the
    /// on-disk value. I/O failures are per file.
    pub fn save(&mut self) -> Result<SaveReport, EditorError> {
        self.stash_current();

        let mut report = SaveReport::default();
        let mut by_file: BTreeMap<&'static str, Vec<&'static SectionSchema>> = BTreeMap::new();
        for (section_id, rows) in &self.edited {
            let schema = shipyard_schema::section(section_id)
                .ok_or_else(|| EditorError::UnknownSection(section_id.to_string()))?;
            let errors = crate::validation::validate_section(schema, rows);
            match errors.first() {
                Some(first) => report.blocked.push(BlockedSection {
                    section: schema.id,
                    field: first.field(),
                    message: first.to_string(),
                    count: errors.len(),
                }),
                None => by_file.entry(schema.file_id).or_default().push(schema),
            }
        }
        if !report.blocked.is_empty() {
            tracing::warn!(
                folder = %self.folder_id,
                blocked = report.blocked.len(),
                "sections held back by validation"
            );
        }

        let mut saved_sections = BTreeSet::new();
        for (file_id, schemas) in by_file {
            let mut file = self.files.get(file_id).cloned().unwrap_or_default();
            for schema in &schemas {
                if let Some(rows) = self.edited.get(schema.id) {
                    file.insert(schema.root_key.to_string(), rows_to_value(schema.shape, rows));
                }
            }
            match self.store.write_section(&self.folder_id, file_id, &file) {
                Ok(()) => {
                    self.files.insert(file_id.to_string(), file);
                    saved_sections.extend(schemas.iter().map(|s| s.id));
                    report.written.push(file_id.to_string());
                }
                Err(e) => {
                    tracing::warn!(folder = %self.folder_id, file = %file_id, error = %e, "failed to save file");
                    report.failed.push((file_id.to_string(), e.to_string()));
                }
            }
        }

        self.edited.retain(|id, _| !saved_sections.contains(id));
        if saved_sections.contains(self.grid.schema().id) {
            self.grid.mark_saved();
        }

        tracing::info!(
            folder = %self.folder_id,
            written = report.written.len(),
            failed = report.failed.len(),
            "saved mod"
        );
        Ok(report)
    }

    /// End the session. Returns whether unsaved edits were discarded.
    pub fn close(self) -> bool {
        let discarded = self.has_unsaved_changes();
        if discarded {
            tracing::warn!(folder = %self.folder_id, "closing editor with unsaved changes");
        }
        tracing::debug!(folder = %self.folder_id, "closed mod editor");
        discarded
    }
}

fn own_rows(files: &BTreeMap<String, Map<String, Value>>, schema: &SectionSchema) -> Vec<Row> {
    files
        .get(schema.file_id)
        .and_then(|file| section_rows(schema, file))
        .unwrap_or_default()
}
