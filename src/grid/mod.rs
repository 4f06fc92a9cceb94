//! Editable grid over one section of one mod
//!
//! Every mutation records the pre-mutation rows in the undo history first,
//! so any single operation (including a bulk import) is one undo step.
//! Switching sections resets both stacks.

pub mod coerce;
pub mod cursor;
pub mod diff;
pub mod history;
pub mod ids;
pub mod import;

pub use coerce::{coerce_input, display_value};
pub use cursor::{CellCursor, CellKey};
pub use diff::{changed_fields, diff_against_base, DiffStatus, DiffSummary, RowDiff};
pub use history::{History, DEFAULT_UNDO_LIMIT};
pub use ids::generate_row_id;
pub use import::{base_candidates, mod_candidates, ImportCandidate, ImportSource};

use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

use shipyard_schema::{SectionSchema, Shape, ID_FIELD};

use crate::row::{get_path, remove_path, row_id, rows_to_value, set_path, template_row, Row};
use crate::validation::{self, RowError};

/// Grid editing errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GridError {
    #[error("Row {index} out of range ({len} rows)")]
    RowOutOfRange { index: usize, len: usize },

    #[error("Column {index} out of range ({len} columns)")]
    ColumnOutOfRange { index: usize, len: usize },

    #[error("Section '{section}' has no field '{field}'")]
    UnknownField {
        section: &'static str,
        field: String,
    },

    #[error("{field}: invalid JSON: {message}")]
    InvalidJson {
        field: &'static str,
        message: String,
    },

    #[error("{field}: '{input}' is not true or false")]
    InvalidBoolean { field: &'static str, input: String },

    #[error("Section '{0}' is a single object; rows cannot be added or removed")]
    SingleObject(&'static str),
}

/// Result of applying imported rows
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportOutcome {
    pub added: usize,
    pub overwritten: usize,
}

/// Row collection with undo/redo and a cell cursor
#[derive(Debug, Clone)]
pub struct GridCore {
    schema: &'static SectionSchema,
    rows: Vec<Row>,
    saved: Vec<Row>,
    history: History<Vec<Row>>,
    cursor: CellCursor,
}

impl GridCore {
    pub fn new(schema: &'static SectionSchema, rows: Vec<Row>, undo_limit: usize) -> Self {
        let rows = Self::normalize(schema, rows);
        Self {
            schema,
            saved: rows.clone(),
            rows,
            history: History::new(undo_limit),
            cursor: CellCursor::default(),
        }
    }

    /// An Object section always has exactly one row
    fn normalize(schema: &SectionSchema, mut rows: Vec<Row>) -> Vec<Row> {
        if schema.shape == Shape::Object {
            rows.truncate(1);
            if rows.is_empty() {
                rows.push(Row::new());
            }
        }
        rows
    }

    /// Switch to another section; history and cursor reset
    pub fn load_section(&mut self, schema: &'static SectionSchema, rows: Vec<Row>) {
        let rows = Self::normalize(schema, rows);
        self.schema = schema;
        self.saved = rows.clone();
        self.rows = rows;
        self.history.clear();
        self.cursor = CellCursor::default();
    }

    pub fn schema(&self) -> &'static SectionSchema {
        self.schema
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> Option<&Row> {
        self.rows.get(index)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn columns(&self) -> Vec<&'static str> {
        self.schema.column_keys()
    }

    pub fn history(&self) -> &History<Vec<Row>> {
        &self.history
    }

    pub fn cursor(&self) -> &CellCursor {
        &self.cursor
    }

    /// Rows differ from the last load or save
    pub fn is_dirty(&self) -> bool {
        self.rows != self.saved
    }

    pub fn mark_saved(&mut self) {
        self.saved = self.rows.clone();
    }

    /// Rows in the section's on-disk shape
    pub fn to_value(&self) -> Value {
        rows_to_value(self.schema.shape, &self.rows)
    }

    fn check_index(&self, index: usize) -> Result<(), GridError> {
        if index < self.rows.len() {
            Ok(())
        } else {
            Err(GridError::RowOutOfRange {
                index,
                len: self.rows.len(),
            })
        }
    }

    fn check_multi_row(&self) -> Result<(), GridError> {
        if self.schema.shape == Shape::Object {
            return Err(GridError::SingleObject(self.schema.id));
        }
        Ok(())
    }

    fn checkpoint(&mut self) {
        self.history.record(self.rows.clone());
    }

    fn fresh_id(&self, prefix: &str) -> String {
        generate_row_id(prefix, &self.rows)
    }

    /// Append a row built from the section template; returns its index
    pub fn add_row(&mut self) -> Result<usize, GridError> {
        self.check_multi_row()?;
        let mut row = template_row(self.schema);
        let prefix = row_id(&row).unwrap_or_else(|| self.schema.id.to_string());
        row.insert(ID_FIELD.to_string(), Value::String(self.fresh_id(&prefix)));

        self.checkpoint();
        self.rows.push(row);
        Ok(self.rows.len() - 1)
    }

    pub fn delete_row(&mut self, index: usize) -> Result<Row, GridError> {
        self.check_multi_row()?;
        self.check_index(index)?;
        self.checkpoint();
        Ok(self.rows.remove(index))
    }

    /// Copy a row under a fresh id, inserted right after it
    pub fn duplicate_row(&mut self, index: usize) -> Result<usize, GridError> {
        self.check_multi_row()?;
        self.check_index(index)?;
        let mut copy = self.rows[index].clone();
        let prefix = row_id(&copy).unwrap_or_else(|| self.schema.id.to_string());
        copy.insert(ID_FIELD.to_string(), Value::String(self.fresh_id(&prefix)));

        self.checkpoint();
        self.rows.insert(index + 1, copy);
        Ok(index + 1)
    }

    /// Move a row to a new position
    pub fn move_row(&mut self, from: usize, to: usize) -> Result<(), GridError> {
        self.check_index(from)?;
        self.check_index(to)?;
        if from == to {
            return Ok(());
        }
        self.checkpoint();
        let row = self.rows.remove(from);
        self.rows.insert(to, row);
        Ok(())
    }

    /// Commit raw cell text to `field_key` of a row.
    ///
    /// Returns whether the row changed; an unchanged commit records nothing.
    pub fn commit_cell(&mut self, index: usize, field_key: &str, text: &str) -> Result<bool, GridError> {
        self.check_index(index)?;
        let field = self.schema.field(field_key).ok_or_else(|| GridError::UnknownField {
            section: self.schema.id,
            field: field_key.to_string(),
        })?;
        let value = coerce_input(text, field)?;
        self.set_value(index, field.key, value)
    }

    /// Write (`Some`) or unset (`None`) a value at a dotted path.
    pub fn set_value(&mut self, index: usize, path: &str, value: Option<Value>) -> Result<bool, GridError> {
        self.check_index(index)?;
        let current = &self.rows[index];
        let updated = match value {
            Some(v) => set_path(current, path, v),
            None => remove_path(current, path),
        };
        if &updated == current {
            return Ok(false);
        }
        self.checkpoint();
        self.rows[index] = updated;
        Ok(true)
    }

    /// Current display text of a cell
    pub fn cell_text(&self, index: usize, field_key: &str) -> Option<String> {
        self.rows
            .get(index)
            .map(|row| display_value(get_path(row, field_key)))
    }

    /// Apply imported rows as one history entry: existing ids are
    /// overwritten in place, everything else appends.
    pub fn apply_import(&mut self, rows: Vec<Row>) -> ImportOutcome {
        let mut outcome = ImportOutcome::default();
        if rows.is_empty() {
            return outcome;
        }
        self.checkpoint();

        if self.schema.shape == Shape::Object {
            if let Some(row) = rows.into_iter().last() {
                self.rows = vec![row];
                outcome.overwritten = 1;
            }
            return outcome;
        }

        let mut index: HashMap<String, usize> = HashMap::new();
        for (i, row) in self.rows.iter().enumerate() {
            if let Some(id) = row_id(row) {
                index.entry(id).or_insert(i);
            }
        }
        for row in rows {
            match row_id(&row).and_then(|id| index.get(&id).copied()) {
                Some(pos) => {
                    self.rows[pos] = row;
                    outcome.overwritten += 1;
                }
                None => {
                    if let Some(id) = row_id(&row) {
                        index.insert(id, self.rows.len());
                    }
                    self.rows.push(row);
                    outcome.added += 1;
                }
            }
        }
        outcome
    }

    /// Restore the previous state. Returns `false` when there is none.
    pub fn undo(&mut self) -> bool {
        let current = std::mem::take(&mut self.rows);
        let (rows, moved) = match self.history.undo(current) {
            Ok(previous) => (previous, true),
            Err(current) => (current, false),
        };
        self.rows = rows;
        moved
    }

    pub fn redo(&mut self) -> bool {
        let current = std::mem::take(&mut self.rows);
        let (rows, moved) = match self.history.redo(current) {
            Ok(next) => (next, true),
            Err(current) => (current, false),
        };
        self.rows = rows;
        moved
    }

    pub fn validate(&self) -> Vec<RowError> {
        validation::validate_section(self.schema, &self.rows)
    }

    pub fn duplicate_ids(&self) -> BTreeMap<String, Vec<usize>> {
        validation::duplicate_ids(&self.rows)
    }

    /// Place the cursor and start editing with the cell's current text
    pub fn begin_edit(&mut self, row: usize, col: usize) -> Result<(), GridError> {
        self.check_index(row)?;
        let columns = self.columns();
        let key = columns.get(col).ok_or(GridError::ColumnOutOfRange {
            index: col,
            len: columns.len(),
        })?;
        let text = self.cell_text(row, key).unwrap_or_default();
        self.cursor = CellCursor {
            row,
            col,
            pending: Some(text),
        };
        Ok(())
    }

    /// Replace the pending text of the cell under the cursor
    pub fn type_text(&mut self, text: impl Into<String>) {
        self.cursor.pending = Some(text.into());
    }

    /// Handle a navigation key: commit (or discard) the pending edit, then
    /// move the cursor.
    ///
    /// A failed commit leaves the pending text and the cursor in place.
    pub fn press(&mut self, key: CellKey) -> Result<(), GridError> {
        if key.commits() {
            if let Some(text) = self.cursor.pending.clone() {
                let columns = self.columns();
                if let Some(field_key) = columns.get(self.cursor.col) {
                    self.commit_cell(self.cursor.row, field_key, &text)?;
                }
            }
        }
        self.cursor.pending = None;
        let (row, col) = self.cursor.step(key, self.rows.len(), self.columns().len());
        self.cursor.row = row;
        self.cursor.col = col;
        Ok(())
    }
}
