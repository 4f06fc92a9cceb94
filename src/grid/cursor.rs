//! Cell cursor and keyboard navigation

/// Keys the grid reacts to while a cell is being edited
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellKey {
    /// Commit, move right; wraps to the next row
    Tab,
    /// Commit, move left; wraps to the previous row
    ShiftTab,
    /// Commit, move down
    Enter,
    /// Discard the pending edit
    Escape,
}

impl CellKey {
    pub fn commits(self) -> bool {
        !matches!(self, CellKey::Escape)
    }
}

/// Current cell plus any uncommitted text
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CellCursor {
    pub row: usize,
    pub col: usize,
    pub pending: Option<String>,
}

impl CellCursor {
    pub fn at(row: usize, col: usize) -> Self {
        Self {
            row,
            col,
            pending: None,
        }
    }

    /// Position after `key` in a `rows` x `cols` grid.
    ///
    /// Tab and Shift+Tab wrap around the whole grid; Enter stops at the last
    /// row.
    pub fn step(&self, key: CellKey, rows: usize, cols: usize) -> (usize, usize) {
        if rows == 0 || cols == 0 {
            return (0, 0);
        }
        let (row, col) = (self.row.min(rows - 1), self.col.min(cols - 1));
        match key {
            CellKey::Tab => {
                let flat = (row * cols + col + 1) % (rows * cols);
                (flat / cols, flat % cols)
            }
            CellKey::ShiftTab => {
                let total = rows * cols;
                let flat = (row * cols + col + total - 1) % total;
                (flat / cols, flat % cols)
            }
            CellKey::Enter => ((row + 1).min(rows - 1), col),
            CellKey::Escape => (row, col),
        }
    }
}
