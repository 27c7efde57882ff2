use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One row of a raw table: column name → cell text.
pub type RawRow = BTreeMap<String, String>;

/// A worksheet with its header row already applied to every data row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTable {
    pub rows: Vec<RawRow>,
}

impl RawTable {
    pub fn new(rows: Vec<RawRow>) -> Self {
        Self { rows }
    }

    /// Build a table from a cell grid whose first row is the header.
    ///
    /// Spreadsheet APIs drop trailing empty cells, so short rows are padded
    /// with empty strings. Columns with a blank header are ignored.
    pub fn from_grid(grid: Vec<Vec<String>>) -> Self {
        let mut lines = grid.into_iter();
        let Some(header) = lines.next() else {
            return Self::default();
        };

        let rows = lines
            .map(|cells| {
                header
                    .iter()
                    .enumerate()
                    .filter(|(_, column)| !column.trim().is_empty())
                    .map(|(i, column)| {
                        let cell = cells.get(i).cloned().unwrap_or_default();
                        (column.trim().to_string(), cell)
                    })
                    .collect()
            })
            .collect();

        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
