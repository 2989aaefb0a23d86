pub mod csv_text;
pub mod xlsx;

use crate::error::FoamError;

/// Header-less grid of cell text, rows padded to a common width.
#[derive(Debug, Clone, Default)]
pub struct RawGrid {
    rows: Vec<Vec<String>>,
    width: usize,
    encoding: Option<&'static str>,
}

impl RawGrid {
    pub fn new(mut rows: Vec<Vec<String>>) -> Self {
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        for row in &mut rows {
            row.resize(width, String::new());
        }
        RawGrid {
            rows,
            width,
            encoding: None,
        }
    }

    /// Build a grid from string literals (mostly useful in tests).
    pub fn from_rows(rows: &[&[&str]]) -> Self {
        RawGrid::new(
            rows.iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        )
    }

    pub fn with_encoding(mut self, encoding: &'static str) -> Self {
        self.encoding = Some(encoding);
        self
    }

    /// Text encoding the grid was decoded from, when read from text.
    pub fn encoding(&self) -> Option<&'static str> {
        self.encoding
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Trimmed cell text; empty when out of range.
    pub fn cell(&self, row: usize, col: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(|c| c.trim())
            .unwrap_or("")
    }

    /// All cells of a row joined with commas and lower-cased.
    pub fn joined_lower(&self, row: usize) -> String {
        self.rows
            .get(row)
            .map(|r| r.join(",").to_lowercase())
            .unwrap_or_default()
    }

    /// Columns and trimmed text of the row's non-blank cells.
    pub fn non_empty_cells(&self, row: usize) -> Vec<(usize, &str)> {
        (0..self.width)
            .map(|col| (col, self.cell(row, col)))
            .filter(|(_, text)| !crate::parsing::fields::is_blank(text))
            .collect()
    }
}

/// Trait for spreadsheet export backends that produce a raw grid.
pub trait GridSource: Send + Sync {
    /// Read the whole document into memory as a grid.
    fn read_grid(&self, bytes: &[u8]) -> Result<RawGrid, FoamError>;

    /// Name of this backend (for diagnostics).
    fn backend_name(&self) -> &str;
}
