use std::collections::HashSet;

use serde::Serialize;

use crate::error::FoamError;
use crate::model::Value;

/// A rectangular result table with named columns.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

/// How `find_sample` compares the query with each SampleID.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SampleMatch {
    #[default]
    Exact,
    Contains,
}

pub const SAMPLE_ID: &str = "SampleID";

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Table {
            columns,
            rows: Vec::new(),
        }
    }

    /// Append a row, padding or truncating it to the column count.
    pub fn push_row(&mut self, mut row: Vec<Value>) {
        row.resize(self.columns.len(), Value::Missing);
        self.rows.push(row);
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        let col = self.column_index(column)?;
        self.rows.get(row).and_then(|r| r.get(col))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of distinct non-missing values in a column.
    pub fn distinct_count(&self, column: &str) -> usize {
        let Some(col) = self.column_index(column) else {
            return 0;
        };
        self.rows
            .iter()
            .filter_map(|r| r.get(col))
            .filter(|v| !v.is_missing())
            .collect::<HashSet<_>>()
            .len()
    }

    /// Rows whose SampleID matches the query, ignoring case and surrounding whitespace.
    pub fn find_sample(&self, query: &str, mode: SampleMatch) -> Table {
        let needle = query.trim().to_lowercase();
        let mut found = Table::new(self.columns.clone());

        let Some(col) = self.column_index(SAMPLE_ID) else {
            return found;
        };
        if needle.is_empty() {
            return found;
        }

        for row in &self.rows {
            let Some(id) = row.get(col).filter(|v| !v.is_missing()) else {
                continue;
            };
            let id = id.to_string().trim().to_lowercase();
            let hit = match mode {
                SampleMatch::Exact => id == needle,
                SampleMatch::Contains => id.contains(&needle),
            };
            if hit {
                found.rows.push(row.clone());
            }
        }
        found
    }

    /// Render as UTF-8 CSV with a header line. Missing cells are empty.
    pub fn to_csv_bytes(&self) -> Result<Vec<u8>, FoamError> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(&self.columns)?;
        for row in &self.rows {
            writer.write_record(row.iter().map(|v| v.to_string()))?;
        }
        writer
            .into_inner()
            .map_err(|e| FoamError::Io(e.into_error()))
    }
}
