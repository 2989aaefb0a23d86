use std::io::Cursor;

use calamine::{ExcelDateTime, Reader, Xlsx};
use chrono::Timelike;

use crate::error::FoamError;
use crate::extraction::{GridSource, RawGrid};

/// Grid backend for `.xlsx` exports of the same foam sheets.
///
/// Reads the named worksheet, or the first one when no name is given.
#[derive(Default)]
pub struct XlsxGridSource {
    sheet: Option<String>,
}

impl XlsxGridSource {
    pub fn new() -> Self {
        XlsxGridSource { sheet: None }
    }

    pub fn with_sheet(name: impl Into<String>) -> Self {
        XlsxGridSource {
            sheet: Some(name.into()),
        }
    }
}

impl GridSource for XlsxGridSource {
    fn read_grid(&self, bytes: &[u8]) -> Result<RawGrid, FoamError> {
        let cursor = Cursor::new(bytes);
        let mut workbook: Xlsx<_> = calamine::open_workbook_from_rs(cursor)
            .map_err(|e| FoamError::Workbook(format!("failed to open xlsx: {e}")))?;

        let sheet_name = match &self.sheet {
            Some(name) => name.clone(),
            None => workbook
                .sheet_names()
                .first()
                .cloned()
                .ok_or_else(|| FoamError::Workbook("workbook has no worksheets".into()))?,
        };

        let range = workbook
            .worksheet_range(&sheet_name)
            .map_err(|e| FoamError::Workbook(format!("sheet '{sheet_name}' not found: {e}")))?;

        // Ranges start at the first used cell; keep absolute positions.
        let (row_offset, col_offset) = range
            .start()
            .map(|(r, c)| (r as usize, c as usize))
            .unwrap_or((0, 0));

        let mut rows: Vec<Vec<String>> = vec![Vec::new(); row_offset];
        for cells in range.rows() {
            let mut row = vec![String::new(); col_offset];
            row.extend(cells.iter().map(|c| cell_as_string(c).unwrap_or_default()));
            rows.push(row);
        }

        tracing::debug!(sheet = %sheet_name, rows = rows.len(), "read xlsx grid");
        Ok(RawGrid::new(rows))
    }

    fn backend_name(&self) -> &str {
        "xlsx"
    }
}

fn cell_as_string(cell: &calamine::Data) -> Option<String> {
    match cell {
        calamine::Data::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        calamine::Data::Float(f) => Some(f.to_string()),
        calamine::Data::Int(i) => Some(i.to_string()),
        calamine::Data::Bool(b) => Some(b.to_string()),
        calamine::Data::DateTime(dt) => Some(render_datetime(dt)),
        calamine::Data::Empty => None,
        _ => Some(format!("{cell}")),
    }
}

/// Date cells in the sheets' own "M/D/YYYY" style; durations and
/// out-of-range serials keep their raw value.
fn render_datetime(dt: &ExcelDateTime) -> String {
    match dt.as_datetime().filter(|_| dt.is_datetime()) {
        Some(when) if when.num_seconds_from_midnight() == 0 => {
            when.format("%-m/%-d/%Y").to_string()
        }
        Some(when) => when.format("%-m/%-d/%Y %H:%M").to_string(),
        None => dt.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_rendering() {
        assert_eq!(
            cell_as_string(&calamine::Data::String("  fine ".into())).as_deref(),
            Some("fine")
        );
        assert_eq!(
            cell_as_string(&calamine::Data::Float(12.0)).as_deref(),
            Some("12")
        );
        assert_eq!(
            cell_as_string(&calamine::Data::Float(0.25)).as_deref(),
            Some("0.25")
        );
        assert!(cell_as_string(&calamine::Data::Empty).is_none());
    }

    #[test]
    fn test_date_cells_render_as_dates() {
        let date = ExcelDateTime::new(45292.0, calamine::ExcelDateTimeType::DateTime, false);
        assert_eq!(
            cell_as_string(&calamine::Data::DateTime(date)).as_deref(),
            Some("1/1/2024")
        );

        let with_time = ExcelDateTime::new(45292.5, calamine::ExcelDateTimeType::DateTime, false);
        assert_eq!(
            cell_as_string(&calamine::Data::DateTime(with_time)).as_deref(),
            Some("1/1/2024 12:00")
        );

        let duration = ExcelDateTime::new(1.5, calamine::ExcelDateTimeType::TimeDelta, false);
        assert_eq!(
            cell_as_string(&calamine::Data::DateTime(duration)).as_deref(),
            Some("1.5")
        );
    }

    #[test]
    fn test_garbage_bytes_rejected() {
        let err = XlsxGridSource::new().read_grid(b"not a zip").unwrap_err();
        assert!(matches!(err, FoamError::Workbook(_)));
    }
}
