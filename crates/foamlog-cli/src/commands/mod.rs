pub mod parse;
pub mod pivot;
pub mod profiles;
pub mod search;

use std::path::Path;

use foamlog_core::error::FoamError;
use foamlog_core::extraction::csv_text::CsvGridSource;
use foamlog_core::extraction::xlsx::XlsxGridSource;
use foamlog_core::extraction::{GridSource, RawGrid};
use foamlog_core::profile::schema::ParserProfile;
use foamlog_core::profile::{builtin, load_profile};
use foamlog_core::table::Table;

use crate::output;
use crate::InputArgs;

/// Profile from `--profile-file`, else the named preset, else the default preset.
pub fn resolve_profile(input: &InputArgs) -> Result<ParserProfile, FoamError> {
    match (&input.profile_file, &input.profile) {
        (Some(path), _) => load_profile(path),
        (None, Some(name)) => builtin::load_preset(name),
        (None, None) => builtin::load_preset(builtin::PRESETS[0]),
    }
}

/// Pick a grid backend from the file extension. `sheet` only applies to workbooks.
pub fn grid_source(path: &Path, sheet: Option<&str>) -> Box<dyn GridSource> {
    let is_xlsx = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("xlsx"));
    match (is_xlsx, sheet) {
        (true, Some(name)) => Box::new(XlsxGridSource::with_sheet(name)),
        (true, None) => Box::new(XlsxGridSource::new()),
        (false, sheet) => {
            if let Some(name) = sheet {
                tracing::warn!(sheet = name, "--sheet ignored for text input");
            }
            Box::new(CsvGridSource::new())
        }
    }
}

pub fn read_grid(input: &InputArgs) -> Result<RawGrid, FoamError> {
    let path = &input.input_file;
    let bytes = std::fs::read(path)?;
    let source = grid_source(path, input.sheet.as_deref());
    tracing::info!(file = %path.display(), backend = source.backend_name(), "reading input");
    let grid = source.read_grid(&bytes)?;
    if grid.is_empty() {
        return Err(FoamError::EmptyInput);
    }
    Ok(grid)
}

/// Print a table to stdout in the requested format.
pub fn emit(table: &Table, format: &str) -> Result<(), FoamError> {
    match format {
        "json" => output::json::print(table),
        "csv" => output::csv::print(table),
        _ => {
            print!("{}", output::table::format_table(table));
            Ok(())
        }
    }
}

pub fn write_csv(table: &Table, path: &Path) -> Result<(), FoamError> {
    std::fs::write(path, table.to_csv_bytes()?)?;
    Ok(())
}
