use std::path::PathBuf;

use foamlog_core::error::FoamError;
use foamlog_core::table::SAMPLE_ID;
use foamlog_core::{build_normalized, parse_grid};

use crate::InputArgs;

pub fn run(
    input: &InputArgs,
    output_format: &str,
    output_file: Option<PathBuf>,
) -> Result<(), FoamError> {
    let profile = super::resolve_profile(input)?;
    let grid = super::read_grid(input)?;
    let parsed = parse_grid(&grid, &profile);
    let table = build_normalized(&parsed, &profile)?;

    match output_file {
        Some(path) => {
            super::write_csv(&table, &path)?;
            eprintln!(
                "Parsed {} row(s) for {} sample(s), written to {}",
                table.len(),
                table.distinct_count(SAMPLE_ID),
                path.display()
            );
            for w in &parsed.warnings {
                eprintln!("  warning (row {}): {}", w.row + 1, w.reason);
            }
            if !parsed.skipped_rows.is_empty() {
                eprintln!(
                    "  {} row(s) skipped during parsing",
                    parsed.skipped_rows.len()
                );
            }
        }
        None => super::emit(&table, output_format)?,
    }

    Ok(())
}
