use std::path::PathBuf;

use foamlog_core::error::FoamError;
use foamlog_core::process_grid;

use crate::InputArgs;

pub fn run(
    input: &InputArgs,
    output_format: &str,
    output_file: Option<PathBuf>,
) -> Result<(), FoamError> {
    let profile = super::resolve_profile(input)?;
    let grid = super::read_grid(input)?;
    let tables = process_grid(&grid, &profile)?;

    match output_file {
        Some(path) => {
            super::write_csv(&tables.wide, &path)?;
            eprintln!(
                "Pivoted {} sample(s) into {} row(s), written to {}",
                tables.sample_count,
                tables.wide.len(),
                path.display()
            );
            if !tables.warnings.is_empty() {
                eprintln!("  {} warning(s) during parsing", tables.warnings.len());
            }
        }
        None => super::emit(&tables.wide, output_format)?,
    }

    Ok(())
}
