use foamlog_core::error::FoamError;
use foamlog_core::table::SampleMatch;
use foamlog_core::{build_normalized, parse_grid, process_grid};

use crate::InputArgs;

pub fn run(
    input: &InputArgs,
    sample_id: &str,
    contains: bool,
    wide: bool,
    output_format: &str,
) -> Result<(), FoamError> {
    let profile = super::resolve_profile(input)?;
    let grid = super::read_grid(input)?;

    let table = if wide {
        process_grid(&grid, &profile)?.wide
    } else {
        build_normalized(&parse_grid(&grid, &profile), &profile)?
    };

    let mode = if contains {
        SampleMatch::Contains
    } else {
        SampleMatch::Exact
    };
    let found = table.find_sample(sample_id, mode);

    if found.is_empty() {
        let kind = if contains { "partial" } else { "exact" };
        eprintln!("No {kind} match found for SampleID: {sample_id}");
        return Ok(());
    }

    super::emit(&found, output_format)
}
