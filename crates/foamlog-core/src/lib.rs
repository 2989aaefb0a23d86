pub mod assemble;
pub mod error;
pub mod extraction;
pub mod model;
pub mod parsing;
pub mod profile;
pub mod table;

use serde::Serialize;

use error::FoamError;
use extraction::{GridSource, RawGrid};
use parsing::{ParsedSheet, ScanWarning};
use profile::schema::ParserProfile;
use table::{Table, SAMPLE_ID};

pub use assemble::build_normalized;
pub use assemble::pivot::build_wide;
pub use parsing::parse_grid;

/// Both output tables for one foam-stability sheet.
#[derive(Debug, Clone, Serialize)]
pub struct FoamTables {
    pub normalized: Table,
    pub wide: Table,
    /// Distinct SampleIDs in the normalized table.
    pub sample_count: usize,
    pub warnings: Vec<ScanWarning>,
    /// Text encoding the input was decoded from, for text sources.
    pub encoding: Option<&'static str>,
}

/// Main API entry point: read a sheet export and build both tables.
///
/// Every call starts from a fresh scan state; nothing is shared between calls.
pub fn process_bytes(
    bytes: &[u8],
    source: &dyn GridSource,
    profile: &ParserProfile,
) -> Result<FoamTables, FoamError> {
    let grid = source.read_grid(bytes)?;
    process_grid(&grid, profile)
}

/// Build both tables from an already-read grid.
pub fn process_grid(grid: &RawGrid, profile: &ParserProfile) -> Result<FoamTables, FoamError> {
    if grid.is_empty() {
        return Err(FoamError::EmptyInput);
    }

    let parsed: ParsedSheet = parse_grid(grid, profile);
    tracing::info!(
        profile = %profile.name,
        rows = grid.len(),
        formulations = parsed.formulations.len(),
        samples = parsed.samples.len(),
        skipped = parsed.skipped_rows.len(),
        "parsed sheet"
    );

    let normalized = build_normalized(&parsed, profile)?;
    let wide = build_wide(&normalized, profile)?;
    let sample_count = normalized.distinct_count(SAMPLE_ID);

    Ok(FoamTables {
        normalized,
        wide,
        sample_count,
        warnings: parsed.warnings,
        encoding: grid.encoding(),
    })
}
