pub mod classify;
pub mod columns;
pub mod fields;
pub mod scan;

use std::collections::BTreeSet;

use serde::Serialize;

use crate::extraction::RawGrid;
use crate::model::{Field, SampleRecord};
use crate::profile::schema::ParserProfile;
use scan::{FormulationRegistry, Scanner};

/// Everything recovered from one grid by a single scan.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ParsedSheet {
    pub formulations: FormulationRegistry,
    /// Day observations (and bare formulation rows) in sheet order.
    pub samples: Vec<SampleRecord>,
    /// Fields mapped by at least one column-header row.
    pub mapped_fields: BTreeSet<Field>,
    pub warnings: Vec<ScanWarning>,
    /// Non-blank rows that matched no row kind.
    pub skipped_rows: Vec<SkippedRow>,
}

/// Something the scan recovered from but the operator may want to see.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanWarning {
    /// Zero-based grid row.
    pub row: usize,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRow {
    pub row: usize,
    pub text: String,
}

/// Scan a grid top to bottom into formulations and sample records.
///
/// Never fails: unrecognized rows are skipped and recorded.
pub fn parse_grid(grid: &RawGrid, profile: &ParserProfile) -> ParsedSheet {
    Scanner::new(grid, profile).run()
}
