use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::extraction::RawGrid;
use crate::profile::schema::FormulationRule;

static DAY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*day\s*(\d+)").expect("valid regex"));
static DILUTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(\d+)\s*x\b").expect("valid regex"));
static LEADING_PERCENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\d+(?:\.\d+)?\s*%").expect("valid regex"));

/// What a spreadsheet row holds, decided from its content alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RowKind {
    FormulationHeader,
    DayObservation,
    DilutionMarker,
    Unclassified,
}

/// Classify one row. Rules are tried in precedence order; first match wins.
///
/// Column-header rows are not a kind of their own: they are located relative
/// to a dilution marker by the scan engine.
pub fn classify_row(grid: &RawGrid, row: usize, rule: FormulationRule) -> RowKind {
    let first = grid.cell(row, 0);

    if is_formulation_header(first, rule) {
        RowKind::FormulationHeader
    } else if is_day_label(first) {
        RowKind::DayObservation
    } else if has_dilution_marker(&grid.joined_lower(row)) {
        RowKind::DilutionMarker
    } else {
        RowKind::Unclassified
    }
}

pub fn is_formulation_header(cell: &str, rule: FormulationRule) -> bool {
    match rule {
        FormulationRule::ParenthesizedAmount => {
            let lower = cell.to_lowercase();
            (lower.contains('%') || lower.contains("ppm")) && lower.contains('(')
        }
        FormulationRule::LeadingPercent => LEADING_PERCENT_RE.is_match(cell),
    }
}

pub fn is_day_label(cell: &str) -> bool {
    DAY_RE.is_match(cell)
}

/// Day number of a "Day N" label; `None` when the number does not fit a `u32`.
pub fn day_index(cell: &str) -> Option<u32> {
    DAY_RE.captures(cell).and_then(|c| c[1].parse().ok())
}

pub fn has_dilution_marker(text: &str) -> bool {
    DILUTION_RE.is_match(text)
}

/// Base ratio token such as "10X" from the first marker in the text.
pub fn base_dilution_token(text: &str) -> Option<String> {
    DILUTION_RE
        .captures(text)
        .map(|c| format!("{}X", &c[1]))
}
