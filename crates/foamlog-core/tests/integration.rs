//! Integration tests for the process_bytes() end-to-end pipeline.
//!
//! Most tests use a MockSource that hands back a pre-built grid, so the
//! sheets can be written inline as rows of cells.

use foamlog_core::error::FoamError;
use foamlog_core::extraction::csv_text::CsvGridSource;
use foamlog_core::extraction::{GridSource, RawGrid};
use foamlog_core::model::Value;
use foamlog_core::profile::builtin::load_preset;
use foamlog_core::table::SampleMatch;
use foamlog_core::{parse_grid, process_bytes};
use rust_decimal_macros::dec;

struct MockSource {
    grid: RawGrid,
}

impl GridSource for MockSource {
    fn read_grid(&self, _bytes: &[u8]) -> Result<RawGrid, FoamError> {
        Ok(self.grid.clone())
    }

    fn backend_name(&self) -> &str {
        "mock"
    }
}

fn source(rows: &[&[&str]]) -> MockSource {
    MockSource {
        grid: RawGrid::from_rows(rows),
    }
}

fn text(s: &str) -> Value {
    Value::Text(s.into())
}

// ---------------------------------------------------------------------------
// Test 1: One formulation, one dilution, one day
// ---------------------------------------------------------------------------
#[test]
fn single_day_end_to_end() {
    let latest = load_preset("latest").unwrap();
    let src = source(&[
        &["5% HS, 2% Citric (S1)", "", "", ""],
        &["10X, 5mL tube", "", "", ""],
        &["", "Date", "Foam Amount", "Foam Texture"],
        &["Day 0", "1/1/24", "12", "fine"],
    ]);

    let tables = process_bytes(&[], &src, &latest).unwrap();
    let n = &tables.normalized;

    assert_eq!(n.len(), 1);
    assert_eq!(tables.sample_count, 1);
    assert_eq!(n.get(0, "SampleID"), Some(&text("S1")));
    assert_eq!(n.get(0, "Dilution"), Some(&text("10X")));
    assert_eq!(n.get(0, "Day"), Some(&text("Day 0")));
    assert_eq!(n.get(0, "Date"), Some(&text("1/1/24")));
    assert_eq!(n.get(0, "Foam (cc)"), Some(&Value::Number(dec!(12))));
    assert_eq!(n.get(0, "Foam Texture"), Some(&text("fine")));
    assert_eq!(n.get(0, "HS (%)"), Some(&Value::Number(dec!(5))));
    assert_eq!(n.get(0, "Citric (%)"), Some(&Value::Number(dec!(2))));
    assert_eq!(n.get(0, "Initial Foam Volume (cc)"), Some(&text("5cc")));
    assert_eq!(n.get(0, "Stable at 8C"), Some(&Value::Missing));
    assert_eq!(n.get(0, "time"), Some(&Value::Missing));

    assert_eq!(tables.wide.len(), 1);
    assert_eq!(
        tables.wide.get(0, "Day 0 - Amount (cc)"),
        Some(&Value::Number(dec!(12)))
    );
}

// ---------------------------------------------------------------------------
// Test 2: Each dilution section keeps its own tube volume and stability
// ---------------------------------------------------------------------------
#[test]
fn sections_keep_their_own_context() {
    let latest = load_preset("latest").unwrap();
    let src = source(&[
        &["5% HS (S1)", "stable at 8C", "unstable at 4C", ""],
        &["10X", "5 mL tube", "", ""],
        &["", "Date", "Foam Amount", "Foam Texture"],
        &["Day 0", "1/1/24", "12", "fine"],
        &["20X", "15 mL tube", "", ""],
        &["", "Date", "Foam Amount", "Foam Texture"],
        &["Day 0", "1/1/24", "9", "coarse"],
        &["3% HS (S2)", "unstable concentrate", "", ""],
        &["10X", "50 mL tube", "", ""],
        &["", "Date", "Foam Amount", "Foam Texture"],
        &["Day 0", "1/2/24", "4", "coarse"],
    ]);

    let tables = process_bytes(&[], &src, &latest).unwrap();
    let n = &tables.normalized;

    assert_eq!(n.len(), 3);
    assert_eq!(n.get(0, "Tube Volume (mL)"), Some(&text("5")));
    assert_eq!(n.get(1, "Tube Volume (mL)"), Some(&text("15")));
    assert_eq!(n.get(2, "Tube Volume (mL)"), Some(&text("50")));

    assert_eq!(n.get(0, "Stable at 8C"), Some(&Value::Flag(true)));
    assert_eq!(n.get(1, "Stable at 4C"), Some(&Value::Flag(false)));
    assert_eq!(n.get(2, "Stable at 8C"), Some(&Value::Flag(false)));
    assert_eq!(n.get(2, "Stable at 4C"), Some(&Value::Flag(false)));
    assert_eq!(n.get(2, "HS (%)"), Some(&Value::Number(dec!(3))));
    assert_eq!(tables.sample_count, 2);
}

// ---------------------------------------------------------------------------
// Test 3: Generated SampleIDs never collide
// ---------------------------------------------------------------------------
#[test]
fn fallback_ids_are_unique() {
    let latest = load_preset("latest").unwrap();
    let grid = RawGrid::from_rows(&[
        &["5% HS ("],
        &["2% HS (Sample_3)"],
        &["1% HS ()"],
        &["7% HS ()"],
    ]);

    let parsed = parse_grid(&grid, &latest);
    let ids: Vec<&str> = parsed
        .formulations
        .iter()
        .map(|f| f.sample_id.as_str())
        .collect();
    assert_eq!(ids, vec!["Sample_1", "Sample_3", "Sample_4", "Sample_5"]);
}

// ---------------------------------------------------------------------------
// Test 4: Unstable wins regardless of text order
// ---------------------------------------------------------------------------
#[test]
fn unstable_marker_is_sticky() {
    let latest = load_preset("latest").unwrap();
    for row in [
        ["5% HS (S1)", "unstable at 4C", "stable at 4C"],
        ["5% HS (S1)", "stable at 4C", "unstable at 4C"],
    ] {
        let grid = RawGrid::from_rows(&[&row]);
        let parsed = parse_grid(&grid, &latest);
        assert_eq!(parsed.samples[0].stability.at_4c, Some(false));
    }
}

// ---------------------------------------------------------------------------
// Test 5: Wide table has a column pair for every day up to the max
// ---------------------------------------------------------------------------
#[test]
fn wide_pivot_fills_day_gaps() {
    let latest = load_preset("latest").unwrap();
    let src = source(&[
        &["5% HS (S1)", "", "", "", ""],
        &["10X", "AFC", "", "", ""],
        &["", "Date", "Foam Amount", "Foam Texture", ""],
        &["Day 0", "1/1/24", "12", "fine", ""],
        &["Day 2", "1/3/24", "10", "fine", "*"],
        &["Day 5", "1/6/24", "6", "coarse", ""],
    ]);

    let tables = process_bytes(&[], &src, &latest).unwrap();
    let wide = &tables.wide;

    assert_eq!(wide.len(), 1);
    for day in [1, 3, 4] {
        let amount = format!("Day {day} - Amount (cc)");
        let texture = format!("Day {day} - Foam Texture");
        assert_eq!(wide.get(0, &amount), Some(&Value::Missing));
        assert_eq!(wide.get(0, &texture), Some(&text("")));
    }
    assert_eq!(wide.get(0, "Day 5 - Amount (cc)"), Some(&Value::Number(dec!(6))));
    assert_eq!(wide.get(0, "Date"), Some(&text("1/1/24")));
    assert_eq!(wide.get(0, "Baseline"), Some(&text("*")));
    assert_eq!(wide.get(0, "Pilot"), Some(&text("AFC")));
    assert!(wide.column_index("Day 6 - Amount (cc)").is_none());
}

// ---------------------------------------------------------------------------
// Test 6: Texture overflow row is merged, not emitted
// ---------------------------------------------------------------------------
#[test]
fn texture_continuation_merges_into_previous_day() {
    let latest = load_preset("latest").unwrap();
    let src = source(&[
        &["5% HS (S1)", "", "", ""],
        &["10X", "", "", ""],
        &["", "Date", "Foam Amount", "Foam Texture"],
        &["Day 0", "1/1/24", "12", "fine"],
        &["", "", "", "with large bubbles"],
        &["Day 1", "1/2/24", "11", "fine"],
    ]);

    let tables = process_bytes(&[], &src, &latest).unwrap();
    let n = &tables.normalized;
    assert_eq!(n.len(), 2);
    assert_eq!(
        n.get(0, "Foam Texture"),
        Some(&text("fine, with large bubbles"))
    );
}

// ---------------------------------------------------------------------------
// Test 7: Missing column header, per profile policy
// ---------------------------------------------------------------------------
#[test]
fn missing_header_policy_differs_between_presets() {
    let rows: &[&[&str]] = &[
        &["5% HS (S1)", "", "", ""],
        &["10X", "", "", ""],
        &["", "Date", "Foam Amount", "Foam Texture"],
        &["Day 0", "1/1/24", "12", "fine"],
        &["20X", "", "", ""],
        &["Day 0", "1/1/24", "8", "coarse"],
    ];
    let grid = RawGrid::from_rows(rows);

    let latest = parse_grid(&grid, &load_preset("latest").unwrap());
    assert_eq!(latest.samples[1].foam_cc, None);
    assert_eq!(latest.warnings.len(), 1);

    // legacy detects formulations by a leading percentage, which these rows also have
    let legacy = parse_grid(&grid, &load_preset("legacy").unwrap());
    assert_eq!(legacy.samples[1].foam_cc, Some(dec!(8)));
    assert_eq!(legacy.samples[1].foam_texture.as_deref(), Some("coarse"));
}

// ---------------------------------------------------------------------------
// Test 8: Legacy preset naming and numeric defaults
// ---------------------------------------------------------------------------
#[test]
fn legacy_preset_output_shape() {
    let legacy = load_preset("legacy").unwrap();
    let src = source(&[
        &["5% HS (S1)", "", "", "", ""],
        &["10X", "4C", "", "", ""],
        &["", "Date", "Foam Amount", "Foam Texture", "Water amount"],
        &["Day 0", "1/1/24", "12", "fine", "3"],
    ]);

    let tables = process_bytes(&[], &src, &legacy).unwrap();
    let n = &tables.normalized;
    assert_eq!(n.get(0, "Water (cc)"), Some(&Value::Number(dec!(3))));
    assert_eq!(n.get(0, "Dilution"), Some(&text("10X")));
    assert_eq!(
        n.get(0, "Temp Foam Monitoring"),
        Some(&Value::Number(dec!(4)))
    );
    assert_eq!(
        n.get(0, "Initial Foam Volume (cc)"),
        Some(&Value::Number(dec!(5)))
    );
}

// ---------------------------------------------------------------------------
// Test 9: Sheets without Day rows cannot be pivoted
// ---------------------------------------------------------------------------
#[test]
fn no_day_rows_is_assembly_error() {
    let latest = load_preset("latest").unwrap();
    let src = source(&[&["5% HS (S1)"], &["3% HS (S2)"]]);

    let err = process_bytes(&[], &src, &latest).unwrap_err();
    assert!(matches!(err, FoamError::Assembly(_)));
}

#[test]
fn empty_grid_is_rejected() {
    let latest = load_preset("latest").unwrap();
    let src = source(&[]);

    let err = process_bytes(&[], &src, &latest).unwrap_err();
    assert!(matches!(err, FoamError::EmptyInput));
}

// ---------------------------------------------------------------------------
// Test 10: CSV bytes through the real grid source, with the fallback encoding
// ---------------------------------------------------------------------------
#[test]
fn csv_source_with_windows_1252_bytes() {
    let latest = load_preset("latest").unwrap();
    let mut csv = b"5% HS (S1),,,\n10X,,,\n,Date,Foam Amount,Foam Texture\nDay 0,1/1/24,12,fine \xb5m\n".to_vec();
    csv.extend_from_slice(b"Day 1,1/2/24,11,fine\n");

    let tables = process_bytes(&csv, &CsvGridSource::new(), &latest).unwrap();
    assert_eq!(tables.encoding, Some("windows-1252"));
    assert_eq!(
        tables.normalized.get(0, "Foam Texture"),
        Some(&text("fine \u{b5}m"))
    );
    assert_eq!(tables.normalized.len(), 2);
}

// ---------------------------------------------------------------------------
// Test 11: SampleID lookup against both tables
// ---------------------------------------------------------------------------
#[test]
fn search_by_sample_id() {
    let latest = load_preset("latest").unwrap();
    let src = source(&[
        &["5% HS (S1)", "", "", ""],
        &["10X", "", "", ""],
        &["", "Date", "Foam Amount", "Foam Texture"],
        &["Day 0", "1/1/24", "12", "fine"],
        &["Day 1", "1/2/24", "11", "fine"],
        &["5% HS (S12)", "", "", ""],
        &["10X", "", "", ""],
        &["", "Date", "Foam Amount", "Foam Texture"],
        &["Day 0", "1/1/24", "10", "fine"],
    ]);

    let tables = process_bytes(&[], &src, &latest).unwrap();
    assert_eq!(
        tables.normalized.find_sample(" s1 ", SampleMatch::Exact).len(),
        2
    );
    assert_eq!(
        tables.normalized.find_sample("S1", SampleMatch::Contains).len(),
        3
    );
    assert_eq!(tables.wide.find_sample("s12", SampleMatch::Exact).len(), 1);
    assert!(tables.wide.find_sample("S3", SampleMatch::Contains).is_empty());
}

// ---------------------------------------------------------------------------
// Test 12: An explicit ID naming an already generated one keeps both formulations
// ---------------------------------------------------------------------------
#[test]
fn explicit_id_after_generated_keeps_chemistry_apart() {
    let latest = load_preset("latest").unwrap();
    let src = source(&[
        &["5% HS ()", "", "", ""],
        &["10X", "", "", ""],
        &["", "Date", "Foam Amount", "Foam Texture"],
        &["Day 0", "1/1/24", "12", "fine"],
        &["9% Citric (Sample_1)", "", "", ""],
    ]);

    let tables = process_bytes(&[], &src, &latest).unwrap();
    assert_eq!(tables.sample_count, 2);
    assert_eq!(tables.warnings.len(), 1);

    let hs = tables.normalized.find_sample("Sample_2", SampleMatch::Exact);
    assert_eq!(hs.len(), 1);
    assert_eq!(hs.get(0, "Day"), Some(&text("Day 0")));
    assert_eq!(hs.get(0, "HS (%)"), Some(&Value::Number(dec!(5))));
    assert_eq!(hs.get(0, "Citric (%)"), Some(&Value::Missing));

    let citric = tables.normalized.find_sample("Sample_1", SampleMatch::Exact);
    assert_eq!(citric.len(), 1);
    assert_eq!(citric.get(0, "Citric (%)"), Some(&Value::Number(dec!(9))));
    assert_eq!(citric.get(0, "HS (%)"), Some(&Value::Missing));
}

// ---------------------------------------------------------------------------
// Test 13: Day numbers past the profile limit stay in the normalized table only
// ---------------------------------------------------------------------------
#[test]
fn runaway_day_number_is_not_pivoted() {
    let latest = load_preset("latest").unwrap();
    let src = source(&[
        &["5% HS (S1)", "", "", ""],
        &["10X", "", "", ""],
        &["", "Date", "Foam Amount", "Foam Texture"],
        &["Day 0", "1/1/24", "12", "fine"],
        &["Day 4000000000", "1/2/24", "11", "fine"],
        &["Day 99999999999", "1/3/24", "10", "fine"],
    ]);

    let tables = process_bytes(&[], &src, &latest).unwrap();
    assert_eq!(tables.normalized.len(), 3);
    assert_eq!(tables.warnings.len(), 2);
    assert_eq!(tables.warnings[0].row, 4);
    assert_eq!(tables.wide.len(), 1);
    assert!(tables.wide.column_index("Day 1 - Amount (cc)").is_none());
    assert_eq!(
        tables.wide.get(0, "Day 0 - Amount (cc)"),
        Some(&Value::Number(dec!(12)))
    );
}
