//! Normalized (long) table: one row per sample, dilution and day.

pub mod pivot;

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;

use crate::error::FoamError;
use crate::model::{Field, Formulation, SampleRecord, Value};
use crate::parsing::fields::{
    clean_dilution_text, dilution_ratio, foam_volume_cc, monitoring_temperature, pilot_flag,
    sonication, strip_temperature,
};
use crate::parsing::ParsedSheet;
use crate::profile::schema::{InitialFoamVolume, ParserProfile};
use crate::table::{Table, SAMPLE_ID};

static TUBE_SUFFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)mL\s*tube").expect("valid regex"));

pub const DILUTION: &str = "Dilution";
pub const DAY: &str = "Day";
pub const DATE: &str = "Date";
pub const FOAM_CC: &str = "Foam (cc)";
pub const FOAM_TEXTURE: &str = "Foam Texture";
pub const BASELINE: &str = "Baseline";
pub const STABLE_8C: &str = "Stable at 8C";
pub const STABLE_4C: &str = "Stable at 4C";
pub const TUBE_VOLUME: &str = "Tube Volume (mL)";
pub const PILOT: &str = "Pilot";
pub const TEMP_MONITORING: &str = "Temp Foam Monitoring";
pub const INITIAL_FOAM_VOLUME: &str = "Initial Foam Volume (cc)";
pub const RATIO: &str = "Ratio";
pub const SONICATED: &str = "Sonicated";
pub const TIME: &str = "time";

/// Values derived from a dilution label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DilutionAnnotations {
    pub pilot: Option<&'static str>,
    pub temperature: Option<i64>,
    pub initial_foam_volume: Value,
    /// Label with separators trimmed (and the temperature removed when the profile asks).
    pub cleaned: String,
    pub ratio: Option<Decimal>,
    pub sonicated: Option<bool>,
}

impl DilutionAnnotations {
    pub fn from_label(label: &str, profile: &ParserProfile) -> Self {
        let volume = foam_volume_cc(label);
        let cleaned = if profile.strip_temperature_from_dilution {
            clean_dilution_text(&strip_temperature(label))
        } else {
            clean_dilution_text(label)
        };

        DilutionAnnotations {
            pilot: pilot_flag(label),
            temperature: monitoring_temperature(label),
            initial_foam_volume: initial_foam_volume(volume.as_deref(), profile.initial_foam_volume),
            cleaned,
            ratio: dilution_ratio(label),
            sonicated: sonication(label),
        }
    }
}

/// "Initial Foam Volume (cc)": the matched digits, or 5 when the label names no volume.
pub fn initial_foam_volume(matched: Option<&str>, kind: InitialFoamVolume) -> Value {
    match (kind, matched) {
        (InitialFoamVolume::Text, Some(digits)) => Value::Text(digits.to_string()),
        (InitialFoamVolume::Text, None) => Value::Text("5cc".into()),
        (InitialFoamVolume::Numeric, Some(digits)) => digits
            .parse::<Decimal>()
            .map_or(Value::Missing, Value::Number),
        (InitialFoamVolume::Numeric, None) => Value::Number(Decimal::from(5)),
    }
}

/// Tube volume with the "mL tube" unit suffix removed.
pub fn clean_tube_volume(raw: &str) -> Option<String> {
    let cleaned = TUBE_SUFFIX_RE.replace_all(raw, "");
    let cleaned = cleaned.trim();
    (!cleaned.is_empty()).then(|| cleaned.to_string())
}

/// Build the normalized table: every sample record left-joined with its formulation.
///
/// Column order is SampleID, Dilution, Day, Date, the foam columns, the mapped
/// measurement columns, Baseline, stability, tube volume, the chemical keys in
/// first-seen order, then the dilution-derived columns.
pub fn build_normalized(parsed: &ParsedSheet, profile: &ParserProfile) -> Result<Table, FoamError> {
    if parsed.samples.is_empty() {
        return Err(FoamError::Assembly(
            "no formulation or day rows were recognised in the sheet".into(),
        ));
    }

    let measurements: Vec<Field> = Field::MEASUREMENTS
        .into_iter()
        .filter(|f| parsed.mapped_fields.contains(f))
        .collect();
    let chemicals = chemical_keys(parsed.formulations.iter());

    let mut columns: Vec<String> = [SAMPLE_ID, DILUTION, DAY, DATE, FOAM_CC, FOAM_TEXTURE]
        .into_iter()
        .map(String::from)
        .collect();
    columns.extend(
        measurements
            .iter()
            .map(|f| f.column_name(&profile.liquid_column.label).to_string()),
    );
    columns.extend([BASELINE, STABLE_8C, STABLE_4C, TUBE_VOLUME].map(String::from));
    columns.extend(chemicals.iter().cloned());
    columns.extend(
        [PILOT, TEMP_MONITORING, INITIAL_FOAM_VOLUME, RATIO, SONICATED, TIME].map(String::from),
    );

    let mut table = Table::new(columns);
    let mut seen = HashSet::new();
    let mut duplicates = 0usize;

    for record in &parsed.samples {
        let formulation = record
            .sample_id
            .as_deref()
            .and_then(|id| parsed.formulations.get(id));
        let row = normalized_row(record, formulation, &measurements, &chemicals, profile);

        if seen.insert(row.clone()) {
            table.push_row(row);
        } else {
            duplicates += 1;
        }
    }

    tracing::info!(rows = table.len(), duplicates, "built normalized table");
    Ok(table)
}

fn chemical_keys<'a>(formulations: impl Iterator<Item = &'a Formulation>) -> Vec<String> {
    let mut keys: Vec<String> = Vec::new();
    for formulation in formulations {
        for entry in formulation.composition.iter() {
            if !keys.contains(&entry.key) {
                keys.push(entry.key.clone());
            }
        }
    }
    keys
}

fn normalized_row(
    record: &SampleRecord,
    formulation: Option<&Formulation>,
    measurements: &[Field],
    chemicals: &[String],
    profile: &ParserProfile,
) -> Vec<Value> {
    let annotations = record
        .dilution
        .as_deref()
        .map(|label| DilutionAnnotations::from_label(label, profile));

    let mut row = vec![
        Value::text(record.sample_id.as_deref()),
        Value::text(annotations.as_ref().map(|a| a.cleaned.as_str())),
        Value::text(record.day.as_ref().map(|d| d.raw.as_str())),
        Value::text(record.date.as_deref()),
        Value::number(record.foam_cc),
        Value::text(record.foam_texture.as_deref()),
    ];
    row.extend(
        measurements
            .iter()
            .map(|&f| Value::number(record.measurement(f))),
    );
    row.extend([
        Value::text(record.baseline.as_deref()),
        Value::flag(record.stability.at_8c),
        Value::flag(record.stability.at_4c),
        Value::text(record.tube_volume.as_deref().and_then(clean_tube_volume).as_deref()),
    ]);
    row.extend(chemicals.iter().map(|key| {
        Value::number(formulation.and_then(|f| f.composition.get(key)))
    }));

    // Whole-word match first; any AFC inside the cleaned label ("AFCx") counts too.
    let pilot = annotations.as_ref().and_then(|a| {
        a.pilot
            .or_else(|| a.cleaned.to_uppercase().contains("AFC").then_some("AFC"))
    });

    row.extend([
        Value::text(pilot),
        Value::number(annotations.as_ref().and_then(|a| a.temperature).map(Decimal::from)),
        annotations
            .as_ref()
            .map_or_else(
                || initial_foam_volume(None, profile.initial_foam_volume),
                |a| a.initial_foam_volume.clone(),
            ),
        Value::number(annotations.as_ref().and_then(|a| a.ratio)),
        Value::flag(annotations.as_ref().and_then(|a| a.sonicated)),
        Value::Missing,
    ]);
    row
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::RawGrid;
    use crate::parsing::parse_grid;
    use rust_decimal_macros::dec;

    fn legacy() -> ParserProfile {
        ParserProfile {
            name: "legacy".into(),
            initial_foam_volume: InitialFoamVolume::Numeric,
            strip_temperature_from_dilution: true,
            ..Default::default()
        }
    }

    fn normalized(rows: &[&[&str]]) -> Table {
        let grid = RawGrid::from_rows(rows);
        let profile = ParserProfile::default();
        build_normalized(&parse_grid(&grid, &profile), &profile).unwrap()
    }

    #[test]
    fn test_annotations_latest() {
        let a = DilutionAnnotations::from_label("10X AFC 8C 10cc (2:5) ratio sonicated", &ParserProfile::default());
        assert_eq!(a.pilot, Some("AFC"));
        assert_eq!(a.temperature, Some(8));
        assert_eq!(a.initial_foam_volume, Value::Text("10".into()));
        assert_eq!(a.cleaned, "10X AFC 8C 10cc (2:5) ratio sonicated");
        assert_eq!(a.ratio, Some(dec!(2.5)));
        assert_eq!(a.sonicated, Some(true));
    }

    #[test]
    fn test_annotations_legacy_strip_and_numeric() {
        let a = DilutionAnnotations::from_label("20X, 4C", &legacy());
        assert_eq!(a.temperature, Some(4));
        assert_eq!(a.cleaned, "20X");
        assert_eq!(a.initial_foam_volume, Value::Number(dec!(5)));
    }

    #[test]
    fn test_initial_volume_defaults() {
        assert_eq!(
            initial_foam_volume(None, InitialFoamVolume::Text),
            Value::Text("5cc".into())
        );
        assert_eq!(
            initial_foam_volume(Some("15"), InitialFoamVolume::Numeric),
            Value::Number(dec!(15))
        );
    }

    #[test]
    fn test_tube_volume_suffix() {
        assert_eq!(clean_tube_volume("15 mL tube").as_deref(), Some("15"));
        assert_eq!(clean_tube_volume("5mltube").as_deref(), Some("5"));
        assert_eq!(clean_tube_volume("50 mL").as_deref(), Some("50 mL"));
        assert_eq!(clean_tube_volume("mL tube"), None);
    }

    #[test]
    fn test_left_join_keeps_orphan_day_rows() {
        let table = normalized(&[&["Day 0", "1/1/24"]]);
        assert_eq!(table.len(), 1);
        assert_eq!(table.get(0, SAMPLE_ID), Some(&Value::Missing));
        assert_eq!(table.get(0, DATE), Some(&Value::Text("1/1/24".into())));
    }

    #[test]
    fn test_exact_duplicates_dropped() {
        let table = normalized(&[
            &["5% HS (S1)", "", "", ""],
            &["10X", "", "", ""],
            &["", "Date", "Foam Amount", "Foam Texture"],
            &["Day 0", "1/1/24", "12", "fine"],
            &["Day 0", "1/1/24", "12", "fine"],
            &["Day 1", "1/2/24", "10", "fine"],
        ]);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_pilot_recomputed_from_label_text() {
        let table = normalized(&[
            &["5% HS (S1)", "", "", ""],
            &["10X", "AFCx", "", ""],
            &["", "Date", "Foam Amount", "Foam Texture"],
            &["Day 0", "1/1/24", "12", "fine"],
        ]);
        // No whole-word AFC, but the label still contains it
        assert_eq!(table.get(0, PILOT), Some(&Value::Text("AFC".into())));
    }

    #[test]
    fn test_measurement_columns_only_when_mapped() {
        let table = normalized(&[
            &["5% HS (S1)", "", "", "", ""],
            &["10X", "", "", "", ""],
            &["", "Date", "Foam Amount", "Foam Texture", "Zeta (mV)"],
            &["Day 0", "1/1/24", "12", "fine", "-31.2"],
        ]);
        assert_eq!(table.get(0, "Zeta"), Some(&Value::Number(dec!(-31.2))));
        assert!(table.column_index("Size").is_none());
        assert!(table.column_index("Liquid Amount").is_none());
    }

    #[test]
    fn test_time_column_always_missing() {
        let table = normalized(&[&["5% HS (S1)"]]);
        assert_eq!(table.get(0, TIME), Some(&Value::Missing));
        assert_eq!(
            table.get(0, INITIAL_FOAM_VOLUME),
            Some(&Value::Text("5cc".into()))
        );
    }

    #[test]
    fn test_nothing_recognised_is_an_error() {
        let grid = RawGrid::from_rows(&[&["hello", "world"]]);
        let profile = ParserProfile::default();
        let err = build_normalized(&parse_grid(&grid, &profile), &profile).unwrap_err();
        assert!(matches!(err, FoamError::Assembly(_)));
    }
}
