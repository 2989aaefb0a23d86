//! Wide table: one row per (SampleID, Dilution), day observations spread across columns.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::assemble::{BASELINE, DATE, DAY, DILUTION, FOAM_CC, FOAM_TEXTURE, PILOT};
use crate::error::FoamError;
use crate::model::Value;
use crate::profile::schema::ParserProfile;
use crate::table::{Table, SAMPLE_ID};

static DAY_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+").expect("valid regex"));

/// Columns that the pivot rebuilds itself instead of copying.
const PIVOTED: [&str; 7] = [SAMPLE_ID, DAY, FOAM_CC, FOAM_TEXTURE, DATE, BASELINE, PILOT];

pub fn day_amount_column(day: u32) -> String {
    format!("Day {day} - Amount (cc)")
}

pub fn day_texture_column(day: u32) -> String {
    format!("Day {day} - Foam Texture")
}

/// Pivot the normalized table.
///
/// Rows without a Day, or past the profile's `max_day`, are ignored. Groups
/// missing either key are dropped; the rest come out sorted by SampleID, then
/// Dilution. Every day from 0 to the highest day seen anywhere gets an amount
/// and texture column.
pub fn build_wide(normalized: &Table, profile: &ParserProfile) -> Result<Table, FoamError> {
    let col = |name: &str| {
        normalized
            .column_index(name)
            .ok_or_else(|| FoamError::Assembly(format!("normalized table has no '{name}' column")))
    };
    let sample_col = col(SAMPLE_ID)?;
    let dilution_col = col(DILUTION)?;
    let day_col = col(DAY)?;
    let date_col = col(DATE)?;
    let foam_col = col(FOAM_CC)?;
    let texture_col = col(FOAM_TEXTURE)?;
    let baseline_col = col(BASELINE)?;
    let pilot_col = col(PILOT)?;

    let dated: Vec<(u32, &Vec<Value>)> = normalized
        .rows
        .iter()
        .filter_map(|row| {
            let label = row[day_col].as_text()?;
            let day: u32 = DAY_NUMBER_RE.find(label)?.as_str().parse().ok()?;
            (day <= profile.max_day).then_some((day, row))
        })
        .collect();

    let Some(max_day) = dated.iter().map(|(day, _)| *day).max() else {
        return Err(FoamError::Assembly(
            "no Day rows within the pivoted range; nothing to pivot".into(),
        ));
    };

    let mut groups: BTreeMap<(String, String), Vec<(u32, &Vec<Value>)>> = BTreeMap::new();
    for &(day, row) in &dated {
        let (Some(sample), Some(dilution)) = (row[sample_col].as_text(), row[dilution_col].as_text())
        else {
            continue;
        };
        groups
            .entry((sample.to_string(), dilution.to_string()))
            .or_default()
            .push((day, row));
    }

    let carried: Vec<usize> = (0..normalized.columns.len())
        .filter(|&i| i != dilution_col && !PIVOTED.contains(&normalized.columns[i].as_str()))
        .collect();

    let mut columns = vec![SAMPLE_ID.to_string(), DILUTION.to_string()];
    columns.extend(carried.iter().map(|&i| normalized.columns[i].clone()));
    columns.extend([DATE, BASELINE, PILOT].map(String::from));
    for day in 0..=max_day {
        columns.push(day_amount_column(day));
        columns.push(day_texture_column(day));
    }

    let mut wide = Table::new(columns);
    for ((sample, dilution), rows) in &groups {
        let first_present = |i: usize| {
            rows.iter()
                .map(|(_, r)| &r[i])
                .find(|v| !v.is_missing())
                .cloned()
        };

        let mut out = vec![Value::Text(sample.clone()), Value::Text(dilution.clone())];
        out.extend(carried.iter().map(|&i| first_present(i).unwrap_or_default()));

        out.push(
            rows.iter()
                .find(|(day, _)| *day == 0)
                .map(|(_, r)| r[date_col].clone())
                .unwrap_or_default(),
        );
        let any_baseline = rows
            .iter()
            .any(|(_, r)| r[baseline_col].to_string().contains('*'));
        out.push(Value::Text(if any_baseline { "*" } else { "" }.into()));
        out.push(first_present(pilot_col).unwrap_or_else(|| Value::Text(String::new())));

        for day in 0..=max_day {
            match rows.iter().find(|(d, _)| *d == day) {
                Some((_, r)) => {
                    out.push(r[foam_col].clone());
                    out.push(r[texture_col].clone());
                }
                None => {
                    out.push(Value::Missing);
                    out.push(Value::Text(String::new()));
                }
            }
        }

        wide.push_row(out);
    }

    tracing::info!(rows = wide.len(), max_day, "built wide table");
    Ok(wide)
}
