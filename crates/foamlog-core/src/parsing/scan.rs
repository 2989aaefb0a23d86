//! The row scan: classify each row, dispatch on its kind, carry context forward.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::extraction::RawGrid;
use crate::model::{DayLabel, Field, Formulation, SampleRecord, StabilityFlags};
use crate::parsing::classify::{
    base_dilution_token, classify_row, day_index, has_dilution_marker, RowKind,
};
use crate::parsing::columns::ColumnMap;
use crate::parsing::fields::{
    extract_sample_id, is_blank, parse_composition, parse_number, scan_stability,
};
use crate::parsing::{ParsedSheet, ScanWarning, SkippedRow};
use crate::profile::schema::{MissingHeaderPolicy, ParserProfile};

/// Formulations in order of first registration, keyed by SampleID.
///
/// Generated `Sample_<n>` IDs are remembered so an explicit ID that later
/// spells the same name can be told apart from them.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FormulationRegistry {
    formulations: Vec<Formulation>,
    #[serde(skip)]
    generated: BTreeSet<String>,
}

impl FormulationRegistry {
    /// Register a formulation, replacing (in place) any earlier one with the same SampleID.
    ///
    /// Returns the replaced formulation.
    pub fn register(&mut self, formulation: Formulation) -> Option<Formulation> {
        match self
            .formulations
            .iter_mut()
            .find(|f| f.sample_id == formulation.sample_id)
        {
            Some(existing) => Some(std::mem::replace(existing, formulation)),
            None => {
                self.formulations.push(formulation);
                None
            }
        }
    }

    /// Register a formulation under an ID produced by `fallback_id`.
    pub fn register_generated(&mut self, formulation: Formulation) -> Option<Formulation> {
        self.generated.insert(formulation.sample_id.clone());
        self.register(formulation)
    }

    pub fn is_generated(&self, sample_id: &str) -> bool {
        self.generated.contains(sample_id)
    }

    /// Move a formulation to a new SampleID, keeping its position.
    pub fn rename(&mut self, from: &str, to: &str) -> bool {
        let Some(formulation) = self.formulations.iter_mut().find(|f| f.sample_id == from) else {
            return false;
        };
        formulation.sample_id = to.to_string();
        if self.generated.remove(from) {
            self.generated.insert(to.to_string());
        }
        true
    }

    pub fn get(&self, sample_id: &str) -> Option<&Formulation> {
        self.formulations.iter().find(|f| f.sample_id == sample_id)
    }

    pub fn contains(&self, sample_id: &str) -> bool {
        self.get(sample_id).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Formulation> {
        self.formulations.iter()
    }

    pub fn len(&self) -> usize {
        self.formulations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.formulations.is_empty()
    }

    /// Generated ID for a formulation without one: `Sample_<registered + 1>`,
    /// moved past any ID already taken.
    pub fn fallback_id(&self) -> String {
        let mut n = self.len() + 1;
        loop {
            let id = format!("Sample_{n}");
            if !self.contains(&id) {
                return id;
            }
            n += 1;
        }
    }
}

/// Context carried across rows.
///
/// Every context change goes through `begin_formulation` or `begin_dilution`,
/// which commit the buffered day rows before anything is overwritten.
#[derive(Debug, Clone, Default)]
pub struct ScanState {
    formulation: Option<String>,
    dilution: Option<String>,
    tube_volume: Option<String>,
    stability: StabilityFlags,
    columns: ColumnMap,
    pending: Vec<SampleRecord>,
}

impl ScanState {
    pub fn formulation(&self) -> Option<&str> {
        self.formulation.as_deref()
    }

    pub fn dilution(&self) -> Option<&str> {
        self.dilution.as_deref()
    }

    pub fn stability(&self) -> StabilityFlags {
        self.stability
    }

    pub fn columns(&self) -> &ColumnMap {
        &self.columns
    }

    pub fn pending(&self) -> &[SampleRecord] {
        &self.pending
    }

    /// Point the active formulation and its buffered rows at a new SampleID.
    pub fn rename_formulation(&mut self, from: &str, to: &str) {
        if self.formulation.as_deref() == Some(from) {
            self.formulation = Some(to.to_string());
        }
        for record in &mut self.pending {
            if record.sample_id.as_deref() == Some(from) {
                record.sample_id = Some(to.to_string());
            }
        }
    }

    pub fn buffer(&mut self, record: SampleRecord) {
        self.pending.push(record);
    }

    /// Stamp buffered rows with the active section's stability and tube
    /// volume and move them into `samples`. Returns how many were moved.
    pub fn flush(&mut self, samples: &mut Vec<SampleRecord>) -> usize {
        let count = self.pending.len();
        for mut record in self.pending.drain(..) {
            record.stability = self.stability;
            record.tube_volume = self.tube_volume.clone();
            samples.push(record);
        }
        count
    }

    pub fn begin_formulation(
        &mut self,
        samples: &mut Vec<SampleRecord>,
        sample_id: String,
        stability: StabilityFlags,
    ) {
        self.flush(samples);
        self.formulation = Some(sample_id);
        self.stability = stability;
    }

    pub fn begin_dilution(
        &mut self,
        samples: &mut Vec<SampleRecord>,
        dilution: String,
        tube_volume: Option<String>,
        columns: Option<ColumnMap>,
        policy: MissingHeaderPolicy,
    ) {
        self.flush(samples);
        self.dilution = Some(dilution);
        self.tube_volume = tube_volume;
        match (columns, policy) {
            (Some(columns), _) => self.columns = columns,
            (None, MissingHeaderPolicy::Unmapped) => self.columns = ColumnMap::default(),
            (None, MissingHeaderPolicy::ReuseLast) => {}
        }
    }
}

/// Single-pass scanner over one grid. Owns all state for one document.
pub struct Scanner<'a> {
    grid: &'a RawGrid,
    profile: &'a ParserProfile,
    state: ScanState,
    registry: FormulationRegistry,
    samples: Vec<SampleRecord>,
    mapped_fields: BTreeSet<Field>,
    warnings: Vec<ScanWarning>,
    skipped_rows: Vec<SkippedRow>,
}

impl<'a> Scanner<'a> {
    pub fn new(grid: &'a RawGrid, profile: &'a ParserProfile) -> Self {
        Scanner {
            grid,
            profile,
            state: ScanState::default(),
            registry: FormulationRegistry::default(),
            samples: Vec::new(),
            mapped_fields: BTreeSet::new(),
            warnings: Vec::new(),
            skipped_rows: Vec::new(),
        }
    }

    pub fn run(mut self) -> ParsedSheet {
        let mut row = 0;
        while row < self.grid.len() {
            let kind = classify_row(self.grid, row, self.profile.formulation_rule);
            tracing::trace!(row, ?kind, "classified row");

            row += match kind {
                RowKind::FormulationHeader => self.on_formulation(row),
                RowKind::DilutionMarker => self.on_dilution(row),
                RowKind::DayObservation => self.on_day(row),
                RowKind::Unclassified => self.on_unclassified(row),
            };
        }

        self.state.flush(&mut self.samples);

        tracing::debug!(
            formulations = self.registry.len(),
            samples = self.samples.len(),
            warnings = self.warnings.len(),
            "scan finished"
        );

        ParsedSheet {
            formulations: self.registry,
            samples: self.samples,
            mapped_fields: self.mapped_fields,
            warnings: self.warnings,
            skipped_rows: self.skipped_rows,
        }
    }

    fn warn(&mut self, row: usize, reason: String) {
        tracing::warn!(row, "{reason}");
        self.warnings.push(ScanWarning { row, reason });
    }

    fn on_formulation(&mut self, row: usize) -> usize {
        let grid = self.grid;
        let text = grid.cell(row, 0);

        let window_end = (self.profile.stability_window + 1).min(grid.width());
        let stability = scan_stability(text, (1..window_end).map(|col| grid.cell(row, col)));

        let explicit = extract_sample_id(text);
        if let Some(id) = explicit.as_deref() {
            if self.registry.is_generated(id) {
                self.move_generated(row, id);
            }
        }
        let generated = explicit.is_none();
        let sample_id = explicit.unwrap_or_else(|| self.registry.fallback_id());
        let formulation = Formulation {
            sample_id: sample_id.clone(),
            composition: parse_composition(text),
        };
        tracing::debug!(
            row,
            sample_id = %sample_id,
            generated,
            chemicals = formulation.composition.len(),
            "formulation header"
        );

        let replaced = if generated {
            self.registry.register_generated(formulation)
        } else {
            self.registry.register(formulation)
        };
        if replaced.is_some() {
            self.warn(
                row,
                format!("formulation '{sample_id}' replaces an earlier one with the same SampleID"),
            );
        }

        self.state
            .begin_formulation(&mut self.samples, sample_id.clone(), stability);

        // A formulation with no dilution section still produces one row.
        if !has_dilution_marker(&grid.joined_lower(row + 1)) {
            self.samples.push(SampleRecord {
                sample_id: Some(sample_id),
                stability,
                ..Default::default()
            });
        }

        1
    }

    /// An explicit SampleID took the name of a generated one: give the
    /// generated formulation and every row already tagged with it a fresh ID.
    fn move_generated(&mut self, row: usize, sample_id: &str) {
        let fresh = self.registry.fallback_id();
        self.registry.rename(sample_id, &fresh);
        self.state.rename_formulation(sample_id, &fresh);
        for record in &mut self.samples {
            if record.sample_id.as_deref() == Some(sample_id) {
                record.sample_id = Some(fresh.clone());
            }
        }
        self.warn(
            row,
            format!("explicit SampleID '{sample_id}' was already generated; earlier formulation renamed to '{fresh}'"),
        );
    }

    fn on_dilution(&mut self, row: usize) -> usize {
        let grid = self.grid;
        let text = grid.joined_lower(row);
        let base = base_dilution_token(&text).unwrap_or_default();

        let mut labels = Vec::new();
        let mut tube_volume = None;
        let window_end = (self.profile.dilution_window + 1).min(grid.width());
        for col in 1..window_end {
            let val = grid.cell(row, col);
            if is_blank(val) {
                continue;
            }
            if val.to_lowercase().contains("ml") {
                tube_volume = Some(val.to_string());
            } else if val.replace(' ', "").to_uppercase() != base {
                labels.push(val);
            }
        }

        let dilution = if labels.is_empty() {
            base
        } else {
            format!("{base} {}", labels.join(" "))
        };

        let (header_row, consumed) = if text.contains("foam") {
            (Some(row), 1)
        } else if row + 1 < grid.len() && grid.joined_lower(row + 1).contains("foam") {
            (Some(row + 1), 2)
        } else {
            (None, 1)
        };

        let columns = header_row
            .map(|h| ColumnMap::from_header(grid, h, &self.profile.liquid_column));
        match &columns {
            Some(map) => self.mapped_fields.extend(map.fields()),
            None => self.warn(
                row,
                format!(
                    "dilution '{dilution}' has no column-header row; column map {}",
                    match self.profile.missing_header {
                        MissingHeaderPolicy::Unmapped => "cleared",
                        MissingHeaderPolicy::ReuseLast => "kept from the previous header",
                    }
                ),
            ),
        }

        tracing::debug!(
            row,
            dilution = %dilution,
            tube_volume = tube_volume.as_deref().unwrap_or(""),
            header_row,
            "dilution marker"
        );

        self.state.begin_dilution(
            &mut self.samples,
            dilution,
            tube_volume,
            columns,
            self.profile.missing_header,
        );

        consumed
    }

    fn on_day(&mut self, row: usize) -> usize {
        let grid = self.grid;
        let label = grid.cell(row, 0);

        if self.state.formulation().is_none() {
            self.warn(
                row,
                format!("'{label}' appears before any formulation header"),
            );
        }

        let index = day_index(label);
        match index {
            None => self.warn(
                row,
                format!("'{label}' has a day number too large to index; left out of the wide table"),
            ),
            Some(day) if day > self.profile.max_day => self.warn(
                row,
                format!(
                    "'{label}' is past the last pivoted day ({}); left out of the wide table",
                    self.profile.max_day
                ),
            ),
            Some(_) => {}
        }

        let columns = self.state.columns();
        let texture_col = columns.get(Field::FoamTexture);
        let date_col = columns.get(Field::Date).unwrap_or(1);

        let mut record = SampleRecord {
            sample_id: self.state.formulation().map(str::to_string),
            dilution: self.state.dilution().map(str::to_string),
            day: Some(DayLabel {
                raw: label.to_string(),
                index,
            }),
            date: text_cell(grid.cell(row, date_col)),
            foam_texture: texture_col.and_then(|col| text_cell(grid.cell(row, col))),
            ..Default::default()
        };

        for field in std::iter::once(Field::FoamAmount).chain(Field::MEASUREMENTS) {
            if let Some(col) = columns.get(field) {
                record.set_measurement(field, parse_number(grid.cell(row, col)));
            }
        }

        // Baseline markers are asterisks anywhere right of the texture column.
        let start = texture_col.map_or(1, |col| col + 1);
        let stars: Vec<&str> = (start..grid.width())
            .filter(|&col| grid.cell(row, col).contains('*'))
            .map(|_| "*")
            .collect();
        if !stars.is_empty() {
            record.baseline = Some(stars.join(", "));
        }

        let mut consumed = 1;
        if let [(col, extra)] = grid.non_empty_cells(row + 1).as_slice() {
            if Some(*col) == texture_col {
                record.foam_texture = Some(match record.foam_texture.take() {
                    Some(existing) => format!("{existing}, {extra}"),
                    None => extra.to_string(),
                });
                consumed = 2;
            }
        }

        self.state.buffer(record);
        consumed
    }

    fn on_unclassified(&mut self, row: usize) -> usize {
        if !self.grid.non_empty_cells(row).is_empty() {
            self.skipped_rows.push(SkippedRow {
                row,
                text: self.grid.joined_lower(row),
            });
        }
        1
    }
}

fn text_cell(cell: &str) -> Option<String> {
    (!is_blank(cell)).then(|| cell.to_string())
}
