use std::collections::BTreeMap;

use crate::extraction::RawGrid;
use crate::model::Field;
use crate::profile::schema::LiquidColumn;

/// Semantic field -> column index, taken from the latest header row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMap {
    indices: BTreeMap<Field, usize>,
}

impl ColumnMap {
    /// Build a map from one header row.
    ///
    /// Each cell is assigned to the first field it matches; when several
    /// cells match the same field the last one wins.
    pub fn from_header(grid: &RawGrid, row: usize, liquid: &LiquidColumn) -> Self {
        let mut indices = BTreeMap::new();
        for col in 0..grid.width() {
            let val = grid.cell(row, col).to_lowercase();
            if let Some(field) = match_header(&val, liquid) {
                indices.insert(field, col);
            }
        }
        ColumnMap { indices }
    }

    pub fn get(&self, field: Field) -> Option<usize> {
        self.indices.get(&field).copied()
    }

    pub fn fields(&self) -> impl Iterator<Item = Field> + '_ {
        self.indices.keys().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

fn match_header(val: &str, liquid: &LiquidColumn) -> Option<Field> {
    if val.is_empty() {
        return None;
    }
    if val.contains("foam amount") || (val.contains("foam") && val.contains("cc")) {
        Some(Field::FoamAmount)
    } else if val.contains("texture") {
        Some(Field::FoamTexture)
    } else if val.contains("zeta") {
        Some(Field::Zeta)
    } else if val.contains("pi") {
        Some(Field::Pi)
    } else if val.contains("conductivity") {
        Some(Field::Conductivity)
    } else if val.contains("size") {
        Some(Field::Size)
    } else if liquid.keywords.iter().any(|k| val.contains(k.as_str())) {
        Some(Field::Liquid)
    } else if val.contains("date") {
        Some(Field::Date)
    } else {
        None
    }
}
