use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One cell of an output table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Missing,
    Text(String),
    Number(Decimal),
    Flag(bool),
}

impl Value {
    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    /// Text content, if this cell holds text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn text(s: Option<&str>) -> Value {
        s.map_or(Value::Missing, |s| Value::Text(s.to_string()))
    }

    pub fn number(n: Option<Decimal>) -> Value {
        n.map_or(Value::Missing, Value::Number)
    }

    pub fn flag(b: Option<bool>) -> Value {
        b.map_or(Value::Missing, Value::Flag)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Missing => Ok(()),
            Value::Text(s) => write!(f, "{s}"),
            Value::Number(n) => write!(f, "{n}"),
            Value::Flag(true) => write!(f, "True"),
            Value::Flag(false) => write!(f, "False"),
        }
    }
}

/// Semantic fields a column-header row can map to a column index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    FoamAmount,
    FoamTexture,
    Zeta,
    Pi,
    Conductivity,
    Size,
    Liquid,
    Date,
}

impl Field {
    /// Numeric measurement fields besides the foam amount, in output column order.
    pub const MEASUREMENTS: [Field; 5] = [
        Field::Liquid,
        Field::Zeta,
        Field::Conductivity,
        Field::Size,
        Field::Pi,
    ];

    /// Output column name. The liquid column is named by the active profile.
    pub fn column_name<'a>(&self, liquid_label: &'a str) -> &'a str {
        match self {
            Field::FoamAmount => "Foam (cc)",
            Field::FoamTexture => "Foam Texture",
            Field::Zeta => "Zeta",
            Field::Pi => "PI",
            Field::Conductivity => "Conductivity",
            Field::Size => "Size",
            Field::Liquid => liquid_label,
            Field::Date => "Date",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChemicalAmount {
    /// Chemical name plus unit, e.g. "HS (%)" or "CapB (ppm)".
    pub key: String,
    pub amount: Decimal,
}

/// Ordered chemical composition of one formulation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Composition {
    entries: Vec<ChemicalAmount>,
}

impl Composition {
    /// Insert unless a key equal ignoring case is already present.
    ///
    /// Returns false when the key was a duplicate and the amount was dropped.
    pub fn insert_first(&mut self, key: String, amount: Decimal) -> bool {
        let lower = key.to_lowercase();
        if self.entries.iter().any(|e| e.key.to_lowercase() == lower) {
            return false;
        }
        self.entries.push(ChemicalAmount { key, amount });
        true
    }

    pub fn get(&self, key: &str) -> Option<Decimal> {
        self.entries
            .iter()
            .find(|e| e.key == key)
            .map(|e| e.amount)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChemicalAmount> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Formulation {
    pub sample_id: String,
    pub composition: Composition,
}

/// Tri-state stability flags; `None` means no marker was seen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StabilityFlags {
    pub at_8c: Option<bool>,
    pub at_4c: Option<bool>,
}

/// A "Day N" label as written in the sheet, plus its parsed index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayLabel {
    pub raw: String,
    pub index: Option<u32>,
}

/// One day observation for a formulation and dilution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleRecord {
    pub sample_id: Option<String>,
    pub dilution: Option<String>,
    pub day: Option<DayLabel>,
    pub date: Option<String>,
    pub foam_cc: Option<Decimal>,
    pub foam_texture: Option<String>,
    pub liquid: Option<Decimal>,
    pub zeta: Option<Decimal>,
    pub conductivity: Option<Decimal>,
    pub size: Option<Decimal>,
    pub pi: Option<Decimal>,
    pub baseline: Option<String>,
    pub stability: StabilityFlags,
    pub tube_volume: Option<String>,
}

impl SampleRecord {
    /// Numeric value of a measurement field.
    pub fn measurement(&self, field: Field) -> Option<Decimal> {
        match field {
            Field::FoamAmount => self.foam_cc,
            Field::Liquid => self.liquid,
            Field::Zeta => self.zeta,
            Field::Conductivity => self.conductivity,
            Field::Size => self.size,
            Field::Pi => self.pi,
            Field::FoamTexture | Field::Date => None,
        }
    }

    pub(crate) fn set_measurement(&mut self, field: Field, value: Option<Decimal>) {
        match field {
            Field::FoamAmount => self.foam_cc = value,
            Field::Liquid => self.liquid = value,
            Field::Zeta => self.zeta = value,
            Field::Conductivity => self.conductivity = value,
            Field::Size => self.size = value,
            Field::Pi => self.pi = value,
            Field::FoamTexture | Field::Date => {}
        }
    }
}
