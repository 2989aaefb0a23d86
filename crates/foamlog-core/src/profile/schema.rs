use serde::{Deserialize, Serialize};

/// Configuration selecting one of the historical sheet-layout variants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParserProfile {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub version: String,
    #[serde(default)]
    pub formulation_rule: FormulationRule,
    #[serde(default)]
    pub liquid_column: LiquidColumn,
    #[serde(default)]
    pub initial_foam_volume: InitialFoamVolume,
    /// Remove the monitoring-temperature token from the cleaned dilution text.
    #[serde(default)]
    pub strip_temperature_from_dilution: bool,
    #[serde(default)]
    pub missing_header: MissingHeaderPolicy,
    /// Last column scanned for stability markers on a formulation row.
    #[serde(default = "default_stability_window")]
    pub stability_window: usize,
    /// Last column scanned for tube volume and label fragments on a dilution row.
    #[serde(default = "default_dilution_window")]
    pub dilution_window: usize,
    /// Highest day number given its own wide-table columns.
    #[serde(default = "default_max_day")]
    pub max_day: u32,
}

impl Default for ParserProfile {
    fn default() -> Self {
        ParserProfile {
            name: "latest".into(),
            description: None,
            version: "2024.3".into(),
            formulation_rule: FormulationRule::default(),
            liquid_column: LiquidColumn::default(),
            initial_foam_volume: InitialFoamVolume::default(),
            strip_temperature_from_dilution: false,
            missing_header: MissingHeaderPolicy::default(),
            stability_window: default_stability_window(),
            dilution_window: default_dilution_window(),
            max_day: default_max_day(),
        }
    }
}

fn default_stability_window() -> usize {
    10
}

fn default_dilution_window() -> usize {
    5
}

fn default_max_day() -> u32 {
    365
}

/// How a formulation header row is recognised from its first cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormulationRule {
    /// Contains "%" or "ppm" and an opening parenthesis.
    #[default]
    ParenthesizedAmount,
    /// Starts with a percentage such as "5%" or "0.5 %".
    LeadingPercent,
}

/// Naming of the liquid / water amount column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidColumn {
    pub label: String,
    /// Lower-case header substrings that map to this column.
    pub keywords: Vec<String>,
}

impl Default for LiquidColumn {
    fn default() -> Self {
        LiquidColumn {
            label: "Liquid Amount".into(),
            keywords: vec!["liquid".into()],
        }
    }
}

/// Representation of the "Initial Foam Volume (cc)" column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InitialFoamVolume {
    /// Default "5cc"; a matched volume is kept as its digit text.
    #[default]
    Text,
    /// Default 5; a matched volume becomes a number.
    Numeric,
}

/// Column mapping used when a dilution marker has no header row after it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingHeaderPolicy {
    /// Clear the column map; observation fields resolve to missing.
    #[default]
    Unmapped,
    /// Keep the map from the last header row.
    ReuseLast,
}
