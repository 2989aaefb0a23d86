//! Single-cell extractors.
//!
//! Every extractor is total: text that does not match its pattern yields
//! `None` (or an empty result), never an error.

use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;

use crate::model::{Composition, StabilityFlags};

static NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[-+]?\d+(?:\.\d+)?").expect("valid regex"));
static SAMPLE_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\((.*?)\)").expect("valid regex"));
static FRAGMENT_SPLIT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[,-]").expect("valid regex"));
static PPM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(\d+\.?\d*)\s*ppm\s*(.*)").expect("valid regex"));
static PERCENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+\.?\d*)\s*%\s*(.*)").expect("valid regex"));
static ASIDE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(.*?\)").expect("valid regex"));
static RATIO_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\(?(\d+):(\d+)\)?\s*ratio").expect("valid regex"));
static PILOT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bAFC\b").expect("valid regex"));
static VOLUME_CC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+)\s*cc").expect("valid regex"));
// A temperature is a number followed by exactly one "c"; runs of "cc" are volumes.
static TEMPERATURE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+)\s*(c+)").expect("valid regex"));
static SONICATED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)sonicated").expect("valid regex"));
static NOT_SONICATED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)no\s*sonic").expect("valid regex"));

/// True for empty cells and the literal "nan" left behind by spreadsheet exports.
pub fn is_blank(s: &str) -> bool {
    let s = s.trim();
    s.is_empty() || s.eq_ignore_ascii_case("nan")
}

/// First signed or unsigned decimal number in the cell.
///
/// - "12" -> 12
/// - "~12 cc" -> 12
/// - "-3.5 mV" -> -3.5
/// - "", "nan", "none" -> None
pub fn parse_number(cell: &str) -> Option<Decimal> {
    if is_blank(cell) {
        return None;
    }
    let m = NUMBER_RE.find(cell)?;
    Decimal::from_str(m.as_str()).ok()
}

fn parse_amount(s: &str) -> Option<Decimal> {
    Decimal::from_str(s.trim_end_matches('.')).ok()
}

/// Text inside the first pair of parentheses, if non-empty.
pub fn extract_sample_id(text: &str) -> Option<String> {
    SAMPLE_ID_RE
        .captures(text)
        .map(|c| c[1].trim().to_string())
        .filter(|id| !id.is_empty())
}

/// Parse "5% HS, 200 ppm CapB (S1)" into chemical amounts.
///
/// Keys are "<name> (ppm)" or "<name> (%)"; the first mention of a key
/// (compared ignoring case) wins.
pub fn parse_composition(text: &str) -> Composition {
    let mut composition = Composition::default();

    for fragment in FRAGMENT_SPLIT_RE.split(text) {
        let fragment = fragment.trim();

        let (caps, unit) = if let Some(caps) = PPM_RE.captures(fragment) {
            (caps, "ppm")
        } else if let Some(caps) = PERCENT_RE.captures(fragment) {
            (caps, "%")
        } else {
            continue;
        };

        let Some(amount) = parse_amount(&caps[1]) else {
            continue;
        };
        let name = ASIDE_RE.replace_all(&caps[2], "");
        let name = name.trim();
        if name.is_empty() {
            continue;
        }

        composition.insert_first(format!("{name} ({unit})"), amount);
    }

    composition
}

/// Resolve stability markers on a formulation row.
///
/// "unstable concentrate" anywhere forces both flags false. Within the
/// window an explicit "unstable at Nc" forces that flag false, and a later
/// or earlier "stable at Nc" cannot turn it back to true.
pub fn scan_stability<'a>(
    formulation_cell: &str,
    window: impl IntoIterator<Item = &'a str>,
) -> StabilityFlags {
    let mut flags = StabilityFlags::default();

    if formulation_cell.to_lowercase().contains("unstable concentrate") {
        flags.at_8c = Some(false);
        flags.at_4c = Some(false);
    }

    for cell in window {
        if is_blank(cell) {
            continue;
        }
        let val = cell.trim().to_lowercase();

        if val.contains("unstable concentrate") {
            flags.at_4c = Some(false);
            flags.at_8c = Some(false);
        }
        apply_marker(&mut flags.at_4c, &val, "4c");
        apply_marker(&mut flags.at_8c, &val, "8c");
    }

    flags
}

fn apply_marker(flag: &mut Option<bool>, val: &str, temp: &str) {
    if val.contains(&format!("unstable at {temp}")) {
        *flag = Some(false);
    } else if val.contains(&format!("stable at {temp}")) && *flag != Some(false) {
        *flag = Some(true);
    }
}

/// Ratio y/x from "(x:y) ratio", rounded to 3 places. x = 0 gives None.
pub fn dilution_ratio(text: &str) -> Option<Decimal> {
    let caps = RATIO_RE.captures(text)?;
    let x = Decimal::from_str(&caps[1]).ok()?;
    let y = Decimal::from_str(&caps[2]).ok()?;
    y.checked_div(x).map(|r| r.round_dp(3))
}

/// "AFC" when the token appears as a whole word.
pub fn pilot_flag(text: &str) -> Option<&'static str> {
    PILOT_RE.is_match(text).then_some("AFC")
}

/// Digits of the first "<n> cc" volume.
pub fn foam_volume_cc(text: &str) -> Option<String> {
    VOLUME_CC_RE.captures(text).map(|c| c[1].to_string())
}

/// Monitoring temperature from the first "<n> c" not followed by another "c".
pub fn monitoring_temperature(text: &str) -> Option<i64> {
    TEMPERATURE_RE
        .captures_iter(text)
        .find(|c| c[2].len() == 1)
        .and_then(|c| c[1].parse().ok())
}

/// Remove every monitoring-temperature token from the text.
pub fn strip_temperature(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for caps in TEMPERATURE_RE.captures_iter(text) {
        if caps[2].len() != 1 {
            continue;
        }
        let Some(m) = caps.get(0) else {
            continue;
        };
        out.push_str(&text[last..m.start()]);
        last = m.end();
    }
    out.push_str(&text[last..]);
    out
}

/// Tri-state sonication flag. "sonicated" wins over "no sonic".
pub fn sonication(text: &str) -> Option<bool> {
    if SONICATED_RE.is_match(text) {
        Some(true)
    } else if NOT_SONICATED_RE.is_match(text) {
        Some(false)
    } else {
        None
    }
}

/// Trim whitespace and stray separators from both ends.
pub fn clean_dilution_text(text: &str) -> String {
    text.trim_matches(|c: char| matches!(c, ' ' | ',' | ';' | '-'))
        .trim()
        .to_string()
}
