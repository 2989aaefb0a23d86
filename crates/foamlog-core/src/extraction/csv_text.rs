use std::borrow::Cow;

use encoding_rs::{Encoding, UTF_8, WINDOWS_1252};

use crate::error::FoamError;
use crate::extraction::{GridSource, RawGrid};

const PRIMARY: &Encoding = UTF_8;
const FALLBACK: &Encoding = WINDOWS_1252;

/// Grid backend for header-less CSV exports.
///
/// Text is decoded as UTF-8 first and retried once as Windows-1252.
pub struct CsvGridSource;

impl CsvGridSource {
    pub fn new() -> Self {
        CsvGridSource
    }
}

impl Default for CsvGridSource {
    fn default() -> Self {
        Self::new()
    }
}

impl GridSource for CsvGridSource {
    fn read_grid(&self, bytes: &[u8]) -> Result<RawGrid, FoamError> {
        let (text, encoding) = decode_text(bytes)?;
        let grid = parse_csv_text(&text)?;
        tracing::debug!(
            rows = grid.len(),
            columns = grid.width(),
            encoding,
            "read CSV grid"
        );
        Ok(grid.with_encoding(encoding))
    }

    fn backend_name(&self) -> &str {
        "csv"
    }
}

/// Decode raw bytes, returning the text and the name of the encoding used.
pub fn decode_text(bytes: &[u8]) -> Result<(Cow<'_, str>, &'static str), FoamError> {
    let body = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);

    if let Some(text) = PRIMARY.decode_without_bom_handling_and_without_replacement(body) {
        return Ok((text, PRIMARY.name()));
    }

    tracing::warn!(
        primary = PRIMARY.name(),
        fallback = FALLBACK.name(),
        "input is not valid primary encoding, retrying with fallback"
    );

    FALLBACK
        .decode_without_bom_handling_and_without_replacement(body)
        .map(|text| (text, FALLBACK.name()))
        .ok_or(FoamError::Decode {
            primary: PRIMARY.name(),
            fallback: FALLBACK.name(),
        })
}

/// Parse decoded CSV text into a grid. Rows may have differing lengths.
pub fn parse_csv_text(text: &str) -> Result<RawGrid, FoamError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    Ok(RawGrid::new(rows))
}
