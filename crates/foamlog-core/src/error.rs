use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum FoamError {
    #[error("could not decode input as {primary} or {fallback} text")]
    Decode {
        primary: &'static str,
        fallback: &'static str,
    },

    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to read workbook: {0}")]
    Workbook(String),

    #[error("input contains no rows")]
    EmptyInput,

    #[error("failed to assemble tables: {0}")]
    Assembly(String),

    #[error("failed to load parser profile from {path}: {reason}")]
    ProfileLoad { path: PathBuf, reason: String },

    #[error("invalid parser profile: {0}")]
    ProfileInvalid(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
