pub mod builtin;
pub mod schema;

use crate::error::FoamError;
use schema::ParserProfile;
use std::path::Path;

/// Load a parser profile from a JSON file.
pub fn load_profile(path: &Path) -> Result<ParserProfile, FoamError> {
    let content = std::fs::read_to_string(path).map_err(|e| FoamError::ProfileLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    parse_profile(&content, path)
}

/// Parse a parser profile from a JSON string.
pub fn parse_profile(json: &str, source: &Path) -> Result<ParserProfile, FoamError> {
    let profile: ParserProfile =
        serde_json::from_str(json).map_err(|e| FoamError::ProfileLoad {
            path: source.to_path_buf(),
            reason: e.to_string(),
        })?;
    validate_profile(&profile)?;
    Ok(profile)
}

/// Parse a parser profile from a JSON string (no file path context).
pub fn parse_profile_str(json: &str) -> Result<ParserProfile, FoamError> {
    let profile: ParserProfile = serde_json::from_str(json).map_err(FoamError::Json)?;
    validate_profile(&profile)?;
    Ok(profile)
}

/// Validate that a profile is usable by the scan engine.
pub fn validate_profile(profile: &ParserProfile) -> Result<(), FoamError> {
    if profile.name.trim().is_empty() {
        return Err(FoamError::ProfileInvalid("name must not be empty".into()));
    }

    if profile.liquid_column.label.trim().is_empty() {
        return Err(FoamError::ProfileInvalid(
            "liquid_column.label must not be empty".into(),
        ));
    }

    if profile.liquid_column.keywords.is_empty() {
        return Err(FoamError::ProfileInvalid(
            "liquid_column.keywords must not be empty".into(),
        ));
    }

    for keyword in &profile.liquid_column.keywords {
        if keyword.trim().is_empty() {
            return Err(FoamError::ProfileInvalid(
                "liquid_column.keywords must not contain empty entries".into(),
            ));
        }
        if keyword.to_lowercase() != *keyword {
            return Err(FoamError::ProfileInvalid(format!(
                "liquid_column keyword '{}' must be lower-case",
                keyword
            )));
        }
    }

    if profile.stability_window == 0 {
        return Err(FoamError::ProfileInvalid(
            "stability_window must be at least 1".into(),
        ));
    }

    if profile.dilution_window == 0 {
        return Err(FoamError::ProfileInvalid(
            "dilution_window must be at least 1".into(),
        ));
    }

    Ok(())
}
