use crate::error::FoamError;
use crate::profile::schema::ParserProfile;

const LATEST_JSON: &str = include_str!("../../../../profiles/latest.json");
const LEGACY_JSON: &str = include_str!("../../../../profiles/legacy.json");

/// Available predefined parser profiles. The first one is the default.
pub const PRESETS: &[&str] = &["latest", "legacy"];

/// Load a predefined parser profile by name.
pub fn load_preset(name: &str) -> Result<ParserProfile, FoamError> {
    match name {
        "latest" => {
            let profile: ParserProfile = serde_json::from_str(LATEST_JSON)?;
            Ok(profile)
        }
        "legacy" => {
            let profile: ParserProfile = serde_json::from_str(LEGACY_JSON)?;
            Ok(profile)
        }
        _ => Err(FoamError::ProfileInvalid(format!(
            "unknown preset '{}'. Available: {}",
            name,
            PRESETS.join(", ")
        ))),
    }
}
