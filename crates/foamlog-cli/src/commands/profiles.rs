use std::path::Path;

use foamlog_core::error::FoamError;
use foamlog_core::profile::builtin;
use foamlog_core::profile::schema::{MissingHeaderPolicy, ParserProfile};

pub fn list() -> Result<(), FoamError> {
    println!("Available parser profiles:\n");
    for (i, name) in builtin::PRESETS.iter().enumerate() {
        let profile = builtin::load_preset(name)?;
        let default_marker = if i == 0 { " (default)" } else { "" };
        println!("  {:<8} v{}{}", name, profile.version, default_marker);
        if let Some(ref desc) = profile.description {
            println!("           {}", desc);
        }
        println!();
    }
    Ok(())
}

pub fn show(name: &str) -> Result<(), FoamError> {
    let profile = builtin::load_preset(name)?;
    println!("{}", serde_json::to_string_pretty(&profile)?);
    Ok(())
}

pub fn validate(file: &Path) -> Result<(), FoamError> {
    let profile = foamlog_core::profile::load_profile(file)?;

    println!("Profile '{}' (v{}) is valid.", profile.name, profile.version);
    print_summary(&profile);
    Ok(())
}

fn print_summary(profile: &ParserProfile) {
    println!("  Formulation rule:   {:?}", profile.formulation_rule);
    println!(
        "  Liquid column:      {} (matches: {})",
        profile.liquid_column.label,
        profile.liquid_column.keywords.join(", ")
    );
    println!("  Initial foam vol.:  {:?}", profile.initial_foam_volume);
    println!(
        "  Strip temperature:  {}",
        if profile.strip_temperature_from_dilution { "yes" } else { "no" }
    );
    let policy = match profile.missing_header {
        MissingHeaderPolicy::Unmapped => "treat columns as unmapped",
        MissingHeaderPolicy::ReuseLast => "reuse the previous header",
    };
    println!("  Missing header:     {policy}");
    println!(
        "  Windows:            stability cols 1..={}, dilution cols 1..={}",
        profile.stability_window, profile.dilution_window
    );
}
