use foamlog_core::error::FoamError;
use foamlog_core::table::Table;

pub fn print(table: &Table) -> Result<(), FoamError> {
    let json = serde_json::to_string_pretty(table)?;
    println!("{json}");
    Ok(())
}
