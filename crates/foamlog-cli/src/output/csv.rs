use std::io::Write;

use foamlog_core::error::FoamError;
use foamlog_core::table::Table;

pub fn print(table: &Table) -> Result<(), FoamError> {
    let bytes = table.to_csv_bytes()?;
    std::io::stdout().write_all(&bytes)?;
    Ok(())
}
