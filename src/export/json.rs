use crate::error::{ImportExportError, Result};
use std::io::Write;
use std::path::Path;

/// Export any serializable data structure to pretty JSON
pub fn export_json<T, P>(data: &T, output_path: P) -> Result<()>
where
    T: serde::Serialize + ?Sized,
    P: AsRef<Path>,
{
    let json_data = serde_json::to_string_pretty(data).map_err(ImportExportError::from)?;

    let mut file = std::fs::File::create(output_path)?;
    file.write_all(json_data.as_bytes())?;

    Ok(())
}
