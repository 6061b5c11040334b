use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

use crate::error::{CaltrakError, ImportExportError, Result};
use crate::session::Session;

pub mod csv;
pub mod json;
pub mod text;

/// Export format types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Csv,
    Json,
    Text,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
            ExportFormat::Text => "text",
        }
    }

    /// Guess the format from a file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| ext.parse().ok())
    }
}

impl FromStr for ExportFormat {
    type Err = ImportExportError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            "text" | "txt" => Ok(ExportFormat::Text),
            _ => Err(ImportExportError::UnsupportedFormat {
                format: s.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Write saved sessions to `output_path` in the requested format
///
/// Write failures are reported as [`ImportExportError::ExportFailed`] naming
/// the destination.
pub fn export_sessions<P: AsRef<Path>>(
    sessions: &[&Session],
    format: ExportFormat,
    output_path: P,
) -> Result<()> {
    let output_path = output_path.as_ref();
    let written = match format {
        ExportFormat::Csv => csv::export_sessions(sessions, output_path),
        ExportFormat::Json => json::export_json(&sessions, output_path),
        ExportFormat::Text => write_text(sessions, output_path),
    };
    written.map_err(|err| match err {
        CaltrakError::Io(io) => export_failed(output_path, io),
        other => other,
    })?;

    tracing::info!(
        sessions = sessions.len(),
        format = %format,
        path = %output_path.display(),
        "Sessions exported"
    );
    Ok(())
}

fn write_text(sessions: &[&Session], output_path: &Path) -> Result<()> {
    let reports = sessions
        .iter()
        .map(|session| text::render_session(session, false))
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|err| export_failed(output_path, err))?;
    std::fs::write(output_path, reports.join("\n"))?;
    Ok(())
}

fn export_failed(path: &Path, reason: impl std::fmt::Display) -> CaltrakError {
    ImportExportError::ExportFailed {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
    .into()
}
