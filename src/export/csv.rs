use std::io::Write;
use std::path::Path;

use crate::error::{ImportExportError, Result};
use crate::models::{CalculationResults, UserInputs};
use crate::session::Session;

/// Input and result columns shared by session and batch exports
pub const RECORD_HEADERS: &[&str] = &[
    "Name",
    "Age",
    "Gender",
    "Weight",
    "Height",
    "Body Fat %",
    "Unit System",
    "Activity Level",
    "Goal",
    "Target Weight",
    "Weekly Rate",
    "Calories",
    "Protein (g)",
    "Protein %",
    "Carbs (g)",
    "Carbs %",
    "Fat (g)",
    "Fat %",
    "Fiber (g)",
    "Water (L)",
    "LBM",
    "BMR",
    "TDEE",
    "Formula Used",
    "Expected Change",
    "Safety Level",
    "Months to Target",
    "Milestone Count",
    "Warnings",
];

fn optional<T: ToString>(value: Option<T>) -> String {
    value.map_or(String::new(), |v| v.to_string())
}

/// One CSV row for an input/result pair, in `RECORD_HEADERS` order
pub fn record_fields(inputs: &UserInputs, results: &CalculationResults) -> Vec<String> {
    vec![
        inputs.name.clone().unwrap_or_default(),
        optional(inputs.age),
        inputs.gender.to_string(),
        inputs.weight.to_string(),
        optional(inputs.height),
        inputs.body_fat.to_string(),
        inputs.unit_system.to_string(),
        inputs.activity_level.to_string(),
        inputs.goal.to_string(),
        optional(inputs.target_weight),
        optional(inputs.weekly_rate),
        results.calories.to_string(),
        results.protein_g.to_string(),
        results.protein_pct.to_string(),
        results.carbs_g.to_string(),
        results.carbs_pct.to_string(),
        results.fat_g.to_string(),
        results.fat_pct.to_string(),
        results.fiber_g.to_string(),
        results.water_liters.to_string(),
        results.lbm.to_string(),
        results.bmr.to_string(),
        results.tdee.to_string(),
        results.formula_used.to_string(),
        results.expected_weight_change.clone(),
        results.safety_level.to_string(),
        results.months_to_target.clone().unwrap_or_default(),
        results.milestones.len().to_string(),
        results.warnings.join(" | "),
    ]
}

/// Write saved sessions as CSV, newest data last
pub fn write_sessions<W: Write>(sessions: &[&Session], writer: W) -> Result<()> {
    let mut csv_writer = ::csv::Writer::from_writer(writer);

    let mut headers = vec!["Timestamp", "Session ID"];
    headers.extend_from_slice(RECORD_HEADERS);
    csv_writer.write_record(&headers).map_err(ImportExportError::from)?;

    for session in sessions {
        let mut row = vec![session.created_at.to_rfc3339(), session.id.to_string()];
        row.extend(record_fields(&session.inputs, &session.results));
        csv_writer.write_record(&row).map_err(ImportExportError::from)?;
    }

    csv_writer.flush()?;
    Ok(())
}

/// Export saved sessions to a CSV file
pub fn export_sessions<P: AsRef<Path>>(sessions: &[&Session], output_path: P) -> Result<()> {
    let file = std::fs::File::create(output_path)?;
    write_sessions(sessions, file)
}

/// Write batch results as CSV; the first column is the source row number
pub fn write_results<W: Write>(
    rows: &[(usize, UserInputs, CalculationResults)],
    writer: W,
) -> Result<()> {
    let mut csv_writer = ::csv::Writer::from_writer(writer);

    let mut headers = vec!["Row"];
    headers.extend_from_slice(RECORD_HEADERS);
    csv_writer.write_record(&headers).map_err(ImportExportError::from)?;

    for (row_number, inputs, results) in rows {
        let mut row = vec![row_number.to_string()];
        row.extend(record_fields(inputs, results));
        csv_writer.write_record(&row).map_err(ImportExportError::from)?;
    }

    csv_writer.flush()?;
    Ok(())
}
