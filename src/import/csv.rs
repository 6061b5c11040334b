use ::csv::{ReaderBuilder, StringRecord};
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use crate::error::{ImportExportError, Result};
use crate::models::{UnitSystem, UserInputs};

/// Columns that must be present in every batch file
pub const REQUIRED_COLUMNS: &[&str] = &["gender", "weight", "body_fat", "activity_level", "goal"];

/// One parsed CSV row; rows fail independently
#[derive(Debug)]
pub struct ImportedRow {
    /// 1-based data row number (the header is row 0)
    pub row: usize,
    pub inputs: std::result::Result<UserInputs, ImportExportError>,
}

/// CSV importer for batches of calculation inputs, with flexible column names
pub struct CsvInputImporter {
    column_mapping: HashMap<String, String>,
    default_units: UnitSystem,
}

impl Default for CsvInputImporter {
    fn default() -> Self {
        Self::new(UnitSystem::Metric)
    }
}

impl CsvInputImporter {
    /// `default_units` applies to rows without a unit column value
    pub fn new(default_units: UnitSystem) -> Self {
        let mut column_mapping = HashMap::new();

        Self::add_mapping(&mut column_mapping, "name", &["name", "client", "label"]);
        Self::add_mapping(
            &mut column_mapping,
            "unit_system",
            &["unit_system", "unitsystem", "units", "unit"],
        );
        Self::add_mapping(&mut column_mapping, "gender", &["gender", "sex"]);
        Self::add_mapping(&mut column_mapping, "weight", &["weight", "bodyweight", "mass"]);
        Self::add_mapping(
            &mut column_mapping,
            "body_fat",
            &["body_fat", "bodyfat", "bf", "body_fat_%", "body_fat_pct", "fat_pct"],
        );
        Self::add_mapping(
            &mut column_mapping,
            "activity_level",
            &["activity_level", "activitylevel", "activity"],
        );
        Self::add_mapping(&mut column_mapping, "goal", &["goal", "phase"]);
        Self::add_mapping(&mut column_mapping, "age", &["age", "years"]);
        Self::add_mapping(&mut column_mapping, "height", &["height", "stature"]);
        Self::add_mapping(
            &mut column_mapping,
            "target_weight",
            &["target_weight", "targetweight", "target", "goal_weight"],
        );
        Self::add_mapping(
            &mut column_mapping,
            "weekly_rate",
            &["weekly_rate", "weeklyrate", "rate", "rate_per_week"],
        );

        Self {
            column_mapping,
            default_units,
        }
    }

    fn add_mapping(mapping: &mut HashMap<String, String>, standard: &str, variations: &[&str]) {
        for variation in variations {
            mapping.insert(variation.to_lowercase(), standard.to_string());
        }
    }

    fn normalize_column_name(&self, name: &str) -> String {
        let normalized = name.trim().to_lowercase().replace([' ', '-'], "_");

        self.column_mapping
            .get(&normalized)
            .cloned()
            .unwrap_or(normalized)
    }

    /// Import rows from a CSV file
    pub fn import_file<P: AsRef<Path>>(&self, path: P) -> Result<Vec<ImportedRow>> {
        let file = std::fs::File::open(path)?;
        self.import_reader(file)
    }

    /// Import rows from any reader; only a bad header fails the whole batch
    pub fn import_reader<R: Read>(&self, reader: R) -> Result<Vec<ImportedRow>> {
        let mut csv_reader = ReaderBuilder::new()
            .has_headers(true)
            .trim(::csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        let headers = csv_reader.headers().map_err(ImportExportError::from)?.clone();
        let columns: HashMap<String, usize> = headers
            .iter()
            .enumerate()
            .map(|(index, name)| (self.normalize_column_name(name), index))
            .collect();

        for required in REQUIRED_COLUMNS {
            if !columns.contains_key(*required) {
                return Err(ImportExportError::MissingColumn {
                    column: required.to_string(),
                }
                .into());
            }
        }

        let mut rows = Vec::new();
        for (index, record) in csv_reader.records().enumerate() {
            let row = index + 1;
            let inputs = match record {
                Ok(record) => self.parse_record(&record, &columns, row),
                Err(e) => Err(ImportExportError::from(e)),
            };
            rows.push(ImportedRow { row, inputs });
        }

        tracing::debug!(rows = rows.len(), "Parsed CSV input batch");
        Ok(rows)
    }

    fn parse_record(
        &self,
        record: &StringRecord,
        columns: &HashMap<String, usize>,
        row: usize,
    ) -> std::result::Result<UserInputs, ImportExportError> {
        let cell = |name: &str| field(record, columns, name);

        let unit_system = match cell("unit_system") {
            Some(value) => value
                .parse::<UnitSystem>()
                .map_err(|e| parse_error(row, "unit_system", e))?,
            None => self.default_units,
        };

        Ok(UserInputs {
            name: cell("name").map(str::to_string),
            unit_system,
            gender: parse_required(cell("gender"), "gender", row)?,
            weight: parse_required(cell("weight"), "weight", row)?,
            body_fat: parse_required(cell("body_fat"), "body_fat", row)?,
            activity_level: parse_required(cell("activity_level"), "activity_level", row)?,
            goal: parse_required(cell("goal"), "goal", row)?,
            age: parse_optional(cell("age"), "age", row)?,
            height: parse_optional(cell("height"), "height", row)?,
            target_weight: parse_optional(cell("target_weight"), "target_weight", row)?,
            weekly_rate: parse_optional(cell("weekly_rate"), "weekly_rate", row)?,
        })
    }
}

/// Non-empty cell for a normalized column name
fn field<'a>(
    record: &'a StringRecord,
    columns: &HashMap<String, usize>,
    name: &str,
) -> Option<&'a str> {
    columns
        .get(name)
        .and_then(|index| record.get(*index))
        .filter(|value| !value.is_empty())
}

fn parse_error(row: usize, column: &str, reason: impl std::fmt::Display) -> ImportExportError {
    ImportExportError::ParseError {
        format: "csv".to_string(),
        row,
        reason: format!("{}: {}", column, reason),
    }
}

fn parse_required<T>(
    value: Option<&str>,
    column: &str,
    row: usize,
) -> std::result::Result<T, ImportExportError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let value = value.ok_or_else(|| parse_error(row, column, "missing value"))?;
    value
        .parse::<T>()
        .map_err(|e| parse_error(row, column, format!("{} ({})", e, value)))
}

fn parse_optional<T>(
    value: Option<&str>,
    column: &str,
    row: usize,
) -> std::result::Result<Option<T>, ImportExportError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .map(|v| parse_required(Some(v), column, row))
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CaltrakError;
    use crate::models::{ActivityLevel, Gender, Goal};

    #[test]
    fn test_flexible_headers() {
        let data = "\
Name,Sex,Weight,BF,Activity,Goal,Age,Height,Target,Rate
Asha,female,62,24,light,cut,34,168,58,0.4
Ravi,male,80,15,extra-active,bulk,,,,
";
        let rows = CsvInputImporter::default().import_reader(data.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);

        let asha = rows[0].inputs.as_ref().unwrap();
        assert_eq!(asha.name.as_deref(), Some("Asha"));
        assert_eq!(asha.gender, Gender::Female);
        assert_eq!(asha.age, Some(34));
        assert_eq!(asha.weekly_rate, Some(0.4));

        let ravi = rows[1].inputs.as_ref().unwrap();
        assert_eq!(ravi.activity_level, ActivityLevel::ExtraActive);
        assert_eq!(ravi.goal, Goal::Bulk);
        assert!(ravi.age.is_none());
        assert!(ravi.target_weight.is_none());
    }

    #[test]
    fn test_default_units_applied() {
        let data = "gender,weight,body_fat,activity_level,goal\nmale,180,18,moderate,recomp\n";
        let rows = CsvInputImporter::new(UnitSystem::Imperial)
            .import_reader(data.as_bytes())
            .unwrap();
        assert_eq!(rows[0].inputs.as_ref().unwrap().unit_system, UnitSystem::Imperial);
    }

    #[test]
    fn test_bad_row_does_not_fail_batch() {
        let data = "gender,weight,body_fat,activity_level,goal\nmale,heavy,18,moderate,recomp\nfemale,60,25,light,cut\n";
        let rows = CsvInputImporter::default().import_reader(data.as_bytes()).unwrap();
        assert!(matches!(
            rows[0].inputs,
            Err(ImportExportError::ParseError { row: 1, .. })
        ));
        assert!(rows[1].inputs.is_ok());
    }

    #[test]
    fn test_missing_required_column() {
        let data = "gender,weight,activity_level,goal\nmale,80,moderate,cut\n";
        let err = CsvInputImporter::default().import_reader(data.as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            CaltrakError::ImportExport(ImportExportError::MissingColumn { ref column }) if column == "body_fat"
        ));
    }
}
