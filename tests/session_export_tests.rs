use caltrak::export::{self, ExportFormat};
use caltrak::import::CsvInputImporter;
use caltrak::error::SessionError;
use caltrak::{
    compute, CaltrakError, ActivityLevel, Gender, Goal, InMemorySessionStore, InputValidator, JsonSessionFile,
    SessionStore, UnitSystem, UserInputs,
};
use tempfile::TempDir;

fn sample_inputs(weight: f64) -> UserInputs {
    UserInputs::new(
        UnitSystem::Metric,
        Gender::Female,
        weight,
        24.0,
        ActivityLevel::Light,
        Goal::Cut,
    )
    .with_name(format!("client-{}", weight))
}

fn populated_store(count: usize) -> InMemorySessionStore {
    let mut store = InMemorySessionStore::default();
    for i in 0..count {
        let inputs = sample_inputs(55.0 + i as f64);
        let results = compute(&inputs);
        store.save(inputs, results).unwrap();
    }
    store
}

#[test]
fn test_history_cap_survives_file_round_trip() {
    let dir = TempDir::new().unwrap();
    let history = JsonSessionFile::new(dir.path().join("nested").join("sessions.json"));

    let store = populated_store(55);
    assert_eq!(store.len(), 50);
    assert_eq!(store.total_sessions(), 55);
    history.save(&store).unwrap();

    let reloaded = history.load(50).unwrap();
    assert_eq!(reloaded.len(), 50);
    assert_eq!(reloaded.total_sessions(), 55);
    assert_eq!(reloaded.list()[0].inputs.weight, 60.0);

    let smaller = history.load(10).unwrap();
    assert_eq!(smaller.len(), 10);
    assert_eq!(smaller.list()[0].inputs.weight, 100.0);
}

#[test]
fn test_delete_and_clear_persist_through_history_file() {
    let dir = TempDir::new().unwrap();
    let history = JsonSessionFile::new(dir.path().join("sessions.json"));
    history.save(&populated_store(4)).unwrap();

    let mut store = history.load(50).unwrap();
    let target = store.find_by_name("CLIENT-57")[0].id.clone();
    let removed = store.remove(&target).unwrap();
    assert_eq!(removed.inputs.weight, 57.0);
    history.save(&store).unwrap();

    let mut reloaded = history.load(50).unwrap();
    assert_eq!(reloaded.len(), 3);
    assert!(reloaded.get(&target).is_none());
    assert!(reloaded.find_by_name("client-57").is_empty());
    assert!(matches!(
        reloaded.remove(&target),
        Err(CaltrakError::Session(SessionError::NotFound { .. }))
    ));

    assert_eq!(reloaded.clear(), 3);
    history.save(&reloaded).unwrap();
    let emptied = history.load(50).unwrap();
    assert!(emptied.is_empty());
    assert_eq!(emptied.total_sessions(), 4);
}

#[test]
fn test_missing_history_file_is_empty() {
    let dir = TempDir::new().unwrap();
    let history = JsonSessionFile::new(dir.path().join("absent.json"));
    assert!(history.load(50).unwrap().is_empty());
}

#[test]
fn test_export_sessions_all_formats() {
    let dir = TempDir::new().unwrap();
    let store = populated_store(3);
    let sessions = store.list();

    let csv_path = dir.path().join("history.csv");
    export::export_sessions(&sessions, ExportFormat::Csv, &csv_path).unwrap();
    let csv = std::fs::read_to_string(&csv_path).unwrap();
    assert_eq!(csv.lines().count(), 4);
    assert!(csv.contains("client-57"));

    let json_path = dir.path().join("history.json");
    export::export_sessions(&sessions, ExportFormat::Json, &json_path).unwrap();
    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&json_path).unwrap()).unwrap();
    assert_eq!(json.as_array().unwrap().len(), 3);
    assert_eq!(json[0]["inputs"]["activityLevel"], "light");
    assert!(json[0]["results"]["calories"].is_u64());

    let text_path = dir.path().join("history.txt");
    export::export_sessions(&sessions, ExportFormat::Text, &text_path).unwrap();
    let text = std::fs::read_to_string(&text_path).unwrap();
    assert_eq!(text.matches("CALORIE TARGET").count(), 3);
}

#[test]
fn test_format_guessed_from_extension() {
    assert_eq!(
        ExportFormat::from_path(std::path::Path::new("out/report.TXT")),
        Some(ExportFormat::Text)
    );
    assert_eq!(ExportFormat::from_path(std::path::Path::new("out/report")), None);
    assert!("xlsx".parse::<ExportFormat>().is_err());
}

#[test]
fn test_batch_import_validate_and_write() {
    let data = "\
name,gender,weight,body_fat,activity,goal,age,height
ok-metric,male,85,18,moderate,cut,35,182
too-light,female,12,25,light,recomp,,
bad-goal,female,60,25,light,shred,,
";
    let rows = CsvInputImporter::default().import_reader(data.as_bytes()).unwrap();
    assert_eq!(rows.len(), 3);
    assert!(rows[2].inputs.is_err());

    let accepted: Vec<_> = rows
        .into_iter()
        .filter_map(|row| row.inputs.ok().map(|inputs| (row.row, inputs)))
        .filter(|(_, inputs)| InputValidator::validate(inputs).is_ok())
        .map(|(row, inputs)| {
            let results = compute(&inputs);
            (row, inputs, results)
        })
        .collect();
    assert_eq!(accepted.len(), 1);

    let mut buffer = Vec::new();
    export::csv::write_results(&accepted, &mut buffer).unwrap();
    let output = String::from_utf8(buffer).unwrap();
    assert!(output.lines().nth(1).unwrap().starts_with("1,ok-metric,35,male"));
}
