use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::time::Instant;

use caltrak::config::AppConfig;
use caltrak::export::{self, text, ExportFormat};
use caltrak::import::CsvInputImporter;
use caltrak::logging::{init_logging, DiagnosticReport};
use caltrak::{
    ActivityLevel, CaltrakError, CalculationResults, Gender, Goal, InputValidator,
    JsonSessionFile, MetabolicCalculator, Session, SessionId, SessionStore, UnitSystem,
    UserInputs,
};
use tabled::{settings::Style, Table, Tabled};

#[derive(Tabled)]
struct SessionRow {
    #[tabled(rename = "Session ID")]
    id: String,
    #[tabled(rename = "Saved (UTC)")]
    saved: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Goal")]
    goal: String,
    #[tabled(rename = "kcal")]
    calories: u32,
    #[tabled(rename = "Safety")]
    safety: String,
}

/// CalTrak - Nutrition Target Calculator
///
/// Estimates BMR and TDEE from biometric data, derives a calorie target for a
/// cut, recomp or bulk, splits it into macros and projects goal milestones.
#[derive(Parser)]
#[command(name = "caltrak")]
#[command(version)]
#[command(about = "Nutrition target calculator", long_about = None)]
struct Cli {
    /// Sets a custom config file
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Increase verbosity of log output (stderr)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Calculate calorie and macro targets for one person
    Calculate {
        /// Read inputs from a JSON file instead of flags
        #[arg(
            short,
            long,
            value_name = "FILE",
            conflicts_with_all = [
                "name", "units", "gender", "weight", "body_fat", "activity", "goal",
                "age", "height", "target_weight", "weekly_rate",
            ]
        )]
        input: Option<PathBuf>,

        /// Session label
        #[arg(long)]
        name: Option<String>,

        /// Unit system (metric, imperial)
        #[arg(short, long)]
        units: Option<UnitSystem>,

        /// Gender (male, female)
        #[arg(short, long)]
        gender: Option<Gender>,

        /// Bodyweight in kg or lb
        #[arg(short, long)]
        weight: Option<f64>,

        /// Body fat percentage
        #[arg(short, long)]
        body_fat: Option<f64>,

        /// Activity level (sedentary, light, moderate, heavy, extra_active)
        #[arg(short, long)]
        activity: Option<ActivityLevel>,

        /// Goal (cut, recomp, bulk)
        #[arg(long)]
        goal: Option<Goal>,

        /// Age in years
        #[arg(long)]
        age: Option<u32>,

        /// Height in cm or inches
        #[arg(long)]
        height: Option<f64>,

        /// Target bodyweight
        #[arg(long)]
        target_weight: Option<f64>,

        /// Desired weekly change in kg or lb
        #[arg(long)]
        weekly_rate: Option<f64>,

        /// Output format (text, json, csv)
        #[arg(short = 'f', long)]
        format: Option<ExportFormat>,

        /// Append the calculation to the session history
        #[arg(short, long)]
        save: bool,
    },

    /// Calculate targets for every row of a CSV file
    Batch {
        /// Input CSV with one person per row
        #[arg(short, long)]
        input: PathBuf,

        /// Output CSV path
        #[arg(short, long)]
        output: PathBuf,

        /// Write a JSON diagnostic report of skipped rows and warnings
        #[arg(short, long)]
        report: Option<PathBuf>,
    },

    /// Export the saved session history
    Export {
        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// Export format (csv, json, text); guessed from the extension if omitted
        #[arg(short = 'f', long)]
        format: Option<ExportFormat>,
    },

    /// Browse or prune the saved session history
    History {
        /// List every saved session, newest first
        #[arg(short, long)]
        list: bool,

        /// Show sessions whose name contains this text (case-insensitive)
        #[arg(short, long, value_name = "TEXT")]
        name: Option<String>,

        /// Delete the session with this id
        #[arg(short, long, value_name = "ID")]
        delete: Option<String>,

        /// Delete every saved session
        #[arg(long, conflicts_with_all = ["delete", "name"])]
        clear: bool,
    },

    /// Configure application settings
    Config {
        /// List all configuration options
        #[arg(short, long)]
        list: bool,

        /// Set a configuration value (key=value)
        #[arg(short, long)]
        set: Option<String>,

        /// Get a configuration value
        #[arg(short, long)]
        get: Option<String>,

        /// Write a default configuration file
        #[arg(long)]
        init: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load_or_default(cli.config.as_deref());
    let mut log_config = config.logging.clone();
    log_config.level = log_config.level.raised_by(cli.verbose);
    init_logging(&log_config)?;

    match cli.command {
        Commands::Calculate {
            input,
            name,
            units,
            gender,
            weight,
            body_fat,
            activity,
            goal,
            age,
            height,
            target_weight,
            weekly_rate,
            format,
            save,
        } => {
            let inputs = match input {
                Some(path) => read_inputs_file(&path)?,
                None => UserInputs {
                    name,
                    unit_system: units.unwrap_or(config.settings.default_units),
                    gender: gender.context("--gender is required")?,
                    weight: weight.context("--weight is required")?,
                    body_fat: body_fat.context("--body-fat is required")?,
                    activity_level: activity.context("--activity is required")?,
                    goal: goal.context("--goal is required")?,
                    age,
                    height,
                    target_weight,
                    weekly_rate,
                },
            };

            InputValidator::validate(&inputs)
                .map_err(|e| anyhow!(CaltrakError::from(e).user_message()))?;

            let results = MetabolicCalculator::compute(&inputs);
            print_results(&inputs, &results, format.unwrap_or(config.settings.output_format))?;

            if save {
                let history = JsonSessionFile::new(&config.sessions.history_file);
                let mut store = history.load(config.sessions.max_history)?;
                let id = store.save(inputs, results)?;
                history.save(&store)?;
                eprintln!("{}", format!("✓ Saved session {}", id).green());
            }
        }

        Commands::Batch { input, output, report } => {
            run_batch(&config, &input, &output, report.as_deref())?;
        }

        Commands::Export { output, format } => {
            let format = format
                .or_else(|| ExportFormat::from_path(&output))
                .unwrap_or(ExportFormat::Csv);

            let history = JsonSessionFile::new(&config.sessions.history_file);
            let store = history.load(config.sessions.max_history)?;
            if store.is_empty() {
                bail!("No saved sessions in {}", history.path().display());
            }

            export::export_sessions(&store.list(), format, &output)?;
            println!(
                "{}",
                format!("✓ Exported {} sessions to {}", store.len(), output.display()).green()
            );
        }

        Commands::History { list, name, delete, clear } => {
            let history = JsonSessionFile::new(&config.sessions.history_file);
            let mut store = history.load(config.sessions.max_history)?;

            if clear {
                let removed = store.clear();
                history.save(&store)?;
                println!("{}", format!("✓ Deleted {} sessions", removed).green());
            } else if let Some(id) = delete {
                let removed = store
                    .remove(&SessionId::from(id.as_str()))
                    .map_err(|e| anyhow!(e.user_message()))?;
                history.save(&store)?;
                println!("{}", format!("✓ Deleted session {}", removed.id).green());
            } else if let Some(query) = name {
                print_sessions(&store.find_by_name(&query));
            } else if list {
                let mut sessions = store.list();
                sessions.reverse();
                print_sessions(&sessions);
            } else {
                println!(
                    "{} sessions in {} ({} saved overall)",
                    store.len(),
                    history.path().display(),
                    store.total_sessions()
                );
            }
        }

        Commands::Config { list, set, get, init } => {
            let path = cli.config.clone().unwrap_or_else(AppConfig::default_config_path);

            if init {
                let mut fresh = AppConfig::default();
                fresh.save_to_file(&path)?;
                println!("{}", format!("✓ Wrote default configuration to {}", path.display()).green());
            } else if let Some(key_value) = set {
                let (key, value) = key_value
                    .split_once('=')
                    .context("Expected key=value")?;
                config.set_value(key.trim(), value.trim())?;
                config.save_to_file(&path)?;
                println!("{}", format!("✓ {} = {}", key.trim(), value.trim()).green());
            } else if let Some(key) = get {
                println!("{}", config.get_value(&key)?);
            } else if list {
                for (key, value) in config.list_values() {
                    println!("{} = {}", key.bold(), value);
                }
            } else {
                println!("Config file: {}", path.display());
            }
        }
    }

    Ok(())
}

fn read_inputs_file(path: &Path) -> Result<UserInputs> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read input file: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Invalid input JSON in {}", path.display()))
}

fn print_results(inputs: &UserInputs, results: &CalculationResults, format: ExportFormat) -> Result<()> {
    match format {
        ExportFormat::Text => print!("{}", text::render_results(inputs, results, true)?),
        ExportFormat::Json => println!("{}", serde_json::to_string_pretty(results)?),
        ExportFormat::Csv => {
            let rows = vec![(1, inputs.clone(), results.clone())];
            export::csv::write_results(&rows, std::io::stdout())?;
        }
    }
    Ok(())
}

fn reject_row(report: &mut DiagnosticReport, row: usize, error: CaltrakError) {
    let location = format!("row {}", row);
    error.log(&location);
    report.add_error(location, &error);
}

fn print_sessions(sessions: &[&Session]) {
    if sessions.is_empty() {
        println!("{}", "No matching sessions".yellow());
        return;
    }

    let rows: Vec<SessionRow> = sessions
        .iter()
        .map(|session| SessionRow {
            id: session.id.to_string(),
            saved: session.created_at.format("%Y-%m-%d %H:%M").to_string(),
            name: session.inputs.name.clone().unwrap_or_default(),
            goal: session.inputs.goal.to_string(),
            calories: session.results.calories,
            safety: session.results.safety_level.to_string(),
        })
        .collect();
    println!("{}", Table::new(rows).with(Style::rounded()));
}

fn run_batch(config: &AppConfig, input: &Path, output: &Path, report_path: Option<&Path>) -> Result<()> {
    let started = Instant::now();
    let mut report = DiagnosticReport::new("batch");
    report.add_context("input", input.display().to_string());
    report.add_context("output", output.display().to_string());

    println!("{}", format!("Calculating targets from {}...", input.display()).blue().bold());

    let rows = CsvInputImporter::new(config.settings.default_units).import_file(input)?;
    let total = rows.len();

    let mut accepted = Vec::new();
    for row in rows {
        match row.inputs {
            Ok(inputs) => match InputValidator::validate(&inputs) {
                Ok(()) => accepted.push((row.row, inputs)),
                Err(e) => reject_row(&mut report, row.row, e.into()),
            },
            Err(e) => reject_row(&mut report, row.row, e.into()),
        }
    }

    let computed: Vec<(usize, UserInputs, CalculationResults)> = accepted
        .into_par_iter()
        .map(|(row, inputs)| {
            let results = MetabolicCalculator::compute(&inputs);
            (row, inputs, results)
        })
        .collect();

    for (row, _, results) in &computed {
        for warning in &results.warnings {
            report.add_warning(format!("row {}: {}", row, warning));
        }
    }

    let file = std::fs::File::create(output)
        .with_context(|| format!("Failed to create {}", output.display()))?;
    export::csv::write_results(&computed, file)?;

    report.set_processed(total);
    report.set_duration(started.elapsed());
    report.set_success(report.errors.is_empty());

    let skipped = report.errors.len();
    println!(
        "{}",
        format!("✓ {} of {} rows calculated, {} skipped", computed.len(), total, skipped).green()
    );
    for error in &report.errors {
        eprintln!("{}", format!("  {}: {}", error.location, error.message).yellow());
    }

    if let Some(path) = report_path {
        report.save_to_file(path)?;
    }

    Ok(())
}
