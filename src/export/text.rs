use colored::{ColoredString, Colorize};
use std::fmt::{self, Write};
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::models::{CalculationResults, SafetyLevel, UserInputs};
use crate::session::Session;

#[derive(Tabled)]
struct MacroRow {
    #[tabled(rename = "Macro")]
    name: &'static str,
    #[tabled(rename = "Grams")]
    grams: u32,
    #[tabled(rename = "% kcal")]
    pct: String,
}

#[derive(Tabled)]
struct MilestoneRow {
    #[tabled(rename = "Milestone")]
    label: String,
    #[tabled(rename = "Weeks")]
    weeks: u32,
    #[tabled(rename = "Notes")]
    description: String,
}

fn safety_badge(level: SafetyLevel, colorize: bool) -> ColoredString {
    let text = level.as_str();
    if !colorize {
        return text.normal();
    }
    match level {
        SafetyLevel::Optimal => text.green().bold(),
        SafetyLevel::Caution => text.yellow().bold(),
        SafetyLevel::Critical => text.red().bold(),
    }
}

/// Human-readable report for one calculation
pub fn render_results(
    inputs: &UserInputs,
    results: &CalculationResults,
    colorize: bool,
) -> Result<String, fmt::Error> {
    let mut out = String::new();
    let units = inputs.unit_system;
    let unit = units.weight_unit();

    writeln!(
        out,
        "CALORIE TARGET: {} kcal/day  [{}]",
        results.calories,
        safety_badge(results.safety_level, colorize)
    )?;
    writeln!(
        out,
        "Goal: {}  |  Activity: {}",
        inputs.goal.label(),
        inputs.activity_level.description()
    )?;

    write!(out, "Inputs: {} {}, {}% body fat", inputs.weight, unit, inputs.body_fat)?;
    if let Some(height) = inputs.provided_height() {
        write!(out, ", {} {}", height, units.height_unit())?;
    }
    if let Some(age) = inputs.provided_age() {
        write!(out, ", {} years", age)?;
    }
    writeln!(out)?;

    writeln!(
        out,
        "BMR {} kcal ({})  |  TDEE {} kcal  |  LBM {} {}",
        results.bmr, results.formula_used, results.tdee, results.lbm, unit
    )?;
    writeln!(out)?;

    let macros = vec![
        MacroRow { name: "Protein", grams: results.protein_g, pct: format!("{}%", results.protein_pct) },
        MacroRow { name: "Carbs", grams: results.carbs_g, pct: format!("{}%", results.carbs_pct) },
        MacroRow { name: "Fat", grams: results.fat_g, pct: format!("{}%", results.fat_pct) },
        MacroRow { name: "Fiber", grams: results.fiber_g, pct: "-".to_string() },
    ];
    writeln!(out, "{}", Table::new(macros).with(Style::rounded()))?;
    writeln!(out, "Water: {} L/day", results.water_liters)?;
    writeln!(out, "Expected change: {}", results.expected_weight_change)?;
    if let Some(months) = &results.months_to_target {
        writeln!(out, "Time to target: {}", months)?;
    }

    if !results.milestones.is_empty() {
        let rows: Vec<MilestoneRow> = results
            .milestones
            .iter()
            .map(|m| MilestoneRow {
                label: m.label.clone(),
                weeks: m.weeks,
                description: m.description.clone(),
            })
            .collect();
        writeln!(out)?;
        writeln!(out, "{}", Table::new(rows).with(Style::rounded()))?;
    }

    for warning in &results.warnings {
        let line = format!("! {}", warning);
        if colorize {
            writeln!(out, "{}", line.red())?;
        } else {
            writeln!(out, "{}", line)?;
        }
    }

    Ok(out)
}

/// Report for a saved session, headed by its id and timestamp
pub fn render_session(session: &Session, colorize: bool) -> Result<String, fmt::Error> {
    let mut out = String::new();
    let name = session.inputs.name.as_deref().unwrap_or("anonymous");
    writeln!(
        out,
        "=== {} | {} | {} ===",
        session.id,
        name,
        session.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    )?;
    out.push_str(&render_results(&session.inputs, &session.results, colorize)?);
    Ok(out)
}
