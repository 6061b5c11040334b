//! Milestone projection rules
//!
//! Milestones are produced by an ordered table of rules. Each rule is scoped to
//! one goal, decides whether it applies, and projects the weight change still
//! needed to reach it. Rules are evaluated in table order.

use crate::models::{Gender, Goal, Milestone, UnitSystem};

/// Default weekly loss rate when none was given (caller's unit per week)
pub const DEFAULT_CUT_RATE: f64 = 0.5;
/// Default weekly gain rate when none was given
pub const DEFAULT_BULK_RATE: f64 = 0.25;

/// Inputs a milestone rule needs, already normalized to kilograms
#[derive(Debug, Clone, Copy)]
pub struct ProjectionContext {
    pub gender: Gender,
    pub unit_system: UnitSystem,
    pub weight_kg: f64,
    pub lbm_kg: f64,
    pub body_fat: f64,
    /// Weekly rate in the caller's unit
    pub rate: f64,
}

impl ProjectionContext {
    /// Weight at which the current lean mass sits at `body_fat_pct`
    fn weight_at_body_fat_kg(&self, body_fat_pct: f64) -> f64 {
        self.lbm_kg / (1.0 - body_fat_pct / 100.0)
    }

    /// Weeks to lose down to `body_fat_pct`, never negative
    fn weeks_to_body_fat(&self, body_fat_pct: f64) -> u32 {
        let delta_kg = self.weight_kg - self.weight_at_body_fat_kg(body_fat_pct);
        let delta = self.unit_system.weight_from_kg(delta_kg);
        weeks_for(delta, self.rate)
    }
}

/// What triggers a rule and how its distance is measured
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MilestoneTrigger {
    /// Body fat above a gender-specific threshold; distance is the fat to lose
    BodyFatAbove { male: f64, female: f64 },
    /// Always applies; distance is a multiple of the unit's mass benchmark
    MassGained { benchmark_multiple: f64 },
}

/// One row of the projection table
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MilestoneRule {
    pub goal: Goal,
    pub trigger: MilestoneTrigger,
    pub label: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
}

pub const MILESTONE_RULES: &[MilestoneRule] = &[
    MilestoneRule {
        goal: Goal::Cut,
        trigger: MilestoneTrigger::BodyFatAbove { male: 12.0, female: 20.0 },
        label: "CORE DEFINITION",
        description: "Visual abdominal separation projected at ~{threshold}% Body Fat.",
        icon: "fa-shield-halved",
    },
    MilestoneRule {
        goal: Goal::Cut,
        trigger: MilestoneTrigger::BodyFatAbove { male: 8.0, female: 16.0 },
        label: "PEAK VASCULARITY",
        description: "Subcutaneous water reduction and vein visibility peak at {threshold}%.",
        icon: "fa-bolt",
    },
    MilestoneRule {
        goal: Goal::Bulk,
        trigger: MilestoneTrigger::MassGained { benchmark_multiple: 1.0 },
        label: "+{gain}{unit} BENCHMARK",
        description: "Significant hypertrophy crossover. Size increase becomes visible in clothing.",
        icon: "fa-dumbbell",
    },
    MilestoneRule {
        goal: Goal::Bulk,
        trigger: MilestoneTrigger::MassGained { benchmark_multiple: 2.0 },
        label: "STRENGTH PLATEAU OVERRIDE",
        description: "Neural adaptation and mass gain synergy. Expect multi-rep PRs across compound lifts.",
        icon: "fa-gauge-high",
    },
];

impl MilestoneRule {
    /// Evaluate this rule, returning a milestone when it applies
    pub fn evaluate(&self, goal: Goal, ctx: &ProjectionContext) -> Option<Milestone> {
        if self.goal != goal {
            return None;
        }

        match self.trigger {
            MilestoneTrigger::BodyFatAbove { male, female } => {
                let threshold = match ctx.gender {
                    Gender::Male => male,
                    Gender::Female => female,
                };
                if ctx.body_fat <= threshold {
                    return None;
                }
                let threshold_text = threshold.to_string();
                Some(Milestone {
                    label: self.label.to_string(),
                    weeks: ctx.weeks_to_body_fat(threshold),
                    description: self.description.replace("{threshold}", &threshold_text),
                    icon: self.icon.to_string(),
                })
            }
            MilestoneTrigger::MassGained { benchmark_multiple } => {
                let benchmark = ctx.unit_system.mass_gain_benchmark();
                let label = self
                    .label
                    .replace("{gain}", &benchmark.to_string())
                    .replace("{unit}", &ctx.unit_system.weight_unit().to_uppercase());
                Some(Milestone {
                    label,
                    weeks: weeks_for(benchmark * benchmark_multiple, ctx.rate),
                    description: self.description.to_string(),
                    icon: self.icon.to_string(),
                })
            }
        }
    }
}

/// Default weekly rate for a goal when the caller gave none
pub fn default_rate(goal: Goal) -> f64 {
    match goal {
        Goal::Bulk => DEFAULT_BULK_RATE,
        Goal::Cut | Goal::Recomp => DEFAULT_CUT_RATE,
    }
}

/// Run the rule table for a goal, in table order
pub fn project_milestones(goal: Goal, ctx: &ProjectionContext) -> Vec<Milestone> {
    MILESTONE_RULES
        .iter()
        .filter_map(|rule| rule.evaluate(goal, ctx))
        .collect()
}

/// ceil(distance / rate) clamped at zero
fn weeks_for(distance: f64, rate: f64) -> u32 {
    if rate <= 0.0 || !distance.is_finite() {
        return 0;
    }
    (distance / rate).max(0.0).ceil() as u32
}
