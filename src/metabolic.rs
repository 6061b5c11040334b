//! Metabolic estimation engine
//!
//! Turns one [`UserInputs`] record into a complete [`CalculationResults`]:
//! lean mass, BMR, TDEE, a goal-adjusted calorie target clamped to a safety
//! floor, the macro split, and goal projections.
//!
//! The computation is a pure function of its input. It never fails; unusual
//! inputs are absorbed by clamping and surface as `warnings` and
//! `safety_level`.

use tracing::{debug, warn};

use crate::milestones::{self, ProjectionContext};
use crate::models::{
    ActivityLevel, CalculationResults, FormulaUsed, Gender, Goal, SafetyLevel, UserInputs,
};
use crate::units::{round_tenths, round_to_u32};

/// Katch-McArdle intercept (kcal/day)
pub const KATCH_MCARDLE_BASE: f64 = 370.0;
/// Katch-McArdle kcal per kg of lean mass
pub const KATCH_MCARDLE_LBM_COEF: f64 = 21.6;

/// Margin above the floor that still counts as CAUTION (kcal/day)
pub const CAUTION_MARGIN: f64 = 200.0;

/// Protein g/kg while cutting or bulking
pub const ACTIVE_GOAL_PROTEIN_G_PER_KG: f64 = 2.2;
/// Minimum essential fat, g per kg bodyweight
pub const MIN_FAT_G_PER_KG: f64 = 0.6;
/// Share of calories allotted to fat before the essential minimum applies
pub const FAT_CALORIE_SHARE: f64 = 0.25;

pub const KCAL_PER_G_PROTEIN: f64 = 4.0;
pub const KCAL_PER_G_CARB: f64 = 4.0;
pub const KCAL_PER_G_FAT: f64 = 9.0;

/// Fiber grams per 1000 kcal, and the floor
pub const FIBER_G_PER_1000_KCAL: f64 = 14.0;
pub const MIN_FIBER_G: u32 = 20;

/// Average weeks per month for timeline formatting
pub const WEEKS_PER_MONTH: f64 = 4.345;

/// Water liters per kg bodyweight before the activity bonus
pub const WATER_L_PER_KG: f64 = 0.035;
pub const MIN_WATER_L: f64 = 1.0;
pub const MAX_WATER_L: f64 = 10.0;

impl ActivityLevel {
    /// TDEE multiplier over BMR
    pub fn tdee_multiplier(&self) -> f64 {
        match self {
            ActivityLevel::Sedentary => 1.20,
            ActivityLevel::Light => 1.375,
            ActivityLevel::Moderate => 1.55,
            ActivityLevel::Heavy => 1.725,
            ActivityLevel::ExtraActive => 1.90,
        }
    }

    /// Protein g/kg used for recomposition
    pub fn recomp_protein_g_per_kg(&self) -> f64 {
        match self {
            ActivityLevel::Sedentary => 1.0,
            ActivityLevel::Light => 1.6,
            ActivityLevel::Moderate => 1.8,
            ActivityLevel::Heavy => 2.0,
            ActivityLevel::ExtraActive => 2.2,
        }
    }

    /// Extra daily water for training volume (liters)
    pub fn water_bonus_liters(&self) -> f64 {
        match self {
            ActivityLevel::Sedentary => 0.0,
            ActivityLevel::Light => 0.25,
            ActivityLevel::Moderate => 0.5,
            ActivityLevel::Heavy => 0.75,
            ActivityLevel::ExtraActive => 1.0,
        }
    }
}

impl Goal {
    /// Fixed TDEE multiplier when no weekly rate drives the target
    pub fn calorie_multiplier(&self) -> f64 {
        match self {
            Goal::Cut => 0.85,
            Goal::Recomp => 1.00,
            Goal::Bulk => 1.10,
        }
    }
}

impl Gender {
    /// Absolute minimum daily calories
    pub fn calorie_floor(&self) -> f64 {
        match self {
            Gender::Male => 1500.0,
            Gender::Female => 1200.0,
        }
    }

    fn mifflin_constant(&self) -> f64 {
        match self {
            Gender::Male => 5.0,
            Gender::Female => -161.0,
        }
    }
}

/// BMR along with the formula that produced it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BmrEstimate {
    pub bmr: f64,
    pub formula: FormulaUsed,
}

/// Calorie target after the safety floor was applied
#[derive(Debug, Clone, PartialEq)]
pub struct CalorieTarget {
    pub calories: f64,
    pub safety_level: SafetyLevel,
    pub warning: Option<String>,
}

/// Macro split in grams and percentages
#[derive(Debug, Clone, PartialEq)]
pub struct MacroSplit {
    pub protein_g: f64,
    pub fat_g: f64,
    pub carbs_g: f64,
    pub protein_pct: u32,
    pub fat_pct: u32,
    pub carbs_pct: u32,
    pub warning: Option<String>,
}

/// Metabolic calculation engine
pub struct MetabolicCalculator;

impl MetabolicCalculator {
    /// Compute the full result for one input record
    pub fn compute(inputs: &UserInputs) -> CalculationResults {
        let units = inputs.unit_system;

        let weight_kg = units.weight_to_kg(inputs.weight);
        let height_cm = inputs.provided_height().map(|h| units.height_to_cm(h));
        let lbm_kg = Self::lean_body_mass(weight_kg, inputs.body_fat);

        let estimate = Self::estimate_bmr(weight_kg, lbm_kg, height_cm, inputs.provided_age(), inputs.gender);
        let tdee = Self::tdee(estimate.bmr, inputs.activity_level);

        let raw_target = Self::raw_calorie_target(tdee, inputs);
        let target = Self::apply_safety_floor(raw_target, inputs.gender);

        let split = Self::macro_split(
            target.calories,
            weight_kg,
            inputs.goal,
            inputs.activity_level,
        );

        let mut warnings = Vec::new();
        if let Some(warning) = &target.warning {
            warn!(
                raw_target = raw_target,
                floor = inputs.gender.calorie_floor(),
                "Calorie target clamped to safety floor"
            );
            warnings.push(warning.clone());
        }
        if let Some(warning) = split.warning.clone() {
            warnings.push(warning);
        }

        let context = ProjectionContext {
            gender: inputs.gender,
            unit_system: units,
            weight_kg,
            lbm_kg,
            body_fat: inputs.body_fat,
            rate: inputs
                .provided_weekly_rate()
                .unwrap_or_else(|| milestones::default_rate(inputs.goal)),
        };
        let milestones = milestones::project_milestones(inputs.goal, &context);

        let (months_to_target, expected_weight_change) = Self::timeline(inputs);

        debug!(
            formula = %estimate.formula,
            bmr = estimate.bmr,
            tdee = tdee,
            target = target.calories,
            safety = %target.safety_level,
            milestones = milestones.len(),
            "Metabolic calculation complete"
        );

        CalculationResults {
            calories: round_to_u32(target.calories),
            protein_g: round_to_u32(split.protein_g),
            protein_pct: split.protein_pct,
            carbs_g: round_to_u32(split.carbs_g),
            carbs_pct: split.carbs_pct,
            fat_g: round_to_u32(split.fat_g),
            fat_pct: split.fat_pct,
            fiber_g: Self::fiber_grams(target.calories),
            water_liters: Self::water_liters(weight_kg, inputs.activity_level),
            lbm: round_to_u32(units.weight_from_kg(lbm_kg)),
            bmr: round_to_u32(estimate.bmr),
            tdee: round_to_u32(tdee),
            formula_used: estimate.formula,
            expected_weight_change,
            warnings,
            months_to_target,
            safety_level: target.safety_level,
            milestones,
        }
    }

    /// Lean body mass in kg
    pub fn lean_body_mass(weight_kg: f64, body_fat: f64) -> f64 {
        weight_kg * (1.0 - body_fat / 100.0)
    }

    /// Select and apply a BMR formula
    ///
    /// Mifflin-St Jeor is used when both age and height are known, otherwise
    /// Katch-McArdle from lean mass alone.
    pub fn estimate_bmr(
        weight_kg: f64,
        lbm_kg: f64,
        height_cm: Option<f64>,
        age: Option<u32>,
        gender: Gender,
    ) -> BmrEstimate {
        match (age, height_cm) {
            (Some(age), Some(height_cm)) => BmrEstimate {
                bmr: 10.0 * weight_kg + 6.25 * height_cm - 5.0 * f64::from(age)
                    + gender.mifflin_constant(),
                formula: FormulaUsed::MifflinStJeor,
            },
            _ => BmrEstimate {
                bmr: KATCH_MCARDLE_BASE + KATCH_MCARDLE_LBM_COEF * lbm_kg,
                formula: FormulaUsed::KatchMcArdle,
            },
        }
    }

    pub fn tdee(bmr: f64, activity_level: ActivityLevel) -> f64 {
        bmr * activity_level.tdee_multiplier()
    }

    /// Goal-adjusted calories before the safety floor
    ///
    /// Cut and bulk with an explicit weekly rate shift TDEE by a fixed kcal
    /// per unit of rate; everything else scales TDEE by the goal multiplier.
    pub fn raw_calorie_target(tdee: f64, inputs: &UserInputs) -> f64 {
        match (inputs.goal, inputs.provided_weekly_rate()) {
            (Goal::Cut, Some(rate)) => {
                tdee - rate * inputs.unit_system.kcal_per_day_per_weekly_unit()
            }
            (Goal::Bulk, Some(rate)) => {
                tdee + rate * inputs.unit_system.kcal_per_day_per_weekly_unit()
            }
            (goal, _) => tdee * goal.calorie_multiplier(),
        }
    }

    /// Clamp to the gender floor and classify
    pub fn apply_safety_floor(target: f64, gender: Gender) -> CalorieTarget {
        let floor = gender.calorie_floor();

        if target < floor {
            CalorieTarget {
                calories: floor,
                safety_level: SafetyLevel::Critical,
                warning: Some(format!(
                    "Metabolic Alert: Calories below {} safety floor. Clamped.",
                    floor
                )),
            }
        } else if target < floor + CAUTION_MARGIN {
            CalorieTarget {
                calories: target,
                safety_level: SafetyLevel::Caution,
                warning: None,
            }
        } else {
            CalorieTarget {
                calories: target,
                safety_level: SafetyLevel::Optimal,
                warning: None,
            }
        }
    }

    /// Split the calorie target into protein, fat and carbohydrate
    ///
    /// Protein and fat percentages are rounded on their own and carbs take the
    /// remainder, so the three always sum to 100.
    pub fn macro_split(
        calories: f64,
        weight_kg: f64,
        goal: Goal,
        activity_level: ActivityLevel,
    ) -> MacroSplit {
        let protein_per_kg = if goal.changes_weight() {
            ACTIVE_GOAL_PROTEIN_G_PER_KG
        } else {
            activity_level.recomp_protein_g_per_kg()
        };
        let protein_g = weight_kg * protein_per_kg;
        let protein_kcal = protein_g * KCAL_PER_G_PROTEIN;

        let fat_g = (MIN_FAT_G_PER_KG * weight_kg).max(calories * FAT_CALORIE_SHARE / KCAL_PER_G_FAT);
        let fat_kcal = fat_g * KCAL_PER_G_FAT;

        let carbs_kcal = calories - protein_kcal - fat_kcal;
        let carbs_g = (carbs_kcal / KCAL_PER_G_CARB).max(0.0);

        let protein_pct = round_to_u32(protein_kcal / calories * 100.0);
        let fat_pct = round_to_u32(fat_kcal / calories * 100.0);

        if protein_pct + fat_pct <= 100 {
            return MacroSplit {
                protein_g,
                fat_g,
                carbs_g,
                protein_pct,
                fat_pct,
                carbs_pct: 100 - protein_pct - fat_pct,
                warning: None,
            };
        }

        // Protein and fat minimums alone exceed the budget: express the split
        // over the calories actually allocated.
        let allocated_kcal = protein_kcal + fat_kcal;
        let protein_pct = round_to_u32(protein_kcal / allocated_kcal * 100.0).min(100);
        MacroSplit {
            protein_g,
            fat_g,
            carbs_g,
            protein_pct,
            fat_pct: 100 - protein_pct,
            carbs_pct: 0,
            warning: Some(format!(
                "Macro Alert: Protein and fat minimums ({:.0} kcal) exceed the {:.0} kcal target. Carbohydrates set to zero.",
                allocated_kcal, calories
            )),
        }
    }

    /// Fiber target in grams, never below the floor
    pub fn fiber_grams(calories: f64) -> u32 {
        round_to_u32(FIBER_G_PER_1000_KCAL * calories / 1000.0).max(MIN_FIBER_G)
    }

    /// Daily water target in liters
    pub fn water_liters(weight_kg: f64, activity_level: ActivityLevel) -> f64 {
        round_tenths(weight_kg * WATER_L_PER_KG + activity_level.water_bonus_liters())
            .clamp(MIN_WATER_L, MAX_WATER_L)
    }

    /// Time-to-target string and expected weekly change text
    ///
    /// The rate-based path reports absolute units per week; without a target
    /// and rate the defaults are phrased as a share of bodyweight.
    pub fn timeline(inputs: &UserInputs) -> (Option<String>, String) {
        if inputs.goal.changes_weight() {
            if let (Some(target), Some(rate)) =
                (inputs.provided_target_weight(), inputs.provided_weekly_rate())
            {
                let weeks = (inputs.weight - target).abs() / rate;
                let months = weeks / WEEKS_PER_MONTH;
                let sign = if inputs.goal == Goal::Bulk { '+' } else { '-' };

                return (
                    Some(format!("{:.1} MONTHS / {} WEEKS", months, weeks.ceil() as u32)),
                    format!("{}{} {}/wk", sign, rate, inputs.unit_system.weight_unit()),
                );
            }
        }

        let default_text = match inputs.goal {
            Goal::Bulk => "+0.25% bodyweight/wk",
            Goal::Cut => "-0.5% bodyweight/wk",
            Goal::Recomp => "Maintenance",
        };
        (None, default_text.to_string())
    }
}

/// Shorthand for [`MetabolicCalculator::compute`]
pub fn compute(inputs: &UserInputs) -> CalculationResults {
    MetabolicCalculator::compute(inputs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UnitSystem;

    fn male_cutter() -> UserInputs {
        UserInputs::new(
            UnitSystem::Metric,
            Gender::Male,
            90.0,
            20.0,
            ActivityLevel::Moderate,
            Goal::Cut,
        )
        .with_age_and_height(30, 180.0)
    }

    #[test]
    fn test_mifflin_selected_with_age_and_height() {
        let estimate = MetabolicCalculator::estimate_bmr(90.0, 72.0, Some(180.0), Some(30), Gender::Male);
        assert_eq!(estimate.formula, FormulaUsed::MifflinStJeor);
        assert!((estimate.bmr - 1880.0).abs() < 1e-9);

        let female = MetabolicCalculator::estimate_bmr(90.0, 72.0, Some(180.0), Some(30), Gender::Female);
        assert!((estimate.bmr - female.bmr - 166.0).abs() < 1e-9);
    }

    #[test]
    fn test_katch_mcardle_when_incomplete() {
        let no_age = MetabolicCalculator::estimate_bmr(70.0, 52.5, Some(165.0), None, Gender::Female);
        let no_height = MetabolicCalculator::estimate_bmr(70.0, 52.5, None, Some(40), Gender::Female);
        for estimate in [no_age, no_height] {
            assert_eq!(estimate.formula, FormulaUsed::KatchMcArdle);
            assert!((estimate.bmr - 1504.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_raw_target_uses_weekly_rate() {
        let mut inputs = male_cutter();
        inputs.weekly_rate = Some(0.5);
        assert!((MetabolicCalculator::raw_calorie_target(2500.0, &inputs) - 1950.0).abs() < 1e-9);

        inputs.goal = Goal::Bulk;
        assert!((MetabolicCalculator::raw_calorie_target(2500.0, &inputs) - 3050.0).abs() < 1e-9);

        inputs.unit_system = UnitSystem::Imperial;
        inputs.weekly_rate = Some(1.0);
        assert!((MetabolicCalculator::raw_calorie_target(2500.0, &inputs) - 3000.0).abs() < 1e-9);
    }

    #[test]
    fn test_recomp_ignores_weekly_rate() {
        let mut inputs = male_cutter();
        inputs.goal = Goal::Recomp;
        inputs.weekly_rate = Some(0.5);
        assert_eq!(MetabolicCalculator::raw_calorie_target(2500.0, &inputs), 2500.0);
    }

    #[test]
    fn test_safety_tiers() {
        let critical = MetabolicCalculator::apply_safety_floor(1100.0, Gender::Female);
        assert_eq!(critical.calories, 1200.0);
        assert_eq!(critical.safety_level, SafetyLevel::Critical);
        assert_eq!(
            critical.warning.as_deref(),
            Some("Metabolic Alert: Calories below 1200 safety floor. Clamped.")
        );

        let caution = MetabolicCalculator::apply_safety_floor(1650.0, Gender::Male);
        assert_eq!(caution.safety_level, SafetyLevel::Caution);
        assert!(caution.warning.is_none());

        let boundary = MetabolicCalculator::apply_safety_floor(1700.0, Gender::Male);
        assert_eq!(boundary.safety_level, SafetyLevel::Optimal);

        let at_floor = MetabolicCalculator::apply_safety_floor(1500.0, Gender::Male);
        assert_eq!(at_floor.safety_level, SafetyLevel::Caution);
    }

    #[test]
    fn test_macro_split_sums_to_100() {
        let split = MetabolicCalculator::macro_split(2476.9, 90.0, Goal::Cut, ActivityLevel::Moderate);
        assert!((split.protein_g - 198.0).abs() < 1e-9);
        assert_eq!(split.protein_pct + split.fat_pct + split.carbs_pct, 100);
        assert!(split.warning.is_none());
    }

    #[test]
    fn test_fat_floor_dominates_on_low_calories() {
        let split = MetabolicCalculator::macro_split(1500.0, 120.0, Goal::Recomp, ActivityLevel::Sedentary);
        // 0.25 * 1500 / 9 = 41.7 g, below 0.6 * 120 = 72 g
        assert!((split.fat_g - 72.0).abs() < 1e-9);
    }

    #[test]
    fn test_macro_overflow_is_rebased() {
        let split = MetabolicCalculator::macro_split(1200.0, 150.0, Goal::Cut, ActivityLevel::Moderate);
        assert_eq!(split.carbs_g, 0.0);
        assert_eq!(split.carbs_pct, 0);
        assert_eq!(split.protein_pct + split.fat_pct, 100);
        assert!(split.warning.is_some());
    }

    #[test]
    fn test_fiber_floor() {
        assert_eq!(MetabolicCalculator::fiber_grams(1200.0), 20);
        assert_eq!(MetabolicCalculator::fiber_grams(2500.0), 35);
    }

    #[test]
    fn test_water_liters() {
        assert_eq!(MetabolicCalculator::water_liters(80.0, ActivityLevel::Moderate), 3.3);
        assert_eq!(MetabolicCalculator::water_liters(20.0, ActivityLevel::Sedentary), 1.0);
    }

    #[test]
    fn test_timeline_rate_path() {
        let inputs = UserInputs::new(
            UnitSystem::Imperial,
            Gender::Male,
            200.0,
            22.0,
            ActivityLevel::Light,
            Goal::Cut,
        )
        .with_target(180.0, 1.0);

        let (months, change) = MetabolicCalculator::timeline(&inputs);
        assert_eq!(months.as_deref(), Some("4.6 MONTHS / 20 WEEKS"));
        assert_eq!(change, "-1 lb/wk");
    }

    #[test]
    fn test_timeline_defaults() {
        let mut inputs = male_cutter();
        assert_eq!(MetabolicCalculator::timeline(&inputs), (None, "-0.5% bodyweight/wk".to_string()));

        inputs.goal = Goal::Recomp;
        inputs.target_weight = Some(80.0);
        inputs.weekly_rate = Some(0.5);
        assert_eq!(MetabolicCalculator::timeline(&inputs), (None, "Maintenance".to_string()));
    }

    #[test]
    fn test_target_equal_to_weight() {
        let inputs = male_cutter().with_target(90.0, 0.5);
        let (months, _) = MetabolicCalculator::timeline(&inputs);
        assert_eq!(months.as_deref(), Some("0.0 MONTHS / 0 WEEKS"));
    }

    #[test]
    fn test_imperial_lbm_reported_in_pounds() {
        let inputs = UserInputs::new(
            UnitSystem::Imperial,
            Gender::Male,
            200.0,
            20.0,
            ActivityLevel::Moderate,
            Goal::Recomp,
        );
        let results = compute(&inputs);
        assert_eq!(results.lbm, 160);
    }
}
