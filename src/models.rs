use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Measurement system the caller entered weight and height in
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitSystem {
    /// Kilograms and centimeters
    #[default]
    Metric,
    /// Pounds and inches
    Imperial,
}

/// Biological sex, selects the BMR constant and the calorie floor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

/// Habitual activity level used for the TDEE multiplier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityLevel {
    /// Desk job, minimal movement, 0-1 days/week training
    Sedentary,
    /// Light exercise 1-3 days/week
    Light,
    /// Moderate exercise 3-5 days/week
    Moderate,
    /// Intense exercise 6-7 days/week
    Heavy,
    /// Physically demanding job or twice-daily training
    ExtraActive,
}

/// Body composition goal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Goal {
    /// Fat loss in a caloric deficit
    Cut,
    /// Body recomposition at maintenance
    Recomp,
    /// Mass gain in a caloric surplus
    Bulk,
}

impl Goal {
    /// Cut and bulk change bodyweight, recomp does not
    pub fn changes_weight(&self) -> bool {
        matches!(self, Goal::Cut | Goal::Bulk)
    }
}

/// Ordinal classification of the calorie target against the safety floor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SafetyLevel {
    Optimal,
    Caution,
    Critical,
}

/// BMR estimation formula actually applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FormulaUsed {
    #[serde(rename = "Katch-McArdle")]
    KatchMcArdle,
    #[serde(rename = "Mifflin-St Jeor")]
    MifflinStJeor,
}

impl UnitSystem {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitSystem::Metric => "metric",
            UnitSystem::Imperial => "imperial",
        }
    }
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
        }
    }
}

impl ActivityLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityLevel::Sedentary => "sedentary",
            ActivityLevel::Light => "light",
            ActivityLevel::Moderate => "moderate",
            ActivityLevel::Heavy => "heavy",
            ActivityLevel::ExtraActive => "extra_active",
        }
    }

    /// Short human description shown next to the activity choice
    pub fn description(&self) -> &'static str {
        match self {
            ActivityLevel::Sedentary => "Desk job, minimal movement, 0-1 days/week gym",
            ActivityLevel::Light => "Light exercise 1-3 days/week, some daily walking",
            ActivityLevel::Moderate => "Moderate exercise 3-5 days/week, active daily",
            ActivityLevel::Heavy => "Intense exercise 6-7 days/week, very active job",
            ActivityLevel::ExtraActive => "Elite athlete, physically demanding job, 2x training",
        }
    }
}

impl Goal {
    pub fn as_str(&self) -> &'static str {
        match self {
            Goal::Cut => "cut",
            Goal::Recomp => "recomp",
            Goal::Bulk => "bulk",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Goal::Cut => "Cut (15% Deficit)",
            Goal::Recomp => "Recomp (Body Composition)",
            Goal::Bulk => "Bulk (10% Surplus)",
        }
    }
}

impl SafetyLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SafetyLevel::Optimal => "OPTIMAL",
            SafetyLevel::Caution => "CAUTION",
            SafetyLevel::Critical => "CRITICAL",
        }
    }
}

impl FormulaUsed {
    pub fn as_str(&self) -> &'static str {
        match self {
            FormulaUsed::KatchMcArdle => "Katch-McArdle",
            FormulaUsed::MifflinStJeor => "Mifflin-St Jeor",
        }
    }
}

macro_rules! display_as_str {
    ($($ty:ty),*) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(self.as_str())
                }
            }
        )*
    };
}

display_as_str!(UnitSystem, Gender, ActivityLevel, Goal, SafetyLevel, FormulaUsed);

impl FromStr for UnitSystem {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "metric" | "kg" => Ok(UnitSystem::Metric),
            "imperial" | "lb" | "lbs" => Ok(UnitSystem::Imperial),
            _ => Err(format!("Invalid unit system: {}", s)),
        }
    }
}

impl FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "male" | "m" => Ok(Gender::Male),
            "female" | "f" => Ok(Gender::Female),
            _ => Err(format!("Invalid gender: {}", s)),
        }
    }
}

impl FromStr for ActivityLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "sedentary" => Ok(ActivityLevel::Sedentary),
            "light" => Ok(ActivityLevel::Light),
            "moderate" => Ok(ActivityLevel::Moderate),
            "heavy" => Ok(ActivityLevel::Heavy),
            "extra_active" | "extra" => Ok(ActivityLevel::ExtraActive),
            _ => Err(format!("Invalid activity level: {}", s)),
        }
    }
}

impl FromStr for Goal {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cut" => Ok(Goal::Cut),
            "recomp" => Ok(Goal::Recomp),
            "bulk" => Ok(Goal::Bulk),
            _ => Err(format!("Invalid goal: {}", s)),
        }
    }
}

/// Biometric input for one calculation
///
/// Weight, target weight and weekly rate are in kg for metric input and lb for
/// imperial input; height is in cm or inches respectively.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInputs {
    /// Display label for the session, ignored by the calculation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default)]
    pub unit_system: UnitSystem,

    pub gender: Gender,

    /// Current bodyweight
    pub weight: f64,

    /// Body fat percentage (0-100)
    pub body_fat: f64,

    pub activity_level: ActivityLevel,

    pub goal: Goal,

    /// Age in years
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,

    /// Goal bodyweight, same unit as `weight`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_weight: Option<f64>,

    /// Desired weekly change magnitude, same unit as `weight`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weekly_rate: Option<f64>,
}

impl UserInputs {
    /// Minimal input with every optional field absent
    pub fn new(
        unit_system: UnitSystem,
        gender: Gender,
        weight: f64,
        body_fat: f64,
        activity_level: ActivityLevel,
        goal: Goal,
    ) -> Self {
        Self {
            name: None,
            unit_system,
            gender,
            weight,
            body_fat,
            activity_level,
            goal,
            age: None,
            height: None,
            target_weight: None,
            weekly_rate: None,
        }
    }

    pub fn with_age_and_height(mut self, age: u32, height: f64) -> Self {
        self.age = Some(age);
        self.height = Some(height);
        self
    }

    pub fn with_target(mut self, target_weight: f64, weekly_rate: f64) -> Self {
        self.target_weight = Some(target_weight);
        self.weekly_rate = Some(weekly_rate);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    // Zero is treated the same as absent for the optional numeric fields.

    pub fn provided_age(&self) -> Option<u32> {
        self.age.filter(|age| *age > 0)
    }

    pub fn provided_height(&self) -> Option<f64> {
        self.height.filter(|h| *h > 0.0)
    }

    pub fn provided_target_weight(&self) -> Option<f64> {
        self.target_weight.filter(|w| *w > 0.0)
    }

    pub fn provided_weekly_rate(&self) -> Option<f64> {
        self.weekly_rate.filter(|r| *r > 0.0)
    }
}

/// Projected checkpoint on the way to the goal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Milestone {
    pub label: String,
    /// Whole weeks until the milestone is reached
    pub weeks: u32,
    pub description: String,
    /// Icon tag for the presentation layer
    pub icon: String,
}

/// Fully derived output of one calculation
///
/// Every value is final: callers render it verbatim and never re-round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationResults {
    /// Daily calorie target after goal adjustment and safety floor (kcal)
    pub calories: u32,
    pub protein_g: u32,
    pub protein_pct: u32,
    pub carbs_g: u32,
    pub carbs_pct: u32,
    pub fat_g: u32,
    pub fat_pct: u32,
    pub fiber_g: u32,
    /// Daily water target in liters, one decimal
    pub water_liters: f64,
    /// Lean body mass in the caller's weight unit
    pub lbm: u32,
    pub bmr: u32,
    pub tdee: u32,
    pub formula_used: FormulaUsed,
    pub expected_weight_change: String,
    pub warnings: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub months_to_target: Option<String>,
    pub safety_level: SafetyLevel,
    pub milestones: Vec<Milestone>,
}
