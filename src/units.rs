//! Boundary conversion between the caller's unit system and SI
//!
//! All metabolic arithmetic runs in kilograms and centimeters. Conversions to
//! and from pounds and inches happen only here.

use crate::models::UnitSystem;

// ============================================================================
// Conversion Constants
// ============================================================================

/// Kilograms per pound
pub const KG_PER_LB: f64 = 0.453592;
/// Centimeters per inch
pub const CM_PER_INCH: f64 = 2.54;

/// Daily kcal delta per kg of desired weekly change
pub const KCAL_PER_DAY_PER_WEEKLY_KG: f64 = 1100.0;
/// Daily kcal delta per lb of desired weekly change
pub const KCAL_PER_DAY_PER_WEEKLY_LB: f64 = 500.0;

impl UnitSystem {
    /// Convert a bodyweight in this system to kilograms
    pub fn weight_to_kg(&self, weight: f64) -> f64 {
        match self {
            UnitSystem::Metric => weight,
            UnitSystem::Imperial => weight * KG_PER_LB,
        }
    }

    /// Convert kilograms back to this system's weight unit
    pub fn weight_from_kg(&self, kg: f64) -> f64 {
        match self {
            UnitSystem::Metric => kg,
            UnitSystem::Imperial => kg / KG_PER_LB,
        }
    }

    /// Convert a height in this system to centimeters
    pub fn height_to_cm(&self, height: f64) -> f64 {
        match self {
            UnitSystem::Metric => height,
            UnitSystem::Imperial => height * CM_PER_INCH,
        }
    }

    /// Daily calorie delta for one unit of weekly weight change
    pub fn kcal_per_day_per_weekly_unit(&self) -> f64 {
        match self {
            UnitSystem::Metric => KCAL_PER_DAY_PER_WEEKLY_KG,
            UnitSystem::Imperial => KCAL_PER_DAY_PER_WEEKLY_LB,
        }
    }

    /// Lowercase weight unit ("kg" / "lb")
    pub fn weight_unit(&self) -> &'static str {
        match self {
            UnitSystem::Metric => "kg",
            UnitSystem::Imperial => "lb",
        }
    }

    pub fn height_unit(&self) -> &'static str {
        match self {
            UnitSystem::Metric => "cm",
            UnitSystem::Imperial => "in",
        }
    }

    /// Reference mass-gain step for bulk milestones, in this system's unit
    pub fn mass_gain_benchmark(&self) -> f64 {
        match self {
            UnitSystem::Metric => 5.0,
            UnitSystem::Imperial => 10.0,
        }
    }
}

/// Round half up, matching how the results are presented (2.5 -> 3)
pub fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}

/// Round to one decimal place
pub fn round_tenths(value: f64) -> f64 {
    round_half_up(value * 10.0) / 10.0
}

/// Round half up and narrow to an unsigned count; negatives saturate to zero
pub fn round_to_u32(value: f64) -> u32 {
    round_half_up(value).max(0.0) as u32
}
