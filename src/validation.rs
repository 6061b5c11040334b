use crate::models::UserInputs;
use std::fmt;
use thiserror::Error;

/// Accepted bodyweight range, caller's unit
pub const WEIGHT_RANGE: (f64, f64) = (20.0, 500.0);
/// Accepted body fat range (%)
pub const BODY_FAT_RANGE: (f64, f64) = (3.0, 50.0);
/// Accepted age range (years)
pub const AGE_RANGE: (u32, u32) = (10, 120);
/// Accepted height range (cm, after conversion)
pub const HEIGHT_CM_RANGE: (f64, f64) = (100.0, 250.0);
/// Accepted weekly rate range, caller's unit per week
pub const WEEKLY_RATE_RANGE: (f64, f64) = (0.0, 2.0);

/// A single out-of-bounds field
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationIssue {
    pub field: &'static str,
    pub value: String,
    pub reason: String,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={} ({})", self.field, self.value, self.reason)
    }
}

/// Input rejected before calculation
#[derive(Debug, Error)]
#[error("{} invalid field(s): {}", .issues.len(), format_issues(.issues))]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

fn format_issues(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(|issue| issue.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Bounds checks applied before inputs reach the calculator
pub struct InputValidator;

impl InputValidator {
    /// Reject inputs with any out-of-bounds field
    pub fn validate(inputs: &UserInputs) -> Result<(), ValidationError> {
        let issues = Self::issues(inputs);
        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }

    /// Collect every issue without failing
    pub fn issues(inputs: &UserInputs) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();

        Self::check_range(&mut issues, "weight", inputs.weight, WEIGHT_RANGE);
        Self::check_range(&mut issues, "bodyFat", inputs.body_fat, BODY_FAT_RANGE);

        if let Some(age) = inputs.provided_age() {
            if !(AGE_RANGE.0..=AGE_RANGE.1).contains(&age) {
                issues.push(ValidationIssue {
                    field: "age",
                    value: age.to_string(),
                    reason: format!("must be between {} and {} years", AGE_RANGE.0, AGE_RANGE.1),
                });
            }
        }

        if let Some(height) = inputs.provided_height() {
            let height_cm = inputs.unit_system.height_to_cm(height);
            if !height_cm.is_finite()
                || height_cm < HEIGHT_CM_RANGE.0
                || height_cm > HEIGHT_CM_RANGE.1
            {
                issues.push(ValidationIssue {
                    field: "height",
                    value: height.to_string(),
                    reason: format!(
                        "must be between {} and {} cm",
                        HEIGHT_CM_RANGE.0, HEIGHT_CM_RANGE.1
                    ),
                });
            }
        }

        if let Some(target) = inputs.provided_target_weight() {
            Self::check_range(&mut issues, "targetWeight", target, WEIGHT_RANGE);
        }

        if let Some(rate) = inputs.weekly_rate {
            Self::check_range(&mut issues, "weeklyRate", rate, WEEKLY_RATE_RANGE);
        }

        issues
    }

    fn check_range(
        issues: &mut Vec<ValidationIssue>,
        field: &'static str,
        value: f64,
        (min, max): (f64, f64),
    ) {
        if !value.is_finite() || value < min || value > max {
            issues.push(ValidationIssue {
                field,
                value: value.to_string(),
                reason: format!("must be between {} and {}", min, max),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ActivityLevel, Gender, Goal, UnitSystem};

    fn valid_inputs() -> UserInputs {
        UserInputs::new(
            UnitSystem::Metric,
            Gender::Female,
            62.0,
            24.0,
            ActivityLevel::Light,
            Goal::Cut,
        )
        .with_age_and_height(34, 168.0)
        .with_target(58.0, 0.4)
    }

    #[test]
    fn test_valid_inputs_pass() {
        assert!(InputValidator::validate(&valid_inputs()).is_ok());
    }

    #[test]
    fn test_collects_every_issue() {
        let mut inputs = valid_inputs();
        inputs.body_fat = 65.0;
        inputs.age = Some(7);
        inputs.weekly_rate = Some(3.0);

        let err = InputValidator::validate(&inputs).unwrap_err();
        let fields: Vec<_> = err.issues.iter().map(|i| i.field).collect();
        assert_eq!(fields, vec!["bodyFat", "age", "weeklyRate"]);
        assert!(err.to_string().starts_with("3 invalid field(s)"));
    }

    #[test]
    fn test_imperial_height_checked_in_cm() {
        let mut inputs = valid_inputs();
        inputs.unit_system = UnitSystem::Imperial;
        inputs.weight = 140.0;
        inputs.target_weight = Some(130.0);
        inputs.height = Some(66.0);
        assert!(InputValidator::validate(&inputs).is_ok());

        inputs.height = Some(30.0);
        assert_eq!(InputValidator::issues(&inputs)[0].field, "height");
    }

    #[test]
    fn test_zero_optionals_skip_checks() {
        let mut inputs = valid_inputs();
        inputs.age = Some(0);
        inputs.height = Some(0.0);
        inputs.target_weight = Some(0.0);
        inputs.weekly_rate = Some(0.0);
        assert!(InputValidator::validate(&inputs).is_ok());
    }

    #[test]
    fn test_non_finite_weight_rejected() {
        let mut inputs = valid_inputs();
        inputs.weight = f64::NAN;
        assert_eq!(InputValidator::issues(&inputs).len(), 1);
    }
}
