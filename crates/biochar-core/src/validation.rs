//! Input checks applied before a calculation is run.
//!
//! The calculator itself accepts any number. This is where malformed or
//! physically meaningless inputs are turned away, and every problem is
//! reported at once so a form or CLI can show them together.

use crate::coefficients::is_calibrated;
use crate::inputmode::InputMode;
use crate::inputs::{CalculatorInputs, MAX_SOIL_TEMPS};

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("mass must be a positive number, got {0}")]
    NonPositiveMass(f64),
    #[error("carbon content must be within (0, 100] %, got {0}")]
    CarbonContentOutOfRange(f64),
    #[error("biochar yield must be within (0, 100] % in feedstock mode, got {0}")]
    YieldOutOfRange(f64),
    #[error("{name} ratio must be a non-negative number, got {value}")]
    InvalidRatio { name: &'static str, value: f64 },
    #[error("select between 1 and 3 soil temperatures, got {0}")]
    SoilTempCount(usize),
    #[error("soil temperature {0} °C selected more than once")]
    DuplicateSoilTemp(f64),
    #[error("soil temperature {0} °C is not calibrated, choose 5, 10, 10.9, 14.9, 15, 20 or 25")]
    UncalibratedSoilTemp(f64),
    #[error("sample name is required")]
    MissingSampleName,
    #[error("researcher name is required when data sharing is authorized")]
    MissingResearcherName,
}

fn positive_finite(v: f64) -> bool {
    v.is_finite() && v > 0.0
}

fn percent(v: f64) -> bool {
    positive_finite(v) && v <= 100.0
}

pub fn validate_inputs(inputs: &CalculatorInputs) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if !positive_finite(inputs.mass_input) {
        errors.push(ValidationError::NonPositiveMass(inputs.mass_input));
    }
    if !percent(inputs.carbon_content) {
        errors.push(ValidationError::CarbonContentOutOfRange(inputs.carbon_content));
    }
    if inputs.input_mode == InputMode::Feedstock && !percent(inputs.biochar_yield) {
        errors.push(ValidationError::YieldOutOfRange(inputs.biochar_yield));
    }
    for (name, value) in [("H/C", inputs.hc_ratio), ("O/C", inputs.oc_ratio)] {
        if !value.is_finite() || value < 0.0 {
            errors.push(ValidationError::InvalidRatio { name, value });
        }
    }

    let temps = &inputs.selected_soil_temps;
    if temps.is_empty() || temps.len() > MAX_SOIL_TEMPS {
        errors.push(ValidationError::SoilTempCount(temps.len()));
    }
    for (i, &t) in temps.iter().enumerate() {
        if temps[..i].contains(&t) {
            errors.push(ValidationError::DuplicateSoilTemp(t));
        } else if !is_calibrated(t) {
            errors.push(ValidationError::UncalibratedSoilTemp(t));
        }
    }

    if inputs.sample_name.trim().is_empty() {
        errors.push(ValidationError::MissingSampleName);
    }
    if inputs.data_authorization && inputs.project.researcher_name.trim().is_empty() {
        errors.push(ValidationError::MissingResearcherName);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert_eq!(validate_inputs(&CalculatorInputs::default()), Ok(()));
    }

    #[test]
    fn test_collects_every_problem() {
        let inputs = CalculatorInputs {
            mass_input: 0.0,
            carbon_content: 120.0,
            hc_ratio: -1.0,
            selected_soil_temps: vec![12.0, 5.0, 5.0],
            sample_name: "  ".to_string(),
            ..Default::default()
        };
        assert_eq!(
            validate_inputs(&inputs),
            Err(vec![
                ValidationError::NonPositiveMass(0.0),
                ValidationError::CarbonContentOutOfRange(120.0),
                ValidationError::InvalidRatio { name: "H/C", value: -1.0 },
                ValidationError::UncalibratedSoilTemp(12.0),
                ValidationError::DuplicateSoilTemp(5.0),
                ValidationError::MissingSampleName,
            ])
        );
    }

    #[test]
    fn test_non_finite_numbers_rejected() {
        let inputs = CalculatorInputs {
            mass_input: f64::INFINITY,
            oc_ratio: f64::NAN,
            ..Default::default()
        };
        let errors = validate_inputs(&inputs).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(matches!(errors[0], ValidationError::NonPositiveMass(_)));
        assert!(matches!(errors[1], ValidationError::InvalidRatio { name: "O/C", .. }));
    }

    #[test]
    fn test_yield_only_checked_for_feedstock() {
        let direct = CalculatorInputs { biochar_yield: 0.0, ..Default::default() };
        assert!(validate_inputs(&direct).is_ok());

        let feedstock = CalculatorInputs { input_mode: InputMode::Feedstock, ..direct };
        assert_eq!(validate_inputs(&feedstock), Err(vec![ValidationError::YieldOutOfRange(0.0)]));
    }

    #[test]
    fn test_soil_temp_count_limits() {
        let none = CalculatorInputs { selected_soil_temps: vec![], ..Default::default() };
        assert_eq!(validate_inputs(&none), Err(vec![ValidationError::SoilTempCount(0)]));

        let four = CalculatorInputs {
            selected_soil_temps: vec![5.0, 10.0, 15.0, 20.0],
            ..Default::default()
        };
        assert_eq!(validate_inputs(&four), Err(vec![ValidationError::SoilTempCount(4)]));
    }

    #[test]
    fn test_sharing_requires_researcher_name() {
        let inputs = CalculatorInputs { data_authorization: true, ..Default::default() };
        assert_eq!(validate_inputs(&inputs), Err(vec![ValidationError::MissingResearcherName]));
    }
}
