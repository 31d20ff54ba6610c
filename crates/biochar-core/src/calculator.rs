//! Biochar carbon sequestration after Woolf et al. (2021).
//!
//! Everything here is a pure function of [`CalculatorInputs`] and the static
//! coefficient table. Nothing is rejected: zero, negative or out-of-range values
//! pass straight through, and the only guards are the permanence clamp, the
//! zero-coefficient default for unknown temperatures and the division guard on
//! the efficiency ratio. Validation belongs to [`crate::validation`].

use crate::coefficients::{coefficients_or_zero, Horizon};
use crate::inputmode::InputMode;
use crate::inputs::CalculatorInputs;
use crate::massunit::MassUnit;

use serde::{Deserialize, Serialize};

/// Molar mass ratio CO2 / C.
pub const CO2_PER_C: f64 = 44.0 / 12.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimePoint {
    pub year: u32,
    pub f_perm: f64,
    /// tCO2e
    pub co2_sequestered: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoilTempScenario {
    pub temp: f64,
    /// 100-year coefficients, kept for display.
    pub chc: f64,
    pub mhc: f64,
    pub data_points: Vec<TimePoint>,
}

impl SoilTempScenario {
    pub fn point(&self, year: u32) -> Option<&TimePoint> {
        self.data_points.iter().find(|p| p.year == year)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationResult {
    pub inputs: CalculatorInputs,
    pub scenarios: Vec<SoilTempScenario>,
    /// t
    pub total_biochar_mass: f64,
    /// t
    pub total_carbon_mass: f64,
    /// tCO2e per t biochar at 100 years, first scenario.
    pub efficiency_ratio: f64,
}

impl CalculationResult {
    pub fn main_scenario(&self) -> Option<&SoilTempScenario> {
        self.scenarios.first()
    }
}

pub fn normalize_mass(mass: f64, unit: MassUnit) -> f64 {
    unit.to_tons(mass)
}

pub fn resolve_biochar_mass(mass_tons: f64, mode: InputMode, yield_percent: f64) -> f64 {
    match mode {
        InputMode::DirectBiochar => mass_tons,
        InputMode::Feedstock => mass_tons * (yield_percent / 100.0),
    }
}

pub fn resolve_carbon_mass(biochar_tons: f64, carbon_percent: f64) -> f64 {
    biochar_tons * (carbon_percent / 100.0)
}

/// Permanence fraction at `years` for soil at `temp` °C, clamped to [0, 1].
pub fn permanence_fraction(temp: f64, years: u32, hc_ratio: f64) -> f64 {
    let raw = coefficients_or_zero(temp, years).raw_permanence(hc_ratio);
    // NaN only comes from a NaN ratio; report no permanence rather than propagate
    if raw.is_nan() {
        return 0.0;
    }
    raw.clamp(0.0, 1.0)
}

pub fn co2_equivalent(carbon_tons: f64, f_perm: f64) -> f64 {
    carbon_tons * CO2_PER_C * f_perm
}

fn build_scenario(temp: f64, carbon_tons: f64, hc_ratio: f64) -> SoilTempScenario {
    let coeffs_100 = coefficients_or_zero(temp, Horizon::Y100.years());

    let mut data_points = Vec::with_capacity(Horizon::all().len() + 1);
    data_points.push(TimePoint {
        year: 0,
        f_perm: 1.0,
        co2_sequestered: co2_equivalent(carbon_tons, 1.0),
    });

    for horizon in Horizon::all() {
        let year = horizon.years();
        let f_perm = permanence_fraction(temp, year, hc_ratio);
        data_points.push(TimePoint {
            year,
            f_perm,
            co2_sequestered: co2_equivalent(carbon_tons, f_perm),
        });
    }

    SoilTempScenario { temp, chc: coeffs_100.chc, mhc: coeffs_100.mhc, data_points }
}

pub fn calculate_sequestration(inputs: &CalculatorInputs) -> CalculationResult {
    let mass_tons = normalize_mass(inputs.mass_input, inputs.mass_unit);
    let biochar_mass = resolve_biochar_mass(mass_tons, inputs.input_mode, inputs.biochar_yield);
    let carbon_mass = resolve_carbon_mass(biochar_mass, inputs.carbon_content);

    // repeated temperatures collapse onto their first occurrence
    let mut scenarios: Vec<SoilTempScenario> = Vec::with_capacity(inputs.selected_soil_temps.len());
    for &temp in &inputs.selected_soil_temps {
        if !scenarios.iter().any(|s| s.temp == temp) {
            scenarios.push(build_scenario(temp, carbon_mass, inputs.hc_ratio));
        }
    }

    let co2_100 = scenarios
        .first()
        .and_then(|s| s.point(Horizon::Y100.years()))
        .map(|p| p.co2_sequestered);

    let efficiency_ratio = match co2_100 {
        Some(co2) if biochar_mass > 0.0 => co2 / biochar_mass,
        _ => 0.0,
    };

    CalculationResult {
        inputs: inputs.clone(),
        scenarios,
        total_biochar_mass: biochar_mass,
        total_carbon_mass: carbon_mass,
        efficiency_ratio,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn reference_inputs() -> CalculatorInputs {
        CalculatorInputs {
            mass_input: 1.0,
            mass_unit: MassUnit::Ton,
            input_mode: InputMode::DirectBiochar,
            carbon_content: 75.0,
            hc_ratio: 0.35,
            selected_soil_temps: vec![14.9],
            ..Default::default()
        }
    }

    #[test]
    fn test_global_cropland_reference_case() {
        let res = calculate_sequestration(&reference_inputs());
        assert!((res.total_carbon_mass - 0.75).abs() < EPS);

        let s = &res.scenarios[0];
        let y0 = s.point(0).unwrap();
        assert_eq!(y0.f_perm, 1.0);
        assert!((y0.co2_sequestered - 2.75).abs() < EPS);

        let y100 = s.point(100).unwrap();
        assert!((y100.f_perm - 0.816).abs() < EPS);
        assert!((y100.co2_sequestered - 2.244).abs() < EPS);

        let y500 = s.point(500).unwrap();
        assert!((y500.f_perm - 0.395).abs() < EPS);
        assert!((y500.co2_sequestered - 1.08625).abs() < EPS);

        let y1000 = s.point(1000).unwrap();
        assert!((y1000.f_perm - 0.202).abs() < EPS);
        assert!((y1000.co2_sequestered - 0.5555).abs() < EPS);

        assert_eq!((s.chc, s.mhc), (1.04, -0.64));
        assert!((res.efficiency_ratio - 2.244).abs() < EPS);
    }

    #[test]
    fn test_feedstock_yield_conversion() {
        let inputs = CalculatorInputs {
            mass_input: 1000.0,
            mass_unit: MassUnit::Kilogram,
            input_mode: InputMode::Feedstock,
            biochar_yield: 30.0,
            ..reference_inputs()
        };
        assert_eq!(normalize_mass(inputs.mass_input, inputs.mass_unit), 1.0);
        let res = calculate_sequestration(&inputs);
        assert!((res.total_biochar_mass - 0.3).abs() < EPS);
    }

    #[test]
    fn test_direct_mode_ignores_yield() {
        let inputs =
            CalculatorInputs { mass_input: 2.5, biochar_yield: 12.0, ..reference_inputs() };
        assert_eq!(calculate_sequestration(&inputs).total_biochar_mass, 2.5);
        assert_eq!(resolve_biochar_mass(2.5, InputMode::DirectBiochar, 0.0), 2.5);
        assert_eq!(resolve_biochar_mass(2.0, InputMode::Feedstock, 25.0), 2.0 * (25.0 / 100.0));
    }

    #[test]
    fn test_permanence_clamped_for_extreme_ratios() {
        for &t in &crate::coefficients::CALIBRATION_TEMPERATURES {
            for h in [100, 500, 1000] {
                for hc in [-5.0, -1.0, 0.0, 0.35, 1.5, 10.0] {
                    let f = permanence_fraction(t, h, hc);
                    assert!((0.0..=1.0).contains(&f), "{t} {h} {hc} -> {f}");
                }
            }
        }
        assert_eq!(permanence_fraction(5.0, 100, -5.0), 1.0);
        assert_eq!(permanence_fraction(5.0, 100, 10.0), 0.0);
        assert_eq!(permanence_fraction(5.0, 100, f64::NAN), 0.0);
    }

    #[test]
    fn test_unknown_temperature_is_silent_zero() {
        let inputs = CalculatorInputs { selected_soil_temps: vec![12.0], ..reference_inputs() };
        let res = calculate_sequestration(&inputs);
        let s = &res.scenarios[0];
        assert_eq!((s.chc, s.mhc), (0.0, 0.0));
        assert_eq!(s.point(0).unwrap().f_perm, 1.0);
        for year in [100, 500, 1000] {
            let p = s.point(year).unwrap();
            assert_eq!(p.f_perm, 0.0);
            assert_eq!(p.co2_sequestered, 0.0);
        }
        assert_eq!(res.efficiency_ratio, 0.0);
    }

    #[test]
    fn test_scenarios_follow_caller_order() {
        let inputs =
            CalculatorInputs { selected_soil_temps: vec![25.0, 5.0, 10.9], ..reference_inputs() };
        let res = calculate_sequestration(&inputs);
        let temps: Vec<f64> = res.scenarios.iter().map(|s| s.temp).collect();
        assert_eq!(temps, vec![25.0, 5.0, 10.9]);

        let repeated =
            CalculatorInputs { selected_soil_temps: vec![5.0, 20.0, 5.0], ..reference_inputs() };
        let temps: Vec<f64> =
            calculate_sequestration(&repeated).scenarios.iter().map(|s| s.temp).collect();
        assert_eq!(temps, vec![5.0, 20.0]);

        for s in &res.scenarios {
            let years: Vec<u32> = s.data_points.iter().map(|p| p.year).collect();
            assert_eq!(years, vec![0, 100, 500, 1000]);
            let y0 = s.point(0).unwrap();
            assert_eq!(y0.f_perm, 1.0);
            assert!((y0.co2_sequestered - res.total_carbon_mass * CO2_PER_C).abs() < EPS);
        }

        // efficiency always comes from the first selection
        let first_100 = res.scenarios[0].point(100).unwrap().co2_sequestered;
        assert!((res.efficiency_ratio - first_100 / res.total_biochar_mass).abs() < EPS);
    }

    #[test]
    fn test_zero_biochar_mass_gives_zero_efficiency() {
        let inputs = CalculatorInputs { mass_input: 0.0, ..reference_inputs() };
        let res = calculate_sequestration(&inputs);
        assert_eq!(res.total_biochar_mass, 0.0);
        assert_eq!(res.efficiency_ratio, 0.0);
        assert!(res.efficiency_ratio.is_finite());

        let feedstock = CalculatorInputs {
            input_mode: InputMode::Feedstock,
            biochar_yield: 0.0,
            ..reference_inputs()
        };
        assert_eq!(calculate_sequestration(&feedstock).efficiency_ratio, 0.0);
    }

    #[test]
    fn test_no_selection_gives_no_scenarios() {
        let inputs = CalculatorInputs { selected_soil_temps: vec![], ..reference_inputs() };
        let res = calculate_sequestration(&inputs);
        assert!(res.scenarios.is_empty());
        assert!(res.main_scenario().is_none());
        assert_eq!(res.efficiency_ratio, 0.0);
    }

    #[test]
    fn test_negative_mass_passes_through() {
        let inputs = CalculatorInputs { mass_input: -2.0, ..reference_inputs() };
        let res = calculate_sequestration(&inputs);
        assert_eq!(res.total_biochar_mass, -2.0);
        assert!(res.scenarios[0].point(0).unwrap().co2_sequestered < 0.0);
        assert_eq!(res.efficiency_ratio, 0.0);
    }

    #[test]
    fn test_nan_mass_keeps_efficiency_finite() {
        let inputs = CalculatorInputs { mass_input: f64::NAN, ..reference_inputs() };
        let res = calculate_sequestration(&inputs);
        assert!(res.total_biochar_mass.is_nan());
        assert!(res.efficiency_ratio.is_finite());
        assert_eq!(res.efficiency_ratio, 0.0);
    }
}
