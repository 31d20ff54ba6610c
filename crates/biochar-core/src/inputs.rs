use crate::biomass::{AcademicLevel, BiomassType};
use crate::inputmode::InputMode;
use crate::massunit::MassUnit;

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fs;
use std::path::Path;

pub const MAX_SOIL_TEMPS: usize = 3;

/// Identification fields. Carried through to reports and research records only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectInfo {
    pub researcher_name: String,
    pub academic_level: AcademicLevel,
    pub research_title: String,
    pub advisor_name: String,
    pub institution: String,
    pub city: String,
    pub state: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalculatorInputs {
    #[serde(flatten)]
    pub project: ProjectInfo,
    pub sample_name: String,
    pub biomass_type: BiomassType,
    pub input_mode: InputMode,
    pub mass_input: f64,
    pub mass_unit: MassUnit,
    /// Pyrolysis yield in percent, only read in feedstock mode.
    pub biochar_yield: f64,
    /// °C
    pub pyrolysis_temp: f64,
    /// Organic carbon, percent of biochar mass.
    pub carbon_content: f64,
    pub hc_ratio: f64,
    pub oc_ratio: f64,
    pub selected_soil_temps: Vec<f64>,
    pub data_authorization: bool,
}

impl Default for CalculatorInputs {
    fn default() -> Self {
        Self {
            project: ProjectInfo::default(),
            sample_name: "Sample 01".to_string(),
            biomass_type: BiomassType::CashewShell,
            input_mode: InputMode::DirectBiochar,
            mass_input: 1.0,
            mass_unit: MassUnit::Ton,
            biochar_yield: 30.0,
            pyrolysis_temp: 500.0,
            carbon_content: 75.0,
            hc_ratio: 0.35,
            oc_ratio: 0.20,
            selected_soil_temps: vec![14.9],
            data_authorization: false,
        }
    }
}

impl CalculatorInputs {
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn Error>> {
        let text = fs::read_to_string(&path)?;
        let inputs = serde_json::from_str(&text).map_err(|e| {
            format!("Could not parse inputs from '{}': {}", path.as_ref().display(), e)
        })?;
        Ok(inputs)
    }

    /// Selects or deselects a soil temperature the way the input form does:
    /// the selection always keeps between one and three entries, sorted ascending.
    /// Returns false when the toggle was refused.
    pub fn toggle_soil_temp(&mut self, temp: f64) -> bool {
        let current = &mut self.selected_soil_temps;
        if let Some(pos) = current.iter().position(|t| *t == temp) {
            if current.len() == 1 {
                return false;
            }
            current.remove(pos);
        } else {
            if current.len() >= MAX_SOIL_TEMPS {
                return false;
            }
            current.push(temp);
            current.sort_by(|a, b| a.total_cmp(b));
        }
        true
    }
}
