use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug)]
pub struct ParseCategoryError(String);

impl fmt::Display for ParseCategoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
impl std::error::Error for ParseCategoryError {}

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BiomassType {
    ElephantGrass,
    Sorghum,
    #[default]
    CashewShell,
    SugarcaneBagasse,
    Carnauba,
    CoconutHusk,
    Babassu,
    Cassava,
    Wood,
    Manure,
    Other,
}

impl fmt::Display for BiomassType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            BiomassType::ElephantGrass => write!(f, "Elephant grass"),
            BiomassType::Sorghum => write!(f, "Sorghum"),
            BiomassType::CashewShell => write!(f, "Cashew nut shell"),
            BiomassType::SugarcaneBagasse => write!(f, "Sugarcane bagasse"),
            BiomassType::Carnauba => write!(f, "Carnauba"),
            BiomassType::CoconutHusk => write!(f, "Coconut husk"),
            BiomassType::Babassu => write!(f, "Babassu shell"),
            BiomassType::Cassava => write!(f, "Cassava residues"),
            BiomassType::Wood => write!(f, "Wood/firewood"),
            BiomassType::Manure => write!(f, "Manure"),
            BiomassType::Other => write!(f, "Other biomass"),
        }
    }
}

impl FromStr for BiomassType {
    type Err = ParseCategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace(['-', ' '], "_").as_str() {
            "elephant_grass" => Ok(BiomassType::ElephantGrass),
            "sorghum" => Ok(BiomassType::Sorghum),
            "cashew_shell" | "cashew" => Ok(BiomassType::CashewShell),
            "sugarcane_bagasse" | "bagasse" => Ok(BiomassType::SugarcaneBagasse),
            "carnauba" => Ok(BiomassType::Carnauba),
            "coconut_husk" | "coconut" => Ok(BiomassType::CoconutHusk),
            "babassu" => Ok(BiomassType::Babassu),
            "cassava" => Ok(BiomassType::Cassava),
            "wood" => Ok(BiomassType::Wood),
            "manure" => Ok(BiomassType::Manure),
            "other" => Ok(BiomassType::Other),
            other => Err(ParseCategoryError(format!("Invalid biomass type: {other}"))),
        }
    }
}

impl BiomassType {
    pub fn all() -> &'static [BiomassType] {
        use BiomassType::*;
        &[
            ElephantGrass,
            Sorghum,
            CashewShell,
            SugarcaneBagasse,
            Carnauba,
            CoconutHusk,
            Babassu,
            Cassava,
            Wood,
            Manure,
            Other,
        ]
    }
}

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AcademicLevel {
    #[default]
    Undergraduate,
    Masters,
    Phd,
    Postdoc,
    Other,
}

impl fmt::Display for AcademicLevel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AcademicLevel::Undergraduate => write!(f, "Undergraduate"),
            AcademicLevel::Masters => write!(f, "Masters"),
            AcademicLevel::Phd => write!(f, "PhD"),
            AcademicLevel::Postdoc => write!(f, "Postdoc"),
            AcademicLevel::Other => write!(f, "Other"),
        }
    }
}

impl FromStr for AcademicLevel {
    type Err = ParseCategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "undergraduate" | "bsc" => Ok(AcademicLevel::Undergraduate),
            "masters" | "msc" => Ok(AcademicLevel::Masters),
            "phd" | "doctorate" => Ok(AcademicLevel::Phd),
            "postdoc" => Ok(AcademicLevel::Postdoc),
            "other" => Ok(AcademicLevel::Other),
            other => Err(ParseCategoryError(format!("Invalid academic level: {other}"))),
        }
    }
}
