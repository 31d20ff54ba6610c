use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug)]
pub struct ParseMassUnitError(String);

impl fmt::Display for ParseMassUnitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for ParseMassUnitError {}

#[derive(Default, Debug, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub enum MassUnit {
    #[serde(rename = "g")]
    Gram,
    #[serde(rename = "kg")]
    Kilogram,
    #[default]
    #[serde(rename = "t")]
    Ton,
}

impl fmt::Display for MassUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MassUnit::Gram => write!(f, "g"),
            MassUnit::Kilogram => write!(f, "kg"),
            MassUnit::Ton => write!(f, "t"),
        }
    }
}

impl FromStr for MassUnit {
    type Err = ParseMassUnitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "g" | "gram" | "grams" => Ok(MassUnit::Gram),
            "kg" | "kilogram" | "kilograms" => Ok(MassUnit::Kilogram),
            "t" | "ton" | "tons" | "tonne" | "tonnes" => Ok(MassUnit::Ton),
            other => Err(ParseMassUnitError(format!("Invalid mass unit: {other}"))),
        }
    }
}

impl MassUnit {
    pub fn all() -> &'static [MassUnit] {
        use MassUnit::*;
        &[Gram, Kilogram, Ton]
    }

    /// Converts `value` given in this unit to metric tons.
    pub fn to_tons(&self, value: f64) -> f64 {
        match self {
            // 1 t = 1 000 000 g
            MassUnit::Gram => value / 1_000_000.0,
            // 1 t = 1 000 kg
            MassUnit::Kilogram => value / 1_000.0,
            MassUnit::Ton => value,
        }
    }
}
