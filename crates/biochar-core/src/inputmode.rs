use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug)]
pub struct ParseInputModeError(String);

impl fmt::Display for ParseInputModeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
impl std::error::Error for ParseInputModeError {}

// what the entered mass stands for
#[derive(Default, PartialEq, Eq, Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputMode {
    /// Mass of finished biochar, used as is.
    #[default]
    DirectBiochar,
    /// Mass of raw feedstock, converted with the pyrolysis yield.
    Feedstock,
}

impl FromStr for InputMode {
    type Err = ParseInputModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "direct" | "biochar" | "direct_biochar" => Ok(InputMode::DirectBiochar),
            "feedstock" | "biomass" => Ok(InputMode::Feedstock),
            other => Err(ParseInputModeError(format!("invalid input mode: {other}"))),
        }
    }
}

impl fmt::Display for InputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputMode::DirectBiochar => write!(f, "Direct biochar"),
            InputMode::Feedstock => write!(f, "Feedstock"),
        }
    }
}
