pub mod biomass;
pub mod calculator;
pub mod coefficients;
pub mod db;
pub mod dispatch;
pub mod inputmode;
pub mod inputs;
pub mod massunit;
pub mod narrative;
pub mod persistence;
pub mod processevent;
pub mod report;
pub mod stability;
pub mod validation;

pub use calculator::{calculate_sequestration, CalculationResult};
pub use inputs::CalculatorInputs;
