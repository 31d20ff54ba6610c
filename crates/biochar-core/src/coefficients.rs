//! Permanence regression coefficients from Woolf et al. (2021), Table 3.
//!
//! The fraction of biochar carbon still present after `H` years in soil at `T` °C is
//! modelled as `fPerm = chc + mhc * H/C`. Values are calibration data and are kept
//! exactly as published, including the near-duplicate 14.9 °C and 15 °C rows.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Soil temperatures (°C) the table is calibrated for.
/// 10.9 °C is the US cropland average, 14.9 °C the global cropland average.
pub const CALIBRATION_TEMPERATURES: [f64; 7] = [5.0, 10.0, 10.9, 14.9, 15.0, 20.0, 25.0];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Horizon {
    Y100,
    Y500,
    Y1000,
}

impl Horizon {
    pub fn all() -> &'static [Horizon] {
        use Horizon::*;
        &[Y100, Y500, Y1000]
    }

    pub fn years(&self) -> u32 {
        match self {
            Horizon::Y100 => 100,
            Horizon::Y500 => 500,
            Horizon::Y1000 => 1000,
        }
    }

    pub fn from_years(years: u32) -> Option<Horizon> {
        match years {
            100 => Some(Horizon::Y100),
            500 => Some(Horizon::Y500),
            1000 => Some(Horizon::Y1000),
            _ => None,
        }
    }

    fn index(&self) -> usize {
        match self {
            Horizon::Y100 => 0,
            Horizon::Y500 => 1,
            Horizon::Y1000 => 2,
        }
    }
}

impl fmt::Display for Horizon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} years", self.years())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Coefficients {
    pub chc: f64,
    pub mhc: f64,
}

impl Coefficients {
    const fn new(chc: f64, mhc: f64) -> Self {
        Self { chc, mhc }
    }

    /// Unclamped regression output for the given molar H/C ratio.
    pub fn raw_permanence(&self, hc_ratio: f64) -> f64 {
        self.chc + self.mhc * hc_ratio
    }
}

struct TableRow {
    temperature: f64,
    // indexed by Horizon::index
    by_horizon: [Coefficients; 3],
}

static WOOLF_TABLE_3: [TableRow; 7] = [
    TableRow {
        temperature: 5.0,
        by_horizon: [
            Coefficients::new(1.13, -0.46),
            Coefficients::new(0.99, -0.65),
            Coefficients::new(0.80, -0.62),
        ],
    },
    TableRow {
        temperature: 10.0,
        by_horizon: [
            Coefficients::new(1.10, -0.59),
            Coefficients::new(0.74, -0.60),
            Coefficients::new(0.47, -0.42),
        ],
    },
    TableRow {
        temperature: 10.9,
        by_horizon: [
            Coefficients::new(1.09, -0.60),
            Coefficients::new(0.71, -0.58),
            Coefficients::new(0.43, -0.38),
        ],
    },
    TableRow {
        temperature: 14.9,
        by_horizon: [
            Coefficients::new(1.04, -0.64),
            Coefficients::new(0.57, -0.50),
            Coefficients::new(0.30, -0.28),
        ],
    },
    TableRow {
        temperature: 15.0,
        by_horizon: [
            Coefficients::new(1.04, -0.64),
            Coefficients::new(0.57, -0.49),
            Coefficients::new(0.30, -0.27),
        ],
    },
    TableRow {
        temperature: 20.0,
        by_horizon: [
            Coefficients::new(1.01, -0.65),
            Coefficients::new(0.48, -0.43),
            Coefficients::new(0.23, -0.21),
        ],
    },
    TableRow {
        temperature: 25.0,
        by_horizon: [
            Coefficients::new(0.98, -0.66),
            Coefficients::new(0.43, -0.39),
            Coefficients::new(0.20, -0.17),
        ],
    },
];

/// Exact lookup. Temperatures are matched by value, not by nearest neighbour.
pub fn lookup(temperature: f64, horizon: Horizon) -> Option<Coefficients> {
    WOOLF_TABLE_3
        .iter()
        .find(|row| row.temperature == temperature)
        .map(|row| row.by_horizon[horizon.index()])
}

/// Lookup by raw year count. Unknown temperatures or horizons give `{0, 0}`.
pub fn coefficients_or_zero(temperature: f64, years: u32) -> Coefficients {
    Horizon::from_years(years).and_then(|h| lookup(temperature, h)).unwrap_or_default()
}

pub fn is_calibrated(temperature: f64) -> bool {
    CALIBRATION_TEMPERATURES.contains(&temperature)
}
