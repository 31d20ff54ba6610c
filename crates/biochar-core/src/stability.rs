//! Chemical stability indicators derived from the molar H/C and O/C ratios.
//! Display only; the permanence model reads H/C through the coefficient table.

use serde::Serialize;
use std::fmt;

const HIGH_STABILITY_MAX_HC: f64 = 0.4;
const MEDIUM_STABILITY_MAX_HC: f64 = 0.7;
const GAUGE_MAX_HC: f64 = 1.2;

const VK_MAX_OC: f64 = 0.4;
const VK_PREMIUM_MAX_HC: f64 = 0.4;
const VK_ELIGIBLE_MAX_HC: f64 = 0.7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StabilityClass {
    High,
    Medium,
    Low,
}

impl StabilityClass {
    pub fn from_hc(hc_ratio: f64) -> Self {
        if hc_ratio <= HIGH_STABILITY_MAX_HC {
            StabilityClass::High
        } else if hc_ratio <= MEDIUM_STABILITY_MAX_HC {
            StabilityClass::Medium
        } else {
            StabilityClass::Low
        }
    }
}

impl fmt::Display for StabilityClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StabilityClass::High => write!(f, "High"),
            StabilityClass::Medium => write!(f, "Medium"),
            StabilityClass::Low => write!(f, "Low"),
        }
    }
}

/// Position on a 0-100 stability gauge, full at H/C = 0 and empty from H/C = 1.2.
pub fn stability_gauge_percent(hc_ratio: f64) -> f64 {
    ((GAUGE_MAX_HC - hc_ratio) / GAUGE_MAX_HC * 100.0).clamp(0.0, 100.0)
}

/// Region of the Van Krevelen diagram the sample falls in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum VanKrevelenZone {
    Premium,
    CreditEligible,
    Outside,
}

impl VanKrevelenZone {
    pub fn classify(oc_ratio: f64, hc_ratio: f64) -> Self {
        if !(0.0..VK_MAX_OC).contains(&oc_ratio) || hc_ratio < 0.0 {
            return VanKrevelenZone::Outside;
        }
        if hc_ratio < VK_PREMIUM_MAX_HC {
            VanKrevelenZone::Premium
        } else if hc_ratio < VK_ELIGIBLE_MAX_HC {
            VanKrevelenZone::CreditEligible
        } else {
            VanKrevelenZone::Outside
        }
    }
}

impl fmt::Display for VanKrevelenZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VanKrevelenZone::Premium => write!(f, "premium biochar"),
            VanKrevelenZone::CreditEligible => write!(f, "credit eligible"),
            VanKrevelenZone::Outside => write!(f, "outside eligible region"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StabilityAssessment {
    pub class: StabilityClass,
    pub gauge_percent: f64,
    pub zone: VanKrevelenZone,
}

pub fn assess(hc_ratio: f64, oc_ratio: f64) -> StabilityAssessment {
    StabilityAssessment {
        class: StabilityClass::from_hc(hc_ratio),
        gauge_percent: stability_gauge_percent(hc_ratio),
        zone: VanKrevelenZone::classify(oc_ratio, hc_ratio),
    }
}
