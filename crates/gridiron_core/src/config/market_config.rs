//! Market centering, calibration and edge parameters

use serde::{Deserialize, Serialize};

use crate::calibration::CalibrationMethod;

/// Centering band and summary tail thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketParams {
    /// Bounds on the multiplicative total scale (default: 0.5..=2.0)
    pub scale_min: f64,
    pub scale_max: f64,
    /// Absolute margin counted as a blowout (default: 14, strictly greater)
    pub blowout_margin: f64,
    /// Absolute margin counted as a close game (default: 3, inclusive)
    pub close_margin: f64,
    /// Total below which a game is low scoring (default: 37)
    pub low_scoring_total: f64,
    /// Total above which a game is high scoring (default: 51)
    pub high_scoring_total: f64,
}

impl Default for MarketParams {
    fn default() -> Self {
        Self {
            scale_min: 0.5,
            scale_max: 2.0,
            blowout_margin: 14.0,
            close_margin: 3.0,
            low_scoring_total: 37.0,
            high_scoring_total: 51.0,
        }
    }
}

/// Probability calibration parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationParams {
    /// Preferred fit method (default: isotonic)
    pub method: CalibrationMethod,
    /// Symmetric z-score clip (default: 3.0)
    pub z_cap: f64,
    /// Fewer samples than this falls back to the sigmoid transform (default: 30)
    pub min_samples: usize,
    /// Slope of the uncalibrated sigmoid-of-z fallback (default: 1.6)
    pub fallback_slope: f64,
    /// Output probabilities are kept within [floor, 1 - floor] (default: 1e-4)
    pub probability_floor: f64,
    /// Newton iterations and ridge penalty for Platt scaling (default: 50, 1e-6)
    pub platt_max_iter: usize,
    pub platt_ridge: f64,
    /// Blend toward the 0.50 prior (default: enabled, weight 0.5 at z=0 up to 1.0 at z_cap)
    pub ensemble_enabled: bool,
    pub ensemble_min_weight: f64,
    pub ensemble_max_weight: f64,
    /// Reliability diagram bins for diagnostics (default: 10)
    pub reliability_bins: usize,
}

impl Default for CalibrationParams {
    fn default() -> Self {
        Self {
            method: CalibrationMethod::Isotonic,
            z_cap: 3.0,
            min_samples: 30,
            fallback_slope: 1.6,
            probability_floor: 1e-4,
            platt_max_iter: 50,
            platt_ridge: 1e-6,
            ensemble_enabled: true,
            ensemble_min_weight: 0.5,
            ensemble_max_weight: 1.0,
            reliability_bins: 10,
        }
    }
}

/// Edge and conviction-tier thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EdgeParams {
    /// American odds assumed when the market line carries none (default: -110)
    pub default_american_odds: f64,
    /// Minimum edge for each conviction tier (default: 0.02 / 0.04 / 0.07)
    pub low_edge: f64,
    pub medium_edge: f64,
    pub high_edge: f64,
}

impl Default for EdgeParams {
    fn default() -> Self {
        Self {
            default_american_odds: -110.0,
            low_edge: 0.02,
            medium_edge: 0.04,
            high_edge: 0.07,
        }
    }
}
