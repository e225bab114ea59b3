//! # Probability Calibration
//!
//! Turns the simulator's disagreement with the market into a bet probability.
//!
//! 1. [`z_score`]: raw simulator mean vs. market line, clipped to `±z_cap`
//! 2. [`FittedCalibration`]: isotonic or Platt mapping z → p, fit offline on
//!    historical `(z, outcome)` pairs; rejected fits fall back to `sigmoid(1.6 z)`
//! 3. [`blend_with_prior`]: pull toward 0.50, less so as |z| grows
//!
//! The complementary side is always exactly `1 - p`.

mod ensemble;
mod isotonic;
mod metrics;
mod model;
mod platt;
mod zscore;

pub use ensemble::{blend_with_prior, ensemble_weight};
pub use isotonic::IsotonicTable;
pub use metrics::{evaluate, reliability_bins, CalibrationMetrics, ReliabilityBin};
pub use model::{CalibrationMethod, CalibrationModel, CalibrationSet, FittedCalibration};
pub use platt::{sigmoid, PlattCoefficients};
pub use zscore::z_score;

use serde::{Deserialize, Serialize};

use crate::config::CalibrationParams;

/// One historical observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationSample {
    pub z: f64,
    /// Did the side the z-score points toward (home cover / over) hit
    pub outcome: bool,
}

impl CalibrationSample {
    /// Build from a historical game. Pushes (realized result equal to the line)
    /// carry no outcome and return `None`.
    pub fn from_history(
        raw_mean: f64,
        raw_sd: f64,
        market_line: f64,
        realized: f64,
        z_cap: f64,
    ) -> Option<Self> {
        if !realized.is_finite() || !market_line.is_finite() || realized == market_line {
            return None;
        }
        Some(Self {
            z: z_score(raw_mean, market_line, raw_sd, z_cap),
            outcome: realized > market_line,
        })
    }
}

/// Probability of a side and its complement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SideProbabilities {
    /// Home cover or over
    pub side: f64,
    /// Away cover or under, `1 - side`
    pub other: f64,
    pub z: f64,
    pub ensemble_weight: f64,
}

/// Full inference path: z-score, model, ensemble blend, complement.
pub fn calibrate(
    fitted: &FittedCalibration,
    raw_mean: f64,
    raw_sd: f64,
    market_line: f64,
    params: &CalibrationParams,
) -> SideProbabilities {
    let z = z_score(raw_mean, market_line, raw_sd, params.z_cap);
    let p = fitted.probability(z, params);
    let side = blend_with_prior(p, z, params);
    SideProbabilities {
        side,
        other: 1.0 - side,
        z,
        ensemble_weight: ensemble_weight(z, params),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_push_is_excluded() {
        assert!(CalibrationSample::from_history(3.0, 10.0, -3.0, -3.0, 3.0).is_none());
        let s = CalibrationSample::from_history(3.0, 10.0, -3.0, 7.0, 3.0).unwrap();
        assert!(s.outcome);
        assert!((s.z - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_neutral_delta_is_a_coin_flip() {
        let params = CalibrationParams::default();
        let fitted = FittedCalibration::uncalibrated(&params);
        let probs = calibrate(&fitted, 2.5, 13.0, 2.5, &params);
        assert_eq!(probs.z, 0.0);
        assert!((probs.side - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_positive_delta_favors_side() {
        let params = CalibrationParams::default();
        let fitted = FittedCalibration::uncalibrated(&params);
        let probs = calibrate(&fitted, 6.0, 12.0, 2.0, &params);
        assert!(probs.side > 0.5);
        assert!(probs.other < 0.5);
    }

    proptest! {
        #[test]
        fn prop_sides_are_complementary(
            mean in -40.0f64..80.0,
            sd in 0.0f64..20.0,
            line in -20.0f64..60.0,
            slope in 0.1f64..4.0,
        ) {
            let params = CalibrationParams { fallback_slope: slope, ..CalibrationParams::default() };
            let fitted = FittedCalibration::uncalibrated(&params);
            let probs = calibrate(&fitted, mean, sd, line, &params);
            prop_assert_eq!(probs.side + probs.other, 1.0);
            prop_assert!(probs.side > 0.0 && probs.side < 1.0);
        }
    }
}
