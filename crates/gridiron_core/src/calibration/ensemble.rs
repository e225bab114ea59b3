//! Adaptive blend toward a neutral prior
//!
//! Small simulator-vs-market deltas are mostly noise, so their calibrated
//! probability is pulled toward 0.50. The weight on the calibrated value grows
//! linearly with |z|. The market breakeven is never used as the anchor.

use crate::config::CalibrationParams;

const NEUTRAL_PRIOR: f64 = 0.5;

/// Weight on the calibrated probability for a given z.
pub fn ensemble_weight(z: f64, params: &CalibrationParams) -> f64 {
    if !params.ensemble_enabled {
        return 1.0;
    }
    let cap = params.z_cap.abs();
    let frac = if cap > 0.0 && z.is_finite() {
        (z.abs() / cap).min(1.0)
    } else {
        0.0
    };
    let (lo, hi) = (params.ensemble_min_weight, params.ensemble_max_weight);
    (lo + (hi - lo) * frac).clamp(0.0, 1.0)
}

/// `w * p + (1 - w) * 0.5`
pub fn blend_with_prior(p: f64, z: f64, params: &CalibrationParams) -> f64 {
    let w = ensemble_weight(z, params);
    w * p + (1.0 - w) * NEUTRAL_PRIOR
}
