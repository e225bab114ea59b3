//! Market centering
//!
//! Moves a raw score distribution onto a market line while keeping its
//! shape:
//! 1. scale both arrays toward the target total (factor clipped to a band)
//! 2. shift both arrays equally so the mean total hits the target
//! 3. shift them in opposite directions so the mean margin hits the target
//! 4. clamp negatives with a water-fill shift that keeps each array's mean
//!
//! After centering the mean margin and mean total equal the targets to
//! within float error, and no score is negative.

use serde::{Deserialize, Serialize};

use crate::config::MarketParams;
use crate::error::{Result, SimError};

/// Raw totals at or under this are treated as zero.
const MIN_RAW_TOTAL: f64 = 1e-9;
/// Slack for float error when locating the water-fill breakpoint.
const WATER_FILL_EPS: f64 = 1e-12;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CenteredScores {
    pub home: Vec<f64>,
    pub away: Vec<f64>,
    /// Multiplicative factor applied in step 1
    pub scale: f64,
    /// Shift applied to both arrays in step 2
    pub total_shift: f64,
    /// Shift added to home and subtracted from away in step 3
    pub margin_shift: f64,
}

impl CenteredScores {
    pub fn mean_margin(&self) -> f64 {
        mean(&self.home) - mean(&self.away)
    }

    pub fn mean_total(&self) -> f64 {
        mean(&self.home) + mean(&self.away)
    }
}

pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Center raw home/away scores on `target_margin` (home minus away) and
/// `target_total`.
pub fn center_scores(
    home: &[f64],
    away: &[f64],
    target_margin: f64,
    target_total: f64,
    params: &MarketParams,
) -> Result<CenteredScores> {
    if home.is_empty() || home.len() != away.len() {
        return Err(SimError::config(format!(
            "centering needs equal non-empty score arrays (home {}, away {})",
            home.len(),
            away.len()
        )));
    }
    if !target_margin.is_finite() || !target_total.is_finite() {
        return Err(SimError::config("centering target is not finite"));
    }
    if target_total < target_margin.abs() {
        return Err(SimError::config(format!(
            "infeasible line: total {target_total} below |margin| {}",
            target_margin.abs()
        )));
    }
    if home.iter().chain(away).any(|v| !v.is_finite()) {
        return Err(SimError::config("raw scores contain non-finite values"));
    }

    let raw_total = mean(home) + mean(away);
    let scale = if raw_total > MIN_RAW_TOTAL {
        (target_total / raw_total).clamp(params.scale_min, params.scale_max)
    } else if target_total > 0.0 {
        params.scale_max
    } else {
        params.scale_min
    };

    let mut h: Vec<f64> = home.iter().map(|v| v * scale).collect();
    let mut a: Vec<f64> = away.iter().map(|v| v * scale).collect();

    let total_shift = (target_total - (mean(&h) + mean(&a))) / 2.0;
    let margin_shift = (target_margin - (mean(&h) - mean(&a))) / 2.0;
    for v in h.iter_mut() {
        *v += total_shift + margin_shift;
    }
    for v in a.iter_mut() {
        *v += total_shift - margin_shift;
    }

    let home_target = (target_total + target_margin) / 2.0;
    let away_target = (target_total - target_margin) / 2.0;
    Ok(CenteredScores {
        home: water_fill(&h, home_target),
        away: water_fill(&a, away_target),
        scale,
        total_shift,
        margin_shift,
    })
}

/// `max(x + c, 0)` for the single `c` that makes the result's mean equal
/// `target` (which must be non-negative).
pub fn water_fill(values: &[f64], target: f64) -> Vec<f64> {
    if values.is_empty() {
        return Vec::new();
    }
    if target <= 0.0 {
        return vec![0.0; values.len()];
    }
    let shift = water_fill_shift(values, target);
    values.iter().map(|v| (v + shift).max(0.0)).collect()
}

fn water_fill_shift(values: &[f64], target: f64) -> f64 {
    let n = values.len();
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    // suffix[k] = sum of sorted[k..]
    let mut suffix = vec![0.0; n + 1];
    for k in (0..n).rev() {
        suffix[k] = suffix[k + 1] + sorted[k];
    }

    let need = target * n as f64;
    // With the lowest k values clamped to zero, the active ones carry the mean.
    for k in 0..n {
        let c = (need - suffix[k]) / (n - k) as f64;
        let lowest_active_ok = sorted[k] + c >= -WATER_FILL_EPS;
        let clamped_ok = k == 0 || sorted[k - 1] + c <= WATER_FILL_EPS;
        if lowest_active_ok && clamped_ok {
            return c;
        }
    }
    need - sorted[n - 1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn params() -> MarketParams {
        MarketParams::default()
    }

    #[test]
    fn test_centering_hits_targets() {
        let home = [24.0, 17.0, 31.0, 10.0, 27.0];
        let away = [20.0, 21.0, 14.0, 13.0, 30.0];
        let c = center_scores(&home, &away, 3.0, 45.0, &params()).unwrap();
        assert!((c.mean_margin() - 3.0).abs() < 1e-9);
        assert!((c.mean_total() - 45.0).abs() < 1e-9);
        assert!(c.home.iter().chain(&c.away).all(|v| *v >= 0.0));
    }

    #[test]
    fn test_shape_is_preserved_without_clamping() {
        let home = [20.0, 24.0, 28.0];
        let away = [20.0, 20.0, 20.0];
        let c = center_scores(&home, &away, 0.0, 44.0, &params()).unwrap();
        // Differences between trials survive up to the common scale.
        let d1 = c.home[1] - c.home[0];
        let d2 = c.home[2] - c.home[1];
        assert!((d1 - d2).abs() < 1e-9);
        assert!((d1 - 4.0 * c.scale).abs() < 1e-9);
    }

    #[test]
    fn test_scale_is_clipped() {
        let home = [1.0, 2.0];
        let away = [1.0, 0.0];
        let c = center_scores(&home, &away, 0.0, 50.0, &params()).unwrap();
        assert_eq!(c.scale, 2.0);
        let zero = center_scores(&[0.0, 0.0], &[0.0, 0.0], -3.0, 40.0, &params()).unwrap();
        assert_eq!(zero.scale, 2.0);
        assert!((zero.mean_margin() + 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_water_fill_keeps_mean() {
        let filled = water_fill(&[-10.0, 0.0, 10.0, 20.0], 5.0);
        assert!(filled.iter().all(|v| *v >= 0.0));
        assert!((mean(&filled) - 5.0).abs() < 1e-12);
        assert_eq!(filled[0], 0.0);
        assert_eq!(water_fill(&[3.0, -3.0], 0.0), vec![0.0, 0.0]);
        // Nothing to clamp: values come back unchanged.
        assert_eq!(water_fill(&[1.0, 2.0, 3.0], 2.0), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_infeasible_lines_are_rejected() {
        let home = [20.0];
        let away = [17.0];
        assert!(matches!(
            center_scores(&home, &away, 10.0, 7.0, &params()),
            Err(SimError::Configuration(_))
        ));
        assert!(center_scores(&home, &away, f64::NAN, 40.0, &params()).is_err());
        assert!(center_scores(&[], &[], 0.0, 40.0, &params()).is_err());
        assert!(center_scores(&home, &[1.0, 2.0], 0.0, 40.0, &params()).is_err());
        assert!(center_scores(&[f64::INFINITY], &away, 0.0, 40.0, &params()).is_err());
    }

    proptest! {
        #[test]
        fn prop_centering_is_exact(
            raw in prop::collection::vec((-30.0f64..70.0, -30.0f64..70.0), 1..200),
            margin in -20.0f64..20.0,
            extra in 0.0f64..60.0,
        ) {
            let (home, away): (Vec<f64>, Vec<f64>) = raw.into_iter().unzip();
            let total = margin.abs() + extra;
            let c = center_scores(&home, &away, margin, total, &params()).unwrap();
            prop_assert!((c.mean_margin() - margin).abs() < 1e-6);
            prop_assert!((c.mean_total() - total).abs() < 1e-6);
            prop_assert!(c.home.iter().chain(&c.away).all(|v| *v >= 0.0));
        }

        #[test]
        fn prop_near_constant_arrays_center(
            base in -5.0f64..40.0,
            n in 1usize..50,
            margin in -14.0f64..14.0,
        ) {
            let home = vec![base; n];
            let away = vec![base + 1e-9; n];
            let total = margin.abs() + 30.0;
            let c = center_scores(&home, &away, margin, total, &params()).unwrap();
            prop_assert!((c.mean_margin() - margin).abs() < 1e-6);
            prop_assert!((c.mean_total() - total).abs() < 1e-6);
        }
    }
}
