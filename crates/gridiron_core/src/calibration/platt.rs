//! Platt scaling: `p = sigmoid(slope * z + intercept)` fit by Newton's method.

use serde::{Deserialize, Serialize};

use super::CalibrationSample;
use crate::error::CalibrationFitError;

const MAX_NEWTON_STEP: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlattCoefficients {
    pub slope: f64,
    pub intercept: f64,
}

impl PlattCoefficients {
    pub fn predict(&self, z: f64) -> f64 {
        sigmoid(self.slope * z + self.intercept)
    }

    /// Fit by ridge-penalized Newton iterations on Platt's smoothed targets.
    ///
    /// A non-increasing fit is rejected as [`CalibrationFitError::NonMonotonic`].
    pub fn fit(
        samples: &[CalibrationSample],
        max_iter: usize,
        ridge: f64,
    ) -> Result<Self, CalibrationFitError> {
        let positives = samples.iter().filter(|s| s.outcome).count() as f64;
        let negatives = samples.len() as f64 - positives;
        let hi_target = (positives + 1.0) / (positives + 2.0);
        let lo_target = 1.0 / (negatives + 2.0);
        let ridge = ridge.max(0.0);

        let mut a = 0.0_f64;
        let mut b = ((positives + 1.0) / (negatives + 1.0)).ln();

        for _ in 0..max_iter.max(1) {
            let (mut g_a, mut g_b) = (ridge * a, ridge * b);
            let (mut h_aa, mut h_ab, mut h_bb) = (ridge, 0.0, ridge);

            for s in samples {
                let t = if s.outcome { hi_target } else { lo_target };
                let p = sigmoid(a * s.z + b);
                let r = p - t;
                let w = (p * (1.0 - p)).max(1e-12);
                g_a += r * s.z;
                g_b += r;
                h_aa += w * s.z * s.z;
                h_ab += w * s.z;
                h_bb += w;
            }

            let det = h_aa * h_bb - h_ab * h_ab;
            if !det.is_finite() || det.abs() < 1e-15 {
                break;
            }
            let mut step_a = (h_bb * g_a - h_ab * g_b) / det;
            let mut step_b = (h_aa * g_b - h_ab * g_a) / det;
            let norm = step_a.abs().max(step_b.abs());
            if norm > MAX_NEWTON_STEP {
                step_a *= MAX_NEWTON_STEP / norm;
                step_b *= MAX_NEWTON_STEP / norm;
            }
            a -= step_a;
            b -= step_b;

            if step_a.abs() < 1e-10 && step_b.abs() < 1e-10 {
                break;
            }
        }

        if !a.is_finite() || !b.is_finite() {
            return Err(CalibrationFitError::NonFinite);
        }
        if a <= 0.0 {
            return Err(CalibrationFitError::NonMonotonic { slope: a });
        }
        Ok(Self {
            slope: a,
            intercept: b,
        })
    }
}

pub fn sigmoid(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    fn synthetic(slope: f64, intercept: f64, n: usize, seed: u64) -> Vec<CalibrationSample> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        (0..n)
            .map(|_| {
                let z: f64 = rng.gen_range(-3.0..3.0);
                let p = sigmoid(slope * z + intercept);
                CalibrationSample {
                    z,
                    outcome: rng.gen::<f64>() < p,
                }
            })
            .collect()
    }

    #[test]
    fn test_sigmoid_is_stable() {
        assert!((sigmoid(0.0) - 0.5).abs() < 1e-15);
        assert!(sigmoid(-800.0) >= 0.0);
        assert!(sigmoid(800.0) <= 1.0);
        assert!((sigmoid(2.0) + sigmoid(-2.0) - 1.0).abs() < 1e-15);
    }

    #[test]
    fn test_recovers_known_coefficients() {
        let samples = synthetic(1.2, 0.3, 5000, 7);
        let fit = PlattCoefficients::fit(&samples, 50, 1e-6).unwrap();
        assert!((fit.slope - 1.2).abs() < 0.2, "slope {}", fit.slope);
        assert!((fit.intercept - 0.3).abs() < 0.15, "intercept {}", fit.intercept);
    }

    #[test]
    fn test_rejects_decreasing_relation() {
        let samples = synthetic(-1.0, 0.0, 2000, 11);
        let err = PlattCoefficients::fit(&samples, 50, 1e-6).unwrap_err();
        assert!(matches!(err, CalibrationFitError::NonMonotonic { .. }));
    }

    #[test]
    fn test_separable_data_stays_finite() {
        let samples: Vec<_> = (0..60)
            .map(|i| {
                let z = -3.0 + i as f64 * 0.1;
                CalibrationSample { z, outcome: z > 0.0 }
            })
            .collect();
        let fit = PlattCoefficients::fit(&samples, 50, 1e-6).unwrap();
        assert!(fit.slope.is_finite() && fit.slope > 0.0);
        assert!(fit.predict(2.0) > 0.9);
        assert!(fit.predict(-2.0) < 0.1);
    }
}
