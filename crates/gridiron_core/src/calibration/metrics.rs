//! Calibration diagnostics: Brier score, log loss and reliability bins.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CalibrationMetrics {
    pub samples: usize,
    pub brier: f64,
    pub log_loss: f64,
    /// Share of samples where the side with p > 0.5 hit
    pub accuracy: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReliabilityBin {
    pub bucket_start: f64,
    pub bucket_end: f64,
    pub count: usize,
    pub avg_pred: f64,
    pub actual_rate: f64,
}

pub fn evaluate(predictions: &[f64], outcomes: &[bool]) -> CalibrationMetrics {
    if predictions.is_empty() || predictions.len() != outcomes.len() {
        return CalibrationMetrics::default();
    }

    let mut brier_sum = 0.0_f64;
    let mut log_loss_sum = 0.0_f64;
    let mut correct = 0usize;
    for (&p, &hit) in predictions.iter().zip(outcomes) {
        let y = if hit { 1.0 } else { 0.0 };
        brier_sum += (p - y).powi(2);
        let actual = if hit { p } else { 1.0 - p }.clamp(1e-12, 1.0);
        log_loss_sum -= actual.ln();
        if (p > 0.5) == hit {
            correct += 1;
        }
    }

    let n = predictions.len() as f64;
    CalibrationMetrics {
        samples: predictions.len(),
        brier: brier_sum / n,
        log_loss: log_loss_sum / n,
        accuracy: correct as f64 / n,
    }
}

/// Equal-width reliability bins over [0, 1]; empty bins are omitted.
pub fn reliability_bins(predictions: &[f64], outcomes: &[bool], bins: usize) -> Vec<ReliabilityBin> {
    if bins == 0 || predictions.len() != outcomes.len() {
        return Vec::new();
    }

    let width = 1.0 / bins as f64;
    let mut counts = vec![0usize; bins];
    let mut pred_sums = vec![0.0_f64; bins];
    let mut hit_sums = vec![0.0_f64; bins];
    for (&p, &hit) in predictions.iter().zip(outcomes) {
        if !p.is_finite() {
            continue;
        }
        let idx = ((p.clamp(0.0, 1.0) / width) as usize).min(bins - 1);
        counts[idx] += 1;
        pred_sums[idx] += p;
        if hit {
            hit_sums[idx] += 1.0;
        }
    }

    (0..bins)
        .filter(|&i| counts[i] > 0)
        .map(|i| {
            let c = counts[i] as f64;
            ReliabilityBin {
                bucket_start: i as f64 * width,
                bucket_end: (i + 1) as f64 * width,
                count: counts[i],
                avg_pred: pred_sums[i] / c,
                actual_rate: hit_sums[i] / c,
            }
        })
        .collect()
}
