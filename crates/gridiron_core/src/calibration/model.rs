//! Fitted calibration models and the fit-with-fallback entry point

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::isotonic::IsotonicTable;
use super::platt::{sigmoid, PlattCoefficients};
use super::CalibrationSample;
use crate::config::CalibrationParams;
use crate::error::CalibrationFitError;
use crate::trace::{TraceEvent, TraceSink};

/// Requested fit method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalibrationMethod {
    #[default]
    Isotonic,
    Platt,
}

impl std::str::FromStr for CalibrationMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "isotonic" => Ok(Self::Isotonic),
            "platt" => Ok(Self::Platt),
            other => Err(format!("unknown calibration method `{other}`")),
        }
    }
}

/// Monotone mapping from a clipped z-score to a probability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CalibrationModel {
    Isotonic(IsotonicTable),
    Platt(PlattCoefficients),
    /// Uncalibrated `sigmoid(slope * z)`
    Sigmoid { slope: f64 },
}

impl CalibrationModel {
    /// Raw model output; callers clamp through [`FittedCalibration::probability`].
    pub fn predict(&self, z: f64) -> f64 {
        match self {
            CalibrationModel::Isotonic(table) => table.predict(z),
            CalibrationModel::Platt(coef) => coef.predict(z),
            CalibrationModel::Sigmoid { slope } => sigmoid(slope * z),
        }
    }
}

/// A model plus the facts a consumer needs to decide whether to trust it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedCalibration {
    pub model: CalibrationModel,
    pub requested: CalibrationMethod,
    /// Training samples after pushes were removed
    pub samples: usize,
    /// Set when the fit was rejected and the sigmoid fallback is in use
    pub fallback_reason: Option<String>,
}

impl FittedCalibration {
    /// Uncalibrated model, used when nothing has been fit.
    pub fn uncalibrated(params: &CalibrationParams) -> Self {
        Self {
            model: CalibrationModel::Sigmoid {
                slope: params.fallback_slope,
            },
            requested: params.method,
            samples: 0,
            fallback_reason: Some("no calibration model supplied".to_string()),
        }
    }

    /// Fit the requested method, falling back to the sigmoid transform when the
    /// data cannot support it.
    pub fn fit(
        samples: &[CalibrationSample],
        params: &CalibrationParams,
        label: &str,
        sink: &dyn TraceSink,
    ) -> Self {
        match try_fit(samples, params) {
            Ok(model) => {
                sink.emit(TraceEvent::new(
                    "calibration",
                    serde_json::json!({
                        "target": label,
                        "method": params.method,
                        "samples": samples.len(),
                    }),
                ));
                Self {
                    model,
                    requested: params.method,
                    samples: samples.len(),
                    fallback_reason: None,
                }
            }
            Err(err) => {
                warn!(target: "calibration", label, error = %err, "calibration fit rejected, using sigmoid fallback");
                sink.emit(TraceEvent::new(
                    "calibration.fallback",
                    serde_json::json!({
                        "target": label,
                        "method": params.method,
                        "samples": samples.len(),
                        "reason": err.to_string(),
                    }),
                ));
                Self {
                    model: CalibrationModel::Sigmoid {
                        slope: params.fallback_slope,
                    },
                    requested: params.method,
                    samples: samples.len(),
                    fallback_reason: Some(err.to_string()),
                }
            }
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.fallback_reason.is_some()
    }

    /// Calibrated probability for `z`, kept inside `[floor, 1 - floor]`.
    pub fn probability(&self, z: f64, params: &CalibrationParams) -> f64 {
        let floor = params.probability_floor;
        let z = if z.is_finite() {
            z.clamp(-params.z_cap, params.z_cap)
        } else {
            0.0
        };
        let p = self.model.predict(z);
        if p.is_finite() {
            p.clamp(floor, 1.0 - floor)
        } else {
            0.5
        }
    }
}

fn insufficient(samples: &[CalibrationSample], params: &CalibrationParams) -> CalibrationFitError {
    CalibrationFitError::InsufficientSamples {
        found: samples.len(),
        required: params.min_samples.max(2),
    }
}

fn try_fit(
    samples: &[CalibrationSample],
    params: &CalibrationParams,
) -> Result<CalibrationModel, CalibrationFitError> {
    if samples.iter().any(|s| !s.z.is_finite()) {
        return Err(CalibrationFitError::NonFinite);
    }
    if samples.len() < params.min_samples.max(2) {
        return Err(insufficient(samples, params));
    }
    let positives = samples.iter().filter(|s| s.outcome).count();
    if positives == 0 || positives == samples.len() {
        return Err(CalibrationFitError::SingleClass);
    }
    let n = samples.len() as f64;
    let mean = samples.iter().map(|s| s.z).sum::<f64>() / n;
    let var = samples.iter().map(|s| (s.z - mean).powi(2)).sum::<f64>() / n;
    if var < 1e-12 {
        return Err(CalibrationFitError::ZeroVariance);
    }

    match params.method {
        CalibrationMethod::Isotonic => {
            let table = IsotonicTable::fit(samples).ok_or_else(|| insufficient(samples, params))?;
            if table.rise() <= 0.0 {
                return Err(CalibrationFitError::NonMonotonic { slope: 0.0 });
            }
            Ok(CalibrationModel::Isotonic(table))
        }
        CalibrationMethod::Platt => {
            let coef = PlattCoefficients::fit(samples, params.platt_max_iter, params.platt_ridge)?;
            Ok(CalibrationModel::Platt(coef))
        }
    }
}

/// Spread and total calibration bundle, serialized by the offline builder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationSet {
    pub spread: FittedCalibration,
    pub total: FittedCalibration,
}

impl CalibrationSet {
    pub fn uncalibrated(params: &CalibrationParams) -> Self {
        Self {
            spread: FittedCalibration::uncalibrated(params),
            total: FittedCalibration::uncalibrated(params),
        }
    }

    /// Reject malformed tables coming from outside the process.
    pub fn validate(&self) -> crate::Result<()> {
        for (name, fitted) in [("spread", &self.spread), ("total", &self.total)] {
            let ok = match &fitted.model {
                CalibrationModel::Isotonic(table) => table.is_well_formed(),
                CalibrationModel::Platt(coef) => {
                    coef.slope.is_finite() && coef.slope > 0.0 && coef.intercept.is_finite()
                }
                CalibrationModel::Sigmoid { slope } => slope.is_finite() && *slope > 0.0,
            };
            if !ok {
                return Err(crate::SimError::config(format!(
                    "calibration model `{name}` is malformed"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::{MemorySink, NullSink};

    fn params(method: CalibrationMethod) -> CalibrationParams {
        CalibrationParams {
            method,
            ..CalibrationParams::default()
        }
    }

    /// Outcome rate rising with z, deterministic.
    fn rising_samples(n: usize) -> Vec<CalibrationSample> {
        (0..n)
            .map(|i| {
                let z = -3.0 + 6.0 * (i as f64) / (n as f64 - 1.0);
                let threshold = 0.5 + 0.15 * z;
                let u = ((i * 37) % 100) as f64 / 100.0;
                CalibrationSample {
                    z,
                    outcome: u < threshold,
                }
            })
            .collect()
    }

    #[test]
    fn test_isotonic_fit_succeeds() {
        let p = params(CalibrationMethod::Isotonic);
        let fitted = FittedCalibration::fit(&rising_samples(400), &p, "spread", &NullSink);
        assert!(!fitted.is_fallback());
        assert!(matches!(fitted.model, CalibrationModel::Isotonic(_)));
        assert!(fitted.probability(2.5, &p) > fitted.probability(-2.5, &p));
    }

    #[test]
    fn test_platt_fit_succeeds() {
        let p = params(CalibrationMethod::Platt);
        let fitted = FittedCalibration::fit(&rising_samples(400), &p, "total", &NullSink);
        assert!(!fitted.is_fallback());
        match fitted.model {
            CalibrationModel::Platt(coef) => assert!(coef.slope > 0.0),
            other => panic!("expected platt, got {other:?}"),
        }
    }

    #[test]
    fn test_too_few_samples_falls_back_and_traces() {
        let p = params(CalibrationMethod::Isotonic);
        let sink = MemorySink::new();
        let fitted = FittedCalibration::fit(&rising_samples(10), &p, "spread", &sink);
        assert!(fitted.is_fallback());
        assert!(fitted
            .fallback_reason
            .as_deref()
            .unwrap()
            .contains("Insufficient samples"));
        assert_eq!(fitted.model, CalibrationModel::Sigmoid { slope: 1.6 });
        assert_eq!(sink.count("calibration.fallback"), 1);
    }

    #[test]
    fn test_insufficient_reports_effective_requirement() {
        let mut p = params(CalibrationMethod::Isotonic);
        p.min_samples = 0;
        let one = vec![CalibrationSample { z: 0.3, outcome: true }];
        let expected = CalibrationFitError::InsufficientSamples {
            found: 1,
            required: 2,
        };
        assert_eq!(try_fit(&one, &p).unwrap_err(), expected);
        assert_eq!(insufficient(&one, &p), expected);

        let p = params(CalibrationMethod::Isotonic);
        let samples = rising_samples(10);
        assert_eq!(
            insufficient(&samples, &p),
            CalibrationFitError::InsufficientSamples {
                found: 10,
                required: p.min_samples.max(2),
            }
        );
    }

    #[test]
    fn test_degenerate_inputs_fall_back() {
        let p = params(CalibrationMethod::Isotonic);
        let single: Vec<_> = (0..50)
            .map(|i| CalibrationSample {
                z: i as f64 / 50.0,
                outcome: true,
            })
            .collect();
        assert_eq!(
            try_fit(&single, &p).unwrap_err(),
            CalibrationFitError::SingleClass
        );

        let flat: Vec<_> = (0..50)
            .map(|i| CalibrationSample {
                z: 0.7,
                outcome: i % 2 == 0,
            })
            .collect();
        assert_eq!(
            try_fit(&flat, &p).unwrap_err(),
            CalibrationFitError::ZeroVariance
        );

        let mut nan = rising_samples(50);
        nan[3].z = f64::NAN;
        assert_eq!(try_fit(&nan, &p).unwrap_err(), CalibrationFitError::NonFinite);

        let falling: Vec<_> = (0..50)
            .map(|i| CalibrationSample {
                z: i as f64,
                outcome: i < 25,
            })
            .collect();
        assert!(matches!(
            try_fit(&falling, &p).unwrap_err(),
            CalibrationFitError::NonMonotonic { .. }
        ));
    }

    #[test]
    fn test_probability_is_clamped() {
        let p = params(CalibrationMethod::Isotonic);
        let fitted = FittedCalibration {
            model: CalibrationModel::Isotonic(IsotonicTable {
                knots: vec![-1.0, 1.0],
                values: vec![0.0, 1.0],
            }),
            requested: CalibrationMethod::Isotonic,
            samples: 2,
            fallback_reason: None,
        };
        assert_eq!(fitted.probability(-3.0, &p), 1e-4);
        assert_eq!(fitted.probability(3.0, &p), 1.0 - 1e-4);
        assert_eq!(fitted.probability(f64::NAN, &p), 0.5);
    }

    #[test]
    fn test_set_json_round_trip_and_validate() {
        let p = CalibrationParams::default();
        let set = CalibrationSet {
            spread: FittedCalibration::fit(&rising_samples(200), &p, "spread", &NullSink),
            total: FittedCalibration::uncalibrated(&p),
        };
        let json = serde_json::to_string(&set).unwrap();
        let back: CalibrationSet = serde_json::from_str(&json).unwrap();
        assert_eq!(back.spread.samples, 200);
        assert!(back.total.is_fallback());
        for z in [-2.0, -0.3, 0.0, 1.1, 2.9] {
            let diff = back.spread.probability(z, &p) - set.spread.probability(z, &p);
            assert!(diff.abs() < 1e-12);
        }
        assert!(back.validate().is_ok());

        let broken = CalibrationSet {
            spread: FittedCalibration {
                model: CalibrationModel::Sigmoid { slope: -1.0 },
                ..set.total.clone()
            },
            total: set.total,
        };
        assert!(broken.validate().is_err());
    }

    #[test]
    fn test_method_from_str() {
        assert_eq!("Platt".parse::<CalibrationMethod>(), Ok(CalibrationMethod::Platt));
        assert_eq!(
            "isotonic".parse::<CalibrationMethod>(),
            Ok(CalibrationMethod::Isotonic)
        );
        assert!("spline".parse::<CalibrationMethod>().is_err());
    }
}
