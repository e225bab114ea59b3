use thiserror::Error;

/// Errors surfaced to callers of the simulation engine.
///
/// Simulation divergence (realism guard misses, drive safety caps) is not an
/// error: it is reported as data on the trial result.
#[derive(Error, Debug)]
pub enum SimError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Missing capability `{field}` for {team}: {reason}")]
    MissingCapability {
        team: String,
        field: String,
        reason: String,
    },

    #[error("No completed trials ({requested} requested, {failed} failed, {skipped} skipped)")]
    NoCompletedTrials {
        requested: usize,
        failed: usize,
        skipped: usize,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl SimError {
    pub fn config(msg: impl Into<String>) -> Self {
        SimError::Configuration(msg.into())
    }

    /// Whether the caller can retry with corrected input rather than a code fix.
    pub fn is_recoverable(&self) -> bool {
        match self {
            SimError::Configuration(_) => false,
            SimError::MissingCapability { .. } => true,
            SimError::NoCompletedTrials { .. } => true,
            SimError::Io(_) => true,
            SimError::Json(_) | SimError::Yaml(_) => false,
        }
    }
}

/// Reasons a calibration fit cannot be trusted.
///
/// Fitting never propagates these to the caller; the fit falls back to the
/// uncalibrated sigmoid transform and records the reason.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CalibrationFitError {
    #[error("Insufficient samples: found {found}, need at least {required}")]
    InsufficientSamples { found: usize, required: usize },

    #[error("Z-scores have zero variance")]
    ZeroVariance,

    #[error("All outcomes belong to a single class")]
    SingleClass,

    #[error("Non-finite value in calibration input")]
    NonFinite,

    #[error("Fitted mapping is not increasing in z (slope {slope:.4})")]
    NonMonotonic { slope: f64 },
}

pub type Result<T> = std::result::Result<T, SimError>;
