//! Calibration Builder Library
//!
//! Historical CSV → (z, outcome) samples → fitted spread/total calibration →
//! JSON bundle with a SHA256 checksum over the calibration set.
//!
//! The `calibration` field of a bundle is what `gridiron_core` consumes
//! (`CalibrationSet`, or the `calibration` field of a JSON matchup request).

pub mod history;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use gridiron_core::calibration::{
    evaluate, reliability_bins, CalibrationMethod, CalibrationMetrics, CalibrationSample,
    CalibrationSet, FittedCalibration, ReliabilityBin,
};
use gridiron_core::config::{CalibrationParams, SimConfig};
use gridiron_core::NullSink;

pub use history::{build_samples, load_history, HistoryRow, HistorySamples, SampleStats};

pub const BUNDLE_SCHEMA_VERSION: &str = "v1";

/// Fit quality of one target over its own training samples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetDiagnostics {
    pub samples: usize,
    pub fallback_reason: Option<String>,
    pub metrics: CalibrationMetrics,
    pub reliability: Vec<ReliabilityBin>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundleDiagnostics {
    pub spread: TargetDiagnostics,
    pub total: TargetDiagnostics,
}

/// Fitted calibration plus the metadata needed to trust it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationBundle {
    pub schema_version: String,
    /// SHA256 of the compact JSON of `calibration` (hex)
    pub checksum: String,
    /// Creation time (RFC3339)
    pub created_at: String,
    /// Engine parameter set the fit was made under
    pub config_version: String,
    pub config_fingerprint: String,
    pub method: CalibrationMethod,
    pub stats: SampleStats,
    pub diagnostics: BundleDiagnostics,
    pub calibration: CalibrationSet,
}

impl CalibrationBundle {
    /// Recompute the checksum and compare.
    pub fn verify(&self) -> Result<bool> {
        Ok(calibration_checksum(&self.calibration)? == self.checksum)
    }
}

pub fn calibration_checksum(set: &CalibrationSet) -> Result<String> {
    let bytes = serde_json::to_vec(set).context("Failed to serialize calibration set")?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(format!("{:x}", hasher.finalize()))
}

fn diagnose(
    fitted: &FittedCalibration,
    samples: &[CalibrationSample],
    params: &CalibrationParams,
) -> TargetDiagnostics {
    let predictions: Vec<f64> = samples.iter().map(|s| fitted.probability(s.z, params)).collect();
    let outcomes: Vec<bool> = samples.iter().map(|s| s.outcome).collect();
    TargetDiagnostics {
        samples: samples.len(),
        fallback_reason: fitted.fallback_reason.clone(),
        metrics: evaluate(&predictions, &outcomes),
        reliability: reliability_bins(&predictions, &outcomes, params.reliability_bins),
    }
}

/// Fit both targets from prepared samples. Rejected fits fall back to the
/// sigmoid transform and are recorded in the diagnostics, not returned as errors.
pub fn fit_bundle(samples: &HistorySamples, config: &SimConfig) -> Result<CalibrationBundle> {
    let params = &config.calibration;
    let spread = FittedCalibration::fit(&samples.spread, params, "spread", &NullSink);
    let total = FittedCalibration::fit(&samples.total, params, "total", &NullSink);

    let diagnostics = BundleDiagnostics {
        spread: diagnose(&spread, &samples.spread, params),
        total: diagnose(&total, &samples.total, params),
    };
    let calibration = CalibrationSet { spread, total };

    Ok(CalibrationBundle {
        schema_version: BUNDLE_SCHEMA_VERSION.to_string(),
        checksum: calibration_checksum(&calibration)?,
        created_at: chrono::Utc::now().to_rfc3339(),
        config_version: config.version.clone(),
        config_fingerprint: config.fingerprint(),
        method: params.method,
        stats: samples.stats,
        diagnostics,
        calibration,
    })
}

/// Read a history CSV, fit, and write the bundle as pretty JSON.
///
/// # Arguments
///
/// * `csv_path` - historical games, see [`history`] for the columns
/// * `output_json` - bundle destination, parent directories are created
/// * `config` - engine config whose `calibration` section drives the fit
pub fn build_calibration(
    csv_path: &Path,
    output_json: &Path,
    config: &SimConfig,
) -> Result<CalibrationBundle> {
    let rows = load_history(csv_path)?;
    if rows.is_empty() {
        bail!("History CSV has no rows: {}", csv_path.display());
    }
    let samples = build_samples(&rows, &config.calibration);
    let bundle = fit_bundle(&samples, config)?;

    for (target, diag) in [("spread", &bundle.diagnostics.spread), ("total", &bundle.diagnostics.total)] {
        match &diag.fallback_reason {
            Some(reason) => warn!(target_name = target, samples = diag.samples, %reason, "fit fell back to sigmoid"),
            None => info!(
                target_name = target,
                samples = diag.samples,
                brier = diag.metrics.brier,
                log_loss = diag.metrics.log_loss,
                "fit accepted"
            ),
        }
    }

    if let Some(parent) = output_json.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output directory: {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(&bundle).context("Failed to serialize bundle")?;
    fs::write(output_json, json)
        .with_context(|| format!("Failed to write bundle: {}", output_json.display()))?;

    Ok(bundle)
}

/// Load a bundle and check it is intact and usable by the engine.
pub fn load_bundle(path: &Path) -> Result<CalibrationBundle> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("Failed to read bundle: {}", path.display()))?;
    let bundle: CalibrationBundle =
        serde_json::from_str(&json).context("Failed to parse calibration bundle")?;
    if !bundle.verify()? {
        bail!("Calibration bundle checksum mismatch: {}", path.display());
    }
    bundle
        .calibration
        .validate()
        .context("Calibration bundle holds a malformed model")?;
    Ok(bundle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{tempdir, NamedTempFile};

    fn write_history(games: usize) -> Result<NamedTempFile> {
        let mut file = NamedTempFile::new()?;
        writeln!(
            file,
            "season,week,home,away,spread,total,sim_margin_mean,sim_margin_sd,sim_total_mean,sim_total_sd,home_score,away_score"
        )?;
        for i in 0..games {
            // The simulator's edge against both lines grows with i, and so does
            // the chance the side it points to hits.
            let edge = -10.0 + 20.0 * i as f64 / games as f64;
            let total_edge = -8.0 + 16.0 * i as f64 / games as f64;
            let noise = ((i * 37) % 29) as i64 - 14;
            let total_noise = ((i * 53) % 23) as i64 - 11;

            let margin = (3 + edge.round() as i64 + noise).clamp(-40, 40);
            let target_total = 44.5 + total_edge + total_noise as f64;
            let mut away = (((target_total - margin as f64) / 2.0).round() as i64).max(0);
            let mut home = away + margin;
            if home < 0 {
                away -= home;
                home = 0;
            }
            writeln!(
                file,
                "2023,{},H{i},A{i},-3.0,44.5,{:.3},13.0,{:.3},10.0,{home},{away}",
                1 + i % 18,
                3.0 + edge,
                44.5 + total_edge,
            )?;
        }
        Ok(file)
    }

    #[test]
    fn test_build_and_load_bundle() -> Result<()> {
        let history = write_history(300)?;
        let dir = tempdir()?;
        let out = dir.path().join("nested").join("calibration.json");

        let config = SimConfig::default();
        let bundle = build_calibration(history.path(), &out, &config)?;
        assert_eq!(bundle.schema_version, BUNDLE_SCHEMA_VERSION);
        assert_eq!(bundle.stats.rows, 300);
        assert!(bundle.verify()?);
        assert!(bundle.diagnostics.spread.fallback_reason.is_none());
        assert!(bundle.diagnostics.spread.metrics.brier < 0.25);
        assert!(!bundle.diagnostics.spread.reliability.is_empty());
        assert_eq!(bundle.config_fingerprint, config.fingerprint());

        let loaded = load_bundle(&out)?;
        assert_eq!(loaded.checksum, bundle.checksum);
        assert_eq!(loaded.calibration, bundle.calibration);
        Ok(())
    }

    #[test]
    fn test_small_history_falls_back() -> Result<()> {
        let history = write_history(12)?;
        let dir = tempdir()?;
        let out = dir.path().join("calibration.json");

        let bundle = build_calibration(history.path(), &out, &SimConfig::default())?;
        assert!(bundle.calibration.spread.is_fallback());
        assert!(bundle
            .diagnostics
            .spread
            .fallback_reason
            .as_deref()
            .is_some_and(|r| r.contains("Insufficient samples")));
        assert!(load_bundle(&out).is_ok());
        Ok(())
    }

    #[test]
    fn test_platt_method_is_recorded() -> Result<()> {
        let history = write_history(300)?;
        let dir = tempdir()?;
        let mut config = SimConfig::default();
        config.calibration.method = CalibrationMethod::Platt;

        let bundle = build_calibration(history.path(), &dir.path().join("platt.json"), &config)?;
        assert_eq!(bundle.method, CalibrationMethod::Platt);
        assert_eq!(bundle.calibration.spread.requested, CalibrationMethod::Platt);
        Ok(())
    }

    #[test]
    fn test_tampered_bundle_is_rejected() -> Result<()> {
        let history = write_history(300)?;
        let dir = tempdir()?;
        let out = dir.path().join("calibration.json");
        let mut bundle = build_calibration(history.path(), &out, &SimConfig::default())?;

        bundle.calibration.total.samples += 1;
        fs::write(&out, serde_json::to_string(&bundle)?)?;
        let err = load_bundle(&out).unwrap_err();
        assert!(err.to_string().contains("checksum mismatch"));
        Ok(())
    }

    #[test]
    fn test_empty_history_is_an_error() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        writeln!(
            file,
            "season,week,home,away,spread,total,sim_margin_mean,sim_margin_sd,sim_total_mean,sim_total_sd,home_score,away_score"
        )?;
        let dir = tempdir()?;
        let err = build_calibration(file.path(), &dir.path().join("x.json"), &SimConfig::default())
            .unwrap_err();
        assert!(err.to_string().contains("no rows"));
        Ok(())
    }
}
