//! Historical game CSV → calibration samples
//!
//! One row per game. Columns:
//!
//! | column | meaning |
//! |--------|---------|
//! | `season`, `week`, `home`, `away` | identification, carried through for error messages |
//! | `spread` | closing spread, negative = home favored |
//! | `total` | closing total |
//! | `sim_margin_mean`, `sim_margin_sd` | raw simulator margin (home - away) for the game |
//! | `sim_total_mean`, `sim_total_sd` | raw simulator total |
//! | `home_score`, `away_score` | final score |

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use gridiron_core::calibration::CalibrationSample;
use gridiron_core::config::CalibrationParams;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRow {
    pub season: u16,
    pub week: u8,
    pub home: String,
    pub away: String,
    pub spread: f64,
    pub total: f64,
    pub sim_margin_mean: f64,
    pub sim_margin_sd: f64,
    pub sim_total_mean: f64,
    pub sim_total_sd: f64,
    pub home_score: u16,
    pub away_score: u16,
}

impl HistoryRow {
    pub fn realized_margin(&self) -> f64 {
        f64::from(self.home_score) - f64::from(self.away_score)
    }

    pub fn realized_total(&self) -> f64 {
        f64::from(self.home_score) + f64::from(self.away_score)
    }

    fn is_usable(&self) -> bool {
        [
            self.spread,
            self.total,
            self.sim_margin_mean,
            self.sim_margin_sd,
            self.sim_total_mean,
            self.sim_total_sd,
        ]
        .iter()
        .all(|v| v.is_finite())
            && self.total > 0.0
    }
}

/// Parse outcome counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleStats {
    pub rows: usize,
    /// Rows with non-finite values or a non-positive total
    pub rejected_rows: usize,
    pub spread_pushes: usize,
    pub total_pushes: usize,
}

/// Training samples for both targets.
#[derive(Debug, Clone, Default)]
pub struct HistorySamples {
    pub spread: Vec<CalibrationSample>,
    pub total: Vec<CalibrationSample>,
    pub stats: SampleStats,
}

/// Read every row of a history CSV.
pub fn load_history(csv_path: &Path) -> Result<Vec<HistoryRow>> {
    let mut reader = csv::Reader::from_path(csv_path)
        .with_context(|| format!("Failed to open history CSV: {}", csv_path.display()))?;

    let mut rows = Vec::new();
    for (idx, record) in reader.deserialize::<HistoryRow>().enumerate() {
        // +2: header line and 1-based numbering
        let row = record.with_context(|| format!("Malformed history row at line {}", idx + 2))?;
        rows.push(row);
    }
    Ok(rows)
}

/// Turn history rows into `(z, outcome)` samples. The spread target is the home
/// cover: z compares the simulated margin with the margin the line implies.
pub fn build_samples(rows: &[HistoryRow], params: &CalibrationParams) -> HistorySamples {
    let mut out = HistorySamples {
        stats: SampleStats {
            rows: rows.len(),
            ..SampleStats::default()
        },
        ..HistorySamples::default()
    };

    for row in rows {
        if !row.is_usable() {
            tracing::warn!(
                season = row.season,
                week = row.week,
                home = %row.home,
                away = %row.away,
                "skipping unusable history row"
            );
            out.stats.rejected_rows += 1;
            continue;
        }

        match CalibrationSample::from_history(
            row.sim_margin_mean,
            row.sim_margin_sd,
            -row.spread,
            row.realized_margin(),
            params.z_cap,
        ) {
            Some(sample) => out.spread.push(sample),
            None => out.stats.spread_pushes += 1,
        }
        match CalibrationSample::from_history(
            row.sim_total_mean,
            row.sim_total_sd,
            row.total,
            row.realized_total(),
            params.z_cap,
        ) {
            Some(sample) => out.total.push(sample),
            None => out.stats.total_pushes += 1,
        }
    }
    out
}
