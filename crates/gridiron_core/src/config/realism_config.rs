//! Realism guard target ranges
//!
//! Per-game ranges a simulated game is expected to land in. The ranges cover
//! single-game noise (~22 drives); a game outside them points at the model,
//! not at an unusual afternoon.

use serde::{Deserialize, Serialize};

/// Inclusive acceptable range for one metric.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricRange {
    pub min: f64,
    pub max: f64,
}

impl MetricRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Target ranges for one game's aggregate statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RealismTargets {
    /// Offensive snaps per drive (default: 3.5..=9.0)
    pub plays_per_drive: MetricRange,
    /// Drives per team (default: 7..=17)
    pub drives_per_team: MetricRange,
    /// Share of drives ending in a touchdown (default: 0.03..=0.50)
    pub touchdown_rate: MetricRange,
    /// Share of drives ending in a made field goal (default: 0.0..=0.35)
    pub field_goal_rate: MetricRange,
    /// Share of drives ending in an interception or lost fumble (default: 0.0..=0.35)
    pub turnover_rate: MetricRange,
    /// Share of scrimmage plays gaining 20+ yards (default: 0.005..=0.20)
    pub explosive_rate: MetricRange,
    /// Share of scrimmage plays that are dropbacks (default: 0.40..=0.75)
    pub pass_rate: MetricRange,
    /// Combined points (default: 3..=90)
    pub total_points: MetricRange,
}

impl Default for RealismTargets {
    fn default() -> Self {
        Self {
            plays_per_drive: MetricRange::new(3.5, 9.0),
            drives_per_team: MetricRange::new(7.0, 17.0),
            touchdown_rate: MetricRange::new(0.03, 0.50),
            field_goal_rate: MetricRange::new(0.0, 0.35),
            turnover_rate: MetricRange::new(0.0, 0.35),
            explosive_rate: MetricRange::new(0.005, 0.20),
            pass_rate: MetricRange::new(0.40, 0.75),
            total_points: MetricRange::new(3.0, 90.0),
        }
    }
}

impl RealismTargets {
    pub(crate) fn ranges(&self) -> [(&'static str, MetricRange); 8] {
        [
            ("plays_per_drive", self.plays_per_drive),
            ("drives_per_team", self.drives_per_team),
            ("touchdown_rate", self.touchdown_rate),
            ("field_goal_rate", self.field_goal_rate),
            ("turnover_rate", self.turnover_rate),
            ("explosive_rate", self.explosive_rate),
            ("pass_rate", self.pass_rate),
            ("total_points", self.total_points),
        ]
    }
}
