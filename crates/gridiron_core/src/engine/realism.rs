//! Realism guard
//!
//! Post-hoc comparison of one game's aggregate statistics against the
//! configured target ranges. A violation is flagged data, never an error.

use serde::{Deserialize, Serialize};

use super::game_sim::{GameResult, GameStats};
use crate::config::{MetricRange, RealismTargets};
use crate::trace::{TraceEvent, TraceSink};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RealismMetrics {
    pub plays_per_drive: f64,
    pub drives_per_team: f64,
    pub touchdown_rate: f64,
    pub field_goal_rate: f64,
    pub turnover_rate: f64,
    pub explosive_rate: f64,
    pub pass_rate: f64,
    pub total_points: f64,
}

impl RealismMetrics {
    pub fn from_game(result: &GameResult, stats: &GameStats) -> Self {
        let drives = stats.total_drives() as f64;
        let plays = stats.total_plays() as f64;
        let per_drive = |n: u32| ratio(n as f64, drives);
        let per_play = |n: u32| ratio(n as f64, plays);
        Self {
            plays_per_drive: ratio(plays, drives),
            drives_per_team: drives / 2.0,
            touchdown_rate: per_drive(stats.total_touchdowns()),
            field_goal_rate: per_drive(stats.total_field_goals()),
            turnover_rate: per_drive(stats.total_turnovers()),
            explosive_rate: per_play(stats.total_explosive_plays()),
            pass_rate: per_play(stats.total_pass_plays()),
            total_points: result.total() as f64,
        }
    }

    fn values(&self) -> [(&'static str, f64); 8] {
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

fn ratio(num: f64, den: f64) -> f64 {
    if den > 0.0 {
        num / den
    } else {
        0.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RealismViolation {
    pub metric: String,
    pub value: f64,
    pub expected: MetricRange,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RealismReport {
    pub metrics: RealismMetrics,
    pub violations: Vec<RealismViolation>,
    /// Drives that hit the snap cap
    pub drive_caps: u32,
}

impl RealismReport {
    pub fn evaluate(result: &GameResult, stats: &GameStats, targets: &RealismTargets) -> Self {
        let metrics = RealismMetrics::from_game(result, stats);
        let violations = metrics
            .values()
            .iter()
            .zip(targets.ranges().iter())
            .filter(|((_, value), (_, range))| !range.contains(*value))
            .map(|((metric, value), (_, range))| RealismViolation {
                metric: metric.to_string(),
                value: *value,
                expected: *range,
            })
            .collect();
        Self {
            metrics,
            violations,
            drive_caps: stats.total_safety_caps(),
        }
    }

    /// In range on every metric and no capped drives.
    pub fn passes(&self) -> bool {
        self.violations.is_empty() && self.drive_caps == 0
    }

    pub fn violates(&self, metric: &str) -> bool {
        self.violations.iter().any(|v| v.metric == metric)
    }

    pub(crate) fn emit(&self, trial: u64, sink: &dyn TraceSink) {
        if !sink.enabled() {
            return;
        }
        if self.passes() {
            sink.emit(TraceEvent::for_trial(
                "realism.pass",
                trial,
                serde_json::json!({ "metrics": self.metrics }),
            ));
            return;
        }
        sink.emit(TraceEvent::for_trial(
            "realism.violation",
            trial,
            serde_json::json!({
                "violations": self.violations,
                "drive_caps": self.drive_caps,
            }),
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::game_sim::TeamGameStats;
    use crate::trace::MemorySink;

    fn nominal_stats() -> GameStats {
        let team = TeamGameStats {
            drives: 11,
            plays: 62,
            pass_plays: 36,
            explosive_plays: 5,
            touchdowns: 2,
            field_goals_made: 2,
            interceptions_thrown: 1,
            fumbles_lost: 1,
            ..TeamGameStats::default()
        };
        GameStats {
            home: team.clone(),
            away: team,
        }
    }

    #[test]
    fn test_nominal_game_passes() {
        let result = GameResult {
            home_score: 20,
            away_score: 20,
        };
        let report = RealismReport::evaluate(&result, &nominal_stats(), &RealismTargets::default());
        assert!(report.passes(), "{:?}", report.violations);
        assert!((report.metrics.plays_per_drive - 62.0 / 11.0).abs() < 1e-12);
        assert_eq!(report.metrics.drives_per_team, 11.0);
        assert!((report.metrics.turnover_rate - 4.0 / 22.0).abs() < 1e-12);
    }

    #[test]
    fn test_violations_are_flagged() {
        let mut stats = nominal_stats();
        stats.home.pass_plays = 62;
        stats.away.pass_plays = 62;
        let result = GameResult {
            home_score: 70,
            away_score: 35,
        };
        let report = RealismReport::evaluate(&result, &stats, &RealismTargets::default());
        assert!(!report.passes());
        assert!(report.violates("pass_rate"));
        assert!(report.violates("total_points"));
        assert!(!report.violates("plays_per_drive"));

        let sink = MemorySink::new();
        report.emit(4, &sink);
        assert_eq!(sink.count("realism.violation"), 1);
        assert_eq!(sink.events()[0].trial, Some(4));
    }

    #[test]
    fn test_capped_drive_fails_guard() {
        let mut stats = nominal_stats();
        stats.home.safety_caps = 1;
        let result = GameResult {
            home_score: 17,
            away_score: 13,
        };
        let report = RealismReport::evaluate(&result, &stats, &RealismTargets::default());
        assert!(report.violations.is_empty());
        assert!(!report.passes());
    }

    #[test]
    fn test_empty_game_has_zero_rates() {
        let report = RealismReport::evaluate(
            &GameResult {
                home_score: 0,
                away_score: 0,
            },
            &GameStats::default(),
            &RealismTargets::default(),
        );
        assert_eq!(report.metrics.plays_per_drive, 0.0);
        assert!(report.violates("drives_per_team"));
    }
}
