//! Team capability bundle
//!
//! Read-only per-team, per-week rates and grades consumed by the play model.
//! Grades are on a 0-100 scale; EPA is per play; yards-per-attempt, ANY/A and
//! yards-per-play come in offense and defense-allowed pairs.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::buckets::{DistanceBucket, ScoreBucket, TimeBucket};
use crate::config::{PassRatePrior, PlayModelParams};

/// League neutral-situation pass rate; a team's own rate shifts the prior by the difference.
pub const LEAGUE_NEUTRAL_PASS_RATE: f64 = 0.56;

/// Quarterback completion and efficiency split.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QbSplit {
    pub completion_pct: f64,
    pub yards_per_attempt: f64,
}

/// Rest and weather for one game.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SituationalFactors {
    pub rest_days: f64,
    pub dome: bool,
    pub temperature_f: f64,
    pub wind_mph: f64,
}

impl Default for SituationalFactors {
    fn default() -> Self {
        Self {
            rest_days: 7.0,
            dome: false,
            temperature_f: 60.0,
            wind_mph: 5.0,
        }
    }
}

impl SituationalFactors {
    pub fn rest_multiplier(&self, params: &PlayModelParams) -> f64 {
        if self.rest_days <= params.short_rest_days {
            params.short_rest_mult
        } else if self.rest_days >= params.long_rest_days {
            params.long_rest_mult
        } else {
            1.0
        }
    }

    /// Completion-rate multiplier from wind and cold. Domes are neutral.
    pub fn passing_multiplier(&self, params: &PlayModelParams) -> f64 {
        self.weather_multiplier(params, params.wind_pass_penalty_per_mph)
    }

    /// Field goal make multiplier from wind and cold. Domes are neutral.
    pub fn kicking_multiplier(&self, params: &PlayModelParams) -> f64 {
        self.weather_multiplier(params, params.wind_kick_penalty_per_mph)
    }

    fn weather_multiplier(&self, params: &PlayModelParams, wind_per_mph: f64) -> f64 {
        if self.dome {
            return 1.0;
        }
        let mut mult = 1.0 - (self.wind_mph - params.wind_threshold_mph).max(0.0) * wind_per_mph;
        if self.temperature_f < params.cold_threshold_f {
            mult -= params.cold_penalty;
        }
        mult.clamp(params.weather_multiplier_floor, 1.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PassRateKey {
    pub down: u8,
    pub distance: DistanceBucket,
    pub score: ScoreBucket,
    pub time: TimeBucket,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PassRateEntry {
    pub down: u8,
    pub distance: DistanceBucket,
    pub score: ScoreBucket,
    pub time: TimeBucket,
    pub rate: f64,
}

/// Observed pass rate by situation. Serialized as a list of entries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<PassRateEntry>", into = "Vec<PassRateEntry>")]
pub struct PassRateTable {
    rates: BTreeMap<PassRateKey, f64>,
}

impl From<Vec<PassRateEntry>> for PassRateTable {
    fn from(entries: Vec<PassRateEntry>) -> Self {
        let mut table = PassRateTable::default();
        for e in entries {
            table.insert(e.down, e.distance, e.score, e.time, e.rate);
        }
        table
    }
}

impl From<PassRateTable> for Vec<PassRateEntry> {
    fn from(table: PassRateTable) -> Self {
        table
            .rates
            .into_iter()
            .map(|(k, rate)| PassRateEntry {
                down: k.down,
                distance: k.distance,
                score: k.score,
                time: k.time,
                rate,
            })
            .collect()
    }
}

impl PassRateTable {
    /// Non-finite rates are dropped; others are clamped into [0, 1].
    pub fn insert(
        &mut self,
        down: u8,
        distance: DistanceBucket,
        score: ScoreBucket,
        time: TimeBucket,
        rate: f64,
    ) {
        if !rate.is_finite() {
            return;
        }
        let key = PassRateKey {
            down,
            distance,
            score,
            time,
        };
        self.rates.insert(key, rate.clamp(0.0, 1.0));
    }

    pub fn get(
        &self,
        down: u8,
        distance: DistanceBucket,
        score: ScoreBucket,
        time: TimeBucket,
    ) -> Option<f64> {
        let key = PassRateKey {
            down,
            distance,
            score,
            time,
        };
        self.rates.get(&key).copied()
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

/// One team's capability profile for one week.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamCapability {
    pub name: String,
    pub pass_rates: PassRateTable,
    pub neutral_pass_rate: f64,
    pub qb_clean: QbSplit,
    pub qb_pressure: QbSplit,

    pub off_epa_per_play: f64,
    pub def_epa_per_play: f64,

    pub pass_block_grade: f64,
    pub pass_rush_grade: f64,
    pub run_block_grade: f64,
    pub run_defense_grade: f64,
    pub passing_grade: f64,
    pub coverage_grade: f64,

    pub yards_per_play: f64,
    pub def_yards_per_play: f64,
    pub yards_per_attempt: f64,
    pub def_yards_per_attempt: f64,
    pub anya: f64,
    pub def_anya: f64,

    pub red_zone_td_pct: f64,
    pub punt_net_yards: f64,
    pub fg_make_pct: f64,
    pub pace_seconds_per_play: f64,
    pub deep_pass_rate: f64,
    pub turnover_regression: f64,
    pub situational: SituationalFactors,
}

impl TeamCapability {
    /// League-average profile, the value every unresolved field takes.
    pub fn league_average(name: impl Into<String>) -> Self {
        let mut cap = Self {
            name: name.into(),
            pass_rates: PassRateTable::default(),
            neutral_pass_rate: 0.0,
            qb_clean: QbSplit {
                completion_pct: 0.0,
                yards_per_attempt: 0.0,
            },
            qb_pressure: QbSplit {
                completion_pct: 0.0,
                yards_per_attempt: 0.0,
            },
            off_epa_per_play: 0.0,
            def_epa_per_play: 0.0,
            pass_block_grade: 0.0,
            pass_rush_grade: 0.0,
            run_block_grade: 0.0,
            run_defense_grade: 0.0,
            passing_grade: 0.0,
            coverage_grade: 0.0,
            yards_per_play: 0.0,
            def_yards_per_play: 0.0,
            yards_per_attempt: 0.0,
            def_yards_per_attempt: 0.0,
            anya: 0.0,
            def_anya: 0.0,
            red_zone_td_pct: 0.0,
            punt_net_yards: 0.0,
            fg_make_pct: 0.0,
            pace_seconds_per_play: 0.0,
            deep_pass_rate: 0.0,
            turnover_regression: 0.0,
            situational: SituationalFactors::default(),
        };
        for field in CapabilityField::ALL {
            cap.set_field(field, field.league_default());
        }
        cap
    }

    /// Situational pass rate: the team's observed entry when present, else the
    /// league prior shifted by the team's neutral pass rate.
    pub fn pass_rate(
        &self,
        down: u8,
        distance: DistanceBucket,
        score: ScoreBucket,
        time: TimeBucket,
        prior: &PassRatePrior,
    ) -> f64 {
        if let Some(rate) = self.pass_rates.get(down, distance, score, time) {
            return rate.clamp(prior.min_rate, prior.max_rate);
        }

        let base = match (down, distance) {
            (1, _) => prior.first_down,
            (2, DistanceBucket::Long) => prior.second_long,
            (2, _) => prior.second_short,
            (_, DistanceBucket::Short) => prior.third_short,
            (_, DistanceBucket::Medium) => prior.third_medium,
            (_, DistanceBucket::Long) => prior.third_long,
        };
        let mut rate = base + (self.neutral_pass_rate - LEAGUE_NEUTRAL_PASS_RATE);
        match time {
            TimeBucket::TwoMinute if !score.is_leading() => rate += prior.trailing_late_boost,
            TimeBucket::Late if score.is_trailing() => rate += prior.trailing_late_boost,
            TimeBucket::TwoMinute | TimeBucket::Late if score.is_leading() => {
                rate -= prior.leading_late_cut
            }
            _ => {}
        }
        rate.clamp(prior.min_rate, prior.max_rate)
    }

    pub fn qb_split(&self, pressure: bool) -> QbSplit {
        if pressure {
            self.qb_pressure
        } else {
            self.qb_clean
        }
    }

    pub fn field(&self, field: CapabilityField) -> f64 {
        use CapabilityField as F;
        match field {
            F::NeutralPassRate => self.neutral_pass_rate,
            F::QbCleanCompletionPct => self.qb_clean.completion_pct,
            F::QbCleanYardsPerAttempt => self.qb_clean.yards_per_attempt,
            F::QbPressureCompletionPct => self.qb_pressure.completion_pct,
            F::QbPressureYardsPerAttempt => self.qb_pressure.yards_per_attempt,
            F::OffEpaPerPlay => self.off_epa_per_play,
            F::DefEpaPerPlay => self.def_epa_per_play,
            F::PassBlockGrade => self.pass_block_grade,
            F::PassRushGrade => self.pass_rush_grade,
            F::RunBlockGrade => self.run_block_grade,
            F::RunDefenseGrade => self.run_defense_grade,
            F::PassingGrade => self.passing_grade,
            F::CoverageGrade => self.coverage_grade,
            F::YardsPerPlay => self.yards_per_play,
            F::DefYardsPerPlay => self.def_yards_per_play,
            F::YardsPerAttempt => self.yards_per_attempt,
            F::DefYardsPerAttempt => self.def_yards_per_attempt,
            F::Anya => self.anya,
            F::DefAnya => self.def_anya,
            F::RedZoneTdPct => self.red_zone_td_pct,
            F::PuntNetYards => self.punt_net_yards,
            F::FgMakePct => self.fg_make_pct,
            F::PaceSecondsPerPlay => self.pace_seconds_per_play,
            F::DeepPassRate => self.deep_pass_rate,
            F::TurnoverRegression => self.turnover_regression,
            F::RestDays => self.situational.rest_days,
            F::Dome => {
                if self.situational.dome {
                    1.0
                } else {
                    0.0
                }
            }
            F::TemperatureF => self.situational.temperature_f,
            F::WindMph => self.situational.wind_mph,
        }
    }

    pub fn set_field(&mut self, field: CapabilityField, value: f64) {
        use CapabilityField as F;
        match field {
            F::NeutralPassRate => self.neutral_pass_rate = value,
            F::QbCleanCompletionPct => self.qb_clean.completion_pct = value,
            F::QbCleanYardsPerAttempt => self.qb_clean.yards_per_attempt = value,
            F::QbPressureCompletionPct => self.qb_pressure.completion_pct = value,
            F::QbPressureYardsPerAttempt => self.qb_pressure.yards_per_attempt = value,
            F::OffEpaPerPlay => self.off_epa_per_play = value,
            F::DefEpaPerPlay => self.def_epa_per_play = value,
            F::PassBlockGrade => self.pass_block_grade = value,
            F::PassRushGrade => self.pass_rush_grade = value,
            F::RunBlockGrade => self.run_block_grade = value,
            F::RunDefenseGrade => self.run_defense_grade = value,
            F::PassingGrade => self.passing_grade = value,
            F::CoverageGrade => self.coverage_grade = value,
            F::YardsPerPlay => self.yards_per_play = value,
            F::DefYardsPerPlay => self.def_yards_per_play = value,
            F::YardsPerAttempt => self.yards_per_attempt = value,
            F::DefYardsPerAttempt => self.def_yards_per_attempt = value,
            F::Anya => self.anya = value,
            F::DefAnya => self.def_anya = value,
            F::RedZoneTdPct => self.red_zone_td_pct = value,
            F::PuntNetYards => self.punt_net_yards = value,
            F::FgMakePct => self.fg_make_pct = value,
            F::PaceSecondsPerPlay => self.pace_seconds_per_play = value,
            F::DeepPassRate => self.deep_pass_rate = value,
            F::TurnoverRegression => self.turnover_regression = value,
            F::RestDays => self.situational.rest_days = value,
            F::Dome => self.situational.dome = value >= 0.5,
            F::TemperatureF => self.situational.temperature_f = value,
            F::WindMph => self.situational.wind_mph = value,
        }
    }
}

/// Scalar capability fields, each resolved independently through the source chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapabilityField {
    NeutralPassRate,
    QbCleanCompletionPct,
    QbCleanYardsPerAttempt,
    QbPressureCompletionPct,
    QbPressureYardsPerAttempt,
    OffEpaPerPlay,
    DefEpaPerPlay,
    PassBlockGrade,
    PassRushGrade,
    RunBlockGrade,
    RunDefenseGrade,
    PassingGrade,
    CoverageGrade,
    YardsPerPlay,
    DefYardsPerPlay,
    YardsPerAttempt,
    DefYardsPerAttempt,
    Anya,
    DefAnya,
    RedZoneTdPct,
    PuntNetYards,
    FgMakePct,
    PaceSecondsPerPlay,
    DeepPassRate,
    TurnoverRegression,
    RestDays,
    Dome,
    TemperatureF,
    WindMph,
}

impl CapabilityField {
    pub const ALL: [CapabilityField; 29] = [
        CapabilityField::NeutralPassRate,
        CapabilityField::QbCleanCompletionPct,
        CapabilityField::QbCleanYardsPerAttempt,
        CapabilityField::QbPressureCompletionPct,
        CapabilityField::QbPressureYardsPerAttempt,
        CapabilityField::OffEpaPerPlay,
        CapabilityField::DefEpaPerPlay,
        CapabilityField::PassBlockGrade,
        CapabilityField::PassRushGrade,
        CapabilityField::RunBlockGrade,
        CapabilityField::RunDefenseGrade,
        CapabilityField::PassingGrade,
        CapabilityField::CoverageGrade,
        CapabilityField::YardsPerPlay,
        CapabilityField::DefYardsPerPlay,
        CapabilityField::YardsPerAttempt,
        CapabilityField::DefYardsPerAttempt,
        CapabilityField::Anya,
        CapabilityField::DefAnya,
        CapabilityField::RedZoneTdPct,
        CapabilityField::PuntNetYards,
        CapabilityField::FgMakePct,
        CapabilityField::PaceSecondsPerPlay,
        CapabilityField::DeepPassRate,
        CapabilityField::TurnoverRegression,
        CapabilityField::RestDays,
        CapabilityField::Dome,
        CapabilityField::TemperatureF,
        CapabilityField::WindMph,
    ];

    pub fn name(self) -> &'static str {
        use CapabilityField as F;
        match self {
            F::NeutralPassRate => "neutral_pass_rate",
            F::QbCleanCompletionPct => "qb_clean_completion_pct",
            F::QbCleanYardsPerAttempt => "qb_clean_yards_per_attempt",
            F::QbPressureCompletionPct => "qb_pressure_completion_pct",
            F::QbPressureYardsPerAttempt => "qb_pressure_yards_per_attempt",
            F::OffEpaPerPlay => "off_epa_per_play",
            F::DefEpaPerPlay => "def_epa_per_play",
            F::PassBlockGrade => "pass_block_grade",
            F::PassRushGrade => "pass_rush_grade",
            F::RunBlockGrade => "run_block_grade",
            F::RunDefenseGrade => "run_defense_grade",
            F::PassingGrade => "passing_grade",
            F::CoverageGrade => "coverage_grade",
            F::YardsPerPlay => "yards_per_play",
            F::DefYardsPerPlay => "def_yards_per_play",
            F::YardsPerAttempt => "yards_per_attempt",
            F::DefYardsPerAttempt => "def_yards_per_attempt",
            F::Anya => "anya",
            F::DefAnya => "def_anya",
            F::RedZoneTdPct => "red_zone_td_pct",
            F::PuntNetYards => "punt_net_yards",
            F::FgMakePct => "fg_make_pct",
            F::PaceSecondsPerPlay => "pace_seconds_per_play",
            F::DeepPassRate => "deep_pass_rate",
            F::TurnoverRegression => "turnover_regression",
            F::RestDays => "rest_days",
            F::Dome => "dome",
            F::TemperatureF => "temperature_f",
            F::WindMph => "wind_mph",
        }
    }

    /// League-average value used when no source provides the field.
    pub fn league_default(self) -> f64 {
        use CapabilityField as F;
        match self {
            F::NeutralPassRate => LEAGUE_NEUTRAL_PASS_RATE,
            F::QbCleanCompletionPct => 0.68,
            F::QbCleanYardsPerAttempt => 7.6,
            F::QbPressureCompletionPct => 0.50,
            F::QbPressureYardsPerAttempt => 5.6,
            F::OffEpaPerPlay | F::DefEpaPerPlay => 0.0,
            F::PassBlockGrade
            | F::PassRushGrade
            | F::RunBlockGrade
            | F::RunDefenseGrade
            | F::PassingGrade
            | F::CoverageGrade => 65.0,
            F::YardsPerPlay | F::DefYardsPerPlay => 5.3,
            F::YardsPerAttempt | F::DefYardsPerAttempt => 7.0,
            F::Anya | F::DefAnya => 6.0,
            F::RedZoneTdPct => 0.56,
            F::PuntNetYards => 41.0,
            F::FgMakePct => 0.85,
            F::PaceSecondsPerPlay => 38.0,
            F::DeepPassRate => 0.12,
            F::TurnoverRegression => 1.0,
            F::RestDays => 7.0,
            F::Dome => 0.0,
            F::TemperatureF => 60.0,
            F::WindMph => 5.0,
        }
    }

    /// Plausible range for a supplied value; values outside it are rejected.
    pub fn accepts(self, value: f64) -> bool {
        use CapabilityField as F;
        if !value.is_finite() {
            return false;
        }
        match self {
            F::NeutralPassRate
            | F::QbCleanCompletionPct
            | F::QbPressureCompletionPct
            | F::RedZoneTdPct
            | F::FgMakePct
            | F::DeepPassRate
            | F::Dome => (0.0..=1.0).contains(&value),
            F::PassBlockGrade
            | F::PassRushGrade
            | F::RunBlockGrade
            | F::RunDefenseGrade
            | F::PassingGrade
            | F::CoverageGrade => (0.0..=100.0).contains(&value),
            F::OffEpaPerPlay | F::DefEpaPerPlay => (-1.0..=1.0).contains(&value),
            F::QbCleanYardsPerAttempt
            | F::QbPressureYardsPerAttempt
            | F::YardsPerPlay
            | F::DefYardsPerPlay
            | F::YardsPerAttempt
            | F::DefYardsPerAttempt
            | F::Anya
            | F::DefAnya => (-5.0..=20.0).contains(&value),
            F::PuntNetYards => (10.0..=70.0).contains(&value),
            F::PaceSecondsPerPlay => (5.0..=60.0).contains(&value),
            F::TurnoverRegression => (0.0..=3.0).contains(&value),
            F::RestDays => (0.0..=30.0).contains(&value),
            F::TemperatureF => (-40.0..=130.0).contains(&value),
            F::WindMph => (0.0..=80.0).contains(&value),
        }
    }
}
