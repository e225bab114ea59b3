//! Matchup pipeline: batch simulation, market centering, calibration, edges.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::calibration::{calibrate, CalibrationSet, SideProbabilities};
use crate::config::SimConfig;
use crate::engine::{BatchOptions, FailedTrial, GameSimulator, ScoreSummary};
use crate::error::{Result, SimError};
use crate::market::{best_edge, BetSide, EdgeAssessment, MarketLine};
use crate::team::{Provenance, ResolvedCapability};
use crate::trace::{TraceEvent, TraceSink};

/// Both teams (resolved through the source chain) and the line.
#[derive(Debug, Clone)]
pub struct Matchup<'a> {
    pub home: &'a ResolvedCapability,
    pub away: &'a ResolvedCapability,
    pub market: MarketLine,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreArrays {
    pub home: Vec<f64>,
    pub away: Vec<f64>,
}

/// Parameters the centering transform applied.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CenteringSummary {
    pub scale: f64,
    pub total_shift: f64,
    pub margin_shift: f64,
}

/// Share of decided games (pushes excluded) on the home-cover and over sides.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EmpiricalRates {
    pub home_cover: Option<f64>,
    pub over: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibratedProbabilities {
    /// Home cover, away cover is the complement
    pub spread: SideProbabilities,
    /// Over, under is the complement
    pub total: SideProbabilities,
    pub spread_fallback: Option<String>,
    pub total_fallback: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultedInput {
    pub team: String,
    pub field: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub home_team: String,
    pub away_team: String,
    pub market: MarketLine,
    pub config_version: String,
    pub config_fingerprint: String,
    pub base_seed: u64,
    pub requested: usize,
    pub completed: usize,
    pub failed_trials: Vec<FailedTrial>,
    pub skipped_trials: Vec<u64>,
    pub raw: ScoreSummary,
    pub centered: ScoreSummary,
    pub raw_scores: ScoreArrays,
    pub centered_scores: ScoreArrays,
    pub centering: CenteringSummary,
    pub empirical_raw: EmpiricalRates,
    pub empirical_centered: EmpiricalRates,
    pub probabilities: CalibratedProbabilities,
    pub edges: Vec<EdgeAssessment>,
    pub best_edge: Option<EdgeAssessment>,
    pub realism_pass_rate: f64,
    pub drive_caps: u32,
    pub defaulted_inputs: Vec<DefaultedInput>,
}

fn defaulted_inputs(resolved: &ResolvedCapability) -> Vec<DefaultedInput> {
    let team = resolved.team().to_string();
    let mut out: Vec<DefaultedInput> = resolved
        .provenance
        .iter()
        .filter_map(|(field, prov)| match prov {
            Provenance::Defaulted { reason } => Some(DefaultedInput {
                team: team.clone(),
                field: field.name().to_string(),
                reason: reason.clone(),
            }),
            Provenance::Observed { .. } => None,
        })
        .collect();
    if let Provenance::Defaulted { reason } = &resolved.pass_rates {
        out.push(DefaultedInput {
            team,
            field: "pass_rates".to_string(),
            reason: reason.clone(),
        });
    }
    out
}

/// Simulate a matchup and turn the batch into probabilities and edges.
pub fn run_matchup(
    matchup: &Matchup,
    config: &SimConfig,
    calibration: &CalibrationSet,
    options: &BatchOptions,
    sink: &dyn TraceSink,
) -> Result<BatchReport> {
    config.validate()?;
    calibration.validate()?;
    let market = matchup.market;
    market.validate()?;

    let fingerprint = config.fingerprint();
    if sink.enabled() {
        sink.emit(TraceEvent::new(
            "inputs.audit",
            serde_json::json!({
                "config_version": config.version,
                "config_fingerprint": fingerprint,
                "base_seed": options.base_seed,
                "trials": options.trials,
                "market": market,
                "home": matchup.home.audit_payload(),
                "away": matchup.away.audit_payload(),
            }),
        ));
    }

    let sim = GameSimulator::new(&matchup.home.capability, &matchup.away.capability, config).with_sink(sink);
    let batch = sim.simulate_batch(options);
    if batch.completed() == 0 {
        return Err(SimError::NoCompletedTrials {
            requested: batch.requested,
            failed: batch.failed_trials.len(),
            skipped: batch.skipped_trials.len(),
        });
    }

    let raw_home = batch.home_scores();
    let raw_away = batch.away_scores();
    let raw = batch.summary(&config.market);
    let centered_scores = market.center(&raw_home, &raw_away, &config.market)?;
    let centered = ScoreSummary::from_scores(&centered_scores.home, &centered_scores.away, &config.market);

    let params = &config.calibration;
    let spread = calibrate(
        &calibration.spread,
        raw.margin.mean,
        raw.margin.sd,
        market.expected_margin(),
        params,
    );
    let total = calibrate(&calibration.total, raw.total.mean, raw.total.sd, market.total, params);
    if calibration.spread.is_fallback() || calibration.total.is_fallback() {
        warn!(
            spread = ?calibration.spread.fallback_reason,
            total = ?calibration.total.fallback_reason,
            "using uncalibrated sigmoid fallback"
        );
    }

    let default_odds = config.edge.default_american_odds;
    let edges = [
        (BetSide::HomeCover, spread.side),
        (BetSide::AwayCover, spread.other),
        (BetSide::Over, total.side),
        (BetSide::Under, total.other),
    ]
    .into_iter()
    .map(|(side, p)| EdgeAssessment::assess(side, p, market.odds_for(side, default_odds), &config.edge))
    .collect::<Result<Vec<_>>>()?;
    let best = best_edge(&edges).copied();

    let margins_centered: Vec<f64> = centered_scores
        .home
        .iter()
        .zip(&centered_scores.away)
        .map(|(h, a)| h - a)
        .collect();
    let totals_centered: Vec<f64> = centered_scores
        .home
        .iter()
        .zip(&centered_scores.away)
        .map(|(h, a)| h + a)
        .collect();

    let mut defaulted = defaulted_inputs(matchup.home);
    defaulted.extend(defaulted_inputs(matchup.away));

    info!(
        home = %matchup.home.team(),
        away = %matchup.away.team(),
        home_cover = spread.side,
        over = total.side,
        best = ?best.map(|b| b.side),
        "matchup analysed"
    );

    Ok(BatchReport {
        home_team: matchup.home.team().to_string(),
        away_team: matchup.away.team().to_string(),
        market,
        config_version: config.version.clone(),
        config_fingerprint: fingerprint,
        base_seed: batch.base_seed,
        requested: batch.requested,
        completed: batch.completed(),
        realism_pass_rate: batch.realism_pass_rate(),
        drive_caps: batch.drive_caps(),
        empirical_raw: EmpiricalRates {
            home_cover: market.home_cover_rate(&batch.margins()),
            over: market.over_rate(&batch.totals()),
        },
        empirical_centered: EmpiricalRates {
            home_cover: market.home_cover_rate(&margins_centered),
            over: market.over_rate(&totals_centered),
        },
        failed_trials: batch.failed_trials,
        skipped_trials: batch.skipped_trials,
        raw,
        centered,
        raw_scores: ScoreArrays {
            home: raw_home,
            away: raw_away,
        },
        centering: CenteringSummary {
            scale: centered_scores.scale,
            total_shift: centered_scores.total_shift,
            margin_shift: centered_scores.margin_shift,
        },
        centered_scores: ScoreArrays {
            home: centered_scores.home,
            away: centered_scores.away,
        },
        probabilities: CalibratedProbabilities {
            spread,
            total,
            spread_fallback: calibration.spread.fallback_reason.clone(),
            total_fallback: calibration.total.fallback_reason.clone(),
        },
        edges,
        best_edge: best,
        defaulted_inputs: defaulted,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::team::{CapabilityField, CapabilityResolver, InMemorySource, PartialCapability, TeamCapability};
    use crate::trace::{MemorySink, NullSink};
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;

    fn resolved(name: &str) -> ResolvedCapability {
        ResolvedCapability::observed(TeamCapability::league_average(name), "fixture")
    }

    #[test]
    fn test_report_is_centered_and_complementary() {
        let (home, away) = (resolved("HOME"), resolved("AWAY"));
        let config = SimConfig::default();
        let matchup = Matchup {
            home: &home,
            away: &away,
            market: MarketLine::new(-3.0, 45.0).unwrap(),
        };
        let sink = MemorySink::new();
        let report = run_matchup(
            &matchup,
            &config,
            &CalibrationSet::uncalibrated(&config.calibration),
            &BatchOptions::new(200, 12),
            &sink,
        )
        .unwrap();

        assert_eq!(report.completed, 200);
        assert!((report.centered.margin.mean - 3.0).abs() < 1e-6);
        assert!((report.centered.total.mean - 45.0).abs() < 1e-6);
        let p = &report.probabilities;
        assert_eq!(p.spread.side + p.spread.other, 1.0);
        assert_eq!(p.total.side + p.total.other, 1.0);
        assert!(p.spread_fallback.is_some());
        assert_eq!(report.edges.len(), 4);
        assert!(report.defaulted_inputs.is_empty());
        assert_eq!(report.config_fingerprint, config.fingerprint());
        assert_eq!(sink.count("inputs.audit"), 1);
        assert_eq!(sink.count("batch.summary"), 1);
        assert_eq!(report.raw_scores.home.len(), 200);
    }

    #[test]
    fn test_defaulted_fields_are_listed() {
        let source = InMemorySource::new("partial").with_entry(
            "KC",
            2024,
            3,
            PartialCapability::default().with(CapabilityField::OffEpaPerPlay, 0.1),
        );
        let resolver = CapabilityResolver::new().with_source(source);
        let home = resolver.resolve("KC", 2024, 3);
        let away = resolved("LV");
        let config = SimConfig::default();
        let matchup = Matchup {
            home: &home,
            away: &away,
            market: MarketLine::new(-7.0, 44.0).unwrap(),
        };
        let report = run_matchup(
            &matchup,
            &config,
            &CalibrationSet::uncalibrated(&config.calibration),
            &BatchOptions::new(20, 1),
            &NullSink,
        )
        .unwrap();
        assert!(report.defaulted_inputs.iter().all(|d| d.team == "KC"));
        assert!(report.defaulted_inputs.iter().any(|d| d.field == "pass_rates"));
        assert!(!report.defaulted_inputs.iter().any(|d| d.field == "off_epa_per_play"));
    }

    #[test]
    fn test_cancelled_batch_is_an_error() {
        let (home, away) = (resolved("HOME"), resolved("AWAY"));
        let config = SimConfig::default();
        let matchup = Matchup {
            home: &home,
            away: &away,
            market: MarketLine::new(1.0, 40.0).unwrap(),
        };
        let options = BatchOptions::new(5, 1).with_cancel(Arc::new(AtomicBool::new(true)));
        let err = run_matchup(
            &matchup,
            &config,
            &CalibrationSet::uncalibrated(&config.calibration),
            &options,
            &NullSink,
        )
        .unwrap_err();
        assert!(matches!(err, SimError::NoCompletedTrials { skipped: 5, .. }));
    }
}
