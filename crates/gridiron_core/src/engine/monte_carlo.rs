//! # Monte Carlo batch driver
//!
//! Runs independent trials on the rayon pool. Trial `i` draws from
//! `trial_rng(base_seed, i)` and results are collected in trial order, so a
//! batch is identical whatever the thread count.
//!
//! A panicking trial is caught and recorded in
//! [`SimulationBatch::failed_trials`]; the rest of the batch is kept. Setting
//! the optional cancel flag stops new trials from starting; those are listed
//! in [`SimulationBatch::skipped_trials`].

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

use super::game_sim::{GameResult, GameSimulator, TrialResult};
use super::realism::RealismReport;
use super::seeding::trial_rng;
use crate::config::MarketParams;
use crate::trace::TraceEvent;

/// Realism pass rate below which a batch is logged as a warning.
const REALISM_WARN_PASS_RATE: f64 = 0.90;

#[derive(Debug, Clone, Default)]
pub struct BatchOptions {
    pub trials: usize,
    pub base_seed: u64,
    pub cancel: Option<Arc<AtomicBool>>,
}

impl BatchOptions {
    pub fn new(trials: usize, base_seed: u64) -> Self {
        Self {
            trials,
            base_seed,
            cancel: None,
        }
    }

    pub fn with_cancel(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .map_or(false, |flag| flag.load(Ordering::Relaxed))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedTrial {
    pub trial: u64,
    pub message: String,
}

/// Raw results of one matchup, ordered by trial index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationBatch {
    pub base_seed: u64,
    pub requested: usize,
    pub results: Vec<GameResult>,
    /// Trial index of each entry in `results`
    pub trial_indices: Vec<u64>,
    pub realism: Vec<RealismReport>,
    pub failed_trials: Vec<FailedTrial>,
    pub skipped_trials: Vec<u64>,
}

impl SimulationBatch {
    pub fn completed(&self) -> usize {
        self.results.len()
    }

    pub fn home_scores(&self) -> Vec<f64> {
        self.results.iter().map(|r| r.home_score as f64).collect()
    }

    pub fn away_scores(&self) -> Vec<f64> {
        self.results.iter().map(|r| r.away_score as f64).collect()
    }

    pub fn margins(&self) -> Vec<f64> {
        self.results.iter().map(|r| r.margin() as f64).collect()
    }

    pub fn totals(&self) -> Vec<f64> {
        self.results.iter().map(|r| r.total() as f64).collect()
    }

    /// Share of completed trials that passed the realism guard.
    pub fn realism_pass_rate(&self) -> f64 {
        if self.realism.is_empty() {
            return 0.0;
        }
        self.realism.iter().filter(|r| r.passes()).count() as f64 / self.realism.len() as f64
    }

    pub fn drive_caps(&self) -> u32 {
        self.realism.iter().map(|r| r.drive_caps).sum()
    }

    pub fn summary(&self, params: &MarketParams) -> ScoreSummary {
        ScoreSummary::from_scores(&self.home_scores(), &self.away_scores(), params)
    }
}

/// Location and spread of one sample.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DistributionSummary {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    /// Sample standard deviation (n - 1)
    pub sd: f64,
    pub min: f64,
    pub max: f64,
}

impl DistributionSummary {
    pub fn from_values(values: &[f64]) -> Self {
        let count = values.len();
        if count == 0 {
            return Self::default();
        }
        let mean = values.iter().sum::<f64>() / count as f64;
        let sd = if count > 1 {
            let ss: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
            (ss / (count - 1) as f64).sqrt()
        } else {
            0.0
        };
        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);
        let mid = count / 2;
        let median = if count % 2 == 0 {
            (sorted[mid - 1] + sorted[mid]) / 2.0
        } else {
            sorted[mid]
        };
        Self {
            count,
            mean,
            median,
            sd,
            min: sorted[0],
            max: sorted[count - 1],
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TailProbabilities {
    /// |margin| above the blowout threshold
    pub blowout: f64,
    /// |margin| at or under the close-game threshold
    pub close_game: f64,
    pub low_scoring: f64,
    pub high_scoring: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreSummary {
    pub home: DistributionSummary,
    pub away: DistributionSummary,
    /// Home minus away
    pub margin: DistributionSummary,
    pub total: DistributionSummary,
    pub tails: TailProbabilities,
}

impl ScoreSummary {
    /// Summary of paired score arrays. Callers pass equal-length arrays.
    pub fn from_scores(home: &[f64], away: &[f64], params: &MarketParams) -> Self {
        let margins: Vec<f64> = home.iter().zip(away).map(|(h, a)| h - a).collect();
        let totals: Vec<f64> = home.iter().zip(away).map(|(h, a)| h + a).collect();
        let share = |hits: usize| {
            if margins.is_empty() {
                0.0
            } else {
                hits as f64 / margins.len() as f64
            }
        };
        let tails = TailProbabilities {
            blowout: share(margins.iter().filter(|m| m.abs() > params.blowout_margin).count()),
            close_game: share(margins.iter().filter(|m| m.abs() <= params.close_margin).count()),
            low_scoring: share(totals.iter().filter(|&&t| t < params.low_scoring_total).count()),
            high_scoring: share(totals.iter().filter(|&&t| t > params.high_scoring_total).count()),
        };
        Self {
            home: DistributionSummary::from_values(home),
            away: DistributionSummary::from_values(away),
            margin: DistributionSummary::from_values(&margins),
            total: DistributionSummary::from_values(&totals),
            tails,
        }
    }
}

enum TrialOutcome {
    Completed(TrialResult),
    Failed(FailedTrial),
    Skipped(u64),
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "trial panicked".to_string()
    }
}

impl GameSimulator<'_> {
    /// Run `trials` independent games seeded from `base_seed`.
    pub fn simulate_monte_carlo(&self, trials: usize, base_seed: u64) -> SimulationBatch {
        self.simulate_batch(&BatchOptions::new(trials, base_seed))
    }

    pub fn simulate_batch(&self, options: &BatchOptions) -> SimulationBatch {
        let outcomes: Vec<TrialOutcome> = (0..options.trials as u64)
            .into_par_iter()
            .map(|trial| {
                if options.is_cancelled() {
                    return TrialOutcome::Skipped(trial);
                }
                let mut rng = trial_rng(options.base_seed, trial);
                match catch_unwind(AssertUnwindSafe(|| self.simulate(trial, &mut rng))) {
                    Ok(result) => TrialOutcome::Completed(result),
                    Err(payload) => TrialOutcome::Failed(FailedTrial {
                        trial,
                        message: panic_message(payload),
                    }),
                }
            })
            .collect();

        let mut batch = SimulationBatch {
            base_seed: options.base_seed,
            requested: options.trials,
            results: Vec::with_capacity(outcomes.len()),
            trial_indices: Vec::with_capacity(outcomes.len()),
            realism: Vec::with_capacity(outcomes.len()),
            failed_trials: Vec::new(),
            skipped_trials: Vec::new(),
        };
        for outcome in outcomes {
            match outcome {
                TrialOutcome::Completed(trial) => {
                    batch.results.push(trial.result);
                    batch.trial_indices.push(trial.trial);
                    batch.realism.push(trial.realism);
                }
                TrialOutcome::Failed(failed) => {
                    warn!(trial = failed.trial, message = %failed.message, "trial failed; excluded from batch");
                    if self.sink().enabled() {
                        self.sink().emit(TraceEvent::for_trial(
                            "trial.failed",
                            failed.trial,
                            serde_json::json!({ "message": failed.message }),
                        ));
                    }
                    batch.failed_trials.push(failed);
                }
                TrialOutcome::Skipped(trial) => batch.skipped_trials.push(trial),
            }
        }

        self.log_batch(&batch);
        batch
    }

    fn log_batch(&self, batch: &SimulationBatch) {
        let pass_rate = batch.realism_pass_rate();
        let summary = batch.summary(&self.config().market);
        info!(
            home = %self.home().name,
            away = %self.away().name,
            requested = batch.requested,
            completed = batch.completed(),
            failed = batch.failed_trials.len(),
            skipped = batch.skipped_trials.len(),
            mean_margin = summary.margin.mean,
            mean_total = summary.total.mean,
            "batch complete"
        );
        if batch.completed() > 0 && pass_rate < REALISM_WARN_PASS_RATE {
            warn!(pass_rate, drive_caps = batch.drive_caps(), "realism guard violations above tolerance");
        }
        if batch.drive_caps() > 0 {
            warn!(drive_caps = batch.drive_caps(), "drives hit the snap cap");
        }
        if self.sink().enabled() {
            self.sink().emit(TraceEvent::new(
                "batch.summary",
                serde_json::json!({
                    "base_seed": batch.base_seed,
                    "requested": batch.requested,
                    "completed": batch.completed(),
                    "failed": batch.failed_trials,
                    "skipped": batch.skipped_trials.len(),
                    "realism_pass_rate": pass_rate,
                    "summary": summary,
                }),
            ));
        }
    }
}
