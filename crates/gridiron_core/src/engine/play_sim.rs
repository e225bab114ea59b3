//! # Play Simulator
//!
//! Samples one play given the two teams and the current situation. All
//! randomness comes from the trial RNG passed in; the simulator itself holds
//! only a reference to the play parameters.
//!
//! ## Pass play
//! 1. Pressure probability from the pass-rush vs. pass-block grade gap
//! 2. Under pressure: scramble, throwaway or sack by fixed shares; the
//!    residual mass throws under pressure
//! 3. Deep or short, then interception (resolved before completion)
//! 4. Completion from the QB split with matchup and weather adjustments
//! 5. Yardage from the explosive tail or the standard branch, then the
//!    red-zone conversion, fumble and out-of-bounds checks
//!
//! "Matchup edge over league" for paired stats (YPP, YPA, ANY/A) means the
//! offense's value over league average plus the defense-allowed value over
//! league average.

use rand::Rng;
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};

use super::game_state::GameState;
use crate::calibration::sigmoid;
use crate::config::{FourthDownParams, PlayModelParams};
use crate::team::{CapabilityField, TeamCapability};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayKind {
    Completion,
    Incomplete,
    Sack,
    Interception,
    Scramble,
    Run,
    FieldGoal,
    Punt,
}

impl PlayKind {
    pub fn is_dropback(self) -> bool {
        matches!(
            self,
            PlayKind::Completion
                | PlayKind::Incomplete
                | PlayKind::Sack
                | PlayKind::Interception
                | PlayKind::Scramble
        )
    }

    pub fn is_scrimmage(self) -> bool {
        !matches!(self, PlayKind::FieldGoal | PlayKind::Punt)
    }
}

/// One resolved play.
///
/// `yards` is the net gain from the line of scrimmage for scrimmage plays,
/// the air yards to the catch point for interceptions, the kick distance for
/// field goals and the net distance for punts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlayOutcome {
    pub kind: PlayKind,
    pub yards: i32,
    pub return_yards: i32,
    pub touchdown: bool,
    pub turnover: bool,
    pub fumble_lost: bool,
    pub out_of_bounds: bool,
    pub pressure: bool,
    pub deep: bool,
    pub field_goal_made: bool,
    pub touchback: bool,
}

impl PlayOutcome {
    fn new(kind: PlayKind, yards: i32) -> Self {
        Self {
            kind,
            yards,
            return_yards: 0,
            touchdown: false,
            turnover: false,
            fumble_lost: false,
            out_of_bounds: false,
            pressure: false,
            deep: false,
            field_goal_made: false,
            touchback: false,
        }
    }

    /// Whether the game clock stops after this play.
    pub fn stops_clock(&self) -> bool {
        self.touchdown
            || self.turnover
            || self.out_of_bounds
            || matches!(
                self.kind,
                PlayKind::Incomplete | PlayKind::Sack | PlayKind::FieldGoal | PlayKind::Punt
            )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KickoffResult {
    /// Receiving team's start, from its own goal line
    pub yardline: u8,
    pub touchback: bool,
}

pub struct PlaySimulator<'a> {
    params: &'a PlayModelParams,
    desperation_seconds: u32,
}

impl<'a> PlaySimulator<'a> {
    /// Uses the default desperation window; see [`Self::with_desperation_window`].
    pub fn new(params: &'a PlayModelParams) -> Self {
        Self {
            params,
            desperation_seconds: FourthDownParams::default().desperation_seconds,
        }
    }

    /// Final-seconds window in which a trailing offense throws deep more
    /// often under the desperation interception cap.
    pub fn with_desperation_window(mut self, seconds: u32) -> Self {
        self.desperation_seconds = seconds;
        self
    }

    /// Situational pass probability for the offense.
    pub fn pass_probability(&self, offense: &TeamCapability, state: &GameState) -> f64 {
        offense.pass_rate(
            state.down,
            state.distance_bucket(),
            state.score_bucket(),
            state.time_bucket(),
            &self.params.pass_rate_prior,
        )
    }

    /// Call and resolve a scrimmage play.
    pub fn simulate_scrimmage<R: Rng + ?Sized>(
        &self,
        offense: &TeamCapability,
        defense: &TeamCapability,
        state: &GameState,
        rng: &mut R,
    ) -> PlayOutcome {
        if rng.gen::<f64>() < self.pass_probability(offense, state) {
            self.simulate_pass(offense, defense, state, rng)
        } else {
            self.simulate_run(offense, defense, state, rng)
        }
    }

    pub fn simulate_pass<R: Rng + ?Sized>(
        &self,
        offense: &TeamCapability,
        defense: &TeamCapability,
        state: &GameState,
        rng: &mut R,
    ) -> PlayOutcome {
        let p = self.params;
        let tf = self.turnover_factor(offense);

        let pressure_p = (p.league_pressure_rate
            + (defense.pass_rush_grade - offense.pass_block_grade) * p.pressure_grade_coef)
            .clamp(p.pressure_min, p.pressure_max);
        let pressure = rng.gen::<f64>() < pressure_p;

        if pressure {
            let u: f64 = rng.gen();
            if u < p.scramble_share {
                return self.scramble(state, rng, tf);
            }
            if u < p.scramble_share + p.throwaway_share {
                let mut out = PlayOutcome::new(PlayKind::Incomplete, 0);
                out.pressure = true;
                return out;
            }
            if u < p.scramble_share + p.throwaway_share + p.sack_share {
                return self.sack(state, rng, tf);
            }
        }

        let desperate = is_desperate(state, self.desperation_seconds);
        let deep_rate = if desperate {
            p.deep_rate_desperation.max(offense.deep_pass_rate)
        } else {
            offense.deep_pass_rate
        };
        let deep = rng.gen::<f64>() < deep_rate;

        let mut int_p = p.int_base_rate * tf;
        if pressure {
            int_p *= p.int_pressure_mult;
        }
        if deep {
            int_p *= p.int_deep_mult;
        }
        let int_cap = if desperate {
            p.int_cap_desperation
        } else {
            p.int_cap
        };
        if rng.gen::<f64>() < int_p.min(int_cap) {
            let depth = normal(rng, p.int_depth_mean, p.int_depth_sd).max(0.0);
            let ret = normal(rng, p.int_return_mean, p.int_return_sd).max(0.0);
            let mut out = PlayOutcome::new(PlayKind::Interception, depth.round() as i32);
            out.return_yards = ret.round() as i32;
            out.turnover = true;
            out.pressure = pressure;
            out.deep = deep;
            return out;
        }

        let split = offense.qb_split(pressure);
        let anya_edge = league_edge(CapabilityField::Anya, offense.anya, defense.def_anya);
        let mut completion = split.completion_pct
            + p.anya_coef * anya_edge
            + p.grade_matchup_coef * (offense.passing_grade - defense.coverage_grade) / 100.0;
        if deep {
            completion *= p.deep_completion_mult;
        }
        completion *= offense.situational.passing_multiplier(p) * offense.situational.rest_multiplier(p);
        let completion = completion.clamp(p.completion_min, p.completion_max);

        if rng.gen::<f64>() >= completion {
            let mut out = PlayOutcome::new(PlayKind::Incomplete, 0);
            out.pressure = pressure;
            out.deep = deep;
            return out;
        }

        let explosive_rate = if deep {
            p.explosive_completion_rate_deep
        } else {
            p.explosive_completion_rate
        };
        let raw = if rng.gen::<f64>() < explosive_rate {
            p.explosive_min_yards + exponential(rng, p.explosive_tail_mean)
        } else {
            let ypa_edge = (split.yards_per_attempt - p.league_ypa)
                + league_edge(
                    CapabilityField::YardsPerAttempt,
                    offense.yards_per_attempt,
                    defense.def_yards_per_attempt,
                );
            normal(
                rng,
                p.completion_yards_mean + p.ypa_advantage_coef * ypa_edge,
                p.completion_yards_sd,
            )
            .max(p.max_completion_loss)
        };

        let mut out = PlayOutcome::new(PlayKind::Completion, clamp_gain(state, raw.round() as i32));
        out.pressure = pressure;
        out.deep = deep;
        out.touchdown = reaches_goal(state, out.yards);

        if !out.touchdown
            && state.yardline >= p.red_zone_check_yardline
            && rng.gen::<f64>() < offense.red_zone_td_pct * p.red_zone_conversion_scale
        {
            out.yards = state.yards_to_goal() as i32;
            out.touchdown = true;
        }
        if !out.touchdown {
            if rng.gen::<f64>() < p.completion_fumble_rate * tf {
                out.fumble_lost = true;
                out.turnover = true;
            } else {
                out.out_of_bounds = rng.gen::<f64>() < p.completion_out_of_bounds_rate;
            }
        }
        out
    }

    pub fn simulate_run<R: Rng + ?Sized>(
        &self,
        offense: &TeamCapability,
        defense: &TeamCapability,
        state: &GameState,
        rng: &mut R,
    ) -> PlayOutcome {
        let p = self.params;
        let tf = self.turnover_factor(offense);

        let mean = (p.run_yards_base
            + p.run_epa_coef * (offense.off_epa_per_play + defense.def_epa_per_play)
            + p.run_grade_coef * (offense.run_block_grade - defense.run_defense_grade)
            + p.run_ypp_coef
                * league_edge(
                    CapabilityField::YardsPerPlay,
                    offense.yards_per_play,
                    defense.def_yards_per_play,
                ))
            * offense.situational.rest_multiplier(p);

        let raw = if rng.gen::<f64>() < p.explosive_run_rate {
            p.explosive_run_min_yards + exponential(rng, p.explosive_run_tail_mean)
        } else {
            normal(rng, mean, p.run_yards_sd)
        };

        let mut out = PlayOutcome::new(PlayKind::Run, clamp_gain(state, raw.round() as i32));
        out.touchdown = reaches_goal(state, out.yards);
        if !out.touchdown {
            if rng.gen::<f64>() < p.run_fumble_rate * tf {
                out.fumble_lost = true;
                out.turnover = true;
            } else {
                out.out_of_bounds = rng.gen::<f64>() < p.run_out_of_bounds_rate;
            }
        }
        out
    }

    fn scramble<R: Rng + ?Sized>(&self, state: &GameState, rng: &mut R, tf: f64) -> PlayOutcome {
        let p = self.params;
        let raw = normal(rng, p.scramble_yards_mean, p.scramble_yards_sd);
        let mut out = PlayOutcome::new(PlayKind::Scramble, clamp_gain(state, raw.round() as i32));
        out.pressure = true;
        out.touchdown = reaches_goal(state, out.yards);
        if !out.touchdown {
            if rng.gen::<f64>() < p.run_fumble_rate * tf {
                out.fumble_lost = true;
                out.turnover = true;
            } else {
                out.out_of_bounds = rng.gen::<f64>() < p.run_out_of_bounds_rate;
            }
        }
        out
    }

    fn sack<R: Rng + ?Sized>(&self, state: &GameState, rng: &mut R, tf: f64) -> PlayOutcome {
        let p = self.params;
        let loss = normal(rng, p.sack_yards_mean, p.sack_yards_sd).max(1.0).round() as i32;
        let mut out = PlayOutcome::new(PlayKind::Sack, clamp_gain(state, -loss));
        out.pressure = true;
        if rng.gen::<f64>() < p.sack_fumble_rate * tf {
            out.fumble_lost = true;
            out.turnover = true;
        }
        out
    }

    /// Field goal attempt from the current spot.
    pub fn field_goal<R: Rng + ?Sized>(
        &self,
        offense: &TeamCapability,
        state: &GameState,
        rng: &mut R,
    ) -> PlayOutcome {
        let distance = self.kick_distance(state);
        let made = rng.gen::<f64>() < self.field_goal_probability(offense, distance);
        let mut out = PlayOutcome::new(PlayKind::FieldGoal, distance as i32);
        out.field_goal_made = made;
        out
    }

    pub fn kick_distance(&self, state: &GameState) -> u8 {
        state.yards_to_goal().saturating_add(self.params.fg_snap_yards)
    }

    pub fn field_goal_probability(&self, offense: &TeamCapability, distance: u8) -> f64 {
        let p = self.params;
        let curve = sigmoid(p.fg_logit_intercept + p.fg_logit_slope * distance as f64);
        let kicker = if p.league_fg_make_pct > 0.0 {
            offense.fg_make_pct / p.league_fg_make_pct
        } else {
            1.0
        };
        (curve * kicker * offense.situational.kicking_multiplier(p)).clamp(p.fg_make_min, p.fg_make_max)
    }

    pub fn punt<R: Rng + ?Sized>(
        &self,
        offense: &TeamCapability,
        state: &GameState,
        rng: &mut R,
    ) -> PlayOutcome {
        let net = normal(rng, offense.punt_net_yards, self.params.punt_net_sd)
            .max(self.params.min_punt_net)
            .round() as i32;
        let mut out = PlayOutcome::new(PlayKind::Punt, net);
        out.touchback = state.yardline as i32 + net >= 100;
        out
    }

    pub fn kickoff<R: Rng + ?Sized>(&self, rng: &mut R) -> KickoffResult {
        let p = self.params;
        if rng.gen::<f64>() < p.kickoff_touchback_rate {
            return KickoffResult {
                yardline: p.kickoff_touchback_yardline,
                touchback: true,
            };
        }
        let spot = normal(rng, p.kickoff_return_mean, p.kickoff_return_sd)
            .round()
            .clamp(1.0, 99.0);
        KickoffResult {
            yardline: spot as u8,
            touchback: false,
        }
    }

    pub fn extra_point<R: Rng + ?Sized>(&self, rng: &mut R) -> bool {
        rng.gen::<f64>() < self.params.pat_make_rate
    }

    fn turnover_factor(&self, offense: &TeamCapability) -> f64 {
        offense
            .turnover_regression
            .clamp(self.params.turnover_regression_min, self.params.turnover_regression_max)
    }
}

/// Trailing in the 4th with less than `window_seconds` left. The window
/// boundary matches the fourth-down desperation rule.
pub fn is_desperate(state: &GameState, window_seconds: u32) -> bool {
    state.quarter >= 4 && state.time_remaining < window_seconds && state.score_differential() < 0
}

/// Offense value plus defense-allowed value, each relative to league average.
fn league_edge(field: CapabilityField, offense: f64, defense_allowed: f64) -> f64 {
    let league = field.league_default();
    (offense - league) + (defense_allowed - league)
}

/// Keep the ball on the field: no further back than the offense's goal line,
/// no further forward than the opponent's.
fn clamp_gain(state: &GameState, yards: i32) -> i32 {
    yards.clamp(-(state.yardline as i32), state.yards_to_goal() as i32)
}

fn reaches_goal(state: &GameState, yards: i32) -> bool {
    state.yardline as i32 + yards >= 100
}

fn normal<R: Rng + ?Sized>(rng: &mut R, mean: f64, sd: f64) -> f64 {
    let z: f64 = rng.sample(StandardNormal);
    mean + sd * z
}

/// Inverse-transform exponential draw with the given mean.
fn exponential<R: Rng + ?Sized>(rng: &mut R, mean: f64) -> f64 {
    let u: f64 = rng.gen();
    -mean * (1.0 - u).ln()
}
