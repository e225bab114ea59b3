//! Play model parameters
//!
//! Every probability and yardage constant the play simulator uses. Changing a
//! number here never requires touching the play resolution code.

use serde::{Deserialize, Serialize};

/// League prior for the pass/run call, used when a team has no situational entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PassRatePrior {
    /// 1st down pass rate (default: 0.50)
    pub first_down: f64,
    /// 2nd down with 1-6 to go (default: 0.46)
    pub second_short: f64,
    /// 2nd down with 7+ to go (default: 0.62)
    pub second_long: f64,
    /// 3rd/4th down with 1-3 to go (default: 0.48)
    pub third_short: f64,
    /// 3rd/4th down with 4-6 to go (default: 0.78)
    pub third_medium: f64,
    /// 3rd/4th down with 7+ to go (default: 0.88)
    pub third_long: f64,
    /// Added when trailing late or in the two-minute drill (default: 0.20)
    pub trailing_late_boost: f64,
    /// Subtracted when leading late (default: 0.22)
    pub leading_late_cut: f64,
    /// Lower clamp (default: 0.05)
    pub min_rate: f64,
    /// Upper clamp (default: 0.95)
    pub max_rate: f64,
}

impl Default for PassRatePrior {
    fn default() -> Self {
        Self {
            first_down: 0.50,
            second_short: 0.46,
            second_long: 0.62,
            third_short: 0.48,
            third_medium: 0.78,
            third_long: 0.88,
            trailing_late_boost: 0.20,
            leading_late_cut: 0.22,
            min_rate: 0.05,
            max_rate: 0.95,
        }
    }
}

/// Play resolution parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayModelParams {
    pub pass_rate_prior: PassRatePrior,

    // === Pressure ===
    /// League pressure rate per dropback (default: 0.30)
    pub league_pressure_rate: f64,
    /// Pressure change per grade point of pass-rush minus pass-block (default: 0.005)
    pub pressure_grade_coef: f64,
    /// Pressure probability clamp (default: 0.12..=0.50)
    pub pressure_min: f64,
    pub pressure_max: f64,

    // === Pressure outlets (shares of pressured dropbacks) ===
    /// QB scrambles (default: 0.10)
    pub scramble_share: f64,
    /// QB throws it away (default: 0.12)
    pub throwaway_share: f64,
    /// QB is sacked (default: 0.22)
    pub sack_share: f64,

    // === Deep passing ===
    /// Deep attempt share when the offense is desperate (default: 0.45)
    pub deep_rate_desperation: f64,

    // === Interceptions ===
    /// Base interception rate per attempt (default: 0.022)
    pub int_base_rate: f64,
    /// Multiplier when the throw is made under pressure (default: 1.6)
    pub int_pressure_mult: f64,
    /// Multiplier for deep throws (default: 1.8)
    pub int_deep_mult: f64,
    /// Hard cap (default: 0.10)
    pub int_cap: f64,
    /// Cap in desperation, where throws are forced but defenses play deep (default: 0.07)
    pub int_cap_desperation: f64,
    /// Interception spot beyond the line of scrimmage (default: 12 +- 6)
    pub int_depth_mean: f64,
    pub int_depth_sd: f64,
    /// Interception return yards (default: 8 +- 8)
    pub int_return_mean: f64,
    pub int_return_sd: f64,

    // === Completion ===
    /// Completion change per ANY/A point of matchup edge over league (default: 0.012)
    pub anya_coef: f64,
    /// Completion change per 100 grade points of passing minus coverage (default: 0.10)
    pub grade_matchup_coef: f64,
    /// Completion multiplier on deep attempts (default: 0.62)
    pub deep_completion_mult: f64,
    /// Completion clamp (default: 0.25..=0.85)
    pub completion_min: f64,
    pub completion_max: f64,

    // === Completion yardage ===
    /// Explosive share of short completions (default: 0.07)
    pub explosive_completion_rate: f64,
    /// Explosive share of deep completions (default: 0.45)
    pub explosive_completion_rate_deep: f64,
    /// An explosive play gains at least this much (default: 20)
    pub explosive_min_yards: f64,
    /// Mean of the exponential tail beyond the explosive floor (default: 11)
    pub explosive_tail_mean: f64,
    /// Standard completion yardage (default: 8.0 +- 4.5)
    pub completion_yards_mean: f64,
    pub completion_yards_sd: f64,
    /// Yards per YPA point of QB and matchup edge over league (default: 0.6)
    pub ypa_advantage_coef: f64,
    /// League yards per attempt (default: 7.0)
    pub league_ypa: f64,
    /// Worst yardage a completion can lose (default: -2)
    pub max_completion_loss: f64,
    /// Share of completions that end out of bounds (default: 0.18)
    pub completion_out_of_bounds_rate: f64,
    /// Fumble lost after a completion (default: 0.006)
    pub completion_fumble_rate: f64,
    /// Yardline at which the red-zone conversion check applies (default: 90)
    pub red_zone_check_yardline: u8,
    /// Fraction of the offense's red-zone TD% applied as the extra conversion (default: 0.15)
    pub red_zone_conversion_scale: f64,

    // === Scramble and sack ===
    pub scramble_yards_mean: f64,
    pub scramble_yards_sd: f64,
    pub sack_yards_mean: f64,
    pub sack_yards_sd: f64,
    /// Fumble lost on a sack (default: 0.05)
    pub sack_fumble_rate: f64,

    // === Run ===
    /// League base run yardage (default: 3.8 +- 3.8)
    pub run_yards_base: f64,
    pub run_yards_sd: f64,
    /// Yards per EPA/play of offense plus defense-allowed (default: 6.0)
    pub run_epa_coef: f64,
    /// Yards per grade point of run-block over run-defense (default: 0.03)
    pub run_grade_coef: f64,
    /// Yards per YPP point of matchup edge over league (default: 0.3)
    pub run_ypp_coef: f64,
    /// Explosive run branch (default: 0.025, 15 + Exp(10))
    pub explosive_run_rate: f64,
    pub explosive_run_min_yards: f64,
    pub explosive_run_tail_mean: f64,
    /// Fumble lost on a run (default: 0.006)
    pub run_fumble_rate: f64,
    /// Share of runs that end out of bounds (default: 0.05)
    pub run_out_of_bounds_rate: f64,

    // === Turnover regression ===
    /// Clamp applied to the offense's turnover regression factor (default: 0.5..=1.5)
    pub turnover_regression_min: f64,
    pub turnover_regression_max: f64,

    // === Special teams ===
    /// League field goal make rate, the reference for team FG% (default: 0.85)
    pub league_fg_make_pct: f64,
    /// Kick distance = yards to goal + this (default: 17)
    pub fg_snap_yards: u8,
    /// Logistic make curve by kick distance (default: 6.09 - 0.105 * distance)
    pub fg_logit_intercept: f64,
    pub fg_logit_slope: f64,
    pub fg_make_min: f64,
    pub fg_make_max: f64,
    /// Punt net yardage spread (default: 7.0)
    pub punt_net_sd: f64,
    /// Shortest net punt (default: 5)
    pub min_punt_net: f64,
    /// Touchback spot after punts and end-zone interceptions (default: 20)
    pub touchback_yardline: u8,
    /// Kickoff touchback share and spot (default: 0.60, 25)
    pub kickoff_touchback_rate: f64,
    pub kickoff_touchback_yardline: u8,
    /// Returned kickoff start spot (default: 24 +- 6)
    pub kickoff_return_mean: f64,
    pub kickoff_return_sd: f64,
    /// Extra point make rate (default: 0.94)
    pub pat_make_rate: f64,
    /// Start spot for the team receiving a safety free kick (default: 35)
    pub safety_free_kick_yardline: u8,

    // === Situational multipliers ===
    pub short_rest_days: f64,
    pub short_rest_mult: f64,
    pub long_rest_days: f64,
    pub long_rest_mult: f64,
    /// Wind above this speed (mph) hurts passing and kicking (default: 15)
    pub wind_threshold_mph: f64,
    pub wind_pass_penalty_per_mph: f64,
    pub wind_kick_penalty_per_mph: f64,
    /// Temperature below this (F) hurts passing and kicking (default: 32)
    pub cold_threshold_f: f64,
    pub cold_penalty: f64,
    /// Lowest combined weather multiplier for passing and kicking (default: 0.5)
    pub weather_multiplier_floor: f64,
}

impl Default for PlayModelParams {
    fn default() -> Self {
        Self {
            pass_rate_prior: PassRatePrior::default(),

            league_pressure_rate: 0.30,
            pressure_grade_coef: 0.005,
            pressure_min: 0.12,
            pressure_max: 0.50,

            scramble_share: 0.10,
            throwaway_share: 0.12,
            sack_share: 0.22,

            deep_rate_desperation: 0.45,

            int_base_rate: 0.022,
            int_pressure_mult: 1.6,
            int_deep_mult: 1.8,
            int_cap: 0.10,
            int_cap_desperation: 0.07,
            int_depth_mean: 12.0,
            int_depth_sd: 6.0,
            int_return_mean: 8.0,
            int_return_sd: 8.0,

            anya_coef: 0.012,
            grade_matchup_coef: 0.10,
            deep_completion_mult: 0.62,
            completion_min: 0.25,
            completion_max: 0.85,

            explosive_completion_rate: 0.07,
            explosive_completion_rate_deep: 0.45,
            explosive_min_yards: 20.0,
            explosive_tail_mean: 11.0,
            completion_yards_mean: 8.0,
            completion_yards_sd: 4.5,
            ypa_advantage_coef: 0.6,
            league_ypa: 7.0,
            max_completion_loss: -2.0,
            completion_out_of_bounds_rate: 0.18,
            completion_fumble_rate: 0.006,
            red_zone_check_yardline: 90,
            red_zone_conversion_scale: 0.15,

            scramble_yards_mean: 6.0,
            scramble_yards_sd: 4.0,
            sack_yards_mean: 7.0,
            sack_yards_sd: 2.5,
            sack_fumble_rate: 0.05,

            run_yards_base: 3.8,
            run_yards_sd: 3.8,
            run_epa_coef: 6.0,
            run_grade_coef: 0.03,
            run_ypp_coef: 0.3,
            explosive_run_rate: 0.025,
            explosive_run_min_yards: 15.0,
            explosive_run_tail_mean: 10.0,
            run_fumble_rate: 0.006,
            run_out_of_bounds_rate: 0.05,

            turnover_regression_min: 0.5,
            turnover_regression_max: 1.5,

            league_fg_make_pct: 0.85,
            fg_snap_yards: 17,
            fg_logit_intercept: 6.09,
            fg_logit_slope: -0.105,
            fg_make_min: 0.05,
            fg_make_max: 0.99,
            punt_net_sd: 7.0,
            min_punt_net: 5.0,
            touchback_yardline: 20,
            kickoff_touchback_rate: 0.60,
            kickoff_touchback_yardline: 25,
            kickoff_return_mean: 24.0,
            kickoff_return_sd: 6.0,
            pat_make_rate: 0.94,
            safety_free_kick_yardline: 35,

            short_rest_days: 5.0,
            short_rest_mult: 0.97,
            long_rest_days: 10.0,
            long_rest_mult: 1.02,
            wind_threshold_mph: 15.0,
            wind_pass_penalty_per_mph: 0.003,
            wind_kick_penalty_per_mph: 0.006,
            cold_threshold_f: 32.0,
            cold_penalty: 0.02,
            weather_multiplier_floor: 0.5,
        }
    }
}

impl PlayModelParams {
    /// Named probabilities, for range validation.
    pub(crate) fn probabilities(&self) -> Vec<(&'static str, f64)> {
        vec![
            ("league_pressure_rate", self.league_pressure_rate),
            ("pressure_min", self.pressure_min),
            ("pressure_max", self.pressure_max),
            ("scramble_share", self.scramble_share),
            ("throwaway_share", self.throwaway_share),
            ("sack_share", self.sack_share),
            ("deep_rate_desperation", self.deep_rate_desperation),
            ("int_base_rate", self.int_base_rate),
            ("int_cap", self.int_cap),
            ("int_cap_desperation", self.int_cap_desperation),
            ("completion_min", self.completion_min),
            ("completion_max", self.completion_max),
            ("explosive_completion_rate", self.explosive_completion_rate),
            ("explosive_completion_rate_deep", self.explosive_completion_rate_deep),
            ("completion_out_of_bounds_rate", self.completion_out_of_bounds_rate),
            ("completion_fumble_rate", self.completion_fumble_rate),
            ("red_zone_conversion_scale", self.red_zone_conversion_scale),
            ("sack_fumble_rate", self.sack_fumble_rate),
            ("explosive_run_rate", self.explosive_run_rate),
            ("run_fumble_rate", self.run_fumble_rate),
            ("run_out_of_bounds_rate", self.run_out_of_bounds_rate),
            ("league_fg_make_pct", self.league_fg_make_pct),
            ("fg_make_min", self.fg_make_min),
            ("fg_make_max", self.fg_make_max),
            ("kickoff_touchback_rate", self.kickoff_touchback_rate),
            ("pat_make_rate", self.pat_make_rate),
            ("pass_rate_prior.min_rate", self.pass_rate_prior.min_rate),
            ("pass_rate_prior.max_rate", self.pass_rate_prior.max_rate),
            ("weather_multiplier_floor", self.weather_multiplier_floor),
        ]
    }

    /// Named standard deviations, which must be non-negative.
    pub(crate) fn spreads(&self) -> Vec<(&'static str, f64)> {
        vec![
            ("int_depth_sd", self.int_depth_sd),
            ("int_return_sd", self.int_return_sd),
            ("completion_yards_sd", self.completion_yards_sd),
            ("scramble_yards_sd", self.scramble_yards_sd),
            ("sack_yards_sd", self.sack_yards_sd),
            ("run_yards_sd", self.run_yards_sd),
            ("punt_net_sd", self.punt_net_sd),
            ("kickoff_return_sd", self.kickoff_return_sd),
            ("explosive_tail_mean", self.explosive_tail_mean),
            ("explosive_run_tail_mean", self.explosive_run_tail_mean),
        ]
    }
}
