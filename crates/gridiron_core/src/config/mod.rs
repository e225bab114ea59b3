//! # Simulation Configuration
//!
//! Every tunable constant of the engine lives in one versioned, immutable
//! [`SimConfig`] that is passed by reference into the simulators. Recalibrating
//! the model means editing (or loading) a config, never touching control flow.
//!
//! ## Usage
//! ```rust
//! use gridiron_core::config::SimConfig;
//!
//! let config = SimConfig::default();
//! assert!(config.validate().is_ok());
//! ```
//!
//! Configs load from JSON or YAML (`SimConfig::load`) or from the file named by
//! the `GRIDIRON_CONFIG_PATH` environment variable (`SimConfig::from_env_or_default`).

mod game_params;
mod market_config;
mod play_params;
mod realism_config;

pub use game_params::{FourthDownParams, GameParams};
pub use market_config::{CalibrationParams, EdgeParams, MarketParams};
pub use play_params::{PassRatePrior, PlayModelParams};
pub use realism_config::{MetricRange, RealismTargets};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;
use std::{env, fs};

use crate::error::{Result, SimError};

pub const CONFIG_PATH_ENV: &str = "GRIDIRON_CONFIG_PATH";
pub const CONFIG_VERSION: &str = "2024.1";

/// Complete engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Parameter set version, reported with every batch
    pub version: String,
    pub play: PlayModelParams,
    pub game: GameParams,
    pub fourth_down: FourthDownParams,
    pub realism: RealismTargets,
    pub market: MarketParams,
    pub calibration: CalibrationParams,
    pub edge: EdgeParams,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION.to_string(),
            play: PlayModelParams::default(),
            game: GameParams::default(),
            fourth_down: FourthDownParams::default(),
            realism: RealismTargets::default(),
            market: MarketParams::default(),
            calibration: CalibrationParams::default(),
            edge: EdgeParams::default(),
        }
    }
}

impl SimConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: SimConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: SimConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a `.yaml`/`.yml` or JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml(&content),
            _ => Self::from_json(&content),
        }
    }

    /// Load from `GRIDIRON_CONFIG_PATH` when set, defaults otherwise.
    pub fn from_env_or_default() -> Result<Self> {
        Self::from_env_var(CONFIG_PATH_ENV)
    }

    pub(crate) fn from_env_var(var: &str) -> Result<Self> {
        let Ok(path) = env::var(var) else {
            return Ok(Self::default());
        };
        let path = path.trim();
        if path.is_empty() {
            return Ok(Self::default());
        }
        tracing::debug!(path, "loading simulation config");
        Self::load(path)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// SHA-256 of the canonical JSON encoding, hex encoded.
    pub fn fingerprint(&self) -> String {
        // Struct field order is fixed, so the compact encoding is canonical.
        let json = serde_json::to_vec(self).unwrap_or_default();
        let digest = Sha256::digest(&json);
        let mut out = String::with_capacity(digest.len() * 2);
        for b in digest {
            out.push_str(&format!("{:02x}", b));
        }
        out
    }

    /// Reject out-of-range probabilities, inverted ranges and degenerate limits.
    pub fn validate(&self) -> Result<()> {
        if self.version.trim().is_empty() {
            return Err(SimError::config("version must not be empty"));
        }

        for (name, p) in self.play.probabilities() {
            check_probability(&format!("play.{name}"), p)?;
        }
        for (name, sd) in self.play.spreads() {
            if !sd.is_finite() || sd < 0.0 {
                return Err(SimError::config(format!(
                    "play.{name} must be finite and >= 0, got {sd}"
                )));
            }
        }
        let play = &self.play;
        let outlets = play.scramble_share + play.throwaway_share + play.sack_share;
        if outlets > 1.0 {
            return Err(SimError::config(format!(
                "pressure outlet shares sum to {outlets:.3}, must be <= 1.0"
            )));
        }
        check_ordered("play.pressure", play.pressure_min, play.pressure_max)?;
        check_ordered("play.completion", play.completion_min, play.completion_max)?;
        check_ordered("play.fg_make", play.fg_make_min, play.fg_make_max)?;
        check_ordered(
            "play.turnover_regression",
            play.turnover_regression_min,
            play.turnover_regression_max,
        )?;
        check_ordered(
            "play.pass_rate_prior",
            play.pass_rate_prior.min_rate,
            play.pass_rate_prior.max_rate,
        )?;
        if play.turnover_regression_min < 0.0 {
            return Err(SimError::config("play.turnover_regression_min must be >= 0"));
        }
        if play.touchback_yardline == 0 || play.touchback_yardline >= 100 {
            return Err(SimError::config("play.touchback_yardline must be in 1..=99"));
        }
        if !(play.max_completion_loss.is_finite() && play.max_completion_loss <= 0.0) {
            return Err(SimError::config(format!(
                "play.max_completion_loss must be finite and <= 0, got {}",
                play.max_completion_loss
            )));
        }
        if !(play.min_punt_net.is_finite() && play.min_punt_net >= 0.0) {
            return Err(SimError::config(format!(
                "play.min_punt_net must be finite and >= 0, got {}",
                play.min_punt_net
            )));
        }

        let game = &self.game;
        if game.max_plays_per_drive < 4 {
            return Err(SimError::config(format!(
                "game.max_plays_per_drive must be >= 4, got {}",
                game.max_plays_per_drive
            )));
        }
        if game.pace_min_seconds <= 0.0 {
            return Err(SimError::config("game.pace_min_seconds must be > 0"));
        }
        check_ordered("game.pace", game.pace_min_seconds, game.pace_max_seconds)?;
        if game.stopped_clock_play_seconds == 0 || game.hurry_up_seconds == 0 {
            return Err(SimError::config(
                "game clock per snap must be > 0 seconds so the game terminates",
            ));
        }
        if game.field_goal_hold_yards >= 100 {
            return Err(SimError::config("game.field_goal_hold_yards must be < 100"));
        }
        if game.explosive_yards <= 0 {
            return Err(SimError::config("game.explosive_yards must be > 0"));
        }

        for (name, range) in self.realism.ranges() {
            check_ordered(&format!("realism.{name}"), range.min, range.max)?;
        }

        let market = &self.market;
        if market.scale_min <= 0.0 {
            return Err(SimError::config("market.scale_min must be > 0"));
        }
        check_ordered("market.scale", market.scale_min, market.scale_max)?;

        let cal = &self.calibration;
        if !(cal.z_cap.is_finite() && cal.z_cap > 0.0) {
            return Err(SimError::config(format!(
                "calibration.z_cap must be > 0, got {}",
                cal.z_cap
            )));
        }
        if !(cal.probability_floor > 0.0 && cal.probability_floor < 0.5) {
            return Err(SimError::config("calibration.probability_floor must be in (0, 0.5)"));
        }
        if cal.fallback_slope <= 0.0 {
            return Err(SimError::config("calibration.fallback_slope must be > 0"));
        }
        check_probability("calibration.ensemble_min_weight", cal.ensemble_min_weight)?;
        check_probability("calibration.ensemble_max_weight", cal.ensemble_max_weight)?;
        check_ordered(
            "calibration.ensemble_weight",
            cal.ensemble_min_weight,
            cal.ensemble_max_weight,
        )?;
        if cal.reliability_bins < 2 {
            return Err(SimError::config("calibration.reliability_bins must be >= 2"));
        }

        let edge = &self.edge;
        if edge.default_american_odds.abs() < 100.0 {
            return Err(SimError::config(format!(
                "edge.default_american_odds must be <= -100 or >= 100, got {}",
                edge.default_american_odds
            )));
        }
        if !(edge.low_edge <= edge.medium_edge && edge.medium_edge <= edge.high_edge) {
            return Err(SimError::config("edge tier thresholds must be increasing"));
        }

        Ok(())
    }
}

fn check_probability(name: &str, p: f64) -> Result<()> {
    if p.is_finite() && (0.0..=1.0).contains(&p) {
        Ok(())
    } else {
        Err(SimError::config(format!("{name} must be in [0, 1], got {p}")))
    }
}

fn check_ordered(name: &str, min: f64, max: f64) -> Result<()> {
    if min.is_finite() && max.is_finite() && min <= max {
        Ok(())
    } else {
        Err(SimError::config(format!(
            "{name} range is invalid: min {min} > max {max}"
        )))
    }
}

// ========== Tests ==========

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_is_valid() {
        let cfg = SimConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.version, CONFIG_VERSION);
        assert!((cfg.calibration.z_cap - 3.0).abs() < 1e-12);
        assert_eq!(cfg.fourth_down.fg_min_yardline, 83);
    }

    #[test]
    fn test_json_round_trip_keeps_fingerprint() {
        let cfg = SimConfig::default();
        let json = cfg.to_json().unwrap();
        let parsed = SimConfig::from_json(&json).unwrap();
        assert_eq!(parsed.fingerprint(), cfg.fingerprint());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let parsed = SimConfig::from_json(r#"{"version": "test", "game": {"hurry_up_seconds": 10}}"#)
            .unwrap();
        assert_eq!(parsed.version, "test");
        assert_eq!(parsed.game.hurry_up_seconds, 10);
        assert_eq!(parsed.game.max_plays_per_drive, 40);
        assert!((parsed.play.int_base_rate - 0.022).abs() < 1e-12);
    }

    #[test]
    fn test_fingerprint_changes_with_parameters() {
        let base = SimConfig::default();
        let mut tweaked = SimConfig::default();
        tweaked.play.sack_share = 0.25;
        assert_ne!(base.fingerprint(), tweaked.fingerprint());
        assert_eq!(base.fingerprint().len(), 64);
    }

    #[test]
    fn test_rejects_out_of_range_probability() {
        let mut cfg = SimConfig::default();
        cfg.play.int_base_rate = 1.2;
        let err = cfg.validate().unwrap_err();
        assert!(matches!(err, SimError::Configuration(_)));
        assert!(err.to_string().contains("int_base_rate"));
    }

    #[test]
    fn test_rejects_outlet_shares_over_one() {
        let mut cfg = SimConfig::default();
        cfg.play.scramble_share = 0.5;
        cfg.play.sack_share = 0.6;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_rejects_inverted_ranges() {
        let mut cfg = SimConfig::default();
        cfg.realism.pass_rate = MetricRange::new(0.8, 0.4);
        assert!(cfg.validate().is_err());

        let mut cfg = SimConfig::default();
        cfg.market.scale_min = 3.0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_rejects_bad_yardage_limits() {
        let mut cfg = SimConfig::default();
        cfg.play.max_completion_loss = 3.0;
        assert!(cfg.validate().unwrap_err().to_string().contains("max_completion_loss"));

        let mut cfg = SimConfig::default();
        cfg.play.min_punt_net = -1.0;
        assert!(cfg.validate().is_err());

        let mut cfg = SimConfig::default();
        cfg.play.weather_multiplier_floor = 1.5;
        assert!(cfg.validate().is_err());

        let mut cfg = SimConfig::default();
        cfg.game.explosive_yards = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_rejects_bad_odds_and_tiers() {
        let mut cfg = SimConfig::default();
        cfg.edge.default_american_odds = 50.0;
        assert!(cfg.validate().is_err());

        let mut cfg = SimConfig::default();
        cfg.edge.medium_edge = 0.01;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_load_yaml_file() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "version: yaml-test").unwrap();
        writeln!(file, "calibration:").unwrap();
        writeln!(file, "  z_cap: 2.5").unwrap();
        let cfg = SimConfig::load(file.path()).unwrap();
        assert_eq!(cfg.version, "yaml-test");
        assert!((cfg.calibration.z_cap - 2.5).abs() < 1e-12);
    }

    #[test]
    fn test_load_invalid_json_file_is_error() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, "{{ not json").unwrap();
        assert!(matches!(SimConfig::load(file.path()), Err(SimError::Json(_))));
    }

    #[test]
    fn test_env_var_path() {
        let var = "GRIDIRON_CONFIG_PATH_TEST_ENV_VAR_PATH";
        assert_eq!(SimConfig::from_env_var(var).unwrap().version, CONFIG_VERSION);

        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"version": "from-env"}}"#).unwrap();
        env::set_var(var, file.path());
        let cfg = SimConfig::from_env_var(var).unwrap();
        env::remove_var(var);
        assert_eq!(cfg.version, "from-env");
    }
}
