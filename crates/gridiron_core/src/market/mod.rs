//! Market line, centering and edge assessment
//!
//! `spread` follows the sportsbook convention: negative means the home team
//! is favored, so a line of -3 implies an expected home-minus-away margin of
//! +3.

pub mod centering;
pub mod edge;

pub use centering::{center_scores, water_fill, CenteredScores};
pub use edge::{
    best_edge, breakeven_probability, expected_value, BetSide, ConvictionTier, EdgeAssessment,
};

use serde::{Deserialize, Serialize};

use crate::config::MarketParams;
use crate::error::{Result, SimError};

/// American odds per side. Missing sides use the configured default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketOdds {
    pub home: Option<f64>,
    pub away: Option<f64>,
    pub over: Option<f64>,
    pub under: Option<f64>,
}

impl MarketOdds {
    pub fn for_side(&self, side: BetSide) -> Option<f64> {
        match side {
            BetSide::HomeCover => self.home,
            BetSide::AwayCover => self.away,
            BetSide::Over => self.over,
            BetSide::Under => self.under,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarketLine {
    pub spread: f64,
    pub total: f64,
    #[serde(default)]
    pub odds: MarketOdds,
}

impl MarketLine {
    pub fn new(spread: f64, total: f64) -> Result<Self> {
        let line = Self {
            spread,
            total,
            odds: MarketOdds::default(),
        };
        line.validate()?;
        Ok(line)
    }

    pub fn with_odds(mut self, odds: MarketOdds) -> Result<Self> {
        self.odds = odds;
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.spread.is_finite() || !self.total.is_finite() {
            return Err(SimError::config("market line must be finite"));
        }
        if self.total <= 0.0 {
            return Err(SimError::config(format!("market total {} must be positive", self.total)));
        }
        if self.total < self.spread.abs() {
            return Err(SimError::config(format!(
                "market total {} below |spread| {}",
                self.total,
                self.spread.abs()
            )));
        }
        for side in [BetSide::HomeCover, BetSide::AwayCover, BetSide::Over, BetSide::Under] {
            if let Some(odds) = self.odds.for_side(side) {
                breakeven_probability(odds)?;
            }
        }
        Ok(())
    }

    /// Home minus away margin implied by the spread.
    pub fn expected_margin(&self) -> f64 {
        -self.spread
    }

    pub fn odds_for(&self, side: BetSide, default_odds: f64) -> f64 {
        self.odds.for_side(side).unwrap_or(default_odds)
    }

    /// Center raw score arrays on this line.
    pub fn center(&self, home: &[f64], away: &[f64], params: &MarketParams) -> Result<CenteredScores> {
        center_scores(home, away, self.expected_margin(), self.total, params)
    }

    /// Empirical home-cover rate over margins, pushes excluded.
    pub fn home_cover_rate(&self, margins: &[f64]) -> Option<f64> {
        decided_rate(margins.iter().map(|m| m + self.spread))
    }

    /// Empirical over rate over totals, pushes excluded.
    pub fn over_rate(&self, totals: &[f64]) -> Option<f64> {
        decided_rate(totals.iter().map(|t| t - self.total))
    }
}

/// Share of positive values among the non-zero ones.
fn decided_rate(diffs: impl Iterator<Item = f64>) -> Option<f64> {
    let (wins, decided) = diffs.fold((0usize, 0usize), |(w, d), x| {
        if x > 0.0 {
            (w + 1, d + 1)
        } else if x < 0.0 {
            (w, d + 1)
        } else {
            (w, d)
        }
    });
    (decided > 0).then(|| wins as f64 / decided as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spread_convention() {
        let line = MarketLine::new(-3.0, 45.0).unwrap();
        assert_eq!(line.expected_margin(), 3.0);
        // Home wins by 7 covers -3; by 3 is a push.
        assert_eq!(line.home_cover_rate(&[7.0, 3.0, -1.0]), Some(0.5));
        assert_eq!(line.over_rate(&[50.0, 45.0, 40.0, 46.0]), Some(2.0 / 3.0));
        assert_eq!(line.home_cover_rate(&[3.0]), None);
    }

    #[test]
    fn test_invalid_lines() {
        assert!(MarketLine::new(f64::NAN, 45.0).is_err());
        assert!(MarketLine::new(-3.0, 0.0).is_err());
        assert!(matches!(MarketLine::new(-30.0, 20.0), Err(SimError::Configuration(_))));
        let odds = MarketOdds {
            home: Some(-20.0),
            ..MarketOdds::default()
        };
        assert!(MarketLine::new(-3.0, 45.0).unwrap().with_odds(odds).is_err());
    }

    #[test]
    fn test_odds_default() {
        let line = MarketLine::new(2.5, 41.0)
            .unwrap()
            .with_odds(MarketOdds {
                over: Some(-105.0),
                ..MarketOdds::default()
            })
            .unwrap();
        assert_eq!(line.odds_for(BetSide::Over, -110.0), -105.0);
        assert_eq!(line.odds_for(BetSide::Under, -110.0), -110.0);

        let parsed: MarketLine = serde_json::from_str(r#"{"spread": -3.5, "total": 47.5}"#).unwrap();
        assert_eq!(parsed.odds, MarketOdds::default());
    }

    #[test]
    fn test_centering_uses_expected_margin() {
        let line = MarketLine::new(-3.0, 45.0).unwrap();
        let c = line
            .center(&[21.0, 28.0, 17.0], &[20.0, 24.0, 27.0], &MarketParams::default())
            .unwrap();
        assert!((c.mean_margin() - 3.0).abs() < 1e-9);
        assert!((c.mean_total() - 45.0).abs() < 1e-9);
    }
}
