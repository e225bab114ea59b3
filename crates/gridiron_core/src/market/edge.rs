//! Betting edge from calibrated probabilities and American odds

use serde::{Deserialize, Serialize};

use crate::config::EdgeParams;
use crate::error::{Result, SimError};

/// Zero-EV win probability at the given American odds: risk / (risk + win).
pub fn breakeven_probability(american_odds: f64) -> Result<f64> {
    let (risk, win) = risk_and_win(american_odds)?;
    Ok(risk / (risk + win))
}

/// Expected profit per unit staked.
pub fn expected_value(probability: f64, american_odds: f64) -> Result<f64> {
    let (risk, win) = risk_and_win(american_odds)?;
    Ok(probability * win / risk - (1.0 - probability))
}

fn risk_and_win(american_odds: f64) -> Result<(f64, f64)> {
    if !american_odds.is_finite() || american_odds.abs() < 100.0 {
        return Err(SimError::config(format!(
            "invalid American odds {american_odds}: magnitude must be at least 100"
        )));
    }
    if american_odds > 0.0 {
        Ok((100.0, american_odds))
    } else {
        Ok((-american_odds, 100.0))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConvictionTier {
    None,
    Low,
    Medium,
    High,
}

impl ConvictionTier {
    pub fn from_edge(edge: f64, params: &EdgeParams) -> Self {
        if edge >= params.high_edge {
            ConvictionTier::High
        } else if edge >= params.medium_edge {
            ConvictionTier::Medium
        } else if edge >= params.low_edge {
            ConvictionTier::Low
        } else {
            ConvictionTier::None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BetSide {
    HomeCover,
    AwayCover,
    Over,
    Under,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EdgeAssessment {
    pub side: BetSide,
    pub probability: f64,
    pub american_odds: f64,
    pub breakeven: f64,
    /// probability - breakeven
    pub edge: f64,
    pub expected_value: f64,
    pub tier: ConvictionTier,
}

impl EdgeAssessment {
    pub fn assess(side: BetSide, probability: f64, american_odds: f64, params: &EdgeParams) -> Result<Self> {
        if !(0.0..=1.0).contains(&probability) {
            return Err(SimError::config(format!("probability {probability} outside [0, 1]")));
        }
        let breakeven = breakeven_probability(american_odds)?;
        let edge = probability - breakeven;
        Ok(Self {
            side,
            probability,
            american_odds,
            breakeven,
            edge,
            expected_value: expected_value(probability, american_odds)?,
            tier: ConvictionTier::from_edge(edge, params),
        })
    }

    pub fn is_actionable(&self) -> bool {
        self.tier != ConvictionTier::None
    }
}

/// The actionable assessment with the largest edge.
pub fn best_edge(assessments: &[EdgeAssessment]) -> Option<&EdgeAssessment> {
    assessments
        .iter()
        .filter(|a| a.is_actionable())
        .max_by(|a, b| a.edge.total_cmp(&b.edge))
}
