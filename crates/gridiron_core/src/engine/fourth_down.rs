//! Fourth-down decision policy
//!
//! Pure function of the situation; rules are checked in order and the first
//! match wins. Yardline is from the offense's own goal line.

use serde::{Deserialize, Serialize};

use crate::config::FourthDownParams;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FourthDownDecision {
    Go,
    Punt,
    FieldGoal,
}

/// The rule that produced a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FourthDownRule {
    Desperation,
    GoalLineGo,
    FieldGoalRange,
    ShortYardage,
    PastMidfield,
    LateDeficit,
    DefaultPunt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FourthDownSituation {
    pub yardline: u8,
    pub distance: u8,
    pub time_remaining: u32,
    /// Offense minus defense
    pub score_differential: i32,
    pub quarter: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FourthDownCall {
    pub decision: FourthDownDecision,
    pub rule: FourthDownRule,
}

pub fn decide_fourth_down(situation: &FourthDownSituation, params: &FourthDownParams) -> FourthDownCall {
    use FourthDownDecision::*;
    use FourthDownRule::*;

    let s = situation;
    let trailing = s.score_differential < 0;
    let call = |decision, rule| FourthDownCall { decision, rule };

    if s.quarter >= 4
        && s.time_remaining < params.desperation_seconds
        && s.score_differential < -params.desperation_deficit
    {
        return call(Go, Desperation);
    }

    if s.yardline >= params.fg_min_yardline {
        let goal_line = s.yardline >= params.goal_line_yardline && s.distance <= params.goal_line_go_distance;
        if s.distance <= params.fg_go_distance || goal_line {
            return call(Go, GoalLineGo);
        }
        return call(FieldGoal, FieldGoalRange);
    }

    if s.distance <= params.short_go_distance
        && (s.yardline >= params.opponent_territory_yardline || trailing)
    {
        return call(Go, ShortYardage);
    }

    if s.distance <= params.midfield_go_distance && s.yardline > params.midfield_yardline {
        return call(Go, PastMidfield);
    }

    if s.quarter >= 4 && s.score_differential < -params.late_deficit && s.distance <= params.late_go_distance {
        return call(Go, LateDeficit);
    }

    call(Punt, DefaultPunt)
}
