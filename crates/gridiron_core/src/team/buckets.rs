//! Situational buckets used as lookup keys into team tendencies

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldZone {
    /// Inside the offense's own 20
    BackedUp,
    /// Own 20 to midfield
    OwnTerritory,
    /// Midfield to the opponent's 20
    OpponentTerritory,
    /// Opponent's 20 and in
    RedZone,
}

impl FieldZone {
    pub fn from_yardline(yardline: u8) -> Self {
        match yardline {
            0..=19 => FieldZone::BackedUp,
            20..=49 => FieldZone::OwnTerritory,
            50..=79 => FieldZone::OpponentTerritory,
            _ => FieldZone::RedZone,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceBucket {
    /// 1-3 yards
    Short,
    /// 4-6 yards
    Medium,
    /// 7+ yards
    Long,
}

impl DistanceBucket {
    pub fn from_distance(distance: u8) -> Self {
        match distance {
            0..=3 => DistanceBucket::Short,
            4..=6 => DistanceBucket::Medium,
            _ => DistanceBucket::Long,
        }
    }
}

/// Score differential from the offense's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreBucket {
    /// Down by more than one score
    TrailingBig,
    /// Down by 1-8
    Trailing,
    Tied,
    /// Up by 1-8
    Leading,
    /// Up by more than one score
    LeadingBig,
}

impl ScoreBucket {
    pub fn from_differential(diff: i32) -> Self {
        match diff {
            i32::MIN..=-9 => ScoreBucket::TrailingBig,
            -8..=-1 => ScoreBucket::Trailing,
            0 => ScoreBucket::Tied,
            1..=8 => ScoreBucket::Leading,
            _ => ScoreBucket::LeadingBig,
        }
    }

    pub fn is_trailing(self) -> bool {
        matches!(self, ScoreBucket::TrailingBig | ScoreBucket::Trailing)
    }

    pub fn is_leading(self) -> bool {
        matches!(self, ScoreBucket::LeadingBig | ScoreBucket::Leading)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeBucket {
    /// First half outside the two-minute warning
    FirstHalf,
    /// Third quarter and the 4th before its final five minutes
    SecondHalf,
    /// Final five minutes of the 4th, before the two-minute warning
    Late,
    /// Final two minutes of either half
    TwoMinute,
}

impl TimeBucket {
    pub fn from_clock(quarter: u8, time_remaining: u32) -> Self {
        match quarter {
            1 => TimeBucket::FirstHalf,
            2 if time_remaining <= 120 => TimeBucket::TwoMinute,
            2 => TimeBucket::FirstHalf,
            3 => TimeBucket::SecondHalf,
            _ if time_remaining <= 120 => TimeBucket::TwoMinute,
            _ if time_remaining <= 300 => TimeBucket::Late,
            _ => TimeBucket::SecondHalf,
        }
    }
}
