//! Game situation record and its transitions
//!
//! Yardlines are measured from the offense's own goal line: 0 is the
//! offense's goal, 100 the opponent's. Every possession change reflects the
//! spot for the new offense as `100 - yardline`.

use serde::{Deserialize, Serialize};

use crate::team::{DistanceBucket, FieldZone, ScoreBucket, TimeBucket};

pub const QUARTER_SECONDS: u32 = 900;
pub const FINAL_QUARTER: u8 = 4;
const FIRST_DOWN_DISTANCE: u8 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Home,
    Away,
}

impl Side {
    pub fn opponent(self) -> Side {
        match self {
            Side::Home => Side::Away,
            Side::Away => Side::Home,
        }
    }
}

/// What a scrimmage gain did to the series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesUpdate {
    FirstDown,
    NextDown,
    Touchdown,
    Safety,
    /// Possession has already flipped
    TurnoverOnDowns,
}

/// Where the clock landed after a snap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockBoundary {
    None,
    /// End of the 1st or 3rd quarter; a drive in progress carries over
    QuarterBreak,
    Halftime,
    EndOfGame,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    pub quarter: u8,
    pub time_remaining: u32,
    pub possession: Side,
    pub down: u8,
    pub distance: u8,
    pub yardline: u8,
    pub home_score: u32,
    pub away_score: u32,
    pub drive_plays: u16,
    pub opening_receiver: Side,
}

impl GameState {
    /// Opening kickoff state. The receiver's start spot is set by `start_drive`.
    pub fn new(opening_receiver: Side) -> Self {
        Self {
            quarter: 1,
            time_remaining: QUARTER_SECONDS,
            possession: opening_receiver,
            down: 1,
            distance: FIRST_DOWN_DISTANCE,
            yardline: 25,
            home_score: 0,
            away_score: 0,
            drive_plays: 0,
            opening_receiver,
        }
    }

    pub fn is_game_over(&self) -> bool {
        self.quarter > FINAL_QUARTER
    }

    pub fn second_half_receiver(&self) -> Side {
        self.opening_receiver.opponent()
    }

    pub fn defense(&self) -> Side {
        self.possession.opponent()
    }

    pub fn yards_to_goal(&self) -> u8 {
        100 - self.yardline
    }

    pub fn score(&self, side: Side) -> u32 {
        match side {
            Side::Home => self.home_score,
            Side::Away => self.away_score,
        }
    }

    /// Offense score minus defense score.
    pub fn score_differential(&self) -> i32 {
        self.score(self.possession) as i32 - self.score(self.defense()) as i32
    }

    pub fn add_points(&mut self, side: Side, points: u32) {
        match side {
            Side::Home => self.home_score += points,
            Side::Away => self.away_score += points,
        }
    }

    pub fn field_zone(&self) -> FieldZone {
        FieldZone::from_yardline(self.yardline)
    }

    pub fn distance_bucket(&self) -> DistanceBucket {
        DistanceBucket::from_distance(self.distance)
    }

    pub fn score_bucket(&self) -> ScoreBucket {
        ScoreBucket::from_differential(self.score_differential())
    }

    pub fn time_bucket(&self) -> TimeBucket {
        TimeBucket::from_clock(self.quarter, self.time_remaining)
    }

    /// First-and-ten (or goal) for `offense` at `yardline`.
    pub fn start_drive(&mut self, offense: Side, yardline: u8) {
        let yardline = yardline.clamp(1, 99);
        self.possession = offense;
        self.yardline = yardline;
        self.down = 1;
        self.distance = FIRST_DOWN_DISTANCE.min(100 - yardline);
        self.drive_plays = 0;
    }

    /// Apply a scrimmage gain (negative for a loss).
    pub fn advance(&mut self, yards: i32) -> SeriesUpdate {
        let new_yardline = (self.yardline as i32 + yards).clamp(0, 100);
        let gained = new_yardline - self.yardline as i32;
        self.drive_plays = self.drive_plays.saturating_add(1);

        if new_yardline == 100 {
            self.yardline = 100;
            return SeriesUpdate::Touchdown;
        }
        if new_yardline == 0 {
            self.yardline = 0;
            return SeriesUpdate::Safety;
        }

        self.yardline = new_yardline as u8;
        if gained >= self.distance as i32 {
            self.down = 1;
            self.distance = FIRST_DOWN_DISTANCE.min(100 - self.yardline);
            return SeriesUpdate::FirstDown;
        }

        // Distance never exceeds the yards to the goal, so this fits in u8.
        self.distance = (self.distance as i32 - gained).clamp(1, 100 - new_yardline) as u8;
        if self.down >= 4 {
            let spot = 100 - self.yardline;
            self.start_drive(self.defense(), spot);
            return SeriesUpdate::TurnoverOnDowns;
        }
        self.down += 1;
        SeriesUpdate::NextDown
    }

    /// Hand the ball to the defense, which starts at `yardline` of its own.
    pub fn change_possession(&mut self, yardline: u8) {
        let offense = self.defense();
        self.start_drive(offense, yardline);
    }

    /// Run the clock and roll quarters over when it expires.
    pub fn tick(&mut self, seconds: u32) -> ClockBoundary {
        if self.is_game_over() {
            return ClockBoundary::EndOfGame;
        }
        self.time_remaining = self.time_remaining.saturating_sub(seconds);
        if self.time_remaining > 0 {
            return ClockBoundary::None;
        }

        self.quarter += 1;
        match self.quarter {
            3 => {
                self.time_remaining = QUARTER_SECONDS;
                ClockBoundary::Halftime
            }
            q if q > FINAL_QUARTER => ClockBoundary::EndOfGame,
            _ => {
                self.time_remaining = QUARTER_SECONDS;
                ClockBoundary::QuarterBreak
            }
        }
    }

    /// Structural invariants that hold after every transition.
    pub fn is_consistent(&self) -> bool {
        let clock_ok = self.time_remaining <= QUARTER_SECONDS
            && (1..=FINAL_QUARTER + 1).contains(&self.quarter)
            && (self.quarter <= FINAL_QUARTER || self.time_remaining == 0);
        let series_ok = (1..=4).contains(&self.down)
            && self.yardline <= 100
            && (self.yardline == 0
                || self.yardline == 100
                || (self.distance >= 1 && self.distance <= 100 - self.yardline));
        clock_ok && series_ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn state_at(yardline: u8) -> GameState {
        let mut s = GameState::new(Side::Home);
        s.start_drive(Side::Home, yardline);
        s
    }

    #[test]
    fn test_first_down_resets_series() {
        let mut s = state_at(30);
        assert_eq!(s.advance(12), SeriesUpdate::FirstDown);
        assert_eq!((s.down, s.distance, s.yardline), (1, 10, 42));
    }

    #[test]
    fn test_goal_to_go_distance() {
        let mut s = state_at(88);
        assert_eq!(s.advance(5), SeriesUpdate::NextDown);
        assert_eq!((s.down, s.distance, s.yardline), (2, 5, 93));
        assert_eq!(s.advance(1), SeriesUpdate::NextDown);
        assert_eq!((s.down, s.distance), (3, 4));
        let mut s = state_at(85);
        assert_eq!(s.advance(10), SeriesUpdate::FirstDown);
        assert_eq!((s.distance, s.yardline), (5, 95));
    }

    #[test]
    fn test_touchdown_and_safety() {
        let mut s = state_at(90);
        assert_eq!(s.advance(30), SeriesUpdate::Touchdown);
        assert_eq!(s.yardline, 100);

        let mut s = state_at(3);
        assert_eq!(s.advance(-8), SeriesUpdate::Safety);
        assert_eq!(s.yardline, 0);
    }

    #[test]
    fn test_turnover_on_downs_reflects_spot() {
        let mut s = state_at(40);
        for _ in 0..3 {
            assert_eq!(s.advance(1), SeriesUpdate::NextDown);
        }
        assert_eq!(s.down, 4);
        assert_eq!(s.advance(0), SeriesUpdate::TurnoverOnDowns);
        assert_eq!(s.possession, Side::Away);
        assert_eq!(s.yardline, 57);
        assert_eq!((s.down, s.distance), (1, 10));
    }

    #[test]
    fn test_loss_increases_distance() {
        let mut s = state_at(50);
        assert_eq!(s.advance(-7), SeriesUpdate::NextDown);
        assert_eq!((s.down, s.distance, s.yardline), (2, 17, 43));
    }

    #[test]
    fn test_clock_rolls_quarters() {
        let mut s = GameState::new(Side::Away);
        assert_eq!(s.tick(899), ClockBoundary::None);
        assert_eq!(s.tick(40), ClockBoundary::QuarterBreak);
        assert_eq!((s.quarter, s.time_remaining), (2, 900));
        assert_eq!(s.tick(900), ClockBoundary::Halftime);
        assert_eq!(s.quarter, 3);
        assert_eq!(s.tick(900), ClockBoundary::QuarterBreak);
        assert_eq!(s.tick(900), ClockBoundary::EndOfGame);
        assert!(s.is_game_over());
        assert_eq!(s.time_remaining, 0);
        assert_eq!(s.second_half_receiver(), Side::Home);
    }

    #[test]
    fn test_score_differential_is_offense_perspective() {
        let mut s = state_at(25);
        s.add_points(Side::Away, 7);
        assert_eq!(s.score_differential(), -7);
        assert_eq!(s.score_bucket(), ScoreBucket::Trailing);
        s.change_possession(25);
        assert_eq!(s.score_differential(), 7);
    }

    proptest! {
        #[test]
        fn prop_state_stays_consistent(
            start in 1u8..100,
            gains in prop::collection::vec(-15i32..40, 1..60),
            ticks in prop::collection::vec(0u32..60, 1..60),
        ) {
            let mut s = state_at(start);
            for (gain, secs) in gains.iter().zip(ticks.iter().cycle()) {
                match s.advance(*gain) {
                    SeriesUpdate::Touchdown | SeriesUpdate::Safety => s.change_possession(25),
                    _ => {}
                }
                prop_assert!(s.is_consistent(), "{:?}", s);
                if s.tick(*secs) == ClockBoundary::EndOfGame {
                    break;
                }
                prop_assert!(s.is_consistent(), "{:?}", s);
            }
        }
    }
}
