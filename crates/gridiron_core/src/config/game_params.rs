//! Game flow and fourth-down policy parameters

use serde::{Deserialize, Serialize};

/// Clock and drive-loop parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GameParams {
    /// Clock seconds a snap consumes when the clock is stopped afterwards (default: 6)
    pub stopped_clock_play_seconds: u32,
    /// Clock seconds per snap in hurry-up mode (default: 14)
    pub hurry_up_seconds: u32,
    /// Hurry-up applies inside this many seconds of the half/game (default: 120)
    pub hurry_up_window: u32,
    /// Clock seconds consumed by punts, field goals and returned kickoffs (default: 8)
    pub special_teams_seconds: u32,
    /// Pace bounds applied to a team's seconds-per-play (default: 20..=45)
    pub pace_min_seconds: f64,
    pub pace_max_seconds: f64,
    /// Hard cap on offensive snaps in a single drive (default: 40)
    pub max_plays_per_drive: u16,
    /// Any-down field goal attempt when this few seconds remain in a half (default: 10)
    pub end_of_half_kick_seconds: u32,
    /// Minimum yardline for the end-of-half attempt (default: 60, a 57-yard kick)
    pub end_of_half_kick_min_yardline: u8,
    /// A missed field goal returns to the spot of the hold, this far behind the line (default: 7)
    pub field_goal_hold_yards: u8,
    /// Scrimmage gain counted as an explosive play (default: 20)
    pub explosive_yards: i32,
}

impl Default for GameParams {
    fn default() -> Self {
        Self {
            stopped_clock_play_seconds: 6,
            hurry_up_seconds: 14,
            hurry_up_window: 120,
            special_teams_seconds: 8,
            pace_min_seconds: 20.0,
            pace_max_seconds: 45.0,
            max_plays_per_drive: 40,
            end_of_half_kick_seconds: 10,
            end_of_half_kick_min_yardline: 60,
            field_goal_hold_yards: 7,
            explosive_yards: 20,
        }
    }
}

/// Fourth-down decision thresholds. Yardlines are measured from the offense's own goal.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FourthDownParams {
    /// Go when trailing by more than this in the final seconds (default: 7)
    pub desperation_deficit: i32,
    /// Final-seconds window for desperation, shared with the play model's
    /// deep-shot and interception-cap switch (default: 120)
    pub desperation_seconds: u32,
    /// Field-goal range starts here (default: 83, a 34-yard kick)
    pub fg_min_yardline: u8,
    /// Go instead of kicking at or under this distance (default: 1)
    pub fg_go_distance: u8,
    /// Very close to the goal line (default: 95)
    pub goal_line_yardline: u8,
    /// Go instead of kicking at or under this distance near the goal line (default: 3)
    pub goal_line_go_distance: u8,
    /// Short-yardage go distance (default: 2)
    pub short_go_distance: u8,
    /// Opponent territory for the short-yardage rule (default: 45)
    pub opponent_territory_yardline: u8,
    /// Past-midfield go distance (default: 3)
    pub midfield_go_distance: u8,
    /// Midfield, exclusive (default: 50)
    pub midfield_yardline: u8,
    /// Late-game go when trailing by more than this (default: 3)
    pub late_deficit: i32,
    /// Late-game go distance (default: 5)
    pub late_go_distance: u8,
}

impl Default for FourthDownParams {
    fn default() -> Self {
        Self {
            desperation_deficit: 7,
            desperation_seconds: 120,
            fg_min_yardline: 83,
            fg_go_distance: 1,
            goal_line_yardline: 95,
            goal_line_go_distance: 3,
            short_go_distance: 2,
            opponent_territory_yardline: 45,
            midfield_go_distance: 3,
            midfield_yardline: 50,
            late_deficit: 3,
            late_go_distance: 5,
        }
    }
}
