//! # Game Simulator
//!
//! Runs one trial: a coin toss from the trial RNG, then drives until the 4th
//! quarter clock expires. No overtime; ties stand.
//!
//! ## Drive loop
//! - 4th down goes through [`decide_fourth_down`]
//! - any down with a few seconds left in a half may become a field goal try
//! - clock per snap: kicks, clock-stopping plays, hurry-up, or team pace
//! - a drive that reaches the snap cap ends as a turnover on downs at the spot
//!   and is flagged in [`GameStats`]
//!
//! Trace events (`game.start`, `drive.summary`, `fourth_down.decision`,
//! `drive.safety_cap`, `game.end`) are built only when the sink is enabled.

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::fourth_down::{decide_fourth_down, FourthDownCall, FourthDownDecision, FourthDownSituation};
use super::game_state::{ClockBoundary, GameState, SeriesUpdate, Side};
use super::play_sim::{PlayKind, PlayOutcome, PlaySimulator};
use super::realism::RealismReport;
use crate::config::SimConfig;
use crate::team::TeamCapability;
use crate::trace::{NullSink, TraceEvent, TraceSink};

static NULL_SINK: NullSink = NullSink;

/// Touchdown worth before the try.
const TOUCHDOWN_POINTS: u32 = 6;
const FIELD_GOAL_POINTS: u32 = 3;
const SAFETY_POINTS: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriveEnd {
    Touchdown,
    FieldGoal,
    MissedFieldGoal,
    Punt,
    Interception,
    Fumble,
    TurnoverOnDowns,
    Safety,
    EndOfHalf,
    EndOfGame,
    /// Snap cap reached
    SafetyCap,
}

/// How the next drive begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NextPossession {
    /// Kickoff received by the side
    Kickoff(Side),
    /// Free kick after a safety, received by the side
    FreeKick(Side),
    /// Side takes over at its own yardline
    Spot(Side, u8),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriveResult {
    pub offense: Side,
    pub quarter: u8,
    pub start_yardline: u8,
    pub plays: u16,
    pub yards: i32,
    /// Scored by the offense
    pub points: u32,
    /// Scored by the defense (return touchdowns and safeties)
    pub defense_points: u32,
    pub end: DriveEnd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameResult {
    pub home_score: u32,
    pub away_score: u32,
}

impl GameResult {
    /// Home minus away.
    pub fn margin(&self) -> i32 {
        self.home_score as i32 - self.away_score as i32
    }

    pub fn total(&self) -> u32 {
        self.home_score + self.away_score
    }
}

/// Per-team counting stats for one game, from the offense's point of view
/// unless noted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TeamGameStats {
    pub drives: u32,
    /// Scrimmage snaps
    pub plays: u32,
    pub pass_plays: u32,
    pub explosive_plays: u32,
    pub yards: i32,
    pub touchdowns: u32,
    pub field_goals_made: u32,
    pub field_goals_missed: u32,
    pub punts: u32,
    pub interceptions_thrown: u32,
    pub fumbles_lost: u32,
    pub turnovers_on_downs: u32,
    pub fourth_down_attempts: u32,
    pub safety_caps: u32,
    /// Return touchdowns scored while on defense
    pub defensive_touchdowns: u32,
}

impl TeamGameStats {
    pub fn turnovers(&self) -> u32 {
        self.interceptions_thrown + self.fumbles_lost
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameStats {
    pub home: TeamGameStats,
    pub away: TeamGameStats,
}

impl GameStats {
    pub fn team(&self, side: Side) -> &TeamGameStats {
        match side {
            Side::Home => &self.home,
            Side::Away => &self.away,
        }
    }

    fn team_mut(&mut self, side: Side) -> &mut TeamGameStats {
        match side {
            Side::Home => &mut self.home,
            Side::Away => &mut self.away,
        }
    }

    fn sum(&self, f: impl Fn(&TeamGameStats) -> u32) -> u32 {
        f(&self.home) + f(&self.away)
    }

    pub fn total_drives(&self) -> u32 {
        self.sum(|t| t.drives)
    }

    pub fn total_plays(&self) -> u32 {
        self.sum(|t| t.plays)
    }

    pub fn total_pass_plays(&self) -> u32 {
        self.sum(|t| t.pass_plays)
    }

    pub fn total_explosive_plays(&self) -> u32 {
        self.sum(|t| t.explosive_plays)
    }

    pub fn total_touchdowns(&self) -> u32 {
        self.sum(|t| t.touchdowns)
    }

    pub fn total_field_goals(&self) -> u32 {
        self.sum(|t| t.field_goals_made)
    }

    pub fn total_turnovers(&self) -> u32 {
        self.sum(TeamGameStats::turnovers)
    }

    pub fn total_safety_caps(&self) -> u32 {
        self.sum(|t| t.safety_caps)
    }
}

/// Everything one trial produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialResult {
    pub trial: u64,
    pub opening_receiver: Side,
    pub result: GameResult,
    pub stats: GameStats,
    pub realism: RealismReport,
}

pub struct GameSimulator<'a> {
    home: &'a TeamCapability,
    away: &'a TeamCapability,
    config: &'a SimConfig,
    sink: &'a dyn TraceSink,
}

impl<'a> GameSimulator<'a> {
    pub fn new(home: &'a TeamCapability, away: &'a TeamCapability, config: &'a SimConfig) -> Self {
        Self {
            home,
            away,
            config,
            sink: &NULL_SINK,
        }
    }

    pub fn with_sink(mut self, sink: &'a dyn TraceSink) -> Self {
        self.sink = sink;
        self
    }

    pub fn config(&self) -> &SimConfig {
        self.config
    }

    pub(crate) fn sink(&self) -> &dyn TraceSink {
        self.sink
    }

    pub fn home(&self) -> &TeamCapability {
        self.home
    }

    pub fn away(&self) -> &TeamCapability {
        self.away
    }

    fn team(&self, side: Side) -> &TeamCapability {
        match side {
            Side::Home => self.home,
            Side::Away => self.away,
        }
    }

    fn emit(&self, kind: &str, trial: u64, payload: impl FnOnce() -> serde_json::Value) {
        if self.sink.enabled() {
            self.sink.emit(TraceEvent::for_trial(kind, trial, payload()));
        }
    }

    /// Simulate one full game. The RNG is the only source of randomness.
    pub fn simulate<R: Rng + ?Sized>(&self, trial: u64, rng: &mut R) -> TrialResult {
        let plays = PlaySimulator::new(&self.config.play)
            .with_desperation_window(self.config.fourth_down.desperation_seconds);
        let opening = if rng.gen::<bool>() { Side::Home } else { Side::Away };
        let mut state = GameState::new(opening);
        let mut stats = GameStats::default();
        let mut next = NextPossession::Kickoff(opening);

        self.emit("game.start", trial, || {
            serde_json::json!({
                "home": self.home.name,
                "away": self.away.name,
                "opening_receiver": opening,
            })
        });

        while !state.is_game_over() {
            let (offense, yardline) = match next {
                NextPossession::Kickoff(receiver) => {
                    let kick = plays.kickoff(rng);
                    let seconds = if kick.touchback {
                        0
                    } else {
                        self.config.game.special_teams_seconds
                    };
                    match state.tick(seconds) {
                        ClockBoundary::Halftime => {
                            next = NextPossession::Kickoff(state.second_half_receiver());
                            continue;
                        }
                        ClockBoundary::EndOfGame => break,
                        _ => {}
                    }
                    (receiver, kick.yardline)
                }
                NextPossession::FreeKick(receiver) => (receiver, self.config.play.safety_free_kick_yardline),
                NextPossession::Spot(side, yardline) => (side, yardline),
            };

            state.start_drive(offense, yardline);
            let (drive, following) = self.run_drive(&plays, &mut state, &mut stats, trial, rng);
            next = following;

            if drive.end == DriveEnd::SafetyCap {
                self.emit("drive.safety_cap", trial, || serde_json::json!(drive));
            }
            self.emit("drive.summary", trial, || serde_json::json!(drive));
        }

        let result = GameResult {
            home_score: state.home_score,
            away_score: state.away_score,
        };
        let realism = RealismReport::evaluate(&result, &stats, &self.config.realism);

        debug!(
            trial,
            home = result.home_score,
            away = result.away_score,
            drives = stats.total_drives(),
            plays = stats.total_plays(),
            realism_ok = realism.passes(),
            "trial complete"
        );
        self.emit("game.end", trial, || {
            serde_json::json!({
                "result": result,
                "stats": stats,
            })
        });
        realism.emit(trial, self.sink);

        TrialResult {
            trial,
            opening_receiver: opening,
            result,
            stats,
            realism,
        }
    }

    fn run_drive<R: Rng + ?Sized>(
        &self,
        plays: &PlaySimulator,
        state: &mut GameState,
        stats: &mut GameStats,
        trial: u64,
        rng: &mut R,
    ) -> (DriveResult, NextPossession) {
        let offense_side = state.possession;
        let defense_side = offense_side.opponent();
        let offense = self.team(offense_side);
        let defense = self.team(defense_side);
        let game = &self.config.game;

        let mut drive = DriveResult {
            offense: offense_side,
            quarter: state.quarter,
            start_yardline: state.yardline,
            plays: 0,
            yards: 0,
            points: 0,
            defense_points: 0,
            end: DriveEnd::EndOfGame,
        };
        stats.team_mut(offense_side).drives += 1;

        loop {
            if drive.plays >= game.max_plays_per_drive {
                let spot = 100 - state.yardline;
                stats.team_mut(offense_side).safety_caps += 1;
                debug!(trial, offense = ?offense_side, plays = drive.plays, "drive hit snap cap");
                drive.end = DriveEnd::SafetyCap;
                return (drive, NextPossession::Spot(defense_side, spot));
            }

            let hurry_up = self.is_hurry_up(state);
            let outcome = match self.choose_play(state, trial) {
                PlayChoice::Scrimmage => plays.simulate_scrimmage(offense, defense, state, rng),
                PlayChoice::FieldGoal => plays.field_goal(offense, state, rng),
                PlayChoice::Punt => plays.punt(offense, state, rng),
            };
            let ended = self.apply_play(plays, &outcome, state, stats, &mut drive, rng);

            let seconds = self.play_seconds(&outcome, offense, hurry_up);
            let boundary = state.tick(seconds);

            match (ended, boundary) {
                (Some((end, _)), ClockBoundary::Halftime) => {
                    drive.end = end;
                    return (drive, NextPossession::Kickoff(state.second_half_receiver()));
                }
                (Some((end, next)), _) => {
                    drive.end = end;
                    return (drive, next);
                }
                (None, ClockBoundary::Halftime) => {
                    drive.end = DriveEnd::EndOfHalf;
                    return (drive, NextPossession::Kickoff(state.second_half_receiver()));
                }
                (None, ClockBoundary::EndOfGame) => {
                    drive.end = DriveEnd::EndOfGame;
                    return (drive, NextPossession::Kickoff(state.second_half_receiver()));
                }
                (None, _) => {}
            }
        }
    }

    fn choose_play(&self, state: &GameState, trial: u64) -> PlayChoice {
        if self.is_end_of_half_kick(state) {
            return PlayChoice::FieldGoal;
        }
        if state.down < 4 {
            return PlayChoice::Scrimmage;
        }

        let situation = FourthDownSituation {
            yardline: state.yardline,
            distance: state.distance,
            time_remaining: state.time_remaining,
            score_differential: state.score_differential(),
            quarter: state.quarter,
        };
        let call: FourthDownCall = decide_fourth_down(&situation, &self.config.fourth_down);
        self.emit("fourth_down.decision", trial, || {
            serde_json::json!({
                "situation": situation,
                "decision": call.decision,
                "rule": call.rule,
            })
        });
        match call.decision {
            FourthDownDecision::Go => PlayChoice::Scrimmage,
            FourthDownDecision::Punt => PlayChoice::Punt,
            FourthDownDecision::FieldGoal => PlayChoice::FieldGoal,
        }
    }

    /// Last-seconds field goal try on any down: always at the end of the 2nd,
    /// in the 4th only to tie or take the lead.
    fn is_end_of_half_kick(&self, state: &GameState) -> bool {
        let game = &self.config.game;
        if state.time_remaining > game.end_of_half_kick_seconds
            || state.yardline < game.end_of_half_kick_min_yardline
        {
            return false;
        }
        let diff = state.score_differential();
        state.quarter == 2 || (state.quarter == 4 && (-3..=0).contains(&diff))
    }

    fn is_hurry_up(&self, state: &GameState) -> bool {
        if state.time_remaining > self.config.game.hurry_up_window {
            return false;
        }
        state.quarter == 2 || (state.quarter == 4 && state.score_differential() <= 0)
    }

    fn play_seconds(&self, outcome: &PlayOutcome, offense: &TeamCapability, hurry_up: bool) -> u32 {
        let game = &self.config.game;
        if !outcome.kind.is_scrimmage() {
            game.special_teams_seconds
        } else if outcome.stops_clock() {
            game.stopped_clock_play_seconds
        } else if hurry_up {
            game.hurry_up_seconds
        } else {
            offense
                .pace_seconds_per_play
                .clamp(game.pace_min_seconds, game.pace_max_seconds)
                .round() as u32
        }
    }

    /// Apply a resolved play to the state. Returns how the drive ended, if it
    /// did, and how the next one starts.
    fn apply_play<R: Rng + ?Sized>(
        &self,
        plays: &PlaySimulator,
        outcome: &PlayOutcome,
        state: &mut GameState,
        stats: &mut GameStats,
        drive: &mut DriveResult,
        rng: &mut R,
    ) -> Option<(DriveEnd, NextPossession)> {
        let offense = state.possession;
        let defense = offense.opponent();
        let touchback = self.config.play.touchback_yardline;

        match outcome.kind {
            PlayKind::FieldGoal => {
                if outcome.field_goal_made {
                    stats.team_mut(offense).field_goals_made += 1;
                    state.add_points(offense, FIELD_GOAL_POINTS);
                    drive.points += FIELD_GOAL_POINTS;
                    return Some((DriveEnd::FieldGoal, NextPossession::Kickoff(defense)));
                }
                stats.team_mut(offense).field_goals_missed += 1;
                let hold = self.config.game.field_goal_hold_yards;
                let spot = (100 - state.yardline.saturating_sub(hold)).max(touchback);
                return Some((DriveEnd::MissedFieldGoal, NextPossession::Spot(defense, spot)));
            }
            PlayKind::Punt => {
                stats.team_mut(offense).punts += 1;
                let spot = if outcome.touchback {
                    touchback
                } else {
                    (100 - (state.yardline as i32 + outcome.yards)).clamp(1, 99) as u8
                };
                return Some((DriveEnd::Punt, NextPossession::Spot(defense, spot)));
            }
            _ => {}
        }

        drive.plays += 1;
        let team = stats.team_mut(offense);
        team.plays += 1;
        if outcome.kind.is_dropback() {
            team.pass_plays += 1;
        }
        if state.down == 4 {
            team.fourth_down_attempts += 1;
        }

        if outcome.kind == PlayKind::Interception {
            team.interceptions_thrown += 1;
            let catch = state.yardline as i32 + outcome.yards;
            if catch >= 100 {
                return Some((DriveEnd::Interception, NextPossession::Spot(defense, touchback)));
            }
            let return_spot = 100 - catch + outcome.return_yards;
            if return_spot >= 100 {
                self.score_touchdown(plays, defense, state, rng, &mut drive.defense_points);
                stats.team_mut(defense).defensive_touchdowns += 1;
                return Some((DriveEnd::Interception, NextPossession::Kickoff(offense)));
            }
            return Some((
                DriveEnd::Interception,
                NextPossession::Spot(defense, return_spot.max(1) as u8),
            ));
        }

        if outcome.fumble_lost {
            team.fumbles_lost += 1;
            team.yards += outcome.yards;
            drive.yards += outcome.yards;
            let spot = (state.yardline as i32 + outcome.yards).clamp(0, 100);
            let recovery = 100 - spot;
            if recovery >= 100 {
                self.score_touchdown(plays, defense, state, rng, &mut drive.defense_points);
                stats.team_mut(defense).defensive_touchdowns += 1;
                return Some((DriveEnd::Fumble, NextPossession::Kickoff(offense)));
            }
            return Some((DriveEnd::Fumble, NextPossession::Spot(defense, recovery.max(1) as u8)));
        }

        let before = state.yardline as i32;
        let update = state.advance(outcome.yards);
        let gained = match update {
            SeriesUpdate::TurnoverOnDowns => outcome.yards,
            _ => state.yardline as i32 - before,
        };
        let team = stats.team_mut(offense);
        team.yards += gained;
        if gained >= self.config.game.explosive_yards {
            team.explosive_plays += 1;
        }
        drive.yards += gained;

        match update {
            SeriesUpdate::Touchdown => {
                stats.team_mut(offense).touchdowns += 1;
                self.score_touchdown(plays, offense, state, rng, &mut drive.points);
                Some((DriveEnd::Touchdown, NextPossession::Kickoff(defense)))
            }
            SeriesUpdate::Safety => {
                state.add_points(defense, SAFETY_POINTS);
                drive.defense_points += SAFETY_POINTS;
                Some((DriveEnd::Safety, NextPossession::FreeKick(defense)))
            }
            SeriesUpdate::TurnoverOnDowns => {
                stats.team_mut(offense).turnovers_on_downs += 1;
                Some((
                    DriveEnd::TurnoverOnDowns,
                    NextPossession::Spot(state.possession, state.yardline),
                ))
            }
            SeriesUpdate::FirstDown | SeriesUpdate::NextDown => None,
        }
    }

    fn score_touchdown<R: Rng + ?Sized>(
        &self,
        plays: &PlaySimulator,
        scorer: Side,
        state: &mut GameState,
        rng: &mut R,
        tally: &mut u32,
    ) {
        let points = TOUCHDOWN_POINTS + u32::from(plays.extra_point(rng));
        state.add_points(scorer, points);
        *tally += points;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PlayChoice {
    Scrimmage,
    FieldGoal,
    Punt,
}
