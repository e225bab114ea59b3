//! Simulation engine: game state, play and game simulators, batch driver.

pub mod fourth_down;
pub mod game_sim;
pub mod game_state;
pub mod monte_carlo;
pub mod play_sim;
pub mod realism;
pub mod seeding;

pub use fourth_down::{
    decide_fourth_down, FourthDownCall, FourthDownDecision, FourthDownRule, FourthDownSituation,
};
pub use game_sim::{DriveEnd, DriveResult, GameResult, GameSimulator, GameStats, TeamGameStats, TrialResult};
pub use game_state::{ClockBoundary, GameState, SeriesUpdate, Side, FINAL_QUARTER, QUARTER_SECONDS};
pub use monte_carlo::{
    BatchOptions, DistributionSummary, FailedTrial, ScoreSummary, SimulationBatch, TailProbabilities,
};
pub use play_sim::{is_desperate, KickoffResult, PlayKind, PlayOutcome, PlaySimulator};
pub use realism::{RealismMetrics, RealismReport, RealismViolation};
pub use seeding::{trial_rng, trial_seed};
