pub mod json_api;
pub mod report;

pub use json_api::{
    simulate_matchup_json, simulate_matchup_json_with_trace, MatchupRequest, TeamInput, MAX_TRIALS,
    SCHEMA_VERSION,
};
pub use report::{
    run_matchup, BatchReport, CalibratedProbabilities, CenteringSummary, DefaultedInput,
    EmpiricalRates, Matchup, ScoreArrays,
};
