//! # gridiron_core - Play-by-play NFL Monte Carlo Engine
//!
//! Simulates NFL games snap by snap from two teams' capability profiles,
//! runs batches of independent trials, centers the score distribution on a
//! market line and turns the simulator's disagreement with the market into
//! calibrated bet probabilities.
//!
//! ## Features
//! - Deterministic: same inputs and seed give the same batch, whatever the
//!   thread count
//! - Parallel batches on rayon with per-trial panic isolation and cancellation
//! - Shape-preserving market centering, isotonic/Platt calibration
//! - Versioned, fingerprinted configuration holding every model constant
//! - JSON API for external drivers

// Allow unused code for features under development
#![allow(dead_code)]
// Doc formatting lints - purely cosmetic, fix incrementally
#![allow(clippy::doc_lazy_continuation)]
// Struct initialization pattern used intentionally
#![allow(clippy::field_reassign_with_default)]
// Simulation entry points take several independent inputs
#![allow(clippy::too_many_arguments)]

pub mod api;
pub mod calibration;
pub mod config;
pub mod engine;
pub mod error;
pub mod market;
pub mod team;
pub mod trace;

// Re-export main API functions
pub use api::{
    run_matchup, simulate_matchup_json, simulate_matchup_json_with_trace, BatchReport, Matchup,
    MatchupRequest,
};
pub use error::{CalibrationFitError, Result, SimError};

pub use calibration::{calibrate, CalibrationSet, FittedCalibration, SideProbabilities};
pub use config::SimConfig;
pub use engine::{
    BatchOptions, GameResult, GameSimulator, GameState, PlaySimulator, SimulationBatch, TrialResult,
};
pub use market::{EdgeAssessment, MarketLine};
pub use team::{CapabilityResolver, CapabilitySource, ResolvedCapability, TeamCapability};
pub use trace::{JsonLinesSink, MemorySink, NullSink, TraceEvent, TraceSink};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
