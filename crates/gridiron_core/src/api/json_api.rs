//! JSON request/response API
//!
//! Request:
//! ```json
//! {
//!   "schema_version": 1,
//!   "season": 2024, "week": 5,
//!   "home": { "name": "KC", "values": { "off_epa_per_play": 0.12 } },
//!   "away": { "name": "BUF" },
//!   "market": { "spread": -3.0, "total": 45.0 },
//!   "seed": 42, "trials": 1000
//! }
//! ```
//! Optional `config` (a full or partial [`SimConfig`]) and `calibration`
//! (a [`CalibrationSet`] from the offline builder). Fields a team omits take
//! league-average defaults and are listed in the report.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::report::{run_matchup, BatchReport, Matchup};
use crate::calibration::CalibrationSet;
use crate::config::SimConfig;
use crate::engine::BatchOptions;
use crate::market::MarketLine;
use crate::team::{CapabilityField, CapabilityResolver, InMemorySource, PartialCapability, PassRateTable};
use crate::trace::{MemorySink, NullSink, TraceSink};

pub const SCHEMA_VERSION: u32 = 1;
pub const MAX_TRIALS: usize = 1_000_000;
const REQUEST_SOURCE: &str = "request";

fn default_trials() -> usize {
    10_000
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamInput {
    pub name: String,
    #[serde(default)]
    pub values: BTreeMap<CapabilityField, f64>,
    #[serde(default)]
    pub pass_rates: Option<PassRateTable>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchupRequest {
    pub schema_version: u32,
    #[serde(default)]
    pub season: u16,
    #[serde(default)]
    pub week: u8,
    pub home: TeamInput,
    pub away: TeamInput,
    pub market: MarketLine,
    pub seed: u64,
    #[serde(default = "default_trials")]
    pub trials: usize,
    #[serde(default)]
    pub config: Option<SimConfig>,
    #[serde(default)]
    pub calibration: Option<CalibrationSet>,
}

fn partial(team: TeamInput) -> PartialCapability {
    PartialCapability {
        values: team.values,
        pass_rates: team.pass_rates,
    }
}

fn run_request(request: MatchupRequest, sink: &dyn TraceSink) -> Result<BatchReport, String> {
    if request.schema_version != SCHEMA_VERSION {
        return Err(format!("Unsupported schema version: {}", request.schema_version));
    }
    if request.trials == 0 || request.trials > MAX_TRIALS {
        return Err(format!("trials must be in 1..={MAX_TRIALS}, got {}", request.trials));
    }
    if request.home.name == request.away.name {
        return Err(format!("home and away are the same team: {}", request.home.name));
    }

    let config = request.config.unwrap_or_default();
    config
        .validate()
        .map_err(|e| format!("Invalid config: {e}"))?;
    let calibration = request
        .calibration
        .unwrap_or_else(|| CalibrationSet::uncalibrated(&config.calibration));

    let (season, week) = (request.season, request.week);
    let home_name = request.home.name.clone();
    let away_name = request.away.name.clone();
    let source = InMemorySource::new(REQUEST_SOURCE)
        .with_entry(&home_name, season, week, partial(request.home))
        .with_entry(&away_name, season, week, partial(request.away));
    let resolver = CapabilityResolver::new().with_source(source);
    let home = resolver.resolve(&home_name, season, week);
    let away = resolver.resolve(&away_name, season, week);

    let matchup = Matchup {
        home: &home,
        away: &away,
        market: request.market,
    };
    run_matchup(
        &matchup,
        &config,
        &calibration,
        &BatchOptions::new(request.trials, request.seed),
        sink,
    )
    .map_err(|e| format!("Simulation failed: {e}"))
}

/// Main entry point for the JSON API: simulate a matchup from a JSON request.
pub fn simulate_matchup_json(request_json: &str) -> Result<String, String> {
    let request: MatchupRequest =
        serde_json::from_str(request_json).map_err(|e| format!("Invalid JSON request: {}", e))?;
    let report = run_request(request, &NullSink)?;
    serde_json::to_string(&report).map_err(|e| format!("Failed to serialize report: {}", e))
}

/// JSON API with the trace stream. Returns (report_json, trace_json).
pub fn simulate_matchup_json_with_trace(request_json: &str) -> Result<(String, String), String> {
    let request: MatchupRequest =
        serde_json::from_str(request_json).map_err(|e| format!("Invalid JSON request: {}", e))?;
    let sink = MemorySink::new();
    let report = run_request(request, &sink)?;
    let report_json =
        serde_json::to_string(&report).map_err(|e| format!("Failed to serialize report: {}", e))?;
    let trace_json =
        serde_json::to_string(&sink.events()).map_err(|e| format!("Failed to serialize trace: {}", e))?;
    Ok((report_json, trace_json))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::TraceEvent;

    fn request(trials: usize) -> String {
        serde_json::json!({
            "schema_version": 1,
            "season": 2024,
            "week": 5,
            "home": { "name": "KC", "values": { "off_epa_per_play": 0.12, "pace_seconds_per_play": 30.0 } },
            "away": { "name": "BUF" },
            "market": { "spread": -3.0, "total": 45.0 },
            "seed": 42,
            "trials": trials,
        })
        .to_string()
    }

    #[test]
    fn test_simulate_matchup_json() {
        let response = simulate_matchup_json(&request(100)).unwrap();
        let report: BatchReport = serde_json::from_str(&response).unwrap();
        assert_eq!(report.home_team, "KC");
        assert_eq!(report.completed, 100);
        assert!((report.centered.margin.mean - 3.0).abs() < 1e-6);
        assert!(report
            .defaulted_inputs
            .iter()
            .any(|d| d.team == "BUF" && d.field == "off_epa_per_play"));
        assert!(!report
            .defaulted_inputs
            .iter()
            .any(|d| d.team == "KC" && d.field == "pace_seconds_per_play"));
    }

    #[test]
    fn test_json_api_is_deterministic() {
        assert_eq!(
            simulate_matchup_json(&request(50)).unwrap(),
            simulate_matchup_json(&request(50)).unwrap()
        );
    }

    #[test]
    fn test_trace_stream() {
        let (_, trace) = simulate_matchup_json_with_trace(&request(10)).unwrap();
        let events: Vec<TraceEvent> = serde_json::from_str(&trace).unwrap();
        assert_eq!(events.first().map(|e| e.kind.as_str()), Some("inputs.audit"));
        assert_eq!(events.iter().filter(|e| e.kind == "game.start").count(), 10);
        assert!(events.iter().any(|e| e.kind == "drive.summary"));
        assert_eq!(events.last().map(|e| e.kind.as_str()), Some("batch.summary"));
    }

    #[test]
    fn test_rejected_requests() {
        assert!(simulate_matchup_json("{").unwrap_err().starts_with("Invalid JSON request"));

        let mut bad: serde_json::Value = serde_json::from_str(&request(10)).unwrap();
        bad["schema_version"] = 2.into();
        assert!(simulate_matchup_json(&bad.to_string())
            .unwrap_err()
            .contains("schema version"));

        let mut bad: serde_json::Value = serde_json::from_str(&request(10)).unwrap();
        bad["trials"] = 0.into();
        assert!(simulate_matchup_json(&bad.to_string()).is_err());

        let mut bad: serde_json::Value = serde_json::from_str(&request(10)).unwrap();
        bad["market"]["total"] = 1.0.into();
        assert!(simulate_matchup_json(&bad.to_string())
            .unwrap_err()
            .starts_with("Simulation failed"));

        let mut bad: serde_json::Value = serde_json::from_str(&request(10)).unwrap();
        bad["config"] = serde_json::json!({ "edge": { "low_edge": 0.5 } });
        assert!(simulate_matchup_json(&bad.to_string())
            .unwrap_err()
            .starts_with("Invalid config"));
    }
}
