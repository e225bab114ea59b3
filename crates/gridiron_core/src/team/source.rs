//! Capability source chain
//!
//! A [`CapabilityResolver`] asks each source, in priority order, for a
//! partial capability and resolves every field independently: the first
//! source that supplies a usable value wins, and a field nobody supplies
//! takes its league-average default. Each field records where it came from.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, warn};

use super::capability::{CapabilityField, PassRateTable, TeamCapability};
use crate::error::{Result, SimError};

/// Subset of a team's capability as known to one source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PartialCapability {
    pub values: BTreeMap<CapabilityField, f64>,
    pub pass_rates: Option<PassRateTable>,
}

impl PartialCapability {
    pub fn with(mut self, field: CapabilityField, value: f64) -> Self {
        self.values.insert(field, value);
        self
    }

    pub fn with_pass_rates(mut self, table: PassRateTable) -> Self {
        self.pass_rates = Some(table);
        self
    }

    /// Every field of a complete capability.
    pub fn from_capability(cap: &TeamCapability) -> Self {
        let values = CapabilityField::ALL
            .iter()
            .map(|&f| (f, cap.field(f)))
            .collect();
        Self {
            values,
            pass_rates: Some(cap.pass_rates.clone()),
        }
    }
}

/// Named provider of team capabilities for a (team, season, week).
pub trait CapabilitySource: Send + Sync {
    fn name(&self) -> &str;

    fn fetch(&self, team: &str, season: u16, week: u8) -> Option<PartialCapability>;
}

/// Source backed by a map, keyed by (team, season, week).
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    name: String,
    entries: HashMap<(String, u16, u8), PartialCapability>,
}

impl InMemorySource {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: HashMap::new(),
        }
    }

    pub fn insert(&mut self, team: &str, season: u16, week: u8, partial: PartialCapability) {
        self.entries
            .insert((team.to_string(), season, week), partial);
    }

    pub fn with_entry(mut self, team: &str, season: u16, week: u8, partial: PartialCapability) -> Self {
        self.insert(team, season, week, partial);
        self
    }
}

impl CapabilitySource for InMemorySource {
    fn name(&self) -> &str {
        &self.name
    }

    fn fetch(&self, team: &str, season: u16, week: u8) -> Option<PartialCapability> {
        self.entries
            .get(&(team.to_string(), season, week))
            .cloned()
    }
}

/// Where a resolved field came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Provenance {
    Observed { source: String },
    Defaulted { reason: String },
}

impl Provenance {
    pub fn is_defaulted(&self) -> bool {
        matches!(self, Provenance::Defaulted { .. })
    }
}

/// A complete capability plus the provenance of every field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedCapability {
    pub capability: TeamCapability,
    pub provenance: BTreeMap<CapabilityField, Provenance>,
    pub pass_rates: Provenance,
}

impl ResolvedCapability {
    /// Every field observed from one named source.
    pub fn observed(capability: TeamCapability, source: &str) -> Self {
        let observed = || Provenance::Observed {
            source: source.to_string(),
        };
        Self {
            provenance: CapabilityField::ALL.iter().map(|&f| (f, observed())).collect(),
            pass_rates: observed(),
            capability,
        }
    }

    pub fn team(&self) -> &str {
        &self.capability.name
    }

    pub fn defaulted_fields(&self) -> Vec<CapabilityField> {
        self.provenance
            .iter()
            .filter(|(_, p)| p.is_defaulted())
            .map(|(&f, _)| f)
            .collect()
    }

    pub fn is_fully_observed(&self) -> bool {
        self.defaulted_fields().is_empty() && !self.pass_rates.is_defaulted()
    }

    /// The capability, or [`SimError::MissingCapability`] for the first defaulted field.
    pub fn require_observed(&self) -> Result<&TeamCapability> {
        for (field, prov) in &self.provenance {
            if let Provenance::Defaulted { reason } = prov {
                return Err(SimError::MissingCapability {
                    team: self.team().to_string(),
                    field: field.name().to_string(),
                    reason: reason.clone(),
                });
            }
        }
        if let Provenance::Defaulted { reason } = &self.pass_rates {
            return Err(SimError::MissingCapability {
                team: self.team().to_string(),
                field: "pass_rates".to_string(),
                reason: reason.clone(),
            });
        }
        Ok(&self.capability)
    }

    /// Payload for the `inputs.audit` trace event.
    pub fn audit_payload(&self) -> serde_json::Value {
        let defaulted: Vec<&str> = self.defaulted_fields().iter().map(|f| f.name()).collect();
        serde_json::json!({
            "team": self.team(),
            "defaulted": defaulted,
            "pass_rates": self.pass_rates,
            "provenance": self.provenance,
        })
    }
}

/// Ordered chain of capability sources, highest priority first.
#[derive(Default)]
pub struct CapabilityResolver {
    sources: Vec<Box<dyn CapabilitySource>>,
}

impl CapabilityResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_source(mut self, source: impl CapabilitySource + 'static) -> Self {
        self.sources.push(Box::new(source));
        self
    }

    pub fn push(&mut self, source: Box<dyn CapabilitySource>) {
        self.sources.push(source);
    }

    pub fn source_names(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    pub fn resolve(&self, team: &str, season: u16, week: u8) -> ResolvedCapability {
        let fetched: Vec<(&str, PartialCapability)> = self
            .sources
            .iter()
            .filter_map(|s| s.fetch(team, season, week).map(|p| (s.name(), p)))
            .collect();

        let mut capability = TeamCapability::league_average(team);
        let mut provenance = BTreeMap::new();

        for field in CapabilityField::ALL {
            let mut rejected: Vec<&str> = Vec::new();
            let mut chosen = None;
            for (source, partial) in &fetched {
                let Some(&value) = partial.values.get(&field) else {
                    continue;
                };
                if field.accepts(value) {
                    chosen = Some((*source, value));
                    break;
                }
                warn!(team, source, field = field.name(), value, "rejecting out-of-range capability value");
                rejected.push(*source);
            }

            let prov = match chosen {
                Some((source, value)) => {
                    capability.set_field(field, value);
                    Provenance::Observed {
                        source: source.to_string(),
                    }
                }
                None if rejected.is_empty() => Provenance::Defaulted {
                    reason: "no source provided a value; league average".to_string(),
                },
                None => Provenance::Defaulted {
                    reason: format!(
                        "out-of-range value from {}; league average",
                        rejected.join(", ")
                    ),
                },
            };
            provenance.insert(field, prov);
        }

        let pass_rates = match fetched
            .iter()
            .find_map(|(source, p)| p.pass_rates.as_ref().map(|t| (*source, t)))
        {
            Some((source, table)) => {
                capability.pass_rates = table.clone();
                Provenance::Observed {
                    source: source.to_string(),
                }
            }
            None => Provenance::Defaulted {
                reason: "no situational pass rates; league prior".to_string(),
            },
        };

        let resolved = ResolvedCapability {
            capability,
            provenance,
            pass_rates,
        };
        let defaulted = resolved.defaulted_fields();
        if defaulted.is_empty() {
            debug!(team, season, week, "capability fully observed");
        } else {
            let names: Vec<&str> = defaulted.iter().map(|f| f.name()).collect();
            warn!(team, season, week, count = names.len(), fields = ?names, "capability fields defaulted to league average");
        }
        resolved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::team::{DistanceBucket, ScoreBucket, TimeBucket};

    fn resolver() -> CapabilityResolver {
        let primary = InMemorySource::new("pff").with_entry(
            "KC",
            2024,
            5,
            PartialCapability::default()
                .with(CapabilityField::PassBlockGrade, 78.0)
                .with(CapabilityField::FgMakePct, 1.7),
        );
        let secondary = InMemorySource::new("nflverse").with_entry(
            "KC",
            2024,
            5,
            PartialCapability::default()
                .with(CapabilityField::PassBlockGrade, 60.0)
                .with(CapabilityField::OffEpaPerPlay, 0.12)
                .with(CapabilityField::FgMakePct, 0.91),
        );
        CapabilityResolver::new()
            .with_source(primary)
            .with_source(secondary)
    }

    #[test]
    fn test_highest_priority_source_wins() {
        let resolved = resolver().resolve("KC", 2024, 5);
        assert_eq!(resolved.capability.pass_block_grade, 78.0);
        assert_eq!(resolved.capability.off_epa_per_play, 0.12);
        assert_eq!(
            resolved.provenance[&CapabilityField::PassBlockGrade],
            Provenance::Observed { source: "pff".to_string() }
        );
        assert_eq!(
            resolved.provenance[&CapabilityField::OffEpaPerPlay],
            Provenance::Observed { source: "nflverse".to_string() }
        );
    }

    #[test]
    fn test_out_of_range_value_falls_through() {
        let resolved = resolver().resolve("KC", 2024, 5);
        assert_eq!(resolved.capability.fg_make_pct, 0.91);
        assert_eq!(
            resolved.provenance[&CapabilityField::FgMakePct],
            Provenance::Observed { source: "nflverse".to_string() }
        );
    }

    #[test]
    fn test_missing_fields_are_defaulted_and_flagged() {
        let resolved = resolver().resolve("KC", 2024, 5);
        assert!(resolved.provenance[&CapabilityField::PuntNetYards].is_defaulted());
        assert_eq!(resolved.capability.punt_net_yards, 41.0);
        assert!(resolved.pass_rates.is_defaulted());
        assert_eq!(
            resolved.defaulted_fields().len(),
            CapabilityField::ALL.len() - 3
        );

        let err = resolved.require_observed().unwrap_err();
        assert!(matches!(err, SimError::MissingCapability { ref team, .. } if team == "KC"));
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_unknown_team_is_league_average() {
        let resolved = resolver().resolve("BUF", 2024, 5);
        assert_eq!(resolved.defaulted_fields().len(), CapabilityField::ALL.len());
        assert_eq!(resolved.capability, TeamCapability::league_average("BUF"));
    }

    #[test]
    fn test_fully_observed_capability() {
        let mut cap = TeamCapability::league_average("SF");
        cap.pass_rates.insert(1, DistanceBucket::Long, ScoreBucket::Tied, TimeBucket::FirstHalf, 0.52);
        cap.pace_seconds_per_play = 33.0;
        let source =
            InMemorySource::new("snapshot").with_entry("SF", 2024, 1, PartialCapability::from_capability(&cap));
        let resolved = CapabilityResolver::new().with_source(source).resolve("SF", 2024, 1);
        assert!(resolved.is_fully_observed());
        assert_eq!(resolved.require_observed().unwrap(), &cap);
        assert_eq!(resolved.audit_payload()["defaulted"].as_array().unwrap().len(), 0);
    }
}
