//! Team capabilities consumed by the play model, and the source chain that resolves them.

mod buckets;
mod capability;
mod source;

pub use buckets::{DistanceBucket, FieldZone, ScoreBucket, TimeBucket};
pub use capability::{
    CapabilityField, PassRateEntry, PassRateKey, PassRateTable, QbSplit, SituationalFactors,
    TeamCapability, LEAGUE_NEUTRAL_PASS_RATE,
};
pub use source::{
    CapabilityResolver, CapabilitySource, InMemorySource, PartialCapability, Provenance,
    ResolvedCapability,
};
