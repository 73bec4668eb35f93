//! Data models for rollsift.

mod key;
mod record;

pub use key::{comparable_name, normalize_name, Keyed, NormalizedKey};
pub use record::{
    CandidateRecord, Category, EnrichedRecord, EnrichmentSource, ScoredRecord, SourceStrategy,
};
