//! Deterministic tech score and business-size category.

use crate::config::ScoringConfig;
use crate::enrich::{is_valid_email, site_host, DomainPolicy};
use crate::models::{Category, EnrichedRecord, ScoredRecord};

/// Upper bound of a tech score.
pub const MAX_SCORE: u8 = 100;

/// Scores enriched records with configurable weights and thresholds.
#[derive(Debug, Clone)]
pub struct Scorer {
    config: ScoringConfig,
    domains: DomainPolicy,
}

impl Scorer {
    pub fn new(config: ScoringConfig, domains: DomainPolicy) -> Self {
        Self { config, domains }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Compute `(tech_score, category)` for a record.
    ///
    /// Email points follow the address itself; a stored corporate flag is
    /// not trusted since records can come from files.
    pub fn score(&self, record: &EnrichedRecord) -> (u8, Category) {
        let w = &self.config.weights;
        let mut total: u32 = 0;

        let usable_site = record.site().and_then(site_host).is_some();
        if usable_site {
            total += w.site;
        }
        if record.site().and_then(|s| self.domains.business_host(s)).is_some() {
            total += w.business_site;
        }
        if record.email().is_some_and(is_valid_email) {
            total += w.email;
        }
        if self.is_corporate(record) {
            total += w.corporate_email;
        }
        if record.phone().is_some() {
            total += w.phone;
        }
        if record.registration().is_some() {
            total += w.registration;
        }

        let score = total.min(MAX_SCORE as u32) as u8;
        (score, self.categorize(score, usable_site))
    }

    fn is_corporate(&self, record: &EnrichedRecord) -> bool {
        record
            .email()
            .is_some_and(|e| self.domains.is_corporate_email(e))
    }

    /// First match wins: no usable site, then large, then medium, then small.
    pub fn categorize(&self, score: u8, has_usable_site: bool) -> Category {
        if !has_usable_site {
            Category::Offline
        } else if score > self.config.large_above {
            Category::Large
        } else if score >= self.config.medium_min {
            Category::Medium
        } else {
            Category::Small
        }
    }

    /// Build the terminal record. A site that does not parse is dropped so
    /// offline records never carry one.
    pub fn score_record(&self, record: EnrichedRecord) -> ScoredRecord {
        let (score, category) = self.score(&record);
        let corporate = self.is_corporate(&record);
        let record = record.with_email_is_corporate(corporate);
        let record = if category == Category::Offline && record.site().is_some() {
            tracing::debug!("Dropping unusable site {:?} for {}", record.site(), record.name());
            record.without_site()
        } else {
            record
        };
        ScoredRecord::new(record, score, category)
    }

    pub fn score_all(&self, records: Vec<EnrichedRecord>) -> Vec<ScoredRecord> {
        records.into_iter().map(|r| self.score_record(r)).collect()
    }
}
