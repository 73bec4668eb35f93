//! Enrichment: fills missing emails and sites from a secondary dataset and
//! derives sites from corporate email domains.

mod dataset;
mod domain;
mod matcher;

use std::sync::Arc;

pub use dataset::{Dataset, DatasetEntry, DatasetError};
pub use domain::{email_domain, is_valid_email, site_host, DomainPolicy};
pub use matcher::{jaccard, EnrichmentIndex, MatchKind};

use crate::config::EnrichmentConfig;
use crate::models::{CandidateRecord, EnrichedRecord, EnrichmentSource};

/// Turns candidates into enriched records.
#[derive(Clone)]
pub struct Enricher {
    index: Arc<EnrichmentIndex>,
    domains: DomainPolicy,
}

impl Enricher {
    pub fn new(config: &EnrichmentConfig, dataset: Option<&Dataset>) -> Self {
        let index = match dataset {
            Some(dataset) => EnrichmentIndex::new(dataset, config.similarity_threshold),
            None => EnrichmentIndex::empty(),
        };
        Self {
            index: Arc::new(index),
            domains: DomainPolicy::new(&config.personal_domains),
        }
    }

    pub fn domains(&self) -> &DomainPolicy {
        &self.domains
    }

    pub fn has_dataset(&self) -> bool {
        !self.index.is_empty()
    }

    /// Enrich one record.
    ///
    /// Only records missing a site or an email are looked up. A match fills
    /// the missing fields from the entry's well-formed email and usable
    /// site; the record is marked matched only when something was copied.
    /// A site still missing afterwards is derived from a corporate email.
    pub fn enrich(&self, record: CandidateRecord) -> EnrichedRecord {
        let site = record.site().and_then(|s| self.domains.clean_site(s));
        let mut record = record.with_site(site);
        let mut source = EnrichmentSource::Unmatched;

        if record.site().is_none() || record.email().is_none() {
            if let Some((entry, kind)) = self.index.find(record.name(), record.email()) {
                tracing::debug!("Matched {:?} to {:?} ({:?})", record.name(), entry.name, kind);
                if record.email().is_none() {
                    let email = entry.email.as_deref().filter(|e| is_valid_email(e));
                    if let Some(email) = email {
                        record = record.with_email(Some(email.trim().to_string()));
                        source = EnrichmentSource::Matched;
                    } else if entry.email.is_some() {
                        tracing::debug!("Ignoring malformed dataset email {:?}", entry.email);
                    }
                }
                if record.site().is_none() {
                    let site = entry.site.as_deref().and_then(|s| self.domains.clean_site(s));
                    if site.is_some() {
                        record = record.with_site(site);
                        source = EnrichmentSource::Matched;
                    }
                }
            }
        }

        if record.site().is_none() {
            let derived = record.email().and_then(|e| self.domains.site_from_email(e));
            record = record.with_site(derived);
        }

        let corporate = record
            .email()
            .is_some_and(|e| self.domains.is_corporate_email(e));
        EnrichedRecord::new(record, corporate, source)
    }

    pub fn enrich_all(&self, records: Vec<CandidateRecord>) -> Vec<EnrichedRecord> {
        records.into_iter().map(|r| self.enrich(r)).collect()
    }
}
