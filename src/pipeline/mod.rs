//! Extraction pipeline.
//!
//! Wires strategies, deduplication, enrichment and scoring together. Pages
//! are processed on a bounded pool of blocking workers; results are merged
//! in strategy preference order once every page is done. Progress goes out
//! as [`PipelineEvent`]s; the pipeline itself never prints.

mod events;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;

pub use events::PipelineEvent;

use crate::classify::NoiseClassifier;
use crate::config::{Config, ConfigError};
use crate::dedup::dedup;
use crate::document::Document;
use crate::enrich::{Dataset, Enricher};
use crate::extraction::{build_strategies, page_number, ExtractionStrategy};
use crate::models::{CandidateRecord, EnrichedRecord, EnrichmentSource, ScoredRecord};
use crate::ocr::{OcrBackend, TextRecognizer};
use crate::scoring::Scorer;

/// Errors that stop a run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Document is unreadable: {0}")]
    Unreadable(String),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Deduplicated candidates plus page counts from the extraction stage.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub candidates: Vec<CandidateRecord>,
    pub total_pages: usize,
    pub readable_pages: usize,
    pub failed_pages: usize,
}

/// Page counts carried into the run summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    pub total_pages: usize,
    pub readable_pages: usize,
    pub failed_pages: usize,
    pub candidates: usize,
}

/// Result of a full run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub stats: RunStats,
    pub records: Vec<ScoredRecord>,
}

/// Candidates one strategy produced on one page.
struct StrategyOutput {
    rank: usize,
    page: u32,
    candidates: Vec<CandidateRecord>,
}

struct PageOutcome {
    outputs: Vec<StrategyOutput>,
    chars_read: usize,
    failed: bool,
}

pub struct Pipeline {
    strategies: Arc<Vec<Box<dyn ExtractionStrategy>>>,
    enricher: Enricher,
    scorer: Scorer,
    workers: usize,
    max_pages: Option<usize>,
}

impl Pipeline {
    pub fn new(
        config: &Config,
        backend: Arc<dyn OcrBackend>,
        dataset: Option<&Dataset>,
    ) -> Result<Self, PipelineError> {
        config.validate()?;

        let classifier = Arc::new(NoiseClassifier::new(&config.noise)?);
        let recognizer = TextRecognizer::new(
            backend,
            config.extraction.language.clone(),
            config.extraction.min_ocr_chars,
        );
        let strategies = build_strategies(&config.extraction, classifier, recognizer);
        let enricher = Enricher::new(&config.enrichment, dataset);
        let scorer = Scorer::new(config.scoring, enricher.domains().clone());

        Ok(Self {
            strategies: Arc::new(strategies),
            enricher,
            scorer,
            workers: config.workers.max(1),
            max_pages: config.extraction.max_pages,
        })
    }

    pub fn enricher(&self) -> &Enricher {
        &self.enricher
    }

    pub fn scorer(&self) -> &Scorer {
        &self.scorer
    }

    /// Run every configured strategy over every page and deduplicate.
    pub async fn extract(
        &self,
        doc: Arc<dyn Document>,
        event_tx: mpsc::Sender<PipelineEvent>,
    ) -> Result<Extraction, PipelineError> {
        let page_count = doc.page_count();
        if page_count == 0 {
            return Err(PipelineError::Unreadable("document has no pages".into()));
        }
        let total_pages = match self.max_pages {
            Some(limit) if limit < page_count => {
                tracing::info!("Limiting run to {} of {} pages", limit, page_count);
                limit
            }
            _ => page_count,
        };

        let _ = event_tx
            .send(PipelineEvent::RunStarted {
                total_pages,
                strategies: self
                    .strategies
                    .iter()
                    .map(|s| s.kind().as_str().to_string())
                    .collect(),
            })
            .await;

        let readable = Arc::new(AtomicUsize::new(0));
        let failed = Arc::new(AtomicUsize::new(0));
        let mut outputs: Vec<StrategyOutput> = Vec::new();
        let mut handles = Vec::with_capacity(total_pages.min(self.workers));

        for index in 0..total_pages {
            let doc = doc.clone();
            let strategies = self.strategies.clone();
            let page_readable = readable.clone();
            let page_failed = failed.clone();
            let event_tx = event_tx.clone();

            let handle = tokio::task::spawn_blocking(move || {
                let page = page_number(index);
                let _ = futures::executor::block_on(event_tx.send(PipelineEvent::PageStarted { page }));

                let outcome = process_page(doc.as_ref(), index, &strategies, &event_tx);
                if outcome.chars_read > 0 {
                    page_readable.fetch_add(1, Ordering::Relaxed);
                }
                if outcome.failed {
                    page_failed.fetch_add(1, Ordering::Relaxed);
                }

                let candidates = outcome.outputs.iter().map(|o| o.candidates.len()).sum();
                let _ = futures::executor::block_on(
                    event_tx.send(PipelineEvent::PageCompleted { page, candidates }),
                );
                outcome.outputs
            });

            handles.push(handle);

            if handles.len() >= self.workers {
                for h in handles.drain(..) {
                    collect_page(h.await, &mut outputs, &failed);
                }
            }
        }

        for h in handles {
            collect_page(h.await, &mut outputs, &failed);
        }

        let readable_pages = readable.load(Ordering::Relaxed);
        let failed_pages = failed.load(Ordering::Relaxed);
        if readable_pages == 0 {
            return Err(PipelineError::Unreadable(format!(
                "no text could be read from any of {} pages",
                total_pages
            )));
        }

        // Stable sort keeps line order within one strategy's page output.
        outputs.sort_by_key(|o| (o.rank, o.page));
        let raw: Vec<CandidateRecord> = outputs.into_iter().flat_map(|o| o.candidates).collect();
        let before = raw.len();

        let _ = event_tx
            .send(PipelineEvent::ExtractionComplete {
                readable_pages,
                failed_pages,
                candidates: before,
            })
            .await;

        let candidates = dedup(raw);
        tracing::info!(
            "Extracted {} candidates ({} after dedup) from {}/{} readable pages",
            before,
            candidates.len(),
            readable_pages,
            total_pages
        );
        let _ = event_tx
            .send(PipelineEvent::DedupComplete {
                before,
                after: candidates.len(),
            })
            .await;

        Ok(Extraction {
            candidates,
            total_pages,
            readable_pages,
            failed_pages,
        })
    }

    /// Enrich candidates, then deduplicate again since filled emails change
    /// record keys.
    pub fn enrich(&self, candidates: Vec<CandidateRecord>) -> Vec<EnrichedRecord> {
        let enriched = dedup(self.enricher.enrich_all(dedup(candidates)));
        let matched = count_matched(&enriched);
        tracing::info!(
            "Enriched {} records ({} matched, {} unmatched)",
            enriched.len(),
            matched,
            enriched.len() - matched
        );
        enriched
    }

    pub fn score(&self, records: Vec<EnrichedRecord>) -> Vec<ScoredRecord> {
        self.scorer.score_all(dedup(records))
    }

    /// Extract, enrich and score one document.
    pub async fn run(
        &self,
        doc: Arc<dyn Document>,
        event_tx: mpsc::Sender<PipelineEvent>,
    ) -> Result<RunOutput, PipelineError> {
        let extraction = self.extract(doc, event_tx.clone()).await?;
        let stats = RunStats {
            total_pages: extraction.total_pages,
            readable_pages: extraction.readable_pages,
            failed_pages: extraction.failed_pages,
            candidates: extraction.candidates.len(),
        };

        let enriched = self.enrich(extraction.candidates);
        let matched = count_matched(&enriched);
        let _ = event_tx
            .send(PipelineEvent::EnrichmentComplete {
                matched,
                unmatched: enriched.len() - matched,
            })
            .await;

        let records = self.score(enriched);
        let _ = event_tx
            .send(PipelineEvent::ScoringComplete {
                records: records.len(),
            })
            .await;

        Ok(RunOutput { stats, records })
    }
}

/// Run each strategy on one page. Strategy failures are logged and count
/// as zero candidates.
fn process_page(
    doc: &dyn Document,
    index: usize,
    strategies: &[Box<dyn ExtractionStrategy>],
    event_tx: &mpsc::Sender<PipelineEvent>,
) -> PageOutcome {
    let page = page_number(index);
    let mut outcome = PageOutcome {
        outputs: Vec::with_capacity(strategies.len()),
        chars_read: 0,
        failed: false,
    };

    for (rank, strategy) in strategies.iter().enumerate() {
        match strategy.extract(doc, index, None) {
            Ok(extraction) => {
                tracing::debug!(
                    "Page {} {}: {} candidates from {} chars",
                    page,
                    strategy.kind(),
                    extraction.candidates.len(),
                    extraction.chars_read
                );
                outcome.chars_read += extraction.chars_read;
                outcome.outputs.push(StrategyOutput {
                    rank,
                    page,
                    candidates: extraction.candidates,
                });
            }
            Err(e) if e.is_not_applicable() => {
                tracing::debug!("Page {} {} skipped: {}", page, strategy.kind(), e);
            }
            Err(e) => {
                tracing::warn!("Page {} {} failed: {}", page, strategy.kind(), e);
                outcome.failed = true;
                let _ = futures::executor::block_on(event_tx.send(PipelineEvent::PageFailed {
                    page,
                    strategy: strategy.kind().as_str().to_string(),
                    error: e.to_string(),
                }));
            }
        }
    }

    outcome
}

fn count_matched(records: &[EnrichedRecord]) -> usize {
    records
        .iter()
        .filter(|r| r.enrichment_source() == EnrichmentSource::Matched)
        .count()
}

fn collect_page(
    joined: Result<Vec<StrategyOutput>, tokio::task::JoinError>,
    outputs: &mut Vec<StrategyOutput>,
    failed: &AtomicUsize,
) {
    match joined {
        Ok(page_outputs) => outputs.extend(page_outputs),
        Err(e) => {
            tracing::warn!("Page worker did not finish: {}", e);
            failed.fetch_add(1, Ordering::Relaxed);
        }
    }
}
