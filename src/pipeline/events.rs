//! Progress events emitted by the pipeline.

/// Events emitted while a document is processed.
#[derive(Debug, Clone)]
pub enum PipelineEvent {
    /// Extraction started
    RunStarted {
        total_pages: usize,
        strategies: Vec<String>,
    },
    /// Page extraction started (1-based page number)
    PageStarted { page: u32 },
    /// Page extraction finished
    PageCompleted { page: u32, candidates: usize },
    /// One strategy failed on a page; the page continues with the others
    PageFailed {
        page: u32,
        strategy: String,
        error: String,
    },
    /// All pages done
    ExtractionComplete {
        readable_pages: usize,
        failed_pages: usize,
        candidates: usize,
    },
    /// Candidates collapsed by normalized key
    DedupComplete { before: usize, after: usize },
    /// Enrichment pass done
    EnrichmentComplete { matched: usize, unmatched: usize },
    /// Records scored
    ScoringComplete { records: usize },
}
