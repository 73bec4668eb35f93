//! Enrich and score commands over existing records files.

use std::path::Path;
use std::sync::Arc;

use console::style;

use rollsift::config::Config;
use rollsift::models::{CandidateRecord, EnrichedRecord};
use rollsift::ocr::TesseractBackend;
use rollsift::output::{read_records, Summary};
use rollsift::pipeline::Pipeline;

use crate::cli::helpers::{emit_records, load_dataset, print_summary};

pub async fn cmd_enrich(
    config: &Config,
    records: &Path,
    dataset: &Path,
    output: Option<&Path>,
    top: usize,
) -> anyhow::Result<()> {
    let candidates: Vec<CandidateRecord> = read_records(records).await?;
    eprintln!(
        "{} Read {} records from {}",
        style("→").cyan(),
        candidates.len(),
        records.display()
    );

    let dataset = load_dataset(Some(dataset.to_path_buf())).await?;
    // OCR is never invoked here; the pipeline only needs a backend to build.
    let pipeline = Pipeline::new(config, Arc::new(TesseractBackend::new()), dataset.as_ref())?;

    let enriched = pipeline.enrich(candidates);
    let scored = pipeline.score(enriched);

    let summary = Summary::new(&scored, top);
    print_summary(&summary);
    emit_records(output, summary, scored).await
}

pub async fn cmd_score(
    config: &Config,
    records: &Path,
    output: Option<&Path>,
    top: usize,
) -> anyhow::Result<()> {
    let enriched: Vec<EnrichedRecord> = read_records(records).await?;
    eprintln!(
        "{} Scoring {} records from {}",
        style("→").cyan(),
        enriched.len(),
        records.display()
    );

    let pipeline = Pipeline::new(config, Arc::new(TesseractBackend::new()), None)?;
    let scored = pipeline.score(enriched);

    let summary = Summary::new(&scored, top);
    print_summary(&summary);
    emit_records(output, summary, scored).await
}
