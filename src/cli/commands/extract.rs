//! Extract command: run the whole pipeline over one document.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::mpsc;

use rollsift::config::Config;
use rollsift::document::open_document;
use rollsift::models::SourceStrategy;
use rollsift::ocr::{OcrBackend, TesseractBackend};
use rollsift::output::Summary;
use rollsift::pipeline::{Pipeline, PipelineEvent};

use crate::cli::helpers::{emit_records, load_dataset, print_summary};

#[derive(Args)]
pub struct ExtractArgs {
    /// PDF or text document to read
    document: PathBuf,
    /// Output file (.json, .jsonl or .yaml); prints JSON to stdout when omitted
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Enrichment dataset (overrides config)
    #[arg(short, long)]
    dataset: Option<PathBuf>,
    /// Strategies in preference order, comma separated (e.g. direct_text,ocr)
    #[arg(short, long, value_delimiter = ',')]
    strategies: Vec<String>,
    /// Pages processed concurrently
    #[arg(short, long)]
    workers: Option<usize>,
    /// Only process the first N pages
    #[arg(long)]
    max_pages: Option<usize>,
    /// Number of top records listed in the summary
    #[arg(long, default_value = "10")]
    top: usize,
}

impl ExtractArgs {
    fn apply(&self, config: &mut Config) -> anyhow::Result<()> {
        if !self.strategies.is_empty() {
            config.extraction.strategies = self
                .strategies
                .iter()
                .map(|s| {
                    SourceStrategy::from_str(s).ok_or_else(|| {
                        let known: Vec<_> = SourceStrategy::ALL.iter().map(|k| k.as_str()).collect();
                        anyhow::anyhow!("Unknown strategy '{}' (expected one of {})", s, known.join(", "))
                    })
                })
                .collect::<anyhow::Result<_>>()?;
        }
        if let Some(workers) = self.workers {
            config.workers = workers;
        }
        if self.max_pages.is_some() {
            config.extraction.max_pages = self.max_pages;
        }
        config.validate()?;
        Ok(())
    }
}

pub async fn cmd_extract(mut config: Config, args: ExtractArgs) -> anyhow::Result<()> {
    args.apply(&mut config)?;

    let path = args.document.clone();
    let doc = tokio::task::spawn_blocking(move || open_document(&path)).await??;

    let backend: Arc<dyn OcrBackend> = Arc::new(TesseractBackend::new());
    if config.extraction.strategies.iter().any(|s| s.uses_ocr()) && !backend.is_available() {
        eprintln!(
            "{} {} OCR strategies will be skipped page by page",
            style("!").yellow(),
            backend.availability_hint()
        );
    }

    // A dataset given on the command line is relative to the working directory
    let dataset_path = args.dataset.clone().or_else(|| config.dataset_path());
    let dataset = load_dataset(dataset_path).await?;
    let pipeline = Pipeline::new(&config, backend, dataset.as_ref())?;

    eprintln!(
        "{} Extracting {} ({} pages, {} workers)",
        style("→").cyan(),
        args.document.display(),
        doc.page_count(),
        config.workers
    );

    // Create event channel for progress tracking
    let (event_tx, mut event_rx) = mpsc::channel::<PipelineEvent>(100);

    // Spawn event handler for UI
    let event_handler = tokio::spawn(async move {
        let mut pb: Option<ProgressBar> = None;
        while let Some(event) = event_rx.recv().await {
            match event {
                PipelineEvent::RunStarted {
                    total_pages,
                    strategies,
                } => {
                    let progress = ProgressBar::new(total_pages as u64);
                    progress.set_style(
                        ProgressStyle::default_bar()
                            .template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {wide_msg}")
                            .unwrap_or_else(|_| ProgressStyle::default_bar())
                            .progress_chars("█▓░"),
                    );
                    progress.set_message(strategies.join(", "));
                    pb = Some(progress);
                }
                PipelineEvent::PageStarted { page } => {
                    if let Some(ref progress) = pb {
                        progress.set_message(format!("page {}", page));
                    }
                }
                PipelineEvent::PageCompleted { .. } => {
                    if let Some(ref progress) = pb {
                        progress.inc(1);
                    }
                }
                PipelineEvent::PageFailed {
                    page,
                    strategy,
                    error,
                } => {
                    if let Some(ref progress) = pb {
                        progress.println(format!(
                            "{} page {} ({}): {}",
                            style("✗").red(),
                            page,
                            strategy,
                            error
                        ));
                    }
                }
                PipelineEvent::ExtractionComplete {
                    readable_pages,
                    failed_pages,
                    candidates,
                } => {
                    if let Some(progress) = pb.take() {
                        progress.finish_and_clear();
                    }
                    eprintln!(
                        "{} Read {} pages, {} candidates ({} pages had failures)",
                        style("✓").green(),
                        readable_pages,
                        candidates,
                        failed_pages
                    );
                }
                PipelineEvent::DedupComplete { before, after } => {
                    eprintln!("  {} {} unique of {}", style("→").dim(), after, before);
                }
                PipelineEvent::EnrichmentComplete { matched, unmatched } => {
                    eprintln!(
                        "  {} {} matched, {} unmatched",
                        style("→").dim(),
                        matched,
                        unmatched
                    );
                }
                PipelineEvent::ScoringComplete { records } => {
                    eprintln!("{} Scored {} records", style("✓").green(), records);
                }
            }
        }
        if let Some(progress) = pb {
            progress.finish_and_clear();
        }
    });

    let result = pipeline.run(doc, event_tx).await;

    // Wait for event handler to finish
    let _ = event_handler.await;

    let output = result?;
    let summary = Summary::new(&output.records, args.top).with_pages(output.stats);
    print_summary(&summary);
    emit_records(args.output.as_deref(), summary, output.records).await
}
