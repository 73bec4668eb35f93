//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod check;
mod classify;
mod extract;
mod records;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use rollsift::config::Config;

pub use extract::ExtractArgs;

#[derive(Parser)]
#[command(name = "rollsift")]
#[command(about = "Turn registry rolls into scored contact records")]
#[command(version)]
pub struct Cli {
    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Extract, enrich and score records from a PDF or text document
    Extract(ExtractArgs),

    /// Enrich an existing records file against a dataset, then score it
    Enrich {
        /// Records file (.json, .jsonl or .yaml)
        records: PathBuf,
        /// Enrichment dataset (JSON array or JSON Lines)
        #[arg(short, long)]
        dataset: PathBuf,
        /// Output file; prints JSON to stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Number of top records listed in the summary
        #[arg(long, default_value = "10")]
        top: usize,
    },

    /// Re-score an existing records file
    Score {
        /// Records file (.json, .jsonl or .yaml)
        records: PathBuf,
        /// Output file; prints JSON to stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Number of top records listed in the summary
        #[arg(long, default_value = "10")]
        top: usize,
    },

    /// Show how the noise classifier and assembler treat each line
    Classify {
        /// Lines to classify
        #[arg(required = true)]
        lines: Vec<String>,
    },

    /// Check that poppler and tesseract are installed
    Check,
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match cli.config {
        Some(ref path) => Config::load_from_path(path).await?,
        None => Config::load().await,
    };
    if let Some(path) = &config.source_path {
        tracing::info!("Using config {}", path.display());
    }

    match cli.command {
        Commands::Extract(args) => extract::cmd_extract(config, args).await,
        Commands::Enrich {
            records,
            dataset,
            output,
            top,
        } => records::cmd_enrich(&config, &records, &dataset, output.as_deref(), top).await,
        Commands::Score {
            records,
            output,
            top,
        } => records::cmd_score(&config, &records, output.as_deref(), top).await,
        Commands::Classify { lines } => classify::cmd_classify(&config, &lines),
        Commands::Check => check::cmd_check(&config).await,
    }
}
