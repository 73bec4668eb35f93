//! Record interchange files.
//!
//! Scored records are written as pretty JSON or YAML inside an [`Envelope`]
//! carrying a generation timestamp and a [`Summary`], or as JSON Lines with
//! one record per line. Readers accept any of these shapes, plus a bare
//! array, so a previous run's output can be fed back to `enrich` or `score`.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{Category, EnrichmentSource, ScoredRecord};
use crate::pipeline::RunStats;

/// Records listed in the summary's top list.
pub const DEFAULT_TOP_RECORDS: usize = 10;

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Unsupported records format: {0} (use .json, .jsonl or .yaml)")]
    UnsupportedFormat(String),

    #[error("Failed to access {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to encode records: {0}")]
    Encode(String),

    #[error("Invalid records file: {0}")]
    Decode(String),

    #[error("Invalid record #{index}: {message}")]
    Record { index: usize, message: String },
}

/// File format, chosen by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    JsonLines,
    Yaml,
}

impl OutputFormat {
    pub fn from_path(path: &Path) -> Result<Self, OutputError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "json" => Ok(Self::Json),
            "jsonl" | "ndjson" => Ok(Self::JsonLines),
            "yaml" | "yml" => Ok(Self::Yaml),
            _ => Err(OutputError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// Short form of a record for the summary's top list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopRecord {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site: Option<String>,
    pub tech_score: u8,
    pub category: Category,
}

/// Run summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub total: usize,
    pub by_category: BTreeMap<Category, usize>,
    pub matched: usize,
    pub unmatched: usize,
    pub with_site: usize,
    /// Mean score over records that have a site.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_score_with_site: Option<f64>,
    pub top: Vec<TopRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pages: Option<RunStats>,
}

impl Summary {
    pub fn new(records: &[ScoredRecord], top_n: usize) -> Self {
        let mut by_category: BTreeMap<Category, usize> =
            Category::ALL.iter().map(|c| (*c, 0)).collect();
        let mut matched = 0;
        let mut with_site = 0;
        let mut site_score_total: u64 = 0;

        for record in records {
            *by_category.entry(record.category()).or_insert(0) += 1;
            if record.enriched().enrichment_source() == EnrichmentSource::Matched {
                matched += 1;
            }
            if record.site().is_some() {
                with_site += 1;
                site_score_total += u64::from(record.tech_score());
            }
        }

        // Stable: equal scores keep record order
        let mut ranked: Vec<&ScoredRecord> = records.iter().collect();
        ranked.sort_by(|a, b| b.tech_score().cmp(&a.tech_score()));
        let top = ranked
            .into_iter()
            .take(top_n)
            .map(|r| TopRecord {
                name: r.name().to_string(),
                site: r.site().map(str::to_string),
                tech_score: r.tech_score(),
                category: r.category(),
            })
            .collect();

        Self {
            total: records.len(),
            by_category,
            matched,
            unmatched: records.len() - matched,
            with_site,
            average_score_with_site: (with_site > 0)
                .then(|| site_score_total as f64 / with_site as f64),
            top,
            pages: None,
        }
    }

    pub fn with_pages(mut self, stats: RunStats) -> Self {
        self.pages = Some(stats);
        self
    }

    pub fn count(&self, category: Category) -> usize {
        self.by_category.get(&category).copied().unwrap_or(0)
    }
}

/// Top-level shape of a JSON or YAML records file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub generated_at: DateTime<Utc>,
    pub summary: Summary,
    pub records: Vec<T>,
}

impl Envelope<ScoredRecord> {
    pub fn new(summary: Summary, records: Vec<ScoredRecord>) -> Self {
        Self {
            generated_at: Utc::now(),
            summary,
            records,
        }
    }
}

fn encode_error(e: impl std::fmt::Display) -> OutputError {
    OutputError::Encode(e.to_string())
}

/// Encode an envelope in the given format.
pub fn encode(envelope: &Envelope<ScoredRecord>, format: OutputFormat) -> Result<String, OutputError> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(envelope)
            .map(|s| s + "\n")
            .map_err(encode_error),
        OutputFormat::Yaml => serde_yaml::to_string(envelope).map_err(encode_error),
        OutputFormat::JsonLines => {
            let mut out = String::new();
            for record in &envelope.records {
                out.push_str(&serde_json::to_string(record).map_err(encode_error)?);
                out.push('\n');
            }
            Ok(out)
        }
    }
}

/// Write an envelope to `path`, format chosen by extension.
pub async fn write_records(path: &Path, envelope: &Envelope<ScoredRecord>) -> Result<(), OutputError> {
    let contents = encode(envelope, OutputFormat::from_path(path)?)?;
    tokio::fs::write(path, contents)
        .await
        .map_err(|source| OutputError::Io {
            path: path.display().to_string(),
            source,
        })?;
    tracing::info!("Wrote {} records to {}", envelope.records.len(), path.display());
    Ok(())
}

/// Read records from an envelope, a bare array or JSON Lines.
pub async fn read_records<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, OutputError> {
    let format = OutputFormat::from_path(path)?;
    let contents = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| OutputError::Io {
            path: path.display().to_string(),
            source,
        })?;
    decode(&contents, format)
}

pub fn decode<T: DeserializeOwned>(contents: &str, format: OutputFormat) -> Result<Vec<T>, OutputError> {
    let values: Vec<serde_json::Value> = match format {
        OutputFormat::JsonLines => contents
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(serde_json::from_str::<serde_json::Value>)
            .collect::<Result<_, _>>()
            .map_err(|e| OutputError::Decode(e.to_string()))?,
        OutputFormat::Json => {
            let value: serde_json::Value =
                serde_json::from_str(contents).map_err(|e| OutputError::Decode(e.to_string()))?;
            record_values(value)?
        }
        OutputFormat::Yaml => {
            let value: serde_json::Value =
                serde_yaml::from_str(contents).map_err(|e| OutputError::Decode(e.to_string()))?;
            record_values(value)?
        }
    };

    values
        .into_iter()
        .enumerate()
        .map(|(index, value)| {
            serde_json::from_value(value).map_err(|e| OutputError::Record {
                index,
                message: e.to_string(),
            })
        })
        .collect()
}

fn record_values(value: serde_json::Value) -> Result<Vec<serde_json::Value>, OutputError> {
    match value {
        serde_json::Value::Array(items) => Ok(items),
        serde_json::Value::Object(mut map) => match map.remove("records") {
            Some(serde_json::Value::Array(items)) => Ok(items),
            _ => Err(OutputError::Decode("expected a \"records\" array".into())),
        },
        _ => Err(OutputError::Decode("expected an array or an envelope".into())),
    }
}
