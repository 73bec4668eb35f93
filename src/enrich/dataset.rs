//! Secondary enrichment dataset loading.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors loading an enrichment dataset.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("Failed to read dataset {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Dataset is not a JSON array: {0}")]
    Parse(#[from] serde_json::Error),
}

/// One `(name, email, site?)` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetEntry {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site: Option<String>,
}

impl DatasetEntry {
    fn is_usable(&self) -> bool {
        !self.name.trim().is_empty()
    }
}

/// Entries loaded from a dataset file, with a count of skipped ones.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    entries: Vec<DatasetEntry>,
    skipped: usize,
}

impl Dataset {
    pub fn new(entries: Vec<DatasetEntry>) -> Self {
        Self::default().with_entries(entries.into_iter().map(Some))
    }

    /// Load a JSON array or JSON Lines file.
    pub async fn load(path: &Path) -> Result<Self, DatasetError> {
        let contents =
            tokio::fs::read_to_string(path)
                .await
                .map_err(|source| DatasetError::Read {
                    path: path.display().to_string(),
                    source,
                })?;
        let dataset = Self::parse(&contents)?;
        tracing::info!(
            "Loaded {} dataset entries from {} ({} skipped)",
            dataset.len(),
            path.display(),
            dataset.skipped()
        );
        Ok(dataset)
    }

    /// Parse dataset text. A leading `[` means a JSON array; anything else is
    /// read as JSON Lines. Entries that do not fit are skipped one by one.
    pub fn parse(contents: &str) -> Result<Self, DatasetError> {
        let trimmed = contents.trim_start();
        if trimmed.starts_with('[') {
            let values: Vec<serde_json::Value> = serde_json::from_str(trimmed)?;
            return Ok(Self::default().with_entries(values.into_iter().map(entry_from_value)));
        }

        let entries = trimmed
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| match serde_json::from_str::<serde_json::Value>(line) {
                Ok(value) => entry_from_value(value),
                Err(e) => {
                    tracing::debug!("Skipping malformed dataset line: {}", e);
                    None
                }
            });
        Ok(Self::default().with_entries(entries))
    }

    fn with_entries(mut self, entries: impl IntoIterator<Item = Option<DatasetEntry>>) -> Self {
        for entry in entries {
            match entry.filter(DatasetEntry::is_usable) {
                Some(entry) => self.entries.push(entry),
                None => self.skipped += 1,
            }
        }
        self
    }

    pub fn entries(&self) -> &[DatasetEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries dropped because they were malformed or nameless.
    pub fn skipped(&self) -> usize {
        self.skipped
    }
}

fn entry_from_value(value: serde_json::Value) -> Option<DatasetEntry> {
    match serde_json::from_value::<DatasetEntry>(value) {
        Ok(entry) => Some(entry),
        Err(e) => {
            tracing::debug!("Skipping malformed dataset entry: {}", e);
            None
        }
    }
}
