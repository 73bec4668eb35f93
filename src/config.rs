//! Configuration management for rollsift using the prefer crate.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::SourceStrategy;

/// Environment variable overriding the OCR language.
pub const ENV_OCR_LANGUAGE: &str = "ROLLSIFT_OCR_LANGUAGE";
/// Environment variable overriding the worker count.
pub const ENV_WORKERS: &str = "ROLLSIFT_WORKERS";

/// Upper bound for the default worker count.
const MAX_DEFAULT_WORKERS: usize = 4;

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse {format} config: {message}")]
    Parse { format: &'static str, message: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

// ============================================================================
// Extraction
// ============================================================================

/// Rectangle in fractional page coordinates, as written in config files.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl Region {
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self { x0, y0, x1, y1 }
    }
}

/// Field read from one band of a fixed-column table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableField {
    Name,
    Registration,
    Street,
    Phone,
    Email,
}

impl TableField {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Registration => "registration",
            Self::Street => "street",
            Self::Phone => "phone",
            Self::Email => "email",
        }
    }
}

/// Horizontal band of a fixed-column table, in page points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColumnBand {
    pub field: TableField,
    pub x_start: f64,
    pub x_end: f64,
}

impl ColumnBand {
    pub fn new(field: TableField, x_start: f64, x_end: f64) -> Self {
        Self {
            field,
            x_start,
            x_end,
        }
    }
}

/// Name and email column split for the geometric strategy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnSplitConfig {
    /// Right edge of the name column, as a fraction of page width.
    pub name_end: f64,
    /// Left edge of the email column, as a fraction of page width.
    pub email_start: f64,
}

impl Default for ColumnSplitConfig {
    fn default() -> Self {
        Self {
            name_end: 0.30,
            email_start: 0.70,
        }
    }
}

/// Extraction strategy settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Strategies to run, in preference order.
    pub strategies: Vec<SourceStrategy>,
    /// Fraction of the page height dropped from the top by the direct-text strategy.
    pub top_crop: f64,
    /// Fraction of the page height dropped from the bottom by the direct-text strategy.
    pub bottom_crop: f64,
    /// Region read by the cropped-text strategy.
    pub crop_region: Region,
    /// Region holding the name column, read by the OCR-on-crop strategy.
    pub name_column: Region,
    pub column_split: ColumnSplitConfig,
    pub fixed_columns: Vec<ColumnBand>,
    /// Rasterization resolution in dpi.
    pub resolution: u32,
    /// Tesseract language for the primary OCR pass.
    pub language: Option<String>,
    /// Non-whitespace characters an OCR pass must produce to be usable.
    pub min_ocr_chars: usize,
    /// Stop after this many pages.
    pub max_pages: Option<usize>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            strategies: vec![SourceStrategy::DirectText, SourceStrategy::Ocr],
            top_crop: 0.12,
            bottom_crop: 0.10,
            crop_region: Region::new(0.0, 0.10, 1.0, 0.90),
            name_column: Region::new(0.0, 0.10, 0.35, 0.90),
            column_split: ColumnSplitConfig::default(),
            fixed_columns: default_fixed_columns(),
            resolution: 150,
            language: Some("por".to_string()),
            min_ocr_chars: 50,
            max_pages: None,
        }
    }
}

fn default_fixed_columns() -> Vec<ColumnBand> {
    vec![
        ColumnBand::new(TableField::Name, 50.0, 200.0),
        ColumnBand::new(TableField::Registration, 200.0, 300.0),
        ColumnBand::new(TableField::Street, 300.0, 450.0),
        ColumnBand::new(TableField::Phone, 450.0, 550.0),
        ColumnBand::new(TableField::Email, 550.0, 700.0),
    ]
}

// ============================================================================
// Noise
// ============================================================================

/// Line classification rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseConfig {
    /// Watermark and boilerplate substrings, matched case-insensitively.
    pub boilerplate: Vec<String>,
    /// Table header tokens; a line equal to one of these is noise.
    pub header_tokens: Vec<String>,
    /// Minimum trimmed length, in characters.
    pub min_length: usize,
    /// Lines with more digits than this are noise.
    pub max_digits: usize,
    /// Street-type keywords, matched as whole words.
    pub address_keywords: Vec<String>,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        let strings =
            |items: &[&str]| -> Vec<String> { items.iter().map(|s| s.to_string()).collect() };
        Self {
            boilerplate: strings(&["Licensed to", "Matricula", "Matrícula", "Posse"]),
            header_tokens: strings(&[
                "NOME",
                "NOME DO LEILOEIRO",
                "LEILOEIRO",
                "CPF",
                "CNPJ",
                "ENDEREÇO",
                "TELEFONE",
                "E-MAIL",
                "EMAIL",
                "SITE",
                "MATRÍCULA",
                "SITUAÇÃO",
            ]),
            min_length: 3,
            max_digits: 2,
            address_keywords: strings(&[
                "RUA",
                "AVENIDA",
                "AV",
                "ALAMEDA",
                "TRAVESSA",
                "RODOVIA",
                "KM",
                "Nº",
                "N°",
                "S/N",
                "APTO",
                "APARTAMENTO",
                "SALA",
                "ANDAR",
                "BLOCO",
                "CONJUNTO",
                "LOTE",
                "QUADRA",
                "CEP",
                "STREET",
                "AVENUE",
                "BLOCK",
                "APARTMENT",
                "ZIP",
            ]),
        }
    }
}

// ============================================================================
// Enrichment and scoring
// ============================================================================

/// Secondary dataset matching settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnrichmentConfig {
    /// Dataset file used when none is given on the command line.
    pub dataset: Option<String>,
    /// Token-set Jaccard similarity a fuzzy match must exceed.
    pub similarity_threshold: f64,
    /// Personal webmail domains; matched on label boundaries.
    pub personal_domains: Vec<String>,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            dataset: None,
            similarity_threshold: 0.7,
            personal_domains: [
                "gmail.com",
                "hotmail.com",
                "outlook.com",
                "yahoo.com",
                "live.com",
                "msn.com",
                "aol.com",
                "globo.com",
                "uol.com.br",
                "bol.com.br",
                "terra.com.br",
                "ig.com.br",
                "gmail.com.br",
                "hotmail.com.br",
                "yahoo.com.br",
                "outlook.com.br",
                "live.com.br",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

/// Points awarded by the scoring engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    pub site: u32,
    pub business_site: u32,
    pub email: u32,
    pub corporate_email: u32,
    pub phone: u32,
    pub registration: u32,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            site: 30,
            business_site: 20,
            email: 10,
            corporate_email: 20,
            phone: 10,
            registration: 10,
        }
    }
}

/// Score weights and category thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub weights: ScoringWeights,
    /// Scores strictly above this are `Large (Portal)`.
    pub large_above: u8,
    /// Scores at or above this (and not large) are `Medium (Established)`.
    pub medium_min: u8,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            weights: ScoringWeights::default(),
            large_above: 80,
            medium_min: 40,
        }
    }
}

// ============================================================================
// Top level
// ============================================================================

fn parse_error(format: &'static str, e: impl std::fmt::Display) -> ConfigError {
    ConfigError::Parse {
        format,
        message: e.to_string(),
    }
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .min(MAX_DEFAULT_WORKERS)
}

/// Configuration file structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Pages processed concurrently.
    pub workers: usize,
    pub extraction: ExtractionConfig,
    pub noise: NoiseConfig,
    pub enrichment: EnrichmentConfig,
    pub scoring: ScoringConfig,
    /// Path to the config file this was loaded from (not serialized).
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            extraction: ExtractionConfig::default(),
            noise: NoiseConfig::default(),
            enrichment: EnrichmentConfig::default(),
            scoring: ScoringConfig::default(),
            source_path: None,
        }
    }
}

impl Config {
    /// Load configuration using prefer crate for discovery.
    /// Automatically discovers rollsift config files in standard locations.
    pub async fn load() -> Self {
        match prefer::load("rollsift").await {
            Ok(pref_config) => {
                if let Some(path) = pref_config.source_path() {
                    match Self::load_from_path(path).await {
                        Ok(config) => config,
                        Err(e) => {
                            tracing::warn!("Ignoring config {}: {}", path.display(), e);
                            Self::default_with_env()
                        }
                    }
                } else {
                    Self::default_with_env()
                }
            }
            // No config file found, use defaults with env overrides
            Err(_) => Self::default_with_env(),
        }
    }

    /// Create a default config with environment variable overrides applied.
    pub fn default_with_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Load configuration from a specific file path.
    /// Supports JSON, TOML and YAML based on file extension.
    pub async fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents =
            tokio::fs::read_to_string(path)
                .await
                .map_err(|source| ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");
        let mut config = Self::parse(&contents, ext)?.with_env_overrides();
        config.source_path = Some(path.to_path_buf());
        config.validate()?;
        Ok(config)
    }

    /// Parse config text in the format named by `ext`.
    pub fn parse(contents: &str, ext: &str) -> Result<Self, ConfigError> {
        match ext {
            "toml" => toml::from_str(contents).map_err(|e| parse_error("TOML", e)),
            "yaml" | "yml" => serde_yaml::from_str(contents).map_err(|e| parse_error("YAML", e)),
            _ => serde_json::from_str(contents).map_err(|e| parse_error("JSON", e)),
        }
    }

    /// Apply `ROLLSIFT_*` environment overrides.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(language) = lookup(ENV_OCR_LANGUAGE) {
            let language = language.trim().to_string();
            tracing::debug!("Using {} from environment: {:?}", ENV_OCR_LANGUAGE, language);
            self.extraction.language = (!language.is_empty()).then_some(language);
        }
        if let Some(workers) = lookup(ENV_WORKERS) {
            match workers.trim().parse::<usize>() {
                Ok(n) if n > 0 => self.workers = n,
                _ => tracing::warn!("Ignoring invalid {}={:?}", ENV_WORKERS, workers),
            }
        }
        self
    }

    /// Check ranges the pipeline relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let ex = &self.extraction;
        if self.workers == 0 {
            return Err(ConfigError::Invalid("workers must be at least 1".into()));
        }
        if ex.strategies.is_empty() {
            return Err(ConfigError::Invalid(
                "extraction.strategies must name at least one strategy".into(),
            ));
        }
        if !(0.10..=0.15).contains(&ex.top_crop) {
            return Err(ConfigError::Invalid(format!(
                "extraction.top_crop must be between 0.10 and 0.15, got {}",
                ex.top_crop
            )));
        }
        if !(0.0..0.5).contains(&ex.bottom_crop) {
            return Err(ConfigError::Invalid(format!(
                "extraction.bottom_crop must be in [0, 0.5), got {}",
                ex.bottom_crop
            )));
        }
        if ex.column_split.name_end > ex.column_split.email_start {
            return Err(ConfigError::Invalid(
                "extraction.column_split.name_end must not pass email_start".into(),
            ));
        }
        if ex.resolution == 0 {
            return Err(ConfigError::Invalid("extraction.resolution must be positive".into()));
        }
        if let Some(band) = ex.fixed_columns.iter().find(|b| b.x_end <= b.x_start) {
            return Err(ConfigError::Invalid(format!(
                "fixed column band {} is empty",
                band.field.as_str()
            )));
        }
        if !(0.0..=1.0).contains(&self.enrichment.similarity_threshold) {
            return Err(ConfigError::Invalid(
                "enrichment.similarity_threshold must be in [0, 1]".into(),
            ));
        }
        if self.scoring.medium_min > self.scoring.large_above {
            return Err(ConfigError::Invalid(
                "scoring.medium_min must not exceed scoring.large_above".into(),
            ));
        }
        Ok(())
    }

    /// Get the base directory for resolving relative paths.
    /// Returns the config file's parent directory if available, otherwise None.
    pub fn base_dir(&self) -> Option<PathBuf> {
        self.source_path
            .as_ref()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    /// Resolve a path that may be relative to the config file.
    /// - Absolute paths are returned as-is
    /// - Paths starting with ~ are expanded
    /// - Relative paths are resolved relative to `base_dir`
    pub fn resolve_path(&self, path_str: &str, base_dir: &Path) -> PathBuf {
        let expanded = shellexpand::tilde(path_str);
        let path = Path::new(expanded.as_ref());

        if path.is_absolute() {
            path.to_path_buf()
        } else {
            base_dir.join(path)
        }
    }

    /// Dataset path from the config, resolved against the config file location.
    pub fn dataset_path(&self) -> Option<PathBuf> {
        let dataset = self.enrichment.dataset.as_deref()?;
        let base = self
            .base_dir()
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."));
        Some(self.resolve_path(dataset, &base))
    }
}
