//! Contact records as they move through the pipeline.
//!
//! `CandidateRecord` → `EnrichedRecord` → `ScoredRecord`. Each stage wraps the
//! previous one; a `ScoredRecord` is terminal and exposes read accessors only.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::key::{Keyed, NormalizedKey};

/// Extraction strategy that produced a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceStrategy {
    /// Page text layer with header/footer bands cropped away.
    DirectText,
    /// Page text layer restricted to a configured region.
    CroppedText,
    /// OCR of the rasterized page.
    Ocr,
    /// OCR of the name column only.
    OcrCrop,
    /// OCR of separate name and email columns.
    ColumnSplit,
    /// Text layer read through fixed column bands.
    FixedColumns,
}

impl SourceStrategy {
    pub const ALL: [SourceStrategy; 6] = [
        SourceStrategy::DirectText,
        SourceStrategy::CroppedText,
        SourceStrategy::Ocr,
        SourceStrategy::OcrCrop,
        SourceStrategy::ColumnSplit,
        SourceStrategy::FixedColumns,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DirectText => "direct_text",
            Self::CroppedText => "cropped_text",
            Self::Ocr => "ocr",
            Self::OcrCrop => "ocr_crop",
            Self::ColumnSplit => "column_split",
            Self::FixedColumns => "fixed_columns",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "direct_text" | "direct" | "text" => Some(Self::DirectText),
            "cropped_text" | "cropped" => Some(Self::CroppedText),
            "ocr" => Some(Self::Ocr),
            "ocr_crop" => Some(Self::OcrCrop),
            "column_split" | "columns" | "geometric" => Some(Self::ColumnSplit),
            "fixed_columns" | "table" => Some(Self::FixedColumns),
            _ => None,
        }
    }

    /// Whether the strategy reads OCR output rather than a text layer.
    pub fn uses_ocr(&self) -> bool {
        matches!(self, Self::Ocr | Self::OcrCrop | Self::ColumnSplit)
    }
}

impl fmt::Display for SourceStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A name/email/site tuple extracted from one page by one strategy.
///
/// The name is never empty: `CandidateRecord::new` refuses blank names, and
/// deserialization goes through the same check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawCandidate")]
pub struct CandidateRecord {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    site: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    registration: Option<String>,
    page: u32,
    source_strategy: SourceStrategy,
}

#[derive(Deserialize)]
struct RawCandidate {
    name: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    site: Option<String>,
    #[serde(default)]
    phone: Option<String>,
    #[serde(default)]
    registration: Option<String>,
    #[serde(default)]
    page: u32,
    source_strategy: SourceStrategy,
}

impl TryFrom<RawCandidate> for CandidateRecord {
    type Error = String;

    fn try_from(raw: RawCandidate) -> Result<Self, Self::Error> {
        let record = CandidateRecord::new(raw.name, raw.page, raw.source_strategy)
            .ok_or_else(|| "candidate name must not be empty".to_string())?;
        Ok(record
            .with_email(raw.email)
            .with_site(raw.site)
            .with_phone(raw.phone)
            .with_registration(raw.registration))
    }
}

/// Treat blank strings as absent.
fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl CandidateRecord {
    /// Create a candidate. Returns `None` when the name is blank.
    pub fn new(name: impl Into<String>, page: u32, source_strategy: SourceStrategy) -> Option<Self> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return None;
        }
        Some(Self {
            name,
            email: None,
            site: None,
            phone: None,
            registration: None,
            page,
            source_strategy,
        })
    }

    pub fn with_email(mut self, email: Option<String>) -> Self {
        self.email = non_blank(email).map(|e| e.to_lowercase());
        self
    }

    pub fn with_site(mut self, site: Option<String>) -> Self {
        self.site = non_blank(site);
        self
    }

    pub fn with_phone(mut self, phone: Option<String>) -> Self {
        self.phone = non_blank(phone);
        self
    }

    pub fn with_registration(mut self, registration: Option<String>) -> Self {
        self.registration = non_blank(registration);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn site(&self) -> Option<&str> {
        self.site.as_deref()
    }

    pub fn phone(&self) -> Option<&str> {
        self.phone.as_deref()
    }

    pub fn registration(&self) -> Option<&str> {
        self.registration.as_deref()
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn source_strategy(&self) -> SourceStrategy {
        self.source_strategy
    }
}

impl Keyed for CandidateRecord {
    fn key(&self) -> NormalizedKey {
        NormalizedKey::new(&self.name, self.email())
    }
}

/// Whether a record's missing fields were filled from the secondary dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrichmentSource {
    Matched,
    Unmatched,
}

impl EnrichmentSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Matched => "matched",
            Self::Unmatched => "unmatched",
        }
    }
}

/// A candidate after the enrichment pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichedRecord {
    #[serde(flatten)]
    record: CandidateRecord,
    email_is_corporate: bool,
    enrichment_source: EnrichmentSource,
}

impl EnrichedRecord {
    pub fn new(
        record: CandidateRecord,
        email_is_corporate: bool,
        enrichment_source: EnrichmentSource,
    ) -> Self {
        Self {
            record,
            email_is_corporate,
            enrichment_source,
        }
    }

    pub fn record(&self) -> &CandidateRecord {
        &self.record
    }

    pub fn name(&self) -> &str {
        self.record.name()
    }

    pub fn email(&self) -> Option<&str> {
        self.record.email()
    }

    pub fn site(&self) -> Option<&str> {
        self.record.site()
    }

    pub fn phone(&self) -> Option<&str> {
        self.record.phone()
    }

    pub fn registration(&self) -> Option<&str> {
        self.record.registration()
    }

    pub fn email_is_corporate(&self) -> bool {
        self.email_is_corporate
    }

    pub fn enrichment_source(&self) -> EnrichmentSource {
        self.enrichment_source
    }

    /// Replace the corporate flag with one derived from the email.
    pub(crate) fn with_email_is_corporate(mut self, email_is_corporate: bool) -> Self {
        self.email_is_corporate = email_is_corporate;
        self
    }

    /// Drop a site that turned out to be unusable.
    pub(crate) fn without_site(mut self) -> Self {
        self.record = self.record.with_site(None);
        self
    }
}

impl Keyed for EnrichedRecord {
    fn key(&self) -> NormalizedKey {
        self.record.key()
    }
}

/// Business-size category derived from site presence and score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "Large (Portal)")]
    Large,
    #[serde(rename = "Medium (Established)")]
    Medium,
    #[serde(rename = "Small (Has Site)")]
    Small,
    #[serde(rename = "Offline / No Site")]
    Offline,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Large,
        Category::Medium,
        Category::Small,
        Category::Offline,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Large => "Large (Portal)",
            Self::Medium => "Medium (Established)",
            Self::Small => "Small (Has Site)",
            Self::Offline => "Offline / No Site",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Terminal record: enriched, scored and categorized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoredRecord {
    #[serde(flatten)]
    record: EnrichedRecord,
    tech_score: u8,
    category: Category,
}

impl ScoredRecord {
    /// Only the scoring engine builds these; the score is clamped here as well.
    pub(crate) fn new(record: EnrichedRecord, tech_score: u8, category: Category) -> Self {
        Self {
            record,
            tech_score: tech_score.min(100),
            category,
        }
    }

    pub fn enriched(&self) -> &EnrichedRecord {
        &self.record
    }

    pub fn name(&self) -> &str {
        self.record.name()
    }

    pub fn email(&self) -> Option<&str> {
        self.record.email()
    }

    pub fn site(&self) -> Option<&str> {
        self.record.site()
    }

    pub fn page(&self) -> u32 {
        self.record.record().page()
    }

    pub fn source_strategy(&self) -> SourceStrategy {
        self.record.record().source_strategy()
    }

    pub fn tech_score(&self) -> u8 {
        self.tech_score
    }

    pub fn category(&self) -> Category {
        self.category
    }
}

impl Keyed for ScoredRecord {
    fn key(&self) -> NormalizedKey {
        self.record.key()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_name_is_refused() {
        assert!(CandidateRecord::new("   ", 1, SourceStrategy::DirectText).is_none());
        assert!(CandidateRecord::new("", 1, SourceStrategy::Ocr).is_none());
    }

    #[test]
    fn test_blank_fields_become_none() {
        let record = CandidateRecord::new("Ana Lima", 2, SourceStrategy::Ocr)
            .unwrap()
            .with_email(Some("  ".to_string()))
            .with_site(Some(String::new()))
            .with_phone(Some("(11) 5555-0000".to_string()));
        assert_eq!(record.email(), None);
        assert_eq!(record.site(), None);
        assert_eq!(record.phone(), Some("(11) 5555-0000"));
    }

    #[test]
    fn test_deserialize_rejects_blank_name() {
        let json = r#"{"name": " ", "page": 1, "source_strategy": "ocr"}"#;
        assert!(serde_json::from_str::<CandidateRecord>(json).is_err());
    }

    #[test]
    fn test_strategy_round_trip_names() {
        for strategy in SourceStrategy::ALL {
            assert_eq!(SourceStrategy::from_str(strategy.as_str()), Some(strategy));
        }
        assert_eq!(SourceStrategy::from_str("column-split"), Some(SourceStrategy::ColumnSplit));
        assert_eq!(SourceStrategy::from_str("nope"), None);
    }

    #[test]
    fn test_scored_record_score_is_clamped() {
        let candidate = CandidateRecord::new("Ana Lima", 1, SourceStrategy::DirectText).unwrap();
        let enriched = EnrichedRecord::new(candidate, false, EnrichmentSource::Unmatched);
        let scored = ScoredRecord::new(enriched, 200, Category::Large);
        assert_eq!(scored.tech_score(), 100);
    }

    #[test]
    fn test_scored_record_serializes_flat() {
        let candidate = CandidateRecord::new("Ana Lima", 3, SourceStrategy::DirectText)
            .unwrap()
            .with_email(Some("ana@lima.com.br".to_string()));
        let enriched = EnrichedRecord::new(candidate, true, EnrichmentSource::Unmatched);
        let scored = ScoredRecord::new(enriched, 40, Category::Medium);
        let value = serde_json::to_value(&scored).unwrap();
        assert_eq!(value["name"], "Ana Lima");
        assert_eq!(value["email"], "ana@lima.com.br");
        assert_eq!(value["category"], "Medium (Established)");
        assert_eq!(value["enrichment_source"], "unmatched");
        assert_eq!(value["tech_score"], 40);
    }
}
