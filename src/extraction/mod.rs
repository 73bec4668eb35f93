//! Extraction strategies.
//!
//! Each strategy reads one page of a `Document` and returns the candidate
//! records it found. Strategies are interchangeable and picked by config:
//! - `direct_text`: text layer with header and footer bands cropped away
//! - `cropped_text`: text layer inside a configured region
//! - `ocr`: OCR of the page, wrapped names carried across lines
//! - `ocr_crop`: OCR of the name column, names only
//! - `column_split`: OCR of name and email columns, paired by position
//! - `fixed_columns`: text layer read through fixed table bands

pub mod assembler;
mod column_split;
mod fixed_columns;
mod ocr;
mod text_layer;

use std::sync::Arc;

use thiserror::Error;

pub use assembler::{Assembler, AssemblyMode};
pub use column_split::ColumnSplitStrategy;
pub use fixed_columns::FixedColumnsStrategy;
pub use ocr::OcrStrategy;
pub use text_layer::TextLayerStrategy;

use crate::classify::NoiseClassifier;
use crate::config::{ExtractionConfig, Region};
use crate::document::{BoundingBox, Document, DocumentError};
use crate::models::{CandidateRecord, SourceStrategy};
use crate::ocr::{OcrError, TextRecognizer};

/// Errors from a single page extraction.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error(transparent)]
    Ocr(#[from] OcrError),
}

impl ExtractionError {
    /// Failures that only mean the strategy does not apply to this input.
    pub fn is_not_applicable(&self) -> bool {
        matches!(self, Self::Document(DocumentError::NoRaster(_)))
    }
}

/// One line of page text, tagged with where it came from.
#[derive(Debug, Clone, Copy)]
pub struct RawLine<'a> {
    pub text: &'a str,
    pub page: u32,
    pub strategy: SourceStrategy,
}

impl<'a> RawLine<'a> {
    pub fn split(
        text: &'a str,
        page: u32,
        strategy: SourceStrategy,
    ) -> impl Iterator<Item = RawLine<'a>> + 'a {
        text.lines().map(move |line| RawLine {
            text: line,
            page,
            strategy,
        })
    }
}

/// Output of one strategy on one page.
#[derive(Debug, Clone, Default)]
pub struct PageExtraction {
    pub candidates: Vec<CandidateRecord>,
    /// Non-whitespace characters read from the page.
    pub chars_read: usize,
}

impl PageExtraction {
    pub fn empty() -> Self {
        Self::default()
    }
}

/// An algorithm that turns one page into candidate records.
pub trait ExtractionStrategy: Send + Sync {
    fn kind(&self) -> SourceStrategy;

    /// Extract candidates from the page at `index` (0-based), optionally
    /// restricted to `bbox` in fractional page coordinates.
    fn extract(
        &self,
        doc: &dyn Document,
        index: usize,
        bbox: Option<&BoundingBox>,
    ) -> Result<PageExtraction, ExtractionError>;
}

/// 1-based page number carried by records.
pub(crate) fn page_number(index: usize) -> u32 {
    u32::try_from(index + 1).unwrap_or(u32::MAX)
}

/// Intersect a strategy's own region with a caller-supplied box.
pub(crate) fn restrict(own: BoundingBox, bbox: Option<&BoundingBox>) -> BoundingBox {
    match bbox {
        Some(outer) => own.intersect(outer),
        None => own,
    }
}

impl From<Region> for BoundingBox {
    fn from(r: Region) -> Self {
        BoundingBox::new(r.x0, r.y0, r.x1, r.y1)
    }
}

/// Build the configured strategies, in preference order.
pub fn build_strategies(
    config: &ExtractionConfig,
    classifier: Arc<NoiseClassifier>,
    recognizer: TextRecognizer,
) -> Vec<Box<dyn ExtractionStrategy>> {
    let mut seen = Vec::new();
    let mut strategies: Vec<Box<dyn ExtractionStrategy>> = Vec::new();

    for kind in &config.strategies {
        if seen.contains(kind) {
            tracing::warn!("Strategy {} listed twice, ignoring the repeat", kind);
            continue;
        }
        seen.push(*kind);

        let email_anchored = Assembler::new(classifier.clone(), AssemblyMode::EmailAnchored);
        let strategy: Box<dyn ExtractionStrategy> = match kind {
            SourceStrategy::DirectText => Box::new(TextLayerStrategy::new(
                SourceStrategy::DirectText,
                BoundingBox::vertical_band(config.top_crop, config.bottom_crop),
                email_anchored,
            )),
            SourceStrategy::CroppedText => Box::new(TextLayerStrategy::new(
                SourceStrategy::CroppedText,
                config.crop_region.into(),
                email_anchored,
            )),
            SourceStrategy::Ocr => Box::new(OcrStrategy::new(
                SourceStrategy::Ocr,
                None,
                config.resolution,
                recognizer.clone(),
                Assembler::new(classifier.clone(), AssemblyMode::EmailAnchoredWithContinuation),
            )),
            SourceStrategy::OcrCrop => Box::new(OcrStrategy::new(
                SourceStrategy::OcrCrop,
                Some(config.name_column.into()),
                config.resolution,
                recognizer.clone(),
                Assembler::new(classifier.clone(), AssemblyMode::NameColumn),
            )),
            SourceStrategy::ColumnSplit => Box::new(ColumnSplitStrategy::new(
                config.column_split,
                config.resolution,
                recognizer.clone(),
                Assembler::new(classifier.clone(), AssemblyMode::NameColumn),
            )),
            SourceStrategy::FixedColumns => Box::new(FixedColumnsStrategy::new(
                config.fixed_columns.clone(),
                Assembler::new(classifier.clone(), AssemblyMode::NameColumn),
            )),
        };
        strategies.push(strategy);
    }

    strategies
}

#[cfg(test)]
pub(crate) mod testing {
    //! Documents and OCR backends for strategy tests.

    use std::path::Path;

    use tempfile::TempDir;

    use crate::document::{BoundingBox, Document, DocumentError, PageInfo, Raster, TextDocument};
    use crate::ocr::{OcrBackend, OcrError, OcrResult};

    /// A text document that "renders" regions by writing their text to a file.
    pub struct RenderedText(pub TextDocument);

    impl Document for RenderedText {
        fn page_count(&self) -> usize {
            self.0.page_count()
        }

        fn page(&self, index: usize) -> Result<PageInfo, DocumentError> {
            self.0.page(index)
        }

        fn extract_text(
            &self,
            index: usize,
            bbox: Option<&BoundingBox>,
        ) -> Result<Option<String>, DocumentError> {
            self.0.extract_text(index, bbox)
        }

        fn to_image(
            &self,
            index: usize,
            _resolution: u32,
            bbox: Option<&BoundingBox>,
        ) -> Result<Raster, DocumentError> {
            let text = self.0.extract_text(index, bbox)?.unwrap_or_default();
            let dir = TempDir::new()?;
            let path = dir.path().join("page.txt");
            std::fs::write(&path, text)?;
            Ok(Raster::new(dir, path, 100, 100))
        }
    }

    /// Reads the "image" back as text.
    pub struct FileTextBackend;

    impl OcrBackend for FileTextBackend {
        fn name(&self) -> &'static str {
            "file-text"
        }

        fn is_available(&self) -> bool {
            true
        }

        fn availability_hint(&self) -> String {
            String::new()
        }

        fn ocr_image(&self, image_path: &Path, _language: Option<&str>) -> Result<OcrResult, OcrError> {
            Ok(OcrResult {
                text: std::fs::read_to_string(image_path)?,
                backend: "file-text",
                processing_time_ms: 0,
            })
        }
    }
}
