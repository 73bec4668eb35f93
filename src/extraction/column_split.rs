//! Geometric column split: names on the left, emails on the right.

use super::{page_number, restrict, Assembler, ExtractionError, ExtractionStrategy, PageExtraction};
use crate::config::ColumnSplitConfig;
use crate::document::{BoundingBox, Document};
use crate::models::SourceStrategy;
use crate::ocr::{usable_chars, TextRecognizer};

/// Recognizes the name and email columns independently and pairs them.
pub struct ColumnSplitStrategy {
    names: BoundingBox,
    emails: BoundingBox,
    resolution: u32,
    recognizer: TextRecognizer,
    assembler: Assembler,
}

impl ColumnSplitStrategy {
    pub fn new(
        split: ColumnSplitConfig,
        resolution: u32,
        recognizer: TextRecognizer,
        assembler: Assembler,
    ) -> Self {
        Self {
            names: BoundingBox::new(0.0, 0.0, split.name_end, 1.0),
            emails: BoundingBox::new(split.email_start, 0.0, 1.0, 1.0),
            resolution,
            recognizer,
            assembler,
        }
    }

    fn recognize(
        &self,
        doc: &dyn Document,
        index: usize,
        region: BoundingBox,
    ) -> Result<String, ExtractionError> {
        if region.is_empty() {
            return Ok(String::new());
        }
        let raster = doc.to_image(index, self.resolution, Some(&region))?;
        Ok(self.recognizer.recognize(&raster)?.text)
    }
}

impl ExtractionStrategy for ColumnSplitStrategy {
    fn kind(&self) -> SourceStrategy {
        SourceStrategy::ColumnSplit
    }

    fn extract(
        &self,
        doc: &dyn Document,
        index: usize,
        bbox: Option<&BoundingBox>,
    ) -> Result<PageExtraction, ExtractionError> {
        let names = self.recognize(doc, index, restrict(self.names, bbox))?;
        let emails = self.recognize(doc, index, restrict(self.emails, bbox))?;

        Ok(PageExtraction {
            candidates: self.assembler.pair_columns(
                &names,
                &emails,
                page_number(index),
                SourceStrategy::ColumnSplit,
            ),
            chars_read: usable_chars(&names) + usable_chars(&emails),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::classify::NoiseClassifier;
    use crate::config::NoiseConfig;
    use crate::document::TextDocument;
    use crate::extraction::testing::{FileTextBackend, RenderedText};
    use crate::extraction::AssemblyMode;

    #[test]
    fn test_pairs_left_names_with_right_emails() {
        let text = [
            "ANA LIMA           Sao Paulo - SP        ana@lima.com.br",
            "BRUNO REIS         Campinas - SP       bruno@reis.com.br",
        ]
        .join("\n");
        let doc = RenderedText(TextDocument::from_text(&text));
        let classifier = Arc::new(NoiseClassifier::new(&NoiseConfig::default()).unwrap());
        let strategy = ColumnSplitStrategy::new(
            ColumnSplitConfig::default(),
            150,
            TextRecognizer::new(Arc::new(FileTextBackend), None, 50),
            Assembler::new(classifier, AssemblyMode::NameColumn),
        );

        let result = strategy.extract(&doc, 0, None).unwrap();
        assert_eq!(result.candidates.len(), 2);
        assert_eq!(result.candidates[0].name(), "Ana Lima");
        assert_eq!(result.candidates[0].email(), Some("ana@lima.com.br"));
        assert_eq!(result.candidates[1].email(), Some("bruno@reis.com.br"));
        assert_eq!(result.candidates[1].page(), 1);
    }
}
