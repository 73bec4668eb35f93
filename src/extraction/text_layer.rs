//! Text-layer strategies: direct (banded) and cropped-region.

use super::{page_number, restrict, Assembler, ExtractionError, ExtractionStrategy, PageExtraction};
use crate::document::{BoundingBox, Document};
use crate::models::SourceStrategy;
use crate::ocr::usable_chars;

/// Reads the page text layer inside a fixed region.
pub struct TextLayerStrategy {
    kind: SourceStrategy,
    region: BoundingBox,
    assembler: Assembler,
}

impl TextLayerStrategy {
    pub fn new(kind: SourceStrategy, region: BoundingBox, assembler: Assembler) -> Self {
        Self {
            kind,
            region,
            assembler,
        }
    }
}

impl ExtractionStrategy for TextLayerStrategy {
    fn kind(&self) -> SourceStrategy {
        self.kind
    }

    fn extract(
        &self,
        doc: &dyn Document,
        index: usize,
        bbox: Option<&BoundingBox>,
    ) -> Result<PageExtraction, ExtractionError> {
        let region = restrict(self.region, bbox);
        if region.is_empty() {
            return Ok(PageExtraction::empty());
        }
        let Some(text) = doc.extract_text(index, Some(&region))? else {
            return Ok(PageExtraction::empty());
        };

        Ok(PageExtraction {
            candidates: self.assembler.assemble(&text, page_number(index), self.kind),
            chars_read: usable_chars(&text),
        })
    }
}
