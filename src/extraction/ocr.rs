//! OCR strategies: whole page and name-column crop.

use super::{page_number, restrict, Assembler, ExtractionError, ExtractionStrategy, PageExtraction};
use crate::document::{BoundingBox, Document};
use crate::models::SourceStrategy;
use crate::ocr::{usable_chars, TextRecognizer};

/// Rasterizes a page region and assembles records from the recognized text.
pub struct OcrStrategy {
    kind: SourceStrategy,
    region: Option<BoundingBox>,
    resolution: u32,
    recognizer: TextRecognizer,
    assembler: Assembler,
}

impl OcrStrategy {
    pub fn new(
        kind: SourceStrategy,
        region: Option<BoundingBox>,
        resolution: u32,
        recognizer: TextRecognizer,
        assembler: Assembler,
    ) -> Self {
        Self {
            kind,
            region,
            resolution,
            recognizer,
            assembler,
        }
    }
}

impl ExtractionStrategy for OcrStrategy {
    fn kind(&self) -> SourceStrategy {
        self.kind
    }

    fn extract(
        &self,
        doc: &dyn Document,
        index: usize,
        bbox: Option<&BoundingBox>,
    ) -> Result<PageExtraction, ExtractionError> {
        let region = match (self.region, bbox) {
            (Some(own), outer) => Some(restrict(own, outer)),
            (None, outer) => outer.copied(),
        };
        if region.is_some_and(|r| r.is_empty()) {
            return Ok(PageExtraction::empty());
        }

        let raster = doc.to_image(index, self.resolution, region.as_ref())?;
        let recognition = self.recognizer.recognize(&raster)?;
        if recognition.fallback_used {
            tracing::debug!("p{} {}: used language-free OCR pass", index + 1, self.kind);
        }

        Ok(PageExtraction {
            candidates: self
                .assembler
                .assemble(&recognition.text, page_number(index), self.kind),
            chars_read: usable_chars(&recognition.text),
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
    use crate::extraction::{AssemblyMode, ExtractionError};

    fn strategy(kind: SourceStrategy, region: Option<BoundingBox>, mode: AssemblyMode) -> OcrStrategy {
        let classifier = Arc::new(NoiseClassifier::new(&NoiseConfig::default()).unwrap());
        OcrStrategy::new(
            kind,
            region,
            150,
            TextRecognizer::new(Arc::new(FileTextBackend), Some("por".into()), 50),
            Assembler::new(classifier, mode),
        )
    }

    #[test]
    fn test_full_page_ocr_carries_wrapped_names() {
        let doc = RenderedText(TextDocument::from_text(
            "MARIA APARECIDA\nDOS SANTOS maria@santosleiloes.com.br\nPEDRO ALVES pedro@alves.com.br",
        ));
        let s = strategy(SourceStrategy::Ocr, None, AssemblyMode::EmailAnchoredWithContinuation);
        let result = s.extract(&doc, 0, None).unwrap();
        let names: Vec<_> = result.candidates.iter().map(|r| r.name()).collect();
        assert_eq!(names, ["Maria Aparecida Dos Santos", "Pedro Alves"]);
        assert!(result
            .candidates
            .iter()
            .all(|r| r.source_strategy() == SourceStrategy::Ocr));
    }

    #[test]
    fn test_name_column_crop() {
        let text = [
            "CABEÇALHO DA JUNTA COMERCIAL           ",
            "ANA LIMA            ana@lima.com.br    ",
            "BRUNO REIS          bruno@reis.com.br  ",
            "CARLA MOTA          carla@mota.com.br  ",
            "RODAPE                                 ",
        ]
        .join("\n");
        let doc = RenderedText(TextDocument::from_text(&text));
        let s = strategy(
            SourceStrategy::OcrCrop,
            Some(BoundingBox::new(0.0, 0.2, 0.35, 0.8)),
            AssemblyMode::NameColumn,
        );
        let result = s.extract(&doc, 0, None).unwrap();
        let names: Vec<_> = result.candidates.iter().map(|r| r.name()).collect();
        assert_eq!(names, ["Ana Lima", "Bruno Reis", "Carla Mota"]);
        assert!(result.candidates.iter().all(|r| r.email().is_none()));
    }

    #[test]
    fn test_text_document_has_no_raster() {
        let doc = TextDocument::from_text("ANA LIMA ana@lima.com.br");
        let s = strategy(SourceStrategy::Ocr, None, AssemblyMode::EmailAnchoredWithContinuation);
        let err = s.extract(&doc, 0, None).unwrap_err();
        assert!(err.is_not_applicable());
        assert!(matches!(err, ExtractionError::Document(_)));
    }
}
