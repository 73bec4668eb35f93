//! Fixed-column table reader.

use super::{page_number, restrict, Assembler, ExtractionError, ExtractionStrategy, PageExtraction};
use crate::config::{ColumnBand, TableField};
use crate::document::{BoundingBox, Document};
use crate::models::SourceStrategy;
use crate::ocr::usable_chars;

/// Reads the text layer one column band at a time and transposes the bands
/// into rows.
///
/// Band positions are in page units: points for PDFs, character columns for
/// text documents.
pub struct FixedColumnsStrategy {
    bands: Vec<ColumnBand>,
    assembler: Assembler,
}

impl FixedColumnsStrategy {
    pub fn new(bands: Vec<ColumnBand>, assembler: Assembler) -> Self {
        Self { bands, assembler }
    }
}

impl ExtractionStrategy for FixedColumnsStrategy {
    fn kind(&self) -> SourceStrategy {
        SourceStrategy::FixedColumns
    }

    fn extract(
        &self,
        doc: &dyn Document,
        index: usize,
        bbox: Option<&BoundingBox>,
    ) -> Result<PageExtraction, ExtractionError> {
        let page = doc.page(index)?;
        let mut columns: Vec<(TableField, String)> = Vec::with_capacity(self.bands.len());
        let mut chars_read = 0;

        for band in &self.bands {
            let region = restrict(BoundingBox::from_x_range(band.x_start, band.x_end, &page), bbox);
            let text = if region.is_empty() {
                String::new()
            } else {
                doc.extract_text(index, Some(&region))?.unwrap_or_default()
            };
            chars_read += usable_chars(&text);
            columns.push((band.field, text));
        }

        if !columns.iter().any(|(field, _)| *field == TableField::Name) {
            tracing::warn!("Fixed-column layout has no name band; nothing to extract");
        }

        Ok(PageExtraction {
            candidates: self
                .assembler
                .assemble_rows(&columns, page_number(index), SourceStrategy::FixedColumns),
            chars_read,
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
    use crate::extraction::AssemblyMode;

    #[test]
    fn test_reads_rows_from_character_bands() {
        // name 0-15, registration 15-20, phone 20-36, email 36-60
        let text = [
            "NOME           MAT  TELEFONE        E-MAIL",
            "ANA LIMA       101  (11) 5555-0101  ana@limaleiloes.com.br",
            "BRUNO REIS     102  (19) 5555-0202",
        ]
        .join("\n");
        let doc = TextDocument::from_text(&text);
        let classifier = Arc::new(NoiseClassifier::new(&NoiseConfig::default()).unwrap());
        let strategy = FixedColumnsStrategy::new(
            vec![
                ColumnBand::new(TableField::Name, 0.0, 15.0),
                ColumnBand::new(TableField::Registration, 15.0, 20.0),
                ColumnBand::new(TableField::Phone, 20.0, 36.0),
                ColumnBand::new(TableField::Email, 36.0, 60.0),
            ],
            Assembler::new(classifier, AssemblyMode::NameColumn),
        );

        let result = strategy.extract(&doc, 0, None).unwrap();
        assert_eq!(result.candidates.len(), 2);
        let ana = &result.candidates[0];
        assert_eq!(ana.name(), "Ana Lima");
        assert_eq!(ana.registration(), Some("101"));
        assert_eq!(ana.phone(), Some("(11) 5555-0101"));
        assert_eq!(ana.email(), Some("ana@limaleiloes.com.br"));
        let bruno = &result.candidates[1];
        assert_eq!(bruno.phone(), Some("(19) 5555-0202"));
        assert_eq!(bruno.email(), None);
    }
}
