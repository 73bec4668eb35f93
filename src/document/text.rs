//! Pre-extracted text served as a paged document.

use super::{BoundingBox, Document, DocumentError, PageInfo, Raster};

/// Text pages split on form feeds.
///
/// Geometry is measured in characters (width) and lines (height), so a
/// bounding box selects a line range and a column range.
#[derive(Debug, Clone, Default)]
pub struct TextDocument {
    pages: Vec<Vec<String>>,
}

impl TextDocument {
    pub fn from_text(text: &str) -> Self {
        let mut pages: Vec<Vec<String>> = text
            .split('\x0c')
            .map(|page| page.lines().map(|l| l.trim_end().to_string()).collect())
            .collect();
        // Trailing form feed leaves an empty page behind
        while pages
            .last()
            .is_some_and(|p: &Vec<String>| p.iter().all(|l| l.is_empty()))
        {
            pages.pop();
        }
        Self { pages }
    }

    pub fn from_pages<I, S>(pages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let joined: Vec<String> = pages.into_iter().map(|p| p.as_ref().to_string()).collect();
        let mut doc = Self::from_text(&joined.join("\x0c"));
        // Keep explicitly supplied blank pages so page numbers line up
        doc.pages.resize(joined.len(), Vec::new());
        doc
    }

    fn lines(&self, index: usize) -> Result<&[String], DocumentError> {
        self.pages
            .get(index)
            .map(Vec::as_slice)
            .ok_or(DocumentError::PageOutOfRange(index))
    }
}

fn page_info(lines: &[String]) -> PageInfo {
    PageInfo {
        width: lines.iter().map(|l| l.chars().count()).max().unwrap_or(0) as f64,
        height: lines.len() as f64,
    }
}

/// Cell range covered by a fractional span. Rounding slack keeps spans built
/// from whole cells (e.g. `15.0 / 58.0`) from spilling into a neighbour.
fn span(start: f64, end: f64, extent: f64) -> (usize, usize) {
    const SLACK: f64 = 1e-9;
    let first = (start * extent + SLACK).floor().max(0.0) as usize;
    let last = (end * extent - SLACK).ceil().max(0.0) as usize;
    (first, last)
}

impl Document for TextDocument {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page(&self, index: usize) -> Result<PageInfo, DocumentError> {
        self.lines(index).map(page_info)
    }

    fn extract_text(
        &self,
        index: usize,
        bbox: Option<&BoundingBox>,
    ) -> Result<Option<String>, DocumentError> {
        let lines = self.lines(index)?;
        let info = page_info(lines);
        let region = bbox.copied().unwrap_or_else(BoundingBox::full);

        let (first_line, last_line) = span(region.y0, region.y1, info.height);
        let (first_col, last_col) = span(region.x0, region.x1, info.width);

        let selected: Vec<String> = lines
            .iter()
            .take(last_line)
            .skip(first_line)
            .map(|line| {
                line.chars()
                    .take(last_col)
                    .skip(first_col)
                    .collect::<String>()
                    .trim_end()
                    .to_string()
            })
            .collect();

        let text = selected.join("\n");
        Ok(if text.trim().is_empty() { None } else { Some(text) })
    }

    fn to_image(
        &self,
        index: usize,
        _resolution: u32,
        _bbox: Option<&BoundingBox>,
    ) -> Result<Raster, DocumentError> {
        self.lines(index)?;
        Err(DocumentError::NoRaster(format!(
            "page {} of a text document has no image",
            index + 1
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pages_split_on_form_feed() {
        let doc = TextDocument::from_text("one\n\x0ctwo\nthree\n\x0c");
        assert_eq!(doc.page_count(), 2);
        assert_eq!(doc.extract_text(1, None).unwrap().as_deref(), Some("two\nthree"));
    }

    #[test]
    fn test_from_pages_keeps_blank_pages() {
        let doc = TextDocument::from_pages(["ANA LIMA", "", "   "]);
        assert_eq!(doc.page_count(), 3);
        assert_eq!(doc.extract_text(2, None).unwrap(), None);
    }

    #[test]
    fn test_page_geometry() {
        let doc = TextDocument::from_text("abc\nabcdef\n");
        let info = doc.page(0).unwrap();
        assert_eq!(info.width, 6.0);
        assert_eq!(info.height, 2.0);
    }

    #[test]
    fn test_bbox_selects_lines_and_columns() {
        let text = "HEADER LINE\nLEFT      RIGHT\nLEFT2     RIGHT2\nFOOTER";
        let doc = TextDocument::from_text(text);
        let body = BoundingBox::vertical_band(0.25, 0.25);
        assert_eq!(
            doc.extract_text(0, Some(&body)).unwrap().as_deref(),
            Some("LEFT      RIGHT\nLEFT2     RIGHT2")
        );

        let left = BoundingBox::new(0.0, 0.25, 0.4, 0.75);
        assert_eq!(
            doc.extract_text(0, Some(&left)).unwrap().as_deref(),
            Some("LEFT\nLEFT2")
        );
    }

    #[test]
    fn test_to_image_is_unavailable() {
        let doc = TextDocument::from_text("ANA LIMA");
        assert!(matches!(doc.to_image(0, 150, None), Err(DocumentError::NoRaster(_))));
        assert!(matches!(
            doc.to_image(4, 150, None),
            Err(DocumentError::PageOutOfRange(4))
        ));
    }
}
