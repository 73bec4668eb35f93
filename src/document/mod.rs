//! Page rendering for registry documents.
//!
//! A `Document` exposes per-page text layers and rasters, optionally
//! restricted to a fractional bounding box:
//! - `PopplerDocument` shells out to pdfinfo/pdftotext/pdftoppm (Poppler)
//! - `TextDocument` serves pre-extracted text, pages split on form feeds
//!
//! Page indexes are 0-based here; records carry 1-based page numbers.

mod poppler;
mod text;
mod tools;

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::TempDir;
use thiserror::Error;

pub use poppler::PopplerDocument;
pub use text::TextDocument;
pub use tools::{check_binary, check_tools};

/// Errors raised while reading pages.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("Unsupported input type: {0}")]
    UnsupportedInput(String),

    #[error("External tool not found: {0}")]
    ToolNotFound(String),

    #[error("Extraction failed: {0}")]
    ExtractionFailed(String),

    #[error("Page index {0} out of range")]
    PageOutOfRange(usize),

    #[error("No raster available: {0}")]
    NoRaster(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Page dimensions. Points for PDFs, characters/lines for text documents.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageInfo {
    pub width: f64,
    pub height: f64,
}

/// Rectangle in fractional page coordinates, origin top-left.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl BoundingBox {
    /// Build a box, clamping to [0, 1] and ordering the corners.
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        let clamp = |v: f64| if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) };
        let (x0, x1) = (clamp(x0), clamp(x1));
        let (y0, y1) = (clamp(y0), clamp(y1));
        Self {
            x0: x0.min(x1),
            y0: y0.min(y1),
            x1: x0.max(x1),
            y1: y0.max(y1),
        }
    }

    pub fn full() -> Self {
        Self::new(0.0, 0.0, 1.0, 1.0)
    }

    /// Full-width band dropping `top` and `bottom` fractions of the height.
    pub fn vertical_band(top: f64, bottom: f64) -> Self {
        Self::new(0.0, top, 1.0, 1.0 - bottom)
    }

    /// Full-height band between two absolute x positions on a page.
    pub fn from_x_range(x_start: f64, x_end: f64, page: &PageInfo) -> Self {
        if page.width <= 0.0 {
            return Self::full();
        }
        Self::new(x_start / page.width, 0.0, x_end / page.width, 1.0)
    }

    /// Restrict `self` to the area shared with `other`.
    pub fn intersect(&self, other: &BoundingBox) -> Self {
        let x0 = self.x0.max(other.x0);
        let y0 = self.y0.max(other.y0);
        Self::new(x0, y0, self.x1.min(other.x1).max(x0), self.y1.min(other.y1).max(y0))
    }

    pub fn is_empty(&self) -> bool {
        self.x1 - self.x0 <= f64::EPSILON || self.y1 - self.y0 <= f64::EPSILON
    }

    /// Scale to absolute `(x, y, width, height)` for a page of the given size.
    pub fn scaled(&self, width: f64, height: f64) -> (f64, f64, f64, f64) {
        (
            self.x0 * width,
            self.y0 * height,
            (self.x1 - self.x0) * width,
            (self.y1 - self.y0) * height,
        )
    }
}

/// A rendered page region on disk.
///
/// Keeps its temporary directory alive for as long as the raster exists.
#[derive(Debug, Clone)]
pub struct Raster {
    path: PathBuf,
    width: u32,
    height: u32,
    _dir: Option<Arc<TempDir>>,
}

impl Raster {
    pub fn new(dir: TempDir, path: PathBuf, width: u32, height: u32) -> Self {
        Self {
            path,
            width,
            height,
            _dir: Some(Arc::new(dir)),
        }
    }

    /// Wrap an image file that is owned elsewhere.
    pub fn from_file(path: impl Into<PathBuf>, width: u32, height: u32) -> Self {
        Self {
            path: path.into(),
            width,
            height,
            _dir: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}

/// A paged document the extraction strategies can read from.
pub trait Document: Send + Sync {
    /// Number of pages.
    fn page_count(&self) -> usize;

    /// Dimensions of the page at `index`.
    fn page(&self, index: usize) -> Result<PageInfo, DocumentError>;

    /// Text layer of the page, optionally cropped. `None` when the page has no text.
    fn extract_text(
        &self,
        index: usize,
        bbox: Option<&BoundingBox>,
    ) -> Result<Option<String>, DocumentError>;

    /// Render the page (or a region of it) at `resolution` dpi.
    fn to_image(
        &self,
        index: usize,
        resolution: u32,
        bbox: Option<&BoundingBox>,
    ) -> Result<Raster, DocumentError>;
}

/// Open a document, picking the implementation from the file's magic bytes.
pub fn open_document(path: &Path) -> Result<Arc<dyn Document>, DocumentError> {
    let mut file = File::open(path)?;
    let mut buffer = [0u8; 8192];
    let bytes_read = file.read(&mut buffer)?;
    let head = &buffer[..bytes_read];

    match infer::get(head).map(|kind| kind.mime_type()) {
        Some("application/pdf") => Ok(Arc::new(PopplerDocument::open(path)?)),
        Some(mime) if mime.starts_with("text/") => read_text_document(path),
        Some(other) => Err(DocumentError::UnsupportedInput(other.to_string())),
        // A read can end inside a multi-byte char; only reject real invalid sequences.
        None if std::str::from_utf8(head).is_ok()
            || std::str::from_utf8(head).is_err_and(|e| e.error_len().is_none()) =>
        {
            read_text_document(path)
        }
        None => Err(DocumentError::UnsupportedInput(
            "unrecognized binary content".to_string(),
        )),
    }
}

fn read_text_document(path: &Path) -> Result<Arc<dyn Document>, DocumentError> {
    let text = std::fs::read_to_string(path)?;
    Ok(Arc::new(TextDocument::from_text(&text)))
}
