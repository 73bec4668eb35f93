//! OCR backend abstraction.

use std::path::Path;

use thiserror::Error;

/// Errors from OCR backends.
#[derive(Debug, Error)]
pub enum OcrError {
    #[error("OCR backend not available: {0}")]
    BackendNotAvailable(String),

    #[error("OCR failed: {0}")]
    OcrFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result of one recognition pass.
#[derive(Debug, Clone)]
pub struct OcrResult {
    pub text: String,
    pub backend: &'static str,
    pub processing_time_ms: u64,
}

/// An engine that turns an image file into text.
pub trait OcrBackend: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    /// Check if this backend can run on this machine.
    fn is_available(&self) -> bool;

    /// Human-readable hint on how to make the backend available.
    fn availability_hint(&self) -> String;

    /// Recognize text in an image. `language` is a Tesseract-style language
    /// code (e.g. "por"); `None` lets the engine use its default model.
    fn ocr_image(&self, image_path: &Path, language: Option<&str>) -> Result<OcrResult, OcrError>;
}
