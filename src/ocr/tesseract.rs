//! Tesseract OCR backend.
//!
//! Runs the `tesseract` command-line tool on rendered page images.

use std::path::Path;
use std::process::Command;
use std::time::Instant;

use super::backend::{OcrBackend, OcrError, OcrResult};
use crate::document::check_binary;

/// Tesseract OCR backend.
#[derive(Debug, Clone)]
pub struct TesseractBackend {
    binary: String,
}

impl TesseractBackend {
    pub fn new() -> Self {
        Self {
            binary: "tesseract".to_string(),
        }
    }

    /// Use a tesseract binary other than the one on PATH.
    pub fn with_binary(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    fn run_tesseract(&self, image_path: &Path, language: Option<&str>) -> Result<String, OcrError> {
        let mut cmd = Command::new(&self.binary);
        cmd.arg(image_path).arg("stdout");
        if let Some(lang) = language {
            cmd.args(["-l", lang]);
        }

        match cmd.output() {
            Ok(output) => {
                if output.status.success() {
                    Ok(String::from_utf8_lossy(&output.stdout).to_string())
                } else {
                    let stderr = String::from_utf8_lossy(&output.stderr);
                    Err(OcrError::OcrFailed(format!(
                        "tesseract failed: {}",
                        stderr.trim()
                    )))
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(
                OcrError::BackendNotAvailable(format!("{} not found (install tesseract-ocr)", self.binary)),
            ),
            Err(e) => Err(OcrError::Io(e)),
        }
    }
}

impl Default for TesseractBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl OcrBackend for TesseractBackend {
    fn name(&self) -> &'static str {
        "tesseract"
    }

    fn is_available(&self) -> bool {
        check_binary(&self.binary)
    }

    fn availability_hint(&self) -> String {
        if !self.is_available() {
            "Tesseract not installed. Install with: apt install tesseract-ocr tesseract-ocr-por"
                .to_string()
        } else if !check_binary("pdftoppm") {
            "pdftoppm not installed. Install with: apt install poppler-utils".to_string()
        } else {
            "Tesseract is available".to_string()
        }
    }

    fn ocr_image(&self, image_path: &Path, language: Option<&str>) -> Result<OcrResult, OcrError> {
        let start = Instant::now();
        let text = self.run_tesseract(image_path, language)?;
        Ok(OcrResult {
            text,
            backend: self.name(),
            processing_time_ms: start.elapsed().as_millis() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_binary_is_not_available() {
        let backend = TesseractBackend::with_binary("rollsift-no-such-tesseract");
        assert!(!backend.is_available());
        assert!(backend.availability_hint().contains("apt install"));
        let err = backend
            .ocr_image(Path::new("/nonexistent.png"), Some("por"))
            .unwrap_err();
        assert!(matches!(err, OcrError::BackendNotAvailable(_)));
    }
}
