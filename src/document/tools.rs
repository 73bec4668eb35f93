//! Helpers for the external Poppler and Tesseract binaries.

use std::io::ErrorKind;
use std::process::{ExitStatus, Output};

use super::DocumentError;

pub(crate) const PDFTOTEXT: &str = "pdftotext (install poppler-utils)";
pub(crate) const PDFTOPPM: &str = "pdftoppm (install poppler-utils)";
pub(crate) const PDFINFO: &str = "pdfinfo (install poppler-utils)";

/// Binaries the PDF and OCR paths rely on.
const REQUIRED_TOOLS: [&str; 4] = ["pdftotext", "pdftoppm", "pdfinfo", "tesseract"];

/// Check if a binary is available in PATH.
pub fn check_binary(name: &str) -> bool {
    which::which(name).is_ok()
}

/// Availability of every external tool, in a fixed order.
pub fn check_tools() -> Vec<(String, bool)> {
    REQUIRED_TOOLS
        .iter()
        .map(|tool| (tool.to_string(), check_binary(tool)))
        .collect()
}

/// Extract stdout on success or map the failure to a `DocumentError`.
pub(crate) fn handle_cmd_output(
    result: std::io::Result<Output>,
    tool_name: &str,
    error_prefix: &str,
) -> Result<String, DocumentError> {
    match result {
        Ok(output) => {
            if output.status.success() {
                Ok(String::from_utf8_lossy(&output.stdout).to_string())
            } else {
                let stderr = String::from_utf8_lossy(&output.stderr);
                Err(DocumentError::ExtractionFailed(format!(
                    "{}: {}",
                    error_prefix,
                    stderr.trim()
                )))
            }
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {
            Err(DocumentError::ToolNotFound(tool_name.to_string()))
        }
        Err(e) => Err(DocumentError::Io(e)),
    }
}

/// Check command status, returning appropriate error on failure.
pub(crate) fn check_cmd_status(
    result: std::io::Result<ExitStatus>,
    tool_name: &str,
    error_msg: &str,
) -> Result<(), DocumentError> {
    match result {
        Ok(s) if s.success() => Ok(()),
        Ok(_) => Err(DocumentError::ExtractionFailed(error_msg.to_string())),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            Err(DocumentError::ToolNotFound(tool_name.to_string()))
        }
        Err(e) => Err(DocumentError::Io(e)),
    }
}
