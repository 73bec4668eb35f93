//! Optical character recognition for rendered page regions.
//!
//! Tesseract is the only bundled backend; anything implementing
//! `OcrBackend` can stand in for it (tests use a canned-text backend).

mod backend;
mod recognizer;
mod tesseract;

pub use backend::{OcrBackend, OcrError, OcrResult};
pub use recognizer::{usable_chars, Recognition, TextRecognizer, DEFAULT_MIN_CHARS};
pub use tesseract::TesseractBackend;
