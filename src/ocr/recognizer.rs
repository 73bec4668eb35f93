//! Text recognition with a language-free fallback pass.

use std::sync::Arc;

use super::backend::{OcrBackend, OcrError};
use crate::document::Raster;

/// Default threshold for a usable recognition pass.
pub const DEFAULT_MIN_CHARS: usize = 50;

/// Text recognized from one raster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recognition {
    pub text: String,
    /// True when the language-free pass produced `text`.
    pub fallback_used: bool,
}

/// Runs an OCR backend over rasters.
///
/// The primary pass uses the configured language. When it yields fewer than
/// `min_chars` non-whitespace characters (or fails outright), a second pass
/// runs without a language hint and the richer of the two results is kept.
#[derive(Clone)]
pub struct TextRecognizer {
    backend: Arc<dyn OcrBackend>,
    language: Option<String>,
    min_chars: usize,
}

impl TextRecognizer {
    pub fn new(backend: Arc<dyn OcrBackend>, language: Option<String>, min_chars: usize) -> Self {
        Self {
            backend,
            language: language.filter(|l| !l.trim().is_empty()),
            min_chars,
        }
    }

    pub fn backend(&self) -> &dyn OcrBackend {
        self.backend.as_ref()
    }

    pub fn recognize(&self, raster: &Raster) -> Result<Recognition, OcrError> {
        let primary = match self.backend.ocr_image(raster.path(), self.language.as_deref()) {
            Ok(result) => Some(result.text),
            Err(OcrError::BackendNotAvailable(hint)) => {
                return Err(OcrError::BackendNotAvailable(hint))
            }
            Err(e) => {
                tracing::debug!("Primary OCR pass failed on {}: {}", raster.path().display(), e);
                None
            }
        };

        if let Some(text) = &primary {
            if usable_chars(text) >= self.min_chars {
                return Ok(Recognition {
                    text: text.clone(),
                    fallback_used: false,
                });
            }
        }

        tracing::debug!(
            "Primary OCR pass too short on {}, retrying without language hint",
            raster.path().display()
        );
        let fallback = match self.backend.ocr_image(raster.path(), None) {
            Ok(result) => result.text,
            Err(e) => return primary.map(|text| Recognition { text, fallback_used: false }).ok_or(e),
        };

        match primary {
            Some(text) if usable_chars(&text) >= usable_chars(&fallback) => Ok(Recognition {
                text,
                fallback_used: false,
            }),
            _ => Ok(Recognition {
                text: fallback,
                fallback_used: true,
            }),
        }
    }
}

/// Count of non-whitespace characters.
pub fn usable_chars(text: &str) -> usize {
    text.chars().filter(|c| !c.is_whitespace()).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocr::OcrResult;
    use std::path::Path;
    use std::sync::Mutex;

    /// Answers from a script keyed on whether a language was given.
    struct ScriptedBackend {
        with_language: Result<String, ()>,
        without_language: String,
        calls: Mutex<Vec<Option<String>>>,
    }

    impl ScriptedBackend {
        fn new(with_language: Result<&str, ()>, without_language: &str) -> Self {
            Self {
                with_language: with_language.map(str::to_string),
                without_language: without_language.to_string(),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    impl OcrBackend for ScriptedBackend {
        fn name(&self) -> &'static str {
            "scripted"
        }

        fn is_available(&self) -> bool {
            true
        }

        fn availability_hint(&self) -> String {
            String::new()
        }

        fn ocr_image(&self, _path: &Path, language: Option<&str>) -> Result<OcrResult, OcrError> {
            self.calls.lock().unwrap().push(language.map(str::to_string));
            let text = match language {
                Some(_) => self
                    .with_language
                    .clone()
                    .map_err(|_| OcrError::OcrFailed("missing traineddata".into()))?,
                None => self.without_language.clone(),
            };
            Ok(OcrResult {
                text,
                backend: "scripted",
                processing_time_ms: 0,
            })
        }
    }

    fn raster() -> Raster {
        Raster::from_file("/tmp/page.png", 10, 10)
    }

    #[test]
    fn test_primary_pass_is_enough() {
        let long = "MARIA SOUZA maria@souzaleiloes.com.br ".repeat(3);
        let backend = Arc::new(ScriptedBackend::new(Ok(long.as_str()), "unused"));
        let recognizer = TextRecognizer::new(backend.clone(), Some("por".into()), 50);
        let result = recognizer.recognize(&raster()).unwrap();
        assert!(!result.fallback_used);
        assert_eq!(*backend.calls.lock().unwrap(), vec![Some("por".to_string())]);
    }

    #[test]
    fn test_short_primary_triggers_fallback() {
        let long = "ANA LIMA ana@limaleiloes.com.br\n".repeat(3);
        let backend = Arc::new(ScriptedBackend::new(Ok("~ ."), &long));
        let recognizer = TextRecognizer::new(backend.clone(), Some("por".into()), 50);
        let result = recognizer.recognize(&raster()).unwrap();
        assert!(result.fallback_used);
        assert_eq!(result.text, long);
        assert_eq!(backend.calls.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_failed_primary_uses_fallback() {
        let backend = Arc::new(ScriptedBackend::new(Err(()), "BRUNO REIS"));
        let recognizer = TextRecognizer::new(backend, Some("por".into()), 50);
        let result = recognizer.recognize(&raster()).unwrap();
        assert!(result.fallback_used);
        assert_eq!(result.text, "BRUNO REIS");
    }

    #[test]
    fn test_short_fallback_keeps_richer_primary() {
        let backend = Arc::new(ScriptedBackend::new(Ok("CARLOS MOTA"), "C"));
        let recognizer = TextRecognizer::new(backend, Some("por".into()), 50);
        let result = recognizer.recognize(&raster()).unwrap();
        assert!(!result.fallback_used);
        assert_eq!(result.text, "CARLOS MOTA");
    }

    #[test]
    fn test_blank_language_is_no_language() {
        let backend = Arc::new(ScriptedBackend::new(Ok("x"), "y"));
        let recognizer = TextRecognizer::new(backend.clone(), Some("  ".into()), 50);
        recognizer.recognize(&raster()).unwrap();
        assert!(backend.calls.lock().unwrap().iter().all(Option::is_none));
    }
}
