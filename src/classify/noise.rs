//! Line-level noise filtering.
//!
//! Registry pages mix entries with watermarks, table headers, addresses and
//! page furniture. `NoiseClassifier` decides which lines can carry a name.

use std::collections::HashSet;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::config::{ConfigError, NoiseConfig};
use crate::models::normalize_name;

/// `number-number` or `number/number`, as in street numbers and zip codes.
static NUMBER_RANGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+\s*[-/]\s*\d+").expect("number range pattern should compile"));

/// Rule that rejected a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoiseRule {
    /// Blank line.
    Empty,
    /// Watermark or boilerplate text.
    Boilerplate,
    /// Table header.
    Header,
    /// Street address fragment.
    Address,
    /// Too many digits for a name.
    TooManyDigits,
    /// Shorter than the minimum name length.
    TooShort,
    /// No letters at all.
    NoLetters,
}

impl NoiseRule {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Boilerplate => "boilerplate",
            Self::Header => "header",
            Self::Address => "address",
            Self::TooManyDigits => "too_many_digits",
            Self::TooShort => "too_short",
            Self::NoLetters => "no_letters",
        }
    }
}

impl fmt::Display for NoiseRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Verdict for one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case", tag = "class", content = "rule")]
pub enum LineClass {
    /// May hold a name or a name/email pair.
    Candidate,
    Noise(NoiseRule),
}

impl LineClass {
    pub fn is_candidate(&self) -> bool {
        matches!(self, Self::Candidate)
    }

    pub fn is_noise(&self) -> bool {
        !self.is_candidate()
    }

    pub fn rule(&self) -> Option<NoiseRule> {
        match self {
            Self::Candidate => None,
            Self::Noise(rule) => Some(*rule),
        }
    }
}

/// Classifies lines as noise or name candidates.
///
/// Pure and deterministic: the verdict depends only on the line and the
/// rules the classifier was built with.
#[derive(Debug, Clone)]
pub struct NoiseClassifier {
    boilerplate: Vec<String>,
    header_tokens: HashSet<String>,
    address: Option<Regex>,
    min_length: usize,
    max_digits: usize,
}

impl NoiseClassifier {
    pub fn new(config: &NoiseConfig) -> Result<Self, ConfigError> {
        let boilerplate = config
            .boilerplate
            .iter()
            .map(|p| normalize_name(p))
            .filter(|p| !p.is_empty())
            .collect();
        let header_tokens = config
            .header_tokens
            .iter()
            .map(|t| header_form(t))
            .filter(|t| !t.is_empty())
            .collect();

        let keywords: Vec<String> = config
            .address_keywords
            .iter()
            .map(|k| k.trim())
            .filter(|k| !k.is_empty())
            .map(regex::escape)
            .collect();
        let address = if keywords.is_empty() {
            None
        } else {
            let pattern = format!(
                r"(?i)(?:^|[^\p{{L}}\p{{N}}])(?:{})(?:[^\p{{L}}\p{{N}}]|$)",
                keywords.join("|")
            );
            Some(
                Regex::new(&pattern)
                    .map_err(|e| ConfigError::Invalid(format!("noise.address_keywords: {}", e)))?,
            )
        };

        Ok(Self {
            boilerplate,
            header_tokens,
            address,
            min_length: config.min_length,
            max_digits: config.max_digits,
        })
    }

    pub fn min_length(&self) -> usize {
        self.min_length
    }

    /// Full classification of a line.
    pub fn classify(&self, line: &str) -> LineClass {
        if let Some(rule) = self.layout_noise(line) {
            return LineClass::Noise(rule);
        }
        let line = line.trim();
        if self.is_address(line) {
            return LineClass::Noise(NoiseRule::Address);
        }
        if line.chars().filter(|c| c.is_ascii_digit()).count() > self.max_digits {
            return LineClass::Noise(NoiseRule::TooManyDigits);
        }
        if line.chars().count() < self.min_length {
            return LineClass::Noise(NoiseRule::TooShort);
        }
        if !line.chars().any(char::is_alphabetic) {
            return LineClass::Noise(NoiseRule::NoLetters);
        }
        LineClass::Candidate
    }

    /// Rules that reject a whole line regardless of what it carries:
    /// blank lines, boilerplate and table headers.
    pub fn layout_noise(&self, line: &str) -> Option<NoiseRule> {
        let line = line.trim();
        if line.is_empty() {
            return Some(NoiseRule::Empty);
        }
        let folded = normalize_name(line);
        if self.boilerplate.iter().any(|p| folded.contains(p.as_str())) {
            return Some(NoiseRule::Boilerplate);
        }
        if self.header_tokens.contains(&header_form(line)) {
            return Some(NoiseRule::Header);
        }
        None
    }

    fn is_address(&self, line: &str) -> bool {
        NUMBER_RANGE.is_match(line) || self.address.as_ref().is_some_and(|re| re.is_match(line))
    }
}

/// Header comparison form: folded, with surrounding punctuation removed.
fn header_form(text: &str) -> String {
    normalize_name(text.trim_matches(|c: char| !c.is_alphanumeric()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> NoiseClassifier {
        NoiseClassifier::new(&NoiseConfig::default()).unwrap()
    }

    #[test]
    fn test_plain_name_is_candidate() {
        let c = classifier();
        assert_eq!(c.classify("JOAO DA SILVA"), LineClass::Candidate);
        assert_eq!(c.classify("  Maria Souza  "), LineClass::Candidate);
        assert_eq!(c.classify("Ávila Leilões"), LineClass::Candidate);
    }

    #[test]
    fn test_boilerplate_is_case_and_accent_insensitive() {
        let c = classifier();
        assert_eq!(
            c.classify("licensed to JUCESP - uso interno"),
            LineClass::Noise(NoiseRule::Boilerplate)
        );
        assert_eq!(
            c.classify("MATRICULA 123 POSSE 2001"),
            LineClass::Noise(NoiseRule::Boilerplate)
        );
    }

    #[test]
    fn test_header_tokens() {
        let c = classifier();
        assert_eq!(c.classify("Nome:"), LineClass::Noise(NoiseRule::Header));
        assert_eq!(c.classify("ENDERECO"), LineClass::Noise(NoiseRule::Header));
        // Header words inside a longer line are not headers
        assert_eq!(c.classify("NOME SOBRENOME"), LineClass::Candidate);
    }

    #[test]
    fn test_address_rules() {
        let c = classifier();
        assert_eq!(
            c.classify("RUA DAS FLORES, 123"),
            LineClass::Noise(NoiseRule::Address)
        );
        assert_eq!(
            c.classify("Av. Paulista cj 12"),
            LineClass::Noise(NoiseRule::Address)
        );
        assert_eq!(c.classify("Bloco B"), LineClass::Noise(NoiseRule::Address));
        assert_eq!(c.classify("12-34"), LineClass::Noise(NoiseRule::Address));
        assert_eq!(c.classify("S/N Centro"), LineClass::Noise(NoiseRule::Address));
        // Keywords only match whole words
        assert_eq!(c.classify("AVILA RUAN"), LineClass::Candidate);
    }

    #[test]
    fn test_digits_and_length() {
        let c = classifier();
        assert_eq!(
            c.classify("ANA 1234"),
            LineClass::Noise(NoiseRule::TooManyDigits)
        );
        assert_eq!(c.classify("ANA 12"), LineClass::Candidate);
        assert_eq!(c.classify("AB"), LineClass::Noise(NoiseRule::TooShort));
        assert_eq!(c.classify("---"), LineClass::Noise(NoiseRule::NoLetters));
    }

    #[test]
    fn test_total_and_deterministic() {
        let c = classifier();
        for line in ["", "   ", "\t", "é", "🙂🙂🙂", "x@y", "RUA", "NOME"] {
            let first = c.classify(line);
            assert_eq!(first, c.classify(line));
        }
        assert_eq!(c.classify(""), LineClass::Noise(NoiseRule::Empty));
        assert_eq!(c.classify(" \t "), LineClass::Noise(NoiseRule::Empty));
    }

    #[test]
    fn test_tunable_digit_limit() {
        let config = NoiseConfig {
            max_digits: 4,
            ..NoiseConfig::default()
        };
        let c = NoiseClassifier::new(&config).unwrap();
        assert_eq!(c.classify("ANA 1234"), LineClass::Candidate);
    }
}
