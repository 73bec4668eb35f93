//! Identity key used for deduplication and dataset matching.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Case, accent and whitespace insensitive identity of a record.
///
/// Never serialized; two records with equal keys describe the same entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NormalizedKey {
    name: String,
    email: String,
}

impl NormalizedKey {
    pub fn new(name: &str, email: Option<&str>) -> Self {
        Self {
            name: normalize_name(name),
            email: email
                .map(|e| e.trim().to_lowercase())
                .unwrap_or_default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }
}

/// Records that expose a `NormalizedKey`.
pub trait Keyed {
    fn key(&self) -> NormalizedKey;
}

/// Upper-case, strip diacritics and collapse runs of whitespace.
pub fn normalize_name(name: &str) -> String {
    let folded: String = name
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_uppercase();
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// `normalize_name` with punctuation removed, for fuzzy comparisons.
pub fn comparable_name(name: &str) -> String {
    let stripped: String = normalize_name(name)
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}
