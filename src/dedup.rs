//! Record deduplication by normalized key.

use std::collections::HashSet;

use crate::models::Keyed;

/// Keep the first record seen for each `NormalizedKey`, preserving order.
///
/// Callers control which duplicate survives by ordering the input.
pub fn dedup<T: Keyed>(records: impl IntoIterator<Item = T>) -> Vec<T> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|record| seen.insert(record.key()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CandidateRecord, SourceStrategy};

    fn record(name: &str, email: Option<&str>, strategy: SourceStrategy) -> CandidateRecord {
        CandidateRecord::new(name, 1, strategy)
            .unwrap()
            .with_email(email.map(str::to_string))
    }

    #[test]
    fn test_same_name_and_email_from_two_passes() {
        let records = vec![
            record("MARIA SOUZA", Some("maria@souza.com.br"), SourceStrategy::DirectText),
            record("Maria  Souza", Some("MARIA@souza.com.br"), SourceStrategy::Ocr),
        ];
        let kept = dedup(records);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].source_strategy(), SourceStrategy::DirectText);
    }

    #[test]
    fn test_accents_do_not_split_identity() {
        let kept = dedup(vec![
            record("José Araújo", None, SourceStrategy::Ocr),
            record("JOSE ARAUJO", None, SourceStrategy::OcrCrop),
        ]);
        assert_eq!(kept.len(), 1);
    }

    #[test]
    fn test_different_email_is_a_different_entity() {
        let kept = dedup(vec![
            record("ANA LIMA", Some("ana@lima.com.br"), SourceStrategy::DirectText),
            record("ANA LIMA", None, SourceStrategy::DirectText),
        ]);
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn test_idempotent_and_unique() {
        let records = vec![
            record("A B C", Some("x@y.com"), SourceStrategy::Ocr),
            record("D E F", None, SourceStrategy::Ocr),
            record("a b c", Some("x@y.com"), SourceStrategy::DirectText),
            record("D E F", None, SourceStrategy::FixedColumns),
            record("G H I", Some("g@h.com"), SourceStrategy::Ocr),
        ];
        let once = dedup(records);
        let twice = dedup(once.clone());
        assert_eq!(once, twice);

        let keys: HashSet<_> = once.iter().map(Keyed::key).collect();
        assert_eq!(keys.len(), once.len());
        assert_eq!(once.len(), 3);
    }
}
