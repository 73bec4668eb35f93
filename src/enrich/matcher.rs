//! Name matching against the enrichment dataset.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use super::dataset::{Dataset, DatasetEntry};
use crate::models::{comparable_name, normalize_name, NormalizedKey};

/// How a record matched a dataset entry, strongest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    ExactKey,
    ExactName,
    Containment,
    Similarity,
}

struct IndexedName {
    padded: String,
    tokens: HashSet<String>,
    entry: usize,
}

/// Read-only lookup structure over a dataset. Build once, share behind `Arc`.
pub struct EnrichmentIndex {
    entries: Vec<DatasetEntry>,
    by_key: HashMap<NormalizedKey, usize>,
    by_name: HashMap<String, usize>,
    names: Vec<IndexedName>,
    threshold: f64,
}

impl EnrichmentIndex {
    pub fn new(dataset: &Dataset, threshold: f64) -> Self {
        let entries = dataset.entries().to_vec();
        let mut by_key = HashMap::new();
        let mut by_name = HashMap::new();
        let mut names = Vec::with_capacity(entries.len());

        for (i, entry) in entries.iter().enumerate() {
            by_key
                .entry(NormalizedKey::new(&entry.name, entry.email.as_deref()))
                .or_insert(i);
            by_name.entry(normalize_name(&entry.name)).or_insert(i);

            let comparable = comparable_name(&entry.name);
            if !comparable.is_empty() {
                names.push(IndexedName {
                    tokens: comparable.split(' ').map(str::to_string).collect(),
                    padded: format!(" {} ", comparable),
                    entry: i,
                });
            }
        }

        Self {
            entries,
            by_key,
            by_name,
            names,
            threshold,
        }
    }

    pub fn empty() -> Self {
        Self::new(&Dataset::default(), 1.0)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Find the best entry for a record.
    ///
    /// Exact key, then exact name, then whole-word containment either way,
    /// then token-set Jaccard similarity above the threshold. Ties go to the
    /// entry listed first in the dataset.
    pub fn find(&self, name: &str, email: Option<&str>) -> Option<(&DatasetEntry, MatchKind)> {
        if self.entries.is_empty() {
            return None;
        }
        if let Some(&i) = self.by_key.get(&NormalizedKey::new(name, email)) {
            return Some((&self.entries[i], MatchKind::ExactKey));
        }
        if let Some(&i) = self.by_name.get(&normalize_name(name)) {
            return Some((&self.entries[i], MatchKind::ExactName));
        }

        let comparable = comparable_name(name);
        if comparable.is_empty() {
            return None;
        }
        let padded = format!(" {} ", comparable);
        if let Some(hit) = self
            .names
            .iter()
            .find(|n| n.padded.contains(&padded) || padded.contains(&n.padded))
        {
            return Some((&self.entries[hit.entry], MatchKind::Containment));
        }

        let tokens: HashSet<String> = comparable.split(' ').map(str::to_string).collect();
        let mut best: Option<(f64, usize)> = None;
        for n in &self.names {
            let score = jaccard(&tokens, &n.tokens);
            if score > self.threshold && best.map_or(true, |(s, _)| score > s) {
                best = Some((score, n.entry));
            }
        }
        best.map(|(_, i)| (&self.entries[i], MatchKind::Similarity))
    }
}

/// Token-set Jaccard similarity.
pub fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(b).count() as f64 / union as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, email: Option<&str>) -> DatasetEntry {
        DatasetEntry {
            name: name.to_string(),
            email: email.map(str::to_string),
            site: None,
        }
    }

    fn index() -> EnrichmentIndex {
        let dataset = Dataset::new(vec![
            entry("Ana Lima", Some("ana@lima.com.br")),
            entry("Ana Lima", Some("outra@lima.com.br")),
            entry("Bruno de Souza Reis", Some("bruno@reis.com.br")),
            entry("Carla Mota Leiloes Oficiais", Some("carla@mota.com.br")),
            entry("Joaquim Pereira Santos Filho", None),
        ]);
        EnrichmentIndex::new(&dataset, 0.7)
    }

    #[test]
    fn test_exact_key_beats_exact_name() {
        let idx = index();
        let (hit, kind) = idx.find("ANA LIMA", Some("outra@lima.com.br")).unwrap();
        assert_eq!(kind, MatchKind::ExactKey);
        assert_eq!(hit.email.as_deref(), Some("outra@lima.com.br"));

        let (hit, kind) = idx.find("Aná  Lima", None).unwrap();
        assert_eq!(kind, MatchKind::ExactName);
        assert_eq!(hit.email.as_deref(), Some("ana@lima.com.br"));
    }

    #[test]
    fn test_containment_either_way() {
        let idx = index();
        let (hit, kind) = idx.find("Carla Mota", None).unwrap();
        assert_eq!(kind, MatchKind::Containment);
        assert_eq!(hit.name, "Carla Mota Leiloes Oficiais");

        let (hit, kind) = idx.find("Sr. Bruno de Souza Reis Junior", None).unwrap();
        assert_eq!(kind, MatchKind::Containment);
        assert_eq!(hit.name, "Bruno de Souza Reis");
    }

    #[test]
    fn test_containment_needs_whole_words() {
        let idx = index();
        assert!(idx.find("Ana Lim", None).is_none());
    }

    #[test]
    fn test_similarity_above_threshold() {
        let idx = index();
        // 4 of 5 tokens shared: 0.8
        let (hit, kind) = idx.find("Joaquim Pereira Santos Neto Filho", None).unwrap();
        assert_eq!(kind, MatchKind::Similarity);
        assert_eq!(hit.name, "Joaquim Pereira Santos Filho");
        // 2 of 4 tokens: 0.5
        assert!(idx.find("Joaquim Pereira Gomes Silva", None).is_none());
    }

    #[test]
    fn test_empty_index_matches_nothing() {
        assert!(EnrichmentIndex::empty().find("Ana Lima", None).is_none());
    }

    #[test]
    fn test_jaccard() {
        let set = |s: &str| s.split(' ').map(str::to_string).collect::<HashSet<_>>();
        assert_eq!(jaccard(&set("a b"), &set("a b")), 1.0);
        assert_eq!(jaccard(&set("a b"), &set("c d")), 0.0);
        assert_eq!(jaccard(&HashSet::new(), &HashSet::new()), 0.0);
    }
}
