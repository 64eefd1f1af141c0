use dashmap::DashMap;
use fnv::FnvBuildHasher;
use std::sync::Arc;

use crate::matcher::find_occurrences;
use crate::peptide::{Peptide, ProteinRecord};

/// Identity and bounds handed to an external cleavage function. The rule
/// table itself (cleavage sites, terminal behavior) lives outside this crate
/// and is treated as opaque.
#[derive(Debug, Clone)]
pub struct EnzymeRule {
    pub id: Arc<str>,
    /// Inclusive
    pub min_len: usize,
    /// Inclusive
    pub max_len: usize,
    pub max_missed_cleavages: usize,
}

type CacheKey = (Arc<str>, Arc<str>);

/// Session-scoped cache of in-silico digestion results, keyed by
/// `(enzyme, protein group)`.
///
/// Entries are never invalidated automatically: if a protein sequence is
/// edited after its digest was cached, the entry is stale until the caller
/// calls [`DigestionAssay::invalidate`]. Concurrent digestion of the same key
/// may duplicate work (one result wins), never corrupt the cache.
#[derive(Default)]
pub struct DigestionAssay {
    cache: DashMap<CacheKey, Arc<Vec<Peptide>>, FnvBuildHasher>,
}

impl DigestionAssay {
    pub fn new() -> DigestionAssay {
        DigestionAssay::default()
    }

    /// Digest `protein` with the external cleavage function, re-resolving
    /// each product's position(s) on the protein via substring search.
    ///
    /// A cached non-empty result for `(enzyme, protein)` is returned as-is
    /// without invoking `cleave`. Every occurrence of a product synthesizes
    /// one recalculated, zero-intensity peptide; products not found verbatim
    /// in the protein sequence are dropped.
    pub fn digest<F>(
        &self,
        protein: &ProteinRecord,
        enzyme: &EnzymeRule,
        cleave: F,
    ) -> Arc<Vec<Peptide>>
    where
        F: FnOnce(&str, usize, usize, usize) -> Vec<String>,
    {
        let key = (enzyme.id.clone(), protein.id.clone());
        if let Some(cached) = self.cache.get(&key) {
            if !cached.is_empty() {
                return cached.clone();
            }
        }

        let candidates = cleave(
            protein.sequence(),
            enzyme.min_len,
            enzyme.max_len,
            enzyme.max_missed_cleavages,
        );

        let mut peptides = Vec::new();
        for candidate in candidates {
            let occurrences = find_occurrences(&candidate, protein.sequence());
            if occurrences.is_empty() {
                log::debug!(
                    "digestion product {} ({}) not found in {}",
                    candidate,
                    enzyme.id,
                    protein.id
                );
                continue;
            }
            for (start, _) in occurrences {
                let mut peptide = Peptide::new(candidate.clone(), start);
                peptide.is_recalculated = true;
                peptides.push(peptide);
            }
        }

        let peptides = Arc::new(peptides);
        self.cache.insert(key, peptides.clone());
        peptides
    }

    /// Whether a non-empty digest is cached for this pair
    pub fn contains(&self, enzyme: &EnzymeRule, protein: &ProteinRecord) -> bool {
        self.cache
            .get(&(enzyme.id.clone(), protein.id.clone()))
            .map(|cached| !cached.is_empty())
            .unwrap_or(false)
    }

    /// Drop the cached digest for one `(enzyme, protein)` pair, forcing the
    /// next [`DigestionAssay::digest`] call to recompute
    pub fn invalidate(&self, enzyme: &EnzymeRule, protein: &ProteinRecord) {
        self.cache.remove(&(enzyme.id.clone(), protein.id.clone()));
    }

    pub fn clear(&self) {
        self.cache.clear();
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::cell::Cell;

    fn trypsin() -> EnzymeRule {
        EnzymeRule {
            id: "Trypsin".into(),
            min_len: 2,
            max_len: 7,
            max_missed_cleavages: 2,
        }
    }

    fn protein() -> ProteinRecord {
        ProteinRecord::new("PG1", vec![], "MKWVTFISLK").unwrap()
    }

    #[test]
    fn products_are_placed_and_recalculated() {
        let assay = DigestionAssay::new();
        let peptides = assay.digest(&protein(), &trypsin(), |_, _, _, _| {
            vec!["MK".to_string(), "WVTFISLK".to_string()]
        });

        assert_eq!(peptides.len(), 2);
        assert_eq!((peptides[0].start, peptides[0].end), (1, 2));
        assert_eq!((peptides[1].start, peptides[1].end), (3, 10));
        assert!(peptides.iter().all(|p| p.is_recalculated));
        assert!(peptides.iter().all(|p| p.total_intensity == 0));
    }

    #[test]
    fn unmatched_products_dropped() {
        let assay = DigestionAssay::new();
        let peptides = assay.digest(&protein(), &trypsin(), |_, _, _, _| {
            vec!["MK".to_string(), "QQQQ".to_string()]
        });
        assert_eq!(peptides.len(), 1);
        assert_eq!(peptides[0].sequence, "MK");
    }

    #[test]
    fn repeated_products_get_every_occurrence() {
        let protein = ProteinRecord::new("PG2", vec![], "MKAMKA").unwrap();
        let assay = DigestionAssay::new();
        let peptides = assay.digest(&protein, &trypsin(), |_, _, _, _| {
            vec!["MKA".to_string()]
        });
        assert_eq!(peptides.len(), 2);
        assert_eq!((peptides[0].start, peptides[0].end), (1, 3));
        assert_eq!((peptides[1].start, peptides[1].end), (4, 6));
    }

    #[test]
    fn cache_hit_skips_cleavage() {
        let assay = DigestionAssay::new();
        let protein = protein();
        let enzyme = trypsin();
        let calls = Cell::new(0);

        let first = assay.digest(&protein, &enzyme, |_, _, _, _| {
            calls.set(calls.get() + 1);
            vec!["MK".to_string()]
        });
        let second = assay.digest(&protein, &enzyme, |_, _, _, _| {
            calls.set(calls.get() + 1);
            vec!["MK".to_string()]
        });

        assert_eq!(calls.get(), 1);
        assert!(Arc::ptr_eq(&first, &second));
        assert!(assay.contains(&enzyme, &protein));
    }

    #[test]
    fn invalidate_forces_recompute() {
        let assay = DigestionAssay::new();
        let protein = protein();
        let enzyme = trypsin();
        let calls = Cell::new(0);
        let cleave = |_: &str, _: usize, _: usize, _: usize| {
            calls.set(calls.get() + 1);
            vec!["MK".to_string()]
        };

        assay.digest(&protein, &enzyme, cleave);
        assay.invalidate(&enzyme, &protein);
        assert!(!assay.contains(&enzyme, &protein));
        assay.digest(&protein, &enzyme, cleave);
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn empty_result_is_not_a_hit() {
        let assay = DigestionAssay::new();
        let protein = protein();
        let enzyme = trypsin();

        assay.digest(&protein, &enzyme, |_, _, _, _| vec![]);
        assert!(!assay.contains(&enzyme, &protein));

        // An empty cached list does not suppress recomputation
        let calls = Cell::new(0);
        assay.digest(&protein, &enzyme, |_, _, _, _| {
            calls.set(calls.get() + 1);
            vec!["MK".to_string()]
        });
        assert_eq!(calls.get(), 1);
    }
}
