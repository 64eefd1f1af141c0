use fnv::FnvHashMap;
use std::sync::Arc;

use crate::coverage::CoverageIndex;
use crate::peptide::Peptide;

/// Ordered universe of experiment labels, derived from the run summary by an
/// external collaborator.
///
/// Profiles are stored densely, aligned to this order, so vectors can be
/// compared and correlated without key lookups. A label's column index is
/// stable for the lifetime of the universe.
#[derive(Debug, Clone)]
pub struct ExperimentUniverse {
    labels: Arc<[Arc<str>]>,
    index: FnvHashMap<Arc<str>, usize>,
}

impl ExperimentUniverse {
    pub fn new<I, S>(labels: I) -> ExperimentUniverse
    where
        I: IntoIterator<Item = S>,
        S: Into<Arc<str>>,
    {
        let labels: Vec<Arc<str>> = labels.into_iter().map(Into::into).collect();
        let index = labels
            .iter()
            .enumerate()
            .map(|(idx, label)| (label.clone(), idx))
            .collect();
        ExperimentUniverse {
            labels: labels.into(),
            index,
        }
    }

    pub fn labels(&self) -> &[Arc<str>] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Column index of a label, if it belongs to the universe
    pub fn position(&self, label: &str) -> Option<usize> {
        self.index.get(label).copied()
    }
}

/// Per-residue experiment-intensity profile of one protein.
///
/// Each 1-based position holds one universe-aligned vector. `None` marks a
/// position-experiment pair whose summed intensity is exactly zero: "no
/// signal observed" must stay distinct from a real value so that later log
/// transforms see a gap, not a zero.
pub struct IntensityProfile {
    experiments: ExperimentUniverse,
    rows: Vec<Vec<Option<u64>>>,
    total: Vec<u64>,
}

impl IntensityProfile {
    /// Aggregate peptide signal onto residue positions.
    ///
    /// Peptides overlapping the same residue contribute additively. An
    /// experiment absent from a peptide's map contributes nothing; intensity
    /// keys outside the universe are ignored.
    pub fn build(
        coverage: &CoverageIndex,
        peptides: &[Peptide],
        experiments: &ExperimentUniverse,
    ) -> IntensityProfile {
        let protein_len = coverage.protein_len();
        let mut rows = Vec::with_capacity(protein_len as usize);
        let mut total = Vec::with_capacity(protein_len as usize);

        for position in 1..=protein_len {
            let mut sums = vec![0u64; experiments.len()];
            let mut position_total = 0u64;
            for &ix in coverage.peptides_at(position) {
                let peptide = &peptides[ix.0 as usize];
                position_total += peptide.total_intensity;
                for (label, &intensity) in &peptide.experiment_intensities {
                    if let Some(col) = experiments.position(label) {
                        sums[col] += intensity;
                    }
                }
            }
            rows.push(
                sums.into_iter()
                    .map(|sum| if sum == 0 { None } else { Some(sum) })
                    .collect(),
            );
            total.push(position_total);
        }

        IntensityProfile {
            experiments: experiments.clone(),
            rows,
            total,
        }
    }

    pub fn protein_len(&self) -> u32 {
        self.rows.len() as u32
    }

    pub fn experiments(&self) -> &ExperimentUniverse {
        &self.experiments
    }

    /// Universe-aligned intensity vector at a 1-based position
    pub fn row(&self, position: u32) -> &[Option<u64>] {
        &self.rows[position as usize - 1]
    }

    /// Summed total peptide intensity at a 1-based position
    pub fn total_intensity(&self, position: u32) -> u64 {
        self.total[position as usize - 1]
    }
}
