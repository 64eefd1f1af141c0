use itertools::Itertools;
use serde::Serialize;

use crate::profile::{ExperimentUniverse, IntensityProfile};

/// A maximal run of consecutive positions sharing one experiment-intensity
/// vector, used both as key and as display label.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Run {
    /// 1-based, inclusive
    pub start: u32,
    pub end: u32,
}

impl Run {
    pub fn contains(&self, position: u32) -> bool {
        position >= self.start && position <= self.end
    }

    pub fn positions(&self) -> impl Iterator<Item = u32> {
        self.start..=self.end
    }

    /// Number of positions collapsed into this run, always at least one
    pub fn width(&self) -> u32 {
        self.end - self.start + 1
    }

    /// Literal ordered position list, e.g. `[12, 13, 14]`
    pub fn label(&self) -> String {
        format!("[{}]", self.positions().map(|p| p.to_string()).join(", "))
    }

    /// Compact form for chart legends and report headers, e.g. `12 - 14`
    pub fn legend(&self) -> String {
        if self.start == self.end {
            self.start.to_string()
        } else {
            format!("{} - {}", self.start, self.end)
        }
    }
}

impl std::fmt::Display for Run {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.legend())
    }
}

/// An [`IntensityProfile`] with redundant adjacent positions collapsed.
///
/// Runs partition `[1, protein_len]` with no gaps or overlaps, in ascending
/// position order, and no two adjacent runs hold equal vectors. Collapsing is
/// what keeps the downstream pairwise correlation tractable: a long protein
/// usually reduces to far fewer distinct signal patterns than residues.
pub struct ReducedProfile {
    experiments: ExperimentUniverse,
    runs: Vec<(Run, Vec<Option<u64>>)>,
}

impl ReducedProfile {
    /// Collapse maximal runs of consecutive positions with identical vectors.
    ///
    /// Scans positions in increasing order and closes the pending run
    /// whenever the next position's vector differs (full equality, gaps
    /// included) or the final position is reached. Each emitted run carries
    /// the vector shared by its own positions.
    pub fn reduce(profile: &IntensityProfile) -> ReducedProfile {
        let protein_len = profile.protein_len();
        let mut runs = Vec::new();
        let mut start = 1u32;
        for position in 1..=protein_len {
            if position == protein_len || profile.row(position) != profile.row(position + 1) {
                runs.push((
                    Run {
                        start,
                        end: position,
                    },
                    profile.row(position).to_vec(),
                ));
                start = position + 1;
            }
        }
        ReducedProfile {
            experiments: profile.experiments().clone(),
            runs,
        }
    }

    pub fn experiments(&self) -> &ExperimentUniverse {
        &self.experiments
    }

    /// Runs with their shared vectors, in ascending position order
    pub fn entries(&self) -> &[(Run, Vec<Option<u64>>)] {
        &self.runs
    }

    pub fn len(&self) -> usize {
        self.runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// The run containing a 1-based position, if any
    pub fn run_at(&self, position: u32) -> Option<&(Run, Vec<Option<u64>>)> {
        let idx = self.runs.partition_point(|entry| entry.0.end < position);
        self.runs.get(idx).filter(|entry| entry.0.contains(position))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::coverage::CoverageIndex;
    use crate::peptide::Peptide;
    use crate::profile::IntensityProfile;

    fn reduced(protein_len: u32, peptides: Vec<Peptide>) -> ReducedProfile {
        let coverage = CoverageIndex::build(protein_len, &peptides).unwrap();
        let experiments = ExperimentUniverse::new(["E1", "E2"]);
        let profile = IntensityProfile::build(&coverage, &peptides, &experiments);
        ReducedProfile::reduce(&profile)
    }

    #[test]
    fn collapses_identical_neighbors() {
        let reduced = reduced(5, vec![Peptide::new("BC", 2).with_intensity("E1", 10)]);
        let runs: Vec<Run> = reduced.entries().iter().map(|entry| entry.0).collect();
        assert_eq!(
            runs,
            vec![
                Run { start: 1, end: 1 },
                Run { start: 2, end: 3 },
                Run { start: 4, end: 5 },
            ]
        );
        assert_eq!(reduced.entries()[1].1, vec![Some(10), None]);
        assert_eq!(reduced.entries()[0].1, vec![None, None]);
    }

    #[test]
    fn runs_partition_without_gaps() {
        let reduced = reduced(
            8,
            vec![
                Peptide::new("AB", 1).with_intensity("E1", 4),
                Peptide::new("DE", 4).with_intensity("E2", 2),
            ],
        );
        let mut expected_start = 1;
        for (run, _) in reduced.entries() {
            assert_eq!(run.start, expected_start);
            expected_start = run.end + 1;
        }
        assert_eq!(expected_start, 9);
    }

    #[test]
    fn no_adjacent_runs_equal() {
        let reduced = reduced(
            10,
            vec![
                Peptide::new("ABC", 1).with_intensity("E1", 5),
                Peptide::new("CDE", 3).with_intensity("E1", 5),
            ],
        );
        for pair in reduced.entries().windows(2) {
            assert_ne!(pair[0].1, pair[1].1);
        }
    }

    #[test]
    fn run_lookup_by_position() {
        let reduced = reduced(5, vec![Peptide::new("BC", 2).with_intensity("E1", 10)]);
        assert_eq!(reduced.run_at(3).map(|e| e.0), Some(Run { start: 2, end: 3 }));
        assert_eq!(reduced.run_at(5).map(|e| e.0), Some(Run { start: 4, end: 5 }));
        assert_eq!(reduced.run_at(0), None);
        assert_eq!(reduced.run_at(6), None);
    }

    #[test]
    fn labels() {
        let run = Run { start: 12, end: 14 };
        assert_eq!(run.label(), "[12, 13, 14]");
        assert_eq!(run.legend(), "12 - 14");
        assert_eq!(Run { start: 7, end: 7 }.legend(), "7");
    }

    #[test]
    fn round_trip_reproduces_profile() {
        let peptides = vec![
            Peptide::new("ABCD", 1).with_intensity("E1", 9),
            Peptide::new("CD", 3).with_intensity("E2", 2),
        ];
        let coverage = CoverageIndex::build(6, &peptides).unwrap();
        let experiments = ExperimentUniverse::new(["E1", "E2"]);
        let profile = IntensityProfile::build(&coverage, &peptides, &experiments);
        let reduced = ReducedProfile::reduce(&profile);

        let mut expanded = Vec::new();
        for (run, vector) in reduced.entries() {
            for _ in run.positions() {
                expanded.push(vector.clone());
            }
        }
        let original: Vec<_> = (1..=6).map(|p| profile.row(p).to_vec()).collect();
        assert_eq!(expanded, original);
    }
}
