use crate::peptide::{Peptide, PeptideIx};
use crate::Error;

/// Mapping from each 1-based protein position to the peptides covering it.
///
/// Built once per (protein, peptide set) pair and immutable afterwards;
/// rebuild wholesale when the peptide set changes. Every position in
/// `[1, protein_len]` is present, uncovered positions holding an empty set.
pub struct CoverageIndex {
    positions: Vec<Vec<PeptideIx>>,
}

impl CoverageIndex {
    /// Register every peptide at every position of its span.
    ///
    /// A peptide whose span falls outside `[1, protein_len]` is a caller
    /// error and rejects the whole build; silently truncating it would hide
    /// coverage gaps.
    pub fn build(protein_len: u32, peptides: &[Peptide]) -> Result<CoverageIndex, Error> {
        if protein_len == 0 {
            return Err(Error::EmptyProtein);
        }
        let mut positions = vec![Vec::new(); protein_len as usize];
        for (ix, peptide) in peptides.iter().enumerate() {
            if peptide.start < 1 || peptide.end > protein_len || peptide.start > peptide.end {
                return Err(Error::PeptideOutOfRange {
                    start: peptide.start,
                    end: peptide.end,
                    protein_len,
                });
            }
            for position in peptide.start..=peptide.end {
                positions[position as usize - 1].push(PeptideIx(ix as u32));
            }
        }
        Ok(CoverageIndex { positions })
    }

    pub fn protein_len(&self) -> u32 {
        self.positions.len() as u32
    }

    /// Peptides covering a 1-based position in `[1, protein_len]`
    pub fn peptides_at(&self, position: u32) -> &[PeptideIx] {
        &self.positions[position as usize - 1]
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn covers_exactly_the_span() {
        let peptides = vec![Peptide::new("BC", 2), Peptide::new("CDE", 3)];
        let coverage = CoverageIndex::build(5, &peptides).unwrap();

        assert_eq!(coverage.peptides_at(1), &[]);
        assert_eq!(coverage.peptides_at(2), &[PeptideIx(0)]);
        assert_eq!(coverage.peptides_at(3), &[PeptideIx(0), PeptideIx(1)]);
        assert_eq!(coverage.peptides_at(4), &[PeptideIx(1)]);
        assert_eq!(coverage.peptides_at(5), &[PeptideIx(1)]);
    }

    #[test]
    fn every_position_present() {
        let coverage = CoverageIndex::build(7, &[]).unwrap();
        assert_eq!(coverage.protein_len(), 7);
        for position in 1..=7 {
            assert!(coverage.peptides_at(position).is_empty());
        }
    }

    #[test]
    fn rejects_out_of_range_span() {
        let result = CoverageIndex::build(5, &[Peptide::new("ABCDEF", 2)]);
        assert_eq!(
            result.err(),
            Some(Error::PeptideOutOfRange {
                start: 2,
                end: 7,
                protein_len: 5
            })
        );
    }

    #[test]
    fn rejects_zero_start() {
        let mut peptide = Peptide::new("AB", 1);
        peptide.start = 0;
        peptide.end = 1;
        assert!(CoverageIndex::build(5, &[peptide]).is_err());
    }

    #[test]
    fn rejects_zero_length_protein() {
        assert_eq!(CoverageIndex::build(0, &[]).err(), Some(Error::EmptyProtein));
    }
}
