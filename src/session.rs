use crate::coverage::CoverageIndex;
use crate::digest::DigestionAssay;
use crate::peptide::{resolve_positions, Peptide, ProteinRecord};
use crate::profile::{ExperimentUniverse, IntensityProfile};
use crate::reduce::ReducedProfile;
use crate::Error;

/// Per-analysis context: the experiment universe from the run summary and
/// the digestion cache. Constructed explicitly and passed to whoever needs
/// it; there is no process-wide state.
pub struct Session {
    pub experiments: ExperimentUniverse,
    pub digestion: DigestionAssay,
}

impl Session {
    pub fn new(experiments: ExperimentUniverse) -> Session {
        Session {
            experiments,
            digestion: DigestionAssay::new(),
        }
    }

    /// Run the profiling pipeline for one protein: resolve peptide positions,
    /// build coverage, aggregate intensities onto residues, collapse runs.
    ///
    /// The result is an immutable snapshot derived from the inputs; discard
    /// it and call again when the peptide set changes.
    pub fn profile(
        &self,
        protein: &ProteinRecord,
        peptides: Vec<Peptide>,
    ) -> Result<ProteinProfile, Error> {
        log::info!("profiling {} ({} peptides)", protein.id, peptides.len());
        let peptides = resolve_positions(protein, peptides);
        let coverage = CoverageIndex::build(protein.len(), &peptides)?;
        let profile = IntensityProfile::build(&coverage, &peptides, &self.experiments);
        let reduced = ReducedProfile::reduce(&profile);
        log::info!(
            "{}: {} positions collapsed into {} runs",
            protein.id,
            profile.protein_len(),
            reduced.len()
        );
        Ok(ProteinProfile {
            peptides,
            coverage,
            profile,
            reduced,
        })
    }
}

/// Everything derived from one (protein, peptide set) pair. Nothing here is
/// updated incrementally; rebuild wholesale when the inputs change.
pub struct ProteinProfile {
    /// Peptides after position resolution, in arena order matching the
    /// coverage index
    pub peptides: Vec<Peptide>,
    pub coverage: CoverageIndex,
    pub profile: IntensityProfile,
    pub reduced: ReducedProfile,
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::correlation::{CorrelationMatrix, CorrelationRequest};
    use crate::digest::EnzymeRule;

    #[test]
    fn pipeline_smoke() {
        let session = Session::new(ExperimentUniverse::new(["E1", "E2"]));
        let protein = ProteinRecord::new("PG1", vec!["P12345".into()], "MKWVTFISLK").unwrap();
        let peptides = vec![
            Peptide::new("MKWV", 1).with_intensity("E1", 100).with_intensity("E2", 50),
            Peptide::new("TFIS", 5).with_intensity("E1", 20),
            // Wrong claimed span, placeable by search
            Peptide::new("ISLK", 2).with_intensity("E2", 70),
            // Not in the protein at all
            Peptide::new("QQQQ", 1).with_intensity("E1", 5),
        ];

        let result = session.profile(&protein, peptides).unwrap();
        assert_eq!(result.peptides.len(), 3);
        assert!(result.peptides[2].is_recalculated);
        assert_eq!(result.coverage.protein_len(), 10);
        assert!(!result.reduced.is_empty());

        let matrix = CorrelationMatrix::build(
            &result.reduced,
            &protein,
            &CorrelationRequest::default(),
        );
        assert_eq!(matrix.len(), result.reduced.len());
    }

    #[test]
    fn digest_products_feed_coverage() {
        let session = Session::new(ExperimentUniverse::new(["E1"]));
        let protein = ProteinRecord::new("PG1", vec![], "MKWVTFISLK").unwrap();
        let enzyme = EnzymeRule {
            id: "Trypsin".into(),
            min_len: 2,
            max_len: 10,
            max_missed_cleavages: 0,
        };
        let peptides = session.digestion.digest(&protein, &enzyme, |_, _, _, _| {
            vec!["MK".to_string(), "WVTFISLK".to_string()]
        });

        let coverage = CoverageIndex::build(protein.len(), &peptides).unwrap();
        assert_eq!(coverage.peptides_at(1).len(), 1);
        assert_eq!(coverage.peptides_at(10).len(), 1);
    }
}
