use fnv::FnvHashMap;
use serde::Serialize;
use std::sync::Arc;

use crate::matcher::find_occurrences;
use crate::Error;

/// Uppercase single-letter codes accepted in a protein sequence, including
/// the rare translated residues U (selenocysteine) and O (pyrrolysine)
pub const VALID_AA: [u8; 22] = [
    b'A', b'C', b'D', b'E', b'F', b'G', b'H', b'I', b'K', b'L', b'M', b'N', b'P', b'Q', b'R', b'S',
    b'T', b'V', b'W', b'Y', b'U', b'O',
];

/// A protein group reduced to its analysis essentials: a stable identifier,
/// the database accessions behind it, and the residue sequence.
///
/// All positions into the sequence are 1-based: position 1 is the first
/// residue, position `len()` the last.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProteinRecord {
    pub id: Arc<str>,
    pub accessions: Vec<Arc<str>>,
    sequence: String,
}

impl ProteinRecord {
    pub fn new<I, S>(id: I, accessions: Vec<Arc<str>>, sequence: S) -> Result<ProteinRecord, Error>
    where
        I: Into<Arc<str>>,
        S: Into<String>,
    {
        let sequence = sequence.into();
        if sequence.is_empty() {
            return Err(Error::EmptyProtein);
        }
        for (idx, b) in sequence.bytes().enumerate() {
            if !VALID_AA.contains(&b) {
                return Err(Error::InvalidResidue {
                    residue: b as char,
                    position: idx + 1,
                });
            }
        }
        Ok(ProteinRecord {
            id: id.into(),
            accessions,
            sequence,
        })
    }

    pub fn sequence(&self) -> &str {
        &self.sequence
    }

    pub fn len(&self) -> u32 {
        self.sequence.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    /// Residue at a 1-based position, or `None` outside `[1, len]`
    pub fn residue_at(&self, position: u32) -> Option<char> {
        position
            .checked_sub(1)
            .and_then(|idx| self.sequence.as_bytes().get(idx as usize))
            .map(|&b| b as char)
    }
}

/// Index into a peptide arena (`&[Peptide]`) owned by the caller. All
/// cross-references between the coverage index and peptides use this index.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct PeptideIx(pub u32);

/// A detected (or in-silico) subsequence of a protein with quantitative
/// signal per experiment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Peptide {
    pub sequence: String,
    /// 1-based, inclusive. Invariant: `end == start + sequence.len() - 1`
    pub start: u32,
    pub end: u32,
    /// Set when `start`/`end` were re-derived by substring search rather
    /// than taken from upstream data
    pub is_recalculated: bool,
    /// Links to feature/evidence records owned by an external collaborator
    pub evidence_ids: Vec<Arc<str>>,
    pub total_intensity: u64,
    /// Summed feature intensity per experiment. Absent keys mean zero.
    pub experiment_intensities: FnvHashMap<Arc<str>, u64>,
}

impl Peptide {
    pub fn new<S: Into<String>>(sequence: S, start: u32) -> Peptide {
        let sequence = sequence.into();
        let end = start + sequence.len().saturating_sub(1) as u32;
        Peptide {
            sequence,
            start,
            end,
            is_recalculated: false,
            evidence_ids: Vec::new(),
            total_intensity: 0,
            experiment_intensities: FnvHashMap::default(),
        }
    }

    /// Record a per-experiment intensity, accumulating the total
    pub fn with_intensity<S: Into<Arc<str>>>(mut self, experiment: S, intensity: u64) -> Peptide {
        self.total_intensity += intensity;
        *self
            .experiment_intensities
            .entry(experiment.into())
            .or_insert(0) += intensity;
        self
    }

    pub fn intensity(&self, experiment: &str) -> u64 {
        self.experiment_intensities
            .get(experiment)
            .copied()
            .unwrap_or(0)
    }
}

/// Verify each peptide's claimed span against the parent protein, re-deriving
/// positions by substring search when the claimed slice does not reproduce
/// the peptide sequence.
///
/// Re-derived peptides are marked `is_recalculated`. Peptides that cannot be
/// placed anywhere on the protein are dropped.
pub fn resolve_positions(protein: &ProteinRecord, peptides: Vec<Peptide>) -> Vec<Peptide> {
    let sequence = protein.sequence();
    peptides
        .into_iter()
        .filter_map(|mut peptide| {
            let claimed = peptide
                .start
                .checked_sub(1)
                .and_then(|start| sequence.get(start as usize..peptide.end as usize));
            if claimed == Some(peptide.sequence.as_str()) {
                return Some(peptide);
            }
            match find_occurrences(&peptide.sequence, sequence).first() {
                Some(&(start, end)) => {
                    peptide.start = start;
                    peptide.end = end;
                    peptide.is_recalculated = true;
                    Some(peptide)
                }
                None => {
                    log::debug!(
                        "dropping peptide {} not present in {}",
                        peptide.sequence,
                        protein.id
                    );
                    None
                }
            }
        })
        .collect()
}
